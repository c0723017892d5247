//! Time-boxed QR payloads for check-in and networking
//!
//! A payload is JSON sealed with AES-256-GCM under a key derived from the
//! configured secret, then base64url encoded. The nonce travels in front of
//! the ciphertext. GCM authenticates the payload, so a forged or edited code
//! fails to open.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ServiceError;
use crate::utils::time::timestamp;

const NONCE_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrKind {
    /// Shown by the organiser at the venue
    Attendance,
    /// Shown by an attendee to other attendees
    Networking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub kind: QrKind,
    pub event_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    pub issued_at_ms: i64,
}

impl QrPayload {
    pub fn attendance(event_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            kind: QrKind::Attendance,
            event_id,
            user_id: None,
            issued_at_ms: now.timestamp_millis(),
        }
    }

    pub fn networking(event_id: i32, user_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            kind: QrKind::Networking,
            event_id,
            user_id: Some(user_id),
            issued_at_ms: now.timestamp_millis(),
        }
    }

    /// Rejects payloads older than the validity window, or issued further
    /// in the future than the window allows for clock drift.
    pub fn check_fresh(&self, now: DateTime<Utc>, validity_secs: i64) -> Result<(), ServiceError> {
        let age_ms = now.timestamp_millis() - self.issued_at_ms;
        let window_ms = validity_secs * 1000;
        if age_ms > window_ms {
            return Err(ServiceError::QrExpired);
        }
        if age_ms < -window_ms {
            return Err(ServiceError::QrInvalid);
        }
        Ok(())
    }

    pub fn expires_at(&self, validity_secs: i64) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.issued_at_ms)
            .map(|issued| issued + Duration::seconds(validity_secs))
    }
}

/// A sealed code ready to be rendered as a QR image by the client
#[derive(Debug, Clone, Serialize)]
pub struct IssuedQr {
    pub code: String,
    pub expires_at: String,
    /// Clients regenerate the code this often
    pub refresh_after_secs: i64,
}

pub struct QrCodec {
    cipher: Aes256Gcm,
}

impl QrCodec {
    pub fn new(secret: &str) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }

    pub fn seal(&self, payload: &QrPayload) -> Result<String, ServiceError> {
        let plaintext =
            serde_json::to_vec(payload).map_err(|e| ServiceError::Validation(e.to_string()))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|_| ServiceError::InvalidState("QR encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    pub fn open(&self, code: &str) -> Result<QrPayload, ServiceError> {
        let sealed = URL_SAFE_NO_PAD
            .decode(code.trim())
            .map_err(|_| ServiceError::QrInvalid)?;
        if sealed.len() <= NONCE_LEN {
            return Err(ServiceError::QrInvalid);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| ServiceError::QrInvalid)?;
        serde_json::from_slice(&plaintext).map_err(|_| ServiceError::QrInvalid)
    }

    pub fn issue(&self, payload: &QrPayload, validity_secs: i64) -> Result<IssuedQr, ServiceError> {
        let expires_at = payload
            .expires_at(validity_secs)
            .ok_or(ServiceError::QrInvalid)?;
        Ok(IssuedQr {
            code: self.seal(payload)?,
            expires_at: timestamp(expires_at),
            refresh_after_secs: validity_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_sealed_payload_opens_with_same_secret() {
        let codec = QrCodec::new("s3cret");
        let payload = QrPayload::networking(7, 12, now());
        let code = codec.seal(&payload).unwrap();
        assert_eq!(codec.open(&code).unwrap(), payload);
    }

    #[test]
    fn test_other_secret_cannot_open() {
        let code = QrCodec::new("a")
            .seal(&QrPayload::attendance(1, now()))
            .unwrap();
        assert!(matches!(
            QrCodec::new("b").open(&code),
            Err(ServiceError::QrInvalid)
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let codec = QrCodec::new("a");
        assert!(matches!(codec.open("not a code"), Err(ServiceError::QrInvalid)));
        assert!(matches!(codec.open(""), Err(ServiceError::QrInvalid)));
    }

    #[test]
    fn test_freshness_window() {
        let payload = QrPayload::attendance(1, now());
        assert!(payload.check_fresh(now(), 5).is_ok());
        assert!(payload.check_fresh(now() + Duration::seconds(5), 5).is_ok());
        assert!(matches!(
            payload.check_fresh(now() + Duration::milliseconds(5001), 5),
            Err(ServiceError::QrExpired)
        ));
        assert!(matches!(
            payload.check_fresh(now() - Duration::seconds(30), 5),
            Err(ServiceError::QrInvalid)
        ));
    }

    #[test]
    fn test_issue_reports_expiry() {
        let codec = QrCodec::new("a");
        let issued = codec.issue(&QrPayload::attendance(3, now()), 5).unwrap();
        assert_eq!(issued.expires_at, "2026-03-02T10:00:05.000Z");
        assert_eq!(issued.refresh_after_secs, 5);
    }
}
