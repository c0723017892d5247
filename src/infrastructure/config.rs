use std::env;

/// Payment proofs above this size are rejected (100KB, after client-side compression)
pub const DEFAULT_PAYMENT_PROOF_MAX_BYTES: usize = 100 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    pub rules: CampusRules,
    pub qr_secret: String,
}

/// Tunables for the check-in and registration rules
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CampusRules {
    /// How long a generated QR payload stays scannable
    pub qr_validity_secs: i64,
    /// Max distance in meters between the attendee and the event location
    pub geofence_radius_m: f64,
    pub payment_proof_max_bytes: usize,
}

impl Default for CampusRules {
    fn default() -> Self {
        Self {
            qr_validity_secs: 5,
            geofence_radius_m: 150.0,
            payment_proof_max_bytes: DEFAULT_PAYMENT_PROOF_MAX_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let profile = env::var("PROFILE").unwrap_or_else(|_| "default".to_string());

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            if profile == "default" {
                "sqlite://uniexp.db?mode=rwc".to_string()
            } else {
                format!("sqlite://uniexp_{}.db?mode=rwc", profile)
            }
        });

        let defaults = CampusRules::default();
        let rules = CampusRules {
            qr_validity_secs: parse_var("QR_VALIDITY_SECS").unwrap_or(defaults.qr_validity_secs),
            geofence_radius_m: parse_var("GEOFENCE_RADIUS_M")
                .unwrap_or(defaults.geofence_radius_m),
            payment_proof_max_bytes: parse_var("PAYMENT_PROOF_MAX_BYTES")
                .unwrap_or(defaults.payment_proof_max_bytes),
        };

        Self {
            database_url,
            port: parse_var("PORT").unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(Vec::new),
            profile,
            rules,
            qr_secret: qr_secret(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn qr_secret() -> String {
    env::var("QR_SECRET").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "uniexp-dev-qr-secret".to_string()
        } else {
            panic!("QR_SECRET environment variable must be set in production");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        unsafe {
            env::remove_var("PROFILE");
            env::remove_var("DATABASE_URL");
            env::remove_var("QR_VALIDITY_SECS");
            env::remove_var("GEOFENCE_RADIUS_M");
        }
        let config = Config::from_env();
        assert_eq!(config.database_url, "sqlite://uniexp.db?mode=rwc");
        assert_eq!(config.rules, CampusRules::default());
        assert_eq!(config.rules.qr_validity_secs, 5);
        assert_eq!(config.rules.payment_proof_max_bytes, 102_400);
    }

    #[test]
    #[serial]
    fn test_profile_and_rule_overrides() {
        unsafe {
            env::remove_var("DATABASE_URL");
            env::set_var("PROFILE", "staging");
            env::set_var("GEOFENCE_RADIUS_M", "300");
            env::set_var("QR_VALIDITY_SECS", "not-a-number");
        }
        let config = Config::from_env();
        unsafe {
            env::remove_var("PROFILE");
            env::remove_var("GEOFENCE_RADIUS_M");
            env::remove_var("QR_VALIDITY_SECS");
        }
        assert_eq!(config.database_url, "sqlite://uniexp_staging.db?mode=rwc");
        assert_eq!(config.rules.geofence_radius_m, 300.0);
        // Unparseable values fall back to the default
        assert_eq!(config.rules.qr_validity_secs, 5);
    }
}
