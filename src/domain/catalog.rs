//! Closed vocabularies shared by every workflow
//!
//! Each enum owns exactly one code/label table. Codes are what the database
//! and the JSON API carry; labels are for display.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// Faculty a student belongs to. Leaderboards are partitioned by faculty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faculty {
    Computing,
    Engineering,
    Science,
    Business,
    Law,
    Medicine,
    SocialSciences,
    Education,
    BuiltEnvironment,
}

impl Faculty {
    pub const ALL: [Faculty; 9] = [
        Faculty::Computing,
        Faculty::Engineering,
        Faculty::Science,
        Faculty::Business,
        Faculty::Law,
        Faculty::Medicine,
        Faculty::SocialSciences,
        Faculty::Education,
        Faculty::BuiltEnvironment,
    ];

    pub fn code(&self) -> &'static str {
        self.entry().0
    }

    pub fn label(&self) -> &'static str {
        self.entry().1
    }

    fn entry(&self) -> (&'static str, &'static str) {
        match self {
            Faculty::Computing => ("computing", "Faculty of Computing"),
            Faculty::Engineering => ("engineering", "Faculty of Engineering"),
            Faculty::Science => ("science", "Faculty of Science"),
            Faculty::Business => ("business", "Faculty of Business and Economics"),
            Faculty::Law => ("law", "Faculty of Law"),
            Faculty::Medicine => ("medicine", "Faculty of Medicine"),
            Faculty::SocialSciences => ("social_sciences", "Faculty of Arts and Social Sciences"),
            Faculty::Education => ("education", "Faculty of Education"),
            Faculty::BuiltEnvironment => ("built_environment", "Faculty of Built Environment"),
        }
    }
}

/// Kind of event, used for catalog filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Academic,
    Career,
    Cultural,
    Sports,
    Volunteering,
    Technology,
    Wellness,
    Entrepreneurship,
}

impl EventCategory {
    pub const ALL: [EventCategory; 8] = [
        EventCategory::Academic,
        EventCategory::Career,
        EventCategory::Cultural,
        EventCategory::Sports,
        EventCategory::Volunteering,
        EventCategory::Technology,
        EventCategory::Wellness,
        EventCategory::Entrepreneurship,
    ];

    pub fn code(&self) -> &'static str {
        self.entry().0
    }

    pub fn label(&self) -> &'static str {
        self.entry().1
    }

    fn entry(&self) -> (&'static str, &'static str) {
        match self {
            EventCategory::Academic => ("academic", "Academic"),
            EventCategory::Career => ("career", "Career & Industry"),
            EventCategory::Cultural => ("cultural", "Arts & Culture"),
            EventCategory::Sports => ("sports", "Sports"),
            EventCategory::Volunteering => ("volunteering", "Volunteering"),
            EventCategory::Technology => ("technology", "Technology"),
            EventCategory::Wellness => ("wellness", "Health & Wellness"),
            EventCategory::Entrepreneurship => ("entrepreneurship", "Entrepreneurship"),
        }
    }
}

/// Quest variants. Badges are keyed by the same codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    Attendance,
    EarlyBird,
    Networking,
    #[serde(rename = "qna")]
    QuestionAnswer,
    Feedback,
}

impl QuestType {
    pub const ALL: [QuestType; 5] = [
        QuestType::Attendance,
        QuestType::EarlyBird,
        QuestType::Networking,
        QuestType::QuestionAnswer,
        QuestType::Feedback,
    ];

    pub fn code(&self) -> &'static str {
        self.entry().0
    }

    pub fn label(&self) -> &'static str {
        self.entry().1
    }

    fn entry(&self) -> (&'static str, &'static str) {
        match self {
            QuestType::Attendance => ("attendance", "Attendance"),
            QuestType::EarlyBird => ("early_bird", "Early Bird"),
            QuestType::Networking => ("networking", "Networking"),
            QuestType::QuestionAnswer => ("qna", "Question & Answer"),
            QuestType::Feedback => ("feedback", "Feedback"),
        }
    }

    /// Progress an entry must reach to count as completed.
    ///
    /// Single-step quests always finish at 1; early-bird and networking use
    /// the count configured on the quest template, never less than 1.
    pub fn completion_threshold(&self, configured: i32) -> i32 {
        match self {
            QuestType::Attendance | QuestType::QuestionAnswer | QuestType::Feedback => 1,
            QuestType::EarlyBird | QuestType::Networking => configured.max(1),
        }
    }
}

/// Account role carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Organiser,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Organiser, Role::Admin];

    pub fn code(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Organiser => "organiser",
            Role::Admin => "admin",
        }
    }

    pub fn can_manage_events(&self) -> bool {
        matches!(self, Role::Organiser | Role::Admin)
    }
}

macro_rules! code_conversions {
    ($ty:ident, $what:literal) => {
        impl FromStr for $ty {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.code() == s)
                    .ok_or_else(|| DomainError::Validation(format!("Unknown {}: {}", $what, s)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

code_conversions!(Faculty, "faculty");
code_conversions!(EventCategory, "event category");
code_conversions!(QuestType, "quest type");
code_conversions!(Role, "role");
