//! Explicit session context handed to every workflow function

use super::{Faculty, Role};

/// The signed-in user as resolved from the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: i32,
    pub faculty: Faculty,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: i32, faculty: Faculty, role: Role) -> Self {
        Self {
            user_id,
            faculty,
            role,
        }
    }

    pub fn student(user_id: i32, faculty: Faculty) -> Self {
        Self::new(user_id, faculty, Role::Student)
    }
}
