use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Patient,
    Doctor,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Patient => write!(f, "patient"),
            UserRole::Doctor => write!(f, "doctor"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub user_type: UserRole,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub iat: u64,
    pub exp: u64,
}

/// Authenticated identity attached to each request by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub user_type: UserRole,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl AuthUser {
    pub fn is_patient(&self) -> bool {
        self.user_type == UserRole::Patient
    }

    pub fn is_doctor(&self) -> bool {
        self.user_type == UserRole::Doctor
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
