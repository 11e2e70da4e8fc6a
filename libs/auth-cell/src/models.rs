use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shared_models::auth::UserRole;

// ==============================================================================
// REQUEST/RESPONSE MODELS (camelCase wire format)
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_type: UserRole,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    // Patient profile fields
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    // Doctor profile fields
    pub specialization: Option<String>,
    pub experience: Option<i32>,
    pub qualifications: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_type: UserRole,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: i64,
    pub user_type: UserRole,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifications: Option<String>,
}

// ==============================================================================
// DATABASE ROWS (snake_case columns)
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub specialization: Option<String>,
    pub experience: Option<i32>,
    pub qualifications: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PatientRow {
    pub fn into_profile(self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            user_type: UserRole::Patient,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            phone: self.phone,
            specialization: None,
            experience: None,
            qualifications: None,
        }
    }
}

impl DoctorRow {
    pub fn into_profile(self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            user_type: UserRole::Doctor,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: None,
            phone: None,
            specialization: self.specialization,
            experience: self.experience,
            qualifications: self.qualifications,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
