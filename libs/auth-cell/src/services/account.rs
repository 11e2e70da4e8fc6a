use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::postgrest::{DbError, PostgrestClient};
use shared_models::auth::{AuthUser, UserRole};
use shared_utils::jwt::issue_token;

use crate::models::{AccountProfile, AuthError, DoctorRow, LoginRequest, PatientRow, RegisterRequest};
use crate::services::password::{hash_password, verify_password};

pub struct AccountService {
    db: PostgrestClient,
    jwt_secret: String,
    token_expiry_hours: i64,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            jwt_secret: config.jwt_secret.clone(),
            token_expiry_hours: config.token_expiry_hours,
        }
    }

    /// Create a patient or doctor account and sign the initial token.
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<(AccountProfile, String), AuthError> {
        self.validate_registration(&request)?;

        info!("Registering new {} account for {}", request.user_type, request.email);

        let password_hash = hash_password(&request.password)
            .map_err(|e| AuthError::ValidationError(format!("Failed to hash password: {}", e)))?;

        let profile = match request.user_type {
            UserRole::Patient => {
                let row = json!({
                    "email": request.email,
                    "password_hash": password_hash,
                    "first_name": request.first_name,
                    "last_name": request.last_name,
                    "date_of_birth": request.date_of_birth,
                    "phone": request.phone,
                });
                let created: Vec<PatientRow> = self
                    .db
                    .insert_returning("/rest/v1/patients", row)
                    .await
                    .map_err(Self::map_insert_error)?;
                created
                    .into_iter()
                    .next()
                    .ok_or_else(|| AuthError::DatabaseError("Insert returned no row".to_string()))?
                    .into_profile()
            }
            UserRole::Doctor => {
                let row = json!({
                    "email": request.email,
                    "password_hash": password_hash,
                    "first_name": request.first_name,
                    "last_name": request.last_name,
                    "specialization": request.specialization,
                    "experience": request.experience,
                    "qualifications": request.qualifications,
                });
                let created: Vec<DoctorRow> = self
                    .db
                    .insert_returning("/rest/v1/doctors", row)
                    .await
                    .map_err(Self::map_insert_error)?;
                created
                    .into_iter()
                    .next()
                    .ok_or_else(|| AuthError::DatabaseError("Insert returned no row".to_string()))?
                    .into_profile()
            }
        };

        let token = self.sign_token(&profile)?;

        info!("Account {} registered with id {}", profile.email, profile.id);
        Ok((profile, token))
    }

    /// Verify credentials and sign a fresh token.
    pub async fn login(&self, request: LoginRequest) -> Result<(AccountProfile, String), AuthError> {
        debug!("Login attempt for {} ({})", request.email, request.user_type);

        let encoded_email = urlencoding::encode(&request.email);

        let (profile, password_hash) = match request.user_type {
            UserRole::Patient => {
                let path = format!("/rest/v1/patients?email=eq.{}", encoded_email);
                let rows: Vec<PatientRow> = self
                    .db
                    .request(reqwest::Method::GET, &path, None)
                    .await
                    .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
                let row = rows.into_iter().next().ok_or(AuthError::InvalidCredentials)?;
                let hash = row.password_hash.clone();
                (row.into_profile(), hash)
            }
            UserRole::Doctor => {
                let path = format!("/rest/v1/doctors?email=eq.{}", encoded_email);
                let rows: Vec<DoctorRow> = self
                    .db
                    .request(reqwest::Method::GET, &path, None)
                    .await
                    .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
                let row = rows.into_iter().next().ok_or(AuthError::InvalidCredentials)?;
                let hash = row.password_hash.clone();
                (row.into_profile(), hash)
            }
        };

        let matches = verify_password(&request.password, &password_hash)
            .map_err(|e| AuthError::DatabaseError(format!("Corrupt password hash: {}", e)))?;

        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.sign_token(&profile)?;

        info!("User {} logged in", profile.id);
        Ok((profile, token))
    }

    /// Fetch the stored profile for an authenticated account.
    pub async fn get_profile(&self, user: &AuthUser) -> Result<AccountProfile, AuthError> {
        let profile = match user.user_type {
            UserRole::Patient => {
                let path = format!("/rest/v1/patients?id=eq.{}", user.id);
                let rows: Vec<PatientRow> = self
                    .db
                    .request(reqwest::Method::GET, &path, None)
                    .await
                    .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
                rows.into_iter()
                    .next()
                    .ok_or_else(|| AuthError::ValidationError("Account no longer exists".to_string()))?
                    .into_profile()
            }
            UserRole::Doctor => {
                let path = format!("/rest/v1/doctors?id=eq.{}", user.id);
                let rows: Vec<DoctorRow> = self
                    .db
                    .request(reqwest::Method::GET, &path, None)
                    .await
                    .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
                rows.into_iter()
                    .next()
                    .ok_or_else(|| AuthError::ValidationError("Account no longer exists".to_string()))?
                    .into_profile()
            }
        };

        Ok(profile)
    }

    fn sign_token(&self, profile: &AccountProfile) -> Result<String, AuthError> {
        let identity = AuthUser {
            id: profile.id,
            user_type: profile.user_type,
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
        };

        issue_token(&identity, &self.jwt_secret, self.token_expiry_hours).map_err(AuthError::TokenError)
    }

    fn validate_registration(&self, request: &RegisterRequest) -> Result<(), AuthError> {
        if request.email.trim().is_empty()
            || request.first_name.trim().is_empty()
            || request.last_name.trim().is_empty()
        {
            return Err(AuthError::ValidationError("All fields are required".to_string()));
        }

        if !request.email.contains('@') {
            return Err(AuthError::ValidationError("Invalid email address".to_string()));
        }

        if request.password.len() < 8 {
            return Err(AuthError::ValidationError(
                "Password must be at least 8 characters long".to_string(),
            ));
        }

        Ok(())
    }

    fn map_insert_error(err: DbError) -> AuthError {
        match err {
            DbError::UniqueViolation(_) => AuthError::EmailTaken,
            other => AuthError::DatabaseError(other.to_string()),
        }
    }
}
