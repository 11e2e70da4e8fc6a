use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, UserRole};

pub struct TestConfig {
    pub jwt_secret: String,
    pub database_url: String,
    pub database_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            database_url: "http://localhost:54321".to_string(),
            database_api_key: "test-api-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            database_url: self.database_url.clone(),
            database_api_key: self.database_api_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            token_expiry_hours: 24,
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    /// Config pointing the database client at a wiremock server.
    pub fn with_database_url(url: &str) -> AppConfig {
        AppConfig {
            database_url: url.to_string(),
            database_api_key: "test-api-key".to_string(),
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            token_expiry_hours: 24,
            port: 3000,
        }
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub user_type: UserRole,
    pub first_name: String,
    pub last_name: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::patient(1, "test@example.com")
    }
}

impl TestUser {
    pub fn patient(id: i64, email: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            user_type: UserRole::Patient,
            first_name: "Test".to_string(),
            last_name: "Patient".to_string(),
        }
    }

    pub fn doctor(id: i64, email: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            user_type: UserRole::Doctor,
            first_name: "Test".to_string(),
            last_name: "Doctor".to_string(),
        }
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            user_type: self.user_type,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id.to_string(),
            "user_type": user.user_type,
            "email": user.email,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned database rows for wiremock-backed tests.
pub struct MockDbRows;

impl MockDbRows {
    pub fn patient_row(id: i64, email: &str, first_name: &str, last_name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "email": email,
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$hash",
            "first_name": first_name,
            "last_name": last_name,
            "date_of_birth": "1990-01-15",
            "phone": "555-0100",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_row(id: i64, email: &str, first_name: &str, last_name: &str, specialization: &str) -> serde_json::Value {
        json!({
            "id": id,
            "email": email,
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$hash",
            "first_name": first_name,
            "last_name": last_name,
            "specialization": specialization,
            "experience": 8,
            "qualifications": "MBBS, MD",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_row(
        id: i64,
        patient_id: i64,
        doctor_id: i64,
        date: &str,
        time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": date,
            "appointment_time": time,
            "reason": "checkup",
            "status": status,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn prescription_row(id: i64, appointment_id: i64, doctor_id: i64, patient_id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "appointment_id": appointment_id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "diagnosis": "Seasonal allergy",
            "instructions": "Take after meals",
            "notes": "Review in two weeks",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn medication_row(prescription_id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": 1,
            "prescription_id": prescription_id,
            "name": name,
            "dosage": "10mg",
            "frequency": "once daily",
            "duration": "14 days"
        })
    }
}
