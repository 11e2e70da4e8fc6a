use shared_models::auth::{AuthUser, UserRole};
use shared_utils::jwt::{issue_token, validate_token};
use shared_utils::test_utils::{JwtTestUtils, TestUser};

const SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

fn sample_user() -> AuthUser {
    AuthUser {
        id: 42,
        user_type: UserRole::Patient,
        email: "patient@example.com".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
    }
}

#[test]
fn issue_then_validate_round_trip() {
    let user = sample_user();
    let token = issue_token(&user, SECRET, 24).unwrap();

    let validated = validate_token(&token, SECRET).unwrap();

    assert_eq!(validated.id, user.id);
    assert_eq!(validated.user_type, UserRole::Patient);
    assert_eq!(validated.email, user.email);
    assert_eq!(validated.first_name, user.first_name);
    assert_eq!(validated.last_name, user.last_name);
}

#[test]
fn rejects_token_signed_with_other_secret() {
    let user = sample_user();
    let token = issue_token(&user, "a-completely-different-secret", 24).unwrap();

    let err = validate_token(&token, SECRET).unwrap_err();
    assert_eq!(err, "Invalid token signature");
}

#[test]
fn rejects_expired_token() {
    let test_user = TestUser::patient(7, "expired@example.com");
    let token = JwtTestUtils::create_expired_token(&test_user, SECRET);

    let err = validate_token(&token, SECRET).unwrap_err();
    assert_eq!(err, "Token expired");
}

#[test]
fn rejects_malformed_token() {
    let err = validate_token(&JwtTestUtils::create_malformed_token(), SECRET).unwrap_err();
    assert!(err.contains("Invalid"));
}

#[test]
fn rejects_tampered_claims() {
    let user = sample_user();
    let token = issue_token(&user, SECRET, 24).unwrap();

    // Swap the claims segment for one signed under a different identity.
    let other = issue_token(
        &AuthUser {
            id: 999,
            ..sample_user()
        },
        SECRET,
        24,
    )
    .unwrap();

    let parts: Vec<&str> = token.split('.').collect();
    let other_parts: Vec<&str> = other.split('.').collect();
    let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

    let err = validate_token(&forged, SECRET).unwrap_err();
    assert_eq!(err, "Invalid token signature");
}

#[test]
fn rejects_empty_secret() {
    let user = sample_user();
    assert!(issue_token(&user, "", 24).is_err());
    assert!(validate_token("a.b.c", "").is_err());
}

#[test]
fn doctor_role_survives_round_trip() {
    let test_user = TestUser::doctor(11, "doc@example.com");
    let token = JwtTestUtils::create_test_token(&test_user, SECRET, Some(24));

    let validated = validate_token(&token, SECRET).unwrap();
    assert_eq!(validated.user_type, UserRole::Doctor);
    assert_eq!(validated.id, 11);
}
