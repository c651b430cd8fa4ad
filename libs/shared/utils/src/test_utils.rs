use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use chrono::{Duration, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the config at a mock PostgREST server.
    pub fn with_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "authenticated")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "authenticated")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });
        Self::create_token_with_header(user, secret, header, exp_hours)
    }

    /// Sign with HS256 whatever `header` claims, to exercise header checks.
    pub fn create_token_with_header(
        user: &TestUser,
        secret: &str,
        header: serde_json::Value,
        exp_hours: Option<i64>,
    ) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
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

/// Canned PostgREST rows shaped like the CareConnect tables.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_profile_response(user_id: &str) -> serde_json::Value {
        json!({
            "id": user_id,
            "full_name": "Test User",
            "email": "test@example.com",
            "phone": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn hospital_response(
        hospital_id: &str,
        daily_capacity: u32,
        booked_count: u32,
        free_slot_date: NaiveDate,
    ) -> serde_json::Value {
        json!({
            "id": hospital_id,
            "name": "St. Luke's General",
            "address": "12 Harbour Road",
            "city": "Dublin",
            "phone": "+353 1 555 0101",
            "latitude": 53.3498,
            "longitude": -6.2603,
            "daily_capacity": daily_capacity,
            "booked_count": booked_count,
            "free_slot_date": free_slot_date.format("%Y-%m-%d").to_string(),
            "rating_average": 4.2,
            "rating_count": 5,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn speciality_response(speciality_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": speciality_id,
            "name": name,
            "description": null,
            "doctor_count": 0,
            "hospital_count": 0,
            "severity": { "low": 0, "medium": 0, "high": 0 },
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn link_response(hospital_id: &str, speciality_id: &str, doctor_count: u32) -> serde_json::Value {
        json!({
            "hospital_id": hospital_id,
            "speciality_id": speciality_id,
            "doctor_count": doctor_count
        })
    }

    pub fn appointment_response(
        appointment_id: &str,
        user_id: &str,
        hospital_id: &str,
        speciality_id: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "user_id": user_id,
            "hospital_id": hospital_id,
            "speciality_id": speciality_id,
            "patient_name": "Test Patient",
            "patient_phone": "+353 87 123 4567",
            "patient_age": 34,
            "description": "Recurring headaches",
            "severity": "medium",
            "appointment_date": Utc::now().date_naive().format("%Y-%m-%d").to_string(),
            "status": status,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn rating_response(user_id: &str, hospital_id: &str, score: u8) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "hospital_id": hospital_id,
            "score": score,
            "review": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn feedback_response(name: &str, email: &str, message: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "name": name,
            "email": email,
            "subject": null,
            "message": message,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
