// libs/appointment-cell/tests/handlers_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    extract::{Extension, Path, Query, State},
    http::{Request, StatusCode},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{Days, Utc};
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers::*;
use appointment_cell::models::*;
use appointment_cell::router::appointment_routes;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};
use speciality_cell::models::Severity;

fn auth_header(token: &str) -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer(token).unwrap())
}

fn booking_request(hospital_id: Uuid, speciality_id: Uuid, severity: Severity) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        hospital_id,
        speciality_id,
        patient_name: "Test Patient".to_string(),
        patient_phone: "+353 87 123 4567".to_string(),
        patient_age: Some(34),
        description: Some("Recurring headaches".to_string()),
        severity,
    }
}

async fn mount_hospital(mock_server: &MockServer, hospital_id: Uuid, capacity: u32, booked: u32) {
    let today = Utc::now().date_naive();
    Mock::given(method("GET"))
        .and(path("/rest/v1/hospitals"))
        .and(query_param("id", format!("eq.{}", hospital_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::hospital_response(&hospital_id.to_string(), capacity, booked, today)
        ])))
        .mount(mock_server)
        .await;
}

async fn mount_link(mock_server: &MockServer, hospital_id: Uuid, speciality_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/hospital_specialities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::link_response(&hospital_id.to_string(), &speciality_id.to_string(), 4)
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_create_appointment_fills_day_and_advances_free_date() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let (hospital_id, speciality_id, appointment_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let today = Utc::now().date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap();

    mount_hospital(&mock_server, hospital_id, 2, 1).await;
    mount_link(&mock_server, hospital_id, speciality_id).await;

    // Last free slot of the day: counter resets and the date moves on
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/hospitals"))
        .and(query_param("booked_count", "eq.1"))
        .and(body_partial_json(json!({
            "booked_count": 0,
            "free_slot_date": tomorrow.format("%Y-%m-%d").to_string()
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::hospital_response(&hospital_id.to_string(), 2, 0, tomorrow)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut appointment = MockSupabaseResponses::appointment_response(
        &appointment_id.to_string(),
        &user.id,
        &hospital_id.to_string(),
        &speciality_id.to_string(),
        "booked",
    );
    appointment["severity"] = json!("high");

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({
            "user_id": user.id,
            "appointment_date": today.format("%Y-%m-%d").to_string(),
            "severity": "high",
            "status": "booked"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([appointment])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::speciality_response(&speciality_id.to_string(), "Neurology")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/specialities"))
        .and(body_partial_json(json!({ "severity": { "low": 0, "medium": 0, "high": 1 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::speciality_response(&speciality_id.to_string(), "Neurology")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = create_appointment(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Json(booking_request(hospital_id, speciality_id, Severity::High)),
    ).await;

    let (status, Json(body)) = result.expect("booking should succeed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], appointment_id.to_string());
    assert_eq!(body["status"], "booked");
}

#[tokio::test]
async fn test_create_appointment_gives_up_after_repeated_contention() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    let (hospital_id, speciality_id) = (Uuid::new_v4(), Uuid::new_v4());

    mount_hospital(&mock_server, hospital_id, 10, 3).await;
    mount_link(&mock_server, hospital_id, speciality_id).await;

    // Every conditional update loses the race
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/hospitals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = create_appointment(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Json(booking_request(hospital_id, speciality_id, Severity::Low)),
    ).await;

    assert_matches!(result, Err(AppError::Conflict(msg)) if msg.contains("3 attempts"));
}

#[tokio::test]
async fn test_create_appointment_rejects_unoffered_speciality() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    let hospital_id = Uuid::new_v4();

    mount_hospital(&mock_server, hospital_id, 10, 0).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/hospital_specialities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/hospitals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = create_appointment(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Json(booking_request(hospital_id, Uuid::new_v4(), Severity::Medium)),
    ).await;

    assert_matches!(result, Err(AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_create_appointment_validates_before_touching_store() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let mut request = booking_request(Uuid::new_v4(), Uuid::new_v4(), Severity::Low);
    request.patient_phone = "unknown".to_string();

    let result = create_appointment(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Json(request),
    ).await;

    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_severity_failure_does_not_fail_booking() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    let (hospital_id, speciality_id) = (Uuid::new_v4(), Uuid::new_v4());

    mount_hospital(&mock_server, hospital_id, 10, 0).await;
    mount_link(&mock_server, hospital_id, speciality_id).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/hospitals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::hospital_response(&hospital_id.to_string(), 10, 1, Utc::now().date_naive())
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(),
                &user.id,
                &hospital_id.to_string(),
                &speciality_id.to_string(),
                "booked",
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialities"))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockSupabaseResponses::error_response("boom", "XX000"),
        ))
        .mount(&mock_server)
        .await;

    let result = create_appointment(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Json(booking_request(hospital_id, speciality_id, Severity::Medium)),
    ).await;

    assert!(result.is_ok(), "booking should survive a severity update failure: {:?}", result.err());
}

#[tokio::test]
async fn test_insert_failure_after_reservation_surfaces_error() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    let (hospital_id, speciality_id) = (Uuid::new_v4(), Uuid::new_v4());

    mount_hospital(&mock_server, hospital_id, 10, 2).await;
    mount_link(&mock_server, hospital_id, speciality_id).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/hospitals"))
        .and(query_param("booked_count", "eq.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::hospital_response(&hospital_id.to_string(), 10, 3, Utc::now().date_naive())
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockSupabaseResponses::error_response("insert failed", "XX000"),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    // No severity bucket moves for a booking that was never stored
    Mock::given(method("GET"))
        .and(path("/rest/v1/specialities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = create_appointment(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Json(booking_request(hospital_id, speciality_id, Severity::Low)),
    ).await;

    assert_matches!(result, Err(AppError::Database(_)));
}

#[tokio::test]
async fn test_get_appointment_forbidden_for_other_user() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let owner = TestUser::patient("owner@example.com");
    let intruder = TestUser::patient("intruder@example.com");
    let token = JwtTestUtils::create_test_token(&intruder, &config.supabase_jwt_secret, Some(1));
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id.to_string(),
                &owner.id,
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                "booked",
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = get_appointment(
        State(config.clone()),
        auth_header(&token),
        Extension(intruder.to_user()),
        Path(appointment_id),
    ).await;
    assert_matches!(result, Err(AppError::Forbidden(_)));

    // Admins can read any appointment
    let admin = TestUser::admin("admin@example.com");
    let admin_token = JwtTestUtils::create_test_token(&admin, &config.supabase_jwt_secret, Some(1));
    let result = get_appointment(
        State(config),
        auth_header(&admin_token),
        Extension(admin.to_user()),
        Path(appointment_id),
    ).await;
    assert_eq!(result.unwrap().0["user_id"], owner.id);
}

#[tokio::test]
async fn test_get_appointment_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = get_appointment(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Path(Uuid::new_v4()),
    ).await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_list_my_appointments_filters_orders_and_caps_limit() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    let hospital_id = Uuid::new_v4().to_string();
    let speciality_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("user_id", format!("eq.{}", user.id)))
        .and(query_param("status", "eq.cancelled"))
        .and(query_param("order", "appointment_date.asc"))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(), &user.id, &hospital_id, &speciality_id, "cancelled",
            ),
            MockSupabaseResponses::appointment_response(
                &Uuid::new_v4().to_string(), &user.id, &hospital_id, &speciality_id, "cancelled",
            ),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let query = AppointmentListQuery {
        status: Some(AppointmentStatus::Cancelled),
        limit: Some(250),
        offset: Some(5),
    };

    let result = list_my_appointments(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Query(query),
    ).await;

    let response = result.expect("listing should succeed").0;
    assert_eq!(response["total"], 2);
    assert_eq!(response["appointments"][0]["status"], "cancelled");
}

#[tokio::test]
async fn test_store_not_found_is_reported_as_404() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(404).set_body_json(
            MockSupabaseResponses::error_response("relation not found", "PGRST205"),
        ))
        .mount(&mock_server)
        .await;

    let result = get_appointment(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Path(Uuid::new_v4()),
    ).await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_cancel_already_cancelled_conflicts() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id.to_string(),
                &user.id,
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                "cancelled",
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = cancel_appointment(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Path(appointment_id),
    ).await;

    assert_matches!(result, Err(AppError::Conflict(_)));
}

#[tokio::test]
async fn test_cancel_releases_severity_bucket() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    let (appointment_id, speciality_id) = (Uuid::new_v4(), Uuid::new_v4());
    let hospital_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id.to_string(), &user.id, &hospital_id, &speciality_id.to_string(), "booked",
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.booked"))
        .and(body_partial_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id.to_string(), &user.id, &hospital_id, &speciality_id.to_string(), "cancelled",
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut speciality = MockSupabaseResponses::speciality_response(&speciality_id.to_string(), "Neurology");
    speciality["severity"] = json!({ "low": 0, "medium": 2, "high": 0 });

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([speciality.clone()])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/specialities"))
        .and(body_partial_json(json!({ "severity": { "medium": 1 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([speciality])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = cancel_appointment(
        State(config),
        auth_header(&token),
        Extension(user.to_user()),
        Path(appointment_id),
    ).await;

    assert_eq!(result.unwrap().0["status"], "cancelled");
}

#[tokio::test]
async fn test_routes_require_authentication() {
    let app = appointment_routes(Arc::new(TestConfig::default().to_app_config()));

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
