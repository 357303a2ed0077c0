//! Integration tests for the staffing portal API.
//!
//! Each test builds the router over a fresh in-memory database seeded with
//! one admin and two recruiters, and drives it with `oneshot` requests:
//! - Health and authentication
//! - User management
//! - Candidate ownership
//! - Applications, interviews and assessments
//! - Attendance submission and review
//! - Policy impact over a week
//! - Metrics, alerts and the audit trail

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

use staffing_portal::api::{create_router, hash_password, AppState, TokenSigner};
use staffing_portal::config::ConfigLoader;
use staffing_portal::db::{self, alerts::NewAlert, applications::NewApplication, users::NewUser};
use staffing_portal::models::{AlertKind, ApplicationStatus, Role, User};

// =============================================================================
// Test Helpers
// =============================================================================

const PASSWORD: &str = "correct-horse";

struct TestApp {
    router: Router,
    pool: SqlitePool,
    admin: User,
    recruiter: User,
    other: User,
    admin_token: String,
    recruiter_token: String,
    other_token: String,
}

async fn seed_user(pool: &SqlitePool, email: &str, role: Role) -> User {
    db::users::insert(
        pool,
        &NewUser {
            email: email.to_string(),
            full_name: email.split('@').next().unwrap().to_string(),
            role,
            password_hash: hash_password(PASSWORD).unwrap(),
            daily_quota: None,
        },
    )
    .await
    .unwrap()
}

async fn setup() -> TestApp {
    let pool = db::connect_in_memory().await.unwrap();
    let config = ConfigLoader::load("./config/portal").expect("Failed to load config");
    let admin = seed_user(&pool, "ops@agency.test", Role::Admin).await;
    let recruiter = seed_user(&pool, "priya@agency.test", Role::Recruiter).await;
    let other = seed_user(&pool, "omar@agency.test", Role::Recruiter).await;

    let tokens = TokenSigner::new("integration-test-secret", Duration::hours(1));
    let now = Utc::now();
    let admin_token = tokens.issue(&admin, now).unwrap().0;
    let recruiter_token = tokens.issue(&recruiter, now).unwrap().0;
    let other_token = tokens.issue(&other, now).unwrap().0;

    TestApp {
        router: create_router(AppState::new(pool.clone(), config, tokens)),
        pool,
        admin,
        recruiter,
        other,
        admin_token,
        recruiter_token,
        other_token,
    }
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, json)
}

async fn create_candidate(app: &TestApp, token: &str, email: &str) -> i64 {
    let (status, body) = send(
        &app.router,
        "POST",
        "/candidates",
        Some(token),
        Some(json!({"full_name": "Asha Rao", "email": email, "technology": "Java"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

fn make_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

// =============================================================================
// SECTION 1: Health & Authentication
// =============================================================================

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = setup().await;
    let (status, body) = send(&app.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_login_returns_usable_token() {
    let app = setup().await;
    let (status, body) = send(
        &app.router,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "PRIYA@agency.test", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "recruiter");
    assert!(body.get("password_hash").is_none());

    let token = body["token"].as_str().unwrap();
    let (status, me) = send(&app.router, "GET", "/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], app.recruiter.id);
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let app = setup().await;
    let (wrong_status, wrong) = send(
        &app.router,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "priya@agency.test", "password": "not-the-password"})),
    )
    .await;
    let (unknown_status, unknown) = send(
        &app.router,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "nobody@agency.test", "password": PASSWORD})),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["message"], unknown["message"]);
}

#[tokio::test]
async fn test_missing_or_garbled_token_is_rejected() {
    let app = setup().await;
    let (status, body) = send(&app.router, "GET", "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(&app.router, "GET", "/me", Some("abc.def"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivated_user_loses_access() {
    let app = setup().await;
    let (status, _) = send(
        &app.router,
        "PATCH",
        &format!("/users/{}", app.recruiter.id),
        Some(&app.admin_token),
        Some(json!({"active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app.router, "GET", "/me", Some(&app.recruiter_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// SECTION 2: User Management
// =============================================================================

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let app = setup().await;
    let (status, body) = send(&app.router, "GET", "/users", Some(&app.recruiter_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, users) = send(&app.router, "GET", "/users", Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_admin_creates_user() {
    let app = setup().await;
    let request = json!({
        "email": "new@agency.test",
        "full_name": "New Hire",
        "role": "recruiter",
        "password": "long-enough",
        "daily_quota": 15
    });
    let (status, body) = send(&app.router, "POST", "/users", Some(&app.admin_token), Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["daily_quota"], 15);

    let (status, body) = send(&app.router, "POST", "/users", Some(&app.admin_token), Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_short_password_is_validation_error() {
    let app = setup().await;
    let (status, body) = send(
        &app.router,
        "POST",
        "/users",
        Some(&app.admin_token),
        Some(json!({"email": "x@agency.test", "full_name": "X", "role": "admin", "password": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"], "password");
}

#[tokio::test]
async fn test_missing_field_and_bad_json() {
    let app = setup().await;
    let (status, body) = send(
        &app.router,
        "POST",
        "/users",
        Some(&app.admin_token),
        Some(json!({"email": "x@agency.test"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// SECTION 3: Candidates
// =============================================================================

#[tokio::test]
async fn test_recruiter_creates_and_sees_only_own_candidates() {
    let app = setup().await;
    let own = create_candidate(&app, &app.recruiter_token, "asha@example.com").await;
    create_candidate(&app, &app.other_token, "ben@example.com").await;

    let (status, list) = send(&app.router, "GET", "/candidates", Some(&app.recruiter_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], own);
    assert_eq!(list[0]["recruiter_id"], app.recruiter.id);
    assert_eq!(list[0]["stage"], "onboarding");

    let (status, all) = send(&app.router, "GET", "/candidates", Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_recruiter_cannot_touch_other_candidates() {
    let app = setup().await;
    let theirs = create_candidate(&app, &app.other_token, "ben@example.com").await;

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/candidates/{}", theirs),
        Some(&app.recruiter_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        "POST",
        "/candidates",
        Some(&app.recruiter_token),
        Some(json!({"full_name": "C", "email": "c@example.com", "recruiter_id": app.other.id})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_only_admin_reassigns_candidates() {
    let app = setup().await;
    let id = create_candidate(&app, &app.recruiter_token, "asha@example.com").await;
    let uri = format!("/candidates/{}", id);

    let (status, _) = send(
        &app.router,
        "PATCH",
        &uri,
        Some(&app.recruiter_token),
        Some(json!({"recruiter_id": app.other.id})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        "PATCH",
        &uri,
        Some(&app.admin_token),
        Some(json!({"recruiter_id": app.other.id, "stage": "marketing"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recruiter_id"], app.other.id);
    assert_eq!(body["stage"], "marketing");

    let (status, body) = send(
        &app.router,
        "PATCH",
        &uri,
        Some(&app.admin_token),
        Some(json!({"recruiter_id": 9999})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "recruiter_id");
}

#[tokio::test]
async fn test_unknown_candidate_is_not_found() {
    let app = setup().await;
    let (status, body) = send(&app.router, "GET", "/candidates/4242", Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "candidate 4242 not found");
}

// =============================================================================
// SECTION 4: Pipeline Activity
// =============================================================================

#[tokio::test]
async fn test_application_flow() {
    let app = setup().await;
    let candidate = create_candidate(&app, &app.recruiter_token, "asha@example.com").await;

    let (status, created) = send(
        &app.router,
        "POST",
        "/applications",
        Some(&app.recruiter_token),
        Some(json!({
            "candidate_id": candidate,
            "company": "Initech",
            "job_title": "Java Developer",
            "applied_on": "2026-01-13"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "applied");
    assert_eq!(created["recruiter_id"], app.recruiter.id);

    let (status, updated) = send(
        &app.router,
        "PATCH",
        &format!("/applications/{}", created["id"]),
        Some(&app.recruiter_token),
        Some(json!({"status": "screening"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["status"], "screening");

    let (_, mine) = send(&app.router, "GET", "/applications", Some(&app.recruiter_token), None).await;
    let (_, theirs) = send(&app.router, "GET", "/applications", Some(&app.other_token), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert!(theirs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cannot_log_activity_for_other_candidate() {
    let app = setup().await;
    let theirs = create_candidate(&app, &app.other_token, "ben@example.com").await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/applications",
        Some(&app.recruiter_token),
        Some(json!({"candidate_id": theirs, "company": "Initech", "job_title": "Dev"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        "POST",
        "/applications",
        Some(&app.recruiter_token),
        Some(json!({"candidate_id": 777, "company": "Initech", "job_title": "Dev"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "candidate_id");
}

#[tokio::test]
async fn test_interview_must_reference_same_candidate_application() {
    let app = setup().await;
    let asha = create_candidate(&app, &app.recruiter_token, "asha@example.com").await;
    let ben = create_candidate(&app, &app.recruiter_token, "ben@example.com").await;

    let (_, application) = send(
        &app.router,
        "POST",
        "/applications",
        Some(&app.recruiter_token),
        Some(json!({"candidate_id": asha, "company": "Initech", "job_title": "Dev"})),
    )
    .await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/interviews",
        Some(&app.recruiter_token),
        Some(json!({
            "candidate_id": ben,
            "application_id": application["id"],
            "company": "Initech",
            "kind": "technical",
            "scheduled_at": "2026-01-20T11:00:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "application_id");

    let (status, interview) = send(
        &app.router,
        "POST",
        "/interviews",
        Some(&app.recruiter_token),
        Some(json!({
            "candidate_id": asha,
            "application_id": application["id"],
            "company": "Initech",
            "kind": "technical",
            "scheduled_at": "2026-01-20T11:00:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", interview);
    assert_eq!(interview["status"], "scheduled");
}

#[tokio::test]
async fn test_assessment_score_bounds() {
    let app = setup().await;
    let candidate = create_candidate(&app, &app.recruiter_token, "asha@example.com").await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/assessments",
        Some(&app.recruiter_token),
        Some(json!({"candidate_id": candidate, "company": "Initech", "title": "Take-home", "score": 150})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "score");

    let (status, created) = send(
        &app.router,
        "POST",
        "/assessments",
        Some(&app.recruiter_token),
        Some(json!({"candidate_id": candidate, "company": "Initech", "title": "Take-home"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");

    let (status, updated) = send(
        &app.router,
        "PATCH",
        &format!("/assessments/{}", created["id"]),
        Some(&app.recruiter_token),
        Some(json!({"status": "passed", "score": 88})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["score"], 88);
}

// =============================================================================
// SECTION 5: Attendance Submission & Review
// =============================================================================

async fn submit_attendance(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    send(&app.router, "POST", "/attendance", Some(token), Some(body)).await
}

#[tokio::test]
async fn test_submit_then_resubmit() {
    let app = setup().await;
    let (status, first) = submit_attendance(
        &app,
        &app.recruiter_token,
        json!({"date": "2026-01-13", "reported_status": "present",
               "login_at": "2026-01-13T09:00:00", "logout_at": "2026-01-13T18:00:00"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["approval_status"], "pending");

    let (status, second) = submit_attendance(
        &app,
        &app.recruiter_token,
        json!({"date": "2026-01-13", "reported_status": "half_day"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["reported_status"], "half_day");
}

#[tokio::test]
async fn test_review_and_approved_record_is_locked() {
    let app = setup().await;
    let (_, record) = submit_attendance(
        &app,
        &app.recruiter_token,
        json!({"date": "2026-01-13", "reported_status": "present"}),
    )
    .await;
    let review_uri = format!("/attendance/{}/review", record["id"]);

    let (status, _) = send(
        &app.router,
        "POST",
        &review_uri,
        Some(&app.recruiter_token),
        Some(json!({"decision": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, reviewed) = send(
        &app.router,
        "POST",
        &review_uri,
        Some(&app.admin_token),
        Some(json!({"decision": "approved", "note": "ok"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["approval_status"], "approved");
    assert_eq!(reviewed["reviewed_by"], app.admin.id);

    let (status, body) = submit_attendance(
        &app,
        &app.recruiter_token,
        json!({"date": "2026-01-13", "reported_status": "leave"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_review_decision_must_be_final() {
    let app = setup().await;
    let (_, record) = submit_attendance(
        &app,
        &app.recruiter_token,
        json!({"date": "2026-01-13", "reported_status": "present"}),
    )
    .await;
    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/attendance/{}/review", record["id"]),
        Some(&app.admin_token),
        Some(json!({"decision": "pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "decision");
}

#[tokio::test]
async fn test_future_present_is_rejected() {
    let app = setup().await;
    let tomorrow = (chrono::Local::now().date_naive() + Duration::days(1)).to_string();
    let (status, body) = submit_attendance(
        &app,
        &app.recruiter_token,
        json!({"date": tomorrow, "reported_status": "present"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "date");

    let (status, _) = submit_attendance(
        &app,
        &app.recruiter_token,
        json!({"date": tomorrow, "reported_status": "leave"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_attendance_list_scoping() {
    let app = setup().await;
    submit_attendance(&app, &app.recruiter_token, json!({"date": "2026-01-13", "reported_status": "present"})).await;
    submit_attendance(&app, &app.other_token, json!({"date": "2026-01-13", "reported_status": "leave"})).await;

    let (status, mine) = send(&app.router, "GET", "/attendance", Some(&app.recruiter_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/attendance?user_id={}", app.other.id),
        Some(&app.recruiter_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, pending) = send(
        &app.router,
        "GET",
        "/attendance?approval_status=pending",
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 2);
}

// =============================================================================
// SECTION 6: Policy Impact
// =============================================================================

/// Week of 2026-01-12 (Mon) to 2026-01-18 (Sun) for the recruiter:
/// - Mon: present, no applications (quota shortfall)
/// - Tue: present, 10 applications (at threshold, no flag)
/// - Wed: present, late login and no applications (one flag)
/// - Thu: present, no applications (quota shortfall)
/// - Fri: no record (uninformed leave)
/// - Sat/Sun: sandwiched between Fri and the missing Mon 2026-01-19
async fn seed_week(app: &TestApp) {
    for (date, login) in [
        ("2026-01-12", "09:00:00"),
        ("2026-01-13", "09:00:00"),
        ("2026-01-14", "10:30:00"),
        ("2026-01-15", "09:05:00"),
    ] {
        let (status, record) = submit_attendance(
            app,
            &app.recruiter_token,
            json!({
                "date": date,
                "reported_status": "present",
                "login_at": format!("{}T{}", date, login),
                "logout_at": format!("{}T18:00:00", date),
                "break_minutes": 45
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", record);
        let (status, _) = send(
            &app.router,
            "POST",
            &format!("/attendance/{}/review", record["id"]),
            Some(&app.admin_token),
            Some(json!({"decision": "approved"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let candidate = create_candidate(app, &app.recruiter_token, "asha@example.com").await;
    for i in 0..10 {
        db::applications::insert(
            &app.pool,
            &NewApplication {
                candidate_id: candidate,
                recruiter_id: app.recruiter.id,
                company: format!("Company {}", i),
                job_title: "Java Developer".to_string(),
                job_url: None,
                status: ApplicationStatus::Applied,
                applied_on: make_date("2026-01-13"),
                notes: None,
            },
        )
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn test_impact_for_week() {
    let app = setup().await;
    seed_week(&app).await;

    let (status, impact) = send(
        &app.router,
        "GET",
        "/attendance/impact?start=2026-01-12&end=2026-01-18&as_of=2026-03-31",
        Some(&app.recruiter_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", impact);

    let totals = &impact["totals"];
    assert_eq!(totals["evaluated_days"], 7);
    assert_eq!(totals["working_days"], 5);
    assert_eq!(totals["present_days"], 4);
    assert_eq!(totals["absent_days"], 3);
    assert_eq!(totals["half_day_flags"], 3);
    assert_eq!(totals["full_day_deductions"], 1);
    assert_eq!(totals["remaining_half_day_flags"], 1);
    assert_eq!(totals["uninformed_leave_days"], 1);
    assert_eq!(totals["sandwich_days"], 2);
    assert_eq!(totals["leave_deduction_days"], 3);
    assert_eq!(totals["total_deduction_days"], "4");

    let days = impact["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[1]["applications_logged"], 10);
    assert_eq!(days[1]["half_day_flag"], false);
    assert_eq!(days[2]["half_day_reasons"], json!(["late_login", "quota_shortfall"]));
    assert_eq!(days[5]["sandwiched"], true);
    assert!(impact["trace"]["steps"].as_array().unwrap().len() >= 10);
}

#[tokio::test]
async fn test_impact_permissions() {
    let app = setup().await;
    let uri = format!(
        "/attendance/impact?user_id={}&start=2026-01-12&end=2026-01-18&as_of=2026-03-31",
        app.recruiter.id
    );

    let (status, _) = send(&app.router, "GET", &uri, Some(&app.other_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, impact) = send(&app.router, "GET", &uri, Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(impact["user_id"], app.recruiter.id);
    assert_eq!(impact["totals"]["uninformed_leave_days"], 5);
}

#[tokio::test]
async fn test_impact_today_without_report_is_not_leave() {
    let app = setup().await;
    let today = chrono::Local::now().date_naive();
    let uri = format!("/attendance/impact?start={today}&end={today}");

    let (status, impact) = send(&app.router, "GET", &uri, Some(&app.recruiter_token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", impact);
    assert_eq!(impact["as_of"], today.to_string());
    assert_eq!(impact["totals"]["uninformed_leave_days"], 0);
    assert_eq!(impact["totals"]["total_deduction_days"], "0");
    assert_eq!(impact["days"][0]["uninformed_leave"], false);
}

#[tokio::test]
async fn test_impact_range_validation() {
    let app = setup().await;
    let (status, body) = send(
        &app.router,
        "GET",
        "/attendance/impact?start=2026-01-18&end=2026-01-12",
        Some(&app.recruiter_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "end");

    let (status, body) = send(
        &app.router,
        "GET",
        "/attendance/impact?start=2024-01-01&end=2024-01-07&as_of=2024-12-31",
        Some(&app.recruiter_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "POLICY_NOT_FOUND");

    let (status, body) = send(
        &app.router,
        "GET",
        "/attendance/impact?start=2026-01-12",
        Some(&app.recruiter_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// =============================================================================
// SECTION 7: Metrics, Alerts & Audit
// =============================================================================

#[tokio::test]
async fn test_pipeline_metrics_scoped() {
    let app = setup().await;
    create_candidate(&app, &app.recruiter_token, "asha@example.com").await;
    create_candidate(&app, &app.other_token, "ben@example.com").await;

    let (status, mine) = send(&app.router, "GET", "/metrics/pipeline", Some(&app.recruiter_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["candidates_by_stage"]["onboarding"], 1);

    let (_, all) = send(&app.router, "GET", "/metrics/pipeline", Some(&app.admin_token), None).await;
    assert_eq!(all["candidates_by_stage"]["onboarding"], 2);
}

#[tokio::test]
async fn test_performance_report() {
    let app = setup().await;
    seed_week(&app).await;

    let (status, _) = send(&app.router, "GET", "/metrics/performance", Some(&app.recruiter_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, rows) = send(
        &app.router,
        "GET",
        "/metrics/performance?start=2026-01-12&end=2026-01-16",
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", rows);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let priya = rows.iter().find(|r| r["user_id"] == app.recruiter.id).unwrap();
    assert_eq!(priya["activity"]["applications"], 10);
    assert_eq!(priya["attendance"]["present_days"], 4);
    assert_eq!(priya["attendance"]["uninformed_leave_days"], 1);

    let omar = rows.iter().find(|r| r["user_id"] == app.other.id).unwrap();
    assert_eq!(omar["activity"]["applications"], 0);
    assert_eq!(omar["attendance"]["uninformed_leave_days"], 5);
}

#[tokio::test]
async fn test_alert_visibility_and_acknowledgement() {
    let app = setup().await;
    let now = Utc::now();
    for alert in [
        NewAlert {
            user_id: Some(app.recruiter.id),
            kind: AlertKind::MissingAttendance,
            message: "No attendance submitted for 2026-01-13".to_string(),
            dedupe_key: format!("missing_attendance:{}:2026-01-13", app.recruiter.id),
        },
        NewAlert {
            user_id: Some(app.other.id),
            kind: AlertKind::QuotaShortfall,
            message: "0 of 20 applications logged on 2026-01-13".to_string(),
            dedupe_key: format!("quota_shortfall:{}:2026-01-13", app.other.id),
        },
        NewAlert {
            user_id: None,
            kind: AlertKind::PendingApproval,
            message: "Attendance pending".to_string(),
            dedupe_key: "pending_approval:1".to_string(),
        },
    ] {
        db::alerts::insert_if_absent(&app.pool, &alert, now).await.unwrap();
    }

    let (status, mine) = send(&app.router, "GET", "/alerts", Some(&app.recruiter_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|a| a["user_id"] != app.other.id));

    let (_, all) = send(&app.router, "GET", "/alerts", Some(&app.admin_token), None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let others = all
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["user_id"] == app.other.id)
        .unwrap()["id"]
        .clone();
    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/alerts/{}/ack", others),
        Some(&app.recruiter_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let own = mine.iter().find(|a| a["user_id"] == app.recruiter.id).unwrap()["id"].clone();
    let (status, acked) = send(
        &app.router,
        "POST",
        &format!("/alerts/{}/ack", own),
        Some(&app.recruiter_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(acked["acknowledged_at"].is_string());

    let (_, open) = send(
        &app.router,
        "GET",
        "/alerts?unacknowledged_only=true",
        Some(&app.recruiter_token),
        None,
    )
    .await;
    assert_eq!(open.as_array().unwrap().len(), 1);

    // The broadcast stays open for the admins until one of them acknowledges it
    let broadcast = mine.iter().find(|a| a["user_id"].is_null()).unwrap()["id"].clone();
    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/alerts/{}/ack", broadcast),
        Some(&app.recruiter_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, admin_open) = send(
        &app.router,
        "GET",
        "/alerts?unacknowledged_only=true",
        Some(&app.admin_token),
        None,
    )
    .await;
    assert!(admin_open
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["id"] == broadcast));

    let (status, acked) = send(
        &app.router,
        "POST",
        &format!("/alerts/{}/ack", broadcast),
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(acked["acknowledged_at"].is_string());
}

#[tokio::test]
async fn test_mutations_are_audited() {
    let app = setup().await;
    let candidate = create_candidate(&app, &app.recruiter_token, "asha@example.com").await;
    send(
        &app.router,
        "PATCH",
        &format!("/candidates/{}", candidate),
        Some(&app.recruiter_token),
        Some(json!({"stage": "marketing"})),
    )
    .await;

    let (status, _) = send(&app.router, "GET", "/audit-logs", Some(&app.recruiter_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, logs) = send(
        &app.router,
        "GET",
        "/audit-logs?entity=candidate",
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["action"], "update");
    assert_eq!(logs[0]["details"]["changes"]["stage"], "marketing");
    assert_eq!(logs[1]["action"], "create");
    assert_eq!(logs[1]["actor_id"], app.recruiter.id);
}
