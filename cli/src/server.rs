use std::net::UdpSocket;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use reps_core::achievements::AchievementState;
use reps_core::error::CoreError;
use reps_core::models::{
    CompletionDetail, NewWorkout, Profile, ProfileInput, SettingsInput, UpdateWorkout,
    UserSettings, Workout,
};
use reps_core::service::{CompletionReceipt, Dashboard, SavedSettings};
use reps_core::timeline::{DEFAULT_TIMELINE_DAYS, Timeline};

use crate::Service;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB
const MAX_TIMELINE_DAYS: u32 = 366;

#[derive(Clone)]
struct AppState {
    service: Arc<Mutex<Service>>,
    api_key: Option<String>,
}

impl AppState {
    fn service(&self) -> MutexGuard<'_, Service> {
        self.service.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Request / Response types ---

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[allow(clippy::option_option)]
struct UpdateWorkoutRequest {
    name: Option<String>,
    plan: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    category: Option<Option<String>>,
}

#[derive(Deserialize)]
struct TimelineQuery {
    days: Option<u32>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                tracing::error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAuthenticated => Self::Unauthorized(err.to_string()),
            CoreError::WorkoutNotFound(_) => Self::NotFound(err.to_string()),
            CoreError::InvalidDateKey(_)
            | CoreError::InvalidInput(_)
            | CoreError::InvalidConfiguration(_) => Self::BadRequest(err.to_string()),
            CoreError::Upstream(inner) => Self::Internal(inner),
        }
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Progress handlers ---

async fn get_dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.service().dashboard()?))
}

async fn get_timeline(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<Timeline>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_TIMELINE_DAYS);
    if days == 0 || days > MAX_TIMELINE_DAYS {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {MAX_TIMELINE_DAYS}"
        )));
    }
    Ok(Json(state.service().timeline(days)?))
}

async fn get_day(
    State(state): State<AppState>,
    Path(ymd): Path<String>,
) -> Result<Json<Vec<CompletionDetail>>, ApiError> {
    Ok(Json(state.service().day_details(&ymd)?))
}

async fn get_achievements(
    State(state): State<AppState>,
) -> Result<Json<Vec<AchievementState>>, ApiError> {
    Ok(Json(state.service().achievements()?))
}

// --- Workout handlers ---

async fn list_workouts(State(state): State<AppState>) -> Result<Json<Vec<Workout>>, ApiError> {
    Ok(Json(state.service().list_workouts()?))
}

async fn create_workout(
    State(state): State<AppState>,
    Json(req): Json<NewWorkout>,
) -> Result<(StatusCode, Json<Workout>), ApiError> {
    let workout = state.service().create_workout(req)?;
    Ok((StatusCode::CREATED, Json(workout)))
}

async fn get_workout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Workout>, ApiError> {
    Ok(Json(state.service().get_workout(id)?))
}

async fn update_workout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateWorkoutRequest>,
) -> Result<Json<Workout>, ApiError> {
    let update = UpdateWorkout {
        name: req.name,
        plan: req.plan,
        category: req.category,
        ..UpdateWorkout::default()
    };
    if update.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one field must be provided".to_string(),
        ));
    }
    Ok(Json(state.service().update_workout(id, update)?))
}

async fn delete_workout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service().delete_workout(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn complete_workout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<CompletionReceipt>), ApiError> {
    let receipt = state.service().mark_complete(id)?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

// --- Settings & profile handlers ---

async fn get_settings(State(state): State<AppState>) -> Result<Json<UserSettings>, ApiError> {
    Ok(Json(state.service().settings()?))
}

async fn put_settings(
    State(state): State<AppState>,
    Json(req): Json<SettingsInput>,
) -> Result<Json<SavedSettings>, ApiError> {
    Ok(Json(state.service().save_settings(req)?))
}

async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.service().profile()?))
}

async fn put_profile(
    State(state): State<AppState>,
    Json(req): Json<ProfileInput>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.service().save_profile(req)?))
}

// --- Mobile connect ---

fn detect_local_ip() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let addr = socket.local_addr().ok()?;
    let ip = addr.ip();
    if ip.is_loopback() {
        None
    } else {
        Some(ip.to_string())
    }
}

/// Build a `reps://connect` deep link the mobile app uses to configure itself.
fn build_connect_deep_link(server_url: &str, api_key: &str) -> String {
    let encoded_url = percent_encode_component(server_url);
    format!("reps://connect?url={encoded_url}&key={api_key}")
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn percent_encode_component(input: &str) -> String {
    use std::fmt::Write;

    let mut encoded = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/timeline", get(get_timeline))
        .route("/api/days/{ymd}", get(get_day))
        .route("/api/achievements", get(get_achievements))
        .route("/api/workouts", get(list_workouts).post(create_workout))
        .route(
            "/api/workouts/{id}",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
        .route("/api/workouts/{id}/complete", post(complete_workout))
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/api/profile", get(get_profile).put(put_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four characters of `key`; keys too short to show any part
/// of are fully masked.
fn redact_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub async fn start_server(
    service: Service,
    port: u16,
    bind: &str,
    api_key: Option<String>,
    new_api_key: bool,
) -> anyhow::Result<()> {
    match service.current_user()? {
        Some(user) => tracing::info!(user = %user, "serving signed-in user"),
        None => eprintln!("Warning: nobody is signed in; requests will fail until `reps login`."),
    }

    let state = AppState {
        service: Arc::new(Mutex::new(service)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        eprintln!(
            "API key: {} (see api_key file in data directory)",
            redact_key(key)
        );
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    if new_api_key {
        if let Some(ref key) = api_key {
            let host = if bind == "0.0.0.0" {
                detect_local_ip().unwrap_or_else(|| bind.to_string())
            } else {
                bind.to_string()
            };
            let deep_link = build_connect_deep_link(&format!("http://{host}:{port}"), key);
            eprintln!("Open on your phone to connect: {deep_link}");
        }
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    eprintln!("Listening on http://{bind}:{port}");
    tracing::info!(bind, port, "server started");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use reps_core::db::Database;
    use reps_core::service::FitnessService;
    use reps_core::store::SystemClock;
    use tower::ServiceExt;

    fn test_state(api_key: Option<String>, signed_in: bool) -> AppState {
        let service = FitnessService::new(Database::open_in_memory().unwrap(), SystemClock);
        if signed_in {
            service.sign_in("u1").unwrap();
        }
        AppState {
            service: Arc::new(Mutex::new(service)),
            api_key,
        }
    }

    fn test_app(api_key: Option<String>) -> Router {
        build_router(test_state(api_key, true))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn create_workout(app: &Router, name: &str) -> i64 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/workouts",
                &serde_json::json!({ "name": name, "plan": ["Warm up", "Intervals"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn auth_missing_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app.oneshot(get_request("/api/dashboard")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid or missing API key");
    }

    #[tokio::test]
    async fn auth_wrong_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/dashboard")
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_correct_key_succeeds() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/dashboard")
                    .header("Authorization", "Bearer test-key-abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(None);

        let response = app.oneshot(get_request("/api/dashboard")).await.unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn not_signed_in_returns_401() {
        let app = build_router(test_state(None, false));

        let response = app.oneshot(get_request("/api/dashboard")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("Not signed in"));
    }

    #[tokio::test]
    async fn empty_dashboard() {
        let app = test_app(None);

        let response = app.oneshot(get_request("/api/dashboard")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["streak_days"], 0);
        assert_eq!(json["weekly"]["done"], 0);
        assert_eq!(json["weekly"]["target"], 3);
        assert_eq!(json["xp"]["level"], 1);
        assert_eq!(json["timeline"].as_array().unwrap().len(), 14);
        assert!(
            json["achievements"]
                .as_array()
                .unwrap()
                .iter()
                .all(|a| a["unlocked"] == false)
        );
    }

    #[tokio::test]
    async fn workout_crud() {
        let app = test_app(None);
        let id = create_workout(&app, "Tempo Run").await;

        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/workouts/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["name"], "Tempo Run");
        assert_eq!(json["plan"], serde_json::json!(["Warm up", "Intervals"]));

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/workouts/{id}"),
                &serde_json::json!({ "name": "Long Run", "category": "cardio" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["name"], "Long Run");
        assert_eq!(json["category"], "cardio");

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/workouts/{id}"),
                &serde_json::json!({ "category": null }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json.get("category").is_none());

        let response = app.clone().oneshot(get_request("/api/workouts")).await.unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(
                axum::http::Request::delete(format!("/api/workouts/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(get_request(&format!("/api/workouts/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_workout_blank_name_returns_400() {
        let app = test_app(None);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/workouts",
                &serde_json::json!({ "name": "   " }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_workout_empty_body_returns_400() {
        let app = test_app(None);
        let id = create_workout(&app, "Tempo Run").await;

        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/api/workouts/{id}"),
                &serde_json::json!({}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "At least one field must be provided");
    }

    #[tokio::test]
    async fn complete_workout_updates_progress() {
        let app = test_app(None);
        let id = create_workout(&app, "Tempo Run").await;

        let response = app
            .clone()
            .oneshot(
                axum::http::Request::post(format!("/api/workouts/{id}/complete"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["points"], 10);
        assert_eq!(json["completion"]["workout_id"], id);

        let response = app.clone().oneshot(get_request("/api/dashboard")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["streak_days"], 1);
        assert_eq!(json["points"], 10);
        let timeline = json["timeline"].as_array().unwrap();
        let today = timeline.last().unwrap();
        assert_eq!(today["is_today"], true);
        assert_eq!(today["completion_count"], 1);

        let ymd = today["date_key"].as_str().unwrap().to_string();
        let response = app
            .oneshot(get_request(&format!("/api/days/{ymd}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json[0]["workout_name"], "Tempo Run");
    }

    #[tokio::test]
    async fn complete_unknown_workout_returns_404() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::post("/api/workouts/999/complete")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Workout 999 not found");
    }

    #[tokio::test]
    async fn invalid_day_returns_400() {
        let app = test_app(None);

        let response = app.oneshot(get_request("/api/days/2024-13-01")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn timeline_days_param() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(get_request("/api/timeline?days=7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 7);

        let response = app
            .clone()
            .oneshot(get_request("/api/timeline"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 14);

        let response = app
            .oneshot(get_request("/api/timeline?days=0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn achievements_list() {
        let app = test_app(None);
        create_workout(&app, "Tempo Run").await;

        let response = app.oneshot(get_request("/api/achievements")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let unlocked: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["unlocked"] == true)
            .map(|a| a["key"].as_str().unwrap())
            .collect();
        assert_eq!(unlocked, vec!["first_workout"]);
    }

    #[tokio::test]
    async fn settings_roundtrip_with_fallbacks() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/settings",
                &serde_json::json!({
                    "goal": "endurance",
                    "weekly_target": -1,
                    "reminders_enabled": true,
                    "reminder_time": "25:99"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["settings"]["weekly_target"], 3);
        assert_eq!(json["settings"]["reminder_time"], "19:00");
        assert_eq!(json["reminder"]["action"], "scheduled");
        assert_eq!(json["reminder"]["at"], "19:00");

        let response = app.oneshot(get_request("/api/settings")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["goal"], "endurance");
        assert_eq!(json["reminders_enabled"], true);
    }

    #[tokio::test]
    async fn profile_roundtrip() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/profile",
                &serde_json::json!({ "full_name": "Sam Lee" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get_request("/api/profile")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["full_name"], "Sam Lee");
        assert_eq!(json["user_id"], "u1");
    }

    #[test]
    fn percent_encode_component_escapes_reserved() {
        assert_eq!(
            percent_encode_component("http://192.168.1.10:8080"),
            "http%3A%2F%2F192.168.1.10%3A8080"
        );
        assert_eq!(percent_encode_component("a-b_c.d~e"), "a-b_c.d~e");
    }

    #[test]
    fn connect_deep_link_format() {
        let link = build_connect_deep_link("http://10.0.0.2:8080", "abc123");
        assert_eq!(link, "reps://connect?url=http%3A%2F%2F10.0.0.2%3A8080&key=abc123");
    }

    #[test]
    fn redact_key_shows_ends_only() {
        assert_eq!(redact_key("0123456789abcdef"), "0123...cdef");
        assert_eq!(redact_key("abcdefgh"), "abcd...efgh");
    }

    #[test]
    fn redact_key_masks_short_keys() {
        assert_eq!(redact_key(""), "****");
        assert_eq!(redact_key("abc"), "****");
        assert_eq!(redact_key("abcdefg"), "****");
    }

    #[test]
    fn redact_key_handles_multibyte() {
        assert_eq!(redact_key("ключ-секрет"), "ключ...крет");
        assert_eq!(redact_key("🔑🔑🔑"), "****");
    }

    #[test]
    fn detect_local_ip_returns_non_loopback() {
        // May be None in sandboxed environments without a route out.
        if let Some(ip) = detect_local_ip() {
            assert!(!ip.starts_with("127."), "IP should not be loopback: {ip}");
        }
    }
}
