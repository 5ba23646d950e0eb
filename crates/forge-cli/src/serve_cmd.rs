use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use forge_core::chat::{ChatError, apply_chat};
use forge_core::llm::TextGenerator;
use forge_core::nutrition::lookup::is_barcode;
use forge_core::nutrition::{self, FoodEntryInput, FoodLogError, FoodLookup};
use forge_core::plan::{self, GenerationError, PlanServiceError};
use forge_core::profile::{ProfileError, ProfileSnapshot};
use forge_core::tracking::{TrackingError, log_performance, save_exercise_note};
use forge_db::models::{Exercise, WorkoutLog, WorkoutPlan};
use forge_db::queries::plans::PlanTree;
use forge_db::queries::{exercise_notes, profiles, users, workout_logs};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared handler state: the pool plus the two outbound collaborators.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub generator: Arc<dyn TextGenerator>,
    pub food: Arc<dyn FoodLookup>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.into(),
        }
    }
}

/// Map a typed error anywhere in the chain to its HTTP status. Anything
/// unrecognized is a 500.
fn status_for(err: &anyhow::Error) -> StatusCode {
    if let Some(e) = err.downcast_ref::<GenerationError>() {
        return match e {
            GenerationError::MissingCredential(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GenerationError::Model(_) | GenerationError::Malformed(_) => StatusCode::BAD_GATEWAY,
        };
    }
    if err.downcast_ref::<PlanServiceError>().is_some() {
        return StatusCode::NOT_FOUND;
    }
    if err.downcast_ref::<ChatError>().is_some() || err.downcast_ref::<ProfileError>().is_some() {
        return StatusCode::BAD_REQUEST;
    }
    if let Some(e) = err.downcast_ref::<TrackingError>() {
        return match e {
            TrackingError::ExerciseNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
    }
    if let Some(e) = err.downcast_ref::<FoodLogError>() {
        return match e {
            FoodLogError::NotFound(_) => StatusCode::NOT_FOUND,
            FoodLogError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        };
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %format!("{err:#}"), "request failed");
        }
        Self {
            status,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NewUserRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LogRequest {
    pub reps: i32,
    pub weight_kg: f64,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub exercise_name: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct WaterRequest {
    pub amount_ml: i32,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct WaterResponse {
    pub date: NaiveDate,
    pub total_ml: i64,
}

/// The current plan with row IDs (needed for logging) and any logged
/// actuals beside each exercise.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    #[serde(flatten)]
    pub plan: WorkoutPlan,
    pub days: Vec<DayResponse>,
}

#[derive(Debug, Serialize)]
pub struct DayResponse {
    pub id: Uuid,
    pub day_index: i32,
    pub label: String,
    pub exercises: Vec<ExerciseResponse>,
}

#[derive(Debug, Serialize)]
pub struct ExerciseResponse {
    #[serde(flatten)]
    pub exercise: Exercise,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_reps: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_weight_kg: Option<f64>,
}

impl PlanResponse {
    fn new(tree: PlanTree, logs: &[WorkoutLog]) -> Self {
        let by_exercise: HashMap<Uuid, &WorkoutLog> =
            logs.iter().map(|l| (l.exercise_id, l)).collect();
        let days = tree
            .days
            .into_iter()
            .map(|d| DayResponse {
                id: d.day.id,
                day_index: d.day.day_index,
                label: d.day.label,
                exercises: d
                    .exercises
                    .into_iter()
                    .map(|exercise| {
                        let log = by_exercise.get(&exercise.id);
                        ExerciseResponse {
                            actual_reps: log.map(|l| l.reps),
                            actual_weight_kg: log.map(|l| l.weight_kg),
                            exercise,
                        }
                    })
                    .collect(),
            })
            .collect();
        Self {
            plan: tree.plan,
            days,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/users", post(create_user))
        .route(
            "/api/users/{user_id}/profile",
            get(get_profile).put(put_profile),
        )
        .route("/api/users/{user_id}/onboarding", post(onboarding))
        .route("/api/users/{user_id}/plan", get(get_plan))
        .route("/api/users/{user_id}/plan/days/{day_index}", get(get_plan_day))
        .route("/api/users/{user_id}/plan/next-week", post(next_week))
        .route("/api/users/{user_id}/chat", post(chat))
        .route(
            "/api/users/{user_id}/exercises/{exercise_id}/log",
            put(log_exercise),
        )
        .route("/api/users/{user_id}/notes", get(list_notes).put(put_note))
        .route("/api/users/{user_id}/food", get(food_day).post(add_food))
        .route("/api/users/{user_id}/food/{entry_id}", delete(delete_food))
        .route("/api/users/{user_id}/water", get(water_day).post(add_water))
        .route("/api/food/search", get(food_search))
        .route("/api/food/barcode/{code}", get(food_barcode))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let model = state.generator.name().to_owned();
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!(%model, "forge serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("forge serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl+C handler; serving until killed");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn require_user(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    match users::get_user(pool, user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found(format!("user {user_id} not found"))),
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<NewUserRequest>,
) -> Result<Response, AppError> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request(format!("invalid email address: {email:?}")));
    }
    match users::insert_user(&state.pool, email).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user)).into_response()),
        Err(err) if users::is_duplicate_email(&err) => Err(AppError::conflict(format!(
            "a user with email {email} already exists"
        ))),
        Err(err) => Err(err.into()),
    }
}

async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let profile = profiles::get_profile(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {user_id} has no profile")))?;
    Ok(Json(profile).into_response())
}

/// Profile edit: saves the profile and generates a fresh week 1.
async fn put_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<ProfileSnapshot>,
) -> Result<Response, AppError> {
    require_user(&state.pool, user_id).await?;
    let out = match profiles::get_profile(&state.pool, user_id).await? {
        Some(_) => {
            plan::regenerate_from_profile(&state.pool, state.generator.as_ref(), user_id, &input)
                .await?
        }
        None => plan::onboard(&state.pool, state.generator.as_ref(), user_id, &input).await?,
    };
    Ok(Json(out).into_response())
}

async fn onboarding(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<ProfileSnapshot>,
) -> Result<Response, AppError> {
    require_user(&state.pool, user_id).await?;
    let out = plan::onboard(&state.pool, state.generator.as_ref(), user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(out)).into_response())
}

async fn load_current_plan(pool: &PgPool, user_id: Uuid) -> Result<PlanResponse, AppError> {
    let tree = plan::current_plan(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {user_id} has no plan yet")))?;
    let logs = workout_logs::list_logs_for_plan(pool, user_id, tree.plan.id).await?;
    Ok(PlanResponse::new(tree, &logs))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let plan = load_current_plan(&state.pool, user_id).await?;
    Ok(Json(plan).into_response())
}

async fn get_plan_day(
    State(state): State<AppState>,
    Path((user_id, day_index)): Path<(Uuid, i32)>,
) -> Result<Response, AppError> {
    let plan = load_current_plan(&state.pool, user_id).await?;
    let day = plan
        .days
        .into_iter()
        .find(|d| d.day_index == day_index)
        .ok_or_else(|| AppError::not_found(format!("day {day_index} not found in current plan")))?;
    Ok(Json(day).into_response())
}

async fn next_week(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    require_user(&state.pool, user_id).await?;
    let created = plan::generate_next_week(&state.pool, state.generator.as_ref(), user_id).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn chat(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, AppError> {
    require_user(&state.pool, user_id).await?;
    let response = apply_chat(&state.pool, state.generator.as_ref(), user_id, &req.message).await?;
    Ok(Json(response).into_response())
}

async fn log_exercise(
    State(state): State<AppState>,
    Path((user_id, exercise_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<LogRequest>,
) -> Result<Response, AppError> {
    let log = log_performance(&state.pool, user_id, exercise_id, req.reps, req.weight_kg).await?;
    Ok(Json(log).into_response())
}

async fn list_notes(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let notes = exercise_notes::list_notes(&state.pool, user_id).await?;
    Ok(Json(notes).into_response())
}

/// Save a note; an empty note clears it and returns `null`.
async fn put_note(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Response, AppError> {
    require_user(&state.pool, user_id).await?;
    let saved = save_exercise_note(&state.pool, user_id, &req.exercise_name, &req.note).await?;
    Ok(Json(saved).into_response())
}

async fn food_day(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(q): Query<DateQuery>,
) -> Result<Response, AppError> {
    let summary =
        nutrition::day_summary(&state.pool, user_id, q.date.unwrap_or_else(today)).await?;
    Ok(Json(summary).into_response())
}

async fn add_food(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<FoodEntryInput>,
) -> Result<Response, AppError> {
    require_user(&state.pool, user_id).await?;
    let entry = nutrition::add_food_entry(&state.pool, user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

async fn delete_food(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    nutrition::delete_food_entry(&state.pool, user_id, entry_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn water_day(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(q): Query<DateQuery>,
) -> Result<Response, AppError> {
    let date = q.date.unwrap_or_else(today);
    let total_ml = nutrition::water_total(&state.pool, user_id, date).await?;
    Ok(Json(WaterResponse { date, total_ml }).into_response())
}

async fn add_water(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<WaterRequest>,
) -> Result<Response, AppError> {
    require_user(&state.pool, user_id).await?;
    let entry = nutrition::add_water(&state.pool, user_id, req.amount_ml).await?;
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

async fn food_search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let query = q.q.trim();
    if query.is_empty() {
        return Ok(Json(Vec::<nutrition::FoodItem>::new()).into_response());
    }
    Ok(Json(state.food.search(query).await).into_response())
}

async fn food_barcode(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    if !is_barcode(&code) {
        return Err(AppError::bad_request(format!(
            "invalid barcode {code:?}: expected 8 to 14 digits"
        )));
    }
    Ok(Json(state.food.barcode(&code).await).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
