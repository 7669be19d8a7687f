// Roster Ledger - Web Server
// REST API over the roster Mutation API with Axum

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use roster_ledger::{
    describe_add, init_tracing, open_ledger, open_pool, AvailableQuery, BudgetChange,
    BudgetSummary, Candidate, CandidatePool, LedgerConfig, LedgerEvent, PoolPlayer,
    RecommendationButton, RemoveOutcome, RosterEntry, RosterStore, SalaryInput,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

/// Shared application state. The mutex serializes every mutation.
#[derive(Clone)]
struct AppState {
    ledger: Arc<Mutex<RosterStore>>,
    pool: Arc<CandidatePool>,
}

impl AppState {
    fn ledger(&self) -> MutexGuard<'_, RosterStore> {
        // A panic while holding the lock leaves the ledger itself consistent
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    fn with_message(success: bool, data: T, message: String) -> Self {
        Self {
            success,
            data,
            message: Some(message),
        }
    }
}

/// Team response
#[derive(Serialize)]
struct TeamResponse {
    roster: Vec<RosterEntry>,
    budget: BudgetSummary,
    durable: bool,
}

impl From<&RosterStore> for TeamResponse {
    fn from(ledger: &RosterStore) -> Self {
        Self {
            roster: ledger.roster().entries().to_vec(),
            budget: ledger.summary(),
            durable: ledger.is_durable(),
        }
    }
}

/// A plain candidate (`name`) or a recommendation button (`action` + `text`)
#[derive(Deserialize, Default)]
#[serde(default)]
struct AddRequest {
    action: Option<String>,
    text: Option<String>,
    name: Option<String>,
    position: Option<String>,
    salary: SalaryInput,
    salary_display: Option<String>,
}

impl AddRequest {
    /// None when a button carries an action that does not add a player
    fn into_candidate(self) -> Option<Candidate> {
        match self.action {
            Some(action) => RecommendationButton {
                action,
                text: self.text.or(self.name).unwrap_or_default(),
                salary: self.salary,
                salary_display: self.salary_display,
            }
            .to_candidate(),
            None => Some(Candidate {
                name: self.name.or(self.text).unwrap_or_default(),
                position: self.position,
                salary: self.salary,
                salary_display: self.salary_display,
            }),
        }
    }
}

#[derive(Deserialize)]
struct BudgetRequest {
    budget: f64,
}

#[derive(Deserialize, Default)]
struct BudgetResetRequest {
    budget: Option<f64>,
}

#[derive(Deserialize)]
struct AvailableParams {
    budget: Option<String>,
    rank: Option<String>,
}

#[derive(Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct BudgetResponse {
    change: BudgetChange,
    budget: BudgetSummary,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/team - Roster plus derived budget figures
async fn get_team(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = state.ledger();
    Json(ApiResponse::ok(TeamResponse::from(&*ledger)))
}

/// POST /api/team/players - Add a candidate or recommendation button
async fn add_player(
    State(state): State<AppState>,
    Json(request): Json<AddRequest>,
) -> impl IntoResponse {
    let action = request.action.clone();
    let Some(candidate) = request.into_candidate() else {
        let message = format!("Action {} does not add a player", action.unwrap_or_default());
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::with_message(false, None::<TeamResponse>, message)),
        );
    };

    let name = candidate.name.clone();
    let mut ledger = state.ledger();
    let outcome = ledger.add_player(candidate);
    let message = describe_add(outcome, &name, ledger.remaining());

    (
        StatusCode::OK,
        Json(ApiResponse::with_message(
            outcome.is_added(),
            Some(TeamResponse::from(&*ledger)),
            message,
        )),
    )
}

/// DELETE /api/team/players/:name - Remove by exact name
async fn remove_player(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    // Path has already percent-decoded the segment; the name is used as-is
    let mut ledger = state.ledger();
    let outcome = ledger.remove_player(&name);
    let message = match outcome {
        RemoveOutcome::Removed => format!("Removed {}", name),
        RemoveOutcome::NotFound => format!("{} is not on your team", name),
    };

    Json(ApiResponse::with_message(
        outcome == RemoveOutcome::Removed,
        TeamResponse::from(&*ledger),
        message,
    ))
}

/// POST /api/team/reset - Empty the roster, keep the budget
async fn reset_team(State(state): State<AppState>) -> impl IntoResponse {
    let mut ledger = state.ledger();
    ledger.reset_roster();
    Json(ApiResponse::ok(TeamResponse::from(&*ledger)))
}

/// PUT /api/budget - Set the ceiling (clamped to bounds)
async fn set_budget(
    State(state): State<AppState>,
    Json(request): Json<BudgetRequest>,
) -> impl IntoResponse {
    let mut ledger = state.ledger();
    let change = ledger.set_budget(request.budget);
    Json(ApiResponse::ok(BudgetResponse {
        change,
        budget: ledger.summary(),
    }))
}

/// POST /api/budget/reset - Back to the given or default ceiling
async fn reset_budget(
    State(state): State<AppState>,
    body: Option<Json<BudgetResetRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let mut ledger = state.ledger();
    let change = ledger.reset_budget(request.budget);
    Json(ApiResponse::ok(BudgetResponse {
        change,
        budget: ledger.summary(),
    }))
}

/// GET /api/available-players?budget=&rank= - Rank wins over budget
async fn available_players(
    State(state): State<AppState>,
    Query(params): Query<AvailableParams>,
) -> impl IntoResponse {
    let rank = params.rank.as_deref().and_then(|r| r.trim().parse::<u32>().ok());
    let budget = params
        .budget
        .as_deref()
        .and_then(roster_ledger::salary::parse_salary_text)
        .unwrap_or_else(|| state.ledger().remaining());

    let players: Vec<PoolPlayer> = state.pool.query(AvailableQuery::from_params(rank, budget));
    Json(players)
}

/// GET /api/history - Recent ledger events
async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let events: Vec<LedgerEvent> = state.ledger().history(params.limit.unwrap_or(50));
    Json(ApiResponse::ok(events))
}

// ============================================================================
// Main Server
// ============================================================================

fn build_router(state: AppState) -> Router {
    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/team", get(get_team))
        .route("/team/players", post(add_player))
        .route("/team/players/:name", delete(remove_player))
        .route("/team/reset", post(reset_team))
        .route("/budget", put(set_budget))
        .route("/budget/reset", post(reset_budget))
        .route("/available-players", get(available_players))
        .route("/history", get(get_history))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() {
    let config = LedgerConfig::from_env();
    init_tracing(&config.log_level);

    println!("🏀 Roster Ledger - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let ledger = open_ledger(&config);
    let pool = open_pool(&config);
    info!(db = ?config.db_path(), candidates = pool.len(), "ledger ready");

    // Create shared state
    let state = AppState {
        ledger: Arc::new(Mutex::new(ledger)),
        pool: Arc::new(pool),
    };

    let app = build_router(state);

    // Start server
    let addr = std::env::var("ROSTER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/team", addr);
    println!("\n   Press Ctrl+C to stop\n");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}
