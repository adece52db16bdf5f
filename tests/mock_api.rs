use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use loto_dashboard::admin::{AdminPanel, BalanceMode, FormFields, StatCounter};
use loto_dashboard::client::ApiClient;
use loto_dashboard::config::DashboardConfig;
use loto_dashboard::filter::{DrawFilter, FilterState, StatusFilter, TicketStatus};
use loto_dashboard::models::DrawId;
use loto_dashboard::notify::ToastKind;
use loto_dashboard::services::memory::{RecordingAdminView, RecordingFeedback};
use loto_dashboard::services::{
    ApiRequest, ApiResponse, DashboardError, HttpTransport, Method, RequestOptions, ServiceResult,
};
use loto_dashboard::templates::admin_template::RowAction;
use loto_dashboard::ticket_feed::TicketFeed;

#[derive(Default)]
struct Lottery {
    draws: Vec<Value>,
    packages: Vec<Value>,
    tickets: Vec<Value>,
    coins: f64,
    next_id: i64,
}

type Shared = Arc<Mutex<Lottery>>;

fn not_found(what: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": format!("{what} not found") })))
}

async fn list_draws(State(db): State<Shared>) -> Json<Value> {
    Json(Value::Array(db.lock().unwrap().draws.clone()))
}

async fn create_draw(State(db): State<Shared>, Json(mut draw): Json<Map<String, Value>>) -> Json<Value> {
    let mut db = db.lock().unwrap();
    if draw.get("title").and_then(Value::as_str).unwrap_or("").is_empty() {
        return Json(json!({ "success": false, "error": "Title is required" }));
    }
    db.next_id += 1;
    draw.insert("id".into(), json!(db.next_id));
    draw.insert("completed".into(), json!(false));
    let draw = Value::Object(draw);
    db.draws.push(draw.clone());
    Json(json!({ "success": true, "draw": draw }))
}

async fn delete_draw(State(db): State<Shared>, Path(id): Path<i64>) -> impl IntoResponse {
    let mut db = db.lock().unwrap();
    let before = db.draws.len();
    db.draws.retain(|draw| draw["id"] != json!(id));
    if db.draws.len() == before {
        return not_found("Draw").into_response();
    }
    Json(json!({ "success": true })).into_response()
}

async fn update_draw(
    State(db): State<Shared>,
    Path(id): Path<i64>,
    Json(changes): Json<Map<String, Value>>,
) -> impl IntoResponse {
    let mut db = db.lock().unwrap();
    let Some(draw) = db.draws.iter_mut().find(|draw| draw["id"] == json!(id)) else {
        return not_found("Draw").into_response();
    };
    if let Some(fields) = draw.as_object_mut() {
        fields.extend(changes);
    }
    Json(json!({ "success": true, "draw": draw.clone() })).into_response()
}

#[derive(Deserialize)]
struct ConductRequest {
    draw_id: i64,
}

async fn conduct_draw(State(db): State<Shared>, Json(request): Json<ConductRequest>) -> impl IntoResponse {
    let mut db = db.lock().unwrap();
    let Some(draw) = db.draws.iter_mut().find(|draw| draw["id"] == json!(request.draw_id)) else {
        return not_found("Draw").into_response();
    };
    draw["completed"] = json!(true);
    Json(json!({ "success": true, "winning_numbers": [5, 12, 33], "winners": [] })).into_response()
}

async fn list_packages(State(db): State<Shared>) -> Json<Value> {
    Json(Value::Array(db.lock().unwrap().packages.clone()))
}

async fn delete_package(State(db): State<Shared>, Path(id): Path<i64>) -> impl IntoResponse {
    let mut db = db.lock().unwrap();
    let before = db.packages.len();
    db.packages.retain(|package| package["id"] != json!(id));
    if db.packages.len() == before {
        return not_found("Package").into_response();
    }
    Json(json!({ "success": true })).into_response()
}

#[derive(Deserialize)]
struct TicketParams {
    status: Option<String>,
    draw_id: Option<String>,
}

async fn list_tickets(State(db): State<Shared>, Query(params): Query<TicketParams>) -> Json<Value> {
    let db = db.lock().unwrap();
    let wanted = |value: &Option<String>| value.clone().filter(|value| value != "all");
    let status = wanted(&params.status);
    let draw = wanted(&params.draw_id);
    let tickets: Vec<Value> = db
        .tickets
        .iter()
        .filter(|ticket| status.as_deref().map_or(true, |status| ticket["status"] == status))
        .filter(|ticket| draw.as_deref().map_or(true, |draw| ticket["draw_id"].to_string() == draw))
        .cloned()
        .collect();
    Json(json!({ "success": true, "count": tickets.len(), "tickets": tickets }))
}

async fn stats(State(db): State<Shared>) -> Json<Value> {
    let db = db.lock().unwrap();
    let count = |status: &str| db.tickets.iter().filter(|t| t["status"] == status).count();
    Json(json!({
        "total_tickets": db.tickets.len(),
        "winning_tickets": count("winner"),
        "pending_tickets": count("active"),
        "total_draws": db.draws.len(),
    }))
}

async fn balance(State(db): State<Shared>) -> Json<Value> {
    Json(json!({ "coins": db.lock().unwrap().coins }))
}

async fn add_balance(State(db): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    let Some(amount) = body["amount"].as_f64().filter(|amount| *amount > 0.0) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid amount" }))).into_response();
    };
    let mut db = db.lock().unwrap();
    db.coins += amount;
    Json(json!({ "success": true, "added_amount": amount, "new_balance": db.coins })).into_response()
}

fn lottery_api(db: Shared) -> Router {
    Router::new()
        .route("/api/draws", get(list_draws).post(create_draw))
        .route("/api/draws/:id", put(update_draw).delete(delete_draw))
        .route("/api/conduct_draw", post(conduct_draw))
        .route("/api/packages", get(list_packages))
        .route("/api/packages/:id", axum::routing::delete(delete_package))
        .route("/api/tickets", get(list_tickets))
        .route("/api/stats", get(stats))
        .route("/api/balance", get(balance))
        .route("/api/add_balance", post(add_balance))
        .with_state(db)
}

fn seeded() -> Shared {
    Arc::new(Mutex::new(Lottery {
        draws: vec![json!({
            "id": 1, "category": "big", "title": "Weekly Jackpot", "cost": 100,
            "currency": "COINS", "time_left": "3d", "completed": false, "tickets_count": 3
        })],
        packages: vec![json!({
            "id": 1, "name": "Starter", "category": "express", "price": 50, "currency": "COINS"
        })],
        tickets: vec![
            json!({"id": 1, "draw_id": 1, "numbers": [1, 2, 3], "status": "active", "purchase_date": "2024-05-01T09:30:00"}),
            json!({"id": 2, "draw_id": 1, "numbers": [4, 5, 6], "status": "winner", "purchase_date": "2024-05-02T09:30:00"}),
            json!({"id": 3, "draw_id": 2, "numbers": [7, 8, 9], "status": "loser", "purchase_date": "2024-05-03T09:30:00"}),
        ],
        coins: 1000.0,
        next_id: 1,
    }))
}

/// Serves requests from an in-process router instead of the network.
struct RouterTransport {
    router: Router,
}

#[async_trait(?Send)]
impl HttpTransport for RouterTransport {
    async fn send(&self, request: ApiRequest) -> ServiceResult<ApiResponse> {
        let mut builder = Request::builder()
            .method(request.method.as_str())
            .uri(request.path());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let body = request.body.clone().map(Body::from).unwrap_or_else(Body::empty);
        let http_request = builder
            .body(body)
            .map_err(|err| DashboardError::Network(err.to_string()))?;
        let response = self
            .router
            .clone()
            .oneshot(http_request)
            .await
            .map_err(|err| DashboardError::Network(err.to_string()))?;
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|err| DashboardError::Network(err.to_string()))?;
        Ok(ApiResponse::new(status, String::from_utf8_lossy(&bytes)))
    }
}

type Panel = AdminPanel<RouterTransport, RecordingFeedback, RecordingAdminView>;

fn panel(db: Shared) -> (Panel, RecordingFeedback, RecordingAdminView) {
    let feedback = RecordingFeedback::default();
    let view = RecordingAdminView::default();
    let config = DashboardConfig::default().with_base_url("http://loto.test");
    let api = ApiClient::new(RouterTransport { router: lottery_api(db) }, feedback.clone(), &config);
    (AdminPanel::new(api, view.clone()), feedback, view)
}

#[tokio::test]
async fn dashboard_loads_from_api() {
    let (panel, feedback, view) = panel(seeded());
    panel.load_initial_data().await.unwrap();

    let log = view.log();
    assert_eq!(log.draw_rows.as_ref().map(Vec::len), Some(1));
    assert_eq!(log.ticket_rows.as_ref().map(Vec::len), Some(3));
    assert_eq!(log.balance_label.as_deref(), Some("1000 COINS"));
    assert!(log.stats.contains(&(StatCounter::WinningTickets, 1)));
    assert!(feedback.toasts().is_empty());
}

#[tokio::test]
async fn created_draw_appears_after_refresh() {
    let db = seeded();
    let (panel, feedback, view) = panel(db.clone());
    let mut fields = FormFields::new();
    fields.insert("id".into(), String::new());
    fields.insert("title".into(), "Evening Express".into());
    fields.insert("category".into(), "express".into());

    panel.handle_draw_submit(fields).await.unwrap();

    let rows = view.log().draw_rows.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[1].inner_html().contains("Evening Express"));
    assert_eq!(view.log().draw_modal_closed, 1);
    assert_eq!(
        feedback.toasts(),
        vec![(ToastKind::Success, "Draw created successfully!".to_string())]
    );
    assert_eq!(db.lock().unwrap().draws.len(), 2);
}

#[tokio::test]
async fn rejected_draw_leaves_table_alone() {
    let (panel, feedback, view) = panel(seeded());
    let mut fields = FormFields::new();
    fields.insert("title".into(), String::new());

    let err = panel.handle_draw_submit(fields).await.unwrap_err();
    assert_eq!(err, DashboardError::Rejected("Title is required".into()));
    assert_eq!(view.log().draw_rows, None);
    assert_eq!(
        feedback.toasts(),
        vec![(ToastKind::Error, "Title is required".to_string())]
    );
}

#[tokio::test]
async fn conducting_marks_draw_completed() {
    let (panel, feedback, view) = panel(seeded());
    panel.dispatch(RowAction::ConductDraw(DrawId(1))).await.unwrap();

    assert_eq!(
        feedback.toasts()[0],
        (ToastKind::Success, "Draw conducted! Winning numbers: 5, 12, 33".to_string())
    );
    let rows = view.log().draw_rows.unwrap();
    assert!(!rows[0].actions.contains(&RowAction::ConductDraw(DrawId(1))));
}

#[tokio::test]
async fn missing_draw_reports_server_error() {
    let (panel, feedback, _) = panel(seeded());
    let err = panel.dispatch(RowAction::DeleteDraw(DrawId(42))).await.unwrap_err();
    assert!(matches!(err, DashboardError::Http { status: 404, .. }));
    assert_eq!(
        feedback.toasts(),
        vec![(ToastKind::Error, "Draw not found".to_string())]
    );
}

#[tokio::test]
async fn balance_top_up_round_trip() {
    let (panel, feedback, view) = panel(seeded());
    panel.submit_balance("250", BalanceMode::Add).await.unwrap();
    assert_eq!(view.log().balance_label.as_deref(), Some("1250 COINS"));
    assert_eq!(feedback.toasts()[0].1, "Added 250 COINS to balance");
}

#[tokio::test]
async fn ticket_feed_queries_server_side_filter() {
    let feedback = RecordingFeedback::default();
    let api = ApiClient::new(
        RouterTransport { router: lottery_api(seeded()) },
        feedback,
        &DashboardConfig::default(),
    );
    let feed = TicketFeed::new();
    let state = FilterState {
        status: StatusFilter::Only(TicketStatus::Active),
        draw: DrawFilter::parse("1"),
    };
    let tickets = feed.fetch(&api, &state).await.unwrap().unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].id, 1);

    let everything = feed.fetch(&api, &FilterState::default()).await.unwrap().unwrap();
    assert_eq!(everything.len(), 3);
}

#[tokio::test]
async fn requests_carry_json_content_type() {
    let (panel, _, _) = panel(seeded());
    let response = panel
        .api()
        .request(
            "/api/conduct_draw",
            RequestOptions::json(Method::Post, &json!({ "draw_id": 1 })),
        )
        .await
        .unwrap();
    assert_eq!(response["winning_numbers"], json!([5, 12, 33]));
}
