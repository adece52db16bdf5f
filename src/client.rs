use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::cell::Cell;
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::logging::log_failure;
use crate::models::{
    Balance, BalanceUpdate, ConductOutcome, Draw, DrawId, FormPayload, Package, PackageId, Stats,
    Ticket, TicketListResponse, TicketQuery, format_amount,
};
use crate::services::{
    ApiRequest, DashboardError, Feedback, error_message, HttpTransport, Method,
    RequestOptions, ServiceResult,
};

/// JSON API client for the lottery admin endpoints.
///
/// Every call runs under the loading overlay; every failure is toasted through
/// [`Feedback`] before it is returned to the caller.
pub struct ApiClient<T, F> {
    transport: T,
    feedback: F,
    base_url: String,
    in_flight: Cell<usize>,
}

struct LoadingGuard<'a, F: Feedback> {
    feedback: &'a F,
    in_flight: &'a Cell<usize>,
}

impl<'a, F: Feedback> LoadingGuard<'a, F> {
    fn start(feedback: &'a F, in_flight: &'a Cell<usize>) -> Self {
        let active = in_flight.get() + 1;
        in_flight.set(active);
        if active == 1 {
            feedback.set_loading(true);
        }
        Self {
            feedback,
            in_flight,
        }
    }
}

impl<F: Feedback> Drop for LoadingGuard<'_, F> {
    fn drop(&mut self) {
        let active = self.in_flight.get().saturating_sub(1);
        self.in_flight.set(active);
        if active == 0 {
            self.feedback.set_loading(false);
        }
    }
}

impl<T: HttpTransport, F: Feedback> ApiClient<T, F> {
    pub fn new(transport: T, feedback: F, config: &DashboardConfig) -> Self {
        Self {
            transport,
            feedback,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            in_flight: Cell::new(0),
        }
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn request(&self, path: &str, options: RequestOptions) -> ServiceResult<Value> {
        let request = self.build_request(path, options);
        debug!(method = request.method.as_str(), url = %request.url, "dispatching request");
        let outcome = {
            let _loading = LoadingGuard::start(&self.feedback, &self.in_flight);
            self.dispatch(request).await
        };
        outcome.inspect_err(|err| self.report(path, err))
    }

    fn build_request(&self, path: &str, options: RequestOptions) -> ApiRequest {
        let mut headers = options.headers;
        let caller_content_type = headers
            .keys()
            .any(|key| key.eq_ignore_ascii_case("content-type"));
        if !caller_content_type {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        ApiRequest {
            method: options.method,
            url: format!("{}{}", self.base_url, path),
            headers,
            body: options.body,
        }
    }

    async fn dispatch(&self, request: ApiRequest) -> ServiceResult<Value> {
        let response = self.transport.send(request).await?;
        let body: Value = serde_json::from_str(&response.body)
            .map_err(|err| DashboardError::Decode(err.to_string()))?;
        if !response.ok() {
            return Err(DashboardError::from_body(response.status, &body));
        }
        Ok(body)
    }

    fn report(&self, operation: &str, err: &DashboardError) {
        log_failure(operation, err);
        self.feedback.show_error(&err.to_string());
    }

    async fn fetch<R: DeserializeOwned>(&self, path: &str) -> ServiceResult<R> {
        let body = self.request(path, RequestOptions::get()).await?;
        self.decode(path, body)
    }

    fn decode<R: DeserializeOwned>(&self, operation: &str, body: Value) -> ServiceResult<R> {
        serde_json::from_value(body).map_err(|err| {
            let err = DashboardError::Decode(err.to_string());
            self.report(operation, &err);
            err
        })
    }

    /// Sends a mutating request and requires `success: true` in the reply.
    async fn mutate(&self, path: &str, options: RequestOptions) -> ServiceResult<Value> {
        let body = self.request(path, options).await?;
        if body.get("success").and_then(Value::as_bool) == Some(true) {
            return Ok(body);
        }
        let err = DashboardError::Rejected(error_message(&body));
        self.report(path, &err);
        Err(err)
    }

    fn field<R: DeserializeOwned>(&self, operation: &str, body: &Value, name: &str) -> ServiceResult<R> {
        let value = body.get(name).cloned().unwrap_or(Value::Null);
        self.decode(operation, value)
    }

    pub async fn update_balance(&self, balance: f64) -> ServiceResult<f64> {
        let path = "/api/update_balance";
        let body = self
            .mutate(path, RequestOptions::json(Method::Post, &json!({ "balance": balance })))
            .await?;
        let update: BalanceUpdate = self.decode(path, body)?;
        self.feedback.show_success("Balance updated successfully!");
        Ok(update.new_balance)
    }

    pub async fn add_balance(&self, amount: f64) -> ServiceResult<f64> {
        let path = "/api/add_balance";
        let body = self
            .mutate(path, RequestOptions::json(Method::Post, &json!({ "amount": amount })))
            .await?;
        let update: BalanceUpdate = self.decode(path, body)?;
        let added = update.added_amount.unwrap_or(amount);
        self.feedback
            .show_success(&format!("Added {} COINS to balance", format_amount(added)));
        Ok(update.new_balance)
    }

    pub async fn get_draws(&self) -> ServiceResult<Vec<Draw>> {
        self.fetch("/api/draws").await
    }

    pub async fn create_draw(&self, payload: &FormPayload) -> ServiceResult<Draw> {
        let path = "/api/draws";
        let body = self
            .mutate(path, RequestOptions::json(Method::Post, &Value::Object(payload.clone())))
            .await?;
        let draw = self.field(path, &body, "draw")?;
        self.feedback.show_success("Draw created successfully!");
        Ok(draw)
    }

    pub async fn update_draw(&self, id: DrawId, payload: &FormPayload) -> ServiceResult<Draw> {
        let path = format!("/api/draws/{id}");
        let body = self
            .mutate(&path, RequestOptions::json(Method::Put, &Value::Object(payload.clone())))
            .await?;
        let draw = self.field(&path, &body, "draw")?;
        self.feedback.show_success("Draw updated successfully!");
        Ok(draw)
    }

    pub async fn delete_draw(&self, id: DrawId) -> ServiceResult<()> {
        self.mutate(&format!("/api/draws/{id}"), RequestOptions::delete())
            .await?;
        self.feedback.show_success("Draw deleted successfully!");
        Ok(())
    }

    pub async fn conduct_draw(&self, id: DrawId) -> ServiceResult<ConductOutcome> {
        let path = "/api/conduct_draw";
        let body = self
            .mutate(path, RequestOptions::json(Method::Post, &json!({ "draw_id": id })))
            .await?;
        let outcome: ConductOutcome = self.decode(path, body)?;
        let numbers = outcome
            .winning_numbers
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        info!(draw_id = id.0, %numbers, "draw conducted");
        self.feedback
            .show_success(&format!("Draw conducted! Winning numbers: {numbers}"));
        Ok(outcome)
    }

    pub async fn get_packages(&self) -> ServiceResult<Vec<Package>> {
        self.fetch("/api/packages").await
    }

    pub async fn create_package(&self, payload: &FormPayload) -> ServiceResult<Package> {
        let path = "/api/packages";
        let body = self
            .mutate(path, RequestOptions::json(Method::Post, &Value::Object(payload.clone())))
            .await?;
        let package = self.field(path, &body, "package")?;
        self.feedback.show_success("Package created successfully!");
        Ok(package)
    }

    pub async fn update_package(&self, id: PackageId, payload: &FormPayload) -> ServiceResult<Package> {
        let path = format!("/api/packages/{id}");
        let body = self
            .mutate(&path, RequestOptions::json(Method::Put, &Value::Object(payload.clone())))
            .await?;
        let package = self.field(&path, &body, "package")?;
        self.feedback.show_success("Package updated successfully!");
        Ok(package)
    }

    pub async fn delete_package(&self, id: PackageId) -> ServiceResult<()> {
        self.mutate(&format!("/api/packages/{id}"), RequestOptions::delete())
            .await?;
        self.feedback.show_success("Package deleted successfully!");
        Ok(())
    }

    pub async fn get_stats(&self) -> ServiceResult<Stats> {
        self.fetch("/api/stats").await
    }

    pub async fn get_tickets(&self, query: Option<&TicketQuery>) -> ServiceResult<Vec<Ticket>> {
        let path = match query {
            Some(query) => format!("/api/tickets?{}", query.to_query_string()),
            None => "/api/tickets".to_string(),
        };
        let list: TicketListResponse = self.fetch(&path).await?;
        Ok(list.into_tickets())
    }

    pub async fn get_balance(&self) -> ServiceResult<Balance> {
        self.fetch("/api/balance").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastKind;
    use crate::services::memory::{InMemoryTransport, RecordingFeedback};
    use crate::services::{ApiResponse, FALLBACK_ERROR_MESSAGE};

    fn client() -> (ApiClient<InMemoryTransport, RecordingFeedback>, InMemoryTransport, RecordingFeedback) {
        let transport = InMemoryTransport::default();
        let feedback = RecordingFeedback::default();
        let config = DashboardConfig::default().with_base_url("https://loto.local");
        let client = ApiClient::new(transport.clone(), feedback.clone(), &config);
        (client, transport, feedback)
    }

    #[tokio::test]
    async fn request_merges_default_content_type() {
        let (client, transport, _) = client();
        transport.respond(Method::Get, "/api/stats", 200, json!({"total_tickets": 3}));
        client
            .request("/api/stats", RequestOptions::get().header("X-Trace", "1"))
            .await
            .unwrap();
        let sent = transport.requests();
        assert_eq!(sent[0].url, "https://loto.local/api/stats");
        assert_eq!(sent[0].header("content-type"), Some("application/json"));
        assert_eq!(sent[0].header("x-trace"), Some("1"));
    }

    #[tokio::test]
    async fn caller_content_type_wins() {
        let (client, transport, _) = client();
        transport.respond(Method::Get, "/api/stats", 200, json!({}));
        client
            .request("/api/stats", RequestOptions::get().header("content-type", "text/plain"))
            .await
            .unwrap();
        let sent = transport.requests();
        assert_eq!(sent[0].headers.len(), 1);
        assert_eq!(sent[0].header("Content-Type"), Some("text/plain"));
    }

    #[tokio::test]
    async fn overlay_is_hidden_after_failure() {
        let (client, transport, feedback) = client();
        transport.fail(Method::Get, "/api/draws", DashboardError::Network("offline".into()));
        let err = client.get_draws().await.unwrap_err();
        assert_eq!(err, DashboardError::Network("offline".into()));
        assert_eq!(feedback.loading_transitions(), vec![true, false]);
        assert_eq!(
            feedback.toasts(),
            vec![(ToastKind::Error, "network error: offline".to_string())]
        );
    }

    #[tokio::test]
    async fn http_failure_uses_server_error_or_fallback() {
        let (client, transport, feedback) = client();
        transport.respond(Method::Delete, "/api/draws/9", 404, json!({"error": "draw not found"}));
        transport.respond(Method::Delete, "/api/packages/9", 500, json!({}));

        let err = client.delete_draw(DrawId(9)).await.unwrap_err();
        assert_eq!(
            err,
            DashboardError::Http {
                status: 404,
                message: "draw not found".into()
            }
        );
        client.delete_package(PackageId(9)).await.unwrap_err();
        let messages: Vec<_> = feedback.toasts().into_iter().map(|(_, m)| m).collect();
        assert_eq!(messages, vec!["draw not found", FALLBACK_ERROR_MESSAGE]);
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_failure() {
        let (client, transport, feedback) = client();
        transport.respond_raw(Method::Get, "/api/balance", ApiResponse::new(502, "<html>bad gateway</html>"));
        let err = client.get_balance().await.unwrap_err();
        assert!(matches!(err, DashboardError::Decode(_)));
        assert_eq!(feedback.toasts()[0].0, ToastKind::Error);
    }

    #[tokio::test]
    async fn rejected_mutation_toasts_server_message() {
        let (client, transport, feedback) = client();
        transport.respond(
            Method::Post,
            "/api/draws",
            200,
            json!({"success": false, "error": "X"}),
        );
        let err = client.create_draw(&FormPayload::new()).await.unwrap_err();
        assert_eq!(err, DashboardError::Rejected("X".into()));
        assert_eq!(feedback.toasts(), vec![(ToastKind::Error, "X".to_string())]);
    }

    #[tokio::test]
    async fn rejected_mutation_without_message_uses_fallback() {
        let (client, transport, _) = client();
        transport.respond(Method::Delete, "/api/draws/4", 200, json!({"success": false, "error": "  "}));
        let err = client.delete_draw(DrawId(4)).await.unwrap_err();
        assert_eq!(err, DashboardError::Rejected(FALLBACK_ERROR_MESSAGE.into()));
    }

    #[tokio::test]
    async fn conduct_draw_lists_winning_numbers() {
        let (client, transport, feedback) = client();
        transport.respond(
            Method::Post,
            "/api/conduct_draw",
            200,
            json!({"success": true, "winning_numbers": [4, 8, 15, 16], "winners": []}),
        );
        let outcome = client.conduct_draw(DrawId(2)).await.unwrap();
        assert_eq!(outcome.winning_numbers, vec![4, 8, 15, 16]);
        assert_eq!(
            feedback.toasts(),
            vec![(ToastKind::Success, "Draw conducted! Winning numbers: 4, 8, 15, 16".to_string())]
        );
        assert_eq!(transport.requests()[0].body.as_deref(), Some(r#"{"draw_id":2}"#));
    }

    #[tokio::test]
    async fn add_balance_reports_added_amount() {
        let (client, transport, feedback) = client();
        transport.respond(
            Method::Post,
            "/api/add_balance",
            200,
            json!({"success": true, "added_amount": 250.0, "new_balance": 1750.0}),
        );
        assert_eq!(client.add_balance(250.0).await.unwrap(), 1750.0);
        assert_eq!(feedback.toasts()[0].1, "Added 250 COINS to balance");
    }

    #[tokio::test]
    async fn update_returns_payload_subfield() {
        let (client, transport, _) = client();
        transport.respond(
            Method::Put,
            "/api/packages/3",
            200,
            json!({"success": true, "package": {"id": 3, "name": "Weekend", "category": "big"}}),
        );
        let mut payload = FormPayload::new();
        payload.insert("name".into(), json!("Weekend"));
        let package = client.update_package(PackageId(3), &payload).await.unwrap();
        assert_eq!(package.name, "Weekend");
        assert_eq!(
            transport.requests()[0].body.as_deref(),
            Some(r#"{"name":"Weekend"}"#)
        );
    }

    #[tokio::test]
    async fn ticket_query_is_appended() {
        let (client, transport, _) = client();
        transport.respond(
            Method::Get,
            "/api/tickets?status=winner&draw_id=all",
            200,
            json!({"success": true, "tickets": [], "count": 0}),
        );
        let query = TicketQuery {
            status: "winner".into(),
            draw_id: "all".into(),
        };
        assert!(client.get_tickets(Some(&query)).await.unwrap().is_empty());
    }
}
