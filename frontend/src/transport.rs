use async_trait::async_trait;
use loto_dashboard::services::{
    ApiRequest, ApiResponse, DashboardError, HttpTransport, Method, ServiceResult,
};
use reqwasm::http::Request;

/// `fetch`-backed transport.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchTransport;

#[async_trait(?Send)]
impl HttpTransport for FetchTransport {
    async fn send(&self, request: ApiRequest) -> ServiceResult<ApiResponse> {
        let mut builder = match request.method {
            Method::Get => Request::get(&request.url),
            Method::Post => Request::post(&request.url),
            Method::Put => Request::put(&request.url),
            Method::Delete => Request::delete(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|err| DashboardError::Network(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| DashboardError::Network(err.to_string()))?;
        Ok(ApiResponse::new(status, body))
    }
}
