//! API client layer for REST and WebSocket connections.

use crate::config::{ClientConfig, ReconnectConfig};
use opsdesk_api::error::ApiError as ApiServerError;
use opsdesk_api::events::Topic;
use opsdesk_api::types::{
    ListLogsRequest, ListTicketsRequest, LogPageResponse, PostMessageRequest, TicketDetailResponse,
    TicketPageResponse, TicketStatsResponse,
};
use opsdesk_core::{EntityIdType, TicketId, TicketMessage};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tokio_tungstenite::tungstenite::http::{HeaderName, Request};
use tokio_tungstenite::WebSocketStream;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ApiClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    rest: RestClient,
    ws: WsClient,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let rest = RestClient::new(config)?;
        let ws = WsClient::new(config)?;
        Ok(Self { rest, ws })
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn ws(&self) -> &WsClient {
        &self.ws
    }
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let auth_header = build_auth_headers(&config.auth)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    pub async fn list_tickets(
        &self,
        params: &ListTicketsRequest,
    ) -> Result<TicketPageResponse, ApiClientError> {
        self.get_json("/api/v1/tickets", Some(params)).await
    }

    pub async fn get_ticket_detail(
        &self,
        ticket_id: TicketId,
    ) -> Result<TicketDetailResponse, ApiClientError> {
        let path = format!("/api/v1/tickets/{}", ticket_id.as_uuid());
        self.get_json::<TicketDetailResponse, ()>(&path, None).await
    }

    /// Post a message; the response carries the server-assigned id used to
    /// dedup the pushed echo.
    pub async fn post_message(
        &self,
        ticket_id: TicketId,
        req: &PostMessageRequest,
    ) -> Result<TicketMessage, ApiClientError> {
        let path = format!("/api/v1/tickets/{}/messages", ticket_id.as_uuid());
        self.post_json(&path, req).await
    }

    pub async fn list_logs(
        &self,
        params: &ListLogsRequest,
    ) -> Result<LogPageResponse, ApiClientError> {
        self.get_json("/api/v1/logs", Some(params)).await
    }

    pub async fn ticket_stats(&self) -> Result<TicketStatsResponse, ApiClientError> {
        self.get_json::<TicketStatsResponse, ()>("/api/v1/tickets/stats", None)
            .await
    }

    async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(url).headers(self.auth_header.clone());
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(url)
            .headers(self.auth_header.clone())
            .json(body)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let text = response.text().await?;
            if let Ok(api_error) = serde_json::from_str::<ApiServerError>(&text) {
                return Err(ApiClientError::InvalidResponse(format!(
                    "{}: {}",
                    api_error.code, api_error.message
                )));
            }
            Err(ApiClientError::InvalidResponse(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text
            )))
        }
    }
}

#[derive(Clone)]
pub struct WsClient {
    endpoint: String,
    auth: HeaderMap,
    reconnect: ReconnectConfig,
}

impl WsClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        Ok(Self {
            endpoint: config.ws_endpoint.clone(),
            auth: build_auth_headers(&config.auth)?,
            reconnect: config.reconnect.clone(),
        })
    }

    /// Open a stream subscribed server-side to one topic.
    pub async fn connect(
        &self,
        topic: Topic,
    ) -> Result<
        WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
        ApiClientError,
    > {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        let uri = format!(
            "{}{}topic={}",
            self.endpoint,
            separator,
            topic.as_query_value()
        );
        let mut request = Request::builder()
            .uri(uri)
            .body(())
            .map_err(|e| ApiClientError::Config(e.to_string()))?;
        let headers = request.headers_mut();
        for (name, value) in self.auth.iter() {
            headers.insert(name, value.clone());
        }
        let (stream, _) = tokio_tungstenite::connect_async(request).await?;
        Ok(stream)
    }

    pub fn reconnect_config(&self) -> &ReconnectConfig {
        &self.reconnect
    }
}

fn build_auth_headers(auth: &crate::config::AuthConfig) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = &auth.api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    if let Some(jwt) = &auth.jwt {
        let value = format!("Bearer {}", jwt);
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
