use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Relative time range of every log-search query: 14 days, in seconds.
pub const SEARCH_RANGE_SECS: u64 = 14 * 24 * 60 * 60;

const TERMS_PATH: &str = "/graylog/api/search/universal/relative/terms";
const HISTOGRAM_PATH: &str = "/graylog/api/search/universal/relative/histogram";

/// UpstreamError
///
/// Every way a log-search call can fail. Callers map all of them to the same
/// opaque 500, the variants exist for logging.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("log search request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("log search responded with HTTP {0}")]
    Status(u16),
    #[error("log search response is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

/// LogSearch
///
/// The two queries the dashboard proxies to the log-search service.
#[async_trait]
pub trait LogSearch: Send + Sync {
    /// Most frequent `query` field values in the search stream.
    async fn search_query_terms(&self) -> Result<Value, UpstreamError>;

    /// Per-day request histogram of one API client in the API stream.
    async fn api_usage_histogram(&self, client_id: &str) -> Result<Value, UpstreamError>;
}

/// LogSearchState
///
/// The concrete type used to share the log-search client across the application state.
pub type LogSearchState = Arc<dyn LogSearch>;

/// GraylogClient
///
/// Talks to Graylog's universal relative search API with basic-auth credentials.
#[derive(Clone)]
pub struct GraylogClient {
    http: reqwest::Client,
    domain: String,
    username: String,
    password: String,
    search_stream_id: String,
    api_stream_id: String,
}

impl GraylogClient {
    pub fn new(
        http: reqwest::Client,
        domain: &str,
        username: &str,
        password: &str,
        search_stream_id: &str,
        api_stream_id: &str,
    ) -> Self {
        Self {
            http,
            domain: domain.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            search_stream_id: search_stream_id.to_string(),
            api_stream_id: api_stream_id.to_string(),
        }
    }

    async fn search(&self, path: &str, params: &[(&str, String)]) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.domain, path);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(params)
            .send()
            .await
            .map_err(UpstreamError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(UpstreamError::Request)?;
        serde_json::from_slice(&body).map_err(UpstreamError::InvalidJson)
    }
}

#[async_trait]
impl LogSearch for GraylogClient {
    async fn search_query_terms(&self) -> Result<Value, UpstreamError> {
        let params = [
            ("query", "*".to_string()),
            ("range", SEARCH_RANGE_SECS.to_string()),
            ("filter", format!("streams:{}", self.search_stream_id)),
            ("field", "query".to_string()),
        ];
        self.search(TERMS_PATH, &params).await
    }

    async fn api_usage_histogram(&self, client_id: &str) -> Result<Value, UpstreamError> {
        let params = [
            ("query", format!("api_client_id:{}", client_id)),
            ("range", SEARCH_RANGE_SECS.to_string()),
            ("filter", format!("streams:{}", self.api_stream_id)),
            ("interval", "day".to_string()),
        ];
        self.search(HISTOGRAM_PATH, &params).await
    }
}
