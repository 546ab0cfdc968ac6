use loam_core::config::HttpConfig;
use loam_core::error::SeedError;
use loam_core::record::Stage;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Request body of a GraphQL-over-HTTP operation.
#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    operation_name: Option<&'a str>,
    variables: &'a Value,
}

/// Response envelope of a GraphQL-over-HTTP operation.
///
/// The service always answers `200 OK` with this structure; operation
/// failures show up as an `errors` list, not as HTTP statuses.
#[derive(Deserialize, Debug)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorItem>>,
}

#[derive(Deserialize, Debug)]
struct GraphQlErrorItem {
    message: String,
}

/// HTTP client for a staged GraphQL content API.
///
/// The client authenticates with a bearer token and selects the content
/// stage per call through the `gcms-stage` header, so existence checks can
/// target DRAFT while report queries read PUBLISHED.
///
/// # Examples
///
/// ```no_run
/// use loam_client::GraphQlClient;
/// use loam_core::record::Stage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GraphQlClient::new("https://api.example.com/v2/project/master", "token")?;
/// let data = client
///     .execute(
///         "query Ping { industries(first: 1) { id } }",
///         Some("Ping"),
///         serde_json::json!({}),
///         Stage::Draft,
///     )
///     .await?;
/// println!("{}", data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GraphQlClient {
    client: Client,
    endpoint: Url,
    token: String,
    max_retries: u32,
    retry_base_delay: Duration,
    timeout: Duration,
}

impl GraphQlClient {
    /// Creates a client with the default HTTP configuration.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::InvalidEndpoint` if the endpoint is not a valid
    /// URL and `SeedError::Configuration` if the token is blank.
    pub fn new(endpoint: &str, token: &str) -> Result<Self, SeedError> {
        Self::with_config(endpoint, token, HttpConfig::default())
    }

    /// Creates a client with explicit timeout and retry settings.
    pub fn with_config(
        endpoint: &str,
        token: &str,
        config: HttpConfig,
    ) -> Result<Self, SeedError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| SeedError::InvalidEndpoint(endpoint.to_string()))?;

        if token.trim().is_empty() {
            return Err(SeedError::Configuration(
                "access token is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent("Loam/0.1 (content-seeder)")
            .timeout(config.timeout)
            .build()
            .map_err(|e| SeedError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            token: token.to_string(),
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
            timeout: config.timeout,
        })
    }

    /// Executes one GraphQL operation at the given stage and returns the
    /// `data` payload.
    ///
    /// Transport failures (network, timeout, HTTP status) and service
    /// failures (a well-formed response carrying an `errors` list) map to
    /// distinct error variants; see [`SeedError::is_transport`].
    pub async fn execute(
        &self,
        document: &str,
        operation_name: Option<&str>,
        variables: Value,
        stage: Stage,
    ) -> Result<Value, SeedError> {
        let body = GraphQlRequest {
            query: document,
            operation_name,
            variables: &variables,
        };

        let resp = self.request_with_retry(&body, stage).await?;

        let envelope: GraphQlResponse = resp
            .json()
            .await
            .map_err(|e| SeedError::Network(format!("Failed to parse response: {}", e)))?;

        if let Some(errors) = envelope.errors {
            let message = errors
                .into_iter()
                .next()
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(SeedError::Service(message));
        }

        envelope
            .data
            .ok_or_else(|| SeedError::MissingData("the operation's data payload".to_string()))
    }

    /// Makes an HTTP POST request with automatic retry on transient failures.
    ///
    /// Implements backoff for retries on:
    /// - Network errors
    /// - Timeouts
    /// - Server errors (5xx)
    /// - Rate limiting (429)
    async fn request_with_retry(
        &self,
        body: &GraphQlRequest<'_>,
        stage: Stage,
    ) -> Result<reqwest::Response, SeedError> {
        let mut last_error = SeedError::Network("no attempts made".to_string());

        for attempt in 1..=self.max_retries {
            let request = self
                .client
                .post(self.endpoint.clone())
                .bearer_auth(&self.token)
                .header("gcms-stage", stage.as_str())
                .json(body);

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        return Ok(resp);
                    }

                    // Rate limited - retry with exponential backoff
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = SeedError::RateLimited;
                        if attempt < self.max_retries {
                            let delay = self.retry_base_delay * 2_u32.pow(attempt);
                            sleep(delay).await;
                            continue;
                        }
                        return Err(last_error);
                    }

                    // Server error - retry
                    if status.is_server_error() {
                        last_error = SeedError::Http(status.as_u16());
                        if attempt < self.max_retries {
                            let delay = self.retry_base_delay * attempt;
                            sleep(delay).await;
                            continue;
                        }
                        return Err(last_error);
                    }

                    // Client error (4xx except 429) - don't retry
                    return Err(SeedError::Http(status.as_u16()));
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = SeedError::Timeout(self.timeout.as_secs());
                    } else if e.is_connect() {
                        last_error = SeedError::Network(format!("Connection failed: {}", e));
                    } else {
                        return Err(SeedError::Network(e.to_string()));
                    }

                    if attempt < self.max_retries {
                        let delay = self.retry_base_delay * attempt;
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error)
    }
}
