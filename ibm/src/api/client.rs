use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::auth::{AuthMethod, Authenticator};
use super::common::{ApiErrorResponse, ApiQueryParams};
use super::error::ApiError;

/// API version date sent with every request
pub const API_VERSION: &str = "2024-11-12";

pub const USER_AGENT_HEADER: &str = "X-Original-User-Agent";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_IDLE_PER_HOST: usize = 10;
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// IBM Cloud VPC API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    authenticator: Authenticator,
    user_agent: String,
    retry_config: RetryConfig,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("retry_config", &self.inner.retry_config)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 60,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(endpoint: &str, auth: AuthMethod) -> Result<Self, ApiError> {
        Self::with_config(endpoint, auth, RetryConfig::default())
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        endpoint: &str,
        auth: AuthMethod,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let base_url = endpoint.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::Config(format!(
                "endpoint {} must be an http(s) URL",
                endpoint
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(retry_config.timeout_seconds))
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .tcp_keepalive(TCP_KEEPALIVE)
            .build()?;
        let authenticator = Authenticator::new(&auth, http_client.clone());

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                authenticator,
                user_agent: format!("terraform-provider-ibm/{}", env!("CARGO_PKG_VERSION")),
                retry_config,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<T, ApiError> {
        let url = self.url(path, params);
        self.execute_with_retry(Method::GET, &url, None::<&()>).await
    }

    /// Execute a POST request with retry logic
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &ApiQueryParams::new());
        self.execute_with_retry(Method::POST, &url, Some(body)).await
    }

    /// Execute a PATCH request; the body is a JSON merge patch
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &ApiQueryParams::new());
        self.execute_with_retry(Method::PATCH, &url, Some(body)).await
    }

    /// Execute a PUT request with retry logic
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &ApiQueryParams::new());
        self.execute_with_retry(Method::PUT, &url, Some(body)).await
    }

    /// Execute a DELETE request with retry logic
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path, &ApiQueryParams::new());
        self.execute_with_retry::<serde_json::Value, ()>(Method::DELETE, &url, None)
            .await
            .map(|_| ())
    }

    pub fn subnets(&self) -> crate::api::subnets::SubnetsApi<'_> {
        crate::api::subnets::SubnetsApi::new(self)
    }

    pub fn vpcs(&self) -> crate::api::vpcs::VpcsApi<'_> {
        crate::api::vpcs::VpcsApi::new(self)
    }

    pub fn load_balancers(&self) -> crate::api::load_balancers::LoadBalancersApi<'_> {
        crate::api::load_balancers::LoadBalancersApi::new(self)
    }

    pub fn dedicated_hosts(&self) -> crate::api::dedicated_hosts::DedicatedHostsApi<'_> {
        crate::api::dedicated_hosts::DedicatedHostsApi::new(self)
    }

    pub fn vpn_gateways(&self) -> crate::api::vpn_gateways::VpnGatewaysApi<'_> {
        crate::api::vpn_gateways::VpnGatewaysApi::new(self)
    }

    pub fn virtual_network_interfaces(
        &self,
    ) -> crate::api::virtual_network_interfaces::VirtualNetworkInterfacesApi<'_> {
        crate::api::virtual_network_interfaces::VirtualNetworkInterfacesApi::new(self)
    }

    pub fn bare_metal_servers(&self) -> crate::api::bare_metal_servers::BareMetalServersApi<'_> {
        crate::api::bare_metal_servers::BareMetalServersApi::new(self)
    }

    pub fn cluster_networks(&self) -> crate::api::cluster_networks::ClusterNetworksApi<'_> {
        crate::api::cluster_networks::ClusterNetworksApi::new(self)
    }

    fn url(&self, path: &str, params: &ApiQueryParams) -> String {
        let base = ApiQueryParams::new()
            .add("version", API_VERSION)
            .add("generation", 2);
        let mut query = base.to_query_string();
        if !params.is_empty() {
            query.push('&');
            query.push_str(&params.to_query_string());
        }
        format!("{}{}?{}", self.inner.base_url, path, query)
    }

    fn build_request<B: Serialize>(
        &self,
        method: &Method,
        url: &str,
        authorization: &str,
        body: Option<&B>,
    ) -> RequestBuilder {
        let mut request = self
            .inner
            .http_client
            .request(method.clone(), url)
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT_HEADER, &self.inner.user_agent);

        if let Some(body) = body {
            let content_type = if *method == Method::PATCH {
                "application/merge-patch+json"
            } else {
                "application/json"
            };
            request = request.header(CONTENT_TYPE, content_type).json(body);
        }
        request
    }

    /// Execute request with retry logic
    async fn execute_with_retry<T, B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let retry_config = &self.inner.retry_config;
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= retry_config.max_retries {
            if attempt > 0 {
                let backoff = retry_config.backoff(attempt);
                tracing::warn!(
                    "Retrying {} {} after {}ms (attempt {})",
                    method,
                    url,
                    backoff.as_millis(),
                    attempt
                );
                tokio::time::sleep(backoff).await;
            }

            let authorization = self.inner.authenticator.authorization().await?;
            tracing::debug!("{} request to: {}", method, url);

            match self
                .build_request(&method, url, &authorization, body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.parse_success_response(response).await;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        self.inner.authenticator.invalidate().await;
                        let text = response.text().await.unwrap_or_default();
                        return Err(ApiError::Auth(error_message(&text)));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(self.handle_error_response(response).await);
                    } else {
                        return Err(self.handle_error_response(response).await);
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(ApiError::Timeout(retry_config.timeout_seconds));
                    } else if e.is_connect() || e.is_request() {
                        last_error = Some(ApiError::Request(e));
                    } else {
                        return Err(ApiError::Request(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Parse successful response; an empty body reads as JSON null
    async fn parse_success_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };

        serde_json::from_str::<T>(text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::Parse(format!("Failed to parse response: {}", e))
        })
    }

    /// Handle error response
    async fn handle_error_response(&self, response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match serde_json::from_str::<ApiErrorResponse>(&text) {
            Ok(envelope) if !envelope.errors.is_empty() => {
                let first = &envelope.errors[0];
                ApiError::Api {
                    status,
                    code: first.code.clone(),
                    message: first.message.clone(),
                    trace: envelope.trace,
                }
            }
            Ok(envelope) => ApiError::Api {
                status,
                code: String::new(),
                message: text,
                trace: envelope.trace,
            },
            Err(_) => ApiError::Api {
                status,
                code: String::new(),
                message: text,
                trace: None,
            },
        }
    }
}

fn error_message(text: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(text)
        .ok()
        .and_then(|e| e.errors.into_iter().next())
        .map(|e| format!("{}: {}", e.code, e.message))
        .unwrap_or_else(|| "the API rejected the credentials".to_string())
}
