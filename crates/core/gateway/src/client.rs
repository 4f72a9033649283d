use std::time::Duration;

use batchgate_coalesced::{BatchRequest, Coalescer, CoalescerConfig, ItemsResponse, Transport};
use batchgate_config::Settings;
use batchgate_result::{create_error, Result};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, Method,
};
use serde_json::Value;

use crate::ReqwestTransport;

/// Construction parameters for a [`GatewayClient`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Scheme and authority, e.g. `https://files.example.com`
    pub host: String,
    /// Path prefix placed between host and target
    pub base_api: String,
    /// Sent with every outbound call
    pub headers: Vec<(String, String)>,
    /// Targets whose calls get coalesced
    pub endpoints: Vec<String>,
    pub window: Duration,
    /// Query parameter carrying the key-set
    pub ids_param: String,
}

impl GatewayConfig {
    pub fn new(host: impl Into<String>) -> Self {
        let defaults = CoalescerConfig::default();

        Self {
            host: host.into(),
            base_api: String::new(),
            headers: Vec::new(),
            endpoints: defaults.endpoints,
            window: defaults.window,
            ids_param: "ids".to_string(),
        }
    }

    fn root(&self) -> Result<String> {
        let host = self.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(create_error!(InvalidConfiguration {
                error: "gateway host is empty".to_string()
            }));
        }

        let base_api = self.base_api.trim().trim_matches('/');
        if base_api.is_empty() {
            Ok(host.to_string())
        } else {
            Ok(format!("{host}/{base_api}"))
        }
    }

    fn header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str()).map_err(|error| {
                create_error!(InvalidConfiguration {
                    error: format!("header `{name}`: {error}")
                })
            })?;

            let value = HeaderValue::try_from(value.as_str()).map_err(|error| {
                create_error!(InvalidConfiguration {
                    error: format!("header `{name}`: {error}")
                })
            })?;

            headers.insert(name, value);
        }

        Ok(headers)
    }
}

impl From<&Settings> for GatewayConfig {
    fn from(settings: &Settings) -> Self {
        let mut headers: Vec<(String, String)> = settings
            .gateway
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        headers.sort();

        Self {
            host: settings.gateway.host.clone(),
            base_api: settings.gateway.base_api.clone(),
            headers,
            endpoints: settings.gateway.endpoints.clone(),
            window: Duration::from_millis(settings.coalescer.window_ms),
            ids_param: settings.coalescer.ids_param.clone(),
        }
    }
}

/// HTTP client that routes calls to allow-listed batch endpoints through a
/// [`Coalescer`] and sends everything else straight away.
#[derive(Clone)]
pub struct GatewayClient {
    coalescer: Coalescer<ReqwestTransport>,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        if config.ids_param.trim().is_empty() {
            return Err(create_error!(InvalidConfiguration {
                error: "key-set parameter name is empty".to_string()
            }));
        }

        let transport = ReqwestTransport::new(
            Client::new(),
            config.root()?,
            config.header_map()?,
            config.ids_param,
        );

        let coalescer = Coalescer::new(
            transport,
            CoalescerConfig {
                window: config.window,
                endpoints: config.endpoints,
            },
        )?;

        Ok(Self { coalescer })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.into())
    }

    pub fn coalescer(&self) -> &Coalescer<ReqwestTransport> {
        &self.coalescer
    }

    pub fn get(&self, target: impl Into<String>) -> GatewayRequest<'_> {
        self.request(Method::GET, target)
    }

    pub fn request(&self, method: Method, target: impl Into<String>) -> GatewayRequest<'_> {
        let mut request = BatchRequest::get(target);
        request.method = method;

        GatewayRequest {
            client: self,
            request,
        }
    }
}

/// Builder for a single call through a [`GatewayClient`]
pub struct GatewayRequest<'a> {
    client: &'a GatewayClient,
    request: BatchRequest,
}

impl GatewayRequest<'_> {
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((name.into(), value.into()));
        self
    }

    /// Append identifiers to the requested key-set
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request = self.request.with_ids(ids);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    fn is_coalesced(&self) -> bool {
        self.client.coalescer.is_coalesced(&self.request.target)
    }

    /// Fetch the requested items, sharing the outbound call with any other
    /// caller of the same endpoint inside the window.
    pub async fn items(self) -> Result<ItemsResponse> {
        let client = self.client;
        let coalescer = &client.coalescer;

        if self.is_coalesced() {
            let endpoint = self.request.target.clone();
            coalescer.enroll(&endpoint, self.request).await
        } else {
            tracing::debug!(path = %self.request.target, "sending directly");
            coalescer.transport().send(&self.request).await
        }
    }

    /// Issue the call and return the decoded JSON body
    pub async fn send(self) -> Result<Value> {
        if self.is_coalesced() {
            let response = self.items().await?;
            serde_json::to_value(response).map_err(|_| create_error!(InternalError))
        } else {
            tracing::debug!(path = %self.request.target, "sending directly");
            self.client
                .coalescer
                .transport()
                .send_json(&self.request)
                .await
        }
    }
}
