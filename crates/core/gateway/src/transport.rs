use async_trait::async_trait;
use batchgate_coalesced::{BatchRequest, ItemsResponse, Transport};
use batchgate_result::{create_transport_error, Error, Result};
use reqwest::{header::HeaderMap, Client, RequestBuilder, Response};
use serde_json::Value;

/// [`Transport`] backed by a shared `reqwest` client
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
    /// `host` joined with `base_api`, without a trailing slash
    root: String,
    headers: HeaderMap,
    ids_param: String,
}

fn transport_error(error: reqwest::Error) -> Error {
    create_transport_error!(error.status().map(|status| status.as_u16()), error)
}

impl ReqwestTransport {
    pub fn new(client: Client, root: String, headers: HeaderMap, ids_param: String) -> Self {
        Self {
            client,
            root,
            headers,
            ids_param,
        }
    }

    /// Resolve a target to an absolute address
    pub fn url(&self, target: &str) -> String {
        if target.starts_with('/') {
            format!("{}{target}", self.root)
        } else {
            format!("{}/{target}", self.root)
        }
    }

    fn build(&self, request: &BatchRequest) -> RequestBuilder {
        let ids: Vec<(&str, &str)> = request
            .ids
            .iter()
            .map(|id| (self.ids_param.as_str(), id.as_str()))
            .collect();

        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.target))
            .headers(self.headers.clone())
            .query(&request.query)
            .query(&ids);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
    }

    async fn execute(&self, request: &BatchRequest) -> Result<Response> {
        self.build(request)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(transport_error)
    }

    /// Send a request as-is and decode whatever JSON comes back
    pub async fn send_json(&self, request: &BatchRequest) -> Result<Value> {
        self.execute(request)
            .await?
            .json()
            .await
            .map_err(transport_error)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &BatchRequest) -> Result<ItemsResponse> {
        self.execute(request)
            .await?
            .json()
            .await
            .map_err(transport_error)
    }
}
