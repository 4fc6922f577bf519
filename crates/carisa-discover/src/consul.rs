use async_trait::async_trait;
use carisa_model::{HealthPolicy, NodeDescriptor};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use tracing::{debug, info};

use crate::{
    config::DiscoveryConfig,
    discovery::Discovery,
    errors::DiscoverError,
    registration::{Registration, ServiceRecord},
};

const ADDR_ENV: &str = "CONSUL_HTTP_ADDR";
const DEFAULT_ADDR: &str = "127.0.0.1:8500";
const TOKEN_HEADER: &str = "X-Consul-Token";

/// [`Discovery`] backed by the Consul agent HTTP API.
#[derive(Debug, Clone)]
pub struct ConsulDiscovery {
    client: Client,
    endpoint: String,
    base: Url,
    token: Option<String>,
}

impl ConsulDiscovery {
    pub fn new(cfg: &DiscoveryConfig) -> Result<Self, DiscoverError> {
        let endpoint = resolve_endpoint(&cfg.server, std::env::var(ADDR_ENV).ok())?;
        let base = Url::parse(&endpoint)
            .map_err(|e| DiscoverError::Endpoint(format!("{endpoint}: {e}")))?;
        let client = Client::builder().build().map_err(DiscoverError::Client)?;

        debug!(endpoint = %endpoint, "discovery client created");
        Ok(Self {
            client,
            endpoint,
            base,
            token: cfg.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Base URL of the directory agent.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the record keyed by `id`; `None` when the directory has no such service.
    pub async fn lookup(&self, id: &str) -> Result<Option<ServiceRecord>, DiscoverError> {
        let url = self.api_url(&["service", id])?;
        let response = self.authorize(self.client.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success("lookup", response).await?;
        Ok(Some(response.json::<ServiceRecord>().await?))
    }

    /// `<endpoint>/v1/agent/<segments>`, each segment percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Result<Url, DiscoverError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| DiscoverError::Endpoint(format!("{}: cannot be a base", self.endpoint)))?
            .pop_if_empty()
            .extend(["v1", "agent"])
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.header(TOKEN_HEADER, token),
            None => req,
        }
    }
}

#[async_trait]
impl Discovery for ConsulDiscovery {
    async fn register(
        &self,
        node: &NodeDescriptor,
        health: &HealthPolicy,
        name: &str,
    ) -> Result<(), DiscoverError> {
        info!(id = %node.id, "registering server in discovery directory");
        let body = Registration::new(node, health, name)?;

        let url = self.api_url(&["service", "register"])?;
        let response = self.authorize(self.client.put(url)).json(&body).send().await?;
        ensure_success("register", response).await?;

        info!(
            id = %node.id,
            name = %name,
            address = %node.address,
            port = node.port,
            check = %body.check.tcp,
            "server registered in discovery directory"
        );
        Ok(())
    }

    async fn deregister(&self, id: &str) -> Result<(), DiscoverError> {
        info!(id = %id, "deregistering server in discovery directory");

        let url = self.api_url(&["service", "deregister", id])?;
        let response = self.authorize(self.client.put(url)).send().await?;
        ensure_success("deregister", response).await?;

        info!(id = %id, "server deregistered in discovery directory");
        Ok(())
    }
}

async fn ensure_success(op: &'static str, response: Response) -> Result<Response, DiscoverError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DiscoverError::Rejected {
        op,
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

/// Configured server, else `$CONSUL_HTTP_ADDR`, else the local agent.
fn resolve_endpoint(server: &str, from_env: Option<String>) -> Result<String, DiscoverError> {
    let raw = match server.trim() {
        "" => from_env
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string()),
        s => s.to_string(),
    };
    let endpoint = if raw.contains("://") {
        raw
    } else {
        format!("http://{raw}")
    };

    let url = Url::parse(&endpoint)
        .map_err(|e| DiscoverError::Endpoint(format!("{endpoint}: {e}")))?;
    if url.host_str().is_none() {
        return Err(DiscoverError::Endpoint(format!("{endpoint}: missing host")));
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}
