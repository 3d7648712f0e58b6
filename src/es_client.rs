use reqwest::header::CONTENT_TYPE;
use reqwest::{Certificate, Client, ClientBuilder, RequestBuilder, StatusCode};
use serde_json::Value;
use tokio::fs::File;
use tokio::io::AsyncReadExt; // for read_to_end()
use tracing::info;

use crate::conf::Endpoint;
use crate::error::{MigrateError, Result};
use crate::models::cluster_health::ClusterHealth;
use crate::models::server_info::ServerInfo;

/// Thin wrapper over `reqwest` for the handful of ES endpoints the pipeline
/// talks to. Cheap to clone; the underlying client is shared.
#[derive(Debug, Clone)]
pub struct EsClient {
    endpoint: Endpoint,
    http_client: Client,
}

/// Status and raw body of a call whose non-success handling is up to the
/// caller (404-is-fine deletes, 404-is-terminal scroll continuations).
#[derive(Debug)]
pub struct EsResponse {
    pub status: StatusCode,
    pub body: String,
}

impl EsResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

fn inject_auth(request_builder: RequestBuilder, endpoint: &Endpoint) -> RequestBuilder {
    if endpoint.has_basic_auth() {
        request_builder.basic_auth(endpoint.get_username(), endpoint.get_password())
    } else {
        request_builder
    }
}

impl EsClient {
    /// Build a client for one endpoint, loading any configured CA roots.
    pub async fn connect(endpoint: Endpoint) -> Result<Self> {
        let mut builder = ClientBuilder::new().use_rustls_tls();
        for path in endpoint.get_root_certificates() {
            let mut buf = Vec::new();
            File::open(path).await?.read_to_end(&mut buf).await?;
            let certificate = Certificate::from_pem(&buf)
                .map_err(|e| MigrateError::Config(format!("bad certificate {path}: {e}")))?;
            builder = builder.add_root_certificate(certificate);
        }
        let http_client = builder.build()?;
        Ok(Self {
            endpoint,
            http_client,
        })
    }

    pub fn get_endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.get_url(), path)
    }

    async fn call_get(&self, path: &str) -> Result<EsResponse> {
        let request = inject_auth(self.http_client.get(self.url(path)), &self.endpoint);
        let response = request.send().await?;
        Ok(EsResponse {
            status: response.status(),
            body: response.text().await?,
        })
    }

    async fn call_post(&self, path: &str, body: Vec<u8>) -> Result<EsResponse> {
        let request = inject_auth(self.http_client.post(self.url(path)), &self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let response = request.send().await?;
        Ok(EsResponse {
            status: response.status(),
            body: response.text().await?,
        })
    }

    async fn call_delete(&self, path: &str) -> Result<EsResponse> {
        let request = inject_auth(self.http_client.delete(self.url(path)), &self.endpoint);
        let response = request.send().await?;
        Ok(EsResponse {
            status: response.status(),
            body: response.text().await?,
        })
    }

    pub async fn server_info(&self) -> Result<ServerInfo> {
        let resp = self.call_get("/").await?;
        Ok(serde_json::from_str(&resp.body)?)
    }

    pub async fn print_server_info(&self, prefix: &str) -> Result<()> {
        let server_info = self.server_info().await?;
        info!(
            "{}: cluster={}, hostname={}, version={}, lucene={}",
            prefix,
            server_info.get_cluster(),
            server_info.get_hostname(),
            server_info.get_version(),
            server_info.get_lucene_version().unwrap_or("-"),
        );
        Ok(())
    }

    pub async fn cluster_health(&self) -> Result<ClusterHealth> {
        let resp = self.call_get("/_cluster/health").await?;
        if !resp.is_success() {
            return Err(MigrateError::Resolve(format!(
                "cluster health returned {}: {}",
                resp.status, resp.body
            )));
        }
        Ok(serde_json::from_str(&resp.body)?)
    }

    /// `GET /{pattern}/_mapping`; fatal on any non-success response.
    pub async fn get_mappings(&self, pattern: &str) -> Result<Value> {
        let resp = self.call_get(&format!("/{pattern}/_mapping")).await?;
        if !resp.is_success() {
            return Err(MigrateError::Resolve(format!(
                "mapping listing returned {}: {}",
                resp.status, resp.body
            )));
        }
        Ok(serde_json::from_str(&resp.body)?)
    }

    /// `GET /_all/_settings`; fatal on any non-success response.
    pub async fn get_all_settings(&self) -> Result<Value> {
        let resp = self.call_get("/_all/_settings").await?;
        if !resp.is_success() {
            return Err(MigrateError::Resolve(format!(
                "settings listing returned {}: {}",
                resp.status, resp.body
            )));
        }
        Ok(serde_json::from_str(&resp.body)?)
    }

    pub async fn create_index(&self, name: &str, body: &Value) -> Result<EsResponse> {
        self.call_post(&format!("/{name}"), serde_json::to_vec(body)?)
            .await
    }

    pub async fn delete_index(&self, name: &str) -> Result<EsResponse> {
        self.call_delete(&format!("/{name}")).await
    }

    /// Open a server-side cursor over `pattern`.
    pub async fn open_scroll(&self, pattern: &str, ttl: &str, size: u64) -> Result<EsResponse> {
        self.call_get(&format!(
            "/{pattern}/_search?search_type=scan&scroll={ttl}&size={size}"
        ))
        .await
    }

    /// Continue a cursor, replaying its id verbatim as the request body.
    pub async fn continue_scroll(&self, scroll_id: &str, ttl: &str) -> Result<EsResponse> {
        self.call_post(
            &format!("/_search/scroll?scroll={ttl}"),
            scroll_id.as_bytes().to_vec(),
        )
        .await
    }

    /// One `_bulk` request. The payload must already end with a newline.
    pub async fn bulk(&self, payload: Vec<u8>) -> Result<EsResponse> {
        self.call_post("/_bulk", payload).await
    }
}
