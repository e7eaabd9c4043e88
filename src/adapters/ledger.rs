use crate::config::toml_config::{EndpointConfig, LedgerConfig};
use crate::domain::model::{CommissioningCreateRequest, ProductItemPassport};
use crate::domain::ports::LedgerClient;
use crate::utils::error::{LedgerEndpointKind, LedgerError};
use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity};
use std::path::Path;
use std::time::Duration;
use url::Url;

type LedgerResult<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone)]
struct LedgerEndpoint {
    url: Url,
    http: Client,
}

/// HTTP client for the ledger's product and commissioning endpoints.
///
/// Each endpoint carries its own TLS material. An endpoint without a URL is
/// left unconfigured and every call against it fails with `Unconfigured`.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    product: Option<LedgerEndpoint>,
    commissioning: Option<LedgerEndpoint>,
}

impl HttpLedgerClient {
    /// Loads all TLS material up front; bad certificates fail here, not on first use.
    pub fn new(config: &LedgerConfig) -> LedgerResult<Self> {
        let timeout = config.timeout_seconds.map(Duration::from_secs);

        Ok(Self {
            product: build_endpoint(&config.product, timeout)?,
            commissioning: build_endpoint(&config.commissioning, timeout)?,
        })
    }

    pub fn is_product_configured(&self) -> bool {
        self.product.is_some()
    }

    pub fn is_commissioning_configured(&self) -> bool {
        self.commissioning.is_some()
    }
}

fn build_endpoint(
    config: &EndpointConfig,
    timeout: Option<Duration>,
) -> LedgerResult<Option<LedgerEndpoint>> {
    let http = build_http_client(config, timeout)?;

    let raw_url = match config.url.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };

    let url = Url::parse(raw_url).map_err(|e| LedgerError::InvalidUrl {
        url: raw_url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LedgerError::InvalidUrl {
            url: raw_url.to_string(),
            reason: format!("Unsupported URL scheme: {}", url.scheme()),
        });
    }

    Ok(Some(LedgerEndpoint { url, http }))
}

fn build_http_client(config: &EndpointConfig, timeout: Option<Duration>) -> LedgerResult<Client> {
    let mut builder = Client::builder().use_rustls_tls();

    if let Some(ca_path) = &config.ca_cert {
        let pem = read_material(ca_path, "load CA certificate")?;
        let roots = Certificate::from_pem_bundle(&pem).map_err(|e| LedgerError::TlsMaterial {
            message: format!("load CA certificate {}: {}", ca_path.display(), e),
        })?;
        if roots.is_empty() {
            return Err(LedgerError::TlsMaterial {
                message: format!("load CA certificate {}: no certificates found", ca_path.display()),
            });
        }
        for root in roots {
            builder = builder.add_root_certificate(root);
        }
    }

    match (&config.client_cert, &config.client_key) {
        (Some(cert_path), Some(key_path)) => {
            let mut pem = read_material(cert_path, "load client cert/key")?;
            pem.push(b'\n');
            pem.extend(read_material(key_path, "load client cert/key")?);
            let identity = Identity::from_pem(&pem).map_err(|e| LedgerError::TlsMaterial {
                message: format!(
                    "load client cert/key {} / {}: {}",
                    cert_path.display(),
                    key_path.display(),
                    e
                ),
            })?;
            builder = builder.identity(identity);
        }
        (None, None) => {}
        _ => {
            return Err(LedgerError::TlsMaterial {
                message: "load client cert/key: client_cert and client_key must be set together"
                    .to_string(),
            })
        }
    }

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().map_err(|e| LedgerError::TlsMaterial {
        message: format!("build TLS client: {}", e),
    })
}

fn read_material(path: &Path, context: &str) -> LedgerResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| LedgerError::TlsMaterial {
        message: format!("{} {}: {}", context, path.display(), e),
    })
}

async fn remote_error(response: reqwest::Response) -> LedgerError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    LedgerError::Remote { status, body }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn get_product_item_passport(&self, uuid: &str) -> LedgerResult<ProductItemPassport> {
        let endpoint = self.product.as_ref().ok_or(LedgerError::Unconfigured {
            endpoint: LedgerEndpointKind::ProductItem,
        })?;

        let url = format!(
            "{}/product_item/",
            endpoint.url.as_str().trim_end_matches('/')
        );
        tracing::debug!(%url, uuid, "Fetching product item passport");

        let response = endpoint
            .http
            .get(&url)
            .query(&[("uuid", uuid)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        let bytes = response.bytes().await?;
        let passport: ProductItemPassport = serde_json::from_slice(&bytes)?;
        Ok(passport)
    }

    async fn create_commissioning_passport(
        &self,
        req: &CommissioningCreateRequest,
    ) -> LedgerResult<()> {
        let endpoint = self.commissioning.as_ref().ok_or(LedgerError::Unconfigured {
            endpoint: LedgerEndpointKind::Commissioning,
        })?;

        tracing::debug!(
            url = %endpoint.url,
            controller_uuid = %req.controller_uuid,
            "Creating commissioning passport"
        );

        let response = endpoint
            .http
            .post(endpoint.url.clone())
            .json(req)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        Ok(())
    }
}
