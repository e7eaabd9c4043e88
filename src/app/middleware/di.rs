use crate::core::classifier::{classify_request, classify_response};
use crate::domain::message::MessageType;
use crate::domain::model::ProductPassportContext;
use crate::domain::ports::{LedgerClient, Middleware};
use crate::utils::error::{ProxyError, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use std::sync::Arc;

/// Token whose presence in a DI.AppStart body marks a product identifier.
pub const PRODUCT_ID_MARKER: &[u8] = b"productId";
/// Stand-in identifier until the on-wire encoding of the product id is agreed.
pub const PLACEHOLDER_PRODUCT_ID: &str = "example-product-id";

pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Attaches the ledger's product item passport to DI.AppStart requests.
pub struct DiMiddleware {
    ledger_client: Option<Arc<dyn LedgerClient>>,
    enable_product_passport: bool,
    max_body_bytes: usize,
}

impl DiMiddleware {
    pub fn new(ledger_client: Option<Arc<dyn LedgerClient>>, enable_product_passport: bool) -> Self {
        Self {
            ledger_client,
            enable_product_passport,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn product_passport_enabled(&self) -> bool {
        self.enable_product_passport
    }

    async fn handle_app_start(&self, req: &mut Request<Body>) -> Result<()> {
        let ledger = match (&self.ledger_client, self.enable_product_passport) {
            (Some(ledger), true) => ledger,
            _ => {
                tracing::debug!("Product passport lookup disabled, skipping DI.AppStart enrichment");
                return Ok(());
            }
        };

        let body = std::mem::take(req.body_mut());
        let bytes = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|e| ProxyError::LocalFault {
                message: format!("read DI.AppStart body: {}", e),
            })?;
        *req.body_mut() = Body::from(bytes.clone());

        let Some(product_id) = extract_product_id(&bytes) else {
            tracing::debug!("No product identifier in DI.AppStart body");
            return Ok(());
        };

        match ledger.get_product_item_passport(&product_id).await {
            Ok(passport) => {
                tracing::info!(
                    uuid = %passport.uuid,
                    records = passport.records.len(),
                    "Attached product item passport to DI.AppStart"
                );
                req.extensions_mut().insert(ProductPassportContext(passport));
            }
            Err(e) => {
                tracing::warn!(product_id = %product_id, error = %e, "Product item passport lookup failed, continuing");
            }
        }

        Ok(())
    }
}

/// Looks for the product marker; CBOR decoding is out of scope here.
pub fn extract_product_id(body: &[u8]) -> Option<String> {
    body.windows(PRODUCT_ID_MARKER.len())
        .any(|window| window == PRODUCT_ID_MARKER)
        .then(|| PLACEHOLDER_PRODUCT_ID.to_string())
}

#[async_trait]
impl Middleware for DiMiddleware {
    fn name(&self) -> &'static str {
        "di"
    }

    async fn process_request(&self, req: &mut Request<Body>) -> Result<()> {
        let tag = classify_request(req.uri().path());
        if !tag.is_di_request() {
            return Ok(());
        }

        match tag.message_type {
            MessageType::DiAppStart => self.handle_app_start(req).await,
            other => {
                tracing::debug!(message_type = %other, "Observed DI request");
                Ok(())
            }
        }
    }

    async fn process_response(&self, resp: &mut Response<Body>) -> Result<()> {
        let tag = classify_response(resp.headers());
        if tag.is_di_response() {
            tracing::debug!(message_type = %tag.message_type, status = %resp.status(), "Observed DI response");
        }
        Ok(())
    }
}
