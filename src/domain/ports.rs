use crate::domain::model::{CommissioningCreateRequest, ProductItemPassport};
use crate::utils::error::{LedgerError, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};

/// The two ledger operations the onboarding hooks depend on.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_product_item_passport(
        &self,
        uuid: &str,
    ) -> std::result::Result<ProductItemPassport, LedgerError>;

    async fn create_commissioning_passport(
        &self,
        req: &CommissioningCreateRequest,
    ) -> std::result::Result<(), LedgerError>;
}

/// Hook points the proxy calls around every forwarded exchange.
///
/// Both default to a no-op so a middleware only implements the side it
/// cares about. Returning an error from `process_request` stops the
/// exchange; `process_response` errors are only logged by the proxy.
#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process_request(&self, _req: &mut Request<Body>) -> Result<()> {
        Ok(())
    }

    async fn process_response(&self, _resp: &mut Response<Body>) -> Result<()> {
        Ok(())
    }
}
