use crate::core::classifier::{classify_request, classify_response};
use crate::domain::model::CommissioningCreateRequest;
use crate::domain::ports::{LedgerClient, Middleware};
use crate::utils::error::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use std::sync::Arc;

/// Stand-in device identifier until the Done2 wire encoding is agreed.
pub const PLACEHOLDER_DEVICE_GUID: &str = "example-device-guid";

/// Records a commissioning passport when the owner answers with TO2.Done2.
pub struct To2Middleware {
    ledger_client: Option<Arc<dyn LedgerClient>>,
    owner_id: String,
    deployed_location: String,
}

impl To2Middleware {
    pub fn new(ledger_client: Option<Arc<dyn LedgerClient>>, owner_id: impl Into<String>) -> Self {
        Self {
            ledger_client,
            owner_id: owner_id.into(),
            deployed_location: String::new(),
        }
    }

    pub fn with_deployed_location(mut self, deployed_location: impl Into<String>) -> Self {
        self.deployed_location = deployed_location.into();
        self
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    async fn handle_done2(&self, device_guid: String) -> Result<()> {
        let Some(ledger) = &self.ledger_client else {
            tracing::debug!(device = %device_guid, "No ledger client, skipping commissioning passport");
            return Ok(());
        };

        let req = CommissioningCreateRequest::new_now(
            &self.owner_id,
            &device_guid,
            &self.deployed_location,
        );

        match ledger.create_commissioning_passport(&req).await {
            Ok(()) => {
                tracing::info!(
                    device = %device_guid,
                    controller_uuid = %req.controller_uuid,
                    "Recorded commissioning passport after TO2.Done2"
                );
            }
            Err(e) => {
                tracing::error!(
                    device = %device_guid,
                    error = %e,
                    "Commissioning passport creation failed, onboarding response unaffected"
                );
            }
        }

        Ok(())
    }
}

// TODO: read the device GUID from the Done2 payload once its encoding is fixed with the ledger owners.
pub fn extract_device_guid(_resp: &Response<Body>) -> String {
    PLACEHOLDER_DEVICE_GUID.to_string()
}

#[async_trait]
impl Middleware for To2Middleware {
    fn name(&self) -> &'static str {
        "to2"
    }

    async fn process_request(&self, req: &mut Request<Body>) -> Result<()> {
        let tag = classify_request(req.uri().path());
        if tag.is_to2_request() {
            tracing::debug!(message_type = %tag.message_type, "Observed TO2 request");
        }
        Ok(())
    }

    async fn process_response(&self, resp: &mut Response<Body>) -> Result<()> {
        let tag = classify_response(resp.headers());
        if !tag.is_to2_done2() {
            return Ok(());
        }
        let device_guid = extract_device_guid(resp);
        self.handle_done2(device_guid).await
    }
}
