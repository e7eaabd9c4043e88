use crate::domain::ports::Middleware;
use crate::utils::error::Result;
use axum::body::Body;
use axum::http::{Request, Response};
use std::sync::Arc;

/// Ordered list of hooks run around every proxied exchange.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    /// Stops at the first failing hook; the request must not be forwarded then.
    pub async fn process_request(&self, req: &mut Request<Body>) -> Result<()> {
        for middleware in &self.middlewares {
            middleware.process_request(req).await.inspect_err(|e| {
                tracing::error!(middleware = middleware.name(), error = %e, "Request hook failed");
            })?;
        }
        Ok(())
    }

    /// Every hook sees the response even if an earlier one failed.
    pub async fn process_response(&self, resp: &mut Response<Body>) -> Result<()> {
        let mut first_error = None;
        for middleware in &self.middlewares {
            if let Err(e) = middleware.process_response(resp).await {
                tracing::error!(middleware = middleware.name(), error = %e, "Response hook failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
