use std::time::Duration;

use stockpile_infra::OperationContext;

/// Per-request operation scope, installed by the deadline middleware.
#[derive(Debug, Clone)]
pub struct RequestContext {
    operation: OperationContext,
}

impl RequestContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            operation: OperationContext::with_timeout(timeout),
        }
    }

    pub fn operation(&self) -> &OperationContext {
        &self.operation
    }
}
