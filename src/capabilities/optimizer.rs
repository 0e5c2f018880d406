//! Route optimizer capability. The request is fully validated before it gets
//! here; failures surface to the user and are never retried automatically.

use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::route::{RouteRequest, RouteResult};
use crate::DEFAULT_CALL_TIMEOUT_MS;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OptimizeOperation {
    pub request: RouteRequest,
    pub timeout_ms: u64,
}

impl Operation for OptimizeOperation {
    type Output = OptimizeResult;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    #[error("optimizer rejected the request: {message}")]
    Rejected { message: String },
    #[error("optimization failed: {reason}")]
    Transient { reason: String },
    #[error("optimizer timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

pub type OptimizeResult = Result<RouteResult, OptimizeError>;

pub struct Optimizer<Ev> {
    context: CapabilityContext<OptimizeOperation, Ev>,
}

impl<Ev> crux_core::capability::Capability<Ev> for Optimizer<Ev> {
    type Operation = OptimizeOperation;
    type MappedSelf<MappedEv> = Optimizer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Optimizer::new(self.context.map_event(f))
    }
}

impl<Ev> Optimizer<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<OptimizeOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn optimize<F>(&self, request: RouteRequest, make_event: F)
    where
        F: FnOnce(OptimizeResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        let operation = OptimizeOperation {
            request,
            timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
        };
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
