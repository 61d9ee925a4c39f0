//! Execution reporting types.
//!
//! The report is the no-rollback contract made explicit: whatever an
//! execution created is listed in [`CreatedResources`], success or not.

use crate::client::{GatewayId, RemoteError, RouteTableId, SubnetId, VpcId};
use crate::error::StepFailure;
use crate::plan::Step;
use serde::Serialize;

/// Handles accumulated across one execution.
///
/// After a failure this is the partial-state record: everything listed here
/// exists on the provider and nothing tears it down. A handle is recorded as
/// soon as the provider returns it, so a compound step that fails halfway
/// still shows the resource it created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatedResources {
    pub vpc: Option<VpcId>,
    pub internet_gateway: Option<GatewayId>,
    pub public_subnet: Option<SubnetId>,
    pub private_subnet: Option<SubnetId>,
    pub public_route_table: Option<RouteTableId>,
    pub private_route_table: Option<RouteTableId>,
}

impl CreatedResources {
    /// Handles in creation order, for manual cleanup or resumption.
    pub fn handles(&self) -> Vec<&str> {
        [
            self.vpc.as_ref().map(VpcId::as_str),
            self.internet_gateway.as_ref().map(GatewayId::as_str),
            self.public_subnet.as_ref().map(SubnetId::as_str),
            self.private_subnet.as_ref().map(SubnetId::as_str),
            self.public_route_table.as_ref().map(RouteTableId::as_str),
            self.private_route_table.as_ref().map(RouteTableId::as_str),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn count(&self) -> usize {
        self.handles().len()
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    /// Identifier the step produced, on success.
    pub handle: Option<String>,
    /// What went wrong, on failure.
    pub error: Option<String>,
}

impl StepOutcome {
    pub(crate) fn succeeded(step: Step, handle: String) -> Self {
        Self {
            step,
            handle: Some(handle),
            error: None,
        }
    }

    pub(crate) fn failed(step: Step, error: &RemoteError) -> Self {
        Self {
            step,
            handle: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of walking a plan.
#[derive(Debug, Default, Serialize)]
pub struct ExecutionReport {
    /// Per-step outcomes, in execution order. Steps after a failure never
    /// started and have no outcome.
    pub outcomes: Vec<StepOutcome>,
    pub resources: CreatedResources,
    /// The first (and only) failure, when the run did not complete.
    pub failure: Option<StepFailure>,
}

impl ExecutionReport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Number of steps that completed successfully.
    pub fn completed_steps(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }
}
