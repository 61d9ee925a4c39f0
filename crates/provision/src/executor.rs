//! Sequential execution of a topology plan against a cloud client.
//!
//! Steps run strictly in [`Step::ORDER`]: each later step's request is built
//! from an identifier an earlier step returned, so there is nothing to run
//! concurrently. The first failure stops the run. Nothing is rolled back -
//! resources created before (and during) the failing step stay on the
//! provider and are listed in the report.

use crate::client::{
    CloudClient, GatewayId, RemoteError, RemoteErrorKind, RouteTableId, SubnetId, VpcId,
};
use crate::error::StepFailure;
use crate::plan::{Step, TopologyPlan};
use crate::report::{CreatedResources, ExecutionReport, StepOutcome};
use log::debug;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Tag key set on every created resource.
pub const NAME_TAG: &str = "Name";
/// Name-tag value for the public subnet.
pub const PUBLIC_SUBNET_NAME: &str = "PublicSubnet";
/// Name-tag value for the private subnet.
pub const PRIVATE_SUBNET_NAME: &str = "PrivateSubnet";
/// Name-tag value for the public route table.
pub const PUBLIC_ROUTE_TABLE_NAME: &str = "PublicRouteTable";
/// Name-tag value for the private route table.
pub const PRIVATE_ROUTE_TABLE_NAME: &str = "PrivateRouteTable";

/// Options controlling one execution.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Upper bound on the VPC availability wait.
    pub wait_timeout: Duration,
    /// Checked before each step starts. When set, the run stops with a
    /// cancellation failure at the step that never began; work already done
    /// stays in place, consistent with the no-rollback contract.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(300),
            cancel: None,
        }
    }
}

/// Receives progress while steps run.
pub trait ProgressCallback {
    /// Called when a step's first remote call is about to go out.
    fn on_step_start(&mut self, step: Step);

    /// Called when a step finished, successfully or not.
    fn on_step_complete(&mut self, step: Step, outcome: &StepOutcome);
}

/// No-op progress callback.
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_step_start(&mut self, _step: Step) {}
    fn on_step_complete(&mut self, _step: Step, _outcome: &StepOutcome) {}
}

/// Walk the six steps in order, threading each created handle into the steps
/// that need it and stopping at the first failure.
///
/// Tagging is part of each creation step: a resource the provider created
/// but we could not tag counts as a failed step, and the untagged resource
/// still shows up in `report.resources`.
pub fn execute<C: CloudClient, P: ProgressCallback>(
    plan: &TopologyPlan,
    client: &C,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> ExecutionReport {
    let mut report = ExecutionReport::new();

    // Step 1: the VPC. Everything else is carved out of it, so the step only
    // succeeds once the provider reports it available.
    let Some(vpc) = run_step(Step::Vpc, &mut report, opts, progress, |resources| {
        let vpc = client.create_vpc(&plan.vpc_cidr())?;
        resources.vpc = Some(vpc.clone());
        client.await_vpc_available(&vpc, opts.wait_timeout)?;
        client.tag(vpc.as_str(), NAME_TAG, plan.vpc_name())?;
        Ok(vpc)
    }) else {
        return report;
    };

    // Step 2: internet gateway, attached to the VPC.
    let Some(gateway) = run_step(
        Step::InternetGateway,
        &mut report,
        opts,
        progress,
        |resources| {
            let gateway = client.create_internet_gateway()?;
            resources.internet_gateway = Some(gateway.clone());
            client.attach_gateway(&gateway, &vpc)?;
            Ok(gateway)
        },
    ) else {
        return report;
    };

    // Steps 3 and 4: the subnets, both in the requested availability zone.
    let Some(public_subnet) = run_step(
        Step::PublicSubnet,
        &mut report,
        opts,
        progress,
        |resources| {
            let subnet = client.create_subnet(&vpc, &plan.public_cidr(), plan.availability_zone())?;
            resources.public_subnet = Some(subnet.clone());
            client.tag(subnet.as_str(), NAME_TAG, PUBLIC_SUBNET_NAME)?;
            Ok(subnet)
        },
    ) else {
        return report;
    };

    let Some(private_subnet) = run_step(
        Step::PrivateSubnet,
        &mut report,
        opts,
        progress,
        |resources| {
            let subnet =
                client.create_subnet(&vpc, &plan.private_cidr(), plan.availability_zone())?;
            resources.private_subnet = Some(subnet.clone());
            client.tag(subnet.as_str(), NAME_TAG, PRIVATE_SUBNET_NAME)?;
            Ok(subnet)
        },
    ) else {
        return report;
    };

    // Steps 5 and 6: one route table per subnet. The gateway handle is the
    // only difference between them - with it the table gets the default
    // route, without it the table keeps none.
    if run_step(
        Step::PublicRouteTable,
        &mut report,
        opts,
        progress,
        |resources| {
            route_table_step(
                client,
                &vpc,
                &public_subnet,
                Some(&gateway),
                PUBLIC_ROUTE_TABLE_NAME,
                &mut resources.public_route_table,
            )
        },
    )
    .is_none()
    {
        return report;
    }

    let _ = run_step(
        Step::PrivateRouteTable,
        &mut report,
        opts,
        progress,
        |resources| {
            route_table_step(
                client,
                &vpc,
                &private_subnet,
                None,
                PRIVATE_ROUTE_TABLE_NAME,
                &mut resources.private_route_table,
            )
        },
    );

    report
}

/// Create, tag, and associate one route table, adding the default route when
/// a gateway handle is supplied.
fn route_table_step<C: CloudClient>(
    client: &C,
    vpc: &VpcId,
    subnet: &SubnetId,
    gateway: Option<&GatewayId>,
    name: &str,
    slot: &mut Option<RouteTableId>,
) -> Result<RouteTableId, RemoteError> {
    let table = client.create_route_table(vpc)?;
    *slot = Some(table.clone());
    client.tag(table.as_str(), NAME_TAG, name)?;
    client.associate_route_table(&table, subnet)?;
    if let Some(gateway) = gateway {
        client.add_default_route(&table, gateway)?;
    }
    Ok(table)
}

/// Run one step: check for cancellation, invoke the operation, record the
/// outcome. Returns the produced handle, or `None` when the run must stop.
fn run_step<T, P, F>(
    step: Step,
    report: &mut ExecutionReport,
    opts: &ExecuteOptions,
    progress: &mut P,
    op: F,
) -> Option<T>
where
    T: fmt::Display,
    P: ProgressCallback,
    F: FnOnce(&mut CreatedResources) -> Result<T, RemoteError>,
{
    if cancelled(opts) {
        let error = RemoteError::new(
            RemoteErrorKind::Cancelled,
            "execution cancelled before the step started",
        );
        debug!("{step}: {error}");
        report.outcomes.push(StepOutcome::failed(step, &error));
        report.failure = Some(StepFailure { step, error });
        return None;
    }

    progress.on_step_start(step);
    match op(&mut report.resources) {
        Ok(handle) => {
            debug!("{step}: created {handle}");
            let outcome = StepOutcome::succeeded(step, handle.to_string());
            progress.on_step_complete(step, &outcome);
            report.outcomes.push(outcome);
            Some(handle)
        }
        Err(error) => {
            debug!("{step}: failed: {error}");
            let outcome = StepOutcome::failed(step, &error);
            progress.on_step_complete(step, &outcome);
            report.outcomes.push(outcome);
            report.failure = Some(StepFailure { step, error });
            None
        }
    }
}

fn cancelled(opts: &ExecuteOptions) -> bool {
    opts.cancel
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cidr::Ipv4Cidr;
    use crate::error::Error;
    use crate::plan::{Strictness, TopologySpec};
    use std::cell::{Cell, RefCell};

    /// Scripted fake provider. Records every call as a readable line and can
    /// fail the nth occurrence of one operation.
    struct FakeCloud {
        calls: RefCell<Vec<String>>,
        subnets: Cell<usize>,
        tables: Cell<usize>,
        fail: Option<(&'static str, usize)>,
        fail_kind: RemoteErrorKind,
    }

    impl FakeCloud {
        fn ok() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                subnets: Cell::new(0),
                tables: Cell::new(0),
                fail: None,
                fail_kind: RemoteErrorKind::InvalidRequest,
            }
        }

        fn failing(op: &'static str, nth: usize) -> Self {
            Self {
                fail: Some((op, nth)),
                ..Self::ok()
            }
        }

        fn failing_with(op: &'static str, nth: usize, kind: RemoteErrorKind) -> Self {
            Self {
                fail: Some((op, nth)),
                fail_kind: kind,
                ..Self::ok()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn check(&self, call: String) -> Result<(), RemoteError> {
            let op = call.split(' ').next().unwrap_or_default().to_string();
            let seen = self
                .calls
                .borrow()
                .iter()
                .filter(|c| c.split(' ').next() == Some(op.as_str()))
                .count();
            self.calls.borrow_mut().push(call);
            if let Some((fail_op, fail_nth)) = self.fail
                && fail_op == op
                && fail_nth == seen + 1
            {
                return Err(RemoteError::new(
                    self.fail_kind,
                    format!("{op} rejected by provider"),
                ));
            }
            Ok(())
        }
    }

    impl CloudClient for FakeCloud {
        fn create_vpc(&self, cidr: &Ipv4Cidr) -> Result<VpcId, RemoteError> {
            self.check(format!("create_vpc {cidr}"))?;
            Ok(VpcId("vpc-1".into()))
        }

        fn await_vpc_available(&self, vpc: &VpcId, _timeout: Duration) -> Result<(), RemoteError> {
            self.check(format!("await_vpc_available {vpc}"))
        }

        fn tag(&self, resource_id: &str, key: &str, value: &str) -> Result<(), RemoteError> {
            self.check(format!("tag {resource_id} {key}={value}"))
        }

        fn create_internet_gateway(&self) -> Result<GatewayId, RemoteError> {
            self.check("create_internet_gateway".to_string())?;
            Ok(GatewayId("igw-1".into()))
        }

        fn attach_gateway(&self, gateway: &GatewayId, vpc: &VpcId) -> Result<(), RemoteError> {
            self.check(format!("attach_gateway {gateway} {vpc}"))
        }

        fn create_subnet(
            &self,
            vpc: &VpcId,
            cidr: &Ipv4Cidr,
            availability_zone: &str,
        ) -> Result<SubnetId, RemoteError> {
            self.check(format!("create_subnet {vpc} {cidr} {availability_zone}"))?;
            let n = self.subnets.get() + 1;
            self.subnets.set(n);
            Ok(SubnetId(format!("subnet-{n}")))
        }

        fn create_route_table(&self, vpc: &VpcId) -> Result<RouteTableId, RemoteError> {
            self.check(format!("create_route_table {vpc}"))?;
            let n = self.tables.get() + 1;
            self.tables.set(n);
            Ok(RouteTableId(format!("rtb-{n}")))
        }

        fn associate_route_table(
            &self,
            table: &RouteTableId,
            subnet: &SubnetId,
        ) -> Result<(), RemoteError> {
            self.check(format!("associate_route_table {table} {subnet}"))
        }

        fn add_default_route(
            &self,
            table: &RouteTableId,
            gateway: &GatewayId,
        ) -> Result<(), RemoteError> {
            self.check(format!("add_default_route {table} {gateway}"))
        }
    }

    fn demo_spec() -> TopologySpec {
        TopologySpec {
            vpc_cidr: "10.0.0.0/16".into(),
            vpc_name: "demo".into(),
            public_cidr: "10.0.1.0/24".into(),
            private_cidr: "10.0.2.0/24".into(),
            availability_zone: "us-east-1a".into(),
        }
    }

    fn demo_plan() -> TopologyPlan {
        TopologyPlan::build(&demo_spec(), Strictness::Strict).unwrap()
    }

    #[test]
    fn runs_all_six_steps_in_order() {
        let cloud = FakeCloud::ok();
        let report = execute(
            &demo_plan(),
            &cloud,
            &ExecuteOptions::default(),
            &mut NoProgress,
        );

        assert!(report.succeeded());
        assert_eq!(report.completed_steps(), 6);
        assert_eq!(
            report.resources.handles(),
            vec!["vpc-1", "igw-1", "subnet-1", "subnet-2", "rtb-1", "rtb-2"]
        );

        let calls = cloud.calls();
        let calls: Vec<&str> = calls.iter().map(String::as_str).collect();
        assert_eq!(
            calls,
            vec![
                "create_vpc 10.0.0.0/16",
                "await_vpc_available vpc-1",
                "tag vpc-1 Name=demo",
                "create_internet_gateway",
                "attach_gateway igw-1 vpc-1",
                "create_subnet vpc-1 10.0.1.0/24 us-east-1a",
                "tag subnet-1 Name=PublicSubnet",
                "create_subnet vpc-1 10.0.2.0/24 us-east-1a",
                "tag subnet-2 Name=PrivateSubnet",
                "create_route_table vpc-1",
                "tag rtb-1 Name=PublicRouteTable",
                "associate_route_table rtb-1 subnet-1",
                "add_default_route rtb-1 igw-1",
                "create_route_table vpc-1",
                "tag rtb-2 Name=PrivateRouteTable",
                "associate_route_table rtb-2 subnet-2",
            ]
        );
    }

    #[test]
    fn only_the_public_route_table_gets_a_default_route() {
        let cloud = FakeCloud::ok();
        execute(
            &demo_plan(),
            &cloud,
            &ExecuteOptions::default(),
            &mut NoProgress,
        );

        let calls = cloud.calls();
        let routes: Vec<&str> = calls
            .iter()
            .filter(|c| c.starts_with("add_default_route"))
            .map(String::as_str)
            .collect();
        assert_eq!(routes, vec!["add_default_route rtb-1 igw-1"]);
    }

    #[test]
    fn stops_at_first_failure_and_keeps_prior_handles() {
        let cases: [(&str, usize, Step); 6] = [
            ("create_vpc", 1, Step::Vpc),
            ("create_internet_gateway", 1, Step::InternetGateway),
            ("create_subnet", 1, Step::PublicSubnet),
            ("create_subnet", 2, Step::PrivateSubnet),
            ("create_route_table", 1, Step::PublicRouteTable),
            ("create_route_table", 2, Step::PrivateRouteTable),
        ];

        for (index, (op, nth, step)) in cases.into_iter().enumerate() {
            let cloud = FakeCloud::failing(op, nth);
            let report = execute(
                &demo_plan(),
                &cloud,
                &ExecuteOptions::default(),
                &mut NoProgress,
            );

            let failure = report.failure.as_ref().expect("run should fail");
            assert_eq!(failure.step, step);
            // one resource per completed step, nothing from the failed one
            assert_eq!(report.completed_steps(), index);
            assert_eq!(report.resources.count(), index);
            assert_eq!(report.outcomes.len(), index + 1);

            let calls = cloud.calls();
            let last = calls.last().expect("at least the failing call");
            assert!(last.starts_with(op), "stopped at {last}, expected {op}");
        }
    }

    #[test]
    fn association_failure_keeps_the_partially_created_table() {
        let cloud = FakeCloud::failing("associate_route_table", 2);
        let report = execute(
            &demo_plan(),
            &cloud,
            &ExecuteOptions::default(),
            &mut NoProgress,
        );

        let failure = report.failure.as_ref().expect("run should fail");
        assert_eq!(failure.step, Step::PrivateRouteTable);
        assert_eq!(report.completed_steps(), 5);

        let resources = &report.resources;
        assert!(resources.vpc.is_some());
        assert!(resources.internet_gateway.is_some());
        assert!(resources.public_subnet.is_some());
        assert!(resources.private_subnet.is_some());
        assert!(resources.public_route_table.is_some());
        // created before the association was rejected, so it is reported
        assert_eq!(
            resources.private_route_table,
            Some(RouteTableId("rtb-2".into()))
        );
    }

    #[test]
    fn tag_failure_fails_the_step_but_reports_the_resource() {
        let cloud = FakeCloud::failing("tag", 2);
        let report = execute(
            &demo_plan(),
            &cloud,
            &ExecuteOptions::default(),
            &mut NoProgress,
        );

        let failure = report.failure.as_ref().expect("run should fail");
        assert_eq!(failure.step, Step::PublicSubnet);
        assert!(report.resources.public_subnet.is_some());
        assert_eq!(report.completed_steps(), 2);
    }

    #[test]
    fn availability_timeout_fails_the_vpc_step() {
        let cloud = FakeCloud::failing_with("await_vpc_available", 1, RemoteErrorKind::Timeout);
        let report = execute(
            &demo_plan(),
            &cloud,
            &ExecuteOptions::default(),
            &mut NoProgress,
        );

        let failure = report.failure.as_ref().expect("run should fail");
        assert_eq!(failure.step, Step::Vpc);
        assert_eq!(failure.error.kind, RemoteErrorKind::Timeout);
        // created but never became available - still reported
        assert!(report.resources.vpc.is_some());
        assert_eq!(report.completed_steps(), 0);
        assert!(
            !cloud
                .calls()
                .iter()
                .any(|c| c.starts_with("create_internet_gateway"))
        );
    }

    #[test]
    fn cancellation_before_start_runs_nothing() {
        let cancel = Arc::new(AtomicBool::new(true));
        let opts = ExecuteOptions {
            cancel: Some(cancel),
            ..Default::default()
        };
        let cloud = FakeCloud::ok();
        let report = execute(&demo_plan(), &cloud, &opts, &mut NoProgress);

        assert!(cloud.calls().is_empty());
        let failure = report.failure.as_ref().expect("run should fail");
        assert_eq!(failure.step, Step::Vpc);
        assert_eq!(failure.error.kind, RemoteErrorKind::Cancelled);
    }

    /// Sets the cancel flag once the given step completes.
    struct CancelAfter {
        step: Step,
        flag: Arc<AtomicBool>,
    }

    impl ProgressCallback for CancelAfter {
        fn on_step_start(&mut self, _step: Step) {}

        fn on_step_complete(&mut self, step: Step, _outcome: &StepOutcome) {
            if step == self.step {
                self.flag.store(true, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn cancellation_between_steps_stops_before_the_next() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut progress = CancelAfter {
            step: Step::Vpc,
            flag: flag.clone(),
        };
        let opts = ExecuteOptions {
            cancel: Some(flag),
            ..Default::default()
        };
        let cloud = FakeCloud::ok();
        let report = execute(&demo_plan(), &cloud, &opts, &mut progress);

        let failure = report.failure.as_ref().expect("run should fail");
        assert_eq!(failure.step, Step::InternetGateway);
        assert_eq!(failure.error.kind, RemoteErrorKind::Cancelled);
        assert_eq!(report.completed_steps(), 1);
        assert!(report.resources.vpc.is_some());
        // the VPC step finished in full; nothing from step 2 went out
        let calls = cloud.calls();
        assert_eq!(calls.last().map(String::as_str), Some("tag vpc-1 Name=demo"));
    }

    #[test]
    fn invalid_input_never_reaches_the_client() {
        let cloud = FakeCloud::ok();
        let spec = TopologySpec {
            public_cidr: "999.0.0.0/24".into(),
            ..demo_spec()
        };
        let err = TopologyPlan::build(&spec, Strictness::Strict).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(cloud.calls().is_empty());
    }
}
