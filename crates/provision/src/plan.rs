//! Topology planning - validate inputs and fix the provisioning order.
//!
//! Planning is pure: no remote call happens here, and a plan that builds at
//! all is a plan whose every field has been validated. Failing fast is the
//! planner's whole job, since any later failure leaves real resources behind.

use crate::cidr::Ipv4Cidr;
use crate::error::{Error, FieldIssue, Result};
use serde::Serialize;
use std::fmt;

/// Raw, unvalidated inputs for a topology.
#[derive(Debug, Clone)]
pub struct TopologySpec {
    pub vpc_cidr: String,
    pub vpc_name: String,
    pub public_cidr: String,
    pub private_cidr: String,
    pub availability_zone: String,
}

/// Whether the planner checks subnet containment locally.
///
/// The provider validates containment anyway; checking it here turns a remote
/// step failure (with a VPC already created) into a local input error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Reject subnet blocks that fall outside the VPC block.
    #[default]
    Strict,
    /// Defer containment to the provider's own validation.
    Lenient,
}

/// The six provisioning steps, in mandatory execution order.
///
/// Steps 3-6 need the VPC handle from step 1; step 5 additionally needs the
/// gateway handle from step 2 and the public-subnet handle from step 3;
/// step 6 needs the private-subnet handle from step 4. There is no forward
/// reference, which is what makes the order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Vpc,
    InternetGateway,
    PublicSubnet,
    PrivateSubnet,
    PublicRouteTable,
    PrivateRouteTable,
}

impl Step {
    /// Execution order.
    pub const ORDER: [Step; 6] = [
        Step::Vpc,
        Step::InternetGateway,
        Step::PublicSubnet,
        Step::PrivateSubnet,
        Step::PublicRouteTable,
        Step::PrivateRouteTable,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::Vpc => "vpc",
            Step::InternetGateway => "internet-gateway",
            Step::PublicSubnet => "public-subnet",
            Step::PrivateSubnet => "private-subnet",
            Step::PublicRouteTable => "public-route-table",
            Step::PrivateRouteTable => "private-route-table",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated, immutable provisioning plan.
///
/// Built once from a [`TopologySpec`]; the executor only reads it.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyPlan {
    vpc_cidr: Ipv4Cidr,
    vpc_name: String,
    public_cidr: Ipv4Cidr,
    private_cidr: Ipv4Cidr,
    availability_zone: String,
}

impl TopologyPlan {
    /// Validate `spec` and build a plan.
    ///
    /// All failing fields are reported together in a single
    /// [`Error::InvalidInput`] rather than one at a time.
    pub fn build(spec: &TopologySpec, strictness: Strictness) -> Result<TopologyPlan> {
        let mut issues = Vec::new();

        let vpc_cidr = parse_block("vpc-cidr", &spec.vpc_cidr, &mut issues);
        let public_cidr = parse_block("public-cidr", &spec.public_cidr, &mut issues);
        let private_cidr = parse_block("private-cidr", &spec.private_cidr, &mut issues);

        if spec.vpc_name.trim().is_empty() {
            issues.push(FieldIssue::new("vpc-name", "must not be empty"));
        }
        if spec.availability_zone.trim().is_empty() {
            issues.push(FieldIssue::new("availability-zone", "must not be empty"));
        }

        if strictness == Strictness::Strict
            && let (Some(vpc), Some(public), Some(private)) = (vpc_cidr, public_cidr, private_cidr)
        {
            if !vpc.contains(&public) {
                issues.push(FieldIssue::new(
                    "public-cidr",
                    format!("{public} is outside the VPC block {vpc}"),
                ));
            }
            if !vpc.contains(&private) {
                issues.push(FieldIssue::new(
                    "private-cidr",
                    format!("{private} is outside the VPC block {vpc}"),
                ));
            }
        }

        match (vpc_cidr, public_cidr, private_cidr) {
            (Some(vpc_cidr), Some(public_cidr), Some(private_cidr)) if issues.is_empty() => {
                Ok(TopologyPlan {
                    vpc_cidr,
                    vpc_name: spec.vpc_name.clone(),
                    public_cidr,
                    private_cidr,
                    availability_zone: spec.availability_zone.clone(),
                })
            }
            _ => Err(Error::InvalidInput { issues }),
        }
    }

    pub fn vpc_cidr(&self) -> Ipv4Cidr {
        self.vpc_cidr
    }

    pub fn vpc_name(&self) -> &str {
        &self.vpc_name
    }

    pub fn public_cidr(&self) -> Ipv4Cidr {
        self.public_cidr
    }

    pub fn private_cidr(&self) -> Ipv4Cidr {
        self.private_cidr
    }

    pub fn availability_zone(&self) -> &str {
        &self.availability_zone
    }

    /// The steps this plan executes, in order.
    pub fn steps(&self) -> &'static [Step] {
        &Step::ORDER
    }
}

fn parse_block(field: &'static str, raw: &str, issues: &mut Vec<FieldIssue>) -> Option<Ipv4Cidr> {
    match raw.parse::<Ipv4Cidr>() {
        Ok(block) => Some(block),
        Err(e) => {
            issues.push(FieldIssue::new(field, e.to_string()));
            None
        }
    }
}
