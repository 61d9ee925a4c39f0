pub mod apply;
pub mod plan;

use provision::{Step, Strictness, TopologyPlan, TopologySpec};

use crate::cli::TopologyArgs;

/// Build a validated plan from CLI arguments. Fails with the aggregated
/// input issues before anything remote happens.
fn build_plan(args: &TopologyArgs) -> provision::Result<TopologyPlan> {
    let spec = TopologySpec {
        vpc_cidr: args.vpc_cidr.clone(),
        vpc_name: args.vpc_name.clone(),
        public_cidr: args.public_cidr.clone(),
        private_cidr: args.private_cidr.clone(),
        availability_zone: args.availability_zone.clone(),
    };
    let strictness = if args.no_containment_check {
        Strictness::Lenient
    } else {
        Strictness::Strict
    };
    TopologyPlan::build(&spec, strictness)
}

/// One-line description of a step, for the plan preview.
fn describe(step: Step, plan: &TopologyPlan) -> String {
    match step {
        Step::Vpc => format!(
            "create VPC {} named {:?} and wait until available",
            plan.vpc_cidr(),
            plan.vpc_name()
        ),
        Step::InternetGateway => "create an internet gateway and attach it to the VPC".to_string(),
        Step::PublicSubnet => format!(
            "create subnet {} in {} tagged \"PublicSubnet\"",
            plan.public_cidr(),
            plan.availability_zone()
        ),
        Step::PrivateSubnet => format!(
            "create subnet {} in {} tagged \"PrivateSubnet\"",
            plan.private_cidr(),
            plan.availability_zone()
        ),
        Step::PublicRouteTable => {
            "create a route table for the public subnet with a default route to the gateway"
                .to_string()
        }
        Step::PrivateRouteTable => {
            "create a route table for the private subnet with no default route".to_string()
        }
    }
}
