//! `vpcup plan` - validate inputs and preview the provisioning steps.

use anyhow::Result;
use provision::{Step, TopologyPlan};
use serde::Serialize;

use crate::Verbosity;
use crate::cli::TopologyArgs;
use crate::ui;

#[derive(Serialize)]
struct PlanView<'a> {
    plan: &'a TopologyPlan,
    steps: Vec<&'static str>,
}

pub fn run(verbosity: &Verbosity, args: &TopologyArgs) -> Result<()> {
    let plan = super::build_plan(args)?;

    if args.json {
        let view = PlanView {
            plan: &plan,
            steps: plan.steps().iter().map(Step::name).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if !verbosity.quiet {
        ui::header("Provisioning plan");
        ui::kv("vpc", &format!("{} ({})", plan.vpc_name(), plan.vpc_cidr()));
        ui::kv("public subnet", &plan.public_cidr().to_string());
        ui::kv("private subnet", &plan.private_cidr().to_string());
        ui::kv("availability zone", plan.availability_zone());
        println!();
    }

    let total = plan.steps().len();
    for (i, step) in plan.steps().iter().enumerate() {
        ui::step(i + 1, total, &super::describe(*step, &plan));
    }

    Ok(())
}
