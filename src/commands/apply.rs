//! `vpcup apply` - run the provisioning workflow against the provider.

use anyhow::{Result, bail};
use provision::{ExecuteOptions, execute};
use std::time::Duration;

use crate::Verbosity;
use crate::cli::ApplyArgs;
use crate::client::AwsCliClient;
use crate::progress::StepPrinter;
use crate::ui;

pub fn run(verbosity: &Verbosity, args: &ApplyArgs) -> Result<()> {
    let plan = super::build_plan(&args.topology)?;

    if verbosity.level > 0 && !args.topology.json {
        ui::kv("vpc", &format!("{} ({})", plan.vpc_name(), plan.vpc_cidr()));
        ui::kv("public subnet", &plan.public_cidr().to_string());
        ui::kv("private subnet", &plan.private_cidr().to_string());
        ui::kv("availability zone", plan.availability_zone());
    }

    let client = AwsCliClient::new(args.region.clone(), args.profile.clone());
    let opts = ExecuteOptions {
        wait_timeout: Duration::from_secs(args.wait_timeout),
        cancel: None,
    };
    let mut progress = StepPrinter::new(verbosity.quiet || args.topology.json);

    let report = execute(&plan, &client, &opts, &mut progress);

    if args.topology.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match report.failure {
        None => {
            if !verbosity.quiet && !args.topology.json {
                ui::success("all resources created");
            }
            Ok(())
        }
        Some(failure) => {
            // No rollback: whatever was created is still out there. Surface
            // it so the operator can finish by hand or tear down.
            let handles = report.resources.handles();
            if !handles.is_empty() && !args.topology.json {
                ui::dim(&format!("created so far: {}", handles.join(", ")));
            }
            bail!("{failure}")
        }
    }
}
