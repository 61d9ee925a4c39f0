//! Provider backends for the provisioning workflow.

mod aws_cli;

pub use aws_cli::AwsCliClient;
