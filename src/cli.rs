use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(name = "vpcup")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Provision a VPC with public/private subnets and routing", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate inputs and show the provisioning steps, without touching the provider
    Plan(TopologyArgs),

    /// Provision the topology against the cloud provider
    Apply(ApplyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct TopologyArgs {
    /// VPC CIDR block (e.g. 10.0.0.0/16)
    #[arg(long, value_name = "CIDR")]
    pub vpc_cidr: String,

    /// Value for the VPC's Name tag
    #[arg(long, value_name = "NAME")]
    pub vpc_name: String,

    /// Public subnet CIDR block
    #[arg(long, value_name = "CIDR")]
    pub public_cidr: String,

    /// Private subnet CIDR block
    #[arg(long, value_name = "CIDR")]
    pub private_cidr: String,

    /// Availability zone for both subnets (e.g. us-east-1a)
    #[arg(long, value_name = "AZ")]
    pub availability_zone: String,

    /// Skip the local check that subnet blocks fall inside the VPC block
    #[arg(long)]
    pub no_containment_check: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub topology: TopologyArgs,

    /// AWS region to operate in (defaults to the AWS CLI's configured region)
    #[arg(long, env = "AWS_REGION", value_name = "REGION")]
    pub region: Option<String>,

    /// AWS CLI profile to use
    #[arg(long, env = "AWS_PROFILE", value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Seconds to wait for the VPC to become available
    #[arg(long, default_value_t = 300, value_name = "SECS")]
    pub wait_timeout: u64,
}
