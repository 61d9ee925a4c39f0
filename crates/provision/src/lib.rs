//! # provision
//!
//! Core library for one-shot VPC topology provisioning.
//!
//! This crate validates network inputs, fixes the order of the provisioning
//! steps, and walks them sequentially against a cloud client. It never talks
//! to a provider itself - everything remote goes through the [`CloudClient`]
//! trait, so the whole workflow can be exercised against a fake.
//!
//! ## Core Concepts
//!
//! - **[`Ipv4Cidr`]**: a validated IPv4 address block (`10.0.0.0/16`)
//! - **[`TopologyPlan`]**: the validated, immutable plan - one VPC, an
//!   internet gateway, a public and a private subnet, and a route table per
//!   subnet
//! - **[`CloudClient`]**: the seam to the provider's resource API
//! - **[`execute`]**: runs the six steps in order, threading each created
//!   handle into the steps that depend on it
//!
//! ## Failure contract
//!
//! Execution stops at the first failing step and performs **no rollback**:
//! resources created before the failure stay on the provider, and the
//! returned [`ExecutionReport`] lists exactly which handles exist so an
//! operator can retry, finish by hand, or tear down.
//!
//! ## Example
//!
//! ```ignore
//! use provision::{execute, ExecuteOptions, NoProgress, Strictness, TopologyPlan, TopologySpec};
//!
//! let plan = TopologyPlan::build(
//!     &TopologySpec {
//!         vpc_cidr: "10.0.0.0/16".into(),
//!         vpc_name: "demo".into(),
//!         public_cidr: "10.0.1.0/24".into(),
//!         private_cidr: "10.0.2.0/24".into(),
//!         availability_zone: "us-east-1a".into(),
//!     },
//!     Strictness::Strict,
//! )?;
//!
//! let report = execute(&plan, &client, &ExecuteOptions::default(), &mut NoProgress);
//! if let Some(failure) = &report.failure {
//!     eprintln!("{failure}; created so far: {:?}", report.resources.handles());
//! }
//! ```

pub mod cidr;
pub mod client;
pub mod error;
pub mod executor;
pub mod plan;
pub mod report;

// Re-export main types at crate root
pub use cidr::{CidrParseError, Ipv4Cidr};
pub use client::{
    CloudClient, GatewayId, RemoteError, RemoteErrorKind, RouteTableId, SubnetId, VpcId,
};
pub use error::{Error, FieldIssue, Result, StepFailure};
pub use executor::{ExecuteOptions, NoProgress, ProgressCallback, execute};
pub use plan::{Step, Strictness, TopologyPlan, TopologySpec};
pub use report::{CreatedResources, ExecutionReport, StepOutcome};
