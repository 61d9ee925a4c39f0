//! Cloud resource client seam.
//!
//! The executor drives every remote operation through [`CloudClient`], so the
//! workflow can run against a fake in tests and against a real provider
//! backend in the binary. Implementations own all provider specifics: wire
//! format, authentication, polling.

use crate::cidr::Ipv4Cidr;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Identifier of a created VPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VpcId(pub String);

/// Identifier of a created internet gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayId(pub String);

/// Identifier of a created subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetId(pub String);

/// Identifier of a created route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTableId(pub String);

impl VpcId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl GatewayId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SubnetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RouteTableId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for GatewayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SubnetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RouteTableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of a remote failure.
///
/// Reporting only: the executor treats every kind as fatal to the run and
/// never retries. The category tells the operator whether re-invoking might
/// help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// Credentials lack permission for the operation.
    Permission,
    /// An account limit was hit.
    Quota,
    /// The provider asked us to slow down.
    Throttling,
    /// The provider rejected the request as malformed.
    InvalidRequest,
    /// A bounded wait elapsed before the resource became ready.
    Timeout,
    /// Execution was cancelled before the step started.
    Cancelled,
    /// Anything else.
    Other,
}

/// A failure returned by the cloud provider for one API operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Other, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Timeout, message)
    }
}

/// Operations the provisioning workflow needs from the provider.
///
/// Every call is a single synchronous round-trip, except
/// `await_vpc_available` which blocks until the provider reports the VPC
/// usable or `timeout` elapses. Subnets must not be created before that wait
/// returns.
pub trait CloudClient {
    /// Create the VPC for an address block.
    fn create_vpc(&self, cidr: &Ipv4Cidr) -> Result<VpcId, RemoteError>;

    /// Block until the VPC is available, or fail with a `Timeout` kind.
    fn await_vpc_available(&self, vpc: &VpcId, timeout: Duration) -> Result<(), RemoteError>;

    /// Set one tag on any resource.
    fn tag(&self, resource_id: &str, key: &str, value: &str) -> Result<(), RemoteError>;

    fn create_internet_gateway(&self) -> Result<GatewayId, RemoteError>;

    fn attach_gateway(&self, gateway: &GatewayId, vpc: &VpcId) -> Result<(), RemoteError>;

    fn create_subnet(
        &self,
        vpc: &VpcId,
        cidr: &Ipv4Cidr,
        availability_zone: &str,
    ) -> Result<SubnetId, RemoteError>;

    fn create_route_table(&self, vpc: &VpcId) -> Result<RouteTableId, RemoteError>;

    fn associate_route_table(
        &self,
        table: &RouteTableId,
        subnet: &SubnetId,
    ) -> Result<(), RemoteError>;

    /// Add the `0.0.0.0/0` route pointing at the gateway.
    fn add_default_route(
        &self,
        table: &RouteTableId,
        gateway: &GatewayId,
    ) -> Result<(), RemoteError>;
}
