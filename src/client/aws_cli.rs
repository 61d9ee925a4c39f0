//! Cloud client backed by the `aws` command-line tool.
//!
//! Every operation shells out to `aws ec2 ... --output json` and parses the
//! response. Credentials, region resolution, and signing all stay with the
//! AWS CLI; this backend only builds requests and reads identifiers back.

use log::debug;
use provision::{
    CloudClient, GatewayId, Ipv4Cidr, RemoteError, RemoteErrorKind, RouteTableId, SubnetId, VpcId,
};
use serde::Deserialize;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often the availability wait polls the child process.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Backend that executes real `aws` commands.
pub struct AwsCliClient {
    region: Option<String>,
    profile: Option<String>,
}

impl AwsCliClient {
    pub fn new(region: Option<String>, profile: Option<String>) -> Self {
        Self { region, profile }
    }

    /// Build the argument vector for one `aws ec2` API call.
    fn ec2_args(&self, op: &str, extra: &[&str]) -> Vec<String> {
        let mut args = vec!["ec2".to_string(), op.to_string()];
        args.extend(extra.iter().map(ToString::to_string));
        args.push("--output".to_string());
        args.push("json".to_string());
        self.push_common_flags(&mut args);
        args
    }

    /// Build the argument vector for the VPC availability waiter.
    fn wait_args(&self, vpc: &VpcId) -> Vec<String> {
        let mut args = vec![
            "ec2".to_string(),
            "wait".to_string(),
            "vpc-available".to_string(),
            "--vpc-ids".to_string(),
            vpc.0.clone(),
        ];
        self.push_common_flags(&mut args);
        args
    }

    fn push_common_flags(&self, args: &mut Vec<String>) {
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
    }

    /// Run one `aws ec2` call and return its stdout.
    fn run(&self, op: &str, extra: &[&str]) -> Result<String, RemoteError> {
        let args = self.ec2_args(op, extra);
        debug!("aws {}", args.join(" "));

        let output = Command::new("aws").args(&args).output().map_err(|e| {
            RemoteError::other(format!("failed to launch the aws CLI: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify(op, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Map an `aws` CLI failure onto the error taxonomy. The executor treats
/// every kind the same; the kind only shapes the operator-facing message.
fn classify(op: &str, stderr: &str) -> RemoteError {
    let kind = if stderr.contains("RequestLimitExceeded") || stderr.contains("Throttling") {
        RemoteErrorKind::Throttling
    } else if stderr.contains("UnauthorizedOperation") || stderr.contains("AccessDenied") {
        RemoteErrorKind::Permission
    } else if stderr.contains("LimitExceeded") {
        RemoteErrorKind::Quota
    } else if stderr.contains("InvalidParameter") || stderr.contains("InvalidVpc") {
        RemoteErrorKind::InvalidRequest
    } else {
        RemoteErrorKind::Other
    };
    RemoteError::new(kind, format!("{op}: {stderr}"))
}

fn parse<T: for<'de> Deserialize<'de>>(op: &str, json: &str) -> Result<T, RemoteError> {
    serde_json::from_str(json)
        .map_err(|e| RemoteError::other(format!("{op}: unexpected response: {e}")))
}

#[derive(Debug, Deserialize)]
struct CreateVpcResponse {
    #[serde(rename = "Vpc")]
    vpc: VpcDescription,
}

#[derive(Debug, Deserialize)]
struct VpcDescription {
    #[serde(rename = "VpcId")]
    vpc_id: String,
}

#[derive(Deserialize)]
struct CreateGatewayResponse {
    #[serde(rename = "InternetGateway")]
    gateway: GatewayDescription,
}

#[derive(Deserialize)]
struct GatewayDescription {
    #[serde(rename = "InternetGatewayId")]
    gateway_id: String,
}

#[derive(Deserialize)]
struct CreateSubnetResponse {
    #[serde(rename = "Subnet")]
    subnet: SubnetDescription,
}

#[derive(Deserialize)]
struct SubnetDescription {
    #[serde(rename = "SubnetId")]
    subnet_id: String,
}

#[derive(Deserialize)]
struct CreateRouteTableResponse {
    #[serde(rename = "RouteTable")]
    table: RouteTableDescription,
}

#[derive(Deserialize)]
struct RouteTableDescription {
    #[serde(rename = "RouteTableId")]
    route_table_id: String,
}

impl CloudClient for AwsCliClient {
    fn create_vpc(&self, cidr: &Ipv4Cidr) -> Result<VpcId, RemoteError> {
        let cidr = cidr.to_string();
        let out = self.run("create-vpc", &["--cidr-block", &cidr])?;
        let resp: CreateVpcResponse = parse("create-vpc", &out)?;
        Ok(VpcId(resp.vpc.vpc_id))
    }

    fn await_vpc_available(&self, vpc: &VpcId, timeout: Duration) -> Result<(), RemoteError> {
        let args = self.wait_args(vpc);
        debug!("aws {}", args.join(" "));

        let mut child = Command::new("aws")
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RemoteError::other(format!("failed to launch the aws CLI: {e}")))?;

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if status.success() {
                        return Ok(());
                    }
                    let mut stderr = String::new();
                    if let Some(mut pipe) = child.stderr.take() {
                        let _ = pipe.read_to_string(&mut stderr);
                    }
                    return Err(classify("wait vpc-available", stderr.trim()));
                }
                Ok(None) => {
                    if started.elapsed() >= timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(RemoteError::timeout(format!(
                            "vpc {vpc} not available after {}s",
                            timeout.as_secs()
                        )));
                    }
                    thread::sleep(WAIT_POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(RemoteError::other(format!("wait vpc-available: {e}")));
                }
            }
        }
    }

    fn tag(&self, resource_id: &str, key: &str, value: &str) -> Result<(), RemoteError> {
        let tag = format!("Key={key},Value={value}");
        self.run("create-tags", &["--resources", resource_id, "--tags", &tag])?;
        Ok(())
    }

    fn create_internet_gateway(&self) -> Result<GatewayId, RemoteError> {
        let out = self.run("create-internet-gateway", &[])?;
        let resp: CreateGatewayResponse = parse("create-internet-gateway", &out)?;
        Ok(GatewayId(resp.gateway.gateway_id))
    }

    fn attach_gateway(&self, gateway: &GatewayId, vpc: &VpcId) -> Result<(), RemoteError> {
        self.run(
            "attach-internet-gateway",
            &["--internet-gateway-id", gateway.as_str(), "--vpc-id", vpc.as_str()],
        )?;
        Ok(())
    }

    fn create_subnet(
        &self,
        vpc: &VpcId,
        cidr: &Ipv4Cidr,
        availability_zone: &str,
    ) -> Result<SubnetId, RemoteError> {
        let cidr = cidr.to_string();
        let out = self.run(
            "create-subnet",
            &[
                "--vpc-id",
                vpc.as_str(),
                "--cidr-block",
                &cidr,
                "--availability-zone",
                availability_zone,
            ],
        )?;
        let resp: CreateSubnetResponse = parse("create-subnet", &out)?;
        Ok(SubnetId(resp.subnet.subnet_id))
    }

    fn create_route_table(&self, vpc: &VpcId) -> Result<RouteTableId, RemoteError> {
        let out = self.run("create-route-table", &["--vpc-id", vpc.as_str()])?;
        let resp: CreateRouteTableResponse = parse("create-route-table", &out)?;
        Ok(RouteTableId(resp.table.route_table_id))
    }

    fn associate_route_table(
        &self,
        table: &RouteTableId,
        subnet: &SubnetId,
    ) -> Result<(), RemoteError> {
        self.run(
            "associate-route-table",
            &["--route-table-id", table.as_str(), "--subnet-id", subnet.as_str()],
        )?;
        Ok(())
    }

    fn add_default_route(
        &self,
        table: &RouteTableId,
        gateway: &GatewayId,
    ) -> Result<(), RemoteError> {
        self.run(
            "create-route",
            &[
                "--route-table-id",
                table.as_str(),
                "--destination-cidr-block",
                "0.0.0.0/0",
                "--gateway-id",
                gateway.as_str(),
            ],
        )?;
        Ok(())
    }
}
