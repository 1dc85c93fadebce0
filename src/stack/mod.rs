// Copyright (c) 2025 - Cowboy AI, Inc.
//! VPC + EC2 Stack Builder
//!
//! Assembles the resource graph for one environment:
//!
//! ```text
//! network ──> security ──> endpoints ──> identity ──> compute ──> outputs
//! ```
//!
//! [`build`] is a pure function of its inputs. It performs no validation of
//! CIDR blocks or zones; the provisioning engine rejects those at validation
//! time. Use [`crate::invariants::preflight_config`] to lint a configuration
//! before handing it over.

pub mod user_data;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::{DeploymentTarget, EnvironmentConfig, ResolvedConfig};
use crate::domain::{PolicyDocument, PolicyStatement, Port, Principal, ResourceType, TagSet};
use crate::errors::StackResult;
use crate::graph::intrinsic::{self, base64, concat, get_att, pseudo, reference, Pseudo};
use crate::graph::{LogicalId, Output, Parameter, ResourceGraph, ResourceNode};

pub use user_data::{ssm_agent_bootstrap, BootstrapScript};

/// Service principal allowed to assume the instance role
pub const EC2_SERVICE_PRINCIPAL: &str = "ec2.amazonaws.com";

/// Managed policy bundle for remote session management
pub const SSM_MANAGED_POLICY: &str = "AmazonSSMManagedInstanceCore";

/// Engine type for the base image parameter
pub const IMAGE_PARAMETER_TYPE: &str = "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>";

/// Session-management actions granted on the SSM endpoint policy
///
/// Granted to any principal on any resource. Preserved as declared; see
/// [`crate::invariants::open_principal_grants`].
pub const SSM_ENDPOINT_ACTIONS: [&str; 16] = [
    "ssm:UpdateInstanceInformation",
    "ssm:SendCommand",
    "ssm:ListCommandInvocations",
    "ssm:DescribeInstanceInformation",
    "ssm:GetDeployablePatchSnapshotForInstance",
    "ssm:GetDefaultPatchBaseline",
    "ssm:GetManifest",
    "ssm:GetParameter",
    "ssm:GetParameters",
    "ssm:ListAssociations",
    "ssm:ListInstanceAssociations",
    "ssm:PutInventory",
    "ssm:PutComplianceItems",
    "ssm:PutConfigurePackageResult",
    "ssm:UpdateAssociationStatus",
    "ssm:UpdateInstanceAssociationStatus",
];

/// Construct paths of the nodes this builder declares
pub mod paths {
    pub const VPC: &str = "VPC";
    pub const PRIVATE_SUBNET: &str = "VPC/PrivateSubnet1/Subnet";
    pub const PRIVATE_ROUTE_TABLE: &str = "VPC/PrivateSubnet1/RouteTable";
    pub const PRIVATE_ROUTE_TABLE_ASSOCIATION: &str = "VPC/PrivateSubnet1/RouteTableAssociation";
    pub const ENDPOINT_SECURITY_GROUP: &str = "VPCEndpointSecurityGroup";
    pub const INSTANCE_SECURITY_GROUP: &str = "InstanceSecurityGroup";
    pub const ENDPOINT_INGRESS: &str = "VPCEndpointSecurityGroup/fromInstanceSecurityGroup:443";
    pub const INSTANCE_EGRESS: &str = "InstanceSecurityGroup/toVPCEndpointSecurityGroup:443";
    pub const SSM_ENDPOINT: &str = "SSMVPCEndpoint";
    pub const SSM_MESSAGES_ENDPOINT: &str = "SSMMessagesVPCEndpoint";
    pub const EC2_MESSAGES_ENDPOINT: &str = "EC2MessagesVPCEndpoint";
    pub const ROLE: &str = "EC2Role";
    pub const INSTANCE_PROFILE: &str = "Instance/InstanceProfile";
    pub const INSTANCE: &str = "Instance";
}

/// One private-connectivity endpoint
struct InterfaceEndpoint {
    path: &'static str,
    service: &'static str,
    output: &'static str,
    description: &'static str,
}

static ENDPOINTS: [InterfaceEndpoint; 3] = [
    InterfaceEndpoint {
        path: paths::SSM_ENDPOINT,
        service: "ssm",
        output: "SSMVPCEndpointId",
        description: "SSM VPC endpoint ID",
    },
    InterfaceEndpoint {
        path: paths::SSM_MESSAGES_ENDPOINT,
        service: "ssmmessages",
        output: "SSMMessagesVPCEndpointId",
        description: "SSM Messages VPC endpoint ID",
    },
    InterfaceEndpoint {
        path: paths::EC2_MESSAGES_ENDPOINT,
        service: "ec2messages",
        output: "EC2MessagesVPCEndpointId",
        description: "EC2 Messages VPC endpoint ID",
    },
];

/// Naming scope shared by every id in one stack
struct Scope {
    root: String,
}

impl Scope {
    fn new(stack_name: &str, resolved: &ResolvedConfig) -> Self {
        Self {
            root: format!("{}@{}", stack_name, resolved.vpc_cidr),
        }
    }

    fn id(&self, path: &str) -> LogicalId {
        LogicalId::for_path(&self.root, path)
    }
}

/// Placeholder egress rule that blocks all outbound traffic on a group
/// created without default egress.
fn deny_all_egress() -> Value {
    json!([{
        "CidrIp": "255.255.255.255/32",
        "Description": "Disallow all traffic",
        "FromPort": 252,
        "IpProtocol": "icmp",
        "ToPort": 86
    }])
}

fn security_group(
    scope: &Scope,
    path: &str,
    description: &str,
    vpc: &LogicalId,
    tags: &TagSet,
) -> ResourceNode {
    ResourceNode::new(scope.id(path), path, ResourceType::SecurityGroup)
        .with_attribute("GroupDescription", description)
        .with_attribute("SecurityGroupEgress", deny_all_egress())
        .with_attribute("VpcId", reference(vpc))
        .with_tags(tags)
}

/// Public parameter path of the latest Amazon Linux 2 image for an architecture
pub fn amazon_linux_2_parameter_path(architecture: &str) -> String {
    format!(
        "/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-{}-gp2",
        architecture
    )
}

/// Build the resource graph for one environment stack
///
/// # Arguments
/// * `stack_name` - Stack name, used for export names and the bootstrap log
/// * `target` - Deployment account/region (region may be left to the engine)
/// * `config` - Environment configuration; unset fields take defaults
pub fn build(
    stack_name: &str,
    target: &DeploymentTarget,
    config: &EnvironmentConfig,
) -> StackResult<ResourceGraph> {
    // 1. Defaults
    let resolved = config.resolve();
    let project = resolved.project_tag.as_str();
    let region = target.region.as_deref();
    let scope = Scope::new(stack_name, &resolved);
    let common = TagSet::common(&resolved.tags, project, &resolved.environment_tag);

    let mut graph = ResourceGraph::new(stack_name).with_description(format!(
        "VPC with isolated subnet, SSM interface endpoints and EC2 instance ({} / {})",
        project, resolved.environment_tag
    ));

    // 2-3. Network: one isolated subnet in one zone
    let vpc = graph.add_node(
        ResourceNode::new(scope.id(paths::VPC), paths::VPC, ResourceType::Vpc)
            .with_attribute("CidrBlock", resolved.vpc_cidr.as_str())
            .with_attribute("EnableDnsHostnames", true)
            .with_attribute("EnableDnsSupport", true)
            .with_attribute("InstanceTenancy", "default")
            .with_tags(&common.named(format!("{}-vpc", project))),
    )?;

    let private_name = format!("{}-private", project);
    let subnet = graph.add_node(
        ResourceNode::new(
            scope.id(paths::PRIVATE_SUBNET),
            paths::PRIVATE_SUBNET,
            ResourceType::Subnet,
        )
        .with_attribute("AvailabilityZone", resolved.availability_zone.as_str())
        .with_attribute("CidrBlock", resolved.private_subnet_cidr.as_str())
        .with_attribute("MapPublicIpOnLaunch", false)
        .with_attribute("VpcId", reference(&vpc))
        .with_tags(&common.named(private_name.as_str())),
    )?;

    let route_table = graph.add_node(
        ResourceNode::new(
            scope.id(paths::PRIVATE_ROUTE_TABLE),
            paths::PRIVATE_ROUTE_TABLE,
            ResourceType::RouteTable,
        )
        .with_attribute("VpcId", reference(&vpc))
        .with_tags(&common.named(private_name.as_str())),
    )?;

    graph.add_node(
        ResourceNode::new(
            scope.id(paths::PRIVATE_ROUTE_TABLE_ASSOCIATION),
            paths::PRIVATE_ROUTE_TABLE_ASSOCIATION,
            ResourceType::SubnetRouteTableAssociation,
        )
        .with_attribute("RouteTableId", reference(&route_table))
        .with_attribute("SubnetId", reference(&subnet)),
    )?;

    // 4. Security boundaries and the HTTPS rule pair
    let endpoint_sg = graph.add_node(security_group(
        &scope,
        paths::ENDPOINT_SECURITY_GROUP,
        "Security group for VPC endpoints",
        &vpc,
        &common.named(format!("{}-vpc-endpoint-sg", project)),
    ))?;

    let instance_sg = graph.add_node(security_group(
        &scope,
        paths::INSTANCE_SECURITY_GROUP,
        &format!("Security group for {} EC2 instance", project),
        &vpc,
        &common.named(format!("{}-instance-sg", project)),
    ))?;

    let port = Port::HTTPS;
    graph.add_node(
        ResourceNode::new(
            scope.id(paths::ENDPOINT_INGRESS),
            paths::ENDPOINT_INGRESS,
            ResourceType::SecurityGroupIngress,
        )
        .with_attribute("Description", "HTTPS from EC2 instances")
        .with_attribute("FromPort", port.number)
        .with_attribute("GroupId", get_att(&endpoint_sg, "GroupId"))
        .with_attribute("IpProtocol", port.protocol.as_str())
        .with_attribute("SourceSecurityGroupId", get_att(&instance_sg, "GroupId"))
        .with_attribute("ToPort", port.number),
    )?;

    graph.add_node(
        ResourceNode::new(
            scope.id(paths::INSTANCE_EGRESS),
            paths::INSTANCE_EGRESS,
            ResourceType::SecurityGroupEgress,
        )
        .with_attribute("Description", "HTTPS to VPC endpoints")
        .with_attribute("DestinationSecurityGroupId", get_att(&endpoint_sg, "GroupId"))
        .with_attribute("FromPort", port.number)
        .with_attribute("GroupId", get_att(&instance_sg, "GroupId"))
        .with_attribute("IpProtocol", port.protocol.as_str())
        .with_attribute("ToPort", port.number),
    )?;

    // 5. Private connectivity endpoints
    let mut endpoints = Vec::with_capacity(ENDPOINTS.len());
    for (index, endpoint) in ENDPOINTS.iter().enumerate() {
        let mut node = ResourceNode::new(scope.id(endpoint.path), endpoint.path, ResourceType::VpcEndpoint)
            .with_attribute("PrivateDnsEnabled", true)
            .with_attribute("SecurityGroupIds", json!([get_att(&endpoint_sg, "GroupId")]))
            .with_attribute(
                "ServiceName",
                concat(vec![
                    json!("com.amazonaws."),
                    intrinsic::region(region),
                    json!(format!(".{}", endpoint.service)),
                ]),
            )
            .with_attribute("SubnetIds", json!([reference(&subnet)]))
            .with_attribute("VpcEndpointType", "Interface")
            .with_attribute("VpcId", reference(&vpc))
            .with_tags(&common.named(format!("{}-{}-endpoint", project, endpoint.service)));

        if index == 0 {
            let policy = PolicyDocument::new(vec![PolicyStatement::allow(
                Principal::Any,
                &SSM_ENDPOINT_ACTIONS,
            )
            .on_resources(&["*"])]);
            if policy.open_statements().next().is_some() {
                warn!(
                    stack = stack_name,
                    endpoint = endpoint.path,
                    actions = SSM_ENDPOINT_ACTIONS.len(),
                    "Endpoint policy grants session-management actions to any principal"
                );
            }
            node = node.with_attribute("PolicyDocument", serde_json::to_value(&policy)?);
        }

        endpoints.push((graph.add_node(node)?, endpoint));
    }

    // 6. Identity
    let role = graph.add_node(
        ResourceNode::new(scope.id(paths::ROLE), paths::ROLE, ResourceType::IamRole)
            .with_attribute(
                "AssumeRolePolicyDocument",
                serde_json::to_value(PolicyDocument::assume_role(EC2_SERVICE_PRINCIPAL))?,
            )
            .with_attribute(
                "ManagedPolicyArns",
                json!([concat(vec![
                    json!("arn:"),
                    pseudo(Pseudo::Partition),
                    json!(format!(":iam::aws:policy/{}", SSM_MANAGED_POLICY)),
                ])]),
            )
            .with_attribute(
                "RoleName",
                concat(vec![
                    json!(format!("{}-ec2-ssm-role-", project)),
                    intrinsic::region(region),
                ]),
            )
            .with_tags(&common.named(format!("{}-ec2-role", project)))
            // Roles reference nothing in the network; keep them ordered after it.
            .with_dependency(&vpc),
    )?;

    let profile = graph.add_node(
        ResourceNode::new(
            scope.id(paths::INSTANCE_PROFILE),
            paths::INSTANCE_PROFILE,
            ResourceType::InstanceProfile,
        )
        .with_attribute("Roles", json!([reference(&role)])),
    )?;

    // 7. Bootstrap script
    let script = ssm_agent_bootstrap(stack_name, project, &resolved.environment_tag);

    // 8. Compute
    let image_path = amazon_linux_2_parameter_path(resolved.instance_type.architecture().as_str());
    let image = graph.add_parameter(Parameter {
        logical_id: scope.id(&format!("BaseImage{}", image_path)),
        parameter_type: IMAGE_PARAMETER_TYPE.to_string(),
        default: Some(image_path),
        description: Some("Latest Amazon Linux 2 image id".to_string()),
    })?;

    let instance = graph.add_node(
        ResourceNode::new(scope.id(paths::INSTANCE), paths::INSTANCE, ResourceType::Instance)
            .with_attribute("AvailabilityZone", resolved.availability_zone.as_str())
            .with_attribute("IamInstanceProfile", reference(&profile))
            .with_attribute("ImageId", reference(&image))
            .with_attribute("InstanceType", resolved.instance_type.to_string())
            .with_attribute("SecurityGroupIds", json!([get_att(&instance_sg, "GroupId")]))
            .with_attribute("SubnetId", reference(&subnet))
            .with_attribute("UserData", base64(Value::String(script.render())))
            .with_tags(&common.named(format!("{}-instance", project)))
            .with_dependency(&role),
    )?;

    // 10. Outputs
    let exported = [
        ("VpcId", "VPC ID", reference(&vpc)),
        ("PrivateSubnetId", "Private subnet ID", reference(&subnet)),
        ("InstanceId", "EC2 instance ID", reference(&instance)),
        (
            "InstanceSecurityGroupId",
            "EC2 instance security group ID",
            get_att(&instance_sg, "GroupId"),
        ),
        (
            "VPCEndpointSecurityGroupId",
            "VPC endpoint security group ID",
            get_att(&endpoint_sg, "GroupId"),
        ),
    ];
    for (name, description, value) in exported {
        graph.add_output(Output::new(name, description, value).exported_from(stack_name))?;
    }

    for (id, endpoint) in &endpoints {
        graph.add_output(
            Output::new(endpoint.output, endpoint.description, reference(id)).exported_from(stack_name),
        )?;
    }

    graph.add_output(
        Output::new("IAMRoleArn", "ARN of the EC2 IAM role", get_att(&role, "Arn"))
            .exported_from(stack_name),
    )?;

    graph.add_output(Output::new(
        "SSMSessionManagerCommand",
        "Session Manager connect command",
        concat(vec![
            json!("aws ssm start-session --target "),
            reference(&instance),
        ]),
    ))?;

    graph.add_output(
        Output::new("ProjectTag", "Project name", json!(project)).exported_from(stack_name),
    )?;
    graph.add_output(
        Output::new(
            "EnvironmentTag",
            "Environment name",
            json!(resolved.environment_tag),
        )
        .exported_from(stack_name),
    )?;

    info!(
        stack = stack_name,
        project,
        environment = %resolved.environment_tag,
        nodes = graph.nodes().len(),
        outputs = graph.outputs().len(),
        "Built stack resource graph"
    );

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_with_defaults() {
        let graph = build("Stack", &DeploymentTarget::default(), &EnvironmentConfig::new()).unwrap();
        assert_eq!(graph.stack_name(), "Stack");
        assert_eq!(graph.nodes().len(), 14);
        assert_eq!(graph.parameters().len(), 1);
        assert_eq!(graph.outputs().len(), 12);
    }

    #[test]
    fn test_region_left_to_engine() {
        let graph = build("Stack", &DeploymentTarget::default(), &EnvironmentConfig::new()).unwrap();
        let role = graph.node_by_path(paths::ROLE).unwrap();
        assert_eq!(
            role.attribute("RoleName").unwrap(),
            &json!({ "Fn::Join": ["", ["demo-ec2-ssm-role-", { "Ref": "AWS::Region" }]] })
        );
    }

    #[test]
    fn test_arm_instance_uses_arm_image() {
        let config = EnvironmentConfig::new().with_instance_type("t4g.small".parse().unwrap());
        let graph = build("Stack", &DeploymentTarget::default(), &config).unwrap();
        assert_eq!(
            graph.parameters()[0].default.as_deref(),
            Some("/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-arm64-gp2")
        );
    }
}
