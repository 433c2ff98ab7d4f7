use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Managed node in an EDA topology.
///
/// Every nested field is optional so that TopoNodes created by other tools
/// (or by older EDA releases) can still be read back during export.
#[skip_serializing_none]
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "core.eda.nokia.com",
    version = "v1",
    kind = "TopoNode",
    namespaced,
    status = "TopoNodeStatus",
    derive = "Default"
)]
pub struct TopoNodeSpec {
    pub node_profile: Option<String>,
    pub operating_system: Option<String>,
    pub platform: Option<String>,
    pub version: Option<String>,
    pub production_address: Option<ProductionAddress>,
    pub component: Option<Vec<TopoNodeComponent>>,
    pub state: Option<String>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct ProductionAddress {
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
}

/// Hardware component (line card, MDA, connector) of a chassis based node.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct TopoNodeComponent {
    pub kind: String,
    pub slot: String,
    #[serde(rename = "type")]
    pub type_: String,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopoNodeStatus {
    #[serde(rename = "node-state")]
    pub node_state: Option<String>,
    #[serde(rename = "npp-state")]
    pub npp_state: Option<String>,
    #[serde(rename = "node-details")]
    pub node_details: Option<String>,
    #[serde(rename = "npp-details")]
    pub npp_details: Option<String>,
    pub operating_system: Option<String>,
    pub version: Option<String>,
    pub production_address: Option<ProductionAddress>,
}

/// Link (or set of links) between TopoNodes, or towards an external endpoint.
#[skip_serializing_none]
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "core.eda.nokia.com",
    version = "v1",
    kind = "TopoLink",
    namespaced,
    derive = "Default"
)]
pub struct TopoLinkSpec {
    pub links: Option<Vec<TopoLinkEntry>>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct TopoLinkEntry {
    pub local: Option<TopoLinkEndpoint>,
    pub remote: Option<TopoLinkEndpoint>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopoLinkEndpoint {
    pub node: Option<String>,
    pub interface: Option<String>,
    pub interface_resource: Option<String>,
}

/// Onboarding and management parameters shared by nodes of one OS and version.
#[skip_serializing_none]
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "core.eda.nokia.com",
    version = "v1",
    kind = "NodeProfile",
    namespaced,
    derive = "Default"
)]
pub struct NodeProfileSpec {
    /// gNMI port used for management
    pub port: u16,
    pub annotate: bool,
    pub operating_system: String,
    pub version: String,
    pub version_path: Option<String>,
    pub version_match: Option<String>,
    /// URL of the schema profile served by the artifact server
    pub yang: String,
    pub node_user: String,
    pub onboarding_password: String,
    pub onboarding_username: String,
    pub images: Option<Vec<NodeImage>>,
    pub license: Option<String>,
    pub llm_db: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeImage {
    pub image: String,
    pub image_md5: String,
}

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "core.eda.nokia.com",
    version = "v1",
    kind = "NodeUser",
    namespaced,
    derive = "Default"
)]
pub struct NodeUserSpec {
    pub username: String,
    pub password: String,
    pub group_bindings: Vec<GroupBinding>,
    pub ssh_public_keys: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupBinding {
    pub groups: Vec<String>,
    pub node_selector: Vec<String>,
}

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "core.eda.nokia.com",
    version = "v1",
    kind = "NodeSecurityProfile",
    namespaced,
    derive = "Default"
)]
pub struct NodeSecurityProfileSpec {
    pub node_selector: Vec<String>,
    pub tls: NodeTls,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeTls {
    pub csr_params: CsrParams,
    pub issuer_ref: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CsrParams {
    pub certificate_validity: String,
    pub city: String,
    pub country: String,
    pub csr_suite: String,
    pub org: String,
    pub org_unit: String,
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toponode_with_foreign_status_deserializes() {
        let value = serde_json::json!({
            "apiVersion": "core.eda.nokia.com/v1",
            "kind": "TopoNode",
            "metadata": { "name": "leaf1", "namespace": "clab-lab" },
            "spec": { "operatingSystem": "srl", "unknownField": 1 },
            "status": { "node-state": "Synced", "node-details": "10.0.0.1:57410" }
        });

        let node: TopoNode = serde_json::from_value(value).unwrap();
        let status = node.status.unwrap();

        assert_eq!(node.spec.operating_system.as_deref(), Some("srl"));
        assert!(node.spec.production_address.is_none());
        assert_eq!(status.node_state.as_deref(), Some("Synced"));
        assert_eq!(status.node_details.as_deref(), Some("10.0.0.1:57410"));
    }

    #[test]
    fn topolink_skips_absent_remote() {
        let link = TopoLinkSpec {
            links: Some(vec![TopoLinkEntry {
                local: Some(TopoLinkEndpoint {
                    node: Some("leaf1".into()),
                    interface: Some("ethernet-1-1".into()),
                    interface_resource: Some("leaf1-ethernet-1-1".into()),
                }),
                remote: None,
                type_: Some("edge".into()),
            }]),
        };

        let value = serde_json::to_value(link).unwrap();
        let entry = &value["links"][0];

        assert!(entry.get("remote").is_none());
        assert_eq!(entry["local"]["interfaceResource"], "leaf1-ethernet-1-1");
        assert_eq!(entry["type"], "edge");
    }
}
