use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

pub const DEFAULT_LACP_PORT_PRIORITY: u32 = 32768;

#[skip_serializing_none]
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "interfaces.eda.nokia.com",
    version = "v1alpha1",
    kind = "Interface",
    namespaced,
    derive = "Default"
)]
pub struct InterfaceSpec {
    pub enabled: bool,
    pub description: Option<String>,
    /// `null` for untagged interfaces, `dot1q` otherwise
    pub encap_type: String,
    pub ethernet: Option<InterfaceEthernet>,
    pub lldp: bool,
    pub members: Vec<InterfaceMember>,
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceEthernet {
    pub storm_control: StormControl,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct StormControl {
    pub enabled: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceMember {
    pub enabled: bool,
    /// interface name in EDA notation, e.g. `ethernet-1-1`
    pub interface: String,
    pub lacp_port_priority: u32,
    /// TopoNode this member belongs to
    pub node: String,
}
