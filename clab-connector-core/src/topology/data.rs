//! Raw shape of the `topology-data.json` file written by containerlab.

use std::collections::BTreeMap;

use serde::Deserialize;

pub const NODE_TYPE_LABEL: &str = "clab-node-type";
pub const TOPOLOGY_FILE_LABEL: &str = "clab-topo-file";
pub const DEFAULT_NODE_TYPE: &str = "ixrd2";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct TopologyData {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub clab: ClabSection,
    #[serde(default, rename = "ssh-pub-keys")]
    pub ssh_pub_keys: Vec<String>,
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeData>,
    #[serde(default)]
    pub links: Vec<LinkData>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ClabSection {
    #[serde(default)]
    pub config: ClabConfig,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ClabConfig {
    #[serde(default)]
    pub mgmt: MgmtConfig,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct MgmtConfig {
    #[serde(rename = "ipv4-subnet")]
    pub ipv4_subnet: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NodeData {
    pub kind: String,
    pub image: Option<String>,
    #[serde(rename = "mgmt-ipv4-address")]
    pub mgmt_ipv4_address: Option<String>,
    #[serde(rename = "mgmt-ipv4-prefix-length")]
    pub mgmt_ipv4_prefix_length: Option<u8>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl NodeData {
    /// Image tag after the last `:`, if any.
    pub fn image_version(&self) -> Option<&str> {
        self.image
            .as_deref()
            .and_then(|image| image.rsplit_once(':'))
            .map(|(_, tag)| tag)
            .filter(|tag| !tag.is_empty())
    }

    pub fn node_type(&self) -> &str {
        self.labels
            .get(NODE_TYPE_LABEL)
            .map(String::as_str)
            .unwrap_or(DEFAULT_NODE_TYPE)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LinkData {
    pub a: EndpointData,
    pub z: EndpointData,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct EndpointData {
    pub node: String,
    pub interface: String,
}
