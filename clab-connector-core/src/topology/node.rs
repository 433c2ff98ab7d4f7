use std::fmt::Display;

use crate::helpers::normalize_name;

use super::kinds::{profile_for_kind, KindProfile};

pub const LINUX_KIND: &str = "linux";

#[derive(Debug, Clone)]
pub struct Node {
    /// name as written in the containerlab topology
    pub name: String,
    /// containerlab kind, e.g. `nokia_srlinux`
    pub kind: String,
    pub node_type: String,
    /// software version, normalized for the node's kind
    pub version: Option<String>,
    pub mgmt_ipv4: Option<String>,
    pub mgmt_ipv4_prefix_length: Option<u8>,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        node_type: &str,
        version: Option<&str>,
    ) -> Self {
        let kind = kind.into();
        let profile = profile_for_kind(&kind);
        let node_type = match (node_type.is_empty(), profile) {
            (true, Some(profile)) => profile.default_node_type().to_owned(),
            _ => node_type.to_owned(),
        };
        let version = match profile {
            Some(profile) => version.map(|v| profile.normalize_version(v)),
            None => version.map(ToOwned::to_owned),
        };

        Node {
            name: name.into(),
            kind,
            node_type,
            version,
            mgmt_ipv4: None,
            mgmt_ipv4_prefix_length: None,
        }
    }

    pub fn with_mgmt(mut self, ipv4: Option<String>, prefix_length: Option<u8>) -> Self {
        self.mgmt_ipv4 = ipv4;
        self.mgmt_ipv4_prefix_length = prefix_length;

        self
    }

    pub fn profile(&self) -> Option<&'static dyn KindProfile> {
        profile_for_kind(&self.kind)
    }

    pub fn is_eda_supported(&self) -> bool {
        self.profile().is_some()
    }

    pub fn is_linux(&self) -> bool {
        self.kind == LINUX_KIND
    }

    /// Name of the TopoNode representing this node.
    pub fn eda_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn eda_interface_name(&self, ifname: &str) -> String {
        match self.profile() {
            Some(profile) => profile.interface_name(ifname),
            None => ifname.to_owned(),
        }
    }

    pub fn interface_resource_name(&self, ifname: &str) -> String {
        let node_name = self.eda_name();

        match self.profile() {
            Some(profile) => profile.interface_resource_name(&node_name, ifname),
            None => format!("{node_name}-{ifname}"),
        }
    }

    pub fn link_token(&self, ifname: &str) -> String {
        match self.profile() {
            Some(profile) => profile.link_token(ifname),
            None => ifname.to_owned(),
        }
    }

    pub fn role(&self) -> &'static str {
        match self.profile() {
            Some(profile) => profile.role(&self.name),
            None => super::kinds::role_from_name(&self.name),
        }
    }

    /// Production address as EDA expects it for this kind.
    pub fn management_address(&self) -> Option<String> {
        let ipv4 = self.mgmt_ipv4.as_deref()?;

        Some(match self.profile() {
            Some(profile) => profile.management_address(ipv4, self.mgmt_ipv4_prefix_length),
            None => ipv4.to_owned(),
        })
    }

    /// NodeProfile name within the given topology, `None` for unsupported
    /// kinds or nodes without a version.
    pub fn profile_name(&self, topology_name: &str) -> Option<String> {
        let profile = self.profile()?;
        let version = self.version.as_deref()?;

        Some(profile.profile_name(topology_name, version))
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}", self.name, self.kind)?;
        if let Some(version) = &self.version {
            write!(f, " {version}")?;
        }
        if let Some(ip) = &self.mgmt_ipv4 {
            write!(f, ", {ip}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sros_versions_are_normalized() {
        let node = Node::new("pe1", "nokia_sros", "sr-1", Some("25.3.R2"));

        assert_eq!(node.version.as_deref(), Some("25.3.r2"));
        assert_eq!(node.profile_name("lab").as_deref(), Some("lab-sros-25.3.r2"));
        assert_eq!(node.role(), "dcgw");
    }

    #[test]
    fn empty_type_falls_back_to_kind_default() {
        let node = Node::new("leaf1", "nokia_srlinux", "", Some("24.10.1"));
        assert_eq!(node.node_type, "ixrd3l");

        let node = Node::new("client1", "linux", "", None);
        assert_eq!(node.node_type, "");
        assert!(!node.is_eda_supported());
    }

    #[test]
    fn eda_names_are_normalized() {
        let node = Node::new("Leaf_1", "nokia_srlinux", "ixrd3l", Some("24.10.1"));

        assert_eq!(node.eda_name(), "leaf-1");
        assert_eq!(node.interface_resource_name("e1-1"), "leaf-1-ethernet-1-1");
    }

    #[test]
    fn ceos_management_address_includes_prefix() {
        let node = Node::new("ceos1", "arista_ceos", "ceos", Some("4.33.2F"))
            .with_mgmt(Some("172.20.20.4".into()), Some(24));

        assert_eq!(node.management_address().as_deref(), Some("172.20.20.4/24"));
    }
}
