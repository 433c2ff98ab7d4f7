use std::fmt::Display;

use super::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    InterSwitch,
    Edge,
}

impl LinkRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkRole::InterSwitch => "interSwitch",
            LinkRole::Edge => "edge",
        }
    }
}

impl Display for LinkRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct LinkEndpoint {
    pub node: Node,
    pub interface: String,
}

impl LinkEndpoint {
    pub fn new(node: Node, interface: impl Into<String>) -> Self {
        Self {
            node,
            interface: interface.into(),
        }
    }

    pub fn eda_interface_name(&self) -> String {
        self.node.eda_interface_name(&self.interface)
    }

    pub fn interface_resource_name(&self) -> String {
        self.node.interface_resource_name(&self.interface)
    }
}

#[derive(Debug, Clone)]
pub struct Link {
    pub a: LinkEndpoint,
    pub z: LinkEndpoint,
}

impl Link {
    pub fn new(a: LinkEndpoint, z: LinkEndpoint) -> Self {
        Self { a, z }
    }

    /// Both ends are managed by EDA.
    pub fn is_topolink(&self) -> bool {
        self.a.node.is_eda_supported() && self.z.node.is_eda_supported()
    }

    /// One end is managed by EDA, the other one is a linux host.
    pub fn is_edge_link(&self) -> bool {
        (self.a.node.is_eda_supported() && self.z.node.is_linux())
            || (self.z.node.is_eda_supported() && self.a.node.is_linux())
    }

    pub fn role(&self) -> Option<LinkRole> {
        if self.is_topolink() {
            Some(LinkRole::InterSwitch)
        } else if self.is_edge_link() {
            Some(LinkRole::Edge)
        } else {
            None
        }
    }

    pub fn name(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.a.node.eda_name(),
            self.a.node.link_token(&self.a.interface),
            self.z.node.eda_name(),
            self.z.node.link_token(&self.z.interface)
        )
    }

    /// Each endpoint paired with its peer.
    pub fn sides(&self) -> [(&LinkEndpoint, &LinkEndpoint); 2] {
        [(&self.a, &self.z), (&self.z, &self.a)]
    }

    /// Local and remote ends, with the EDA managed end always local.
    pub fn oriented(&self) -> (&LinkEndpoint, &LinkEndpoint) {
        if self.a.node.is_eda_supported() {
            (&self.a, &self.z)
        } else {
            (&self.z, &self.a)
        }
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} <-> {}:{}",
            self.a.node.name, self.a.interface, self.z.node.name, self.z.interface
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srl(name: &str) -> Node {
        Node::new(name, "nokia_srlinux", "ixrd3l", Some("24.10.1"))
    }

    fn linux(name: &str) -> Node {
        Node::new(name, "linux", "", None)
    }

    #[test]
    fn links_between_managed_nodes_are_inter_switch() {
        let link = Link::new(
            LinkEndpoint::new(srl("leaf1"), "e1-1"),
            LinkEndpoint::new(srl("spine1"), "e1-1"),
        );

        assert!(link.is_topolink());
        assert!(!link.is_edge_link());
        assert_eq!(link.role(), Some(LinkRole::InterSwitch));
        assert_eq!(link.name(), "leaf1-e1-1-spine1-e1-1");
    }

    #[test]
    fn links_to_linux_hosts_are_edge_links() {
        let link = Link::new(
            LinkEndpoint::new(linux("client1"), "eth1"),
            LinkEndpoint::new(srl("leaf1"), "e1-10"),
        );

        assert!(!link.is_topolink());
        assert_eq!(link.role(), Some(LinkRole::Edge));

        let (local, remote) = link.oriented();
        assert_eq!(local.node.name, "leaf1");
        assert_eq!(remote.node.name, "client1");
    }

    #[test]
    fn links_to_other_kinds_have_no_role() {
        let link = Link::new(
            LinkEndpoint::new(srl("leaf1"), "e1-1"),
            LinkEndpoint::new(Node::new("br", "bridge", "", None), "eth1"),
        );

        assert_eq!(link.role(), None);
    }

    #[test]
    fn ceos_link_names_use_stable_tokens() {
        let ceos = Node::new("ceos1", "arista_ceos", "ceos", Some("4.33.2f"));
        let link = Link::new(
            LinkEndpoint::new(ceos, "eth1"),
            LinkEndpoint::new(srl("leaf1"), "e1-1"),
        );

        assert_eq!(link.name(), "ceos1-eth1_1-leaf1-e1-1");
    }
}
