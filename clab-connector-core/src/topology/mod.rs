//! In-memory model of a deployed containerlab topology.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use thiserror::Error;

use crate::{get_topology_namespace, helpers::normalize_name};

use self::{
    data::{TopologyData, TOPOLOGY_FILE_LABEL},
    link::{Link, LinkEndpoint},
    node::Node,
};

pub mod data;
pub mod kinds;
pub mod link;
pub mod node;

const CLAB_TOPOLOGY_TYPE: &str = "clab";

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Topology file '{}' does not exist!", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read topology file '{}'!", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("File '{}' is not valid topology JSON!", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Not a valid containerlab topology file (missing 'type=clab')!")]
    NotContainerlab,
    #[error("Node {0} is missing a version!")]
    MissingVersion(String),
}

#[derive(Debug, Clone)]
pub struct Topology {
    /// EDA safe topology name
    pub name: String,
    pub mgmt_ipv4_subnet: Option<String>,
    pub ssh_pub_keys: Vec<String>,
    /// every node of the lab, EDA managed or not
    pub nodes: Vec<Node>,
    /// links with at least one EDA managed end
    pub links: Vec<Link>,
    pub clab_file_path: String,
}

impl Topology {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        let path = path.as_ref();
        info!("Parsing topology file '{}'", path.display());

        if !path.is_file() {
            return Err(TopologyError::NotFound(path.to_owned()));
        }

        let contents = fs::read_to_string(path).map_err(|source| TopologyError::Read {
            path: path.to_owned(),
            source,
        })?;
        let data: TopologyData =
            serde_json::from_str(&contents).map_err(|source| TopologyError::InvalidJson {
                path: path.to_owned(),
                source,
            })?;

        Self::from_data(data)
    }

    pub fn from_data(data: TopologyData) -> Result<Self, TopologyError> {
        if data.type_.as_deref() != Some(CLAB_TOPOLOGY_TYPE) {
            return Err(TopologyError::NotContainerlab);
        }

        let clab_file_path = data
            .nodes
            .values()
            .find_map(|node| node.labels.get(TOPOLOGY_FILE_LABEL))
            .cloned()
            .unwrap_or_default();

        let mut nodes_by_name = BTreeMap::new();
        for (name, node_data) in &data.nodes {
            let node = Node::new(
                name,
                &node_data.kind,
                node_data.node_type(),
                node_data.image_version(),
            )
            .with_mgmt(
                node_data.mgmt_ipv4_address.clone(),
                node_data.mgmt_ipv4_prefix_length,
            );

            if node.is_eda_supported() && node.version.is_none() {
                return Err(TopologyError::MissingVersion(name.to_owned()));
            }

            nodes_by_name.insert(name.as_str(), node);
        }

        let links = data
            .links
            .iter()
            .filter_map(|link| {
                let a = nodes_by_name.get(link.a.node.as_str())?;
                let z = nodes_by_name.get(link.z.node.as_str())?;

                if !a.is_eda_supported() && !z.is_eda_supported() {
                    return None;
                }

                Some(Link::new(
                    LinkEndpoint::new(a.clone(), &link.a.interface),
                    LinkEndpoint::new(z.clone(), &link.z.interface),
                ))
            })
            .collect::<Vec<_>>();

        let name = normalize_name(&data.name);
        if name != data.name {
            debug!("Renamed topology '{}' -> '{name}' for EDA safety", data.name);
        }

        Ok(Topology {
            name,
            mgmt_ipv4_subnet: data.clab.config.mgmt.ipv4_subnet,
            ssh_pub_keys: data.ssh_pub_keys,
            nodes: nodes_by_name.into_values().collect(),
            links,
            clab_file_path,
        })
    }

    /// Namespace holding the topology's resources.
    pub fn namespace(&self) -> String {
        get_topology_namespace(&self.name)
    }

    pub fn eda_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_eda_supported())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use super::*;

    pub(crate) const SAMPLE_TOPOLOGY: &str = r#"{
        "name": "My_Lab",
        "type": "clab",
        "clab": { "config": { "mgmt": { "ipv4-subnet": "172.20.20.0/24" } } },
        "ssh-pub-keys": ["ssh-ed25519 AAAA test@host"],
        "nodes": {
            "leaf1": {
                "kind": "nokia_srlinux",
                "image": "ghcr.io/nokia/srlinux:24.10.1",
                "mgmt-ipv4-address": "172.20.20.2",
                "mgmt-ipv4-prefix-length": 24,
                "labels": { "clab-node-type": "ixrd3l", "clab-topo-file": "/lab/my.clab.yml" }
            },
            "spine1": {
                "kind": "nokia_srlinux",
                "image": "ghcr.io/nokia/srlinux:24.10.1",
                "mgmt-ipv4-address": "172.20.20.3",
                "mgmt-ipv4-prefix-length": 24,
                "labels": { "clab-node-type": "ixrd3l", "clab-topo-file": "/lab/my.clab.yml" }
            },
            "pe1": {
                "kind": "nokia_sros",
                "image": "vr-sros:25.3.R2",
                "mgmt-ipv4-address": "172.20.20.4",
                "labels": { "clab-node-type": "sr-1", "clab-topo-file": "/lab/my.clab.yml" }
            },
            "client1": {
                "kind": "linux",
                "image": "alpine",
                "mgmt-ipv4-address": "172.20.20.10",
                "labels": { "clab-topo-file": "/lab/my.clab.yml" }
            },
            "client2": {
                "kind": "linux",
                "image": "alpine",
                "labels": {}
            }
        },
        "links": [
            { "a": { "node": "leaf1", "interface": "e1-49" }, "z": { "node": "spine1", "interface": "e1-1" } },
            { "a": { "node": "spine1", "interface": "e1-2" }, "z": { "node": "pe1", "interface": "1/1/1" } },
            { "a": { "node": "client1", "interface": "eth1" }, "z": { "node": "leaf1", "interface": "e1-1" } },
            { "a": { "node": "client1", "interface": "eth2" }, "z": { "node": "client2", "interface": "eth1" } },
            { "a": { "node": "leaf1", "interface": "e1-2" }, "z": { "node": "ghost", "interface": "eth1" } }
        ]
    }"#;

    pub(crate) fn sample_topology() -> Topology {
        let data = serde_json::from_str(SAMPLE_TOPOLOGY).unwrap();
        Topology::from_data(data).unwrap()
    }

    #[test]
    fn parses_sample_topology() {
        let topology = sample_topology();

        assert_eq!(topology.name, "my-lab");
        assert_eq!(topology.namespace(), "clab-my-lab");
        assert_eq!(topology.mgmt_ipv4_subnet.as_deref(), Some("172.20.20.0/24"));
        assert_eq!(topology.clab_file_path, "/lab/my.clab.yml");
        assert_eq!(topology.ssh_pub_keys.len(), 1);
        assert_eq!(topology.nodes.len(), 5);
        assert_eq!(topology.eda_nodes().count(), 3);
    }

    #[test]
    fn keeps_only_links_touching_managed_nodes() {
        let topology = sample_topology();
        let names = topology.links.iter().map(Link::name).collect::<Vec<_>>();

        assert_eq!(
            names,
            vec![
                "leaf1-e1-49-spine1-e1-1",
                "spine1-e1-2-pe1-1/1/1",
                "client1-eth1-leaf1-e1-1",
            ]
        );
    }

    #[test]
    fn rejects_non_containerlab_data() {
        let data = TopologyData {
            name: "lab".into(),
            type_: Some("other".into()),
            ..Default::default()
        };

        assert!(matches!(
            Topology::from_data(data),
            Err(TopologyError::NotContainerlab)
        ));
    }

    #[test]
    fn rejects_managed_node_without_version() {
        let json = SAMPLE_TOPOLOGY.replace("ghcr.io/nokia/srlinux:24.10.1", "srlinux");
        let data = serde_json::from_str(&json).unwrap();

        assert!(matches!(
            Topology::from_data(data),
            Err(TopologyError::MissingVersion(name)) if name == "leaf1"
        ));
    }

    #[test]
    fn from_file_reports_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            Topology::from_file(&missing),
            Err(TopologyError::NotFound(_))
        ));

        let invalid = dir.path().join("invalid.json");
        fs::File::create(&invalid)
            .unwrap()
            .write_all(b"{ not json")
            .unwrap();
        assert!(matches!(
            Topology::from_file(&invalid),
            Err(TopologyError::InvalidJson { .. })
        ));

        let valid = dir.path().join("topology-data.json");
        fs::write(&valid, SAMPLE_TOPOLOGY).unwrap();
        assert_eq!(Topology::from_file(&valid).unwrap().name, "my-lab");
    }
}
