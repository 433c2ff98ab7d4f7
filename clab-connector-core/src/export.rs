//! Rendering of the TopoNodes and TopoLinks of an EDA namespace back into a
//! containerlab topology file.

use std::{collections::BTreeMap, fs, net::Ipv4Addr, path::Path};

use anyhow::Context;
use ipnet::Ipv4Net;
use kube::Client;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::{
    helpers::RequireMetadata,
    kubernetes::operations::list_resources,
    resources::crd::core::{TopoLink, TopoNode},
};

pub const DEFAULT_MGMT_SUBNET: &str = "172.80.80.0/24";

const SRLINUX_KIND: &str = "nokia_srlinux";
const SROS_KIND: &str = "nokia_sros";
const CEOS_KIND: &str = "arista_ceos";

static SRL_EDA_INTERFACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ethernet-(?<slot>\d+)-(?<port>\d+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClabFile {
    pub name: String,
    pub mgmt: ClabMgmt,
    pub topology: ClabTopology,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClabMgmt {
    pub network: String,
    #[serde(rename = "ipv4-subnet")]
    pub ipv4_subnet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClabTopology {
    pub nodes: BTreeMap<String, ClabNode>,
    pub links: Vec<ClabLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClabNode {
    pub kind: String,
    #[serde(rename = "mgmt-ipv4")]
    pub mgmt_ipv4: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClabLink {
    pub endpoints: [String; 2],
}

impl ClabFile {
    pub fn build(namespace: &str, nodes: &[TopoNode], links: &[TopoLink]) -> Self {
        let mgmt_ips = nodes
            .iter()
            .filter_map(management_ip)
            .filter_map(|ip| match ip.parse::<Ipv4Addr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    warn!("Invalid IP address found: {ip}");
                    None
                }
            })
            .collect::<Vec<_>>();

        let mut topology = ClabTopology::default();

        for node in nodes {
            if let Some((name, definition)) = build_node(node) {
                topology.nodes.insert(name, definition);
            }
        }

        for link in links {
            build_links(link, &topology.nodes, &mut topology.links);
        }

        Self {
            name: namespace.to_owned(),
            mgmt: ClabMgmt {
                network: format!("{namespace}-mgmt"),
                ipv4_subnet: derive_mgmt_subnet(&mgmt_ips),
            },
            topology,
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Smallest subnet containing every address.
pub fn derive_mgmt_subnet(ips: &[Ipv4Addr]) -> String {
    let (Some(min), Some(max)) = (ips.iter().min(), ips.iter().max()) else {
        warn!("No valid management IPs found, using default subnet");
        return DEFAULT_MGMT_SUBNET.to_owned();
    };

    let prefix_length = (u32::from(*min) ^ u32::from(*max)).leading_zeros() as u8;

    match Ipv4Net::new(*min, prefix_length) {
        Ok(net) => net.trunc().to_string(),
        Err(_) => DEFAULT_MGMT_SUBNET.to_owned(),
    }
}

fn management_ip(node: &TopoNode) -> Option<String> {
    let status = node.status.as_ref();

    node.spec
        .production_address
        .as_ref()
        .and_then(|address| address.ipv4.clone())
        .or_else(|| {
            status
                .and_then(|status| status.production_address.as_ref())
                .and_then(|address| address.ipv4.clone())
        })
        .or_else(|| {
            status
                .and_then(|status| status.node_details.as_deref())
                .and_then(|details| details.split(':').next())
                .filter(|ip| !ip.is_empty())
                .map(str::to_owned)
        })
        .map(|ip| strip_prefix_length(&ip).to_owned())
}

/// cEOS production addresses carry the management prefix length.
fn strip_prefix_length(ip: &str) -> &str {
    ip.split_once('/').map_or(ip, |(address, _)| address)
}

fn build_node(node: &TopoNode) -> Option<(String, ClabNode)> {
    let Ok(name) = node.require_name_or(()) else {
        warn!("Node item missing metadata.name, skipping.");
        return None;
    };

    let Some(mgmt_ipv4) = management_ip(node) else {
        warn!("No mgmt IP found for node '{name}', skipping.");
        return None;
    };

    let status = node.status.as_ref();
    let operating_system = node
        .spec
        .operating_system
        .as_deref()
        .or_else(|| status.and_then(|s| s.operating_system.as_deref()))
        .unwrap_or_default()
        .to_lowercase();
    let version = node
        .spec
        .version
        .as_deref()
        .or_else(|| status.and_then(|s| s.version.as_deref()))
        .filter(|v| !v.is_empty());

    let (kind, image_repository) = if operating_system.starts_with("sros") {
        (SROS_KIND, "vr-sros")
    } else if operating_system.starts_with("eos") {
        (CEOS_KIND, "ceos")
    } else {
        (SRLINUX_KIND, "ghcr.io/nokia/srlinux")
    };

    Some((
        name.to_owned(),
        ClabNode {
            kind: kind.to_owned(),
            mgmt_ipv4,
            image: version.map(|version| format!("{image_repository}:{version}")),
        },
    ))
}

/// EDA interface name in the naming convention of the node's containerlab kind.
fn clab_interface_name(node: Option<&ClabNode>, interface: &str) -> String {
    match node {
        Some(node) if node.kind == SRLINUX_KIND => match SRL_EDA_INTERFACE.captures(interface) {
            Some(caps) => format!("e{}-{}", &caps["slot"], &caps["port"]),
            None => interface.to_owned(),
        },
        _ => interface.to_owned(),
    }
}

fn build_links(link: &TopoLink, nodes: &BTreeMap<String, ClabNode>, output: &mut Vec<ClabLink>) {
    let link_name = link.metadata.name.as_deref().unwrap_or("unknown-link");

    for entry in link.spec.links.iter().flatten() {
        let local = entry.local.as_ref();
        let remote = entry.remote.as_ref();
        let endpoints = (
            local.and_then(|l| l.node.as_deref()),
            local.and_then(|l| l.interface.as_deref()),
            remote.and_then(|r| r.node.as_deref()),
            remote.and_then(|r| r.interface.as_deref()),
        );

        match endpoints {
            (Some(local_node), Some(local_intf), Some(remote_node), Some(remote_intf)) => {
                output.push(ClabLink {
                    endpoints: [
                        format!(
                            "{local_node}:{}",
                            clab_interface_name(nodes.get(local_node), local_intf)
                        ),
                        format!(
                            "{remote_node}:{}",
                            clab_interface_name(nodes.get(remote_node), remote_intf)
                        ),
                    ],
                })
            }
            _ => warn!("Incomplete link entry in {link_name}, skipping that entry."),
        }
    }
}

/// Lists TopoNodes and TopoLinks of the namespace and writes them as a
/// containerlab topology to `output`.
pub async fn export_lab(client: &Client, namespace: &str, output: &Path) -> anyhow::Result<ClabFile> {
    let nodes = list_resources::<TopoNode>(client, namespace)
        .await
        .context("Failed to list toponodes!")?;
    let links = list_resources::<TopoLink>(client, namespace)
        .await
        .context("Failed to list topolinks!")?;

    info!(
        "Found {} toponodes and {} topolinks in '{namespace}'",
        nodes.len(),
        links.len()
    );

    let clab_file = ClabFile::build(namespace, &nodes, &links);

    fs::write(output, clab_file.to_yaml()?).context(format!(
        "Failed to write containerlab file '{}'!",
        output.display()
    ))?;
    info!("Exported containerlab file: {}", output.display());

    Ok(clab_file)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn toponode(value: serde_json::Value) -> TopoNode {
        serde_json::from_value(value).unwrap()
    }

    fn sample_nodes() -> Vec<TopoNode> {
        vec![
            toponode(json!({
                "apiVersion": "core.eda.nokia.com/v1",
                "kind": "TopoNode",
                "metadata": { "name": "leaf1", "namespace": "clab-lab" },
                "spec": {
                    "operatingSystem": "srl",
                    "version": "24.10.1",
                    "productionAddress": { "ipv4": "172.20.20.3" }
                }
            })),
            toponode(json!({
                "apiVersion": "core.eda.nokia.com/v1",
                "kind": "TopoNode",
                "metadata": { "name": "pe1", "namespace": "clab-lab" },
                "spec": { "operatingSystem": "sros" },
                "status": { "version": "25.3.r2", "node-details": "172.20.20.9:57400" }
            })),
            toponode(json!({
                "apiVersion": "core.eda.nokia.com/v1",
                "kind": "TopoNode",
                "metadata": { "name": "orphan", "namespace": "clab-lab" },
                "spec": { "operatingSystem": "srl" }
            })),
        ]
    }

    #[test]
    fn mgmt_subnet_covers_all_addresses() {
        let ips = ["172.20.20.3", "172.20.20.9"]
            .map(|ip| ip.parse::<Ipv4Addr>().unwrap())
            .to_vec();

        assert_eq!(derive_mgmt_subnet(&ips), "172.20.20.0/28");
        assert_eq!(
            derive_mgmt_subnet(&["10.0.0.1".parse::<Ipv4Addr>().unwrap()]),
            "10.0.0.1/32"
        );
        assert_eq!(derive_mgmt_subnet(&[]), DEFAULT_MGMT_SUBNET);
    }

    #[test]
    fn nodes_are_mapped_to_clab_kinds() {
        let clab_file = ClabFile::build("clab-lab", &sample_nodes(), &[]);

        assert_eq!(clab_file.name, "clab-lab");
        assert_eq!(clab_file.mgmt.network, "clab-lab-mgmt");
        assert_eq!(clab_file.mgmt.ipv4_subnet, "172.20.20.0/28");
        assert_eq!(clab_file.topology.nodes.len(), 2);
        assert_eq!(
            clab_file.topology.nodes["leaf1"],
            ClabNode {
                kind: "nokia_srlinux".into(),
                mgmt_ipv4: "172.20.20.3".into(),
                image: Some("ghcr.io/nokia/srlinux:24.10.1".into()),
            }
        );
        assert_eq!(
            clab_file.topology.nodes["pe1"],
            ClabNode {
                kind: "nokia_sros".into(),
                mgmt_ipv4: "172.20.20.9".into(),
                image: Some("vr-sros:25.3.r2".into()),
            }
        );
    }

    #[test]
    fn ceos_addresses_lose_their_prefix_length() {
        let mut nodes = sample_nodes();
        nodes.push(toponode(json!({
            "apiVersion": "core.eda.nokia.com/v1",
            "kind": "TopoNode",
            "metadata": { "name": "ceos1", "namespace": "clab-lab" },
            "spec": {
                "operatingSystem": "eos",
                "version": "4.33.2F",
                "productionAddress": { "ipv4": "172.20.20.40/24" }
            }
        })));

        let clab_file = ClabFile::build("clab-lab", &nodes, &[]);

        assert_eq!(
            clab_file.topology.nodes["ceos1"],
            ClabNode {
                kind: "arista_ceos".into(),
                mgmt_ipv4: "172.20.20.40".into(),
                image: Some("ceos:4.33.2F".into()),
            }
        );
        assert_eq!(clab_file.mgmt.ipv4_subnet, "172.20.20.0/26");
    }

    #[test]
    fn complete_link_entries_become_endpoints() {
        let link: TopoLink = serde_json::from_value(json!({
            "apiVersion": "core.eda.nokia.com/v1",
            "kind": "TopoLink",
            "metadata": { "name": "leaf1-e1-1-pe1-1-1-1", "namespace": "clab-lab" },
            "spec": {
                "links": [
                    {
                        "local": { "node": "leaf1", "interface": "ethernet-1-1" },
                        "remote": { "node": "pe1", "interface": "ethernet-1-a-1-1" },
                        "type": "interSwitch"
                    },
                    {
                        "local": { "node": "leaf1", "interface": "ethernet-1-2" },
                        "type": "edge"
                    }
                ]
            }
        }))
        .unwrap();

        let clab_file = ClabFile::build("clab-lab", &sample_nodes(), &[link]);

        assert_eq!(
            clab_file.topology.links,
            vec![ClabLink {
                endpoints: ["leaf1:e1-1".into(), "pe1:ethernet-1-a-1-1".into()]
            }]
        );
    }

    #[test]
    fn yaml_uses_containerlab_keys() {
        let yaml = ClabFile::build("clab-lab", &sample_nodes(), &[])
            .to_yaml()
            .unwrap();

        assert!(yaml.contains("ipv4-subnet: 172.20.20.0/28"));
        assert!(yaml.contains("mgmt-ipv4: 172.20.20.3"));
        assert!(yaml.starts_with("name: clab-lab\n"));
    }
}
