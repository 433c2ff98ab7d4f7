use std::collections::BTreeMap;

use itertools::Itertools;
use kube::core::ObjectMeta;
use log::{debug, info, warn};

use crate::{
    topology::{
        kinds::KindProfile,
        link::{Link, LinkEndpoint, LinkRole},
        node::Node,
        Topology,
    },
    EDA_SYSTEM_NAMESPACE,
};

use super::{
    crd::{
        aaa::{NodeGroup, NodeGroupSpec},
        artifacts::{Artifact, ArtifactSpec, RemoteFileUrl, SCHEMA_PROFILES_REPO},
        bootstrap::{Init, InitSpec},
        core::{
            CsrParams, GroupBinding, NodeImage, NodeProfile, NodeProfileSpec, NodeSecurityProfile,
            NodeSecurityProfileSpec, NodeTls, NodeUser, NodeUserSpec, ProductionAddress, TopoLink,
            TopoLinkEndpoint, TopoLinkEntry, TopoLinkSpec, TopoNode, TopoNodeComponent,
            TopoNodeSpec,
        },
        interfaces::{
            Interface, InterfaceEthernet, InterfaceMember, InterfaceSpec, StormControl,
            DEFAULT_LACP_PORT_PRIORITY,
        },
    },
    labels::{
        get_containerlab_selector, get_managed_selector, get_role_labels, get_toponode_labels,
    },
    Manifest, ManifestCategory, ManifestSet, ResourceGenerationError,
};

pub const INIT_NAME: &str = "init-base";
pub const NODE_SECURITY_PROFILE_NAME: &str = "managed-tls";
pub const NODE_GROUP_NAME: &str = "sudo";
pub const NODE_ISSUER: &str = "eda-node-issuer";
pub const NODE_GROUP_SERVICES: [&str; 6] = ["GNMI", "CLI", "NETCONF", "GNOI", "GRIBI", "GNSI"];

/// Turns a parsed topology into the EDA resources describing it.
pub struct ManifestGenerator<'a> {
    topology: &'a Topology,
    namespace: String,
    skip_edge_links: bool,
}

impl<'a> ManifestGenerator<'a> {
    pub fn new(topology: &'a Topology) -> Self {
        Self {
            topology,
            namespace: topology.namespace(),
            skip_edge_links: false,
        }
    }

    /// Leaves out edge TopoLinks and the interfaces facing non-EDA hosts.
    pub fn skip_edge_links(mut self, skip: bool) -> Self {
        self.skip_edge_links = skip;

        self
    }

    pub fn generate(&self) -> Result<ManifestSet, ResourceGenerationError> {
        info!("Generating manifests for namespace: {}", self.namespace);

        let mut set = ManifestSet::default();
        set.push(ManifestCategory::Artifacts, self.generate_artifacts()?);
        set.push(ManifestCategory::Init, vec![self.generate_init()?]);
        set.push(
            ManifestCategory::NodeSecurityProfile,
            vec![self.generate_node_security_profile()?],
        );
        set.push(
            ManifestCategory::NodeUserGroup,
            vec![self.generate_node_group()?],
        );
        set.push(ManifestCategory::NodeUser, self.generate_node_users()?);
        set.push(ManifestCategory::NodeProfiles, self.generate_node_profiles()?);
        set.push(ManifestCategory::TopoNodes, self.generate_toponodes()?);
        set.push(
            ManifestCategory::TopolinkInterfaces,
            self.generate_interfaces()?,
        );
        set.push(ManifestCategory::Topolinks, self.generate_topolinks()?);

        debug!("Generated {} manifests", set.len());

        Ok(set)
    }

    fn metadata(&self, name: impl Into<String>) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.into()),
            namespace: Some(self.namespace.to_owned()),
            ..Default::default()
        }
    }

    /// EDA managed nodes with their kind profile and (validated) version.
    fn managed_nodes(&self) -> impl Iterator<Item = (&'a Node, &'static dyn KindProfile, &'a str)> {
        self.topology.nodes.iter().filter_map(|node| {
            let profile = node.profile()?;
            let version = node.version.as_deref()?;

            Some((node, profile, version))
        })
    }

    /// Distinct kinds present in the topology, keyed by containerlab kind.
    fn managed_kinds(&self) -> BTreeMap<&'static str, &'static dyn KindProfile> {
        self.managed_nodes()
            .map(|(_, profile, _)| (profile.clab_kind(), profile))
            .collect()
    }

    pub fn generate_artifacts(&self) -> Result<Vec<Manifest>, ResourceGenerationError> {
        self.managed_nodes()
            .filter_map(|(node, profile, version)| {
                let artifact = profile.artifact(version);
                if artifact.is_none() {
                    warn!("No schema profile for node {} version {version}, skipping artifact!", node.name);
                }
                artifact
            })
            .unique_by(|artifact| artifact.name.clone())
            .map(|artifact| {
                Manifest::from_resource(&Artifact {
                    metadata: ObjectMeta {
                        name: Some(artifact.name),
                        namespace: Some(EDA_SYSTEM_NAMESPACE.to_owned()),
                        ..Default::default()
                    },
                    spec: ArtifactSpec {
                        file_path: artifact.file_name,
                        remote_file_url: RemoteFileUrl {
                            file_url: artifact.url,
                        },
                        repo: SCHEMA_PROFILES_REPO.to_owned(),
                    },
                })
            })
            .collect()
    }

    pub fn generate_init(&self) -> Result<Manifest, ResourceGenerationError> {
        Manifest::from_resource(&Init {
            metadata: self.metadata(INIT_NAME),
            spec: InitSpec { commit_save: true },
        })
    }

    pub fn generate_node_security_profile(&self) -> Result<Manifest, ResourceGenerationError> {
        let node_selector = self
            .managed_kinds()
            .values()
            .map(|profile| get_managed_selector(profile.containerlab_label()))
            .collect();

        Manifest::from_resource(&NodeSecurityProfile {
            metadata: self.metadata(NODE_SECURITY_PROFILE_NAME),
            spec: NodeSecurityProfileSpec {
                node_selector,
                tls: NodeTls {
                    csr_params: CsrParams {
                        certificate_validity: "2160h".to_owned(),
                        city: "Sunnyvale".to_owned(),
                        country: "US".to_owned(),
                        csr_suite: "CSRSUITE_X509_KEY_TYPE_RSA_2048_SIGNATURE_ALGORITHM_SHA_2_256"
                            .to_owned(),
                        org: "NI".to_owned(),
                        org_unit: "EDA".to_owned(),
                        state: "California".to_owned(),
                    },
                    issuer_ref: NODE_ISSUER.to_owned(),
                },
            },
        })
    }

    pub fn generate_node_group(&self) -> Result<Manifest, ResourceGenerationError> {
        Manifest::from_resource(&NodeGroup {
            metadata: self.metadata(NODE_GROUP_NAME),
            spec: NodeGroupSpec {
                services: NODE_GROUP_SERVICES.iter().map(|s| s.to_string()).collect(),
                superuser: true,
            },
        })
    }

    pub fn generate_node_users(&self) -> Result<Vec<Manifest>, ResourceGenerationError> {
        self.managed_kinds()
            .values()
            .map(|profile| {
                let user = profile.node_user();

                Manifest::from_resource(&NodeUser {
                    metadata: self.metadata(user.name),
                    spec: NodeUserSpec {
                        username: user.username.to_owned(),
                        password: user.password.to_owned(),
                        group_bindings: vec![GroupBinding {
                            groups: vec![NODE_GROUP_NAME.to_owned()],
                            node_selector: vec![get_containerlab_selector(
                                profile.containerlab_label(),
                            )],
                        }],
                        ssh_public_keys: self.topology.ssh_pub_keys.clone(),
                    },
                })
            })
            .collect()
    }

    pub fn generate_node_profiles(&self) -> Result<Vec<Manifest>, ResourceGenerationError> {
        let mut profiles = BTreeMap::new();

        for (node, profile, version) in self.managed_nodes() {
            let name = profile.profile_name(&self.topology.name, version);
            if profiles.contains_key(&name) {
                continue;
            }

            info!("Rendering node profile for {}", node.name);
            let user = profile.node_user();
            let resource = NodeProfile {
                metadata: self.metadata(&name),
                spec: NodeProfileSpec {
                    port: profile.gnmi_port(),
                    annotate: profile.annotate(),
                    operating_system: profile.operating_system().to_owned(),
                    version: version.to_owned(),
                    version_path: profile.version_path().map(ToOwned::to_owned),
                    version_match: profile.version_match(version),
                    yang: profile.yang_url(version),
                    node_user: user.name.to_owned(),
                    onboarding_password: user.password.to_owned(),
                    onboarding_username: user.username.to_owned(),
                    images: profile.images(version).map(|images| {
                        images
                            .into_iter()
                            .map(|i| NodeImage {
                                image: i.image,
                                image_md5: i.image_md5,
                            })
                            .collect()
                    }),
                    license: profile.license(version),
                    llm_db: profile.llm_db(version),
                },
            };

            profiles.insert(name, Manifest::from_resource(&resource)?);
        }

        Ok(profiles.into_values().collect())
    }

    pub fn generate_toponodes(&self) -> Result<Vec<Manifest>, ResourceGenerationError> {
        self.managed_nodes()
            .map(|(node, profile, version)| {
                info!("Creating toponode for {}", node.name);
                let components = profile
                    .components(&node.node_type)
                    .into_iter()
                    .map(|c| TopoNodeComponent {
                        kind: c.kind.to_owned(),
                        slot: c.slot,
                        type_: c.type_.to_owned(),
                    })
                    .collect::<Vec<_>>();

                Manifest::from_resource(&TopoNode {
                    metadata: ObjectMeta {
                        labels: Some(get_toponode_labels(
                            node.role(),
                            profile.containerlab_label(),
                            &self.topology.name,
                        )),
                        ..self.metadata(node.eda_name())
                    },
                    spec: TopoNodeSpec {
                        node_profile: Some(profile.profile_name(&self.topology.name, version)),
                        operating_system: Some(profile.operating_system().to_owned()),
                        platform: Some(profile.platform(&node.node_type)),
                        version: Some(version.to_owned()),
                        production_address: Some(ProductionAddress {
                            ipv4: node.management_address(),
                            ipv6: Some(String::new()),
                        }),
                        component: (!components.is_empty()).then_some(components),
                        state: None,
                    },
                    status: None,
                })
            })
            .collect()
    }

    fn includes_edge(&self, link: &Link) -> bool {
        !(self.skip_edge_links && link.is_edge_link())
    }

    pub fn generate_interfaces(&self) -> Result<Vec<Manifest>, ResourceGenerationError> {
        let mut manifests = Vec::new();

        for link in &self.topology.links {
            for (endpoint, peer) in link.sides() {
                if !endpoint.node.is_eda_supported() {
                    continue;
                }

                let role = if peer.node.is_eda_supported() {
                    LinkRole::InterSwitch
                } else if self.includes_edge(link) {
                    LinkRole::Edge
                } else {
                    continue;
                };

                manifests.push(self.generate_interface(endpoint, peer, role)?);
            }
        }

        Ok(manifests)
    }

    fn generate_interface(
        &self,
        endpoint: &LinkEndpoint,
        peer: &LinkEndpoint,
        role: LinkRole,
    ) -> Result<Manifest, ResourceGenerationError> {
        debug!("Creating topolink interface for {}", endpoint.node.name);

        Manifest::from_resource(&Interface {
            metadata: ObjectMeta {
                labels: Some(get_role_labels(role.as_str())),
                ..self.metadata(endpoint.interface_resource_name())
            },
            spec: InterfaceSpec {
                enabled: true,
                description: Some(format!("{role} link to {}", peer.node.eda_name())),
                encap_type: "null".to_owned(),
                ethernet: Some(InterfaceEthernet {
                    storm_control: StormControl { enabled: false },
                }),
                lldp: true,
                members: vec![InterfaceMember {
                    enabled: true,
                    interface: endpoint.eda_interface_name(),
                    lacp_port_priority: DEFAULT_LACP_PORT_PRIORITY,
                    node: endpoint.node.eda_name(),
                }],
                type_: "interface".to_owned(),
            },
        })
    }

    pub fn generate_topolinks(&self) -> Result<Vec<Manifest>, ResourceGenerationError> {
        self.topology
            .links
            .iter()
            .filter(|link| self.includes_edge(link))
            .filter_map(|link| link.role().map(|role| (link, role)))
            .map(|(link, role)| {
                let (local, remote) = match role {
                    LinkRole::InterSwitch => (&link.a, Some(&link.z)),
                    LinkRole::Edge => (link.oriented().0, None),
                };
                let endpoint = |e: &LinkEndpoint| TopoLinkEndpoint {
                    node: Some(e.node.eda_name()),
                    interface: Some(e.eda_interface_name()),
                    interface_resource: Some(e.interface_resource_name()),
                };

                Manifest::from_resource(&TopoLink {
                    metadata: ObjectMeta {
                        labels: Some(get_role_labels(role.as_str())),
                        ..self.metadata(link.name())
                    },
                    spec: TopoLinkSpec {
                        links: Some(vec![TopoLinkEntry {
                            local: Some(endpoint(local)),
                            remote: remote.map(endpoint),
                            type_: Some(role.as_str().to_owned()),
                        }]),
                    },
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::tests::sample_topology;

    fn names(manifests: &[Manifest]) -> Vec<&str> {
        manifests.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn generates_all_categories_in_order() {
        let topology = sample_topology();
        let set = ManifestGenerator::new(&topology).generate().unwrap();

        let categories = set.categories().map(|(c, _)| c).collect::<Vec<_>>();
        assert_eq!(categories, ManifestCategory::ALL.to_vec());
    }

    #[test]
    fn artifacts_are_deduplicated_and_live_in_eda_system() {
        let topology = sample_topology();
        let artifacts = ManifestGenerator::new(&topology)
            .generate_artifacts()
            .unwrap();

        assert_eq!(
            names(&artifacts),
            vec!["clab-srlinux-24.10.1", "clab-sros-ghcr-25.3.r2"]
        );
        assert_eq!(artifacts[0].namespace.as_deref(), Some("eda-system"));
        assert_eq!(artifacts[0].body["spec"]["repo"], "clab-schemaprofiles");
        assert_eq!(
            artifacts[1].body["spec"]["remoteFileUrl"]["fileUrl"],
            "https://github.com/nokia-eda/schema-profiles/releases/download/nokia-sros-v25.3.r2/sros-25.3.r2.zip"
        );
    }

    #[test]
    fn node_users_and_selectors_follow_present_kinds() {
        let topology = sample_topology();
        let generator = ManifestGenerator::new(&topology);

        let users = generator.generate_node_users().unwrap();
        assert_eq!(names(&users), vec!["admin", "admin-sros"]);
        assert_eq!(
            users[1].body["spec"]["groupBindings"][0]["nodeSelector"][0],
            "containerlab=managedSros"
        );
        assert_eq!(
            users[0].body["spec"]["sshPublicKeys"][0],
            "ssh-ed25519 AAAA test@host"
        );

        let nsp = generator.generate_node_security_profile().unwrap();
        assert_eq!(
            nsp.body["spec"]["nodeSelector"],
            serde_json::json!([
                "eda.nokia.com/security-profile=managed,containerlab=managedSrl",
                "eda.nokia.com/security-profile=managed,containerlab=managedSros"
            ])
        );
    }

    #[test]
    fn node_profiles_are_unique_per_version() {
        let topology = sample_topology();
        let profiles = ManifestGenerator::new(&topology)
            .generate_node_profiles()
            .unwrap();

        assert_eq!(
            names(&profiles),
            vec!["my-lab-srlinux-24.10.1", "my-lab-sros-25.3.r2"]
        );

        let srl = &profiles[0].body["spec"];
        assert_eq!(srl["port"], 57410);
        assert_eq!(srl["versionMatch"], r"v24\.10\.1.*");
        assert_eq!(
            srl["images"][0]["imageMd5"],
            "eda-system/srlimages/srlinux-24.10.1-bin/srlinux.bin.md5"
        );

        let sros = &profiles[1].body["spec"];
        assert_eq!(sros["nodeUser"], "admin-sros");
        assert_eq!(sros["license"], "sros-ghcr-25.3.r2-dummy-license");
        assert!(sros.get("versionPath").is_none());
    }

    #[test]
    fn toponodes_carry_labels_and_components() {
        let topology = sample_topology();
        let toponodes = ManifestGenerator::new(&topology)
            .generate_toponodes()
            .unwrap();

        assert_eq!(names(&toponodes), vec!["leaf1", "pe1", "spine1"]);

        let leaf = &toponodes[0].body;
        assert_eq!(leaf["metadata"]["labels"]["eda.nokia.com/role"], "leaf");
        assert_eq!(leaf["metadata"]["labels"]["containerlab"], "managedSrl");
        assert_eq!(leaf["spec"]["platform"], "7220 IXR-D3L");
        assert_eq!(leaf["spec"]["productionAddress"]["ipv4"], "172.20.20.2");
        assert!(leaf["spec"].get("component").is_none());

        let pe = &toponodes[1].body;
        assert_eq!(pe["metadata"]["labels"]["eda.nokia.com/role"], "dcgw");
        assert_eq!(pe["spec"]["platform"], "7750 SR-1");
        assert_eq!(pe["spec"]["component"].as_array().map(Vec::len), Some(14));
    }

    #[test]
    fn interfaces_are_labelled_by_peer() {
        let topology = sample_topology();
        let interfaces = ManifestGenerator::new(&topology)
            .generate_interfaces()
            .unwrap();

        assert_eq!(
            names(&interfaces),
            vec![
                "leaf1-ethernet-1-49",
                "spine1-ethernet-1-1",
                "spine1-ethernet-1-2",
                "pe1-1-a-1-1",
                "leaf1-ethernet-1-1",
            ]
        );

        let edge = &interfaces[4].body;
        assert_eq!(edge["metadata"]["labels"]["eda.nokia.com/role"], "edge");
        assert_eq!(edge["spec"]["description"], "edge link to client1");
        assert_eq!(edge["spec"]["encapType"], "null");
        assert_eq!(edge["spec"]["members"][0]["lacpPortPriority"], 32768);
    }

    #[test]
    fn edge_links_can_be_skipped() {
        let topology = sample_topology();
        let generator = ManifestGenerator::new(&topology).skip_edge_links(true);

        assert_eq!(generator.generate_interfaces().unwrap().len(), 4);
        assert_eq!(
            names(&generator.generate_topolinks().unwrap()),
            vec!["leaf1-e1-49-spine1-e1-1", "spine1-e1-2-pe1-1/1/1"]
        );
    }

    #[test]
    fn edge_topolinks_only_have_local_end() {
        let topology = sample_topology();
        let links = ManifestGenerator::new(&topology)
            .generate_topolinks()
            .unwrap();

        let edge = &links[2].body["spec"]["links"][0];
        assert_eq!(edge["type"], "edge");
        assert_eq!(edge["local"]["node"], "leaf1");
        assert_eq!(edge["local"]["interface"], "ethernet-1-1");
        assert!(edge.get("remote").is_none());

        let inter = &links[0].body["spec"]["links"][0];
        assert_eq!(inter["remote"]["interfaceResource"], "spine1-ethernet-1-1");
    }
}
