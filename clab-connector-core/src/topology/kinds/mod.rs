//! Per-kind knowledge about the network operating systems EDA can manage.

mod ceos;
mod srlinux;
mod sros;

pub use ceos::Ceos;
pub use srlinux::SrLinux;
pub use sros::Sros;

const YANG_BASE_URL: &str = "https://eda-asvr.eda-system.svc/eda-system/clab-schemaprofiles";

/// Credentials EDA uses to reach nodes of one kind, modelled as a NodeUser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeUserProfile {
    /// name of the NodeUser resource
    pub name: &'static str,
    pub username: &'static str,
    pub password: &'static str,
}

/// Schema profile that has to be registered with the EDA artifact server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub name: String,
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub kind: &'static str,
    pub slot: String,
    pub type_: &'static str,
}

/// Software image referenced by a NodeProfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub image: String,
    pub image_md5: String,
}

pub trait KindProfile: Sync {
    /// containerlab `kind` this profile handles
    fn clab_kind(&self) -> &'static str;
    /// EDA operating system identifier
    fn operating_system(&self) -> &'static str;
    fn default_node_type(&self) -> &'static str;
    fn platform(&self, node_type: &str) -> String;
    /// value of the `containerlab` label used to select nodes of this kind
    fn containerlab_label(&self) -> &'static str;
    fn node_user(&self) -> NodeUserProfile;
    fn gnmi_port(&self) -> u16;
    /// short OS token used in NodeProfile names
    fn profile_token(&self) -> &'static str;
    fn schema_file_name(&self, version: &str) -> String;
    fn artifact_name(&self, version: &str) -> String;
    fn artifact_url(&self, version: &str) -> Option<&'static str>;
    /// containerlab interface name to EDA interface name
    fn interface_name(&self, ifname: &str) -> String;

    fn normalize_version(&self, version: &str) -> String {
        version.to_lowercase()
    }

    fn role(&self, node_name: &str) -> &'static str {
        role_from_name(node_name)
    }

    fn management_address(&self, ipv4: &str, _prefix_length: Option<u8>) -> String {
        ipv4.to_owned()
    }

    fn interface_resource_name(&self, node_name: &str, ifname: &str) -> String {
        format!("{node_name}-{}", self.interface_name(ifname))
    }

    /// interface token used when building TopoLink names
    fn link_token(&self, ifname: &str) -> String {
        ifname.to_owned()
    }

    fn annotate(&self) -> bool {
        false
    }

    fn version_path(&self) -> Option<&'static str> {
        None
    }

    fn version_match(&self, _version: &str) -> Option<String> {
        None
    }

    fn images(&self, _version: &str) -> Option<Vec<ImageInfo>> {
        None
    }

    fn license(&self, _version: &str) -> Option<String> {
        None
    }

    fn llm_db(&self, _version: &str) -> Option<String> {
        None
    }

    fn components(&self, _node_type: &str) -> Vec<Component> {
        Vec::new()
    }

    fn profile_name(&self, topology_name: &str, version: &str) -> String {
        format!("{topology_name}-{}-{version}", self.profile_token())
    }

    fn yang_url(&self, version: &str) -> String {
        format!(
            "{YANG_BASE_URL}/{}/{}",
            self.artifact_name(version),
            self.schema_file_name(version)
        )
    }

    /// Artifact to upload for the given version, `None` when no schema
    /// profile is known for it.
    fn artifact(&self, version: &str) -> Option<ArtifactInfo> {
        self.artifact_url(version).map(|url| ArtifactInfo {
            name: self.artifact_name(version),
            file_name: self.schema_file_name(version),
            url: url.to_owned(),
        })
    }
}

pub fn profile_for_kind(kind: &str) -> Option<&'static dyn KindProfile> {
    match kind {
        "nokia_srlinux" => Some(&SrLinux),
        "nokia_sros" => Some(&Sros),
        "arista_ceos" => Some(&Ceos),
        _ => None,
    }
}

/// Infers the fabric role of a node from its name.
pub fn role_from_name(node_name: &str) -> &'static str {
    let name = node_name.to_lowercase();

    if name.contains("spine") {
        "spine"
    } else if name.contains("borderleaf") || name.contains("bl") {
        "borderleaf"
    } else if name.contains("dcgw") {
        "dcgw"
    } else {
        "leaf"
    }
}

/// 1 -> `a`, 2 -> `b`, ...
fn mda_letter(mda: &str) -> String {
    mda.parse::<u8>()
        .ok()
        .filter(|n| (1..=26).contains(n))
        .map(|n| char::from(b'a' + n - 1).to_string())
        .unwrap_or_else(|| mda.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_inferred_from_name() {
        assert_eq!(role_from_name("Spine1"), "spine");
        assert_eq!(role_from_name("borderleaf1"), "borderleaf");
        assert_eq!(role_from_name("bl2"), "borderleaf");
        assert_eq!(role_from_name("dcgw1"), "dcgw");
        assert_eq!(role_from_name("leaf1"), "leaf");
        assert_eq!(role_from_name("srl"), "leaf");
    }

    #[test]
    fn profiles_are_resolved_by_kind() {
        assert_eq!(
            profile_for_kind("nokia_srlinux").map(|p| p.operating_system()),
            Some("srl")
        );
        assert_eq!(
            profile_for_kind("nokia_sros").map(|p| p.operating_system()),
            Some("sros")
        );
        assert_eq!(
            profile_for_kind("arista_ceos").map(|p| p.operating_system()),
            Some("eos")
        );
        assert!(profile_for_kind("linux").is_none());
    }

    #[test]
    fn mda_numbers_map_to_letters() {
        assert_eq!(mda_letter("1"), "a");
        assert_eq!(mda_letter("2"), "b");
        assert_eq!(mda_letter("26"), "z");
    }

    #[test]
    fn unknown_versions_have_no_artifact() {
        assert!(SrLinux.artifact("23.10.1").is_none());
        assert_eq!(
            SrLinux.artifact("24.10.1").map(|a| a.name),
            Some("clab-srlinux-24.10.1".to_owned())
        );
    }
}
