use once_cell::sync::Lazy;
use regex::Regex;

use super::{ImageInfo, KindProfile, NodeUserProfile};

static CLAB_INTERFACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^e(\d+)-(\d+)$").unwrap());

const SCHEMA_PROFILES: &[(&str, &str)] = &[
    (
        "24.10.1",
        "https://github.com/nokia/srlinux-yang-models/releases/download/v24.10.1/srlinux-24.10.1-492.zip",
    ),
    (
        "24.10.2",
        "https://github.com/nokia/srlinux-yang-models/releases/download/v24.10.2/srlinux-24.10.2-357.zip",
    ),
    (
        "24.10.3",
        "https://github.com/nokia/srlinux-yang-models/releases/download/v24.10.3/srlinux-24.10.3-201.zip",
    ),
    (
        "24.10.4",
        "https://github.com/nokia/srlinux-yang-models/releases/download/v24.10.4/srlinux-24.10.4-244.zip",
    ),
    (
        "25.3.1",
        "https://github.com/nokia/srlinux-yang-models/releases/download/v25.3.1/srlinux-25.3.1-149.zip",
    ),
];

/// Nokia SR Linux (`nokia_srlinux`).
pub struct SrLinux;

impl KindProfile for SrLinux {
    fn clab_kind(&self) -> &'static str {
        "nokia_srlinux"
    }

    fn operating_system(&self) -> &'static str {
        "srl"
    }

    fn default_node_type(&self) -> &'static str {
        "ixrd3l"
    }

    fn platform(&self, node_type: &str) -> String {
        format!("7220 IXR-{}", node_type.replace("ixr", "").to_uppercase())
    }

    fn containerlab_label(&self) -> &'static str {
        "managedSrl"
    }

    fn node_user(&self) -> NodeUserProfile {
        NodeUserProfile {
            name: "admin",
            username: "admin",
            password: "NokiaSrl1!",
        }
    }

    fn gnmi_port(&self) -> u16 {
        57410
    }

    fn profile_token(&self) -> &'static str {
        "srlinux"
    }

    fn schema_file_name(&self, version: &str) -> String {
        format!("srlinux-{version}.zip")
    }

    fn artifact_name(&self, version: &str) -> String {
        format!("clab-srlinux-{version}")
    }

    fn artifact_url(&self, version: &str) -> Option<&'static str> {
        SCHEMA_PROFILES
            .iter()
            .find(|(known, _)| *known == version)
            .map(|(_, url)| *url)
    }

    fn interface_name(&self, ifname: &str) -> String {
        match CLAB_INTERFACE.captures(ifname) {
            Some(caps) => format!("ethernet-{}-{}", &caps[1], &caps[2]),
            None => ifname.to_owned(),
        }
    }

    fn normalize_version(&self, version: &str) -> String {
        version.to_owned()
    }

    fn annotate(&self) -> bool {
        true
    }

    fn version_path(&self) -> Option<&'static str> {
        Some(".system.information.version")
    }

    fn version_match(&self, version: &str) -> Option<String> {
        Some(format!("v{}.*", regex::escape(version)))
    }

    fn images(&self, version: &str) -> Option<Vec<ImageInfo>> {
        let image = format!("eda-system/srlimages/srlinux-{version}-bin/srlinux.bin");

        Some(vec![ImageInfo {
            image_md5: format!("{image}.md5"),
            image,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clab_interfaces_map_to_ethernet() {
        assert_eq!(SrLinux.interface_name("e1-1"), "ethernet-1-1");
        assert_eq!(SrLinux.interface_name("e1-49"), "ethernet-1-49");
        assert_eq!(SrLinux.interface_name("mgmt0"), "mgmt0");
    }

    #[test]
    fn platform_is_derived_from_type() {
        assert_eq!(SrLinux.platform("ixrd3l"), "7220 IXR-D3L");
        assert_eq!(SrLinux.platform("ixrd2"), "7220 IXR-D2");
    }

    #[test]
    fn version_match_escapes_dots() {
        assert_eq!(
            SrLinux.version_match("24.10.1").as_deref(),
            Some(r"v24\.10\.1.*")
        );
    }

    #[test]
    fn yang_url_points_at_schema_profile() {
        assert_eq!(
            SrLinux.yang_url("24.10.1"),
            "https://eda-asvr.eda-system.svc/eda-system/clab-schemaprofiles/clab-srlinux-24.10.1/srlinux-24.10.1.zip"
        );
    }
}
