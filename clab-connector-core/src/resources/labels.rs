use std::collections::BTreeMap;

pub const ROLE_LABEL: &str = "eda.nokia.com/role";
pub const SECURITY_PROFILE_LABEL: &str = "eda.nokia.com/security-profile";
pub const SECURITY_PROFILE_MANAGED: &str = "managed";
pub const CONTAINERLAB_LABEL: &str = "containerlab";
pub const TOPOLOGY_LABEL: &str = "containerlab-topology";

pub fn get_toponode_labels(
    role: &str,
    containerlab_label: &str,
    topology_name: &str,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        (ROLE_LABEL.to_owned(), role.to_owned()),
        (
            SECURITY_PROFILE_LABEL.to_owned(),
            SECURITY_PROFILE_MANAGED.to_owned(),
        ),
        (CONTAINERLAB_LABEL.to_owned(), containerlab_label.to_owned()),
        (TOPOLOGY_LABEL.to_owned(), topology_name.to_owned()),
    ])
}

pub fn get_role_labels(role: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(ROLE_LABEL.to_owned(), role.to_owned())])
}

/// Selector matching nodes carrying the given `containerlab` label.
pub fn get_containerlab_selector(containerlab_label: &str) -> String {
    format!("{CONTAINERLAB_LABEL}={containerlab_label}")
}

/// Selector matching managed nodes of one kind, used by the
/// NodeSecurityProfile.
pub fn get_managed_selector(containerlab_label: &str) -> String {
    format!(
        "{SECURITY_PROFILE_LABEL}={SECURITY_PROFILE_MANAGED},{}",
        get_containerlab_selector(containerlab_label)
    )
}
