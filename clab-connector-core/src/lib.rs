pub mod eda;
pub mod export;
pub mod health;
pub mod helpers;
pub mod kubernetes;
pub mod resources;
pub mod status;
pub mod topology;

pub const EDA_CORE_GROUP: &str = "core.eda.nokia.com";
pub const EDA_CORE_VERSION: &str = "v1";

pub const EDA_SYSTEM_NAMESPACE: &str = "eda-system";
pub const TOPOLOGY_NAMESPACE_PREFIX: &str = "clab-";

pub fn get_topology_namespace(topology_name: &str) -> String {
    format!("{TOPOLOGY_NAMESPACE_PREFIX}{topology_name}")
}
