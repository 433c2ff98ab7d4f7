use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "aaa.eda.nokia.com",
    version = "v1alpha1",
    kind = "NodeGroup",
    namespaced,
    derive = "Default"
)]
pub struct NodeGroupSpec {
    /// management services members of this group may use
    pub services: Vec<String>,
    pub superuser: bool,
}
