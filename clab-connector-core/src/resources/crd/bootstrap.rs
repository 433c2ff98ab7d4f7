use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "bootstrap.eda.nokia.com",
    version = "v1alpha1",
    kind = "Init",
    namespaced,
    derive = "Default"
)]
pub struct InitSpec {
    /// save the startup configuration on the node after the initial commit
    pub commit_save: bool,
}
