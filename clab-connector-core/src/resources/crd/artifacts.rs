use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_PROFILES_REPO: &str = "clab-schemaprofiles";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "artifacts.eda.nokia.com",
    version = "v1",
    kind = "Artifact",
    namespaced,
    derive = "Default"
)]
pub struct ArtifactSpec {
    /// path of the artifact inside the repository
    pub file_path: String,
    /// where the artifact server downloads the file from
    pub remote_file_url: RemoteFileUrl,
    /// artifact repository name
    pub repo: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFileUrl {
    pub file_url: String,
}
