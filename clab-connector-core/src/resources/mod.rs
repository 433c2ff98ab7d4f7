use std::{borrow::Cow, fmt::Display, fs, path::Path};

use kube::Resource;
use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::helpers::RequireMetadata;

pub mod crd;
pub mod generator;
pub mod labels;

#[derive(Debug, Error)]
pub enum ResourceGenerationError {
    #[error("Resource contains invalid data ({})!", .0)]
    InvalidData(Cow<'static, str>),
    #[error("Resource is missing required data ({})!", .0)]
    MissingData(Cow<'static, str>),
    #[error("Couldn't serialize resource!")]
    Serialization(#[from] serde_json::Error),
    #[error("Couldn't render resource as YAML!")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Couldn't write manifests to '{}'!", .0)]
    Write(String, #[source] std::io::Error),
}

/// Groups of manifests, in the order they have to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManifestCategory {
    Artifacts,
    Init,
    NodeSecurityProfile,
    NodeUserGroup,
    NodeUser,
    NodeProfiles,
    TopoNodes,
    TopolinkInterfaces,
    Topolinks,
}

impl ManifestCategory {
    pub const ALL: [ManifestCategory; 9] = [
        ManifestCategory::Artifacts,
        ManifestCategory::Init,
        ManifestCategory::NodeSecurityProfile,
        ManifestCategory::NodeUserGroup,
        ManifestCategory::NodeUser,
        ManifestCategory::NodeProfiles,
        ManifestCategory::TopoNodes,
        ManifestCategory::TopolinkInterfaces,
        ManifestCategory::Topolinks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestCategory::Artifacts => "artifacts",
            ManifestCategory::Init => "init",
            ManifestCategory::NodeSecurityProfile => "node-security-profile",
            ManifestCategory::NodeUserGroup => "node-user-group",
            ManifestCategory::NodeUser => "node-user",
            ManifestCategory::NodeProfiles => "node-profiles",
            ManifestCategory::TopoNodes => "toponodes",
            ManifestCategory::TopolinkInterfaces => "topolink-interfaces",
            ManifestCategory::Topolinks => "topolinks",
        }
    }
}

impl Display for ManifestCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rendered custom resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub body: serde_json::Value,
}

impl Manifest {
    pub fn from_resource<K>(resource: &K) -> Result<Self, ResourceGenerationError>
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let name = resource
            .require_name_or_else(|| ResourceGenerationError::MissingData("metadata.name".into()))?
            .to_owned();

        Ok(Manifest {
            api_version: K::api_version(&()).into_owned(),
            kind: K::kind(&()).into_owned(),
            name,
            namespace: resource.meta().namespace.clone(),
            body: serde_json::to_value(resource)?,
        })
    }

    /// `(group, version)` split out of the apiVersion.
    pub fn group_version(&self) -> (&str, &str) {
        self.api_version
            .split_once('/')
            .unwrap_or(("", self.api_version.as_str()))
    }

    pub fn to_yaml(&self) -> Result<String, ResourceGenerationError> {
        Ok(serde_yaml::to_string(&self.body)?)
    }
}

/// Manifests grouped by category, empty categories are never stored.
#[derive(Debug, Clone, Default)]
pub struct ManifestSet {
    groups: Vec<(ManifestCategory, Vec<Manifest>)>,
}

impl ManifestSet {
    pub fn push(&mut self, category: ManifestCategory, manifests: Vec<Manifest>) {
        if manifests.is_empty() {
            return;
        }

        match self.groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, existing)) => existing.extend(manifests),
            None => {
                self.groups.push((category, manifests));
                self.groups.sort_by_key(|(c, _)| *c);
            }
        }
    }

    pub fn get(&self, category: ManifestCategory) -> &[Manifest] {
        self.groups
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, manifests)| manifests.as_slice())
            .unwrap_or_default()
    }

    pub fn categories(&self) -> impl Iterator<Item = (ManifestCategory, &[Manifest])> {
        self.groups.iter().map(|(c, m)| (*c, m.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, m)| m.len()).sum()
    }

    /// All manifests in one YAML stream, each category introduced by a
    /// `# --- CATEGORY ---` comment.
    pub fn to_combined_yaml(&self) -> Result<String, ResourceGenerationError> {
        let mut documents = Vec::with_capacity(self.len() + self.groups.len());

        for (category, manifests) in &self.groups {
            documents.push(format!("# --- {} ---", category.as_str().to_uppercase()));
            for manifest in manifests {
                documents.push(manifest.to_yaml()?.trim_end().to_owned());
            }
        }

        Ok(documents.join("\n---\n") + "\n")
    }

    pub fn category_yaml(&self, category: ManifestCategory) -> Result<String, ResourceGenerationError> {
        let documents = self
            .get(category)
            .iter()
            .map(|manifest| manifest.to_yaml().map(|yaml| yaml.trim_end().to_owned()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents.join("\n---\n") + "\n")
    }

    /// Writes one `<category>.yaml` file per category into `dir`.
    pub fn write_separate(&self, dir: &Path) -> Result<(), ResourceGenerationError> {
        let write_error = |e| ResourceGenerationError::Write(dir.display().to_string(), e);
        fs::create_dir_all(dir).map_err(write_error)?;

        for (category, _) in &self.groups {
            let path = dir.join(format!("{category}.yaml"));
            fs::write(&path, self.category_yaml(*category)?)
                .map_err(|e| ResourceGenerationError::Write(path.display().to_string(), e))?;
            info!("Manifest for '{category}' written to {}", path.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kube::core::ObjectMeta;

    use super::{
        crd::bootstrap::{Init, InitSpec},
        *,
    };

    fn init(name: &str) -> Manifest {
        let init = Init {
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                namespace: Some("clab-lab".to_owned()),
                ..Default::default()
            },
            spec: InitSpec { commit_save: true },
        };

        Manifest::from_resource(&init).unwrap()
    }

    #[test]
    fn manifest_carries_type_information() {
        let manifest = init("init-base");

        assert_eq!(manifest.api_version, "bootstrap.eda.nokia.com/v1alpha1");
        assert_eq!(manifest.group_version(), ("bootstrap.eda.nokia.com", "v1alpha1"));
        assert_eq!(manifest.kind, "Init");
        assert_eq!(manifest.body["kind"], "Init");
        assert_eq!(manifest.body["spec"]["commitSave"], true);
    }

    #[test]
    fn manifest_without_name_is_rejected() {
        let init = Init::default();

        assert!(matches!(
            Manifest::from_resource(&init),
            Err(ResourceGenerationError::MissingData(_))
        ));
    }

    #[test]
    fn set_keeps_dependency_order_and_skips_empty_groups() {
        let mut set = ManifestSet::default();
        set.push(ManifestCategory::Topolinks, vec![init("b")]);
        set.push(ManifestCategory::NodeUser, vec![]);
        set.push(ManifestCategory::Init, vec![init("a")]);

        let categories = set.categories().map(|(c, _)| c).collect::<Vec<_>>();

        assert_eq!(
            categories,
            vec![ManifestCategory::Init, ManifestCategory::Topolinks]
        );
        assert_eq!(set.len(), 2);
        assert!(set.get(ManifestCategory::NodeUser).is_empty());
    }

    #[test]
    fn combined_yaml_has_category_headers() {
        let mut set = ManifestSet::default();
        set.push(ManifestCategory::Init, vec![init("init-base")]);

        let yaml = set.to_combined_yaml().unwrap();

        assert!(yaml.starts_with("# --- INIT ---\n---\n"));
        assert!(yaml.contains("name: init-base"));
        assert_eq!(yaml.matches("\n---\n").count(), 1);
    }

    #[test]
    fn separate_files_are_written_per_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = ManifestSet::default();
        set.push(ManifestCategory::Init, vec![init("init-base")]);
        set.push(ManifestCategory::TopoNodes, vec![init("a"), init("b")]);

        set.write_separate(dir.path()).unwrap();

        let toponodes = fs::read_to_string(dir.path().join("toponodes.yaml")).unwrap();
        assert!(dir.path().join("init.yaml").is_file());
        assert_eq!(toponodes.matches("kind: Init").count(), 2);
        assert!(!dir.path().join("topolinks.yaml").exists());
    }
}
