use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::anyhow;
use clab_connector_core::{
    eda::{EdaConnection, EdaConnectionBuilder},
    helpers::With,
};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::EdaArgs;

pub const DEFAULT_CONFIG_DIR: &str = ".clab-connector";
pub const DEFAULT_CONFIG_FILENAME: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConnectorConfigError {
    #[error("Config file '{}' couldn't be opened!", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config file '{}' is invalid!", .0.display())]
    Deserialization(PathBuf, #[source] serde_yaml::Error),
}

/// Optional defaults for the EDA connection, read from
/// `~/.clab-connector/config.yaml` unless another path is given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectorConfig {
    pub eda_url: Option<String>,
    pub eda_user: Option<String>,
    pub eda_password: Option<String>,
    pub kc_user: Option<String>,
    pub kc_password: Option<String>,
    pub kc_secret: Option<String>,
    pub verify: Option<bool>,
}

impl ConnectorConfig {
    pub fn default_path() -> Option<PathBuf> {
        home::home_dir().map(|d| {
            d.with(|d| d.push(DEFAULT_CONFIG_DIR))
                .with(|d| d.push(DEFAULT_CONFIG_FILENAME))
        })
    }

    /// Loads the config at `path`, or at the default location when `path`
    /// is unset. A missing default file yields an empty config.
    pub fn load(path: Option<&Path>) -> Result<Self, ConnectorConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_owned(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.is_file() {
            debug!("No connector config at {path:?}, using defaults");
            return Ok(Self::default());
        }

        debug!("Used config path: {path:?}");

        let contents =
            fs::read_to_string(&path).map_err(|e| ConnectorConfigError::Io(path.clone(), e))?;

        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&contents)
            .map_err(|e| ConnectorConfigError::Deserialization(path.clone(), e))
    }

    /// Merges CLI arguments over the config file values; unset values fall
    /// back to the builder defaults.
    pub fn connection(&self, args: &EdaArgs) -> anyhow::Result<EdaConnection> {
        let url = args
            .eda_url
            .as_ref()
            .or(self.eda_url.as_ref())
            .ok_or(anyhow!(
                "EDA URL is unspecified! Pass --eda-url or set 'edaUrl' in the config file."
            ))?;

        let mut builder = EdaConnectionBuilder::default();
        builder
            .url(normalize_eda_url(url))
            .verify(args.verify || self.verify.unwrap_or(false))
            .kc_secret(args.kc_secret.clone().or(self.kc_secret.clone()));

        if let Some(value) = args.eda_user.as_ref().or(self.eda_user.as_ref()) {
            builder.eda_user(value.as_str());
        }
        if let Some(value) = args.eda_password.as_ref().or(self.eda_password.as_ref()) {
            builder.eda_password(value.as_str());
        }
        if let Some(value) = args.kc_user.as_ref().or(self.kc_user.as_ref()) {
            builder.kc_user(value.as_str());
        }
        if let Some(value) = args.kc_password.as_ref().or(self.kc_password.as_ref()) {
            builder.kc_password(value.as_str());
        }

        Ok(builder.build()?)
    }
}

/// `https://` is assumed when the URL has no scheme.
pub fn normalize_eda_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');

    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_owned()
    } else {
        format!("https://{url}")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn urls_get_a_scheme() {
        assert_eq!(normalize_eda_url("10.0.0.1"), "https://10.0.0.1");
        assert_eq!(normalize_eda_url("https://eda.lab/"), "https://eda.lab");
        assert_eq!(normalize_eda_url("http://eda.lab:9200"), "http://eda.lab:9200");
    }

    #[test]
    fn config_file_is_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "edaUrl: eda.lab\nedaPassword: hunter2\nverify: true").unwrap();

        let config = ConnectorConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.eda_url.as_deref(), Some("eda.lab"));
        assert_eq!(config.eda_password.as_deref(), Some("hunter2"));
        assert_eq!(config.verify, Some(true));
        assert_eq!(config.kc_secret, None);
    }

    #[test]
    fn empty_config_file_is_default() {
        let file = NamedTempFile::new().unwrap();

        assert_eq!(
            ConnectorConfig::load(Some(file.path())).unwrap(),
            ConnectorConfig::default()
        );
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConnectorConfig::load(Some(&dir.path().join("missing.yaml")));

        assert!(matches!(result, Err(ConnectorConfigError::Io(..))));
    }

    #[test]
    fn cli_arguments_override_the_config_file() {
        let config = ConnectorConfig {
            eda_url: Some("eda.lab".into()),
            eda_user: Some("operator".into()),
            eda_password: Some("file-password".into()),
            ..Default::default()
        };
        let args = EdaArgs {
            eda_password: Some("cli-password".into()),
            ..Default::default()
        };

        let connection = config.connection(&args).unwrap();

        assert_eq!(connection.url, "https://eda.lab");
        assert_eq!(connection.eda_user, "operator");
        assert_eq!(connection.eda_password, "cli-password");
        assert_eq!(connection.kc_user, "admin");
        assert!(!connection.verify);
    }

    #[test]
    fn url_is_required() {
        assert!(ConnectorConfig::default()
            .connection(&EdaArgs::default())
            .is_err());
    }
}
