//! Items of an EDA transaction as accepted by `core/transaction/*`.

use serde::Serialize;

use crate::{resources::Manifest, EDA_CORE_GROUP, EDA_CORE_VERSION};

/// Transaction API generation served by an EDA release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionApi {
    V1,
    V2,
}

impl TransactionApi {
    /// Only the 24.x releases still use the v1 API.
    pub fn for_version(version: &str) -> Self {
        let major = version
            .trim_start_matches('v')
            .split('.')
            .next()
            .and_then(|major| major.parse::<u32>().ok())
            .unwrap_or_default();

        match major {
            24 => TransactionApi::V1,
            _ => TransactionApi::V2,
        }
    }

    pub fn commit_path(&self) -> &'static str {
        match self {
            TransactionApi::V1 => "core/transaction/v1",
            TransactionApi::V2 => "core/transaction/v2",
        }
    }

    pub fn validate_path(&self) -> &'static str {
        match self {
            TransactionApi::V1 => "core/transaction/v1/validate",
            TransactionApi::V2 => "core/transaction/v2/validate",
        }
    }

    pub fn result_path(&self, id: &str) -> String {
        match self {
            TransactionApi::V1 => format!(
                "core/transaction/v1/details/{id}?waitForComplete=true&failOnErrors=true"
            ),
            TransactionApi::V2 => format!("core/transaction/v2/result/summary/{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionItem {
    #[serde(rename = "type")]
    pub operation: TransactionOperation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionOperation {
    Create {
        value: serde_json::Value,
    },
    Replace {
        value: serde_json::Value,
    },
    Delete {
        gvk: TransactionGvk,
        name: String,
        namespace: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionGvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl TransactionItem {
    pub fn create(manifest: &Manifest) -> Self {
        Self {
            operation: TransactionOperation::Create {
                value: manifest.body.clone(),
            },
        }
    }

    pub fn replace(manifest: &Manifest) -> Self {
        Self {
            operation: TransactionOperation::Replace {
                value: manifest.body.clone(),
            },
        }
    }

    /// Deletion of a resource, group and version default to EDA core.
    pub fn delete(
        namespace: &str,
        kind: &str,
        name: &str,
        group: Option<&str>,
        version: Option<&str>,
    ) -> Self {
        Self {
            operation: TransactionOperation::Delete {
                gvk: TransactionGvk {
                    group: group.unwrap_or(EDA_CORE_GROUP).to_owned(),
                    version: version.unwrap_or(EDA_CORE_VERSION).to_owned(),
                    kind: kind.to_owned(),
                },
                name: name.to_owned(),
                namespace: namespace.to_owned(),
            },
        }
    }

    /// `Kind/name` of the resource the item refers to.
    pub fn describe(&self) -> String {
        match &self.operation {
            TransactionOperation::Create { value } | TransactionOperation::Replace { value } => {
                format!(
                    "{}/{}",
                    value["kind"].as_str().unwrap_or("?"),
                    value["metadata"]["name"].as_str().unwrap_or("?")
                )
            }
            TransactionOperation::Delete { gvk, name, .. } => format!("{}/{name}", gvk.kind),
        }
    }
}

/// Body posted to commit a transaction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest<'a> {
    pub description: &'a str,
    pub dryrun: bool,
    pub result_type: &'a str,
    pub retain: bool,
    pub crs: &'a [TransactionItem],
}
