//! Reachability of EDA, Keycloak and the Kubernetes cluster hosting EDA.

use std::fmt::Display;

use k8s_openapi::api::core::v1::{Namespace, Node};
use kube::{api::ListParams, Api, Client};
use serde::Serialize;

use crate::{
    eda::EdaClient,
    kubernetes::operations::{
        count_pods, namespace_exists, BOOTSTRAP_SERVER_SELECTOR, TOOLBOX_SELECTOR,
    },
    EDA_SYSTEM_NAMESPACE,
};

const SUPPORTED_MAJOR_VERSIONS: [&str; 3] = ["24", "25", "26"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unknown,
    Degraded,
    Unhealthy,
}

impl Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unknown => "unknown",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentHealth {
    pub component: &'static str,
    pub status: HealthStatus,
    pub message: String,
}

impl ComponentHealth {
    fn new(component: &'static str, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            component,
            status,
            message: message.into(),
        }
    }
}

/// Unhealthy if anything is, degraded if anything is degraded or unknown.
pub fn overall_status(results: &[ComponentHealth]) -> HealthStatus {
    match results.iter().map(|r| r.status).max() {
        None => HealthStatus::Unknown,
        Some(HealthStatus::Unknown) => HealthStatus::Degraded,
        Some(status) => status,
    }
}

pub async fn check_eda_connectivity(eda: &EdaClient) -> ComponentHealth {
    const NAME: &str = "EDA Connectivity";

    match eda.is_up().await {
        Ok(true) => ComponentHealth::new(NAME, HealthStatus::Healthy, "EDA is reachable"),
        Ok(false) => ComponentHealth::new(NAME, HealthStatus::Unhealthy, "EDA is not reachable"),
        Err(error) => ComponentHealth::new(
            NAME,
            HealthStatus::Unhealthy,
            format!("Connection failed: {error}"),
        ),
    }
}

pub async fn check_eda_authentication(eda: &mut EdaClient) -> ComponentHealth {
    const NAME: &str = "EDA Authentication";

    match eda.login().await {
        Ok(()) => ComponentHealth::new(NAME, HealthStatus::Healthy, "Authentication successful"),
        Err(error) => ComponentHealth::new(
            NAME,
            HealthStatus::Unhealthy,
            format!("Authentication error: {error}"),
        ),
    }
}

pub fn version_health(version: &str) -> ComponentHealth {
    const NAME: &str = "EDA Version";

    let major = version
        .trim_start_matches('v')
        .split('.')
        .next()
        .unwrap_or_default();

    if SUPPORTED_MAJOR_VERSIONS.contains(&major) {
        ComponentHealth::new(
            NAME,
            HealthStatus::Healthy,
            format!("Version {version} is supported"),
        )
    } else {
        ComponentHealth::new(
            NAME,
            HealthStatus::Degraded,
            format!("Version {version} may not be fully supported"),
        )
    }
}

pub async fn check_eda_version(eda: &mut EdaClient) -> ComponentHealth {
    match eda.version().await {
        Ok(version) => version_health(&version),
        Err(error) => ComponentHealth::new(
            "EDA Version",
            HealthStatus::Unhealthy,
            format!("Version check failed: {error}"),
        ),
    }
}

pub async fn check_kubernetes_connectivity(client: &Client) -> ComponentHealth {
    const NAME: &str = "Kubernetes Connectivity";

    let namespace_api: Api<Namespace> = Api::all(client.clone());
    match namespace_api.list_metadata(&ListParams::default().limit(1)).await {
        Ok(_) => ComponentHealth::new(NAME, HealthStatus::Healthy, "Kubernetes API is reachable"),
        Err(error) => ComponentHealth::new(
            NAME,
            HealthStatus::Unhealthy,
            format!("Kubernetes error: {error}"),
        ),
    }
}

pub fn node_readiness_health(total: usize, ready: usize) -> ComponentHealth {
    const NAME: &str = "Kubernetes Cluster";

    if ready == 0 {
        ComponentHealth::new(NAME, HealthStatus::Unhealthy, "No nodes are ready")
    } else if ready < total {
        ComponentHealth::new(
            NAME,
            HealthStatus::Degraded,
            format!("{ready}/{total} nodes ready"),
        )
    } else {
        ComponentHealth::new(
            NAME,
            HealthStatus::Healthy,
            format!("All {total} nodes ready"),
        )
    }
}

pub async fn check_kubernetes_cluster(client: &Client) -> ComponentHealth {
    let node_api: Api<Node> = Api::all(client.clone());

    match node_api.list(&ListParams::default()).await {
        Ok(nodes) => {
            let ready = nodes
                .items
                .iter()
                .filter(|node| {
                    node.status
                        .as_ref()
                        .and_then(|status| status.conditions.as_ref())
                        .is_some_and(|conditions| {
                            conditions
                                .iter()
                                .any(|c| c.type_ == "Ready" && c.status == "True")
                        })
                })
                .count();

            node_readiness_health(nodes.items.len(), ready)
        }
        Err(error) => ComponentHealth::new(
            "Kubernetes Cluster",
            HealthStatus::Unhealthy,
            format!("Node check failed: {error}"),
        ),
    }
}

/// `eda-system` exists and runs the toolbox and bootstrap server pods.
pub async fn check_eda_system(client: &Client) -> ComponentHealth {
    const NAME: &str = "EDA System Pods";

    match namespace_exists(client, EDA_SYSTEM_NAMESPACE).await {
        Ok(true) => {}
        Ok(false) => {
            return ComponentHealth::new(
                NAME,
                HealthStatus::Unhealthy,
                format!("Namespace {EDA_SYSTEM_NAMESPACE} not found"),
            )
        }
        Err(error) => {
            return ComponentHealth::new(
                NAME,
                HealthStatus::Unhealthy,
                format!("Namespace check failed: {error}"),
            )
        }
    }

    let mut missing = Vec::new();
    for (label, selector) in [
        ("toolbox", TOOLBOX_SELECTOR),
        ("bootstrap server", BOOTSTRAP_SERVER_SELECTOR),
    ] {
        match count_pods(client, selector).await {
            Ok(0) => missing.push(label),
            Ok(_) => {}
            Err(error) => {
                return ComponentHealth::new(
                    NAME,
                    HealthStatus::Unhealthy,
                    format!("Pod check failed: {error}"),
                )
            }
        }
    }

    if missing.is_empty() {
        ComponentHealth::new(NAME, HealthStatus::Healthy, "Toolbox and bootstrap server running")
    } else {
        ComponentHealth::new(
            NAME,
            HealthStatus::Unhealthy,
            format!("Missing pods: {}", missing.join(", ")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_versions_are_healthy() {
        assert_eq!(version_health("25.4.1").status, HealthStatus::Healthy);
        assert_eq!(version_health("v24.12.1").status, HealthStatus::Healthy);
        assert_eq!(version_health("23.10.1").status, HealthStatus::Degraded);
    }

    #[test]
    fn node_readiness_is_graded() {
        assert_eq!(node_readiness_health(3, 0).status, HealthStatus::Unhealthy);
        assert_eq!(node_readiness_health(3, 2).message, "2/3 nodes ready");
        assert_eq!(node_readiness_health(1, 1).status, HealthStatus::Healthy);
    }

    #[test]
    fn overall_status_is_the_worst_component() {
        let healthy = ComponentHealth::new("a", HealthStatus::Healthy, "");
        let unknown = ComponentHealth::new("b", HealthStatus::Unknown, "");
        let unhealthy = ComponentHealth::new("c", HealthStatus::Unhealthy, "");

        assert_eq!(overall_status(&[]), HealthStatus::Unknown);
        assert_eq!(overall_status(&[healthy.clone()]), HealthStatus::Healthy);
        assert_eq!(
            overall_status(&[healthy.clone(), unknown]),
            HealthStatus::Degraded
        );
        assert_eq!(overall_status(&[healthy, unhealthy]), HealthStatus::Unhealthy);
    }
}
