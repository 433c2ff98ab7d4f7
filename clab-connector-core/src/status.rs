//! Synchronization state of TopoNodes as reported by EDA.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    time::{Duration, Instant},
};

use futures::future::join_all;
use log::{debug, error, info, log_enabled, warn, Level};
use serde::Serialize;

use crate::eda::{EdaClient, EdaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSyncStatus {
    Unknown,
    Pending,
    Syncing,
    Ready,
    Error,
    Timeout,
}

impl NodeSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeSyncStatus::Unknown => "unknown",
            NodeSyncStatus::Pending => "pending",
            NodeSyncStatus::Syncing => "syncing",
            NodeSyncStatus::Ready => "ready",
            NodeSyncStatus::Error => "error",
            NodeSyncStatus::Timeout => "timeout",
        }
    }
}

impl Display for NodeSyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub name: String,
    pub status: NodeSyncStatus,
    pub error_message: Option<String>,
    /// `npp-state` of the node
    pub connectivity: Option<String>,
    /// `node-state` of the node
    pub config: Option<String>,
}

/// String field at a JSON pointer, anything else is treated as absent.
fn text_at<'a>(data: &'a serde_json::Value, pointer: &str) -> Option<&'a str> {
    data.pointer(pointer).and_then(serde_json::Value::as_str)
}

impl NodeStatus {
    fn new(name: &str, status: NodeSyncStatus, error_message: Option<String>) -> Self {
        Self {
            name: name.to_owned(),
            status,
            error_message,
            connectivity: None,
            config: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == NodeSyncStatus::Ready
    }

    pub fn has_error(&self) -> bool {
        self.status == NodeSyncStatus::Error
    }

    /// Human readable explanation used in tables.
    pub fn details(&self) -> &str {
        if let Some(message) = &self.error_message {
            return message;
        }

        match self.status {
            NodeSyncStatus::Ready => "Node synced successfully",
            NodeSyncStatus::Syncing => "Configuration sync in progress",
            NodeSyncStatus::Pending => "Waiting for sync to start",
            _ => "Status unknown",
        }
    }

    /// Classifies a TopoNode document fetched from the EDA API.
    pub fn from_toponode(name: &str, data: Option<&serde_json::Value>) -> Self {
        let Some(data) = data else {
            debug!("No data available for node {name}");
            return Self::new(name, NodeSyncStatus::Unknown, Some("No data available".into()));
        };

        let mut node_status = Self::new(name, NodeSyncStatus::Unknown, None);

        if data.get("status").is_some_and(serde_json::Value::is_object) {
            let node_state = text_at(data, "/status/node-state");
            let npp_state = text_at(data, "/status/npp-state");
            let (sync_status, error_message) = evaluate_states(
                name,
                node_state,
                npp_state,
                text_at(data, "/status/node-details"),
                text_at(data, "/status/npp-details"),
            );

            node_status.status = sync_status;
            node_status.error_message = error_message;
            node_status.connectivity = npp_state.map(str::to_owned);
            node_status.config = node_state.map(str::to_owned);
        } else {
            debug!("No status data found for node {name}");
        }

        let active = text_at(data, "/spec/state") == Some("active");

        if node_status.status == NodeSyncStatus::Unknown && active {
            debug!("Node {name} has active spec state, treating as syncing");
            node_status.status = NodeSyncStatus::Syncing;
        }

        node_status
    }
}

/// Maps `node-state`/`npp-state` to a sync status and an optional message.
pub fn evaluate_states(
    name: &str,
    node_state: Option<&str>,
    npp_state: Option<&str>,
    node_details: Option<&str>,
    npp_details: Option<&str>,
) -> (NodeSyncStatus, Option<String>) {
    let (mut status, mut message) = match (node_state.filter(|s| !s.is_empty()), npp_state) {
        (Some("Synced"), _) => (NodeSyncStatus::Ready, None),
        (Some("Committing" | "RetryingCommit"), _) => (NodeSyncStatus::Syncing, None),
        (Some("TryingToConnect" | "WaitingForInitialCfg"), _) => (NodeSyncStatus::Pending, None),
        (Some("Standby"), _) => (
            NodeSyncStatus::Pending,
            Some("Node in standby mode".to_owned()),
        ),
        (Some("NoIpAddress"), _) => (
            NodeSyncStatus::Error,
            Some("No IP address available".to_owned()),
        ),
        (Some(other), _) => {
            debug!("Node {name} has unrecognized node-state: {other}, treating as pending");
            (NodeSyncStatus::Pending, None)
        }
        (None, Some("Connected")) => (NodeSyncStatus::Syncing, None),
        (None, Some(npp)) if !npp.is_empty() => (NodeSyncStatus::Pending, None),
        (None, _) => {
            debug!("Node {name} has no node-state or npp-state, keeping as unknown");
            (NodeSyncStatus::Unknown, None)
        }
    };

    let has_error = |details: Option<&str>| {
        details.is_some_and(|details| details.to_lowercase().contains("error"))
    };

    if has_error(node_details) || has_error(npp_details) {
        status = NodeSyncStatus::Error;
        message = Some(format!(
            "Node details: {}, NPP details: {}",
            node_details.unwrap_or("None"),
            npp_details.unwrap_or("None")
        ));
    }

    (status, message)
}

/// API paths under which different EDA releases serve a TopoNode.
pub fn toponode_api_paths(namespace: &str, name: &str) -> Vec<String> {
    vec![
        format!("apps/core.eda.nokia.com/v1/namespaces/{namespace}/toponodes/{name}"),
        format!("core/topology/v1/namespaces/{namespace}/toponodes/{name}"),
        format!("api/core/v1/namespaces/{namespace}/toponodes/{name}"),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub total: usize,
    pub ready: usize,
    pub syncing: usize,
    pub pending: usize,
    pub error: usize,
    pub unknown: usize,
}

impl SyncSummary {
    pub fn from_statuses(statuses: &[NodeStatus]) -> Self {
        statuses.iter().fold(
            Self {
                total: statuses.len(),
                ..Default::default()
            },
            |mut summary, node| {
                match node.status {
                    NodeSyncStatus::Ready => summary.ready += 1,
                    NodeSyncStatus::Syncing => summary.syncing += 1,
                    NodeSyncStatus::Pending => summary.pending += 1,
                    NodeSyncStatus::Error => summary.error += 1,
                    NodeSyncStatus::Unknown | NodeSyncStatus::Timeout => summary.unknown += 1,
                }
                summary
            },
        )
    }

    pub fn all_ready(&self) -> bool {
        self.ready == self.total
    }
}

impl Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} ready, {} syncing, {} pending, {} errors",
            self.ready, self.total, self.syncing, self.pending, self.error
        )
    }
}

pub struct NodeSyncChecker<'a> {
    eda: &'a EdaClient,
    namespace: String,
}

impl<'a> NodeSyncChecker<'a> {
    /// Logs the client in, queries can then be issued concurrently.
    pub async fn connect(eda: &'a mut EdaClient, namespace: &str) -> Result<Self, EdaError> {
        eda.ensure_login().await?;

        Ok(Self {
            eda,
            namespace: namespace.to_owned(),
        })
    }

    pub async fn check_node(&self, name: &str) -> NodeStatus {
        let paths = toponode_api_paths(&self.namespace, name);

        match self.eda.get_json_any(&paths).await {
            Ok(data) => {
                if log_enabled!(Level::Debug) {
                    if let Some(data) = &data {
                        debug!("Raw API response for {name}: {data:#}");
                    }
                }
                NodeStatus::from_toponode(name, data.as_ref())
            }
            Err(error) => {
                error!("Failed to check status for node {name}: {error}");
                NodeStatus::new(name, NodeSyncStatus::Error, Some(error.to_string()))
            }
        }
    }

    pub async fn check_all(&self, names: &[String]) -> Vec<NodeStatus> {
        info!("Checking synchronization status for {} nodes", names.len());

        join_all(names.iter().map(|name| self.check_node(name))).await
    }

    /// Polls until every node is ready or the timeout expires, logging each
    /// status change. Returns the last observed statuses.
    pub async fn wait_for_nodes_ready(
        &self,
        names: &[String],
        timeout: Duration,
        check_interval: Duration,
    ) -> (bool, Vec<NodeStatus>) {
        info!("Waiting for {} nodes to synchronize...", names.len());

        let start = Instant::now();
        let mut previous: BTreeMap<String, NodeSyncStatus> = BTreeMap::new();
        let mut reported_ready = BTreeSet::new();

        loop {
            let statuses = self.check_all(names).await;

            for node in &statuses {
                let changed = previous
                    .get(&node.name)
                    .is_some_and(|status| *status != node.status);

                if node.is_ready() {
                    if reported_ready.insert(node.name.clone()) {
                        info!("Node {} is ready", node.name);
                    }
                } else if changed {
                    match node.status {
                        NodeSyncStatus::Syncing => info!("Node {} is syncing...", node.name),
                        NodeSyncStatus::Pending => info!("Node {} is pending...", node.name),
                        NodeSyncStatus::Error => error!(
                            "Node {} error: {}",
                            node.name,
                            node.error_message.as_deref().unwrap_or_default()
                        ),
                        _ => {}
                    }
                }

                previous.insert(node.name.clone(), node.status);
            }

            let summary = SyncSummary::from_statuses(&statuses);
            if summary.all_ready() {
                return (true, statuses);
            }

            let Some(remaining) = timeout.checked_sub(start.elapsed()).filter(|r| !r.is_zero()) else {
                warn!("Timeout waiting for nodes to be ready after {}s ({summary})", timeout.as_secs());
                let statuses = statuses
                    .into_iter()
                    .map(|mut node| {
                        if !node.is_ready() && !node.has_error() {
                            node.status = NodeSyncStatus::Timeout;
                        }
                        node
                    })
                    .collect();

                return (false, statuses);
            };

            debug!("{summary}, next check in {:?}", check_interval.min(remaining));
            tokio::time::sleep(check_interval.min(remaining)).await;
        }
    }
}
