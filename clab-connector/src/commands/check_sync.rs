use std::time::Duration;

use anyhow::{anyhow, Context};
use clab_connector_core::{
    eda::EdaClient,
    status::{NodeStatus, NodeSyncChecker, SyncSummary},
    topology::Topology,
    EDA_CORE_GROUP, EDA_CORE_VERSION,
};
use clab_connector_macros::TableOutputRow;
use log::{info, warn};
use serde::Serialize;

use crate::{
    cli::CheckSyncArgs,
    config::ConnectorConfig,
    output::{CliPrint, TableCellOption, TableOutputRow},
};

#[derive(Serialize, TableOutputRow)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusView {
    #[name_column]
    pub name: String,
    pub status: String,
    pub connectivity: TableCellOption<String>,
    #[table(header = "CONFIG")]
    pub config_state: TableCellOption<String>,
    pub details: String,
}

impl From<&NodeStatus> for NodeStatusView {
    fn from(value: &NodeStatus) -> Self {
        Self {
            name: value.name.clone(),
            status: value.status.to_string(),
            connectivity: value.connectivity.clone().into(),
            config_state: value.config.clone().into(),
            details: value.details().to_owned(),
        }
    }
}

pub async fn check_sync(args: CheckSyncArgs, config: ConnectorConfig) -> anyhow::Result<()> {
    let mut eda = EdaClient::new(config.connection(&args.eda)?)?;

    let (namespace, names) = match (&args.namespace, &args.topology_data) {
        (Some(namespace), _) => {
            let names = list_toponode_names(&mut eda, namespace).await?;
            (namespace.clone(), names)
        }
        (None, Some(path)) => {
            let topology = Topology::from_file(path)?;
            let names = topology
                .eda_nodes()
                .map(|node| node.eda_name())
                .collect::<Vec<_>>();
            (topology.namespace(), names)
        }
        (None, None) => return Err(anyhow!("Either a topology or a namespace is required!")),
    };

    if names.is_empty() {
        warn!("No EDA managed nodes found in namespace '{namespace}'");
        return Ok(());
    }

    let checker = NodeSyncChecker::connect(&mut eda, &namespace)
        .await
        .context("Couldn't log in to EDA!")?;

    let (ready, statuses) = if args.wait {
        checker
            .wait_for_nodes_ready(
                &names,
                Duration::from_secs(args.timeout),
                Duration::from_secs(args.interval),
            )
            .await
    } else {
        let statuses = checker.check_all(&names).await;
        (statuses.iter().all(NodeStatus::is_ready), statuses)
    };

    info!("Summary: {}", SyncSummary::from_statuses(&statuses));

    let views = statuses.iter().map(NodeStatusView::from).collect::<Vec<_>>();
    views.print(args.output)?;

    if args.wait && !ready {
        return Err(anyhow!(
            "Nodes in namespace '{namespace}' didn't synchronize within {}s!",
            args.timeout
        ));
    }

    Ok(())
}

fn toponodes_path(namespace: &str) -> String {
    format!("apps/{EDA_CORE_GROUP}/{EDA_CORE_VERSION}/namespaces/{namespace}/toponodes")
}

async fn list_toponode_names(eda: &mut EdaClient, namespace: &str) -> anyhow::Result<Vec<String>> {
    eda.ensure_login().await.context("Couldn't log in to EDA!")?;

    let list = eda
        .get_json_any(&[toponodes_path(namespace)])
        .await
        .context(format!("Couldn't list TopoNodes in namespace '{namespace}'!"))?
        .ok_or(anyhow!("Namespace '{namespace}' wasn't found in EDA!"))?;

    Ok(toponode_names(&list))
}

fn toponode_names(list: &serde_json::Value) -> Vec<String> {
    list["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["metadata"]["name"].as_str())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
