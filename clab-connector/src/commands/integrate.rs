use std::time::Duration;

use anyhow::{anyhow, Context};
use clab_connector_core::{
    eda::{transaction::TransactionItem, EdaClient},
    kubernetes::{
        kubectl::{Kubectl, KubectlError},
        operations::{
            bootstrap_namespace, create_local_client, ping_from_bsvr,
            update_namespace_description, wait_for_namespace,
        },
    },
    resources::{generator::ManifestGenerator, ManifestCategory, ManifestSet},
    status::NodeSyncChecker,
    topology::{node::Node, Topology},
    EDA_SYSTEM_NAMESPACE,
};
use futures::future::join_all;
use kube::Client;
use log::{debug, error, info, warn};

use crate::{
    cli::{GlobalArgs, IntegrateArgs, DEFAULT_SYNC_INTERVAL},
    config::ConnectorConfig,
};

const NAMESPACE_WAIT_RETRIES: u32 = 10;
const NAMESPACE_WAIT_DELAY: Duration = Duration::from_secs(1);
const DESCRIPTION_RETRIES: u32 = 5;
const DESCRIPTION_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Transactions committed after the namespace, artifacts and security
/// profile exist, in dependency order.
const TRANSACTIONS: [(&[ManifestCategory], &str); 6] = [
    (&[ManifestCategory::Init], "create init (bootstrap)"),
    (
        &[ManifestCategory::NodeUserGroup, ManifestCategory::NodeUser],
        "create node users and groups",
    ),
    (&[ManifestCategory::NodeProfiles], "create node profiles"),
    (&[ManifestCategory::TopoNodes], "create nodes"),
    (
        &[ManifestCategory::TopolinkInterfaces],
        "create topolink interfaces",
    ),
    (&[ManifestCategory::Topolinks], "create topolinks"),
];

pub async fn integrate(
    global_args: GlobalArgs,
    args: IntegrateArgs,
    config: ConnectorConfig,
) -> anyhow::Result<()> {
    let topology = Topology::from_file(&args.topology_data)?;
    let namespace = topology.namespace();
    let manifests = ManifestGenerator::new(&topology)
        .skip_edge_links(args.skip_edge_intfs)
        .generate()
        .context("Couldn't generate EDA resources for the topology!")?;

    let client = create_local_client(&global_args.kube_config, &global_args.kube_context)
        .await
        .context("Couldn't initialize k8s API client!")?;

    check_connectivity(&client, &topology).await?;

    info!("== Running pre-checks ==");
    let mut eda = EdaClient::new(config.connection(&args.eda)?)?;
    prechecks(&mut eda).await?;

    info!("== Creating namespace ==");
    bootstrap_namespace(&client, &namespace).await?;
    wait_for_namespace(&client, &namespace, NAMESPACE_WAIT_RETRIES, NAMESPACE_WAIT_DELAY).await?;
    let description = format!("Containerlab {}: {}", topology.name, topology.clab_file_path);
    update_namespace_description(
        &client,
        &namespace,
        &description,
        DESCRIPTION_RETRIES,
        DESCRIPTION_RETRY_DELAY,
    )
    .await?;

    let kubectl = Kubectl::new(&global_args.kube_config, &global_args.kube_context);

    info!("== Creating artifacts ==");
    create_artifacts(&kubectl, &manifests)?;

    let (init, rest) = TRANSACTIONS.split_at(1);
    for (categories, description) in init {
        commit_categories(&mut eda, &manifests, categories, description).await?;
    }

    info!("== Creating node security profile ==");
    create_node_security_profile(&kubectl, &manifests, &namespace)?;

    for (categories, description) in rest {
        commit_categories(&mut eda, &manifests, categories, description).await?;
    }

    if args.enable_sync_check {
        info!("== Checking node synchronization ==");
        let names = topology
            .eda_nodes()
            .map(|node| node.eda_name())
            .collect::<Vec<_>>();
        let checker = NodeSyncChecker::connect(&mut eda, &namespace).await?;
        let (ready, _) = checker
            .wait_for_nodes_ready(
                &names,
                Duration::from_secs(args.sync_timeout),
                Duration::from_secs(DEFAULT_SYNC_INTERVAL),
            )
            .await;

        if !ready {
            warn!(
                "Not every node synchronized within {}s, check them with 'clab-connector check-sync'",
                args.sync_timeout
            );
        }
    }

    info!("Done!");

    Ok(())
}

/// Pings every EDA managed node from the bootstrap server.
async fn check_connectivity(client: &Client, topology: &Topology) -> anyhow::Result<()> {
    let targets = ping_targets(topology.eda_nodes())?;

    debug!("Pinging {} nodes from the bootstrap server", targets.len());

    let results = join_all(
        targets
            .iter()
            .map(|(_, ip)| ping_from_bsvr(client, ip)),
    )
    .await;

    for ((node, ip), result) in targets.iter().zip(results) {
        if !result? {
            return Err(anyhow!("Ping to '{}' ({ip}) failed!", node.name));
        }

        debug!("Ping to '{}' ({ip}) successful", node.name);
    }

    Ok(())
}

/// Management address of every node, a node without one can't be reached.
fn ping_targets<'a>(
    nodes: impl Iterator<Item = &'a Node>,
) -> anyhow::Result<Vec<(&'a Node, &'a str)>> {
    nodes
        .map(|node| match node.mgmt_ipv4.as_deref() {
            Some(ip) => Ok((node, ip)),
            None => Err(anyhow!(
                "Node '{}' has no management IPv4 address to ping!",
                node.name
            )),
        })
        .collect()
}

async fn prechecks(eda: &mut EdaClient) -> anyhow::Result<()> {
    if !eda.is_up().await.context("EDA not up or unreachable!")? {
        return Err(anyhow!("EDA not up or unreachable!"));
    }

    if !eda.is_authenticated().await {
        return Err(anyhow!("EDA credentials invalid!"));
    }

    Ok(())
}

fn create_artifacts(kubectl: &Kubectl, manifests: &ManifestSet) -> anyhow::Result<()> {
    for artifact in manifests.get(ManifestCategory::Artifacts) {
        match kubectl.apply_manifest(&artifact.to_yaml()?, EDA_SYSTEM_NAMESPACE) {
            Ok(_) => info!("Artifact '{}' created", artifact.name),
            Err(KubectlError::AlreadyExists(_)) => {
                info!("Artifact '{}' already exists", artifact.name)
            }
            Err(error) => error!("Error creating artifact '{}': {error}", artifact.name),
        }
    }

    Ok(())
}

fn create_node_security_profile(
    kubectl: &Kubectl,
    manifests: &ManifestSet,
    namespace: &str,
) -> anyhow::Result<()> {
    for profile in manifests.get(ManifestCategory::NodeSecurityProfile) {
        match kubectl.apply_manifest(&profile.to_yaml()?, namespace) {
            Ok(_) => info!("Node security profile created"),
            Err(KubectlError::AlreadyExists(_)) => {
                info!("Node security profile already exists, skipping")
            }
            Err(error) => {
                return Err(error).context(format!(
                    "Couldn't create node security profile '{}'!",
                    profile.name
                ))
            }
        }
    }

    Ok(())
}

/// Validates and queues every manifest of the categories, then commits them
/// as one transaction.
async fn commit_categories(
    eda: &mut EdaClient,
    manifests: &ManifestSet,
    categories: &[ManifestCategory],
    description: &str,
) -> anyhow::Result<()> {
    info!("== {} ==", capitalize(description));

    for category in categories {
        for manifest in manifests.get(*category) {
            eda.add_validated_item(TransactionItem::replace(manifest))
                .await
                .context(format!("Validation error for {category} resource '{}'", manifest.name))?;
        }
    }

    if eda.pending_items().is_empty() {
        debug!("Nothing to commit for '{description}'");
        return Ok(());
    }

    eda.commit_transaction(description).await?;

    Ok(())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transactions_follow_dependency_order() {
        let order = TRANSACTIONS
            .iter()
            .flat_map(|(categories, _)| categories.iter().copied())
            .collect::<Vec<_>>();

        let mut sorted = order.clone();
        sorted.sort();

        assert_eq!(order, sorted);
        assert_eq!(order[0], ManifestCategory::Init);
    }

    #[test]
    fn nodes_without_management_address_are_not_skipped() {
        let leaf = Node::new("leaf1", "nokia_srlinux", "", Some("24.10.1"))
            .with_mgmt(Some("172.20.20.3".into()), Some(24));
        let spine = Node::new("spine1", "nokia_srlinux", "", Some("24.10.1"));

        let targets = ping_targets([&leaf].into_iter()).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].1, "172.20.20.3");

        let error = ping_targets([&leaf, &spine].into_iter()).unwrap_err();
        assert!(error.to_string().contains("spine1"));
    }

    #[test]
    fn stage_headers_are_capitalized() {
        assert_eq!(capitalize("create nodes"), "Create nodes");
        assert_eq!(capitalize(""), "");
    }
}
