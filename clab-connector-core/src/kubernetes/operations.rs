use std::{fmt::Debug, time::Duration};

use anyhow::{anyhow, Context};
use k8s_openapi::{
    api::core::v1::{Namespace, Pod},
    serde::de::DeserializeOwned,
    NamespaceResourceScope,
};
use kube::{
    api::{AttachParams, ListParams, Patch, PatchParams},
    config::{KubeConfigOptions, Kubeconfig},
    core::{ApiResource, DynamicObject, GroupVersionKind},
    Api, Client, Config, Resource,
};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::AsyncReadExt;

use crate::{helpers::pretty_type_name, EDA_CORE_GROUP, EDA_CORE_VERSION, EDA_SYSTEM_NAMESPACE};

pub const TOOLBOX_SELECTOR: &str = "eda.nokia.com/app=eda-toolbox";
pub const BOOTSTRAP_SERVER_SELECTOR: &str = "eda.nokia.com/app=bootstrapserver";

static TRANSACTION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Transaction (?<id>\d+)").unwrap());

pub async fn create_local_client(
    config_path: &Option<String>,
    context_name: &Option<String>,
) -> anyhow::Result<Client> {
    let config_options = KubeConfigOptions {
        context: context_name.to_owned(),
        ..Default::default()
    };

    let config = match config_path {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &config_options).await?
        }
        None => Config::from_kubeconfig(&config_options).await?,
    };

    let client = Client::try_from(config)?;

    Ok(client)
}

/// Name of the first pod in `eda-system` matching the label selector.
pub async fn find_pod_by_label(client: &Client, selector: &str) -> anyhow::Result<String> {
    let pod_api: Api<Pod> = Api::namespaced(client.clone(), EDA_SYSTEM_NAMESPACE);
    let pods = pod_api
        .list(&ListParams::default().labels(selector))
        .await
        .context(format!("Couldn't list pods matching '{selector}'!"))?;

    pods.items
        .into_iter()
        .find_map(|pod| pod.metadata.name)
        .ok_or_else(|| anyhow!("No pod matching '{selector}' found in '{EDA_SYSTEM_NAMESPACE}'!"))
}

/// Runs a command in an `eda-system` pod and returns its combined output.
pub async fn exec_in_pod(client: &Client, pod: &str, command: Vec<&str>) -> anyhow::Result<String> {
    let pod_api: Api<Pod> = Api::namespaced(client.clone(), EDA_SYSTEM_NAMESPACE);
    let attach_params = AttachParams {
        stdout: true,
        stderr: true,
        ..Default::default()
    };

    debug!("Executing {command:?} in pod '{pod}'");
    let mut exec = pod_api.exec(pod, command, &attach_params).await?;
    let mut output = String::new();

    exec.stdout()
        .ok_or_else(|| anyhow!("Couldn't retrieve the remote process standard output!"))?
        .read_to_string(&mut output)
        .await?;

    exec.stderr()
        .ok_or_else(|| anyhow!("Couldn't retrieve the remote process standard error!"))?
        .read_to_string(&mut output)
        .await?;

    exec.join().await?;
    debug!("{output}");

    Ok(output)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    AlreadyExists,
    Created { transaction: Option<u64> },
}

pub fn parse_bootstrap_output(output: &str) -> BootstrapOutcome {
    if output.contains("already exists") {
        return BootstrapOutcome::AlreadyExists;
    }

    BootstrapOutcome::Created {
        transaction: TRANSACTION_ID
            .captures(output)
            .and_then(|caps| caps.name("id"))
            .and_then(|id| id.as_str().parse().ok()),
    }
}

/// `edactl namespace bootstrap <namespace>` in the EDA toolbox pod.
pub async fn bootstrap_namespace(client: &Client, namespace: &str) -> anyhow::Result<BootstrapOutcome> {
    let toolbox = find_pod_by_label(client, TOOLBOX_SELECTOR).await?;
    let output = exec_in_pod(
        client,
        &toolbox,
        vec!["edactl", "namespace", "bootstrap", namespace],
    )
    .await
    .context(format!("Failed to bootstrap namespace {namespace}!"))?;

    let outcome = parse_bootstrap_output(&output);
    match outcome {
        BootstrapOutcome::AlreadyExists => {
            info!("Namespace {namespace} already exists, skipping bootstrap")
        }
        BootstrapOutcome::Created {
            transaction: Some(id),
        } => info!("Created namespace {namespace} (transaction {id})"),
        BootstrapOutcome::Created { transaction: None } => {
            info!("Created namespace {namespace}, no transaction id reported")
        }
    }

    Ok(outcome)
}

pub fn ping_succeeded(output: &str) -> bool {
    output.contains("1 packets transmitted, 1 received")
}

/// Pings the address once from the EDA bootstrap server pod.
pub async fn ping_from_bsvr(client: &Client, target_ip: &str) -> anyhow::Result<bool> {
    debug!("Pinging '{target_ip}' from the bootstrap server pod...");
    let bsvr = find_pod_by_label(client, BOOTSTRAP_SERVER_SELECTOR).await?;
    let output = exec_in_pod(client, &bsvr, vec!["ping", "-c", "1", target_ip]).await?;

    if ping_succeeded(&output) {
        info!("Ping from bootstrap server to {target_ip} succeeded");
        Ok(true)
    } else {
        warn!("Ping from bootstrap server to {target_ip} failed:\n{output}");
        Ok(false)
    }
}

pub async fn namespace_exists(client: &Client, namespace: &str) -> anyhow::Result<bool> {
    let namespace_api: Api<Namespace> = Api::all(client.clone());

    Ok(namespace_api.get_opt(namespace).await?.is_some())
}

pub async fn wait_for_namespace(
    client: &Client,
    namespace: &str,
    max_retries: u32,
    retry_delay: Duration,
) -> anyhow::Result<()> {
    for attempt in 1..=max_retries {
        if namespace_exists(client, namespace).await? {
            info!("Namespace {namespace} is available");
            return Ok(());
        }

        debug!("Waiting for namespace '{namespace}' (attempt {attempt}/{max_retries})");
        tokio::time::sleep(retry_delay).await;
    }

    Err(anyhow!("Timed out waiting for namespace {namespace}!"))
}

fn eda_namespace_api(client: &Client) -> Api<DynamicObject> {
    let gvk = GroupVersionKind::gvk(EDA_CORE_GROUP, EDA_CORE_VERSION, "Namespace");
    let resource = ApiResource::from_gvk_with_plural(&gvk, "namespaces");

    Api::namespaced_with(client.clone(), EDA_SYSTEM_NAMESPACE, &resource)
}

/// Sets `spec.description` of the EDA Namespace resource, waiting for EDA to
/// create it. Returns `false` if it never showed up.
pub async fn update_namespace_description(
    client: &Client,
    namespace: &str,
    description: &str,
    max_retries: u32,
    retry_delay: Duration,
) -> anyhow::Result<bool> {
    if !namespace_exists(client, namespace).await? {
        warn!("Kubernetes namespace '{namespace}' does not exist, can't update its EDA description!");
        return Ok(false);
    }

    let api = eda_namespace_api(client);
    let patch = serde_json::json!({ "spec": { "description": description } });

    for attempt in 1..=max_retries {
        match api
            .patch(namespace, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => {
                debug!("Namespace '{namespace}' patched with description");
                return Ok(true);
            }
            Err(kube::Error::Api(error)) if error.code == 404 => {
                info!(
                    "EDA namespace '{namespace}' not found (attempt {attempt}/{max_retries}), retrying in {}s...",
                    retry_delay.as_secs()
                );
                tokio::time::sleep(retry_delay).await;
            }
            Err(error) => {
                return Err(error).context(format!("Failed to patch namespace '{namespace}'!"))
            }
        }
    }

    warn!("Could not update description for namespace '{namespace}' after {max_retries} attempts");

    Ok(false)
}

pub async fn list_resources<T>(client: &Client, namespace: &str) -> anyhow::Result<Vec<T>>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let api: Api<T> = Api::namespaced(client.clone(), namespace);
    let resources = api.list(&ListParams::default()).await.context(format!(
        "Couldn't list {} resources in '{namespace}'!",
        pretty_type_name::<T>()
    ))?;

    Ok(resources.items)
}

/// Number of pods in `eda-system` matching the selector.
pub async fn count_pods(client: &Client, selector: &str) -> anyhow::Result<usize> {
    let pod_api: Api<Pod> = Api::namespaced(client.clone(), EDA_SYSTEM_NAMESPACE);

    Ok(pod_api
        .list_metadata(&ListParams::default().labels(selector))
        .await?
        .items
        .len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_output_reports_transaction() {
        assert_eq!(
            parse_bootstrap_output("Transaction 47 committed, namespace clab-lab created"),
            BootstrapOutcome::Created {
                transaction: Some(47)
            }
        );
        assert_eq!(
            parse_bootstrap_output("namespace created"),
            BootstrapOutcome::Created { transaction: None }
        );
    }

    #[test]
    fn bootstrap_output_detects_existing_namespace() {
        assert_eq!(
            parse_bootstrap_output("Error: namespace clab-lab already exists"),
            BootstrapOutcome::AlreadyExists
        );
    }

    #[test]
    fn ping_output_is_checked_for_reply() {
        assert!(ping_succeeded(
            "--- 10.0.0.1 ping statistics ---\n1 packets transmitted, 1 received, 0% packet loss"
        ));
        assert!(!ping_succeeded(
            "--- 10.0.0.1 ping statistics ---\n1 packets transmitted, 0 received, 100% packet loss"
        ));
    }
}
