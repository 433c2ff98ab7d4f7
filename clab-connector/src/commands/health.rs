use anyhow::anyhow;
use clab_connector_core::{
    eda::EdaClient,
    health::{
        check_eda_authentication, check_eda_connectivity, check_eda_system, check_eda_version,
        check_kubernetes_cluster, check_kubernetes_connectivity, overall_status, ComponentHealth,
        HealthStatus,
    },
    kubernetes::operations::create_local_client,
};
use clab_connector_macros::TableOutputRow;
use log::{info, warn};
use serde::Serialize;

use crate::{
    cli::{GlobalArgs, HealthArgs},
    config::ConnectorConfig,
    output::{CliPrint, TableOutputRow},
};

#[derive(Serialize, TableOutputRow)]
pub struct HealthView {
    #[name_column]
    pub component: String,
    pub status: String,
    pub message: String,
}

impl From<&ComponentHealth> for HealthView {
    fn from(value: &ComponentHealth) -> Self {
        Self {
            component: value.component.to_owned(),
            status: value.status.to_string(),
            message: value.message.clone(),
        }
    }
}

pub async fn health(
    global_args: GlobalArgs,
    args: HealthArgs,
    config: ConnectorConfig,
) -> anyhow::Result<()> {
    let mut results = Vec::new();

    let mut eda = EdaClient::new(config.connection(&args.eda)?)?;
    results.push(check_eda_connectivity(&eda).await);
    results.push(check_eda_authentication(&mut eda).await);
    results.push(check_eda_version(&mut eda).await);

    if !args.skip_kubernetes {
        match create_local_client(&global_args.kube_config, &global_args.kube_context).await {
            Ok(client) => {
                results.push(check_kubernetes_connectivity(&client).await);
                results.push(check_kubernetes_cluster(&client).await);
                results.push(check_eda_system(&client).await);
            }
            Err(error) => {
                warn!("Couldn't initialize k8s API client: {error}");
                results.push(kubernetes_client_failure(&error));
            }
        }
    }

    let overall = overall_status(&results);
    info!("Overall health: {overall}");

    let views = results.iter().map(HealthView::from).collect::<Vec<_>>();
    views.print(args.output)?;

    if overall == HealthStatus::Unhealthy {
        return Err(anyhow!("The environment is unhealthy!"));
    }

    Ok(())
}

fn kubernetes_client_failure(error: &impl std::fmt::Display) -> ComponentHealth {
    ComponentHealth {
        component: "Kubernetes Connectivity",
        status: HealthStatus::Unhealthy,
        message: format!("Couldn't create client: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_failure_marks_kubernetes_unhealthy() {
        let health = kubernetes_client_failure(&"no kubeconfig");

        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(overall_status(&[health.clone()]), HealthStatus::Unhealthy);

        let view = HealthView::from(&health);
        assert_eq!(view.get_name(), "Kubernetes Connectivity");
        assert_eq!(
            view.get_row(),
            vec![
                "Kubernetes Connectivity",
                "unhealthy",
                "Couldn't create client: no kubeconfig"
            ]
        );
    }
}
