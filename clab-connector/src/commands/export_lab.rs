use std::path::PathBuf;

use anyhow::Context;
use clab_connector_core::{export, kubernetes::operations::create_local_client};
use log::info;

use crate::cli::{ExportLabArgs, GlobalArgs};

pub async fn export_lab(global_args: GlobalArgs, args: ExportLabArgs) -> anyhow::Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&args.namespace));
    let client = create_local_client(&global_args.kube_config, &global_args.kube_context)
        .await
        .context("Couldn't initialize k8s API client!")?;

    info!("Exporting namespace '{}'...", args.namespace);
    let clab_file = export::export_lab(&client, &args.namespace, &output)
        .await
        .context(format!(
            "Failed to export lab from namespace '{}'!",
            args.namespace
        ))?;

    info!(
        "Exported {} nodes and {} links to {}",
        clab_file.topology.nodes.len(),
        clab_file.topology.links.len(),
        output.display()
    );

    Ok(())
}

fn default_output_path(namespace: &str) -> PathBuf {
    PathBuf::from(format!("{namespace}.clab.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_to_namespace_file() {
        assert_eq!(
            default_output_path("clab-lab"),
            PathBuf::from("clab-lab.clab.yaml")
        );
    }
}
