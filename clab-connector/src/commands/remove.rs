use clab_connector_core::{
    eda::{transaction::TransactionItem, EdaClient},
    topology::Topology,
};
use log::info;

use crate::{cli::RemoveArgs, config::ConnectorConfig};

pub async fn remove(args: RemoveArgs, config: ConnectorConfig) -> anyhow::Result<()> {
    let topology = Topology::from_file(&args.topology_data)?;
    let namespace = topology.namespace();
    let mut eda = EdaClient::new(config.connection(&args.eda)?)?;

    info!("== Removing namespace ==");
    info!("Removing namespace {namespace}");
    eda.add_item(namespace_removal(&namespace));
    eda.commit_transaction("remove namespace").await?;

    info!("Done!");

    Ok(())
}

/// The EDA Namespace resource is cluster scoped, hence the empty namespace.
fn namespace_removal(namespace: &str) -> TransactionItem {
    TransactionItem::delete("", "Namespace", namespace, None, None)
}

#[cfg(test)]
mod tests {
    use clab_connector_core::eda::transaction::TransactionOperation;

    use super::*;

    #[test]
    fn removal_deletes_the_eda_namespace() {
        let item = namespace_removal("clab-lab");

        let TransactionOperation::Delete {
            gvk,
            name,
            namespace,
        } = item.operation
        else {
            panic!("expected a delete operation");
        };

        assert_eq!(gvk.group, "core.eda.nokia.com");
        assert_eq!(gvk.kind, "Namespace");
        assert_eq!(name, "clab-lab");
        assert_eq!(namespace, "");
    }
}
