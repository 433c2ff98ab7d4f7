use std::{fs, path::Path};

use anyhow::Context;
use clab_connector_core::{
    resources::{generator::ManifestGenerator, ManifestSet},
    topology::Topology,
};
use log::info;

use crate::cli::{GenerateCrsArgs, DEFAULT_MANIFESTS_DIR};

pub fn generate_crs(args: GenerateCrsArgs) -> anyhow::Result<()> {
    let topology = Topology::from_file(&args.topology_data)?;
    let manifests = ManifestGenerator::new(&topology)
        .skip_edge_links(args.skip_edge_intfs)
        .generate()
        .context("Couldn't generate EDA resources for the topology!")?;

    info!(
        "Generated {} manifests for topology '{}'",
        manifests.len(),
        topology.name
    );

    write_manifests(&manifests, args.output.as_deref(), args.separate)
}

fn write_manifests(
    manifests: &ManifestSet,
    output: Option<&Path>,
    separate: bool,
) -> anyhow::Result<()> {
    if separate {
        let dir = output.unwrap_or(Path::new(DEFAULT_MANIFESTS_DIR));
        manifests.write_separate(dir)?;
        info!("Separate manifest files written to {}", dir.display());

        return Ok(());
    }

    let combined = manifests.to_combined_yaml()?;

    match output {
        Some(path) => {
            fs::write(path, combined)
                .context(format!("Couldn't write manifests to '{}'!", path.display()))?;
            info!("Combined manifest written to {}", path.display());
        }
        None => print!("{combined}"),
    }

    Ok(())
}
