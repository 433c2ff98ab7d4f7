use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub const DEFAULT_SYNC_TIMEOUT: u64 = 90;
pub const DEFAULT_SYNC_INTERVAL: u64 = 10;
pub const DEFAULT_MANIFESTS_DIR: &str = "manifests";

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    #[command(flatten)]
    pub global_args: GlobalArgs,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// override default kubeconfig
    #[arg(long, global = true)]
    pub kube_config: Option<String>,
    /// override default kubeconfig context
    #[arg(long, global = true)]
    pub kube_context: Option<String>,
    /// connector config file with default EDA connection settings
    /// (~/.clab-connector/config.yaml if unset)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// logging level
    #[arg(short = 'l', long, global = true, value_enum, default_value_t = LogLevel::Warning)]
    pub log_level: LogLevel,
    /// write logs to this file instead of stderr
    #[arg(short = 'f', long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Subcommand)]
#[command(arg_required_else_help = true)]
pub enum Commands {
    /// integrate a deployed containerlab topology with EDA
    #[command(alias = "i")]
    Integrate(IntegrateArgs),
    /// remove a containerlab integration from EDA
    #[command(alias = "r")]
    Remove(RemoveArgs),
    /// export an EDA-managed topology from a namespace to a .clab.yaml file
    ExportLab(ExportLabArgs),
    /// generate CR YAML manifests from a containerlab topology without applying them
    GenerateCrs(GenerateCrsArgs),
    /// check the synchronization status of the topology nodes in EDA
    CheckSync(CheckSyncArgs),
    /// check EDA and Kubernetes reachability
    Health(HealthArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct EdaArgs {
    /// EDA deployment URL (hostname or IP, https:// is assumed)
    #[arg(short = 'e', long)]
    pub eda_url: Option<String>,
    /// EDA username (realm 'eda') [default: admin]
    #[arg(long)]
    pub eda_user: Option<String>,
    /// EDA user password (realm 'eda') [default: admin]
    #[arg(long)]
    pub eda_password: Option<String>,
    /// Keycloak master realm admin user [default: admin]
    #[arg(long)]
    pub kc_user: Option<String>,
    /// Keycloak master realm admin password [default: admin]
    #[arg(long)]
    pub kc_password: Option<String>,
    /// EDA client secret, skips the Keycloak admin flow when set
    #[arg(long)]
    pub kc_secret: Option<String>,
    /// enable TLS certificate verification
    #[arg(long)]
    pub verify: bool,
}

#[derive(Debug, Args)]
pub struct IntegrateArgs {
    /// path to the containerlab topology-data.json file
    #[arg(short = 't', long)]
    pub topology_data: PathBuf,
    #[command(flatten)]
    pub eda: EdaArgs,
    /// don't create TopoLinks and interfaces for links towards linux nodes
    #[arg(long)]
    pub skip_edge_intfs: bool,
    /// wait for the nodes to synchronize with EDA after the integration
    #[arg(long)]
    pub enable_sync_check: bool,
    /// how long to wait for the nodes to synchronize, in seconds
    #[arg(long, default_value_t = DEFAULT_SYNC_TIMEOUT)]
    pub sync_timeout: u64,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// path to the containerlab topology-data.json file
    #[arg(short = 't', long)]
    pub topology_data: PathBuf,
    #[command(flatten)]
    pub eda: EdaArgs,
}

#[derive(Debug, Args)]
pub struct ExportLabArgs {
    /// namespace containing the TopoNodes and TopoLinks
    #[arg(short = 'n', long)]
    pub namespace: String,
    /// output .clab.yaml file (<namespace>.clab.yaml if unset)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct GenerateCrsArgs {
    /// path to the containerlab topology-data.json file
    #[arg(short = 't', long)]
    pub topology_data: PathBuf,
    /// output file for the combined manifest, or the output directory with --separate
    ///
    /// the combined manifest is printed to stdout when unset
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
    /// write one file per resource category instead of one combined file
    #[arg(long)]
    pub separate: bool,
    /// don't generate TopoLinks and interfaces for links towards linux nodes
    #[arg(long)]
    pub skip_edge_intfs: bool,
}

#[derive(Debug, Args)]
pub struct CheckSyncArgs {
    /// path to the containerlab topology-data.json file
    #[arg(short = 't', long, required_unless_present = "namespace")]
    pub topology_data: Option<PathBuf>,
    /// check every TopoNode of this namespace instead of the topology nodes
    #[arg(short = 'n', long, conflicts_with = "topology_data")]
    pub namespace: Option<String>,
    #[command(flatten)]
    pub eda: EdaArgs,
    /// poll until every node is ready or the timeout expires
    #[arg(short = 'w', long)]
    pub wait: bool,
    /// how long to wait with --wait, in seconds
    #[arg(long, default_value_t = DEFAULT_SYNC_TIMEOUT)]
    pub timeout: u64,
    /// seconds between two checks with --wait
    #[arg(long, default_value_t = DEFAULT_SYNC_INTERVAL)]
    pub interval: u64,
    /// output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::TableWithHeaders)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct HealthArgs {
    #[command(flatten)]
    pub eda: EdaArgs,
    /// skip the Kubernetes checks
    #[arg(long)]
    pub skip_kubernetes: bool,
    /// output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::TableWithHeaders)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    #[value(name = "names")]
    Names,
    #[value(name = "table")]
    Table,
    #[value(name = "table-with-headers")]
    TableWithHeaders,
    #[value(name = "json")]
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
    #[value(name = "yaml")]
    Yaml,
}
