use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultsPolicy {
    Overwrite,
    Preserve,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "nsbackup",
    version,
    about = "Configure a namespace-scoped S3 backup target on a fleet hub cluster."
)]
pub struct CliArgs {
    /// kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Namespace that receives the backup config map and secret
    #[arg(long)]
    pub admin_namespace: Option<String>,

    /// Skip labelling the source cluster and the policy page hand-off
    #[arg(long)]
    pub skip_cluster_label: bool,

    /// Show the read-only license field
    #[arg(long)]
    pub show_license: bool,

    /// How fetched defaults treat edits made before the lists arrive
    #[arg(long, value_enum)]
    pub defaults: Option<DefaultsPolicy>,

    /// Console base URL used for the policy creation page
    #[arg(long)]
    pub console_url: Option<String>,

    /// Open the policy creation page after a successful submit
    #[arg(long)]
    pub open_browser: bool,

    /// Settings file (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
