use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::generate::{DEFAULT_BATCH_SIZE, DEFAULT_CROSS_DOC_QUERIES, DEFAULT_NUM_QUERIES};
use crate::semantic::{DEFAULT_MODEL_ID, DEFAULT_SIMILARITY_MAX, DEFAULT_SIMILARITY_MIN};

#[derive(Parser, Debug)]
#[command(
    name = "perda-queryset",
    version,
    about = "Benchmark query-set synthesis over chunked local-regulation documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Generate(GenerateArgs),
    Inventory(InventoryArgs),
    Coverage(CoverageArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long)]
    pub chunks_dir: PathBuf,

    #[arg(long, default_value = "query_set_100_docs.json")]
    pub output_path: PathBuf,

    #[arg(long, default_value_t = DEFAULT_NUM_QUERIES)]
    pub num_queries: usize,

    #[arg(long, default_value_t = DEFAULT_CROSS_DOC_QUERIES)]
    pub cross_doc_queries: usize,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    #[arg(long, default_value_t = DEFAULT_SIMILARITY_MIN)]
    pub similarity_min: f64,

    #[arg(long, default_value_t = DEFAULT_SIMILARITY_MAX)]
    pub similarity_max: f64,

    #[arg(long = "cross-topic")]
    pub cross_topics: Vec<String>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long)]
    pub chunks_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CoverageArgs {
    #[arg(long)]
    pub chunks_dir: PathBuf,

    #[arg(long, default_value = "query_set_100_docs.json")]
    pub query_set_path: PathBuf,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub fail_on_unresolved: bool,
}
