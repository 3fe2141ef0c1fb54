use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "pdf-outline",
    version,
    about = "Title and heading outline extraction from PDF text geometry"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Extract(ExtractArgs),
    Outline(OutlineArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExtractBackend {
    Pdftohtml,
    Json,
}

impl ExtractBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdftohtml => "pdftohtml",
            Self::Json => "json",
        }
    }

    pub fn input_extension(self) -> &'static str {
        match self {
            Self::Pdftohtml => "pdf",
            Self::Json => "json",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ExtractBackend::Pdftohtml)]
    pub backend: ExtractBackend,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub max_pages: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct OutlineArgs {
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ExtractBackend::Pdftohtml)]
    pub backend: ExtractBackend,

    #[arg(long)]
    pub config_path: Option<PathBuf>,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,

    #[arg(long)]
    pub jobs: Option<usize>,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,
}
