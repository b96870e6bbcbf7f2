use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "galaxy-inspector",
    version,
    about = "Review beam and synthesis spectra for a galaxy catalog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the catalog from the data directories unless it already exists.
    Import(ImportArgs),
    /// Review pending galaxies interactively from stdin.
    Review(ReviewArgs),
    /// Print the galaxy currently up for review.
    Show(ShowArgs),
    /// Save one judgment for the galaxy currently up for review.
    Submit(SubmitArgs),
    Status(StatusArgs),
    /// Write every saved judgment to a JSON file.
    Export(ExportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, env = "GALAXY_DB_PATH", default_value = "galaxy.sqlite")]
    pub db_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct DataDirArgs {
    #[arg(long, env = "GALAXY_BEAM_DIR", default_value = "data/beams")]
    pub beam_dir: PathBuf,

    #[arg(long, env = "GALAXY_SYNTHESIS_DIR", default_value = "data/synthesis")]
    pub synthesis_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub data: DataDirArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub data: DataDirArgs,

    #[arg(long, default_value_t = false)]
    pub skip_render: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub skip_render: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// `RFI,RIPPLE` for the next visible beam; repeat once per beam.
    #[arg(long = "beam", value_name = "RFI,RIPPLE")]
    pub beams: Vec<String>,

    #[arg(long, value_name = "SIGNAL,BASELINE", default_value = "1,1")]
    pub synthesis: String,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value = "results.json")]
    pub output: PathBuf,
}
