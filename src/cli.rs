use std::path::PathBuf;

use clap::Parser;

use crate::models::Ecosystem;

#[derive(Parser, Debug)]
#[command(
    name = "depledger",
    about = "Extract dependency declarations from build manifests and report their licenses",
    version
)]
pub struct Cli {
    /// Manifest files to process; when empty, manifests are discovered under --root
    pub manifests: Vec<PathBuf>,

    /// Directory to scan for manifests and to relativize report paths against
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Descend into subdirectories when discovering manifests
    #[arg(short, long)]
    pub recurse: bool,

    /// Restrict discovery to an ecosystem (repeatable)
    #[arg(short = 't', long = "type", value_name = "ECOSYSTEM")]
    pub types: Vec<EcosystemArg>,

    /// License cache file [default: <cache dir>/depledger/licenses.json]
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Override config file [default: ./.depledger.toml, fallback ~/.config/depledger/config.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum EcosystemArg {
    Go,
    Npm,
    Maven,
    Cargo,
    Pypi,
}

impl From<&EcosystemArg> for Ecosystem {
    fn from(arg: &EcosystemArg) -> Self {
        match arg {
            EcosystemArg::Go => Ecosystem::Go,
            EcosystemArg::Npm => Ecosystem::Npm,
            EcosystemArg::Maven => Ecosystem::Maven,
            EcosystemArg::Cargo => Ecosystem::Cargo,
            EcosystemArg::Pypi => Ecosystem::Pypi,
        }
    }
}
