//! `depledger` — scan dependency manifests and report their licenses.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load override config ([`config::load_config`]).
//! 3. Load the license cache ([`cache`]); a corrupt cache falls back to empty.
//! 4. Discover manifest files under the root, or take them from argv ([`detector`]).
//! 5. Parse each manifest ([`analyzer`]); malformed files are logged and skipped.
//! 6. Resolve licenses through the cache and deps.dev ([`resolver`], [`registry`]).
//! 7. Apply ignore/override rules ([`config::apply_overrides`]).
//! 8. Save the cache and print the grouped report ([`report`]).

mod analyzer;
mod cache;
mod cli;
mod config;
mod detector;
mod error;
mod models;
mod registry;
mod report;
mod resolver;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use log::{error, warn};

use cache::Cache;
use cli::Cli;
use config::{apply_overrides, load_config};
use models::Ecosystem;
use registry::RegistryClient;
use report::LicenseReport;
use resolver::Resolver;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let root = cli.root.canonicalize().unwrap_or_else(|_| cli.root.clone());

    let config = load_config(&root, cli.config.as_deref())?;

    let cache_path = cli.cache.clone().unwrap_or_else(default_cache_path);
    let cache = match Cache::load(&cache_path) {
        Ok(cache) => cache,
        Err(err) => {
            warn!("{err}; continuing with an empty cache");
            Cache::empty(&cache_path)
        }
    };

    let types: Vec<Ecosystem> = cli.types.iter().map(Into::into).collect();
    // Manifests from argv are canonicalized like the root, so relative
    // invocations still relativize cleanly in the report.
    let manifests = if cli.manifests.is_empty() {
        detector::find_manifests(&root, cli.recurse, &types)
    } else {
        detector::canonicalize_manifests(&cli.manifests)
    };

    if manifests.is_empty() {
        eprintln!("No supported dependency manifests found in {}", root.display());
        std::process::exit(1);
    }

    // Per-file parse failures never abort the run; they are logged with the
    // path and the remaining manifests are still processed.
    let mut all_deps = Vec::new();
    let mut parsed_any = false;

    for path in &manifests {
        match analyzer::parse_manifest(path) {
            Ok(deps) => {
                parsed_any = true;
                if !cli.quiet {
                    eprintln!(
                        "  {} {} {} dependencies",
                        "→".cyan(),
                        path.display(),
                        deps.len()
                    );
                }
                all_deps.extend(deps);
            }
            Err(err) => error!("skipping {}: {err}", path.display()),
        }
    }

    if !parsed_any {
        eprintln!("None of the supplied manifests could be parsed");
        std::process::exit(1);
    }

    let client = RegistryClient::new()?;
    let mut resolver = Resolver::new(cache, client);

    // A registry transport error is fatal: an incomplete license report is
    // worse than none.
    resolver.resolve_all(&mut all_deps, cli.quiet).await?;

    if let Err(err) = resolver.save_cache() {
        warn!("could not save license cache to {}: {err}", cache_path.display());
    }

    let deps = apply_overrides(&config, all_deps);

    let report = LicenseReport::build(&root, &deps);
    println!("{}", report.render());

    Ok(())
}

fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("depledger").join("licenses.json"))
        .unwrap_or_else(|| PathBuf::from(".depledger-cache.json"))
}
