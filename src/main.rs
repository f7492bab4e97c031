//! dricfg - Main entry point
//!
//! Thin command-line front end over the library: loads the three stores,
//! runs the consistency pipeline and persists the result.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, error, info};

use dricfg::cli::{Cli, Commands};
use dricfg::{config_file, EditSession, PolicyStore, SaveInclusion, SchemaStore, UserConfigStore};

/// Initialize the logger with appropriate settings
fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;

    Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env() // Allows RUST_LOG env var to override
        .init();
}

/// Load every `*.json` schema file from a directory, in file-name order.
///
/// File-name order doubles as the driver presentation and save order, so
/// it must be deterministic across runs.
fn load_schemas(dir: &Path) -> anyhow::Result<SchemaStore> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read schema directory {:?}", dir))?;

    let mut paths: Vec<PathBuf> = entries
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list schema directory {:?}", dir))?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut store = SchemaStore::new();
    for path in &paths {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {:?}", path))?;
        store
            .load_driver(&text)
            .with_context(|| format!("Failed to parse schema file {:?}", path))?;
        debug!("loaded schema from {:?}", path);
    }
    info!("loaded {} driver schema(s) from {:?}", store.drivers().len(), dir);
    Ok(store)
}

fn load_policy(path: Option<&Path>) -> anyhow::Result<PolicyStore> {
    match path {
        Some(path) => PolicyStore::load_from_file(path),
        None => Ok(PolicyStore::new()),
    }
}

/// Build a session over the three stores; construction runs the merge and
/// filter passes, so any cross-store inconsistency surfaces here.
fn build_session(
    schema_dir: &Path,
    policy: Option<&Path>,
    config: &Path,
) -> anyhow::Result<EditSession> {
    let schemas = load_schemas(schema_dir)?;
    let policy = load_policy(policy)?;
    let user: UserConfigStore = config_file::load_from_file(config)?;
    Ok(EditSession::new(schemas, policy, user)?)
}

fn run_check(schema_dir: &Path, policy: Option<&Path>, config: &Path) -> anyhow::Result<()> {
    let session = build_session(schema_dir, policy, config)?;

    let drivers = session.user_config().drivers.len();
    let applications: usize = session
        .user_config()
        .drivers
        .iter()
        .map(|d| d.applications.len())
        .sum();
    println!(
        "✓ Configuration is consistent: {} driver(s), {} application(s)",
        drivers, applications
    );
    Ok(())
}

fn run_normalize(
    schema_dir: &Path,
    policy: Option<&Path>,
    config: &Path,
    include: SaveInclusion,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut session = build_session(schema_dir, policy, config)?;
    session.set_save_inclusion(include);

    let target = output.unwrap_or(config);
    session.save_to(target)?;
    println!("✓ Normalized configuration written to {:?}", target);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse_args();

    let result = match &cli.command {
        Commands::Check {
            schema_dir,
            policy,
            config,
        } => run_check(schema_dir, policy.as_deref(), config),
        Commands::Normalize {
            schema_dir,
            policy,
            config,
            include,
            output,
        } => run_normalize(schema_dir, policy.as_deref(), config, *include, output.as_deref()),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
