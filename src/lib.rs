// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod report;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile};
use crate::engine::{
    CoreRuntime, RegistryLauncher, Runtime, RuntimeEvent, TaskBehavior, TaskRegistry,
    TriggerReason,
};
use crate::errors::BazbuildError;
use crate::paths::PathResolver;
use crate::report::Interceptor;
use crate::tasks::setup_registry;
use crate::types::Category;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - task registry (pipelines, cleanup, watch)
/// - runtime + run launcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;
    if args.production {
        cfg = cfg.with_production_ready(true);
    }

    let root = config_root_dir(&config_path);

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let interceptor = Interceptor::from_config(&cfg);
    let registry = setup_registry(&cfg, &root, &interceptor, rt_tx.clone())?;

    if let Some(unknown) = args.tasks.iter().find(|t| !registry.contains(t)) {
        return Err(BazbuildError::UnknownTask(unknown.clone()).into());
    }

    if args.dry_run {
        print_dry_run(&cfg, &root, &registry, &args.tasks);
        return Ok(());
    }

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(tasks = ?args.tasks, root = ?root, "starting");
    rt_tx
        .send(RuntimeEvent::RunRequested {
            tasks: args.tasks.clone(),
            reason: TriggerReason::Manual,
        })
        .await?;

    let launcher = RegistryLauncher::new(Arc::new(registry), rt_tx);
    let runtime = Runtime::new(CoreRuntime::new(), rt_rx, launcher);
    runtime.run().await?;
    Ok(())
}

/// Source patterns and output directories are relative to the directory
/// holding the config file; a bare file name means the working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print resolved outputs and tasks without building anything.
fn print_dry_run(cfg: &ConfigFile, root: &Path, registry: &TaskRegistry, requested: &[String]) {
    let paths = PathResolver::new(cfg);

    println!("bazbuild dry-run");
    println!("  root = {}", root.display());
    println!("  css_preprocessor = {}", cfg.preprocessor);
    println!("  production_ready = {}", cfg.production_ready);
    println!("  header = {:?}", cfg.header_comment.text());
    println!();

    println!("outputs:");
    for category in Category::ALL {
        let dir = paths
            .resolve_output_directory(category)
            .unwrap_or_else(|e| format!("<{e}>"));
        match paths.resolve_output_file(category) {
            Ok(file) => println!("  {category}: {dir} (file {file})"),
            Err(_) => println!("  {category}: {dir}"),
        }
    }
    println!();

    println!("tasks ({}):", registry.iter().count());
    for (name, behavior) in registry.iter() {
        match behavior {
            TaskBehavior::Leaf(action) => println!("  - {name}: {}", action.describe()),
            TaskBehavior::Composite(children) => println!("  - {name}: [{}]", children.join(", ")),
        }
    }
    println!();

    println!("would run: {}", requested.join(", "));

    debug!("dry-run complete (no execution)");
}
