// src/lib.rs

//! `dagflow`: run a DAG of tasks concurrently, with fan-in barriers,
//! cooperative cancellation and a single completion signal per run.
//!
//! ```no_run
//! use dagflow::engine::{RunOutcome, Workflow};
//! use dagflow::task::task_fn;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> dagflow::errors::Result<()> {
//! let mut wf: Workflow<()> = Workflow::new();
//! let a = wf.add_node("a", task_fn(|_: &()| Ok(())))?;
//! let b = wf.add_node("b", task_fn(|_: &()| Ok(())))?;
//! wf.add_start_node(a)?;
//! wf.add_edge(a, b)?;
//! wf.connect_to_end(b)?;
//!
//! wf.start(CancellationToken::new(), ())?;
//! assert_eq!(wf.wait_for_completion().await?, RunOutcome::Succeeded);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dag;
pub mod demo;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod task;

use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_or_default};
use crate::demo::{DemoOptions, Wardrobe, build_dressing_workflow, describe};
use crate::engine::RunOutcome;

/// Resolve the config file for the demo binary.
///
/// - `--config PATH` must exist and be valid.
/// - Without it, `Dagflow.toml` is used if present.
/// - Otherwise every setting takes its default.
pub fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    Ok(load_or_default(
        args.config.as_deref(),
        &default_config_path(),
    )?)
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config + CLI overrides
/// - the demo graph
/// - Ctrl-C → cancellation
/// - start + wait
pub async fn run(args: CliArgs, cfg: ConfigFile) -> Result<Option<RunOutcome>> {
    let options = demo_options(&args, &cfg);
    let cancel = CancellationToken::new();
    let mut wf = build_dressing_workflow(&options, &cancel)?;

    if args.dry_run {
        print_dry_run(&options, &describe(&wf));
        return Ok(None);
    }

    // Ctrl-C → cancel; nodes not yet reached are skipped.
    {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if let Err(e) = res {
                        eprintln!("failed to listen for Ctrl+C: {e}");
                        return;
                    }
                    info!("Ctrl+C received; cancelling run");
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        });
    }

    wf.start(cancel.clone(), Wardrobe::new())?;
    let outcome = wf.wait_for_completion().await?;

    if let Some(wardrobe) = wf.context() {
        println!("worn: {}", wardrobe.worn().join(", "));
    }
    println!("outcome: {outcome}");

    // Stops the Ctrl-C listener.
    cancel.cancel();
    Ok(Some(outcome))
}

fn demo_options(args: &CliArgs, cfg: &ConfigFile) -> DemoOptions {
    let mut engine = cfg.engine_options();
    if args.max_concurrency.is_some() {
        engine.max_concurrency = args.max_concurrency;
    }

    DemoOptions {
        engine,
        task_delay: Duration::from_millis(cfg.demo.task_delay_ms),
        cancel_after: args.cancel_after.clone().or_else(|| cfg.demo.cancel_after.clone()),
        fail: args.fail.clone().or_else(|| cfg.demo.fail.clone()),
    }
}

fn print_dry_run(options: &DemoOptions, lines: &[String]) {
    println!("dagflow dry-run");
    println!("  engine.max_concurrency = {:?}", options.engine.max_concurrency);
    println!("  demo.task_delay = {:?}", options.task_delay);
    if let Some(task) = &options.cancel_after {
        println!("  demo.cancel_after = {task}");
    }
    if let Some(task) = &options.fail {
        println!("  demo.fail = {task}");
    }
    println!();

    println!("graph ({} nodes):", lines.len());
    for line in lines {
        println!("  {line}");
    }

    debug!("dry-run complete (no execution)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_overrides_config() {
        let args = CliArgs::try_parse_from([
            "dagflow",
            "--max-concurrency",
            "1",
            "--fail",
            "coat",
        ])
        .unwrap();
        let mut cfg = ConfigFile::default();
        cfg.engine.max_concurrency = Some(8);
        cfg.demo.fail = Some("socks".to_string());
        cfg.demo.cancel_after = Some("shirt".to_string());
        cfg.demo.task_delay_ms = 5;

        let options = demo_options(&args, &cfg);

        assert_eq!(options.engine.max_concurrency, Some(1));
        assert_eq!(options.fail.as_deref(), Some("coat"));
        assert_eq!(options.cancel_after.as_deref(), Some("shirt"));
        assert_eq!(options.task_delay, Duration::from_millis(5));
    }

    #[tokio::test]
    async fn dry_run_does_not_execute() {
        let args = CliArgs::try_parse_from(["dagflow", "--dry-run"]).unwrap();
        let outcome = run(args, ConfigFile::default()).await.unwrap();
        assert!(outcome.is_none());
    }
}
