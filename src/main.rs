// src/main.rs

use dagflow::{cli, load_config, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("dagflow error: {err:?}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the run succeeded (a dry run counts as success).
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    let cfg = load_config(&args)?;
    logging::init_logging(args.log_level, cfg.log_level())?;

    let outcome = run(args, cfg).await?;
    Ok(outcome.is_none_or(|o| o.is_success()))
}
