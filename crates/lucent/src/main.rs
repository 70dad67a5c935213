use anyhow::{Context, anyhow};
use clap::Parser;
use lucent_engine::cli::{self, FileOptions, OutputHandlers, ReplOptions};
use lucent_engine::config::{ConfigLoader, LucentConfig};
use lucent_engine::driver::Driver;
use lucent_engine::executor::CommandExecutor;
use lucent_engine::http_judge::HttpJudge;
use lucent_engine::loading::LoadingDetector;
use lucent_engine::verifier::Verifier;
use lucent_h::HeadlessDriver;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lucent", version, about = "Drive a browser by accessibility node id and verify page state")]
struct Args {
    /// Config file (defaults to ./lucent.yaml, then ~/.lucent/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Launch browser in visible mode (not headless)
    #[arg(long)]
    visible: bool,

    /// Base URL of the judgment service
    #[arg(long, default_value = "http://127.0.0.1:8787/")]
    judge: String,

    /// Script to execute (non-interactive mode)
    #[arg(long)]
    file: Option<String>,

    /// Keep running a script after a failing line
    #[arg(long)]
    keep_going: bool,

    /// Count a negative verification as a failing line
    #[arg(long)]
    strict: bool,
}

async fn load_config(args: &Args) -> anyhow::Result<LucentConfig> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    config.browser.visible |= args.visible;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args).await?;

    let judge = HttpJudge::new(&args.judge).context("invalid --judge url")?;
    let verifier = Verifier::new(
        judge.clone(),
        LoadingDetector::new(judge, config.loading),
        config.verification,
    );
    let mut executor = CommandExecutor::new(verifier);

    let mut driver = HeadlessDriver::new(config);
    driver.launch().await.context("failed to launch browser")?;

    let output = OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    };

    let outcome = if let Some(file_path) = &args.file {
        cli::run_file(
            &driver,
            &mut executor,
            output,
            file_path,
            FileOptions {
                stop_on_error: !args.keep_going,
                fail_on_verification: args.strict,
            },
        )
        .await
        .map_err(|e| anyhow!("Error executing file {}: {}", file_path, e))
        .and_then(|summary| {
            tracing::info!(
                "Ran {} commands, {} failed",
                summary.executed,
                summary.failed
            );
            if summary.failed > 0 {
                Err(anyhow!("{} of {} commands failed", summary.failed, summary.executed))
            } else {
                Ok(())
            }
        })
    } else {
        cli::run_repl(
            &driver,
            &mut executor,
            output,
            ReplOptions {
                banner_lines: &[
                    "Browser launched. Enter commands (e.g., 'goto example.com', 'click 12').",
                    "Verify page state with: verify \"the total shows 3\"",
                    "Type 'exit' or 'quit' to close.",
                ],
                prompt: "> ",
                exit_commands: &["exit", "quit"],
            },
        )
        .await
        .map_err(|e| anyhow!("Error during session: {}", e))
    };

    finish(outcome, driver.close().await)
}

/// The session outcome wins over a failed shutdown, which is only logged.
fn finish<E: std::fmt::Display>(
    outcome: anyhow::Result<()>,
    closed: Result<(), E>,
) -> anyhow::Result<()> {
    match closed {
        Ok(()) => outcome,
        Err(e) if outcome.is_err() => {
            tracing::warn!("Failed to close browser: {}", e);
            outcome
        }
        Err(e) => Err(anyhow!("Failed to close browser: {}", e)),
    }
}
