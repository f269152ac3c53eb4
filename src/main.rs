use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use defer::{
    app::Application,
    cli::{defer_options, parse_arg, Cli, Command},
    shutdown::{wait_for_shutdown_signal, ShutdownManager},
};
use defer_core::{init_logging, DeferSettings, Outcome};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let settings = DeferSettings::load(cli.config.as_deref()).with_context(|| {
        format!(
            "failed to load settings from {}",
            cli.config.as_deref().unwrap_or("default locations")
        )
    })?;

    let log_level = cli.log_level.as_deref().unwrap_or(&settings.logging.level);
    let log_format = cli.log_format.as_deref().unwrap_or(&settings.logging.format);
    init_logging(log_level, log_format)?;

    let app = Application::new(settings).await?;

    match cli.command {
        Command::Dispatch {
            task,
            args,
            handlers,
            reporter,
            configuration,
        } => {
            let options = defer_options(&handlers, reporter, configuration)?;
            let args = args.iter().map(|a| parse_arg(a)).collect();
            let outcome = app.dispatch(&task, args, &options).await?;
            println!("{outcome}");
            if app.accepted_in_memory(&outcome) {
                warn!("message_queue.type is in_memory; the queued capture is lost when this process exits");
            }
            if outcome == Outcome::NoneAccepted {
                return Ok(ExitCode::from(2));
            }
        }
        Command::Execute { payload, stdin } => {
            let payload = match (payload, stdin) {
                (Some(payload), false) => payload,
                (None, true) => {
                    let mut buffer = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut buffer)
                        .await
                        .context("failed to read capture from stdin")?;
                    buffer
                }
                _ => anyhow::bail!("execute needs a PAYLOAD argument or --stdin"),
            };
            let capture = app.execute(&payload).await?;
            info!(capture_id = %capture.id, task = capture.task_name(), "capture executed");
        }
        Command::Recover { handler, directory } => {
            let report = app.recover(&handler, directory.as_deref()).await?;
            println!(
                "replayed {}, failed {}, corrupt {}",
                report.replayed,
                report.failed,
                report.corrupt.len()
            );
            for path in &report.corrupt {
                warn!(path = %path.display(), "corrupt capture left in place");
            }
            if report.failed > 0 || !report.corrupt.is_empty() {
                return Ok(ExitCode::from(2));
            }
        }
        Command::Handlers => {
            for (name, description) in app.background().dispatcher().handlers().describe() {
                println!("{name:<16}{description}");
            }
        }
        Command::Consume { queue, once } => {
            let shutdown_manager = ShutdownManager::new();
            let shutdown_rx = shutdown_manager.subscribe().await;
            if !once {
                let manager = shutdown_manager.clone();
                tokio::spawn(async move {
                    wait_for_shutdown_signal().await;
                    manager.shutdown().await;
                });
            }

            let processed = app.consume(queue.as_deref(), once, shutdown_rx).await?;
            if once {
                println!("processed {processed}");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
