use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use defer_core::{HandlerChain, HandlerSpec};
use defer_dispatcher::DeferOptions;
use serde_json::Value;

/// Command line interface of the `defer` binary.
#[derive(Parser, Debug)]
#[command(name = "defer")]
#[command(version)]
#[command(about = "Defer work to in-process, child process, message queue or disk handlers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (TOML). Defaults to config/defer.toml when present.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Overrides logging.level from the settings
    #[arg(short, long, global = true, value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: Option<String>,

    /// Overrides logging.format from the settings
    #[arg(long, global = true, value_parser = ["json", "pretty"])]
    pub log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture a registered task and dispatch it
    Dispatch {
        /// Registered task name
        task: String,
        /// Task arguments; each is parsed as JSON and kept as a string otherwise
        args: Vec<String>,
        /// Handler to try, repeat for a fallback chain (`disk`, `message_queue:queue=mail`)
        #[arg(long = "handler", value_name = "SPEC")]
        handlers: Vec<String>,
        /// Reporter for failed attempts
        #[arg(long)]
        reporter: Option<String>,
        /// Named configuration to resolve handler and reporter from
        #[arg(long)]
        configuration: Option<String>,
    },
    /// Run a capture handed over by the fork or runner handler
    Execute {
        /// Base64 or JSON encoded capture
        payload: Option<String>,
        /// Read the capture from standard input
        #[arg(long, conflicts_with = "payload")]
        stdin: bool,
    },
    /// Replay captures persisted by the disk handler
    Recover {
        /// Handler the persisted captures are replayed against
        #[arg(long, default_value = "in_process")]
        handler: String,
        /// Directory to sweep instead of disk.directory, e.g. one given to
        /// the disk handler's `directory` option
        #[arg(long)]
        directory: Option<String>,
    },
    /// List the registered handlers
    Handlers,
    /// Run captures published by the message_queue handler
    Consume {
        /// Queue to consume; defaults to message_queue.default_queue
        #[arg(long)]
        queue: Option<String>,
        /// Drain the queue once and exit instead of polling until shutdown
        #[arg(long)]
        once: bool,
    },
}

/// Parses a command line argument as JSON, falling back to a JSON string.
pub fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Builds per-call options from the `dispatch` flags. Handler specs use the
/// `name[:key=value,...]` form.
pub fn defer_options(
    handlers: &[String],
    reporter: Option<String>,
    configuration: Option<String>,
) -> Result<DeferOptions> {
    let mut options = DeferOptions::new();
    if !handlers.is_empty() {
        let specs = handlers
            .iter()
            .map(|raw| {
                raw.parse::<HandlerSpec>()
                    .with_context(|| format!("invalid --handler value '{raw}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        options = options.handler(HandlerChain::new(specs));
    }
    options.reporter = reporter;
    options.configuration = configuration;
    Ok(options)
}
