use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use advisor::api::{self, AppState, ProfileArgs};
use advisor::config::{Config, LogFormat};
use advisor::narrator::narrator_from_settings;
use advisor::plan::run_plan;

#[derive(Parser, Debug)]
#[command(
    name = "advisor",
    about = "Rule-based risk profiling, allocation and SIP vs FD projection"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the JSON HTTP API.
    Serve {
        #[arg(long, help = "Overrides the port from ADVISOR_LISTEN_ADDR")]
        port: Option<u16>,
    },
    /// Produce one advisory plan and print it as JSON.
    Project {
        #[command(flatten)]
        profile: ProfileArgs,
        #[arg(
            long,
            help = "Custom allocation as a JSON object, e.g. '{\"Equity\":60,\"Debt\":40}'"
        )]
        allocation_json: Option<String>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so `project` output stays pipeable.
    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);

    let narrator = narrator_from_settings(config.narrator);

    match cli.command {
        Command::Serve { port } => {
            let mut addr = config.listen_addr;
            if let Some(port) = port {
                addr.set_port(port);
            }
            api::run_http_server(addr, AppState::new(narrator))
                .await
                .context("HTTP server failed")?;
        }
        Command::Project {
            profile,
            allocation_json,
        } => {
            let profile = api::build_profile(profile)?;
            let allocation = allocation_json
                .as_deref()
                .map(api::parse_allocation_json)
                .transpose()?;
            let plan = run_plan(profile, allocation.as_ref(), narrator.as_ref()).await;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }

    Ok(())
}
