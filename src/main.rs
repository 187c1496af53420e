use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ec2emu::config::Config;
use ec2emu::context::Context;
use ec2emu::params::RawParams;
use ec2emu::resource::dispatch::ACTIONS;
use ec2emu::response::WireResponse;
use ec2emu::server;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// In-memory EC2 Query API emulator
#[derive(Parser, Debug)]
#[command(name = "ec2emu", version = ec2emu::VERSION, about, long_about = None)]
struct Args {
    /// Account id reported as the owner of created resources
    #[arg(long)]
    account_id: Option<String>,

    /// Region used to derive availability zones
    #[arg(short, long)]
    region: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one action, e.g. `call CreateVpc CidrBlock=10.0.0.0/16`
    Call {
        action: String,
        /// Parameters as Key=Value
        params: Vec<String>,
    },
    /// Run one URL-encoded query string
    Query { query: String },
    /// Read one query string per stdin line, write one response per line
    Serve,
    /// List the supported actions
    Actions,
    /// Write the effective account id and region to the config file
    SaveConfig,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    config: &Config,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = config.effective_log_file();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ec2emu started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

/// `Key=Value` arguments plus the action
fn call_params(action: &str, pairs: &[String]) -> Result<RawParams> {
    let mut values = vec![("Action".to_string(), action.to_string())];
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Expected Key=Value, got {:?}", pair))?;
        values.push((key.to_string(), value.to_string()));
    }
    Ok(RawParams::from_pairs(values))
}

/// Process exit status for a rendered response
fn exit_status(response: &WireResponse) -> u8 {
    u8::from(response.is_error())
}

/// Returns the exit code instead of exiting so the log guard can flush
fn print_response(response: &WireResponse) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    Ok(ExitCode::from(exit_status(response)))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = Config::load().with_overrides(args.account_id.clone(), args.region.clone());
    let _log_guard = setup_logging(args.log_level, &config)?;
    let ctx = Context::from_config(&config);
    tracing::debug!(
        "account={}, region={}",
        ctx.account_id,
        ctx.region
    );

    match args.command {
        Command::Call { action, params } => {
            let params = call_params(&action, &params)?;
            print_response(&server::handle(&ctx, &params))
        }
        Command::Query { query } => print_response(&server::handle_query(&ctx, &query)),
        Command::Serve => {
            let stdin = BufReader::new(tokio::io::stdin());
            server::serve(&ctx, stdin, tokio::io::stdout()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Actions => {
            for action in ACTIONS {
                println!("{}", action);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::SaveConfig => {
            config.save()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_params_requires_key_value() {
        let params = call_params("CreateVpc", &["CidrBlock=10.0.0.0/16".to_string()]).unwrap();
        assert_eq!(params.scalar("Action"), Some("CreateVpc"));
        assert_eq!(params.scalar("CidrBlock"), Some("10.0.0.0/16"));
        assert!(call_params("CreateVpc", &["CidrBlock".to_string()]).is_err());
    }

    #[test]
    fn test_error_response_exits_nonzero() {
        let ctx = Context::default();
        assert_eq!(exit_status(&server::handle_query(&ctx, "Action=DescribeVpcs")), 0);
        assert_eq!(exit_status(&server::handle_query(&ctx, "Action=DeleteVpc")), 1);
    }
}
