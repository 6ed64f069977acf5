use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use statsbar::config::SamplerConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Samples Apple Silicon counters until interrupted, printing one JSON record per reporting cycle.
///
/// Logging is controlled through `RUST_LOG`.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with sampler settings; defaults apply when omitted
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "statsbar failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> statsbar::Result<()> {
    let config = match cli.config {
        Some(path) => SamplerConfig::from_path(&path)?,
        None => SamplerConfig::default(),
    };
    info!(duration_ms = config.duration_ms, measures = config.measures, "starting");

    let mut session = statsbar::platform::open_session(config)?;
    loop {
        tokio::select! {
            update = session.next_update() => match update {
                Some(update) => println!("{}", serde_json::to_string(&update?)?),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            },
        }
    }

    session.stop().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_optional() {
        let cli = Cli::try_parse_from(["statsbar"]).unwrap();
        assert!(cli.config.is_none());

        let cli = Cli::try_parse_from(["statsbar", "sampler.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("sampler.json")));
    }

    #[test]
    fn test_rejects_extra_arguments() {
        assert!(Cli::try_parse_from(["statsbar", "a.json", "b.json"]).is_err());
    }

    #[test]
    fn test_command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
