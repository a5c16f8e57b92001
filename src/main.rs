//! `disadis` — serve repository datastreams over HTTP.
//!
//! ```text
//! disadis --config /etc/disadis.toml
//! RUST_LOG=debug disadis --config disadis.toml --log /var/log/disadis.log
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use disadis::auth::{Authorizer, BearerTokens};
use disadis::config::Config;
use disadis::logging::LogSink;
use disadis::repository::FsRepository;
use disadis::{RouteTable, signal};

#[derive(Debug, Parser)]
#[command(version, about = "Serve repository datastreams over HTTP")]
struct Opts {
    /// Configuration file (TOML)
    #[arg(long)]
    config: PathBuf,

    /// Log file; overrides `general.log_filename`. Defaults to stdout.
    #[arg(long, env = "DISADIS_LOG")]
    log: Option<PathBuf>,

    /// Repository root directory; overrides `repository.root`
    #[arg(long, env = "DISADIS_REPOSITORY")]
    repository: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let opts = Opts::parse();

    let mut config = match Config::load(&opts.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("disadis: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(log) = opts.log {
        config.general.log_filename = Some(log);
    }
    if let Some(root) = opts.repository {
        config.repository.root = root;
    }

    let sink = match &config.general.log_filename {
        Some(path) => match LogSink::file(path) {
            Ok(sink) => sink,
            Err(e) => {
                eprintln!("disadis: cannot open log file {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => LogSink::stdout(),
    };
    sink.install();
    tokio::spawn(signal::reopen_logs_on_signal(sink));

    info!("-----Starting Server");

    if config.handlers.is_empty() {
        info!("no handlers are defined, exiting");
        return ExitCode::SUCCESS;
    }

    let repository = Arc::new(FsRepository::new(&config.repository.root));
    info!(root = %config.repository.root.display(), "repository");

    let authorizer: Option<Arc<dyn Authorizer>> = if config.has_authorizer() {
        info!(tokens = config.auth.tokens.len(), "using bearer-token authorization");
        Some(Arc::new(BearerTokens::new(config.auth.tokens.iter().cloned())))
    } else {
        warn!("no authorization method given, handlers with auth enabled are refused");
        None
    };

    let table = match RouteTable::build(&config.handlers, repository, authorizer) {
        Ok(table) => table,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match table.run(config.general.listen_host).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
