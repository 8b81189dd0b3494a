//! fossa-diag - collect Kubernetes diagnostics for a FOSSA Helm release
//!
//! Discovers the release, enumerates the objects in its manifest, captures
//! object state, pod logs and namespace events, and packs everything into a
//! gzipped tarball for support.

use clap::Parser;
use clap::error::ErrorKind;
use fossa_diag::cli::{self, Args, Options, Outcome, Prompter};
use fossa_diag::config::ConfigLoader;
use fossa_diag::kube::ProcessRunner;
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    let code = match Args::try_parse() {
        Ok(args) => execute(args).await,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayVersion => 0,
                _ => 1,
            }
        }
    };

    // Exit directly: a prompt may still own the blocking stdin reader, which
    // would otherwise keep the runtime from shutting down.
    std::process::exit(code);
}

async fn execute(args: Args) -> i32 {
    if args.help {
        print!("{}", Args::help_text());
        return 1;
    }

    let options = Options::from_env(args);
    cli::init_logging(options.debug);

    if options.debug {
        tracing::debug!("Debug logging enabled");
    }

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", cli::run::error_message(&e));
            return 1;
        }
    };

    tracing::debug!(
        "Configuration loaded: product={}, countdown={}s, mode={:?}",
        config.product,
        config.countdown_secs,
        options.mode
    );

    let runner = ProcessRunner;
    let mut prompter = Prompter::new(BufReader::new(tokio::io::stdin()), std::io::stdout());

    match cli::run(&options, &config, &runner, &mut prompter, shutdown_signal()).await {
        Ok(Outcome::Explained) => 0,
        Ok(Outcome::Collected(summary)) => {
            tracing::debug!("Archive written: {} bytes", summary.bytes);
            0
        }
        Err(e) => {
            eprintln!("ERROR: {}", cli::run::error_message(&e));
            1
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
