use std::{env, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

use recart::{
    config::Config,
    feed_loop,
    logging::init_tracing,
    recovery::{ContactChannel, Dispatcher, DryRunSendAdapter, FixtureCartSource, RecoveryFeed},
};

fn config_path_from_args() -> Result<PathBuf> {
    let mut config_path = PathBuf::from("./recart.jsonc");
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        if arg == "--config" {
            config_path = args
                .next()
                .map(PathBuf::from)
                .context("missing value for --config")?;
        } else if let Some(value) = arg.strip_prefix("--config=") {
            config_path = PathBuf::from(value);
        } else {
            bail!("unknown argument: {arg}. usage: recart [--config <path>]");
        }
    }

    Ok(config_path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let logging_guard = init_tracing(&config.logging)?;
    tracing::info!(
        target: "recart",
        run_id = %logging_guard.run_id(),
        config = %config_path.display(),
        "starting"
    );

    let source = Arc::new(FixtureCartSource::new(config.source.fixture_path.clone()));
    let feed = Arc::new(RecoveryFeed::new(
        source,
        config.policy,
        config.source.fetch_limit,
    ));

    // No real adapters are wired here; dispatch runs dry against the log.
    let dispatcher = config.feed.dispatch_enabled.then(|| {
        let dry_run = Arc::new(DryRunSendAdapter);
        Arc::new(
            Dispatcher::new(Arc::clone(&feed))
                .with_adapter(ContactChannel::Email, dry_run.clone())
                .with_adapter(ContactChannel::Whatsapp, dry_run.clone())
                .with_adapter(ContactChannel::Sms, dry_run),
        )
    });

    let shutdown = CancellationToken::new();
    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;

    let loop_shutdown = shutdown.clone();
    let loop_config = config.clone();
    let loop_handle = tokio::spawn(async move {
        feed_loop::run(&loop_config, feed, dispatcher, loop_shutdown).await
    });

    tokio::select! {
        _ = sigint.recv() => tracing::info!(target: "recart", "received SIGINT, shutting down"),
        _ = sigterm.recv() => tracing::info!(target: "recart", "received SIGTERM, shutting down"),
    }
    shutdown.cancel();

    loop_handle
        .await
        .context("feed loop task panicked")?
        .context("feed loop exited with an error")?;

    Ok(())
}
