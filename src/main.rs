use clap::Parser;
use raindrop_sync::config::{Cli, Config};
use raindrop_sync::handler::{AppState, app};
use raindrop_sync::sync;
use raindrop_sync::unpack_error;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // A missing default .env is fine; an explicit one must load.
    match &args.env_file {
        Some(path) => {
            if let Err(e) = dotenvy::from_filename(path) {
                eprintln!("failed to load env file {}: {}", path, e);
                std::process::exit(1);
            }
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("raindrop-sync.svc starting");

    let mut cfg = Config::new(args.config_path.as_deref()).unwrap_or_else(|e| {
        tracing::error!(error = %unpack_error(&e), path = ?args.config_path, "failed to load config");
        std::process::exit(1);
    });
    if let Some(port) = args.port {
        cfg.port = port;
    }
    tracing::debug!(config = ?cfg, "config loaded");

    let state = AppState::new(cfg);

    if args.once {
        let settings = state.settings();
        let result = sync::run(
            state.bookmarks.as_ref(),
            state.posts.as_ref(),
            state.observer.as_ref(),
            &settings,
        )
        .await;
        match result {
            Ok(outcome) => {
                println!("{}", outcome);
                return;
            }
            Err(e) => {
                eprintln!("{}", unpack_error(&e));
                std::process::exit(1);
            }
        }
    }

    let address = format!("0.0.0.0:{}", state.config.port);
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("raindrop-sync.svc running on {}", &address);
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
        }
        tracing::info!("ctrl+c signal received, preparing to shutdown");
    };

    if let Err(err) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }

    tracing::info!("raindrop-sync.svc going off, graceful shutdown complete");
}
