//! gitshelf - serve a directory of git repositories over HTTP
//!
//! # Usage
//! ```bash
//! gitshelf                      # Serve ~/Projects on 127.0.0.1:3456
//! gitshelf /srv/git --port 8080 # Serve another root
//! gitshelf list                 # Print the repositories that would be served
//! gitshelf /srv/git init app    # Create a bare repository under a root
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gitshelf::config::Config;
use gitshelf::git::Registry;
use gitshelf::AppState;

/// Browse git repositories and serve them over Smart HTTP
#[derive(Parser)]
#[command(name = "gitshelf")]
#[command(about = "Publish a directory of git repositories over HTTP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory whose subdirectories are served as repositories
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port to run the server on
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Config file (default: ~/.config/gitshelf/config.toml)
    #[arg(short, long, env = "GITSHELF_CONFIG", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the repositories found under the root
    List,
    /// Create a bare repository under the root
    Init {
        /// Directory name of the new repository
        name: String,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "gitshelf=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load(cli.config.as_deref())?
        .with_env_overrides()
        .with_cli_overrides(cli.root, cli.host, cli.port);

    match cli.command {
        Some(Commands::List) => {
            let registry = Registry::load(&config.git.root)?;
            for handle in registry.list() {
                println!("{}\t{}", handle.slug(), handle.path().display());
            }
            return Ok(());
        }
        Some(Commands::Init { name }) => {
            let registry = Registry::load(&config.git.root)?;
            let handle = registry.create(&name)?;
            println!("✓ Created {}", handle.path().display());
            return Ok(());
        }
        None => {}
    }

    let registry = Registry::load(&config.git.root)
        .with_context(|| format!("Failed to open repository root {}", config.git.root.display()))?;

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (try --port <PORT>)", addr))?;

    tracing::info!(
        "Serving {} repositories from {} on http://{}",
        registry.current().len(),
        config.git.root.display(),
        addr
    );

    let state = AppState::new(Arc::new(registry), config);
    let app = gitshelf::app(state);

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
