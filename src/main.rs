//! stagekit: inspect and edit a kinematic assembly
//!
//! Usage:
//!   stagekit show                          → print the fetched assembly tree
//!   stagekit poses --axis 1=25             → world poses, with axis 1 moved to 25
//!   stagekit add base '{"name":..}'        → add a component under `base` and submit
//!   stagekit remove arm                    → remove `arm` and its subtree, then submit
//!   stagekit serve --assembly stage.json   → run the reference server
//!   stagekit config                        → print the effective config

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use stagekit::commands::{
    build_source, describe_submit, format_poses, parse_axis_positions, poses_to_json,
    read_component,
};
use stagekit::{LogConfig, StagekitConfig, DEFAULT_CONFIG_FILE};
use stagekit_core::{render_tree, to_document_string_pretty};
use stagekit_state::{AssemblyState, TreeCopy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "stagekit",
    about = "Kinematic assembly client and reference server",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (TOML)
    #[arg(short, long, global = true, env = "STAGEKIT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Base URL of the assembly source, overrides [source].base_url
    #[arg(short, long, global = true, env = "STAGEKIT_URL")]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the assembly tree held by the source
    Show {
        /// Print the raw document instead of an outline
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the world pose of every component
    Poses {
        /// Axis displacement as ID=POS; repeatable
        #[arg(long = "axis", value_name = "ID=POS")]
        axes: Vec<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Add a component under a parent and submit the result
    Add {
        /// Name of the parent component
        parent: String,
        /// Component JSON, or @path to read it from a file
        component: String,
    },
    /// Remove a component and its subtree and submit the result
    Remove { name: String },
    /// Run the reference assembly server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
        #[arg(short, long)]
        bind: Option<String>,
        /// JSON file to load the assembly from and persist it to
        #[arg(long)]
        assembly: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = StagekitConfig::read(&cli.config);
    let filter = match &loaded {
        Ok(Some(config)) => config.log.filter.clone(),
        _ => LogConfig::default().filter,
    };
    init_tracing(&filter);

    let mut config = StagekitConfig::from_loaded(loaded, &cli.config);
    if let Some(url) = cli.url {
        config.source.base_url = url;
    }

    match cli.command {
        Commands::Show { json } => {
            let state = connect(&config).await?;
            let root = state.snapshot(TreeCopy::Server).await;
            if json {
                println!("{}", to_document_string_pretty(&root)?);
            } else {
                print!("{}", render_tree(&root));
            }
        }

        Commands::Poses { axes, json } => {
            let positions = parse_axis_positions(&axes)?;
            let state = connect(&config).await?;
            let poses = state.world_poses_with_positions(TreeCopy::Server, &positions).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&poses_to_json(&poses)?)?);
            } else {
                print!("{}", format_poses(&poses));
            }
        }

        Commands::Add { parent, component } => {
            let component = read_component(&component)?;
            let name = component.name.clone();
            let state = connect(&config).await?;
            state.discard_edits().await;
            state
                .add_child(&parent, component)
                .await
                .with_context(|| format!("cannot add {} under {}", name, parent))?;
            let outcome = state.submit_edits().await.context("submit rejected")?;
            println!("Added {} under {} ({})", name, parent, describe_submit(&outcome));
        }

        Commands::Remove { name } => {
            let state = connect(&config).await?;
            state.discard_edits().await;
            if !state.remove_by_name(&name).await {
                bail!("no removable component named {}", name);
            }
            let outcome = state.submit_edits().await.context("submit rejected")?;
            println!("Removed {} ({})", name, describe_submit(&outcome));
        }

        Commands::Serve { port, bind, assembly } => {
            let mut server = config.server;
            if let Some(port) = port {
                server.port = port;
            }
            if let Some(bind) = bind {
                server.bind = bind;
            }
            if assembly.is_some() {
                server.assembly_path = assembly;
            }
            stagekit_server::start_server(server).await?;
        }

        Commands::Config => {
            print!("{}", config.to_toml());
        }
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn connect(config: &StagekitConfig) -> anyhow::Result<AssemblyState> {
    let source = build_source(&config.source)?;
    info!("Using assembly source at {}", source.base_url());
    let state = AssemblyState::new(Arc::new(source));
    state
        .sync_from_source()
        .await
        .with_context(|| format!("failed to fetch assembly from {}", config.source.base_url))?;
    Ok(state)
}
