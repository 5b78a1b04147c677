//! Note Graph Analysis - command line front end
//!
//! Runs graph algorithms over a markdown vault and prints ranked results
//! for one note.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use note_graph_analysis::graph::{
    AlgorithmOutput, AnalysisDebouncer, AnalysisEngine, AnalysisReport, NoteGraphEngine,
};
use note_graph_analysis::graph::{Algorithm, AlgorithmParams, Settings};
use note_graph_analysis::ranking::{self, SortOrder};
use note_graph_analysis::text::round_number;
use note_graph_analysis::vault::FsVault;
use note_graph_analysis::Config;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "graph-analysis")]
#[command(about = "Graph analytics for a markdown note vault")]
struct Cli {
    /// Vault root (overrides config.yaml and GRAPH_ANALYSIS_VAULT)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Path to the YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Source note, as a vault-relative path
    #[arg(short, long)]
    note: String,

    /// Algorithm name (defaults to the configured default)
    #[arg(short, long)]
    algorithm: Option<Algorithm>,

    /// Label Propagation iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Louvain resolution
    #[arg(long)]
    resolution: Option<f64>,

    /// Maximum number of rows to print
    #[arg(short, long, default_value = "20")]
    limit: usize,

    /// Sort ascending instead of descending
    #[arg(long)]
    asc: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one algorithm for a note and print the ranked results
    Run(RunArgs),

    /// List the algorithms enabled in the configuration
    Algorithms,

    /// Build the graph and print its size
    Stats,

    /// Re-run an algorithm every time the vault changes
    Watch(RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,note_graph_analysis=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;
    if let Some(vault) = cli.vault {
        config.vault_path = vault;
    }

    match cli.command {
        Commands::Algorithms => {
            print_algorithms(&config.settings);
            Ok(())
        }
        Commands::Stats => {
            let engine = open_engine(&config).await?;
            let graph = engine.graph().await;
            println!("nodes: {}", graph.node_count());
            println!("edges: {}", graph.edge_count());
            Ok(())
        }
        Commands::Run(args) => {
            let engine = open_engine(&config).await?;
            run_once(engine.as_ref(), &args).await
        }
        Commands::Watch(args) => run_watch(config, args).await,
    }
}

async fn open_engine(config: &Config) -> Result<Arc<NoteGraphEngine>> {
    let root = config
        .vault_path
        .canonicalize()
        .with_context(|| format!("Vault not found: {}", config.vault_path.display()))?;
    let engine = NoteGraphEngine::new(Arc::new(FsVault::new(root)), config.settings.clone());
    let stats = engine.rebuild().await?;
    tracing::info!(
        nodes = stats.node_count,
        edges = stats.edge_count,
        ms = stats.computation_ms,
        "Graph built"
    );
    Ok(Arc::new(engine))
}

fn print_algorithms(settings: &Settings) {
    for algorithm in &settings.algorithms_to_show {
        let marker = if *algorithm == settings.default_algorithm {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<28} {}",
            marker,
            ranking::display_name(*algorithm, settings),
            algorithm.description()
        );
    }
}

async fn run_once(engine: &NoteGraphEngine, args: &RunArgs) -> Result<()> {
    let settings = engine.settings();
    let algorithm = args.algorithm.unwrap_or(settings.default_algorithm);
    settings.ensure_enabled(algorithm)?;
    let params = AlgorithmParams {
        iterations: args.iterations,
        resolution: args.resolution,
    };

    let report = engine.run(algorithm, &args.note, params).await?;
    for notice in &report.notices {
        eprintln!("{}", notice);
    }

    let graph = engine.graph().await;
    let order = if args.asc {
        SortOrder::Ascending
    } else {
        SortOrder::Descending
    };

    match &report.output {
        AlgorithmOutput::Communities(_) | AlgorithmOutput::Members(_) => {
            let members = ranking::community_members(&report.output, &args.note);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&members)?);
            } else {
                print_header(&report, settings);
                for member in members.iter().take(args.limit) {
                    println!("  {}", member);
                }
            }
        }
        _ => {
            let mut rows = ranking::rank(&graph, &args.note, &report.output, settings, order);
            rows.truncate(args.limit);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_header(&report, settings);
                for row in &rows {
                    let flags = format!(
                        "{}{}",
                        if row.linked { "L" } else { " " },
                        if row.resolved { " " } else { "?" }
                    );
                    println!("{:>10} {} {}", round_number(row.measure), flags, row.to);
                    for line in &row.extra {
                        println!("{:>13} {}", "", line.trim());
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_header(report: &AnalysisReport, settings: &Settings) {
    println!(
        "{} for {} ({} nodes, {} edges, {} ms)",
        ranking::display_name(report.algorithm, settings),
        report.source,
        report.node_count,
        report.edge_count,
        report.computation_ms
    );
}

async fn run_watch(config: Config, args: RunArgs) -> Result<()> {
    let engine = open_engine(&config).await?;
    run_once(engine.as_ref(), &args).await?;

    let (stats_tx, mut stats_rx) = mpsc::channel(8);
    let debouncer = Arc::new(AnalysisDebouncer::with_listener(
        engine.clone(),
        config.debounce_ms,
        Some(stats_tx),
    ));

    let root = config.vault_path.canonicalize()?;
    let trigger = debouncer.clone();
    let watch_root = root.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) if event.paths.iter().any(|p| is_vault_file(&watch_root, p)) => {
                trigger.trigger()
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Watch error: {}", e),
        },
        notify::Config::default(),
    )?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;
    tracing::info!("Now watching: {}", root.display());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Watcher stopping");
                break;
            }
            Some(stats) = stats_rx.recv() => {
                tracing::debug!(nodes = stats.node_count, edges = stats.edge_count, "Vault changed");
                if let Err(e) = run_once(engine.as_ref(), &args).await {
                    tracing::warn!("Re-run failed: {}", e);
                }
            }
        }
    }
    Ok(())
}

/// Changes inside hidden directories (.git, editor state) never touch the graph.
fn is_vault_file(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    !relative.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|s| s.starts_with('.') && s.len() > 1 && s != "..")
    })
}
