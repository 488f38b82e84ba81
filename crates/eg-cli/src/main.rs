mod render;
mod server;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use eg_core::{
    Classifier, GraphDatabase, MatrixKind, ProgressEvent, SearchContext, TieredSolver,
    check_stability, compute_spectrum, detect_topology, find_analytic_graphs,
    identify_family, parse_edge_list, try_canonical_hash,
};
use eg_store::{Config, DataDir, Store};
use rmcp::{ServiceExt, transport::stdio};

#[derive(Parser)]
#[command(name = "eg", about = "Analytic graph-spectrum search CLI and MCP server")]
struct Cli {
    /// Matrix whose spectrum is classified: skew or symmetric
    #[arg(long, global = true, default_value = "skew", value_parser = parse_kind)]
    kind: MatrixKind,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport
    Serve,

    /// Enumerate graphs on n vertices and report those with closed-form spectra
    Search {
        n: usize,

        #[arg(long)]
        connected_only: bool,

        #[arg(long)]
        regular_only: bool,

        #[arg(long)]
        min_edges: Option<usize>,

        #[arg(long)]
        max_edges: Option<usize>,

        /// Stop after this many unique graphs
        #[arg(long)]
        max_unique: Option<usize>,

        /// Skip building smaller levels first
        #[arg(long)]
        no_incremental: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a single graph
    Classify {
        #[arg(long)]
        n: usize,

        /// Edge list, e.g. "0-1,1-2,2-0"
        #[arg(long, default_value = "")]
        edges: String,
    },

    /// Closed-form spectrum or bounds of the consensus dynamics on a graph
    Bounds {
        #[arg(long)]
        n: usize,

        #[arg(long, default_value = "")]
        edges: String,

        /// Self-damping α
        #[arg(long, default_value_t = 1.0)]
        alpha: f64,

        /// Coupling β
        #[arg(long, default_value_t = 1.0)]
        beta: f64,
    },

    /// Classify and store the catalogued graph families
    Seed {
        #[arg(long, default_value_t = 8)]
        max_n: usize,
    },

    /// Show database statistics
    Stats,

    /// Export the database to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Import a JSON export, replacing the database
    Import {
        /// Input file path
        path: PathBuf,
    },

    /// Delete every stored graph
    Clear,
}

fn parse_kind(s: &str) -> std::result::Result<MatrixKind, String> {
    MatrixKind::parse(s).ok_or_else(|| format!("unknown matrix kind '{s}' (skew or symmetric)"))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn open_store(dir: &DataDir, kind: MatrixKind) -> Result<Store> {
    dir.open_store(kind)
        .with_context(|| format!("failed to open {} store in {}", kind, dir.root().display()))
}

/// A store that cannot be read is treated as a cold start.
fn load_or_fresh(store: &Store, kind: MatrixKind) -> GraphDatabase {
    store.load_database(kind).unwrap_or_else(|e| {
        tracing::warn!(%kind, error = %e, "failed to load database, starting fresh");
        GraphDatabase::new(kind)
    })
}

fn classifier(config: &Config) -> Classifier<TieredSolver> {
    Classifier::new(TieredSolver::default(), config.classifier_config())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let dir = DataDir::resolve();
    let config = dir.load_config();

    match &cli.command {
        Commands::Serve => cmd_serve(&dir, config).await,
        Commands::Search {
            n,
            connected_only,
            regular_only,
            min_edges,
            max_edges,
            max_unique,
            no_incremental,
            json,
        } => {
            let mut options = config.search_options();
            options.connected_only = *connected_only;
            options.regular_only = *regular_only;
            options.min_edges = *min_edges;
            options.max_edges = *max_edges;
            if let Some(max) = max_unique {
                options.max_unique_graphs = *max;
            }
            if *no_incremental {
                options.build_incremental = false;
            }
            cmd_search(&cli, &dir, &config, *n, options, *json)
        }
        Commands::Classify { n, edges } => cmd_classify(&cli, &dir, &config, *n, edges),
        Commands::Bounds {
            n,
            edges,
            alpha,
            beta,
        } => cmd_bounds(*n, edges, *alpha, *beta),
        Commands::Seed { max_n } => cmd_seed(&cli, &dir, &config, *max_n),
        Commands::Stats => cmd_stats(&cli, &dir),
        Commands::Export { path } => cmd_export(&cli, &dir, path),
        Commands::Import { path } => cmd_import(&cli, &dir, path),
        Commands::Clear => cmd_clear(&cli, &dir),
    }
}

async fn cmd_serve(dir: &DataDir, config: Config) -> Result<()> {
    let skew = open_store(dir, MatrixKind::Skew)?;
    let symmetric = open_store(dir, MatrixKind::Symmetric)?;
    tracing::info!("starting MCP server with data in {}", dir.root().display());

    let server = server::EgServer::new(skew, symmetric, config);
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;
    Ok(())
}

fn cmd_search(
    cli: &Cli,
    dir: &DataDir,
    config: &Config,
    n: usize,
    options: eg_core::SearchOptions,
    json: bool,
) -> Result<()> {
    let mut store = open_store(dir, cli.kind)?;
    let mut db = load_or_fresh(&store, cli.kind);
    let classifier = classifier(config);

    let mut on_progress = |event: &ProgressEvent| {
        tracing::info!(
            phase = ?event.phase,
            n = event.n,
            done = event.masks_done,
            total = event.masks_total,
            analytic = event.analytic_found,
            "{}",
            event.message
        );
    };
    let result = {
        let mut ctx =
            SearchContext::new(&mut db, &classifier, &mut store).with_progress(&mut on_progress);
        find_analytic_graphs(n, options, &mut ctx).context("search failed")?
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(
                &render::search_json(&result).context("failed to serialize result")?
            )
            .context("failed to serialize result")?
        );
        return Ok(());
    }

    for entry in &result.graphs {
        println!("{}", render::entry_line(entry, result.polynomials.get(&entry.hash)));
    }
    let stats = &result.stats;
    println!(
        "n={} kind={}: {} analytic of {} unique graphs ({} fresh, {} rejected)",
        result.n,
        result.kind,
        result.graphs.len(),
        stats.unique_graphs,
        stats.fresh,
        stats.rejected
    );
    if !stats.levels_built.is_empty() {
        println!("built levels: {:?}", stats.levels_built);
    }
    if result.truncated {
        println!("stopped early: unique-graph limit reached");
    }
    Ok(())
}

fn cmd_classify(cli: &Cli, dir: &DataDir, config: &Config, n: usize, edges: &str) -> Result<()> {
    let graph = parse_edge_list(n, edges).context("invalid graph")?;
    let hash = try_canonical_hash(&graph).context("invalid graph")?;

    let store = open_store(dir, cli.kind)?;
    let db = load_or_fresh(&store, cli.kind);
    let (classification, source) = match db.entry(n, &hash) {
        Some(entry) => (entry.classification(), "database"),
        None => (
            classifier(config)
                .classify(&graph, cli.kind)
                .context("classification failed")?,
            "classifier",
        ),
    };

    println!("graph:      {graph}");
    println!("hash:       {hash}");
    if let Some(family) = identify_family(&graph) {
        println!("family:     {family}");
    }
    println!("analytic:   {}", classification.analytic);
    println!("method:     {} ({source})", classification.method);
    println!("spectrum:   {}", render::spectrum(&classification.eigenvalues));
    if let Some(reason) = &classification.reason {
        println!("reason:     {reason}");
    }
    Ok(())
}

fn cmd_bounds(n: usize, edges: &str, alpha: f64, beta: f64) -> Result<()> {
    if !alpha.is_finite() || !beta.is_finite() {
        bail!("alpha and beta must be finite");
    }
    let graph = parse_edge_list(n, edges).context("invalid graph")?;
    let topology = detect_topology(&graph);
    let spectrum = compute_spectrum(&topology, alpha, beta);
    let stability = check_stability(&spectrum);

    println!("topology:   {topology}");
    println!(
        "spectrum:   {}",
        if spectrum.exact_spectrum { "exact" } else { "bounded" }
    );
    for point in &spectrum.eigenvalues {
        println!("  {}", render::point(point));
    }
    if spectrum.unresolved > 0 {
        println!("unresolved: {}", spectrum.unresolved);
    }
    println!(
        "re range:   [{:.6}, {:.6}]",
        spectrum.real_bounds.0, spectrum.real_bounds.1
    );
    println!(
        "im range:   [{:.6}, {:.6}]",
        spectrum.imag_bounds.0, spectrum.imag_bounds.1
    );
    println!("radius:     {:.6}", spectrum.spectral_radius);
    println!("stability:  {:?} ({})", stability.verdict, stability.reason);
    Ok(())
}

fn cmd_seed(cli: &Cli, dir: &DataDir, config: &Config, max_n: usize) -> Result<()> {
    if max_n > eg_core::MAX_SEARCH_N {
        bail!("seeding is limited to {} vertices", eg_core::MAX_SEARCH_N);
    }
    let store = open_store(dir, cli.kind)?;
    let mut db = load_or_fresh(&store, cli.kind);
    let added = db.seed_known_families(max_n, &classifier(config));
    store
        .save_database(&db)
        .context("failed to save database")?;
    println!(
        "seeded {added} new entries up to n={} ({})",
        db.seeded_up_to(),
        db.kind()
    );
    Ok(())
}

fn cmd_stats(cli: &Cli, dir: &DataDir) -> Result<()> {
    let store = open_store(dir, cli.kind)?;
    let db = load_or_fresh(&store, cli.kind);
    let stats = db.stats();

    println!("kind:       {}", stats.kind);
    println!("entries:    {}", stats.total_entries);
    println!("analytic:   {}", stats.total_analytic);
    println!("rejected:   {}", stats.total_rejections);
    println!("products:   {}", stats.products);
    println!("seeded:     {}", stats.seeded_up_to);
    for level in &stats.levels {
        println!(
            "  n={:<2} entries={} analytic={} rejected={} poly_cache={}{}",
            level.n,
            level.entries,
            level.analytic,
            level.rejections,
            level.poly_cache,
            if level.complete { " complete" } else { "" }
        );
    }
    Ok(())
}

fn cmd_export(cli: &Cli, dir: &DataDir, path: &Path) -> Result<()> {
    let store = open_store(dir, cli.kind)?;
    store
        .export_json_file(path, cli.kind)
        .context("failed to export database")?;
    println!("exported to {}", path.display());
    Ok(())
}

fn cmd_import(cli: &Cli, dir: &DataDir, path: &Path) -> Result<()> {
    let store = open_store(dir, cli.kind)?;
    let db = store
        .import_json_file(path, cli.kind)
        .context("failed to import JSON")?;
    let stats = db.stats();
    println!(
        "imported from {}. entries={}, analytic={}, rejected={}",
        path.display(),
        stats.total_entries,
        stats.total_analytic,
        stats.total_rejections
    );
    Ok(())
}

fn cmd_clear(cli: &Cli, dir: &DataDir) -> Result<()> {
    let store = open_store(dir, cli.kind)?;
    store
        .clear_database()
        .context("failed to clear database")?;
    println!("cleared {} database", cli.kind);
    Ok(())
}
