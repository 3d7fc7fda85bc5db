use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use pantry::pipeline::{rebuild_reference_tables, score_ingredients, vectorise_taxonomy};
use pantry::{
    EntityKey, HashEmbedder, IngredientService, MatchRequest, PantryConfig, PantryStore, PropertiesRequest,
    ReferenceContext,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Ingredient taxonomy matching and reference-value aggregation
#[derive(Parser, Debug)]
#[command(name = "pantry")]
#[command(about = "Match ingredients to a taxonomy and aggregate reference values", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the data directory (overrides the configuration file)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match raw ingredient names and print the response
    Match {
        #[arg(required = true)]
        ingredients: Vec<String>,
    },
    /// Print stored properties for taxonomy ids
    Properties {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Match every ingredient in the ingredients table and store the scored rows
    Score,
    /// Embed taxonomy names missing from the vector table
    Vectorise,
    /// Rebuild the reference-value, summary and dashboard tables
    Aggregate {
        #[arg(long, value_enum, default_value_t = KeyArg::TaxonomyId)]
        key: KeyArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KeyArg {
    TaxonomyId,
    MatchedIngredient,
}

impl From<KeyArg> for EntityKey {
    fn from(arg: KeyArg) -> Self {
        match arg {
            KeyArg::TaxonomyId => EntityKey::TaxonomyId,
            KeyArg::MatchedIngredient => EntityKey::MatchedIngredient,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = PantryConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    info!("Starting Pantry v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", config.data_dir);

    let store = Arc::new(PantryStore::open(&config.data_dir, config.tables.clone())?);
    let embedder = HashEmbedder::new(config.embedding_dim)?;

    match args.command {
        Command::Match { ingredients } => {
            let service = service(&store, &config, embedder)?;
            let response = service.match_ingredients(&MatchRequest { ingredients })?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Properties { ids } => {
            let request = PropertiesRequest {
                ingredient_ids: ids.into_iter().map(Value::String).collect(),
            };
            let service = service(&store, &config, embedder)?;
            let response = service.fill_properties(&request)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Score => {
            let context = load_context(&store, &config)?;
            let scored = score_ingredients(&context, &embedder, store.ingredients()?)?;
            store.write_observations(&scored)?;
            info!(rows = scored.len(), "Scored ingredients stored");
        }
        Command::Vectorise => {
            let entries = store.taxonomy_entries()?;
            let existing = store.vectorised_names()?;
            let rows = vectorise_taxonomy(&entries, &existing, &embedder)?;
            if rows.is_empty() {
                info!("No new taxonomy names. Nothing appended");
            } else {
                store.append_taxonomy_vectors(&rows)?;
            }
        }
        Command::Aggregate { key } => {
            let report = rebuild_reference_tables(&store, &config, key.into())?;
            info!(profiles = report.profiles, entities = report.entities, "Aggregation finished");
        }
    }

    Ok(())
}

fn load_context(store: &Arc<PantryStore>, config: &PantryConfig) -> anyhow::Result<ReferenceContext> {
    let loader = Box::new(PantryStore::clone(store));
    ReferenceContext::load(loader, Some(config.embedding_dim)).context("loading taxonomy vectors and stopwords")
}

fn service(store: &Arc<PantryStore>, config: &PantryConfig, embedder: HashEmbedder) -> anyhow::Result<IngredientService> {
    let context = load_context(store, config)?;
    Ok(IngredientService::new(Arc::new(context), Arc::new(embedder), store.clone()))
}
