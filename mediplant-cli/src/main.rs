use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mediplant_core::{
    ApiClient, Config, FormState, ImageUpload, Intent, JsonFileStore, Plant, PlantPresenter,
    SearchError, SearchMode, SearchOrchestrator, SearchResult, UserSideState, ValidationError,
    normalize, run_intent_loop,
};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser)]
#[command(name = "mediplant")]
#[command(about = "Medicinal plant lookup CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search plants by common or scientific name
    Search {
        /// Search query
        query: String,
    },

    /// Describe symptoms in natural language and get matching plants
    Symptoms {
        /// Free-text description, e.g. "I have a headache and nausea"
        description: String,
    },

    /// Search by visual features (leaf shape, flower color, ...)
    Visual {
        /// Toggled feature tags
        features: Vec<String>,
    },

    /// Identify a plant from a photo
    Identify {
        /// Path to a JPG, PNG or WEBP image (max 5 MiB)
        image: PathBuf,
    },

    /// Show one plant and record it as recently viewed
    Plant {
        /// Plant id
        id: String,
    },

    /// List every plant in the catalog
    All,

    /// Show the top-rated plants
    TopRated,

    /// Show plants of one type (herb, shrub, tree, ...)
    ByType {
        /// Plant type
        plant_type: String,
    },

    /// Toggle a plant in the favorites list
    Favorite {
        /// Plant id
        plant_id: String,
    },

    /// List favorite plants
    Favorites,

    /// Manage the comparison list (max 4 plants)
    Compare {
        #[command(subcommand)]
        action: CompareAction,
    },

    /// Show recent searches
    History,

    /// Clear search history
    ClearHistory,

    /// Delete a plant (admin, needs MEDIPLANT_API_TOKEN)
    Delete {
        /// Plant id
        id: String,
    },
}

#[derive(Subcommand)]
enum CompareAction {
    /// Add a plant to the comparison list
    Add { plant_id: String },
    /// Remove a plant from the comparison list
    Remove { plant_id: String },
    /// Empty the comparison list
    Clear,
    /// Show the comparison list
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    // Load .env
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let api = ApiClient::new(&config);
    let mut state = UserSideState::load(JsonFileStore::new(&config.state_path));

    let cli = Cli::parse();

    match cli.command {
        Commands::Search { query } => {
            let form = FormState {
                query,
                ..FormState::default()
            };
            submit_search(&config, api, &mut state, SearchMode::Name, form).await;
        }
        Commands::Symptoms { description } => {
            let form = FormState {
                query: description,
                ..FormState::default()
            };
            submit_search(&config, api, &mut state, SearchMode::Symptom, form).await;
        }
        Commands::Visual { features } => {
            let form = FormState {
                selected_features: features,
                ..FormState::default()
            };
            submit_search(&config, api, &mut state, SearchMode::Visual, form).await;
        }
        Commands::Identify { image } => {
            let form = FormState {
                image: Some(read_upload(&image)?),
                ..FormState::default()
            };
            submit_search(&config, api, &mut state, SearchMode::Image, form).await;
        }
        Commands::Plant { id } => {
            let orchestrator = SearchOrchestrator::new(api, config.min_skeleton);
            dispatch(
                &orchestrator,
                &mut state,
                Intent::ViewPlant { plant_id: id },
            )
            .await;
        }
        Commands::All => {
            let result = normalize::decode_search_result(api.fetch_all_plants().await?)?;
            print_catalog(&result);
        }
        Commands::TopRated => {
            let result = normalize::decode_search_result(api.fetch_top_rated().await?)?;
            print_catalog(&result);
        }
        Commands::ByType { plant_type } => {
            let result =
                normalize::decode_search_result(api.fetch_plants_by_type(&plant_type).await?)?;
            print_catalog(&result);
        }
        Commands::Favorite { plant_id } => {
            let added = state.toggle_favorite(&plant_id);
            if added {
                println!("Added {} to favorites", plant_id);
            } else {
                println!("Removed {} from favorites", plant_id);
            }
        }
        Commands::Favorites => {
            if state.favorites().is_empty() {
                println!("No favorites yet");
            } else {
                for (i, id) in state.favorites().iter().enumerate() {
                    println!("{}. {}", i + 1, id);
                }
            }
        }
        Commands::Compare { action } => compare_command(&mut state, action),
        Commands::History => {
            if state.search_history().is_empty() {
                println!("No searches recorded");
            } else {
                for entry in state.search_history() {
                    println!("{}  {}", entry.timestamp, entry.query);
                }
            }
        }
        Commands::ClearHistory => {
            state.clear_history();
            println!("Search history cleared");
        }
        Commands::Delete { id } => {
            let token = std::env::var("MEDIPLANT_API_TOKEN")
                .context("MEDIPLANT_API_TOKEN not set (admin calls need a bearer token)")?;
            api.with_token(token).delete_plant(&id).await?;
            info!("Plant {} deleted", id);
        }
    }

    Ok(())
}

/// Feed one search intent through the orchestrator's intent loop.
async fn submit_search(
    config: &Config,
    api: ApiClient,
    state: &mut UserSideState<JsonFileStore>,
    mode: SearchMode,
    form: FormState,
) {
    let orchestrator = SearchOrchestrator::new(api, config.min_skeleton);
    dispatch(&orchestrator, state, Intent::Search { mode, form }).await;
}

async fn dispatch(
    orchestrator: &SearchOrchestrator<ApiClient>,
    state: &mut UserSideState<JsonFileStore>,
    intent: Intent,
) {
    let presenter = TerminalPresenter;
    let (tx, rx) = mpsc::channel(8);
    tx.send(intent).await.ok();
    drop(tx);
    run_intent_loop(orchestrator, state, &presenter, rx).await;
}

fn compare_command(state: &mut UserSideState<JsonFileStore>, action: CompareAction) {
    match action {
        CompareAction::Add { plant_id } => {
            if state.add_to_comparison(&plant_id) {
                println!("Comparing {} plant(s)", state.compared_plants().len());
            } else {
                println!("Could not add: comparison holds at most 4 distinct plants");
            }
        }
        CompareAction::Remove { plant_id } => {
            if state.remove_from_comparison(&plant_id) {
                println!("Removed {} from comparison", plant_id);
            } else {
                println!("{} is not in the comparison list", plant_id);
            }
        }
        CompareAction::Clear => {
            state.clear_comparison();
            println!("Comparison list cleared");
        }
        CompareAction::List => {
            if state.compared_plants().is_empty() {
                println!("Comparison list is empty");
            } else {
                for (i, id) in state.compared_plants().iter().enumerate() {
                    println!("{}. {}", i + 1, id);
                }
            }
        }
    }
}

fn read_upload(path: &Path) -> Result<ImageUpload> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    Ok(ImageUpload {
        mime_type: mime_for(path).to_string(),
        file_name,
        bytes,
    })
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn print_catalog(result: &SearchResult) {
    if result.is_empty() {
        println!("No plants found");
        return;
    }
    println!("Found {} plant(s):\n", result.plants.len());
    for (i, plant) in result.plants.iter().enumerate() {
        print_plant(i + 1, plant);
    }
}

fn print_plant(index: usize, plant: &Plant) {
    match &plant.scientific_name {
        Some(scientific) => println!("{}. {} ({})", index, plant.name, scientific),
        None => println!("{}. {}", index, plant.name),
    }

    if plant.review_count > 0 {
        println!(
            "   Rating: {:.1}/5 ({} reviews)",
            plant.rating, plant.review_count
        );
    }

    println!(
        "   Safety: {} | Availability: {}",
        plant.safety, plant.availability
    );

    if !plant.medicinal_uses.is_empty() {
        println!("   Uses: {}", plant.medicinal_uses.join(", "));
    }

    if let Some(description) = &plant.description {
        // Keep cards short; the detail view has the full text.
        let short: String = description.chars().take(150).collect();
        if description.chars().count() > 150 {
            println!("   {}...", short);
        } else {
            println!("   {}", short);
        }
    }

    if let Some(precautions) = &plant.precautions {
        println!("   Precautions: {}", precautions);
    }

    println!();
}

/// Terminal rendering collaborator: cards to stdout, failures to stderr.
struct TerminalPresenter;

impl PlantPresenter for TerminalPresenter {
    fn on_loading(&self, mode: SearchMode) {
        println!("Searching ({mode})...");
    }

    fn on_results(&self, result: &SearchResult) {
        println!();
        for (i, plant) in result.plants.iter().enumerate() {
            print_plant(i + 1, plant);
        }

        if let Some(identification) = &result.identification {
            println!(
                "Best match: {} ({:.2}% confidence)",
                identification.common_name,
                identification.confidence_rounded()
            );
        }

        if let Some(recommendation) = &result.ai_recommendation {
            println!("Recommendation: {}", recommendation);
        }
    }

    fn on_empty(&self) {
        println!("\nNo plants matched your search. Try different terms or features.");
    }

    fn on_error(&self, error: &SearchError) {
        eprintln!("Search failed: {}", error);
        if error.is_transient() {
            eprintln!("This looks temporary - submitting the search again may work.");
        }
    }

    fn on_invalid(&self, error: &ValidationError) {
        eprintln!("Invalid input: {}", error);
    }
}
