pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod intent;
pub mod models;
pub mod normalize;
pub mod prefs;
pub mod resolver;
pub mod search;

// Re-export commonly used types
pub use api::ApiClient;
pub use config::Config;
pub use error::{IdentificationError, SearchError, ValidationError};
pub use intent::{Intent, run_intent_loop};
pub use models::{
    Availability, FormState, Identification, ImageUpload, Plant, SafetyLevel, SearchMode,
    SearchRequest, SearchResult,
};
pub use prefs::{HistoryEntry, JsonFileStore, MemoryStore, StateSnapshot, UserSideState};
pub use search::{PlantPresenter, SearchBackend, SearchOrchestrator, SearchTicket};
