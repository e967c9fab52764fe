//! Search orchestration
//!
//! The orchestrator sits between validated input and presentation: it
//! dispatches each [`SearchRequest`] variant to its backend call, runs the
//! response through normalization, and guards against overlapping searches
//! with a per-mode sequence counter. A stale response that completes after
//! a newer one has rendered is discarded, never shown.
//!
//! There is no cancellation of in-flight I/O; supersession is the sequence
//! check alone, which matches a single-threaded UI event loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::error::SearchError;
use crate::models::{FormState, ImageUpload, SearchMode, SearchRequest, SearchResult};
use crate::normalize::{decode_identification, decode_search_result};
use crate::resolver;

/// Symptom vocabulary for the offline fallback, in source order.
const SYMPTOM_TERMS: [&str; 27] = [
    "headache",
    "fever",
    "pain",
    "ache",
    "nausea",
    "vomiting",
    "diarrhea",
    "constipation",
    "cough",
    "cold",
    "flu",
    "sore throat",
    "stress",
    "anxiety",
    "depression",
    "insomnia",
    "fatigue",
    "inflammation",
    "swelling",
    "rash",
    "irritation",
    "itching",
    "indigestion",
    "bloating",
    "heartburn",
    "stomach",
    "digestive",
];

/// Shown when the fallback finds no known symptom term in the description.
const SYMPTOM_GUIDANCE: &str = "Couldn't identify specific symptoms. Try describing \
where you feel discomfort and what kind of sensation it is, for example \
\"I have a headache\" or \"I feel stressed\".";

/// Backend collaborator for the orchestrator. Implemented by the live
/// [`ApiClient`](crate::api::ApiClient) and by in-memory fakes in tests.
///
/// Every call returns the raw JSON payload; unwrapping and field-name
/// normalization stay in the orchestrator's pipeline.
#[allow(async_fn_in_trait)]
pub trait SearchBackend {
    async fn search_by_name(&self, query: &str) -> Result<Value, SearchError>;
    async fn search_by_symptoms(&self, description: &str) -> Result<Value, SearchError>;
    async fn search_by_visual(&self, features: &[String]) -> Result<Value, SearchError>;
    async fn identify_image(&self, upload: &ImageUpload) -> Result<Value, SearchError>;
    async fn fetch_plant(&self, id: &str) -> Result<Value, SearchError>;
}

/// Rendering collaborator. Implementations own their interior mutability,
/// so every hook takes `&self`.
///
/// The zero-result and error paths are distinct from the loading state on
/// purpose; a UI must be able to tell them apart.
pub trait PlantPresenter {
    fn on_loading(&self, mode: SearchMode);
    fn on_results(&self, result: &SearchResult);
    fn on_empty(&self);
    fn on_error(&self, error: &SearchError);
    fn on_invalid(&self, error: &crate::error::ValidationError);
}

/// Ticket for one dispatched search, compared against the last-rendered
/// sequence of its mode before anything reaches the presenter.
#[derive(Debug, Clone, Copy)]
pub struct SearchTicket {
    mode: SearchMode,
    seq: u64,
}

impl SearchTicket {
    #[must_use]
    pub fn mode(&self) -> SearchMode {
        self.mode
    }
}

/// Orchestrates dispatch, normalization and presentation for all four
/// search modes. Explicitly constructed and passed around; holds no global
/// state.
pub struct SearchOrchestrator<B> {
    backend: B,
    min_skeleton: Option<Duration>,
    issued: [AtomicU64; SearchMode::COUNT],
    rendered: [AtomicU64; SearchMode::COUNT],
}

impl<B: SearchBackend> SearchOrchestrator<B> {
    pub fn new(backend: B, min_skeleton: Option<Duration>) -> Self {
        Self {
            backend,
            min_skeleton,
            issued: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
            rendered: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Issue the next sequence number for a mode. A newer ticket supersedes
    /// every older one of the same mode.
    pub fn begin(&self, mode: SearchMode) -> SearchTicket {
        let seq = self.issued[mode.index()].fetch_add(1, Ordering::Relaxed) + 1;
        SearchTicket { mode, seq }
    }

    /// Claim the right to render for this ticket. Returns `false` when a
    /// newer search of the same mode has already rendered, in which case
    /// the completion must be dropped.
    pub fn try_present(&self, ticket: &SearchTicket) -> bool {
        let previous =
            self.rendered[ticket.mode.index()].fetch_max(ticket.seq, Ordering::Relaxed);
        previous < ticket.seq
    }

    /// Dispatch one validated request and normalize its response.
    pub async fn execute(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        match request {
            SearchRequest::ByName { query } => {
                decode_search_result(self.backend.search_by_name(query).await?)
            }
            SearchRequest::BySymptom { description } => self.symptom_search(description).await,
            SearchRequest::ByVisualFeatures { features } => {
                decode_search_result(self.backend.search_by_visual(features).await?)
            }
            SearchRequest::ByImage { upload } => {
                decode_identification(self.backend.identify_image(upload).await?)
            }
        }
    }

    /// Symptom search with the offline fallback: when the analysis call
    /// fails, keyword-match the description locally and run a plain plant
    /// search over the matched terms instead of surfacing the failure.
    /// Failures of that secondary search propagate unmasked.
    async fn symptom_search(&self, description: &str) -> Result<SearchResult, SearchError> {
        let primary = match self.backend.search_by_symptoms(description).await {
            Ok(value) => decode_search_result(value),
            Err(err) => Err(err),
        };

        let err = match primary {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };

        warn!(error = %err, "symptom analysis failed, trying offline fallback");
        let matched = match_symptom_terms(description);
        if matched.is_empty() {
            return Err(SearchError::NoSymptomsRecognized {
                guidance: SYMPTOM_GUIDANCE.to_string(),
            });
        }

        let query = matched.join(",");
        info!(query = %query, "offline fallback matched symptom terms");
        decode_search_result(self.backend.search_by_name(&query).await?)
    }

    /// Full submission flow: validate, dispatch, hold the skeleton for its
    /// minimum display time, then present unless a newer search of the same
    /// mode already has.
    pub async fn run_search<P: PlantPresenter>(
        &self,
        mode: SearchMode,
        form: &FormState,
        presenter: &P,
    ) {
        let request = match resolver::resolve(mode, form) {
            Ok(request) => request,
            Err(err) => {
                warn!(mode = %mode, error = %err, "rejected search input");
                presenter.on_invalid(&err);
                return;
            }
        };

        let ticket = self.begin(mode);
        presenter.on_loading(mode);
        let started = Instant::now();

        match self.execute(&request).await {
            Ok(result) => {
                self.hold_skeleton(started).await;
                if !self.try_present(&ticket) {
                    debug!(mode = %mode, "discarding stale search response");
                    return;
                }
                if result.is_empty() {
                    presenter.on_empty();
                } else {
                    info!(mode = %mode, results = result.plants.len(), "search completed");
                    presenter.on_results(&result);
                }
            }
            Err(err) => {
                if !self.try_present(&ticket) {
                    debug!(mode = %mode, "discarding stale search failure");
                    return;
                }
                warn!(mode = %mode, error = %err, transient = err.is_transient(), "search failed");
                presenter.on_error(&err);
            }
        }
    }

    /// Perceived-latency smoothing: keep the skeleton up for its minimum
    /// display time even when the backend answered faster.
    async fn hold_skeleton(&self, started: Instant) {
        if let Some(min) = self.min_skeleton {
            let elapsed = started.elapsed();
            if elapsed < min {
                sleep(min - elapsed).await;
            }
        }
    }
}

/// Match the fixed vocabulary against a lowercased description. A term that
/// only occurs inside a longer matched term does not count on its own
/// ("ache" inside "headache").
fn match_symptom_terms(description: &str) -> Vec<&'static str> {
    let lower = description.to_lowercase();
    let mut hits: Vec<&'static str> = SYMPTOM_TERMS
        .iter()
        .copied()
        .filter(|term| lower.contains(term))
        .collect();

    let mut by_length = hits.clone();
    by_length.sort_by_key(|term| std::cmp::Reverse(term.len()));

    let mut remaining = lower;
    let mut kept = std::collections::HashSet::new();
    for term in by_length {
        if remaining.contains(term) {
            kept.insert(term);
            remaining = remaining.replace(term, " ");
        }
    }

    hits.retain(|term| kept.contains(term));
    hits
}
