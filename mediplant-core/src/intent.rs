//! Intent dispatch
//!
//! The UI never calls the orchestrator directly; it emits typed intents
//! into an mpsc channel and [`run_intent_loop`] consumes them. This keeps
//! the orchestrator free of any knowledge about the rendering technology
//! on the other side.

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::{FormState, SearchMode};
use crate::normalize::decode_single_plant;
use crate::prefs::{StateStore, UserSideState};
use crate::search::{PlantPresenter, SearchBackend, SearchOrchestrator};

/// One user action, as emitted by whatever front end is attached.
#[derive(Debug, Clone)]
pub enum Intent {
    /// Submit the current form in the given mode.
    Search { mode: SearchMode, form: FormState },
    /// Open one plant's detail view and record it as recently viewed.
    ViewPlant { plant_id: String },
    ToggleFavorite { plant_id: String },
    AddToComparison { plant_id: String },
    RemoveFromComparison { plant_id: String },
    ClearComparison,
    ClearHistory,
}

/// Consume intents until the channel closes. Every failure is reported
/// through the presenter; nothing here aborts the loop.
pub async fn run_intent_loop<B, S, P>(
    orchestrator: &SearchOrchestrator<B>,
    state: &mut UserSideState<S>,
    presenter: &P,
    mut intents: mpsc::Receiver<Intent>,
) where
    B: SearchBackend,
    S: StateStore,
    P: PlantPresenter,
{
    while let Some(intent) = intents.recv().await {
        match intent {
            Intent::Search { mode, form } => {
                if let Some(query) = submitted_query(mode, &form) {
                    state.record_search(&query);
                }
                orchestrator.run_search(mode, &form, presenter).await;
            }
            Intent::ViewPlant { plant_id } => {
                match orchestrator.backend().fetch_plant(&plant_id).await {
                    Ok(value) => match decode_single_plant(value) {
                        Ok(Some(plant)) => {
                            state.add_recently_viewed(&plant_id);
                            presenter.on_results(&crate::models::SearchResult {
                                plants: vec![plant],
                                ai_recommendation: None,
                                identification: None,
                            });
                        }
                        Ok(None) => presenter.on_empty(),
                        Err(err) => presenter.on_error(&err),
                    },
                    Err(err) => presenter.on_error(&err),
                }
            }
            Intent::ToggleFavorite { plant_id } => {
                let added = state.toggle_favorite(&plant_id);
                info!(plant_id = %plant_id, added, "favorite toggled");
            }
            Intent::AddToComparison { plant_id } => {
                if state.add_to_comparison(&plant_id) {
                    info!(plant_id = %plant_id, "added to comparison");
                } else {
                    warn!(plant_id = %plant_id, "comparison add refused (full or duplicate)");
                }
            }
            Intent::RemoveFromComparison { plant_id } => {
                state.remove_from_comparison(&plant_id);
            }
            Intent::ClearComparison => state.clear_comparison(),
            Intent::ClearHistory => state.clear_history(),
        }
    }
}

/// Text searches go into history; visual and image submissions do not.
fn submitted_query(mode: SearchMode, form: &FormState) -> Option<String> {
    match mode {
        SearchMode::Name | SearchMode::Symptom => {
            let query = form.query.trim();
            (!query.is_empty()).then(|| query.to_string())
        }
        SearchMode::Visual | SearchMode::Image => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_text_modes_enter_history() {
        let form = FormState {
            query: " burns ".to_string(),
            ..FormState::default()
        };
        assert_eq!(
            submitted_query(SearchMode::Name, &form).as_deref(),
            Some("burns")
        );
        assert_eq!(
            submitted_query(SearchMode::Symptom, &form).as_deref(),
            Some("burns")
        );
        assert_eq!(submitted_query(SearchMode::Visual, &form), None);
        assert_eq!(submitted_query(SearchMode::Image, &form), None);
    }

    #[test]
    fn test_blank_queries_stay_out_of_history() {
        let form = FormState {
            query: "   ".to_string(),
            ..FormState::default()
        };
        assert_eq!(submitted_query(SearchMode::Name, &form), None);
    }
}
