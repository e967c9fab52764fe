//! Input resolver
//!
//! Turns the current form state into a validated [`SearchRequest`], or
//! rejects it before anything touches the network. Reading the form is the
//! only thing this module does; it has no side effects.

use crate::error::ValidationError;
use crate::models::{FormState, SearchMode, SearchRequest};

/// MIME types the identification pipeline accepts.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Upload size ceiling: 5 MiB.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Validate the form for the active mode and build the request to dispatch.
pub fn resolve(mode: SearchMode, form: &FormState) -> Result<SearchRequest, ValidationError> {
    match mode {
        SearchMode::Name => {
            let query = form.query.trim();
            if query.is_empty() {
                return Err(ValidationError::EmptyQuery);
            }
            Ok(SearchRequest::ByName {
                query: query.to_string(),
            })
        }
        SearchMode::Symptom => {
            let description = form.query.trim();
            if description.is_empty() {
                return Err(ValidationError::EmptyQuery);
            }
            Ok(SearchRequest::BySymptom {
                description: description.to_string(),
            })
        }
        SearchMode::Visual => {
            // The UI toggles features on and off; dedupe but keep toggle order.
            let mut features = Vec::new();
            for feature in &form.selected_features {
                if !features.contains(feature) {
                    features.push(feature.clone());
                }
            }
            if features.is_empty() {
                return Err(ValidationError::NoFeaturesSelected);
            }
            Ok(SearchRequest::ByVisualFeatures { features })
        }
        SearchMode::Image => {
            let upload = form.image.as_ref().ok_or(ValidationError::NoImageSelected)?;
            let mime = upload.mime_type.to_ascii_lowercase();
            if !ALLOWED_IMAGE_TYPES.contains(&mime.as_str()) {
                return Err(ValidationError::InvalidFileType {
                    mime: upload.mime_type.clone(),
                });
            }
            if upload.size_bytes() > MAX_IMAGE_BYTES {
                return Err(ValidationError::FileTooLarge {
                    size_bytes: upload.size_bytes(),
                });
            }
            Ok(SearchRequest::ByImage {
                upload: upload.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageUpload;

    fn text_form(query: &str) -> FormState {
        FormState {
            query: query.to_string(),
            ..FormState::default()
        }
    }

    fn image_form(mime: &str, size: usize) -> FormState {
        FormState {
            image: Some(ImageUpload {
                file_name: "leaf.jpg".to_string(),
                mime_type: mime.to_string(),
                bytes: vec![0u8; size],
            }),
            ..FormState::default()
        }
    }

    #[test]
    fn test_name_query_is_trimmed() {
        let request = resolve(SearchMode::Name, &text_form("  aloe vera  ")).unwrap();
        assert_eq!(
            request,
            SearchRequest::ByName {
                query: "aloe vera".to_string()
            }
        );
    }

    #[test]
    fn test_blank_query_is_rejected() {
        for mode in [SearchMode::Name, SearchMode::Symptom] {
            let err = resolve(mode, &text_form("   \t ")).unwrap_err();
            assert_eq!(err, ValidationError::EmptyQuery);
        }
    }

    #[test]
    fn test_symptom_description_passes_through() {
        let request =
            resolve(SearchMode::Symptom, &text_form("I have a headache and nausea")).unwrap();
        assert_eq!(
            request,
            SearchRequest::BySymptom {
                description: "I have a headache and nausea".to_string()
            }
        );
    }

    #[test]
    fn test_visual_features_are_deduplicated_in_order() {
        let form = FormState {
            selected_features: vec![
                "heart-shaped-leaves".to_string(),
                "white-flowers".to_string(),
                "heart-shaped-leaves".to_string(),
            ],
            ..FormState::default()
        };
        let request = resolve(SearchMode::Visual, &form).unwrap();
        assert_eq!(
            request,
            SearchRequest::ByVisualFeatures {
                features: vec![
                    "heart-shaped-leaves".to_string(),
                    "white-flowers".to_string()
                ]
            }
        );
    }

    #[test]
    fn test_no_features_selected_is_rejected() {
        let err = resolve(SearchMode::Visual, &FormState::default()).unwrap_err();
        assert_eq!(err, ValidationError::NoFeaturesSelected);
    }

    #[test]
    fn test_missing_image_is_rejected() {
        let err = resolve(SearchMode::Image, &FormState::default()).unwrap_err();
        assert_eq!(err, ValidationError::NoImageSelected);
    }

    #[test]
    fn test_unsupported_image_type_is_rejected() {
        let err = resolve(SearchMode::Image, &image_form("image/gif", 1024)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidFileType {
                mime: "image/gif".to_string()
            }
        );
    }

    #[test]
    fn test_oversize_image_is_rejected_before_dispatch() {
        let six_mb = 6 * 1024 * 1024;
        let err = resolve(SearchMode::Image, &image_form("image/jpeg", six_mb)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::FileTooLarge {
                size_bytes: six_mb as u64
            }
        );
    }

    #[test]
    fn test_image_at_limit_is_accepted() {
        let form = image_form("image/png", (MAX_IMAGE_BYTES) as usize);
        assert!(resolve(SearchMode::Image, &form).is_ok());
    }
}
