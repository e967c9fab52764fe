//! Response normalization
//!
//! The backend wraps payloads inconsistently: most endpoints envelope as
//! `{data: ...}`, the symptom search nests `{plants, aiRecommendation}`
//! inside that, older deployments return bare arrays, and plant records
//! themselves use two generations of field names. This module is the single
//! place where all of that collapses into the canonical shapes.
//!
//! Decoding is an exhaustive match over [`serde_json::Value`]; a payload
//! that fits none of the known shapes is an explicit
//! [`SearchError::UnrecognizedShape`], never silently probed around.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{IdentificationError, SearchError};
use crate::models::{Availability, Identification, Plant, SafetyLevel, SearchResult};

/// Raw plant record as it appears on the wire, covering both the backend's
/// camelCase fields and the legacy dataset's short names.
#[derive(Debug, Deserialize)]
struct RawPlant {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default, alias = "commonName")]
    name: Option<String>,
    #[serde(default, rename = "scientificName", alias = "scientific", alias = "scientific_name")]
    scientific_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "medicinalUses", alias = "uses", alias = "medicinal_uses")]
    medicinal_uses: Vec<String>,
    #[serde(default, rename = "safetyRating", alias = "safety", alias = "safety_rating")]
    safety: Option<String>,
    #[serde(default)]
    availability: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default, rename = "reviewCount", alias = "reviews", alias = "review_count")]
    review_count: Option<u32>,
    #[serde(default, rename = "imageUrl", alias = "image", alias = "image_url")]
    image_url: Option<String>,
    #[serde(default)]
    precautions: Option<String>,
    #[serde(default)]
    dosage: Option<String>,
    #[serde(default, rename = "activeCompounds", alias = "active_compounds")]
    active_compounds: Vec<String>,
}

/// The backend sends numeric ids, the legacy dataset string keys.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Str(s) => s,
        }
    }
}

/// Best-match record from the identification endpoint.
#[derive(Debug, Deserialize)]
struct RawIdentification {
    #[serde(default, rename = "commonName", alias = "common_name", alias = "name")]
    common_name: Option<String>,
    #[serde(default, rename = "scientificName", alias = "scientific_name", alias = "scientific")]
    scientific_name: Option<String>,
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    genus: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, rename = "medicinalUses", alias = "uses")]
    medicinal_uses: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    dosage: Option<String>,
    #[serde(default)]
    precautions: Option<String>,
}

/// Decode any of the accepted search-response shapes into one canonical
/// [`SearchResult`].
///
/// Accepted: a bare array, `{data: <payload>}` (recursively, since the
/// symptom endpoint nests its envelope), `{plants: [...]}` with an optional
/// `aiRecommendation`, and `null` / missing payloads, which yield an empty
/// result rather than an error.
pub fn decode_search_result(value: Value) -> Result<SearchResult, SearchError> {
    match value {
        Value::Null => Ok(SearchResult::empty()),
        Value::Array(items) => Ok(SearchResult {
            plants: plants_from(items),
            ai_recommendation: None,
            identification: None,
        }),
        Value::Object(mut map) => {
            if let Some(inner) = map.remove("data") {
                return decode_search_result(inner);
            }
            if let Some(plants) = map.remove("plants") {
                let ai_recommendation = map
                    .remove("aiRecommendation")
                    .or_else(|| map.remove("ai_recommendation"))
                    .and_then(|v| v.as_str().map(str::to_owned));
                let items = match plants {
                    Value::Null => Vec::new(),
                    Value::Array(items) => items,
                    _ => return Err(SearchError::UnrecognizedShape),
                };
                return Ok(SearchResult {
                    plants: plants_from(items),
                    ai_recommendation,
                    identification: None,
                });
            }
            Err(SearchError::UnrecognizedShape)
        }
        _ => Err(SearchError::UnrecognizedShape),
    }
}

/// Decode a single-plant payload (`GET /plants/{id}` style), tolerating the
/// `{data: {...}}` envelope. A null payload is `None`, not an error.
pub fn decode_single_plant(value: Value) -> Result<Option<Plant>, SearchError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(mut map) => {
            if let Some(inner) = map.remove("data") {
                return decode_single_plant(inner);
            }
            let raw: RawPlant = serde_json::from_value(Value::Object(map))?;
            Ok(into_plant(raw))
        }
        _ => Err(SearchError::UnrecognizedShape),
    }
}

/// Decode the identification endpoint's best-match object into a
/// single-element result list plus the [`Identification`] record.
///
/// An empty or absent match is [`IdentificationError::NoMatch`] rather than
/// an empty result.
pub fn decode_identification(value: Value) -> Result<SearchResult, SearchError> {
    let value = unwrap_identification(value)?;

    let raw: RawIdentification = serde_json::from_value(value)?;
    let common_name = match (raw.common_name, raw.scientific_name.clone()) {
        (Some(name), _) => name,
        (None, Some(scientific)) => scientific,
        (None, None) => return Err(IdentificationError::NoMatch.into()),
    };

    let identification = Identification {
        common_name: common_name.clone(),
        scientific_name: raw.scientific_name.clone(),
        family: raw.family,
        genus: raw.genus,
        confidence: raw.confidence.unwrap_or(0.0).clamp(0.0, 100.0),
    };

    let plant = Plant {
        id: slug(&common_name),
        name: common_name,
        scientific_name: raw.scientific_name,
        description: raw.description,
        medicinal_uses: raw.medicinal_uses,
        precautions: raw.precautions,
        dosage: raw.dosage,
        ..Plant::default()
    };

    Ok(SearchResult {
        plants: vec![plant],
        ai_recommendation: None,
        identification: Some(identification),
    })
}

fn unwrap_identification(value: Value) -> Result<Value, SearchError> {
    match value {
        Value::Null => Err(IdentificationError::NoMatch.into()),
        Value::Object(mut map) => {
            if let Some(inner) = map.remove("data") {
                return unwrap_identification(inner);
            }
            Ok(Value::Object(map))
        }
        // Some deployments respond with a one-element candidate list.
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| IdentificationError::NoMatch.into()),
        _ => Err(SearchError::UnrecognizedShape),
    }
}

/// Convert raw records, dropping malformed ones and duplicates. The first
/// occurrence of an id wins, which keeps ids unique within a result set.
fn plants_from(items: Vec<Value>) -> Vec<Plant> {
    let mut plants = Vec::with_capacity(items.len());
    let mut seen = std::collections::HashSet::new();

    for item in items {
        let raw: RawPlant = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "skipping malformed plant record");
                continue;
            }
        };
        if let Some(plant) = into_plant(raw) {
            if seen.insert(plant.id.clone()) {
                plants.push(plant);
            }
        }
    }

    plants
}

fn into_plant(raw: RawPlant) -> Option<Plant> {
    let id = match (raw.id, &raw.name) {
        (Some(id), _) => id.into_string(),
        (None, Some(name)) => slug(name),
        (None, None) => {
            warn!("skipping plant record with neither id nor name");
            return None;
        }
    };
    let name = raw.name.unwrap_or_else(|| id.clone());

    Some(Plant {
        id,
        name,
        scientific_name: raw.scientific_name,
        description: raw.description,
        medicinal_uses: raw.medicinal_uses,
        safety: raw
            .safety
            .as_deref()
            .map(SafetyLevel::parse)
            .unwrap_or_default(),
        availability: raw
            .availability
            .as_deref()
            .map(Availability::parse)
            .unwrap_or_default(),
        rating: raw.rating.unwrap_or(0.0).clamp(0.0, 5.0),
        review_count: raw.review_count.unwrap_or(0),
        image_url: raw.image_url,
        precautions: raw.precautions,
        dosage: raw.dosage,
        active_compounds: raw.active_compounds,
    })
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: u32, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "scientificName": "Mentha x piperita",
            "medicinalUses": ["Headache relief", "Digestive issues"],
            "safetyRating": "SAFE",
            "availability": "common",
            "rating": 4.5,
            "reviewCount": 76,
            "imageUrl": "https://example.com/peppermint.jpg"
        })
    }

    #[test]
    fn test_equivalent_records_decode_identically_across_shapes() {
        let bare = json!([record(1, "Peppermint")]);
        let data = json!({"data": [record(1, "Peppermint")]});
        let enveloped = json!({"plants": [record(1, "Peppermint")]});
        let nested = json!({"data": {"plants": [record(1, "Peppermint")]}});

        let from_bare = decode_search_result(bare).unwrap();
        let from_data = decode_search_result(data).unwrap();
        let from_env = decode_search_result(enveloped).unwrap();
        let from_nested = decode_search_result(nested).unwrap();

        assert_eq!(from_bare.plants, from_data.plants);
        assert_eq!(from_bare.plants, from_env.plants);
        assert_eq!(from_bare.plants, from_nested.plants);
        assert_eq!(from_bare.plants.len(), 1);
        assert_eq!(from_bare.plants[0].id, "1");
    }

    #[test]
    fn test_ai_recommendation_is_carried() {
        let value = json!({
            "plants": [record(1, "Peppermint")],
            "aiRecommendation": "Try peppermint tea before bed."
        });
        let result = decode_search_result(value).unwrap();
        assert_eq!(
            result.ai_recommendation.as_deref(),
            Some("Try peppermint tea before bed.")
        );
    }

    #[test]
    fn test_legacy_field_names_resolve_to_canonical() {
        let value = json!([{
            "id": "aloe",
            "name": "Aloe Vera",
            "scientific": "Aloe barbadensis miller",
            "uses": ["Burns", "Skin irritation"],
            "safety": "safe",
            "availability": "common",
            "rating": 4.8,
            "reviews": 142,
            "image": "https://example.com/aloe.jpg"
        }]);

        let result = decode_search_result(value).unwrap();
        let plant = &result.plants[0];
        assert_eq!(plant.id, "aloe");
        assert_eq!(plant.scientific_name.as_deref(), Some("Aloe barbadensis miller"));
        assert_eq!(plant.medicinal_uses, vec!["Burns", "Skin irritation"]);
        assert_eq!(plant.safety, SafetyLevel::Safe);
        assert_eq!(plant.review_count, 142);
        assert_eq!(plant.image_url.as_deref(), Some("https://example.com/aloe.jpg"));
    }

    #[test]
    fn test_backend_safety_levels_collapse() {
        for (label, expected) in [
            ("SAFE", SafetyLevel::Safe),
            ("GENERALLY_SAFE", SafetyLevel::GenerallySafe),
            ("USE_WITH_CAUTION", SafetyLevel::Caution),
            ("POTENTIALLY_HARMFUL", SafetyLevel::Caution),
            ("TOXIC", SafetyLevel::Caution),
            ("something-new", SafetyLevel::Unknown),
        ] {
            assert_eq!(SafetyLevel::parse(label), expected, "label {label}");
        }
    }

    #[test]
    fn test_rating_is_clamped() {
        let value = json!([
            {"id": 1, "name": "A", "rating": 9.7},
            {"id": 2, "name": "B", "rating": -1.0}
        ]);
        let result = decode_search_result(value).unwrap();
        assert_eq!(result.plants[0].rating, 5.0);
        assert_eq!(result.plants[1].rating, 0.0);
    }

    #[test]
    fn test_duplicate_ids_keep_first_occurrence() {
        let value = json!([record(1, "First"), record(1, "Second"), record(2, "Third")]);
        let result = decode_search_result(value).unwrap();
        let names: Vec<_> = result.plants.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Third"]);
    }

    #[test]
    fn test_empty_and_null_payloads_are_empty_results() {
        assert!(decode_search_result(json!([])).unwrap().is_empty());
        assert!(decode_search_result(json!({"data": null})).unwrap().is_empty());
        assert!(decode_search_result(json!({"data": []})).unwrap().is_empty());
        assert!(decode_search_result(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_shape_is_an_error() {
        let err = decode_search_result(json!({"results": []})).unwrap_err();
        assert!(matches!(err, SearchError::UnrecognizedShape));

        let err = decode_search_result(json!("plants")).unwrap_err();
        assert!(matches!(err, SearchError::UnrecognizedShape));
    }

    #[test]
    fn test_identification_keeps_confidence_unrounded() {
        let value = json!({"data": {
            "commonName": "Aloe Vera",
            "scientificName": "Aloe barbadensis miller",
            "confidence": 87.4567,
            "medicinalUses": ["Burns"]
        }});

        let result = decode_identification(value).unwrap();
        assert_eq!(result.plants.len(), 1);
        let ident = result.identification.unwrap();
        assert_eq!(ident.confidence, 87.4567);
        assert_eq!(ident.confidence_rounded(), 87.46);
    }

    #[test]
    fn test_identification_without_match_is_no_match() {
        let err = decode_identification(json!({"data": null})).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Identification(IdentificationError::NoMatch)
        ));

        let err = decode_identification(json!({"confidence": 12.0})).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Identification(IdentificationError::NoMatch)
        ));
    }

    #[test]
    fn test_single_plant_decode() {
        let value = json!({"data": record(7, "Ginger")});
        let plant = decode_single_plant(value).unwrap().unwrap();
        assert_eq!(plant.id, "7");
        assert_eq!(plant.name, "Ginger");

        assert!(decode_single_plant(Value::Null).unwrap().is_none());
    }
}
