use serde::{Deserialize, Serialize};

/// Safety classification of a plant, collapsed to the four levels the UI
/// distinguishes. The backend's finer-grained labels map onto these during
/// normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyLevel {
    Safe,
    GenerallySafe,
    Caution,
    #[default]
    Unknown,
}

impl SafetyLevel {
    /// Parse a backend or legacy-dataset label, case-insensitively.
    ///
    /// `USE_WITH_CAUTION`, `POTENTIALLY_HARMFUL` and `TOXIC` all land on
    /// [`SafetyLevel::Caution`]; anything unrecognized is `Unknown`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "safe" => Self::Safe,
            "generally_safe" | "generally safe" => Self::GenerallySafe,
            "caution" | "use_with_caution" | "potentially_harmful" | "toxic" => Self::Caution,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::GenerallySafe => "generally safe",
            Self::Caution => "caution",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How commonly a plant can be sourced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Common,
    Uncommon,
    Rare,
    #[default]
    Unknown,
}

impl Availability {
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "common" => Self::Common,
            "uncommon" => Self::Uncommon,
            "rare" => Self::Rare,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical plant record after normalization
///
/// Backend responses and the legacy local dataset disagree on field names
/// (`medicinalUses` vs `uses`, `imageUrl` vs `image`, and so on); by the time
/// a record is a `Plant` those variants are resolved, the rating is clamped
/// to [0, 5] and the id is unique within its result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: String,
    pub name: String,
    pub scientific_name: Option<String>,
    pub description: Option<String>,

    #[serde(default)]
    pub medicinal_uses: Vec<String>,

    #[serde(default)]
    pub safety: SafetyLevel,
    #[serde(default)]
    pub availability: Availability,

    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,

    pub image_url: Option<String>,
    pub precautions: Option<String>,
    pub dosage: Option<String>,

    #[serde(default)]
    pub active_compounds: Vec<String>,
}

/// Best-match record from the image identification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    /// Confidence in percent (0-100), stored unrounded.
    pub confidence: f64,
}

impl Identification {
    /// Confidence rounded to two decimals, for display only. The stored
    /// value stays unrounded.
    #[must_use]
    pub fn confidence_rounded(&self) -> f64 {
        (self.confidence * 100.0).round() / 100.0
    }
}

/// One completed search, superseded wholesale by the next search of any mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub plants: Vec<Plant>,
    #[serde(default)]
    pub ai_recommendation: Option<String>,
    /// Present only for image searches.
    #[serde(default)]
    pub identification: Option<Identification>,
}

impl SearchResult {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}

/// The four mutually exclusive query strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    Name,
    Symptom,
    Visual,
    Image,
}

impl SearchMode {
    pub const COUNT: usize = 4;

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Name => 0,
            Self::Symptom => 1,
            Self::Visual => 2,
            Self::Image => 3,
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Name => "name",
            Self::Symptom => "symptom",
            Self::Visual => "visual",
            Self::Image => "image",
        };
        f.write_str(label)
    }
}

/// An image file handed over by the UI for recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Everything the search form currently holds. The resolver reads it,
/// nothing here talks to the network.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub query: String,
    pub selected_features: Vec<String>,
    pub image: Option<ImageUpload>,
}

/// A validated, ready-to-dispatch search. Exactly one variant per submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    ByName { query: String },
    BySymptom { description: String },
    ByVisualFeatures { features: Vec<String> },
    ByImage { upload: ImageUpload },
}

impl SearchRequest {
    #[must_use]
    pub fn mode(&self) -> SearchMode {
        match self {
            Self::ByName { .. } => SearchMode::Name,
            Self::BySymptom { .. } => SearchMode::Symptom,
            Self::ByVisualFeatures { .. } => SearchMode::Visual,
            Self::ByImage { .. } => SearchMode::Image,
        }
    }
}
