//! Column classification from header text.

use super::sensors::{CLASSIFICATION_RULES, SensorType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info};

// Separators collapsed to a single space before keyword matching.
static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_\-./]+").expect("Invalid regex: header separators"));

/// Lower-case a header and collapse separator runs into single spaces.
pub fn normalize_header(header: &str) -> String {
    let lower = header.to_lowercase();
    SEPARATORS.replace_all(&lower, " ").trim().to_string()
}

/// Classify a header into a sensor type.
///
/// Pure function of the header text. Unmatched headers resolve to
/// [`SensorType::Generic`].
pub fn classify_header(header: &str) -> SensorType {
    let normalized = normalize_header(header);

    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| normalized.contains(kw)))
        .map(|rule| rule.sensor)
        .unwrap_or(SensorType::Generic)
}

/// Classifier that remembers each header's type for the lifetime of a run.
#[derive(Debug, Default, Clone)]
pub struct ColumnClassifier {
    cache: HashMap<String, SensorType>,
}

impl ColumnClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a header, computing it at most once.
    pub fn classify(&mut self, header: &str) -> SensorType {
        if let Some(sensor) = self.cache.get(header) {
            return *sensor;
        }

        let sensor = classify_header(header);
        if sensor == SensorType::Generic {
            info!("Column '{}' matched no sensor keywords, using generic", header);
        } else {
            debug!("Column '{}' classified as {}", header, sensor);
        }

        self.cache.insert(header.to_string(), sensor);
        sensor
    }

    /// Number of distinct headers classified so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
