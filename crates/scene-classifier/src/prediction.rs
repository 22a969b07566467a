//! Prediction result: ordered label -> probability mapping

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Probability per label, in vocabulary order.
///
/// Serializes as a JSON object whose key order matches iteration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    entries: Vec<(String, f64)>,
}

impl Prediction {
    /// Pair each label with the probability at the same index
    pub(crate) fn from_parts(labels: &[String], probabilities: &[f32]) -> Self {
        let entries = labels
            .iter()
            .zip(probabilities)
            .map(|(label, p)| (label.clone(), *p as f64))
            .collect();
        Self { entries }
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Probability of a label
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
    }

    /// Iterate `(label, probability)` in vocabulary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, p)| (l.as_str(), *p))
    }

    /// Labels in vocabulary order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// Most probable label
    pub fn top(&self) -> Option<(&str, f64)> {
        self.ranked(1).into_iter().next()
    }

    /// The `n` most probable labels, highest first. Ties keep vocabulary order.
    pub fn ranked(&self, n: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Keep only the `n` most probable labels, highest first
    pub fn into_ranked(self, n: usize) -> Prediction {
        let entries = self
            .ranked(n)
            .into_iter()
            .map(|(l, p)| (l.to_string(), p))
            .collect();
        Prediction { entries }
    }

    /// Sum of all probabilities
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, probability) in &self.entries {
            map.serialize_entry(label, probability)?;
        }
        map.end()
    }
}
