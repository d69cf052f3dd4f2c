//! Pretrained-model boundary.
//!
//! Models are opaque: the service only sees labels and confidences. Adapters
//! are registered once at startup into a `ModelRegistry` which the analyzer
//! consults per request; an empty registry routes everything through the
//! heuristic fallback.

use image::DynamicImage;
use std::sync::Arc;

use super::heuristics::LabelScore;

/// Label substrings that mark a prediction as a deepfake verdict.
const DEEPFAKE_KEYWORDS: &[&str] = &["deepfake", "fake", "synthetic", "generated", "artificial"];

#[derive(Debug)]
pub struct ModelError(pub String);

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model inference failed: {}", self.0)
    }
}

/// A single classifier output.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
    /// Index of the winning class in the adapter's label space
    pub class_index: usize,
    /// Top-k labels, highest confidence first
    pub top: Vec<LabelScore>,
}

/// Boundary trait wrapping a pretrained image classifier.
pub trait ImageClassifier: Send + Sync {
    /// Short model name used in result messages
    fn name(&self) -> &str;

    /// The adapter's full label space, indexed by class id
    fn labels(&self) -> &[String];

    fn classify(&self, image: &DynamicImage) -> Result<Prediction, ModelError>;
}

/// Adapters available to the analyzer, fixed at startup.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    classifier: Option<Arc<dyn ImageClassifier>>,
    deepfake: Option<Arc<dyn ImageClassifier>>,
}

impl ModelRegistry {
    /// A registry with no adapters; every analysis uses the heuristic path.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_classifier(mut self, adapter: Arc<dyn ImageClassifier>) -> Self {
        self.classifier = Some(adapter);
        self
    }

    pub fn with_deepfake(mut self, adapter: Arc<dyn ImageClassifier>) -> Self {
        self.deepfake = Some(adapter);
        self
    }

    pub fn classifier(&self) -> Option<&Arc<dyn ImageClassifier>> {
        self.classifier.as_ref()
    }

    pub fn deepfake(&self) -> Option<&Arc<dyn ImageClassifier>> {
        self.deepfake.as_ref()
    }
}

/// The two deepfake-positivity signals, reported separately so callers can
/// audit disagreements between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeepfakeSignals {
    /// The predicted label text contains a deepfake keyword
    pub label_signal: bool,
    /// The label space has exactly two classes and index 1 won
    pub class_index_signal: bool,
}

impl DeepfakeSignals {
    pub fn is_deepfake(&self) -> bool {
        self.label_signal || self.class_index_signal
    }
}

/// Evaluate both positivity rules for a deepfake-model prediction.
pub fn deepfake_signals(labels: &[String], prediction: &Prediction) -> DeepfakeSignals {
    let label_lower = prediction.label.to_lowercase();
    let label_signal = DEEPFAKE_KEYWORDS.iter().any(|kw| label_lower.contains(kw));
    let class_index_signal = labels.len() == 2 && prediction.class_index == 1;
    DeepfakeSignals {
        label_signal,
        class_index_signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(label: &str, class_index: usize) -> Prediction {
        Prediction {
            label: label.to_string(),
            confidence: 0.9,
            class_index,
            top: Vec::new(),
        }
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keyword_signal() {
        let space = labels(&["Realism", "DeepFake"]);
        let signals = deepfake_signals(&space, &prediction("DeepFake", 1));
        assert!(signals.label_signal);
        assert!(signals.class_index_signal);
        assert!(signals.is_deepfake());
    }

    #[test]
    fn test_class_index_without_keyword() {
        // Binary model with an opaque positive label: index rule still fires
        let space = labels(&["class_0", "class_1"]);
        let signals = deepfake_signals(&space, &prediction("class_1", 1));
        assert!(!signals.label_signal);
        assert!(signals.class_index_signal);
        assert!(signals.is_deepfake());
    }

    #[test]
    fn test_disagreement_is_visible() {
        // Three-class model predicting "synthetic": keyword fires, index
        // rule cannot, and both states stay observable
        let space = labels(&["real", "synthetic", "altered"]);
        let signals = deepfake_signals(&space, &prediction("synthetic", 1));
        assert!(signals.label_signal);
        assert!(!signals.class_index_signal);
        assert!(signals.is_deepfake());
    }

    #[test]
    fn test_negative_prediction() {
        let space = labels(&["Real", "Fake"]);
        let signals = deepfake_signals(&space, &prediction("Real", 0));
        assert!(!signals.label_signal);
        assert!(!signals.class_index_signal);
        assert!(!signals.is_deepfake());
    }
}
