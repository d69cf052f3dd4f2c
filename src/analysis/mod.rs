//! Image analysis pipeline: statistics extraction, heuristic scoring, and
//! the model-or-fallback orchestrator.
//!
//! The orchestrator is a hard error boundary: whatever goes wrong while
//! decoding or classifying one image becomes a `{success: false}` payload,
//! never an error that could take down unrelated requests.

pub mod heuristics;
pub mod model;
pub mod stats;

use bytes::Bytes;
use serde_json::{Value, json};
use std::sync::Arc;

use model::{ImageClassifier, ModelRegistry};
use stats::ImageStats;

#[derive(Debug)]
pub enum AnalysisError {
    /// Upload bytes could not be parsed as an image
    Decode(String),
    /// A registered model adapter failed
    Model(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Decode(e) => write!(f, "Failed to decode image: {}", e),
            AnalysisError::Model(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Classification,
    Forgery,
    Deepfake,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Classification => "classification",
            AnalysisKind::Forgery => "forgery",
            AnalysisKind::Deepfake => "deepfake",
        }
    }
}

/// Analysis orchestrator. Cheap to clone; shared across requests.
#[derive(Clone)]
pub struct Analyzer {
    registry: Arc<ModelRegistry>,
}

impl Analyzer {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Run one analysis to completion. Decoding, statistics, and inference
    /// are CPU-bound and run on the blocking pool; the returned payload is
    /// the result envelope, success or failure.
    pub async fn analyze(&self, kind: AnalysisKind, bytes: Bytes) -> Value {
        let registry = self.registry.clone();
        let result =
            tokio::task::spawn_blocking(move || run_analysis(&registry, kind, &bytes)).await;
        match result {
            Ok(value) => value,
            Err(e) => {
                eprintln!("[analysis] Worker task failed: {}", e);
                error_envelope(kind, &format!("Analysis task failed: {}", e))
            }
        }
    }
}

fn error_envelope(kind: AnalysisKind, error: &str) -> Value {
    json!({
        "success": false,
        "error": error,
        "analysis_type": kind.as_str(),
    })
}

fn run_analysis(registry: &ModelRegistry, kind: AnalysisKind, bytes: &[u8]) -> Value {
    let attempt = || -> Result<Value, AnalysisError> {
        let (image, format) = stats::decode(bytes)?;
        let image_stats = stats::compute(&image, format);
        match kind {
            AnalysisKind::Classification => match registry.classifier() {
                Some(adapter) => classification_model(adapter, &image, &image_stats),
                None => Ok(classification_fallback(&image_stats)),
            },
            AnalysisKind::Forgery => Ok(forgery_heuristic(&image_stats)),
            AnalysisKind::Deepfake => match registry.deepfake() {
                Some(adapter) => deepfake_model(adapter, &image, &image_stats),
                None => Ok(deepfake_fallback(&image_stats)),
            },
        }
    };
    match attempt() {
        Ok(value) => value,
        Err(e) => error_envelope(kind, &e.to_string()),
    }
}

fn percent(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

fn classification_model(
    adapter: &Arc<dyn ImageClassifier>,
    image: &image::DynamicImage,
    image_stats: &ImageStats,
) -> Result<Value, AnalysisError> {
    let prediction = adapter
        .classify(image)
        .map_err(|e| AnalysisError::Model(e.to_string()))?;
    Ok(json!({
        "success": true,
        "analysis_type": "classification",
        "predicted_label": prediction.label,
        "confidence": prediction.confidence,
        "top_predictions": prediction.top,
        "basic_analysis": image_stats.to_basic_analysis(),
        "message": format!(
            "Image classified as '{}' with {} confidence using {} model",
            prediction.label,
            percent(prediction.confidence),
            adapter.name()
        ),
    }))
}

fn classification_fallback(image_stats: &ImageStats) -> Value {
    let predictions = heuristics::classify_basic(image_stats);
    let top = &predictions[0];
    json!({
        "success": true,
        "analysis_type": "classification",
        "predicted_label": top.label,
        "confidence": top.confidence,
        "top_predictions": predictions.iter().take(5).collect::<Vec<_>>(),
        "basic_analysis": image_stats.to_basic_analysis(),
        "message": format!(
            "Image classified as '{}' with {} confidence (basic analysis)",
            top.label,
            percent(top.confidence)
        ),
    })
}

fn forgery_heuristic(image_stats: &ImageStats) -> Value {
    let verdict = heuristics::score_forgery(image_stats);
    json!({
        "success": true,
        "analysis_type": "forgery",
        "is_forged": verdict.suspicious,
        "confidence": verdict.confidence,
        "risk_level": verdict.risk_level,
        "forgery_indicators": verdict.indicators,
        "basic_analysis": image_stats.to_basic_analysis(),
        "message": format!(
            "Forgery analysis completed - {} ({} image) using basic analysis",
            verdict.risk_level,
            if verdict.suspicious { "Suspicious" } else { "Normal" }
        ),
    })
}

fn deepfake_model(
    adapter: &Arc<dyn ImageClassifier>,
    image: &image::DynamicImage,
    image_stats: &ImageStats,
) -> Result<Value, AnalysisError> {
    let prediction = adapter
        .classify(image)
        .map_err(|e| AnalysisError::Model(e.to_string()))?;
    let signals = model::deepfake_signals(adapter.labels(), &prediction);
    let is_deepfake = signals.is_deepfake();

    // Risk bands apply only to positive verdicts
    let risk_level = if is_deepfake {
        heuristics::risk_level(prediction.confidence)
    } else {
        "Very Low Risk"
    };

    Ok(json!({
        "success": true,
        "analysis_type": "deepfake",
        "predicted_label": prediction.label,
        "is_deepfake": is_deepfake,
        "label_signal": signals.label_signal,
        "class_index_signal": signals.class_index_signal,
        "confidence": prediction.confidence,
        "risk_level": risk_level,
        "basic_analysis": image_stats.to_basic_analysis(),
        "message": format!(
            "Deepfake analysis completed - {} ({}) using AI model",
            risk_level, prediction.label
        ),
    }))
}

fn deepfake_fallback(image_stats: &ImageStats) -> Value {
    let verdict = heuristics::score_deepfake(image_stats);
    let predicted_label = heuristics::deepfake_label(verdict.confidence);
    json!({
        "success": true,
        "analysis_type": "deepfake",
        "predicted_label": predicted_label,
        "is_deepfake": verdict.suspicious,
        "confidence": verdict.confidence,
        "risk_level": verdict.risk_level,
        "deepfake_indicators": verdict.indicators,
        "basic_analysis": image_stats.to_basic_analysis(),
        "message": format!(
            "Deepfake analysis completed - {} ({}) using basic analysis",
            verdict.risk_level, predicted_label
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use heuristics::LabelScore;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use model::{ModelError, Prediction};
    use rand::Rng;
    use std::io::Cursor;

    fn noise_png(width: u32, height: u32) -> Bytes {
        let mut rng = rand::rng();
        let img = RgbImage::from_fn(width, height, |_, _| {
            Rgb([rng.random(), rng.random(), rng.random()])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        Bytes::from(buf)
    }

    fn heuristic_analyzer() -> Analyzer {
        Analyzer::new(Arc::new(ModelRegistry::empty()))
    }

    struct FakeDeepfakeModel {
        labels: Vec<String>,
        predict_index: usize,
    }

    impl ImageClassifier for FakeDeepfakeModel {
        fn name(&self) -> &str {
            "test-detector"
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn classify(&self, _image: &image::DynamicImage) -> Result<Prediction, ModelError> {
            let label = self.labels[self.predict_index].clone();
            Ok(Prediction {
                label: label.clone(),
                confidence: 0.92,
                class_index: self.predict_index,
                top: vec![LabelScore {
                    label,
                    confidence: 0.92,
                }],
            })
        }
    }

    #[tokio::test]
    async fn test_classification_fallback_envelope() {
        let value = heuristic_analyzer()
            .analyze(AnalysisKind::Classification, noise_png(224, 224))
            .await;
        assert_eq!(value["success"], true);
        assert_eq!(value["analysis_type"], "classification");
        assert_eq!(value["predicted_label"], "Color Image");
        assert!(value["top_predictions"].as_array().unwrap().len() <= 5);
        assert!(value["basic_analysis"]["color_analysis"]["sharpness"].is_number());
        assert!(
            value["message"]
                .as_str()
                .unwrap()
                .ends_with("(basic analysis)")
        );
    }

    #[tokio::test]
    async fn test_forgery_envelope_on_noise() {
        let value = heuristic_analyzer()
            .analyze(AnalysisKind::Forgery, noise_png(224, 224))
            .await;
        assert_eq!(value["success"], true);
        let confidence = value["confidence"].as_f64().unwrap();
        assert!((0.0..=0.9).contains(&confidence));
        assert!(value["is_forged"].is_boolean());
        assert!(value["forgery_indicators"].is_array());
    }

    #[tokio::test]
    async fn test_deepfake_fallback_envelope() {
        let value = heuristic_analyzer()
            .analyze(AnalysisKind::Deepfake, noise_png(64, 64))
            .await;
        assert_eq!(value["success"], true);
        let confidence = value["confidence"].as_f64().unwrap();
        assert!((0.0..=0.85).contains(&confidence));
        assert!(value["predicted_label"].is_string());
        assert!(value["deepfake_indicators"].is_array());
    }

    #[tokio::test]
    async fn test_garbage_bytes_never_raise() {
        let value = heuristic_analyzer()
            .analyze(AnalysisKind::Forgery, Bytes::from_static(b"not an image"))
            .await;
        assert_eq!(value["success"], false);
        assert_eq!(value["analysis_type"], "forgery");
        assert!(value["error"].as_str().unwrap().contains("decode"));
    }

    #[tokio::test]
    async fn test_deepfake_model_path_surfaces_both_signals() {
        let registry = ModelRegistry::empty().with_deepfake(Arc::new(FakeDeepfakeModel {
            labels: vec!["Realism".to_string(), "Deepfake".to_string()],
            predict_index: 1,
        }));
        let value = Analyzer::new(Arc::new(registry))
            .analyze(AnalysisKind::Deepfake, noise_png(64, 64))
            .await;
        assert_eq!(value["success"], true);
        assert_eq!(value["is_deepfake"], true);
        assert_eq!(value["label_signal"], true);
        assert_eq!(value["class_index_signal"], true);
        assert_eq!(value["risk_level"], "High Risk");
        assert!(value["message"].as_str().unwrap().contains("AI model"));
    }

    #[tokio::test]
    async fn test_deepfake_model_negative_prediction() {
        let registry = ModelRegistry::empty().with_deepfake(Arc::new(FakeDeepfakeModel {
            labels: vec!["Realism".to_string(), "Deepfake".to_string()],
            predict_index: 0,
        }));
        let value = Analyzer::new(Arc::new(registry))
            .analyze(AnalysisKind::Deepfake, noise_png(64, 64))
            .await;
        assert_eq!(value["is_deepfake"], false);
        assert_eq!(value["risk_level"], "Very Low Risk");
    }

    #[tokio::test]
    async fn test_result_payload_is_stable() {
        // The stored payload must equal a re-run on the same bytes
        let bytes = noise_png(32, 32);
        let analyzer = heuristic_analyzer();
        let a = analyzer
            .analyze(AnalysisKind::Forgery, bytes.clone())
            .await;
        let b = analyzer.analyze(AnalysisKind::Forgery, bytes).await;
        assert_eq!(a, b);
    }
}
