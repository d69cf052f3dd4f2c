//! Fixed-threshold heuristic scoring used when no pretrained model is
//! registered. Deterministic: identical statistics always produce identical
//! indicators, confidence, and labels.

use serde::Serialize;

use super::stats::ImageStats;
use crate::constants::{DEEPFAKE_CONFIDENCE_CAP, FORGERY_CONFIDENCE_CAP};

/// A named heuristic signal with a severity score in [0, 1].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Indicator {
    pub indicator: String,
    pub score: f64,
}

impl Indicator {
    fn new(name: &str, score: f64) -> Self {
        Self {
            indicator: name.to_string(),
            score,
        }
    }
}

/// Outcome of a forgery or deepfake heuristic pass.
#[derive(Debug, Clone)]
pub struct HeuristicVerdict {
    pub indicators: Vec<Indicator>,
    pub confidence: f64,
    pub suspicious: bool,
    pub risk_level: &'static str,
}

/// A candidate label from the classification fallback.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub confidence: f64,
}

impl LabelScore {
    fn new(label: &str, confidence: f64) -> Self {
        Self {
            label: label.to_string(),
            confidence,
        }
    }
}

/// Risk band for a confidence value; 0.8 / 0.6 / 0.4 are inclusive lower
/// bounds of their bands.
pub fn risk_level(confidence: f64) -> &'static str {
    if confidence >= 0.8 {
        "High Risk"
    } else if confidence >= 0.6 {
        "Medium Risk"
    } else if confidence >= 0.4 {
        "Low Risk"
    } else {
        "Very Low Risk"
    }
}

/// Deepfake verdict label on the same confidence bands as `risk_level`.
pub fn deepfake_label(confidence: f64) -> &'static str {
    if confidence >= 0.8 {
        "Likely DeepFake"
    } else if confidence >= 0.6 {
        "Suspicious"
    } else if confidence >= 0.4 {
        "Possibly Authentic"
    } else {
        "Likely Authentic"
    }
}

fn combine(indicators: Vec<Indicator>, cap: f64, fallback: f64) -> HeuristicVerdict {
    let (confidence, suspicious) = if indicators.is_empty() {
        (fallback, false)
    } else {
        let avg = indicators.iter().map(|i| i.score).sum::<f64>() / indicators.len() as f64;
        (avg.min(cap), avg > 0.6)
    };
    HeuristicVerdict {
        indicators,
        confidence,
        suspicious,
        risk_level: risk_level(confidence),
    }
}

/// Forgery scoring over basic statistics (confidence capped at 0.9).
pub fn score_forgery(stats: &ImageStats) -> HeuristicVerdict {
    let mut indicators = Vec::new();

    if stats.edge_density < 0.05 {
        indicators.push(Indicator::new("Very low edge density", 0.8));
    } else if stats.edge_density < 0.1 {
        indicators.push(Indicator::new("Low edge density", 0.6));
    } else if stats.edge_density > 0.3 {
        indicators.push(Indicator::new("High edge density", 0.4));
    }

    if stats.sharpness < 50.0 {
        indicators.push(Indicator::new("Very low sharpness", 0.9));
    } else if stats.sharpness < 100.0 {
        indicators.push(Indicator::new("Low sharpness", 0.7));
    } else if stats.sharpness > 2000.0 {
        indicators.push(Indicator::new("Very high sharpness", 0.3));
    }

    if stats.is_color() {
        let color_variance = stats.color_variance();
        if color_variance < 10.0 {
            indicators.push(Indicator::new("Low color variance", 0.6));
        } else if color_variance > 100.0 {
            indicators.push(Indicator::new("High color variance", 0.4));
        }
    }

    combine(indicators, FORGERY_CONFIDENCE_CAP, 0.3)
}

/// Deepfake scoring over basic statistics (confidence capped at 0.85).
pub fn score_deepfake(stats: &ImageStats) -> HeuristicVerdict {
    let mut indicators = Vec::new();

    if stats.sharpness < 30.0 {
        indicators.push(Indicator::new("Very low sharpness (blurry)", 0.9));
    } else if stats.sharpness < 100.0 {
        indicators.push(Indicator::new("Low sharpness", 0.7));
    } else if stats.sharpness > 3000.0 {
        indicators.push(Indicator::new("Unusually high sharpness", 0.6));
    }

    if stats.edge_density < 0.03 {
        indicators.push(Indicator::new("Very low edge density", 0.8));
    } else if stats.edge_density < 0.08 {
        indicators.push(Indicator::new("Low edge density", 0.6));
    } else if stats.edge_density > 0.4 {
        indicators.push(Indicator::new("Unusually high edge density", 0.5));
    }

    if stats.is_color() {
        let color_variance = stats.color_variance();
        if color_variance < 5.0 {
            indicators.push(Indicator::new("Very low color variance", 0.7));
        } else if color_variance > 150.0 {
            indicators.push(Indicator::new("Very high color variance", 0.6));
        }

        let color_balance = stats.color_balance();
        if color_balance < 50.0 || color_balance > 200.0 {
            indicators.push(Indicator::new("Unnatural color balance", 0.6));
        }
    }

    combine(indicators, DEEPFAKE_CONFIDENCE_CAP, 0.2)
}

/// Classification fallback: coarse labels from image properties, sorted by
/// confidence descending.
pub fn classify_basic(stats: &ImageStats) -> Vec<LabelScore> {
    let mut predictions = Vec::new();

    if stats.channels == 1 {
        predictions.push(LabelScore::new("Grayscale Image", 0.95));
    } else {
        predictions.push(LabelScore::new("Color Image", 0.9));
    }

    let aspect_ratio = stats.aspect_ratio();
    if aspect_ratio > 1.5 {
        predictions.push(LabelScore::new("Landscape Image", 0.85));
    } else if aspect_ratio < 0.67 {
        predictions.push(LabelScore::new("Portrait Image", 0.85));
    } else {
        predictions.push(LabelScore::new("Square Image", 0.8));
    }

    if stats.sharpness > 2000.0 {
        predictions.push(LabelScore::new("High Quality Image", 0.8));
    } else if stats.sharpness > 1000.0 {
        predictions.push(LabelScore::new("Medium Quality Image", 0.7));
    } else {
        predictions.push(LabelScore::new("Low Quality Image", 0.6));
    }

    if stats.edge_density > 0.15 {
        predictions.push(LabelScore::new("Detailed Image", 0.75));
    } else if stats.edge_density > 0.05 {
        predictions.push(LabelScore::new("Moderate Detail Image", 0.65));
    } else {
        predictions.push(LabelScore::new("Smooth Image", 0.55));
    }

    predictions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(
        channels: u8,
        edge_density: f64,
        sharpness: f64,
        mean_color: Vec<f64>,
        std_color: Vec<f64>,
    ) -> ImageStats {
        ImageStats {
            width: 100,
            height: 100,
            channels,
            format: None,
            mean_color,
            std_color,
            edge_density,
            sharpness,
            histogram: None,
        }
    }

    #[test]
    fn test_risk_level_band_boundaries() {
        assert_eq!(risk_level(0.81), "High Risk");
        assert_eq!(risk_level(0.8), "High Risk");
        assert_eq!(risk_level(0.65), "Medium Risk");
        assert_eq!(risk_level(0.6), "Medium Risk");
        assert_eq!(risk_level(0.45), "Low Risk");
        assert_eq!(risk_level(0.4), "Low Risk");
        assert_eq!(risk_level(0.1), "Very Low Risk");
    }

    #[test]
    fn test_forgery_no_indicators() {
        // edge 0.2, sharpness 500, variance 50: every signal in its quiet band
        let s = stats(3, 0.2, 500.0, vec![100.0; 3], vec![50.0; 3]);
        let verdict = score_forgery(&s);
        assert!(verdict.indicators.is_empty());
        assert_eq!(verdict.confidence, 0.3);
        assert!(!verdict.suspicious);
        assert_eq!(verdict.risk_level, "Very Low Risk");
    }

    #[test]
    fn test_forgery_cap_and_suspicion() {
        // Very low edge density (0.8) + very low sharpness (0.9) + low color
        // variance (0.6) -> mean 0.7666, suspicious, Medium Risk
        let s = stats(3, 0.01, 10.0, vec![100.0; 3], vec![5.0; 3]);
        let verdict = score_forgery(&s);
        assert_eq!(verdict.indicators.len(), 3);
        assert!(verdict.suspicious);
        assert!(verdict.confidence <= FORGERY_CONFIDENCE_CAP);
        assert!((verdict.confidence - (0.8 + 0.9 + 0.6) / 3.0).abs() < 1e-9);
        assert_eq!(verdict.risk_level, "Medium Risk");
    }

    #[test]
    fn test_forgery_deterministic() {
        let s = stats(3, 0.07, 80.0, vec![120.0; 3], vec![30.0; 3]);
        let a = score_forgery(&s);
        let b = score_forgery(&s);
        assert_eq!(a.indicators, b.indicators);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.risk_level, b.risk_level);
    }

    #[test]
    fn test_deepfake_fallback_confidence() {
        let s = stats(3, 0.2, 500.0, vec![100.0; 3], vec![50.0; 3]);
        let verdict = score_deepfake(&s);
        assert!(verdict.indicators.is_empty());
        assert_eq!(verdict.confidence, 0.2);
        assert_eq!(deepfake_label(verdict.confidence), "Likely Authentic");
    }

    #[test]
    fn test_deepfake_many_indicators() {
        // Blurry (0.9) + very low edge density (0.8) + very low color
        // variance (0.7) + unnatural balance (0.6) -> mean 0.75
        let s = stats(3, 0.01, 10.0, vec![230.0; 3], vec![2.0; 3]);
        let verdict = score_deepfake(&s);
        assert_eq!(verdict.indicators.len(), 4);
        assert!((verdict.confidence - 0.75).abs() < 1e-9);
        assert!(verdict.suspicious);
        assert_eq!(deepfake_label(verdict.confidence), "Suspicious");
    }

    #[test]
    fn test_deepfake_cap_applies() {
        // A lone blurry indicator averages 0.9, above the 0.85 cap
        let s = stats(1, 0.2, 10.0, vec![128.0], vec![40.0]);
        let verdict = score_deepfake(&s);
        assert_eq!(verdict.indicators.len(), 1);
        assert_eq!(verdict.confidence, DEEPFAKE_CONFIDENCE_CAP);
        assert_eq!(deepfake_label(verdict.confidence), "Likely DeepFake");
    }

    #[test]
    fn test_deepfake_grayscale_skips_color_checks() {
        let s = stats(1, 0.01, 10.0, vec![230.0], vec![2.0]);
        let verdict = score_deepfake(&s);
        assert!(
            verdict
                .indicators
                .iter()
                .all(|i| !i.indicator.contains("color"))
        );
    }

    #[test]
    fn test_classify_basic_grayscale_wins() {
        let s = stats(1, 0.0, 0.0, vec![128.0], vec![0.0]);
        let predictions = classify_basic(&s);
        assert_eq!(predictions[0].label, "Grayscale Image");
        assert_eq!(predictions[0].confidence, 0.95);
        assert_eq!(predictions.len(), 4);
    }

    #[test]
    fn test_classify_basic_landscape_detailed() {
        let mut s = stats(3, 0.2, 2500.0, vec![100.0; 3], vec![40.0; 3]);
        s.width = 300;
        s.height = 100;
        let labels: Vec<_> = classify_basic(&s).into_iter().map(|p| p.label).collect();
        assert!(labels.contains(&"Landscape Image".to_string()));
        assert!(labels.contains(&"High Quality Image".to_string()));
        assert!(labels.contains(&"Detailed Image".to_string()));
        assert_eq!(labels[0], "Color Image");
    }
}
