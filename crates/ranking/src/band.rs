//! Quality band classification.
//!
//! Pure function of `{trades, score}` with fixed score thresholds. The trade
//! count gate takes priority: too few trades is NA whatever the score.

use screener_core::config::ClassifierConfig;
use screener_core::{CandidateRecord, QualityBand, RankingStats};

/// Scores below this are RED.
pub const YELLOW_FROM: f64 = 0.5;
/// Scores at or above this are GREEN.
pub const GREEN_FROM: f64 = 1.5;
/// Scores at or above this are STRONG.
pub const STRONG_FROM: f64 = 3.0;

/// Quality band classifier.
#[derive(Debug, Clone, Copy)]
pub struct BandClassifier {
    min_trades: u32,
}

impl Default for BandClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

impl BandClassifier {
    /// Create a classifier with the given minimum trade count.
    pub fn new(min_trades: u32) -> Self {
        Self { min_trades }
    }

    /// Create a classifier from configuration.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.min_trades)
    }

    /// Classify stats. Lower band edges are inclusive.
    pub fn classify(&self, stats: Option<&RankingStats>) -> QualityBand {
        let Some(stats) = stats else {
            return QualityBand::Na;
        };
        let Some(score) = stats.score.filter(|s| !s.is_nan()) else {
            return QualityBand::Na;
        };
        if matches!(stats.trades, Some(t) if t < self.min_trades) {
            return QualityBand::Na;
        }

        if score < YELLOW_FROM {
            QualityBand::Red
        } else if score < GREEN_FROM {
            QualityBand::Yellow
        } else if score < STRONG_FROM {
            QualityBand::Green
        } else {
            QualityBand::Strong
        }
    }

    /// Classify a record by its attached stats.
    #[inline]
    pub fn classify_record(&self, record: &CandidateRecord) -> QualityBand {
        self.classify(record.stats.as_ref())
    }

    pub fn min_trades(&self) -> u32 {
        self.min_trades
    }
}
