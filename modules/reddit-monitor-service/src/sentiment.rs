//! Sentiment scoring for harvested comments.
//!
//! The scorer produces a compound score only; the POSITIVE/NEGATIVE/NEUTRAL
//! label is derived from fixed thresholds when the record is built.

use crate::error::PipelineError;
use async_trait::async_trait;

#[async_trait]
pub trait SentimentScorer: Send + Sync {
    /// Compound score in -1.0 .. +1.0.
    async fn score(&self, text: &str) -> Result<f64, PipelineError>;
}

/// Rule-based scorer over a weighted finance lexicon.
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    fn compound(text: &str) -> f64 {
        let lower = text.to_lowercase();
        let mut score: f64 = 0.0;
        let mut hits = 0i32;

        let positive_terms = [
            ("bullish", 1.0),
            ("moon", 0.8),
            ("mooning", 0.9),
            ("rally", 0.6),
            ("rallying", 0.7),
            ("breakout", 0.7),
            ("surge", 0.7),
            ("soar", 0.7),
            ("squeeze", 0.6),
            ("upgrade", 0.6),
            ("undervalued", 0.6),
            ("outperform", 0.6),
            ("oversold", 0.5),
            ("tendies", 0.7),
            ("diamond hands", 0.7),
            ("yolo", 0.5),
            ("beat", 0.5),
            ("profit", 0.5),
            ("strong", 0.5),
            ("calls", 0.4),
            ("buy", 0.4),
            ("long", 0.4),
            ("growth", 0.4),
            ("dividend", 0.3),
            ("hold", 0.3),
        ];

        let negative_terms = [
            ("bearish", -1.0),
            ("bankrupt", -0.9),
            ("insolvent", -0.9),
            ("fraud", -0.9),
            ("bank run", -0.9),
            ("crashing", -0.9),
            ("crash", -0.8),
            ("tanking", -0.8),
            ("scandal", -0.8),
            ("plunge", -0.7),
            ("dump", -0.7),
            ("default", -0.7),
            ("recession", -0.7),
            ("downgrade", -0.6),
            ("overvalued", -0.6),
            ("bubble", -0.6),
            ("bagholder", -0.6),
            ("bailout", -0.6),
            ("lawsuit", -0.6),
            ("layoffs", -0.6),
            ("drilling", -0.6),
            ("miss", -0.5),
            ("sell", -0.4),
            ("short", -0.4),
            ("puts", -0.4),
        ];

        for (term, weight) in &positive_terms {
            if lower.contains(term) {
                score += weight;
                hits += 1;
            }
        }
        for (term, weight) in &negative_terms {
            if lower.contains(term) {
                score += weight;
                hits += 1;
            }
        }

        let positive_emojis = ["🚀", "💎", "📈", "💰", "🐂"];
        let negative_emojis = ["📉", "💀", "🤡", "🐻", "🔻"];

        for emoji in &positive_emojis {
            if text.contains(emoji) {
                score += 0.3;
                hits += 1;
            }
        }
        for emoji in &negative_emojis {
            if text.contains(emoji) {
                score -= 0.3;
                hits += 1;
            }
        }

        // Simple negation handling: "not bullish", "don't buy", etc.
        let negation_patterns = ["not ", "isn't ", "no ", "don't ", "never ", "won't "];
        for pattern in &negation_patterns {
            if lower.contains(pattern) {
                score *= 0.5;
                break;
            }
        }

        if hits > 0 {
            score /= (hits as f64).sqrt();
            score = score.clamp(-1.0, 1.0);
        }

        score
    }
}

#[async_trait]
impl SentimentScorer for LexiconScorer {
    async fn score(&self, text: &str) -> Result<f64, PipelineError> {
        Ok(Self::compound(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullish_text_scores_positive() {
        let score = LexiconScorer::compound("Citi is bullish, buy the breakout 🚀");
        assert!(score >= 0.05, "score was {}", score);
    }

    #[test]
    fn test_bearish_text_scores_negative() {
        let score = LexiconScorer::compound("this bank is going bankrupt, total crash 📉");
        assert!(score <= -0.05, "score was {}", score);
    }

    #[test]
    fn test_plain_text_scores_zero() {
        assert_eq!(LexiconScorer::compound("the meeting is on Tuesday"), 0.0);
    }

    #[test]
    fn test_negation_dampens_score() {
        let plain = LexiconScorer::compound("bullish on this");
        let negated = LexiconScorer::compound("not bullish on this");
        assert!(negated > 0.0);
        assert!(negated < plain);
    }

    #[test]
    fn test_score_stays_clamped() {
        let score = LexiconScorer::compound(
            "bullish moon rally breakout surge tendies calls buy long growth 🚀💎📈",
        );
        assert!(score <= 1.0);

        let score = LexiconScorer::compound(
            "bearish bankrupt fraud crash tanking dump default sell short puts 📉💀",
        );
        assert!(score >= -1.0);
    }

    #[tokio::test]
    async fn test_scorer_trait_returns_compound() {
        let scorer = LexiconScorer::new();
        let score = scorer.score("strong rally, bullish").await.unwrap();
        assert!(score > 0.0);
    }
}
