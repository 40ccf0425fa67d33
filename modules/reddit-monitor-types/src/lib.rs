//! Shared types for the reddit monitor service and its RPC clients.

use serde::{Deserialize, Serialize};

// =====================================================
// Domain Types
// =====================================================

/// A tracked financial entity in the watchlist.
///
/// Up to five name variants; empty/absent variants are skipped when the
/// match pattern is compiled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub id: i64,
    pub name: String,
    pub altname: Option<String>,
    pub abbreviation: Option<String>,
    pub ticker: Option<String>,
    pub altticker: Option<String>,
    pub created_at: String,
}

impl TrackedEntity {
    /// Non-empty name variants in canonical order
    /// (name, altname, abbreviation, ticker, altticker).
    pub fn variants(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if !self.name.is_empty() {
            out.push(self.name.as_str());
        }
        for v in [
            &self.altname,
            &self.abbreviation,
            &self.ticker,
            &self.altticker,
        ]
        .into_iter()
        .flatten()
        {
            if !v.is_empty() {
                out.push(v.as_str());
            }
        }
        out
    }
}

/// A harvested comment that matched a tracked entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub post_title: String,
    pub subreddit: String,
    pub comment_date: String,
    pub comment_author: String,
    pub body: String,
    pub matched_phrase: String,
    pub upvotes: i64,
}

/// Sentiment label, strictly determined by the compound score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Fixed thresholds: >= 0.05 positive, <= -0.05 negative, else neutral.
    /// Boundary values are inclusive.
    pub fn from_compound(compound: f64) -> Self {
        if compound >= 0.05 {
            Sentiment::Positive
        } else if compound <= -0.05 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Negative => "NEGATIVE",
            Sentiment::Neutral => "NEUTRAL",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "POSITIVE" => Some(Sentiment::Positive),
            "NEGATIVE" => Some(Sentiment::Negative),
            "NEUTRAL" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

/// Sentiment score for one comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub comment_id: String,
    pub compound: f64,
    pub sentiment: Sentiment,
}

/// One summarized topic from a daily clustering run.
///
/// History rows: one batch is appended per allowed daily run, keyed only by
/// `date`. Keyword lists are stored comma-joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    pub date: String,
    pub topic_id: i64,
    pub summary: String,
    pub primary_keywords: String,
    pub diversified_keywords: String,
    pub size: i64,
}

// =====================================================
// Filter / Query Types
// =====================================================

/// Filters for querying harvested comments
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CommentFilter {
    pub subreddit: Option<String>,
    pub matched_phrase: Option<String>,
    pub search_text: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub limit: Option<usize>,
}

/// Filters for querying sentiment records
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SentimentFilter {
    pub sentiment: Option<String>,
    pub limit: Option<usize>,
}

/// Filters for querying topic summaries
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SummaryFilter {
    pub date: Option<String>,
    pub topic_id: Option<i64>,
    pub limit: Option<usize>,
}

/// Monitor statistics overview
#[derive(Debug, Serialize, Deserialize)]
pub struct MonitorStats {
    pub total_comments: i64,
    pub comments_today: i64,
    pub comments_7d: i64,
    pub scored_comments: i64,
    pub tracked_entities: i64,
    pub summarized_topics: i64,
    pub last_summary_date: Option<String>,
}

// =====================================================
// RPC Request Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct AddEntityRequest {
    pub name: String,
    pub altname: Option<String>,
    pub abbreviation: Option<String>,
    pub ticker: Option<String>,
    pub altticker: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveEntityRequest {
    pub id: i64,
}

// =====================================================
// RPC Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub tracked_entities: i64,
    pub total_comments: i64,
    pub last_tick_at: Option<String>,
    pub last_run_time: Option<String>,
    pub poll_interval_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_thresholds() {
        assert_eq!(Sentiment::from_compound(0.8), Sentiment::Positive);
        assert_eq!(Sentiment::from_compound(-0.8), Sentiment::Negative);
        assert_eq!(Sentiment::from_compound(0.0), Sentiment::Neutral);
        assert_eq!(Sentiment::from_compound(0.049), Sentiment::Neutral);
        assert_eq!(Sentiment::from_compound(-0.049), Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_thresholds_boundary_inclusive() {
        assert_eq!(Sentiment::from_compound(0.05), Sentiment::Positive);
        assert_eq!(Sentiment::from_compound(-0.05), Sentiment::Negative);
    }

    #[test]
    fn test_sentiment_label_round_trip() {
        for s in [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral] {
            assert_eq!(Sentiment::from_label(s.as_str()), Some(s));
        }
        assert_eq!(Sentiment::from_label("positive"), None);
    }

    #[test]
    fn test_sentiment_serializes_uppercase() {
        let rec = SentimentRecord {
            comment_id: "abc".into(),
            compound: 0.6,
            sentiment: Sentiment::Positive,
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"POSITIVE\""));
    }

    #[test]
    fn test_entity_variants_skip_empty() {
        let e = TrackedEntity {
            id: 1,
            name: "Citigroup".into(),
            altname: Some("Citi".into()),
            abbreviation: None,
            ticker: Some("C".into()),
            altticker: Some(String::new()),
            created_at: String::new(),
        };
        assert_eq!(e.variants(), vec!["Citigroup", "Citi", "C"]);
    }

    #[test]
    fn test_rpc_response_skips_empty_fields() {
        let ok: RpcResponse<i64> = RpcResponse::ok(7);
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains("\"data\":7"));
        assert!(!json.contains("error"));

        let err: RpcResponse<i64> = RpcResponse::err("nope");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"error\":\"nope\""));
        assert!(!json.contains("data"));
    }
}
