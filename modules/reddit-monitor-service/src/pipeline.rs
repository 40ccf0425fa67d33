//! Pipeline orchestration.
//!
//! One run executes the phases in a fixed order: collect, dedup, persist,
//! score, then (behind the daily gate) cluster and summarize. Phase failures
//! are isolated: a failed phase is logged and its output treated as empty
//! while the remaining phases still run. Only a storage connection failure
//! aborts the run outright.

use crate::cluster::{self, Clusterer, EmbeddingProvider};
use crate::config::Config;
use crate::db::Db;
use crate::error::PipelineError;
use crate::ingest::{self, SourceFeed};
use crate::pattern::EntityPatterns;
use crate::sentiment::SentimentScorer;
use crate::summarize::{self, Summarizer};
use chrono::{DateTime, NaiveDate, Utc};
use reddit_monitor_types::{Comment, Sentiment, SentimentRecord, TopicSummary};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Counts external calls made during one run. Single-run scope; the worker
/// starts each run with a fresh counter.
#[derive(Debug, Default)]
pub struct RateCounter {
    calls: u64,
}

impl RateCounter {
    pub fn new() -> Self {
        Self { calls: 0 }
    }

    pub fn record_call(&mut self) {
        self.calls += 1;
    }

    pub fn total(&self) -> u64 {
        self.calls
    }
}

/// Keep only the records whose key is absent from `existing_keys`.
///
/// Pure filter; together with the keyed inserts in `db` it guarantees the
/// comment and sentiment tables only ever see insert operations.
pub fn filter_new<T>(
    batch: Vec<T>,
    existing_keys: &HashSet<String>,
    key: impl Fn(&T) -> &str,
) -> Vec<T> {
    batch
        .into_iter()
        .filter(|item| !existing_keys.contains(key(item)))
        .collect()
}

/// Whether the clustering/summarization phase may run today.
///
/// No summary history yet allows the run; otherwise today must be strictly
/// after the latest persisted batch date. An unparseable history date does
/// not hold the gate closed.
pub fn daily_gate(today: NaiveDate, latest_persisted: Option<&str>) -> bool {
    match latest_persisted {
        None => true,
        Some(latest) => match latest.parse::<NaiveDate>() {
            Ok(date) => today > date,
            Err(_) => true,
        },
    }
}

/// What one run did; the worker logs it.
#[derive(Debug, Default)]
pub struct RunReport {
    pub candidates: usize,
    pub new_comments: usize,
    pub scored: usize,
    pub gate_allowed: bool,
    pub topics_summarized: usize,
    pub topics_failed: usize,
    pub external_calls: u64,
    pub errors: Vec<String>,
}

pub struct Pipeline {
    pub db: Arc<Db>,
    pub feed: Arc<dyn SourceFeed>,
    pub scorer: Arc<dyn SentimentScorer>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub clusterer: Arc<dyn Clusterer>,
    pub summarizer: Arc<dyn Summarizer>,
    pub config: Config,
}

impl Pipeline {
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();
        let mut calls = RateCounter::new();

        // Storage connectivity gates everything below, including the final
        // run-metadata update.
        self.db
            .health_check()
            .map_err(|e| PipelineError::Connection(e.to_string()))?;

        let since = self.ingestion_window_start()?;

        let candidates = match self.collect_candidates(since, &mut calls).await {
            Ok(batch) => batch,
            Err(e) => {
                log::error!("[REDDIT_MONITOR] Ingestion failed: {}", e);
                report.errors.push(e.to_string());
                Vec::new()
            }
        };
        report.candidates = candidates.len();

        let new_comments = match self.persist_new_comments(candidates) {
            Ok(batch) => batch,
            Err(e) => {
                log::error!("[REDDIT_MONITOR] Comment persistence failed: {}", e);
                report.errors.push(e.to_string());
                Vec::new()
            }
        };
        report.new_comments = new_comments.len();

        match self.score_new_comments(&new_comments, &mut calls).await {
            Ok(n) => report.scored = n,
            Err(e) => {
                log::error!("[REDDIT_MONITOR] Sentiment scoring failed: {}", e);
                report.errors.push(e.to_string());
            }
        }

        // At most one summary batch per UTC day.
        match self.db.latest_summary_date() {
            Ok(latest) => {
                let today = Utc::now().date_naive();
                report.gate_allowed = daily_gate(today, latest.as_deref());
                if report.gate_allowed {
                    match self.cluster_and_summarize(today, &mut calls).await {
                        Ok((written, failed)) => {
                            report.topics_summarized = written;
                            report.topics_failed = failed;
                        }
                        Err(e) => {
                            log::error!("[REDDIT_MONITOR] Clustering failed: {}", e);
                            report.errors.push(e.to_string());
                        }
                    }
                } else {
                    log::debug!("[REDDIT_MONITOR] Daily gate closed; summaries already written today");
                }
            }
            Err(e) => {
                log::error!("[REDDIT_MONITOR] Summary history read failed: {}", e);
                report.errors.push(e.to_string());
            }
        }

        // The ingestion window advances even when phases above failed; a
        // window lost to a failing phase is skipped, never retried.
        if let Err(e) = self.db.set_last_run_time(&Utc::now().to_rfc3339()) {
            log::error!("[REDDIT_MONITOR] Run metadata update failed: {}", e);
            report.errors.push(e.to_string());
        }

        report.external_calls = calls.total();
        Ok(report)
    }

    /// Start of the ingestion window: the persisted last run time, or the
    /// lookback horizon on a cold start.
    fn ingestion_window_start(&self) -> Result<DateTime<Utc>, PipelineError> {
        let cold_start = Utc::now() - chrono::Duration::hours(self.config.lookback_hours);
        let stored = self
            .db
            .last_run_time()
            .map_err(|e| PipelineError::Connection(e.to_string()))?;
        Ok(match stored {
            Some(ts) => match DateTime::parse_from_rfc3339(&ts) {
                Ok(t) => t.with_timezone(&Utc),
                Err(_) => {
                    log::warn!(
                        "[REDDIT_MONITOR] Stored last run time {:?} is unreadable; using the lookback horizon",
                        ts
                    );
                    cold_start
                }
            },
            None => cold_start,
        })
    }

    async fn collect_candidates(
        &self,
        since: DateTime<Utc>,
        calls: &mut RateCounter,
    ) -> Result<Vec<Comment>, PipelineError> {
        let entities = self.db.list_entities()?;
        if entities.is_empty() {
            log::warn!("[REDDIT_MONITOR] Entity watchlist is empty; skipping ingestion");
            return Ok(Vec::new());
        }
        let patterns = EntityPatterns::compile(&entities)
            .map_err(|e| PipelineError::SourceFetch(format!("pattern compile failed: {}", e)))?;

        ingest::collect_comments(
            self.feed.as_ref(),
            &patterns,
            &self.config.subreddits,
            self.config.comment_target,
            since,
            self.config.lookback_hours,
            calls,
        )
        .await
    }

    /// Dedup the candidate batch against persisted ids and insert the rest.
    /// Returns the inserted batch; that is what sentiment scoring covers.
    fn persist_new_comments(&self, candidates: Vec<Comment>) -> Result<Vec<Comment>, PipelineError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let existing = self.db.existing_comment_ids()?;
        let fresh = filter_new(candidates, &existing, |c| c.comment_id.as_str());
        if !fresh.is_empty() {
            let written = self.db.insert_comments(&fresh)?;
            log::info!("[REDDIT_MONITOR] Persisted {} new comments", written);
        }
        Ok(fresh)
    }

    async fn score_new_comments(
        &self,
        comments: &[Comment],
        calls: &mut RateCounter,
    ) -> Result<usize, PipelineError> {
        if comments.is_empty() {
            return Ok(0);
        }
        let mut records = Vec::with_capacity(comments.len());
        for comment in comments {
            calls.record_call();
            let compound = self.scorer.score(&comment.body).await?;
            records.push(SentimentRecord {
                comment_id: comment.comment_id.clone(),
                compound,
                sentiment: Sentiment::from_compound(compound),
            });
        }
        let existing = self.db.existing_sentiment_ids()?;
        let fresh = filter_new(records, &existing, |r| r.comment_id.as_str());
        Ok(self.db.insert_sentiments(&fresh)?)
    }

    /// Cluster the recent comment window and summarize each topic. Returns
    /// (rows written, topics whose summarization failed).
    async fn cluster_and_summarize(
        &self,
        today: NaiveDate,
        calls: &mut RateCounter,
    ) -> Result<(usize, usize), PipelineError> {
        let cutoff =
            (Utc::now() - chrono::Duration::days(self.config.summary_window_days)).to_rfc3339();
        let window = self.db.comments_since(&cutoff)?;
        if window.is_empty() {
            // no rows written, so the gate stays open for later ticks today
            log::info!("[REDDIT_MONITOR] Summarization window is empty; skipping");
            return Ok((0, 0));
        }

        let texts: Vec<String> = window.iter().map(|c| c.body.clone()).collect();

        calls.record_call();
        let vectors = self.embedder.encode(&texts).await?;
        calls.record_call();
        let labels = self.clusterer.fit_predict(&vectors).await?;

        let mut distinct: Vec<i64> = labels.iter().copied().filter(|&l| l != -1).collect();
        distinct.sort_unstable();
        distinct.dedup();

        // A topic with no keyword lists still gets aggregated and summarized.
        let mut keyword_lookup = HashMap::new();
        for topic_id in distinct {
            calls.record_call();
            match self.clusterer.keywords(topic_id).await {
                Ok(lists) => {
                    keyword_lookup.insert(topic_id, lists);
                }
                Err(e) => {
                    log::warn!("[REDDIT_MONITOR] No keywords for topic {}: {}", topic_id, e);
                }
            }
        }

        let topics = cluster::aggregate(&texts, &labels, &keyword_lookup);
        let date = today.to_string();

        let mut rows = Vec::new();
        let mut failed = 0usize;
        for (topic_id, topic) in &topics {
            match summarize::summarize_corpus(
                self.summarizer.as_ref(),
                &topic.corpus,
                self.config.chunk_max_chars,
                calls,
            )
            .await
            {
                Ok(summary) => rows.push(TopicSummary {
                    date: date.clone(),
                    topic_id: *topic_id,
                    summary,
                    primary_keywords: topic.primary_keywords.join(", "),
                    diversified_keywords: topic.diversified_keywords.join(", "),
                    size: topic.size as i64,
                }),
                // one topic's failure leaves the other topics standing
                Err(e) => {
                    failed += 1;
                    log::error!(
                        "[REDDIT_MONITOR] Summarization of topic {} failed: {}",
                        topic_id,
                        e
                    );
                }
            }
        }

        let written = self.db.insert_topic_summaries(&rows)?;
        if written > 0 {
            log::info!("[REDDIT_MONITOR] Wrote {} topic summaries for {}", written, date);
        }
        Ok((written, failed))
    }
}
