//! Model server client — embeddings, topic fitting, summarization.
//!
//! One HTTP sidecar hosts the ML models; this client fronts it and
//! implements the pipeline's embedding, clustering and summarization seams.

use crate::cluster::{Clusterer, EmbeddingProvider};
use crate::error::PipelineError;
use crate::summarize::Summarizer;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct ModelServerClient {
    client: reqwest::Client,
    base_url: String,
    min_cluster_size: usize,
    summary_min_length: u32,
    summary_max_length: u32,
    /// Keyword lists per topic from the most recent fit.
    fitted_keywords: Mutex<HashMap<i64, (Vec<String>, Vec<String>)>>,
}

#[derive(serde::Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(serde::Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(serde::Serialize)]
struct TopicFitRequest<'a> {
    embeddings: &'a [Vec<f32>],
    min_cluster_size: usize,
}

#[derive(Debug, serde::Deserialize)]
struct TopicFitResponse {
    labels: Vec<i64>,
    topics: Vec<TopicInfo>,
}

#[derive(Debug, serde::Deserialize)]
struct TopicInfo {
    topic_id: i64,
    primary_keywords: Vec<String>,
    diversified_keywords: Vec<String>,
}

#[derive(serde::Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    min_length: u32,
    max_length: u32,
}

#[derive(serde::Deserialize)]
struct SummarizeResponse {
    summary: String,
}

impl ModelServerClient {
    pub fn new(
        base_url: &str,
        min_cluster_size: usize,
        summary_min_length: u32,
        summary_max_length: u32,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            min_cluster_size,
            summary_min_length,
            summary_max_length,
            fitted_keywords: Mutex::new(HashMap::new()),
        }
    }

    async fn post_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest { texts })
            .send()
            .await
            .map_err(|e| format!("Model server request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;

        if !status.is_success() {
            return Err(format!(
                "Model server error ({}): {}",
                status,
                truncate_error(&body)
            ));
        }

        let parsed: EmbedResponse =
            serde_json::from_str(&body).map_err(|e| format!("Invalid JSON: {}", e))?;
        Ok(parsed.embeddings)
    }

    async fn post_topics_fit(
        &self,
        vectors: &[Vec<f32>],
        min_cluster_size: usize,
    ) -> Result<TopicFitResponse, String> {
        let url = format!("{}/topics/fit", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&TopicFitRequest {
                embeddings: vectors,
                min_cluster_size,
            })
            .send()
            .await
            .map_err(|e| format!("Model server request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;

        if !status.is_success() {
            return Err(format!(
                "Model server error ({}): {}",
                status,
                truncate_error(&body)
            ));
        }

        serde_json::from_str(&body).map_err(|e| format!("Invalid JSON: {}", e))
    }

    async fn post_summarize(&self, text: &str) -> Result<String, String> {
        let url = format!("{}/summarize", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SummarizeRequest {
                text,
                min_length: self.summary_min_length,
                max_length: self.summary_max_length,
            })
            .send()
            .await
            .map_err(|e| format!("Model server request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;

        if !status.is_success() {
            return Err(format!(
                "Model server error ({}): {}",
                status,
                truncate_error(&body)
            ));
        }

        let parsed: SummarizeResponse =
            serde_json::from_str(&body).map_err(|e| format!("Invalid JSON: {}", e))?;
        Ok(parsed.summary)
    }
}

/// Effective minimum cluster size: explicit config wins; otherwise a tenth
/// of the corpus with a floor of 2.
fn effective_min_cluster_size(configured: usize, corpus_len: usize) -> usize {
    if configured > 0 {
        configured
    } else {
        (corpus_len / 10).max(2)
    }
}

#[async_trait]
impl EmbeddingProvider for ModelServerClient {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let embeddings = self
            .post_embeddings(texts)
            .await
            .map_err(PipelineError::Clustering)?;
        if embeddings.len() != texts.len() {
            return Err(PipelineError::Clustering(format!(
                "embedding count mismatch: {} texts, {} vectors",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl Clusterer for ModelServerClient {
    async fn fit_predict(&self, vectors: &[Vec<f32>]) -> Result<Vec<i64>, PipelineError> {
        let min_size = effective_min_cluster_size(self.min_cluster_size, vectors.len());
        let fit = self
            .post_topics_fit(vectors, min_size)
            .await
            .map_err(PipelineError::Clustering)?;

        if fit.labels.len() != vectors.len() {
            return Err(PipelineError::Clustering(format!(
                "label count mismatch: {} vectors, {} labels",
                vectors.len(),
                fit.labels.len()
            )));
        }

        let mut cache = self.fitted_keywords.lock().unwrap();
        cache.clear();
        for topic in fit.topics {
            cache.insert(
                topic.topic_id,
                (topic.primary_keywords, topic.diversified_keywords),
            );
        }
        Ok(fit.labels)
    }

    async fn keywords(
        &self,
        topic_id: i64,
    ) -> Result<(Vec<String>, Vec<String>), PipelineError> {
        let cache = self.fitted_keywords.lock().unwrap();
        cache.get(&topic_id).cloned().ok_or_else(|| {
            PipelineError::Clustering(format!("no keywords cached for topic {}", topic_id))
        })
    }
}

#[async_trait]
impl Summarizer for ModelServerClient {
    async fn summarize(&self, text: &str) -> Result<String, PipelineError> {
        self.post_summarize(text)
            .await
            .map_err(PipelineError::Summarization)
    }
}

fn truncate_error(s: &str) -> &str {
    s.get(..200).unwrap_or(s)
}
