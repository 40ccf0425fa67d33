//! Topic clustering seams and cluster aggregation.

use crate::error::PipelineError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

/// Dense vector encoder for comment texts.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;
}

/// Clustering over embedding vectors. Labels align with the input order;
/// -1 marks outliers.
#[async_trait]
pub trait Clusterer: Send + Sync {
    async fn fit_predict(&self, vectors: &[Vec<f32>]) -> Result<Vec<i64>, PipelineError>;

    /// Keyword lists (primary, diversified) for one topic of the last fit.
    async fn keywords(&self, topic_id: i64)
        -> Result<(Vec<String>, Vec<String>), PipelineError>;
}

/// One topic's aggregated material, ready for summarization.
#[derive(Debug, Clone)]
pub struct TopicCorpus {
    pub corpus: String,
    pub primary_keywords: Vec<String>,
    pub diversified_keywords: Vec<String>,
    pub size: usize,
}

/// Group texts by topic label.
///
/// The outlier label (-1) is dropped entirely. Each topic's corpus is its
/// texts joined with single spaces in encounter order, and `size` is the
/// member count. Keyword lists come from the lookup; a label missing there
/// gets empty lists. The result is ordered by ascending topic id.
pub fn aggregate(
    texts: &[String],
    labels: &[i64],
    keywords: &HashMap<i64, (Vec<String>, Vec<String>)>,
) -> BTreeMap<i64, TopicCorpus> {
    let mut grouped: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
    for (text, &label) in texts.iter().zip(labels.iter()) {
        if label == -1 {
            continue;
        }
        grouped.entry(label).or_default().push(text.as_str());
    }

    grouped
        .into_iter()
        .map(|(label, members)| {
            let (primary, diversified) = keywords.get(&label).cloned().unwrap_or_default();
            (
                label,
                TopicCorpus {
                    corpus: members.join(" "),
                    primary_keywords: primary,
                    diversified_keywords: diversified,
                    size: members.len(),
                },
            )
        })
        .collect()
}
