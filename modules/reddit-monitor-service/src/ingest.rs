//! Comment ingestion from the source feed.

use crate::error::PipelineError;
use crate::pattern::EntityPatterns;
use crate::pipeline::RateCounter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reddit_monitor_types::Comment;
use std::collections::HashSet;

/// A post from a subreddit's new-post feed, expected newest-first.
#[derive(Debug, Clone)]
pub struct FeedPost {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A comment under a post.
#[derive(Debug, Clone)]
pub struct FeedComment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub score: i64,
}

/// Where posts and comments come from.
#[async_trait]
pub trait SourceFeed: Send + Sync {
    /// Posts in a subreddit's "new" feed, newest first.
    async fn new_posts(&self, subreddit: &str) -> Result<Vec<FeedPost>, PipelineError>;

    /// All loaded comments under one post, `more` stubs excluded.
    async fn post_comments(
        &self,
        subreddit: &str,
        post_id: &str,
    ) -> Result<Vec<FeedComment>, PipelineError>;
}

/// Scan subreddits in order and collect comments matching the watchlist.
///
/// Per subreddit, posts are taken newest-first and the scan stops at the
/// first post older than the lookback cutoff; the feed is trusted to be
/// ordered, so a stale post hides anything queued behind it. Comments are
/// skipped when they predate `since_time` or were already collected this
/// run; the seen set records matched ids only. Collection stops globally at
/// `target_count`, which favors subreddits earlier in the list.
pub async fn collect_comments(
    feed: &dyn SourceFeed,
    patterns: &EntityPatterns,
    subreddits: &[String],
    target_count: usize,
    since_time: DateTime<Utc>,
    lookback_hours: i64,
    calls: &mut RateCounter,
) -> Result<Vec<Comment>, PipelineError> {
    let cutoff = Utc::now() - chrono::Duration::hours(lookback_hours);
    let mut collected: Vec<Comment> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut checked = 0usize;

    'subreddits: for subreddit in subreddits {
        if collected.len() >= target_count {
            break;
        }

        calls.record_call();
        let posts = feed.new_posts(subreddit).await?;
        log::debug!(
            "[REDDIT_MONITOR] r/{}: scanning {} new posts",
            subreddit,
            posts.len()
        );

        for post in &posts {
            if post.created_at < cutoff {
                break;
            }

            calls.record_call();
            let comments = feed.post_comments(subreddit, &post.id).await?;

            for comment in &comments {
                checked += 1;
                if seen_ids.contains(&comment.id) || comment.created_at <= since_time {
                    continue;
                }
                let phrase = match patterns.first_match(&comment.body) {
                    Some(p) => p,
                    None => continue,
                };

                collected.push(Comment {
                    comment_id: comment.id.clone(),
                    post_title: post.title.clone(),
                    subreddit: subreddit.clone(),
                    comment_date: comment.created_at.to_rfc3339(),
                    comment_author: comment.author.clone(),
                    body: comment.body.clone(),
                    matched_phrase: phrase.to_string(),
                    upvotes: comment.score,
                });
                seen_ids.insert(comment.id.clone());

                if collected.len() >= target_count {
                    break 'subreddits;
                }
            }
        }
    }

    log::info!(
        "[REDDIT_MONITOR] Ingestion: checked {} comments, collected {}",
        checked,
        collected.len()
    );
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reddit_monitor_types::TrackedEntity;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockFeed {
        posts: HashMap<String, Vec<FeedPost>>,
        comments: HashMap<String, Vec<FeedComment>>,
        fetched_subreddits: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SourceFeed for MockFeed {
        async fn new_posts(&self, subreddit: &str) -> Result<Vec<FeedPost>, PipelineError> {
            self.fetched_subreddits
                .lock()
                .unwrap()
                .push(subreddit.to_string());
            Ok(self.posts.get(subreddit).cloned().unwrap_or_default())
        }

        async fn post_comments(
            &self,
            _subreddit: &str,
            post_id: &str,
        ) -> Result<Vec<FeedComment>, PipelineError> {
            Ok(self.comments.get(post_id).cloned().unwrap_or_default())
        }
    }

    fn post(id: &str, mins_ago: i64) -> FeedPost {
        FeedPost {
            id: id.to_string(),
            title: format!("post {}", id),
            created_at: Utc::now() - chrono::Duration::minutes(mins_ago),
        }
    }

    fn comment(id: &str, body: &str, mins_ago: i64) -> FeedComment {
        FeedComment {
            id: id.to_string(),
            author: "user1".to_string(),
            body: body.to_string(),
            created_at: Utc::now() - chrono::Duration::minutes(mins_ago),
            score: 1,
        }
    }

    fn citi_patterns() -> EntityPatterns {
        EntityPatterns::compile(&[TrackedEntity {
            id: 0,
            name: "Citigroup".to_string(),
            altname: Some("Citi".to_string()),
            abbreviation: None,
            ticker: Some("C".to_string()),
            altticker: None,
            created_at: String::new(),
        }])
        .unwrap()
    }

    fn day_ago() -> DateTime<Utc> {
        Utc::now() - chrono::Duration::hours(24)
    }

    #[tokio::test]
    async fn test_target_reached_skips_later_subreddits() {
        let feed = MockFeed {
            posts: HashMap::from([
                ("A".to_string(), vec![post("p1", 10)]),
                ("B".to_string(), vec![post("p2", 10)]),
            ]),
            comments: HashMap::from([
                (
                    "p1".to_string(),
                    vec![
                        comment("c1", "Citi is strong", 5),
                        comment("c2", "buying Citi calls", 4),
                    ],
                ),
                ("p2".to_string(), vec![comment("c3", "Citi again", 3)]),
            ]),
            fetched_subreddits: Mutex::new(Vec::new()),
        };
        let patterns = citi_patterns();
        let subs = vec!["A".to_string(), "B".to_string()];
        let mut calls = RateCounter::new();

        let got = collect_comments(&feed, &patterns, &subs, 2, day_ago(), 24, &mut calls)
            .await
            .unwrap();

        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|c| c.subreddit == "A"));
        // B was never fetched at all
        assert_eq!(*feed.fetched_subreddits.lock().unwrap(), vec!["A"]);
        // one post listing + one comment fetch
        assert_eq!(calls.total(), 2);
    }

    #[tokio::test]
    async fn test_stale_post_stops_subreddit_scan() {
        // p_old is outside the 24h lookback; p_new2 sits behind it and must
        // not be scanned even though it is recent.
        let feed = MockFeed {
            posts: HashMap::from([(
                "A".to_string(),
                vec![post("p_new", 10), post("p_old", 60 * 25), post("p_new2", 5)],
            )]),
            comments: HashMap::from([
                ("p_new".to_string(), vec![comment("c1", "Citi up", 5)]),
                ("p_new2".to_string(), vec![comment("c2", "Citi down", 2)]),
            ]),
            fetched_subreddits: Mutex::new(Vec::new()),
        };
        let patterns = citi_patterns();
        let subs = vec!["A".to_string()];
        let mut calls = RateCounter::new();

        let got = collect_comments(&feed, &patterns, &subs, 100, day_ago(), 24, &mut calls)
            .await
            .unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].comment_id, "c1");
    }

    #[tokio::test]
    async fn test_skips_comments_at_or_before_since_time() {
        let since = Utc::now() - chrono::Duration::minutes(30);
        let boundary = FeedComment {
            id: "b".to_string(),
            author: "user1".to_string(),
            body: "Citi flat".to_string(),
            created_at: since,
            score: 0,
        };
        let feed = MockFeed {
            posts: HashMap::from([("A".to_string(), vec![post("p1", 10)])]),
            comments: HashMap::from([(
                "p1".to_string(),
                vec![
                    boundary,
                    comment("old", "Citi old news", 45),
                    comment("new", "Citi fresh take", 5),
                ],
            )]),
            fetched_subreddits: Mutex::new(Vec::new()),
        };
        let patterns = citi_patterns();
        let subs = vec!["A".to_string()];
        let mut calls = RateCounter::new();

        let got = collect_comments(&feed, &patterns, &subs, 100, since, 24, &mut calls)
            .await
            .unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].comment_id, "new");
    }

    #[tokio::test]
    async fn test_duplicate_comment_id_collected_once() {
        // the same comment can surface under two posts (crosspost)
        let feed = MockFeed {
            posts: HashMap::from([("A".to_string(), vec![post("p1", 10), post("p2", 9)])]),
            comments: HashMap::from([
                ("p1".to_string(), vec![comment("dup", "Citi thread", 5)]),
                ("p2".to_string(), vec![comment("dup", "Citi thread", 5)]),
            ]),
            fetched_subreddits: Mutex::new(Vec::new()),
        };
        let patterns = citi_patterns();
        let subs = vec!["A".to_string()];
        let mut calls = RateCounter::new();

        let got = collect_comments(&feed, &patterns, &subs, 100, day_ago(), 24, &mut calls)
            .await
            .unwrap();

        assert_eq!(got.len(), 1);
    }

    #[tokio::test]
    async fn test_non_matching_comments_do_not_count_toward_target() {
        let feed = MockFeed {
            posts: HashMap::from([("A".to_string(), vec![post("p1", 10)])]),
            comments: HashMap::from([(
                "p1".to_string(),
                vec![
                    comment("miss", "nothing relevant here", 6),
                    comment("hit", "Citi earnings beat", 5),
                ],
            )]),
            fetched_subreddits: Mutex::new(Vec::new()),
        };
        let patterns = citi_patterns();
        let subs = vec!["A".to_string()];
        let mut calls = RateCounter::new();

        let got = collect_comments(&feed, &patterns, &subs, 1, day_ago(), 24, &mut calls)
            .await
            .unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].comment_id, "hit");
        assert_eq!(got[0].matched_phrase, "Citi");
    }
}
