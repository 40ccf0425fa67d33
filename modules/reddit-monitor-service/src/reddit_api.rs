//! Reddit API client with OAuth2 client-credentials authentication.
//!
//! Provides new-post listings and comment trees for the ingestion pipeline.

use crate::error::PipelineError;
use crate::ingest::{FeedComment, FeedPost, SourceFeed};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// Listing pages fetched per subreddit before giving up on reaching the
/// lookback cutoff.
const MAX_LISTING_PAGES: usize = 10;

/// Reddit script-app credentials
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditCredentials {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            client_id: std::env::var("REDDIT_CLIENT_ID").ok()?,
            client_secret: std::env::var("REDDIT_CLIENT_SECRET").ok()?,
            user_agent: std::env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| "reddit-monitor-service/0.1".to_string()),
        })
    }
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct RedditFeed {
    client: reqwest::Client,
    credentials: RedditCredentials,
    lookback_hours: i64,
    token: Mutex<Option<CachedToken>>,
}

impl RedditFeed {
    pub fn new(credentials: RedditCredentials, lookback_hours: i64) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            lookback_hours,
            token: Mutex::new(None),
        }
    }

    /// Current bearer token, refreshed via the client-credentials grant when
    /// missing or within a minute of expiry.
    async fn bearer_token(&self) -> Result<String, String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + Duration::from_secs(60) {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .header("User-Agent", &self.credentials.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| format!("Reddit token request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read token response: {}", e))?;

        if !status.is_success() {
            return Err(format!(
                "Reddit token error ({}): {}",
                status,
                truncate_error(&body)
            ));
        }

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| format!("Invalid JSON: {}", e))?;
        let access_token = json["access_token"]
            .as_str()
            .ok_or_else(|| "Token response missing access_token".to_string())?
            .to_string();
        let expires_in = json["expires_in"].as_u64().unwrap_or(3600);

        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        });
        Ok(access_token)
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, String> {
        let token = self.bearer_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("User-Agent", &self.credentials.user_agent)
            .send()
            .await
            .map_err(|e| format!("Reddit API request failed: {}", e))?;

        if let Some(remaining) = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok())
        {
            if remaining < 5.0 {
                log::warn!("[REDDIT_MONITOR] Rate limit low: {} requests remaining", remaining);
            }
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;

        if status.as_u16() == 429 {
            return Err("Rate limited by Reddit".to_string());
        }
        if !status.is_success() {
            return Err(format!(
                "Reddit API error ({}): {}",
                status,
                truncate_error(&body)
            ));
        }

        serde_json::from_str(&body).map_err(|e| format!("Invalid JSON: {}", e))
    }

    async fn fetch_new_posts(&self, subreddit: &str) -> Result<Vec<FeedPost>, String> {
        let cutoff = Utc::now() - chrono::Duration::hours(self.lookback_hours);
        let mut posts = Vec::new();
        let mut after: Option<String> = None;

        for page in 0..MAX_LISTING_PAGES {
            let mut url = format!("{}/r/{}/new?limit=100&raw_json=1", API_BASE, subreddit);
            if let Some(ref cursor) = after {
                url.push_str(&format!("&after={}", cursor));
            }

            let json = self.get_json(&url).await?;
            let page_posts = parse_listing_posts(&json);
            let oldest = page_posts.last().map(|p| p.created_at);
            let page_len = page_posts.len();
            posts.extend(page_posts);

            after = json["data"]["after"].as_str().map(|s| s.to_string());

            // stop paging once the listing has crossed the lookback horizon
            let crossed_cutoff = oldest.map(|t| t < cutoff).unwrap_or(true);
            if crossed_cutoff || after.is_none() || page_len == 0 {
                break;
            }
            if page + 1 < MAX_LISTING_PAGES {
                // 500ms delay between pages to avoid bursting
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }

        Ok(posts)
    }

    async fn fetch_post_comments(
        &self,
        subreddit: &str,
        post_id: &str,
    ) -> Result<Vec<FeedComment>, String> {
        let url = format!(
            "{}/r/{}/comments/{}?limit=500&depth=10&raw_json=1",
            API_BASE, subreddit, post_id
        );
        let json = self.get_json(&url).await?;

        // response is [post listing, comment listing]
        let comment_listing = json
            .get(1)
            .ok_or_else(|| "Comment response missing comment listing".to_string())?;

        let mut comments = Vec::new();
        flatten_comment_tree(comment_listing, &mut comments);
        Ok(comments)
    }
}

/// Posts from a /new listing payload, in listing (newest-first) order.
fn parse_listing_posts(json: &serde_json::Value) -> Vec<FeedPost> {
    let children = match json["data"]["children"].as_array() {
        Some(c) => c,
        None => return Vec::new(),
    };

    children
        .iter()
        .filter(|child| child["kind"].as_str() == Some("t3"))
        .filter_map(|child| {
            let data = &child["data"];
            Some(FeedPost {
                id: data["id"].as_str()?.to_string(),
                title: data["title"].as_str().unwrap_or("").to_string(),
                created_at: epoch_to_utc(data["created_utc"].as_f64()?)?,
            })
        })
        .collect()
}

/// Walk a comment listing depth-first, collecting `t1` nodes and skipping
/// unloaded `more` stubs. A deleted author maps to an empty string.
fn flatten_comment_tree(listing: &serde_json::Value, out: &mut Vec<FeedComment>) {
    let children = match listing["data"]["children"].as_array() {
        Some(c) => c,
        None => return,
    };

    for child in children {
        if child["kind"].as_str() != Some("t1") {
            continue;
        }
        let data = &child["data"];
        let (id, body, created_at) = match (
            data["id"].as_str(),
            data["body"].as_str(),
            data["created_utc"].as_f64().and_then(epoch_to_utc),
        ) {
            (Some(id), Some(body), Some(created_at)) => (id, body, created_at),
            _ => continue,
        };

        out.push(FeedComment {
            id: id.to_string(),
            author: data["author"].as_str().unwrap_or("").to_string(),
            body: body.to_string(),
            created_at,
            score: data["score"].as_i64().unwrap_or(0),
        });

        let replies = &data["replies"];
        if replies.is_object() {
            flatten_comment_tree(replies, out);
        }
    }
}

fn epoch_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs as i64, 0)
}

#[async_trait]
impl SourceFeed for RedditFeed {
    async fn new_posts(&self, subreddit: &str) -> Result<Vec<FeedPost>, PipelineError> {
        self.fetch_new_posts(subreddit)
            .await
            .map_err(PipelineError::SourceFetch)
    }

    async fn post_comments(
        &self,
        subreddit: &str,
        post_id: &str,
    ) -> Result<Vec<FeedComment>, PipelineError> {
        self.fetch_post_comments(subreddit, post_id)
            .await
            .map_err(PipelineError::SourceFetch)
    }
}

fn truncate_error(s: &str) -> &str {
    s.get(..200).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_posts() {
        let raw = serde_json::json!({
            "kind": "Listing",
            "data": {
                "after": "t3_abc",
                "children": [
                    {"kind": "t3", "data": {"id": "p1", "title": "Daily Thread", "created_utc": 1766000000.0}},
                    {"kind": "t3", "data": {"id": "p2", "title": "Earnings", "created_utc": 1765990000.0}},
                    {"kind": "t5", "data": {"id": "not_a_post"}}
                ]
            }
        });
        let posts = parse_listing_posts(&raw);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "p1");
        assert_eq!(posts[0].title, "Daily Thread");
        assert!(posts[0].created_at > posts[1].created_at);
    }

    #[test]
    fn test_parse_listing_posts_empty_payload() {
        let raw = serde_json::json!({"error": 404});
        assert!(parse_listing_posts(&raw).is_empty());
    }

    #[test]
    fn test_flatten_comment_tree_walks_replies_and_skips_more() {
        let raw = serde_json::json!({
            "kind": "Listing",
            "data": {
                "children": [
                    {
                        "kind": "t1",
                        "data": {
                            "id": "c1",
                            "author": "alice",
                            "body": "Citi looks strong",
                            "created_utc": 1766000000.0,
                            "score": 12,
                            "replies": {
                                "kind": "Listing",
                                "data": {
                                    "children": [
                                        {
                                            "kind": "t1",
                                            "data": {
                                                "id": "c2",
                                                "author": "bob",
                                                "body": "agreed",
                                                "created_utc": 1766000100.0,
                                                "score": 3,
                                                "replies": ""
                                            }
                                        },
                                        {"kind": "more", "data": {"count": 57, "children": ["c9", "c10"]}}
                                    ]
                                }
                            }
                        }
                    }
                ]
            }
        });
        let mut out = Vec::new();
        flatten_comment_tree(&raw, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "c1");
        assert_eq!(out[0].score, 12);
        assert_eq!(out[1].id, "c2");
    }

    #[test]
    fn test_flatten_comment_tree_deleted_author_maps_to_empty() {
        let raw = serde_json::json!({
            "kind": "Listing",
            "data": {
                "children": [
                    {
                        "kind": "t1",
                        "data": {
                            "id": "c1",
                            "author": null,
                            "body": "[removed]",
                            "created_utc": 1766000000.0,
                            "score": 0,
                            "replies": ""
                        }
                    }
                ]
            }
        });
        let mut out = Vec::new();
        flatten_comment_tree(&raw, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].author, "");
    }

    #[test]
    fn test_credentials_require_id_and_secret() {
        // from_env reads real env vars; only exercise the defaulted agent
        let creds = RedditCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            user_agent: "reddit-monitor-service/0.1".to_string(),
        };
        assert!(!creds.user_agent.is_empty());
    }
}
