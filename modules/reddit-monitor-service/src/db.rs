//! SQLite database operations for the reddit monitor service.

use reddit_monitor_types::*;
use rusqlite::{Connection, Result as SqliteResult};
use std::collections::HashSet;
use std::sync::Mutex;

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn open(path: &str) -> SqliteResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS comments (
                comment_id TEXT PRIMARY KEY,
                post_title TEXT NOT NULL,
                subreddit TEXT NOT NULL,
                comment_date TEXT NOT NULL,
                comment_author TEXT NOT NULL DEFAULT '',
                comment TEXT NOT NULL,
                matched_phrase TEXT NOT NULL,
                upvotes INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_comments_date ON comments(comment_date DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_comments_subreddit ON comments(subreddit, comment_date DESC)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sentiment (
                comment_id TEXT PRIMARY KEY,
                compound REAL NOT NULL,
                sentiment TEXT NOT NULL,
                FOREIGN KEY (comment_id) REFERENCES comments(comment_id) ON DELETE CASCADE
            )",
            [],
        )?;

        // History table: one batch of rows appended per allowed daily run,
        // keyed only by date. The outlier topic (-1) is never written.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS topic_summaries (
                date TEXT NOT NULL,
                topic INTEGER NOT NULL,
                summary TEXT NOT NULL,
                primary_keywords TEXT NOT NULL,
                diversified_keywords TEXT NOT NULL,
                size INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_summaries_date ON topic_summaries(date DESC)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS run_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_run_time TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tracked_entities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                altname TEXT,
                abbreviation TEXT,
                ticker TEXT,
                altticker TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        Ok(())
    }

    /// Cheap connectivity probe, run before every pipeline pass.
    pub fn health_check(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    // =====================================================
    // Comment Operations
    // =====================================================

    pub fn existing_comment_ids(&self) -> SqliteResult<HashSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT comment_id FROM comments")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }

    /// Append-only insert; already-persisted ids are ignored. Returns the
    /// number of rows actually written.
    pub fn insert_comments(&self, comments: &[Comment]) -> SqliteResult<usize> {
        let conn = self.conn.lock().unwrap();
        let mut inserted = 0;
        for c in comments {
            inserted += conn.execute(
                "INSERT OR IGNORE INTO comments (
                    comment_id, post_title, subreddit, comment_date,
                    comment_author, comment, matched_phrase, upvotes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    c.comment_id,
                    c.post_title,
                    c.subreddit,
                    c.comment_date,
                    c.comment_author,
                    c.body,
                    c.matched_phrase,
                    c.upvotes
                ],
            )?;
        }
        Ok(inserted)
    }

    /// Comments at or after the cutoff, in stable encounter order for the
    /// clustering corpus.
    pub fn comments_since(&self, cutoff: &str) -> SqliteResult<Vec<Comment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT comment_id, post_title, subreddit, comment_date,
                    comment_author, comment, matched_phrase, upvotes
             FROM comments
             WHERE comment_date >= ?1
             ORDER BY comment_date ASC, comment_id ASC",
        )?;
        let entries = stmt
            .query_map([cutoff], |row| row_to_comment(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    pub fn query_comments(&self, filter: &CommentFilter) -> SqliteResult<Vec<Comment>> {
        let conn = self.conn.lock().unwrap();
        let mut conditions = vec!["1=1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        let mut param_idx = 1u32;

        if let Some(ref sub) = filter.subreddit {
            conditions.push(format!("c.subreddit = ?{} COLLATE NOCASE", param_idx));
            params.push(Box::new(sub.clone()));
            param_idx += 1;
        }
        if let Some(ref phrase) = filter.matched_phrase {
            conditions.push(format!("c.matched_phrase = ?{} COLLATE NOCASE", param_idx));
            params.push(Box::new(phrase.clone()));
            param_idx += 1;
        }
        if let Some(ref text) = filter.search_text {
            conditions.push(format!("c.comment LIKE ?{}", param_idx));
            params.push(Box::new(format!("%{}%", text)));
            param_idx += 1;
        }
        if let Some(ref since) = filter.since {
            conditions.push(format!("c.comment_date >= ?{}", param_idx));
            params.push(Box::new(since.clone()));
            param_idx += 1;
        }
        if let Some(ref until) = filter.until {
            conditions.push(format!("c.comment_date <= ?{}", param_idx));
            params.push(Box::new(until.clone()));
            param_idx += 1;
        }
        let _ = param_idx;

        let limit = filter.limit.unwrap_or(50).min(200);
        let sql = format!(
            "SELECT c.comment_id, c.post_title, c.subreddit, c.comment_date,
                    c.comment_author, c.comment, c.matched_phrase, c.upvotes
             FROM comments c
             WHERE {}
             ORDER BY c.comment_date DESC
             LIMIT {}",
            conditions.join(" AND "),
            limit
        );

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(param_refs.as_slice(), |row| row_to_comment(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    // =====================================================
    // Sentiment Operations
    // =====================================================

    pub fn existing_sentiment_ids(&self) -> SqliteResult<HashSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT comment_id FROM sentiment")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }

    pub fn insert_sentiments(&self, records: &[SentimentRecord]) -> SqliteResult<usize> {
        let conn = self.conn.lock().unwrap();
        let mut inserted = 0;
        for r in records {
            inserted += conn.execute(
                "INSERT OR IGNORE INTO sentiment (comment_id, compound, sentiment)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![r.comment_id, r.compound, r.sentiment.as_str()],
            )?;
        }
        Ok(inserted)
    }

    pub fn query_sentiment(&self, filter: &SentimentFilter) -> SqliteResult<Vec<SentimentRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut conditions = vec!["1=1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        let mut param_idx = 1u32;

        if let Some(ref label) = filter.sentiment {
            conditions.push(format!("s.sentiment = ?{}", param_idx));
            params.push(Box::new(label.to_uppercase()));
            param_idx += 1;
        }
        let _ = param_idx;

        let limit = filter.limit.unwrap_or(50).min(200);
        let sql = format!(
            "SELECT s.comment_id, s.compound, s.sentiment
             FROM sentiment s
             WHERE {}
             ORDER BY s.rowid DESC
             LIMIT {}",
            conditions.join(" AND "),
            limit
        );

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(param_refs.as_slice(), |row| row_to_sentiment_record(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    // =====================================================
    // Topic Summary Operations
    // =====================================================

    pub fn insert_topic_summaries(&self, rows: &[TopicSummary]) -> SqliteResult<usize> {
        let conn = self.conn.lock().unwrap();
        let mut inserted = 0;
        for t in rows {
            inserted += conn.execute(
                "INSERT INTO topic_summaries (date, topic, summary, primary_keywords, diversified_keywords, size)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    t.date,
                    t.topic_id,
                    t.summary,
                    t.primary_keywords,
                    t.diversified_keywords,
                    t.size
                ],
            )?;
        }
        Ok(inserted)
    }

    /// Most recent summary batch date (YYYY-MM-DD), if any batch exists.
    pub fn latest_summary_date(&self) -> SqliteResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT MAX(date) FROM topic_summaries", [], |row| {
            row.get::<_, Option<String>>(0)
        })
    }

    pub fn query_summaries(&self, filter: &SummaryFilter) -> SqliteResult<Vec<TopicSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut conditions = vec!["1=1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        let mut param_idx = 1u32;

        if let Some(ref date) = filter.date {
            conditions.push(format!("t.date = ?{}", param_idx));
            params.push(Box::new(date.clone()));
            param_idx += 1;
        }
        if let Some(topic_id) = filter.topic_id {
            conditions.push(format!("t.topic = ?{}", param_idx));
            params.push(Box::new(topic_id));
            param_idx += 1;
        }
        let _ = param_idx;

        let limit = filter.limit.unwrap_or(50).min(200);
        let sql = format!(
            "SELECT t.date, t.topic, t.summary, t.primary_keywords, t.diversified_keywords, t.size
             FROM topic_summaries t
             WHERE {}
             ORDER BY t.date DESC, t.topic ASC
             LIMIT {}",
            conditions.join(" AND "),
            limit
        );

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(param_refs.as_slice(), |row| row_to_summary(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    // =====================================================
    // Run Metadata
    // =====================================================

    pub fn last_run_time(&self) -> SqliteResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT last_run_time FROM run_metadata WHERE id = 1")?;
        let mut rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.next().and_then(|r| r.ok()))
    }

    pub fn set_last_run_time(&self, ts: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO run_metadata (id, last_run_time) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET last_run_time = ?1",
            [ts],
        )?;
        Ok(())
    }

    // =====================================================
    // Entity Operations
    // =====================================================

    pub fn add_entity(
        &self,
        name: &str,
        altname: Option<&str>,
        abbreviation: Option<&str>,
        ticker: Option<&str>,
        altticker: Option<&str>,
    ) -> SqliteResult<TrackedEntity> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO tracked_entities (name, altname, abbreviation, ticker, altticker, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![name, altname, abbreviation, ticker, altticker, now],
        )?;

        let id = conn.last_insert_rowid();
        Ok(TrackedEntity {
            id,
            name: name.to_string(),
            altname: altname.map(|s| s.to_string()),
            abbreviation: abbreviation.map(|s| s.to_string()),
            ticker: ticker.map(|s| s.to_string()),
            altticker: altticker.map(|s| s.to_string()),
            created_at: now,
        })
    }

    pub fn remove_entity(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM tracked_entities WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Entities in insertion order. The order is load-bearing: it fixes the
    /// alternation order of the compiled match pattern.
    pub fn list_entities(&self) -> SqliteResult<Vec<TrackedEntity>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, altname, abbreviation, ticker, altticker, created_at
             FROM tracked_entities ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map([], |row| row_to_entity(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    pub fn count_entities(&self) -> SqliteResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM tracked_entities", [], |row| {
            row.get(0)
        })
    }

    /// Idempotent watchlist seeding; names already present are left alone.
    pub fn seed_entities(&self, seeds: &[AddEntityRequest]) -> SqliteResult<usize> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        let mut inserted = 0;
        for s in seeds {
            inserted += conn.execute(
                "INSERT OR IGNORE INTO tracked_entities (name, altname, abbreviation, ticker, altticker, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![s.name, s.altname, s.abbreviation, s.ticker, s.altticker, now],
            )?;
        }
        Ok(inserted)
    }

    // =====================================================
    // Stats
    // =====================================================

    pub fn get_stats(&self) -> SqliteResult<MonitorStats> {
        let day_ago = (chrono::Utc::now() - chrono::Duration::days(1)).to_rfc3339();
        let week_ago = (chrono::Utc::now() - chrono::Duration::days(7)).to_rfc3339();
        let conn = self.conn.lock().unwrap();

        let total_comments: i64 = conn
            .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))
            .unwrap_or(0);
        let comments_today: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM comments WHERE comment_date >= ?1",
                [&day_ago],
                |row| row.get(0),
            )
            .unwrap_or(0);
        let comments_7d: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM comments WHERE comment_date >= ?1",
                [&week_ago],
                |row| row.get(0),
            )
            .unwrap_or(0);
        let scored_comments: i64 = conn
            .query_row("SELECT COUNT(*) FROM sentiment", [], |row| row.get(0))
            .unwrap_or(0);
        let tracked_entities: i64 = conn
            .query_row("SELECT COUNT(*) FROM tracked_entities", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);
        let summarized_topics: i64 = conn
            .query_row("SELECT COUNT(*) FROM topic_summaries", [], |row| row.get(0))
            .unwrap_or(0);
        let last_summary_date: Option<String> = conn
            .query_row("SELECT MAX(date) FROM topic_summaries", [], |row| {
                row.get(0)
            })
            .unwrap_or(None);

        Ok(MonitorStats {
            total_comments,
            comments_today,
            comments_7d,
            scored_comments,
            tracked_entities,
            summarized_topics,
            last_summary_date,
        })
    }
}

// =====================================================
// Row Mapping Functions
// =====================================================

fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        comment_id: row.get(0)?,
        post_title: row.get(1)?,
        subreddit: row.get(2)?,
        comment_date: row.get(3)?,
        comment_author: row.get(4)?,
        body: row.get(5)?,
        matched_phrase: row.get(6)?,
        upvotes: row.get(7)?,
    })
}

fn row_to_sentiment_record(row: &rusqlite::Row) -> rusqlite::Result<SentimentRecord> {
    let label: String = row.get(2)?;
    Ok(SentimentRecord {
        comment_id: row.get(0)?,
        compound: row.get(1)?,
        sentiment: Sentiment::from_label(&label).unwrap_or(Sentiment::Neutral),
    })
}

fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<TopicSummary> {
    Ok(TopicSummary {
        date: row.get(0)?,
        topic_id: row.get(1)?,
        summary: row.get(2)?,
        primary_keywords: row.get(3)?,
        diversified_keywords: row.get(4)?,
        size: row.get(5)?,
    })
}

fn row_to_entity(row: &rusqlite::Row) -> rusqlite::Result<TrackedEntity> {
    Ok(TrackedEntity {
        id: row.get(0)?,
        name: row.get(1)?,
        altname: row.get(2)?,
        abbreviation: row.get(3)?,
        ticker: row.get(4)?,
        altticker: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_db() -> Db {
        Db::open(":memory:").unwrap()
    }

    fn sample_comment(id: &str, subreddit: &str, date: &str) -> Comment {
        Comment {
            comment_id: id.to_string(),
            post_title: "Daily Discussion Thread".to_string(),
            subreddit: subreddit.to_string(),
            comment_date: date.to_string(),
            comment_author: "user1".to_string(),
            body: format!("something about Citi ({})", id),
            matched_phrase: "Citi".to_string(),
            upvotes: 3,
        }
    }

    #[test]
    fn test_insert_comments_ignores_duplicates() {
        let db = mem_db();
        let a = sample_comment("a1", "stocks", "2026-08-20T10:00:00+00:00");
        let b = sample_comment("b1", "stocks", "2026-08-20T11:00:00+00:00");

        assert_eq!(db.insert_comments(&[a.clone(), b.clone()]).unwrap(), 2);
        // overlapping rerun only writes the new row
        let c = sample_comment("c1", "finance", "2026-08-20T12:00:00+00:00");
        assert_eq!(db.insert_comments(&[a, b, c]).unwrap(), 1);
        assert_eq!(db.existing_comment_ids().unwrap().len(), 3);
    }

    #[test]
    fn test_comments_since_orders_by_date_then_id() {
        let db = mem_db();
        db.insert_comments(&[
            sample_comment("z", "stocks", "2026-08-20T10:00:00+00:00"),
            sample_comment("a", "stocks", "2026-08-20T10:00:00+00:00"),
            sample_comment("m", "stocks", "2026-08-21T09:00:00+00:00"),
            sample_comment("old", "stocks", "2026-08-10T09:00:00+00:00"),
        ])
        .unwrap();

        let rows = db.comments_since("2026-08-19T00:00:00+00:00").unwrap();
        let ids: Vec<&str> = rows.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "z", "m"]);
    }

    #[test]
    fn test_query_comments_filters() {
        let db = mem_db();
        db.insert_comments(&[
            sample_comment("a1", "stocks", "2026-08-20T10:00:00+00:00"),
            sample_comment("b1", "finance", "2026-08-20T11:00:00+00:00"),
        ])
        .unwrap();

        let by_sub = db
            .query_comments(&CommentFilter {
                subreddit: Some("Finance".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_sub.len(), 1);
        assert_eq!(by_sub[0].comment_id, "b1");

        let by_text = db
            .query_comments(&CommentFilter {
                search_text: Some("(a1)".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_text.len(), 1);
        assert_eq!(by_text[0].comment_id, "a1");
    }

    #[test]
    fn test_insert_sentiments_ignores_duplicates() {
        let db = mem_db();
        db.insert_comments(&[sample_comment("a1", "stocks", "2026-08-20T10:00:00+00:00")])
            .unwrap();

        let rec = SentimentRecord {
            comment_id: "a1".to_string(),
            compound: 0.6,
            sentiment: Sentiment::Positive,
        };
        assert_eq!(db.insert_sentiments(&[rec.clone()]).unwrap(), 1);
        assert_eq!(db.insert_sentiments(&[rec]).unwrap(), 0);

        let got = db.query_sentiment(&SentimentFilter::default()).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_latest_summary_date() {
        let db = mem_db();
        assert_eq!(db.latest_summary_date().unwrap(), None);

        let row = TopicSummary {
            date: "2026-08-19".to_string(),
            topic_id: 0,
            summary: "banks rallied".to_string(),
            primary_keywords: "citi, rally".to_string(),
            diversified_keywords: "citi, upgrade".to_string(),
            size: 12,
        };
        db.insert_topic_summaries(&[row.clone()]).unwrap();
        let mut newer = row;
        newer.date = "2026-08-21".to_string();
        db.insert_topic_summaries(&[newer]).unwrap();

        assert_eq!(
            db.latest_summary_date().unwrap(),
            Some("2026-08-21".to_string())
        );
    }

    #[test]
    fn test_last_run_time_upsert() {
        let db = mem_db();
        assert_eq!(db.last_run_time().unwrap(), None);

        db.set_last_run_time("2026-08-20T10:00:00+00:00").unwrap();
        db.set_last_run_time("2026-08-21T10:00:00+00:00").unwrap();
        assert_eq!(
            db.last_run_time().unwrap(),
            Some("2026-08-21T10:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_entity_add_list_remove() {
        let db = mem_db();
        let e = db
            .add_entity("Citigroup", Some("Citi"), None, Some("C"), None)
            .unwrap();
        db.add_entity("Bank of America", Some("BofA"), None, Some("BAC"), None)
            .unwrap();

        // duplicate name violates UNIQUE
        assert!(db.add_entity("Citigroup", None, None, None, None).is_err());

        let listed = db.list_entities().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Citigroup");

        assert!(db.remove_entity(e.id).unwrap());
        assert!(!db.remove_entity(e.id).unwrap());
        assert_eq!(db.count_entities().unwrap(), 1);
    }

    #[test]
    fn test_seed_entities_is_idempotent() {
        let db = mem_db();
        let seeds = vec![
            AddEntityRequest {
                name: "Citigroup".to_string(),
                altname: Some("Citi".to_string()),
                abbreviation: None,
                ticker: Some("C".to_string()),
                altticker: None,
            },
            AddEntityRequest {
                name: "HSBC".to_string(),
                altname: None,
                abbreviation: None,
                ticker: Some("HSBA.L".to_string()),
                altticker: None,
            },
        ];
        assert_eq!(db.seed_entities(&seeds).unwrap(), 2);
        assert_eq!(db.seed_entities(&seeds).unwrap(), 0);
        assert_eq!(db.count_entities().unwrap(), 2);
    }

    #[test]
    fn test_stats_counts() {
        let db = mem_db();
        let now = chrono::Utc::now().to_rfc3339();
        db.insert_comments(&[
            sample_comment("a1", "stocks", &now),
            sample_comment("b1", "stocks", "2020-01-01T00:00:00+00:00"),
        ])
        .unwrap();
        db.add_entity("Citigroup", None, None, None, None).unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_comments, 2);
        assert_eq!(stats.comments_today, 1);
        assert_eq!(stats.tracked_entities, 1);
        assert_eq!(stats.scored_comments, 0);
        assert_eq!(stats.last_summary_date, None);
    }
}
