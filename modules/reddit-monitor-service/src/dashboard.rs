//! Dashboard HTML page handler.
//!
//! Serves a self-contained HTML page with inline CSS showing the entity
//! watchlist, harvest stats, recent comments, and the latest topic
//! summaries.

use crate::routes::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use std::sync::Arc;

pub async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.db.get_stats().ok();
    let entities = state.db.list_entities().unwrap_or_default();
    let recent = state
        .db
        .query_comments(&reddit_monitor_types::CommentFilter {
            limit: Some(20),
            ..Default::default()
        })
        .unwrap_or_default();
    let summaries = state
        .db
        .query_summaries(&reddit_monitor_types::SummaryFilter {
            limit: Some(20),
            ..Default::default()
        })
        .unwrap_or_default();
    let last_tick = state.last_tick_at.lock().await.clone();
    let last_run = state.db.last_run_time().ok().flatten();
    let uptime = state.start_time.elapsed().as_secs();

    let stats_html = if let Some(s) = &stats {
        format!(
            r#"<div class="stats">
                <div class="stat"><span class="val">{}</span><span class="lbl">Entities</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Comments</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Today</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">7 Days</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Scored</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Topic Rows</span></div>
            </div>"#,
            s.tracked_entities,
            s.total_comments,
            s.comments_today,
            s.comments_7d,
            s.scored_comments,
            s.summarized_topics
        )
    } else {
        "<p>No stats available.</p>".to_string()
    };

    let mut entity_rows = String::new();
    for e in &entities {
        entity_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"mono\">{}</td><td class=\"mono\">{}</td></tr>\n",
            e.id,
            escape_html(&e.name),
            e.altname.as_deref().map(escape_html).unwrap_or_else(|| "-".to_string()),
            e.abbreviation.as_deref().map(escape_html).unwrap_or_else(|| "-".to_string()),
            e.ticker.as_deref().map(escape_html).unwrap_or_else(|| "-".to_string()),
            e.altticker.as_deref().map(escape_html).unwrap_or_else(|| "-".to_string()),
        ));
    }
    if entity_rows.is_empty() {
        entity_rows = "<tr><td colspan=\"6\">No entities tracked yet.</td></tr>".to_string();
    }

    let mut comment_rows = String::new();
    for c in &recent {
        let text_short: String = if c.body.chars().count() > 100 {
            format!("{}...", c.body.chars().take(100).collect::<String>())
        } else {
            c.body.clone()
        };
        comment_rows.push_str(&format!(
            "<tr><td>r/{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&c.subreddit),
            escape_html(&c.matched_phrase),
            escape_html(&text_short),
            c.comment_date,
            c.upvotes
        ));
    }
    if comment_rows.is_empty() {
        comment_rows = "<tr><td colspan=\"5\">No comments harvested yet.</td></tr>".to_string();
    }

    let mut summary_rows = String::new();
    for s in &summaries {
        summary_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            s.date,
            s.topic_id,
            escape_html(&s.primary_keywords),
            escape_html(&s.summary),
            s.size
        ));
    }
    if summary_rows.is_empty() {
        summary_rows = "<tr><td colspan=\"5\">No topic summaries yet.</td></tr>".to_string();
    }

    let last_tick_str = last_tick.as_deref().unwrap_or("not yet");
    let last_run_str = last_run.as_deref().unwrap_or("never");
    let uptime_str = format_uptime(uptime);

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Reddit Monitor Dashboard</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0f1117; color: #e0e0e0; padding: 20px; }}
  h1 {{ color: #58a6ff; margin-bottom: 8px; }}
  .meta {{ color: #8b949e; font-size: 0.85em; margin-bottom: 20px; }}
  .stats {{ display: flex; gap: 16px; margin-bottom: 24px; flex-wrap: wrap; }}
  .stat {{ background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 16px 24px; text-align: center; min-width: 120px; }}
  .stat .val {{ display: block; font-size: 2em; font-weight: bold; color: #58a6ff; }}
  .stat .lbl {{ display: block; font-size: 0.85em; color: #8b949e; margin-top: 4px; }}
  table {{ width: 100%; border-collapse: collapse; margin-bottom: 24px; }}
  th {{ background: #161b22; color: #8b949e; text-align: left; padding: 8px 12px; font-size: 0.85em; text-transform: uppercase; border-bottom: 1px solid #30363d; }}
  td {{ padding: 8px 12px; border-bottom: 1px solid #21262d; font-size: 0.9em; }}
  tr:hover {{ background: #161b22; }}
  .mono {{ font-family: 'SF Mono', 'Consolas', monospace; font-size: 0.85em; }}
  h2 {{ color: #c9d1d9; margin-bottom: 12px; font-size: 1.1em; }}
  .section {{ margin-bottom: 28px; }}
</style>
</head>
<body>
  <h1>Reddit Monitor</h1>
  <p class="meta">Uptime: {uptime_str} &middot; Last tick: {last_tick_str} &middot; Last run: {last_run_str} &middot; Poll interval: {poll_interval}s</p>

  {stats_html}

  <div class="section">
    <h2>Tracked Entities</h2>
    <table>
      <thead><tr><th>ID</th><th>Name</th><th>Alt Name</th><th>Abbrev</th><th>Ticker</th><th>Alt Ticker</th></tr></thead>
      <tbody>{entity_rows}</tbody>
    </table>
  </div>

  <div class="section">
    <h2>Latest Topic Summaries</h2>
    <table>
      <thead><tr><th>Date</th><th>Topic</th><th>Keywords</th><th>Summary</th><th>Size</th></tr></thead>
      <tbody>{summary_rows}</tbody>
    </table>
  </div>

  <div class="section">
    <h2>Recent Comments</h2>
    <table>
      <thead><tr><th>Subreddit</th><th>Matched</th><th>Text</th><th>Time</th><th>Upvotes</th></tr></thead>
      <tbody>{comment_rows}</tbody>
    </table>
  </div>

  <script>
    // Auto-refresh every 30 seconds
    setTimeout(() => location.reload(), 30000);
  </script>
</body>
</html>"#,
        uptime_str = uptime_str,
        last_tick_str = last_tick_str,
        last_run_str = last_run_str,
        poll_interval = state.poll_interval_secs,
        stats_html = stats_html,
        entity_rows = entity_rows,
        summary_rows = summary_rows,
        comment_rows = comment_rows,
    );

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
