//! Background worker for the reddit monitor.
//!
//! One pipeline run per poll tick. The single loop is what guarantees at
//! most one concurrent run; there is no on-demand trigger.

use crate::pipeline::Pipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub async fn run_worker(
    pipeline: Arc<Pipeline>,
    poll_interval_secs: u64,
    last_tick_at: Arc<Mutex<Option<String>>>,
) {
    log::info!(
        "[REDDIT_MONITOR] Worker started (poll interval: {}s)",
        poll_interval_secs
    );

    loop {
        tokio::time::sleep(Duration::from_secs(poll_interval_secs)).await;

        match pipeline.run().await {
            Ok(report) => {
                *last_tick_at.lock().await = Some(chrono::Utc::now().to_rfc3339());
                log::info!(
                    "[REDDIT_MONITOR] Run complete: {} candidates, {} new, {} scored, gate {}, {} topics summarized ({} failed), {} external calls",
                    report.candidates,
                    report.new_comments,
                    report.scored,
                    if report.gate_allowed { "open" } else { "closed" },
                    report.topics_summarized,
                    report.topics_failed,
                    report.external_calls
                );
                for err in &report.errors {
                    log::warn!("[REDDIT_MONITOR] Run issue: {}", err);
                }
            }
            Err(e) => {
                log::error!("[REDDIT_MONITOR] Run aborted: {}", e);
            }
        }
    }
}
