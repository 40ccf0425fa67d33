//! Reddit Monitor Service — standalone binary for harvesting Reddit comments
//! about tracked financial entities.
//!
//! Hosts both an RPC API and a dashboard UI on the same port.
//! Default: http://127.0.0.1:9104/

mod cluster;
mod config;
mod dashboard;
mod db;
mod error;
mod ingest;
mod model_api;
mod pattern;
mod pipeline;
mod reddit_api;
mod routes;
mod sentiment;
mod summarize;
mod worker;

use routes::AppState;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = config::Config::from_env();

    log::info!("Opening database at: {}", config.db_path);
    let database = Arc::new(db::Db::open(&config.db_path).expect("Failed to open database"));

    if let Some(ref seed_path) = config.entity_seed_path {
        seed_entities(&database, seed_path);
    }

    let last_tick_at: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    let state = Arc::new(AppState {
        db: database.clone(),
        start_time: Instant::now(),
        last_tick_at: last_tick_at.clone(),
        poll_interval_secs: config.poll_interval_secs,
    });

    // Spawn background worker if Reddit credentials are configured
    match reddit_api::RedditCredentials::from_env() {
        Some(credentials) => {
            let feed = Arc::new(reddit_api::RedditFeed::new(
                credentials,
                config.lookback_hours,
            ));
            let model = Arc::new(model_api::ModelServerClient::new(
                &config.model_server_url,
                config.min_cluster_size,
                config.summary_min_length,
                config.summary_max_length,
            ));
            let pipeline = Arc::new(pipeline::Pipeline {
                db: database.clone(),
                feed,
                scorer: Arc::new(sentiment::LexiconScorer::new()),
                embedder: model.clone(),
                clusterer: model.clone(),
                summarizer: model,
                config: config.clone(),
            });

            let worker_last_tick = last_tick_at.clone();
            let poll_interval_secs = config.poll_interval_secs;
            tokio::spawn(async move {
                worker::run_worker(pipeline, poll_interval_secs, worker_last_tick).await;
            });
            log::info!(
                "Background worker started (poll interval: {}s)",
                config.poll_interval_secs
            );
        }
        None => {
            log::warn!("Reddit credentials not set — background worker disabled");
        }
    }

    let cors = tower_http::cors::CorsLayer::permissive();

    let app = axum::Router::new()
        .route("/", axum::routing::get(dashboard::dashboard))
        // Entity management
        .route(
            "/rpc/entities/add",
            axum::routing::post(routes::entities_add),
        )
        .route(
            "/rpc/entities/remove",
            axum::routing::post(routes::entities_remove),
        )
        .route(
            "/rpc/entities/list",
            axum::routing::get(routes::entities_list),
        )
        // Queries
        .route(
            "/rpc/comments/query",
            axum::routing::post(routes::comments_query),
        )
        .route(
            "/rpc/sentiment/query",
            axum::routing::post(routes::sentiment_query),
        )
        .route(
            "/rpc/summaries/query",
            axum::routing::post(routes::summaries_query),
        )
        // Service
        .route("/rpc/stats", axum::routing::get(routes::stats))
        .route("/rpc/status", axum::routing::get(routes::status))
        .with_state(state)
        .layer(cors);

    let addr = format!("127.0.0.1:{}", config.port);
    log::info!("Reddit Monitor Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}

/// Seed the watchlist from a JSON file of entity entries. Names already in
/// the table are left untouched, so the seed can ship with the deployment.
fn seed_entities(database: &db::Db, path: &str) {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Entity seed file {} unreadable: {}", path, e);
            return;
        }
    };
    let seeds: Vec<reddit_monitor_types::AddEntityRequest> = match serde_json::from_str(&raw) {
        Ok(seeds) => seeds,
        Err(e) => {
            log::warn!("Entity seed file {} is not valid JSON: {}", path, e);
            return;
        }
    };
    match database.seed_entities(&seeds) {
        Ok(added) => log::info!("Seeded {} entities from {}", added, path),
        Err(e) => log::warn!("Entity seeding failed: {}", e),
    }
}
