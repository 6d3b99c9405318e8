use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{info, warn};

use idearadar::analysis::LlmAnalysisClient;
use idearadar::config::{AppConfig, ScoringProvider};
use idearadar::finetune_job::FineTuneOrchestrator;
use idearadar::provider::LlmProvider;
use idearadar::provider_gemini::GeminiProvider;
use idearadar::provider_openai::OpenAiProvider;
use idearadar::state::AppState;
use idearadar::store::Store;
use idearadar::store_pg::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    // --- Postgres ---
    let pg_pool = PgPool::connect(&cfg.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("Failed to run migrations")?;

    let store = Arc::new(PgStore::new(pg_pool));
    store.ping().await.context("Postgres ping failed")?;
    info!("postgres: ok");

    // --- Providers (one client each for the life of the process) ---
    let timeout = Duration::from_secs(cfg.llm_timeout_secs);
    let openai = Arc::new(
        OpenAiProvider::new(cfg.openai_base_url.clone(), cfg.openai_api_key.clone(), timeout)
            .context("Failed to build OpenAI client")?,
    );
    let llm: Arc<dyn LlmProvider> = match cfg.scoring_provider {
        ScoringProvider::OpenAi => openai.clone(),
        ScoringProvider::Gemini => {
            let key = cfg
                .gemini_api_key
                .clone()
                .context("Missing required env var: GEMINI_API_KEY")?;
            Arc::new(
                GeminiProvider::new(cfg.gemini_base_url.clone(), key, timeout)
                    .context("Failed to build Gemini client")?,
            )
        }
    };
    // not fatal: scoring falls back to defaults while the provider is down
    match llm.ping().await {
        Ok(()) => info!(provider = %llm.info().name, "scoring provider: ok"),
        Err(e) => warn!(provider = %llm.info().name, error = %e, "scoring provider unreachable"),
    }

    let finetune = FineTuneOrchestrator::new(store.clone(), openai, cfg.finetune_base_model.clone());
    let analysis = LlmAnalysisClient::from_config(&cfg, llm.clone(), Arc::new(finetune.clone()));

    let bind_addr = cfg.bind_addr.clone();
    let state = Arc::new(AppState::new(cfg, store, llm, finetune, Arc::new(analysis)));
    let app = idearadar::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("idearadar listening on http://{bind_addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
