use std::sync::Arc;

use anyhow::Context;
use gigo::config::Config;
use gigo::db::postgres::PgStore;
use gigo::db::Store;
use gigo::email::{LogMailer, MailgunMailer, Mailer};
use gigo::models::band::membership::EventBus;
use gigo::models::plan::PlanSectionListener;
use gigo::routes::app;
use gigo::state::AppState;
use gigo::tasks::{ChannelTaskQueue, JobRunner};
use gigo::util::connect_to_db;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "gigo=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Arc::new(Config::from_env()?);
    let pool = connect_to_db(&config.database_url).await?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    let mailer: Arc<dyn Mailer> = match &config.mailgun_token {
        Some(token) => Arc::new(MailgunMailer::new(
            token.clone(),
            config.mailgun_domain.clone(),
        )),
        None => {
            tracing::warn!("`MAILGUN_TOKEN` not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };
    let tasks = ChannelTaskQueue::start(JobRunner::new(
        store.clone(),
        mailer,
        config.base_url.clone(),
    ));

    let state = AppState {
        store,
        tasks: Arc::new(tasks),
        events: Arc::new(EventBus::default().with_listener(Arc::new(PlanSectionListener))),
        config: config.clone(),
    };

    tracing::info!(address = %config.bind_address, "listening");
    axum::Server::bind(&config.bind_address)
        .serve(app(state).into_make_service())
        .await
        .context("Server failed")
}
