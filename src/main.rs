use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tillbridge::adapters::http::{api_router, readiness_router, AppState};
use tillbridge::adapters::postgres::{
    PostgresConnectionRepository, PostgresDeviceRepository, PostgresOAuthStateRepository,
    PostgresPromoCodeRepository, PostgresSubscriptionEventLog, PostgresSubscriptionRepository,
    PostgresWebhookEventRepository,
};
use tillbridge::adapters::square::{SquareMerchantGateway, SquareWebhookVerifier};
use tillbridge::adapters::stripe::{StripeBillingGateway, StripeWebhookVerifier};
use tillbridge::config::AppConfig;
use tillbridge::jobs;
use tillbridge::ports::{
    ConnectionRepository, MerchantGateway, OAuthStateRepository, WebhookEventRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first so the log filter can come from it
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        square_sandbox = config.square.is_sandbox(),
        stripe_test_mode = config.stripe.is_test_mode(),
        "Starting tillbridge"
    );

    // Database pool
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    tracing::info!("Database pool created");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations completed");
    }

    // Repositories
    let connections: Arc<dyn ConnectionRepository> =
        Arc::new(PostgresConnectionRepository::new(pool.clone()));
    let oauth_states: Arc<dyn OAuthStateRepository> =
        Arc::new(PostgresOAuthStateRepository::new(pool.clone()));
    let webhook_events: Arc<dyn WebhookEventRepository> =
        Arc::new(PostgresWebhookEventRepository::new(pool.clone()));

    // Gateways
    let merchant_gateway: Arc<dyn MerchantGateway> =
        Arc::new(SquareMerchantGateway::new(config.square.clone()));

    let state = AppState {
        connections: connections.clone(),
        oauth_states: oauth_states.clone(),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        subscription_events: Arc::new(PostgresSubscriptionEventLog::new(pool.clone())),
        promo_codes: Arc::new(PostgresPromoCodeRepository::new(pool.clone())),
        devices: Arc::new(PostgresDeviceRepository::new(pool.clone())),
        webhook_events: webhook_events.clone(),
        merchant_gateway: merchant_gateway.clone(),
        billing_gateway: Arc::new(StripeBillingGateway::new(config.stripe.clone())),
        square_verifier: Arc::new(SquareWebhookVerifier::new(config.square.clone())),
        stripe_verifier: Arc::new(StripeWebhookVerifier::new(config.stripe.clone())),
        mobile: config.mobile.clone(),
        checkout_success_url: config.stripe.checkout_return_url.clone(),
        checkout_cancel_url: config.stripe.checkout_return_url.clone(),
        portal_return_url: config.stripe.portal_return_url.clone(),
    };

    // Scheduled jobs: hourly token refresh, daily retention sweep
    let scheduler = JobScheduler::new().await?;

    {
        let connections = connections.clone();
        let gateway = merchant_gateway.clone();
        scheduler
            .add(Job::new_async("0 7 * * * *", move |_id, _sched| {
                let connections = connections.clone();
                let gateway = gateway.clone();
                Box::pin(async move {
                    if let Err(err) =
                        jobs::token_refresher::refresh_expiring_connections(connections, gateway)
                            .await
                    {
                        tracing::error!(error = %err, "Token refresh run failed");
                    }
                })
            })?)
            .await?;
    }

    {
        let oauth_states = oauth_states.clone();
        let webhook_events = webhook_events.clone();
        scheduler
            .add(Job::new_async("0 40 4 * * *", move |_id, _sched| {
                let oauth_states = oauth_states.clone();
                let webhook_events = webhook_events.clone();
                Box::pin(async move {
                    if let Err(err) = jobs::retention::sweep(oauth_states, webhook_events).await {
                        tracing::error!(error = %err, "Retention sweep failed");
                    }
                })
            })?)
            .await?;
    }

    scheduler.start().await?;
    tracing::info!("Job scheduler started");

    // Router with the ambient middleware stack
    let cors = if config.server.cors_origins_list().is_empty() {
        CorsLayer::new()
    } else {
        let origins: Vec<_> = config
            .server
            .cors_origins_list()
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    let app = api_router(state)
        .merge(readiness_router(pool.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors);

    let addr = config.server.socket_addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, cleaning up...");
}
