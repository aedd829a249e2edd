use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use itinerary_billing::adapters::http::{billing_router, BillingAppState};
use itinerary_billing::adapters::memory::{
    InMemoryAccountDirectory, InMemoryDeliveryLog, InMemoryPurchaseRepository,
    InMemorySubscriptionRepository,
};
use itinerary_billing::adapters::postgres::{
    self, PostgresAccountDirectory, PostgresDeliveryLog, PostgresPurchaseRepository,
    PostgresSubscriptionRepository,
};
use itinerary_billing::adapters::stripe::{StripeConfig, StripeProcessorAdapter};
use itinerary_billing::application::handlers::billing::{
    BillingEventDispatcher, HandleBillingWebhookHandler, IdentityResolver,
    ReconcileSubscriptionHandler, RecordPurchaseHandler,
};
use itinerary_billing::config::{AppConfig, LogFormat, ServerConfig};
use itinerary_billing::domain::billing::StripeWebhookVerifier;
use itinerary_billing::ports::{
    AccountDirectory, DeliveryLog, PaymentProcessor, PurchaseRepository, SubscriptionRepository,
};

struct Stores {
    accounts: Arc<dyn AccountDirectory>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    deliveries: Arc<dyn DeliveryLog>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_validated()?;
    init_tracing(&config.server);

    if !config.payment.is_live_mode() {
        if config.payment.require_livemode {
            warn!("require_livemode is set with a test-mode API key; processor lookups will not see live objects");
        } else if config.server.is_production() {
            warn!("Production environment is using a test-mode Stripe API key");
        }
    }

    let stores = init_stores(&config).await?;

    let processor: Arc<dyn PaymentProcessor> = Arc::new(StripeProcessorAdapter::new(
        StripeConfig::new(config.payment.api_key())
            .with_base_url(&config.payment.api_base_url)
            .with_timeout(config.payment.api_timeout()),
    )?);
    let plans = Arc::new(config.payment.plan_table()?);

    let resolver = Arc::new(IdentityResolver::new(
        processor.clone(),
        stores.accounts,
        stores.subscriptions.clone(),
    ));
    let dispatcher = BillingEventDispatcher::new(
        ReconcileSubscriptionHandler::new(
            resolver.clone(),
            stores.subscriptions,
            processor,
            plans,
        ),
        RecordPurchaseHandler::new(resolver, stores.purchases),
    );

    let verifier = StripeWebhookVerifier::new(config.payment.webhook_secret())
        .with_tolerance(config.payment.signature_tolerance_secs);
    if !verifier.is_configured() {
        warn!("No webhook signing secret configured; deliveries will be answered with 500");
    }

    let webhook_handler =
        HandleBillingWebhookHandler::new(Arc::new(verifier), Arc::new(dispatcher), stores.deliveries)
            .with_require_livemode(config.payment.require_livemode);

    let app = billing_router(BillingAppState::new(webhook_handler))
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        addr = %listener.local_addr()?,
        environment = config.server.environment.as_str(),
        "Billing service listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match server.log_format() {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn init_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    let Some(options) = config.database.connect_options()? else {
        warn!("No database configured; using in-memory stores, state is lost on restart");
        return Ok(Stores {
            accounts: Arc::new(InMemoryAccountDirectory::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            purchases: Arc::new(InMemoryPurchaseRepository::new()),
            deliveries: Arc::new(InMemoryDeliveryLog::new()),
        });
    };

    let pool = postgres::connect(options, &config.database.pool)
        .await
        .context("failed to connect to database")?;

    let migrations = &config.database.migrations;
    if migrations.run_on_startup {
        postgres::run_migrations(&pool, &migrations.dir)
            .await
            .context("failed to run migrations")?;
    }

    Ok(Stores {
        accounts: Arc::new(PostgresAccountDirectory::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        purchases: Arc::new(PostgresPurchaseRepository::new(pool.clone())),
        deliveries: Arc::new(PostgresDeliveryLog::new(pool)),
    })
}
