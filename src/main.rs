use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use invoiceflow::config::Config;
use invoiceflow::middleware::{json_config, query_config, RateLimiter};
use invoiceflow::modules::businesses::{CredentialProvider, MySqlCredentialProvider};
use invoiceflow::modules::gateways::{PaymentGateway, ToyyibPayClient};
use invoiceflow::modules::health;
use invoiceflow::modules::invoices::{
    self, BatchProcessor, InvoiceRepository, IssuanceWorkflow, MySqlInvoiceRepository,
    RetryScheduler,
};
use invoiceflow::modules::notifications::{LogNotificationSender, NotificationDispatcher};
use invoiceflow::modules::transactions::{self, ReconciliationService};
use invoiceflow::queue::{spawn_consumers, InMemoryBroker, MessagePublisher, QueueHandlers};

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("invoiceflow={},actix_web=info", log_level))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config.app.log_level, config.app.is_production());

    tracing::info!("Starting InvoiceFlow");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    let repository: Arc<dyn InvoiceRepository> =
        Arc::new(MySqlInvoiceRepository::new(db_pool.clone()));
    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(MySqlCredentialProvider::new(db_pool.clone()));
    let gateway: Arc<dyn PaymentGateway> = Arc::new(
        ToyyibPayClient::new(&config.toyyibpay).context("Failed to build gateway client")?,
    );
    let notifications = NotificationDispatcher::new(Arc::new(LogNotificationSender));

    let (broker, receivers) = InMemoryBroker::new(config.pipeline.queue_capacity);
    let publisher: Arc<dyn MessagePublisher> = Arc::new(broker);

    let workflow = Arc::new(IssuanceWorkflow::new(
        repository.clone(),
        gateway.clone(),
        notifications.clone(),
    ));

    let handlers = QueueHandlers {
        batch_processor: Arc::new(BatchProcessor::new(
            workflow.clone(),
            credentials.clone(),
            publisher.clone(),
            config.pipeline.batch_item_delay(),
        )),
        retry_scheduler: Arc::new(RetryScheduler::new(
            workflow,
            credentials,
            publisher.clone(),
            config.pipeline.retry_backoff(),
            config.pipeline.max_retry_attempts,
        )),
        reconciliation: Arc::new(ReconciliationService::new(
            repository.clone(),
            gateway,
            notifications,
        )),
    };

    let consumers = spawn_consumers(receivers, handlers);
    tracing::info!(consumers = consumers.len(), "Queue consumers started");

    let limiter = RateLimiter::new(config.security.rate_limit_per_minute);

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        let limiter = limiter.clone();

        App::new()
            .wrap(TracingLogger::default())
            .app_data(json_config())
            .app_data(query_config())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(publisher.clone()))
            .app_data(web::Data::new(repository.clone()))
            .configure(health::controllers::configure)
            .configure(|cfg| invoices::controllers::configure(cfg, limiter))
            .configure(transactions::controllers::configure)
    })
    .workers(config.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;

    for consumer in consumers {
        consumer.abort();
    }

    Ok(())
}
