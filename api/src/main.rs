use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::info;

use bh_api::app::create_app;
use bh_api::state::AppState;
use bh_api::telemetry::init_tracing;
use bh_core::repositories::{InMemoryOtpStore, InMemoryUserRepository, OtpRecordStore, UserRepository};
use bh_core::services::{OtpCleanupConfig, OtpCleanupService};
use bh_infra::cache::{RedisClient, RedisOtpStore};
use bh_infra::database::{DatabasePool, MySqlOtpStore, MySqlUserRepository};
use bh_infra::email::create_delivery_channel;
use bh_infra::HealthCheck;
use bh_shared::config::{AppConfig, StoreBackend};

/// Record store and user repository for the configured backend
struct Persistence {
    store: Arc<dyn OtpRecordStore>,
    users: Arc<dyn UserRepository>,
    /// Stores without native expiry need the periodic purge
    needs_cleanup: bool,
    database: Option<DatabasePool>,
    health_checks: Vec<Arc<dyn HealthCheck>>,
}

/// How long Redis keeps a record past its expiry, so late verifications
/// still see it and report it as expired
fn redis_expiry_grace(config: &AppConfig) -> chrono::Duration {
    chrono::Duration::seconds(config.otp.cooldown_seconds).max(chrono::Duration::minutes(5))
}

async fn connect_database(config: &AppConfig) -> anyhow::Result<DatabasePool> {
    let pool = DatabasePool::new(&config.database)
        .await
        .context("failed to connect to MySQL")?;
    if config.database.run_migrations {
        pool.run_migrations().await.context("failed to run migrations")?;
    }
    Ok(pool)
}

async fn connect_persistence(config: &AppConfig) -> anyhow::Result<Persistence> {
    match config.otp.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory OTP store and user repository; data is lost on restart");
            Ok(Persistence {
                store: Arc::new(InMemoryOtpStore::new()),
                users: Arc::new(InMemoryUserRepository::new()),
                needs_cleanup: true,
                database: None,
                health_checks: Vec::new(),
            })
        }
        StoreBackend::Redis => {
            let pool = connect_database(config).await?;
            let client = RedisClient::new(config.cache.clone())
                .await
                .context("failed to connect to Redis")?;
            let health_checks: Vec<Arc<dyn HealthCheck>> =
                vec![Arc::new(pool.clone()), Arc::new(client.clone())];
            Ok(Persistence {
                store: Arc::new(RedisOtpStore::new(client, redis_expiry_grace(config))),
                users: Arc::new(MySqlUserRepository::new(pool.get_pool().clone())),
                needs_cleanup: false,
                health_checks,
                database: Some(pool),
            })
        }
        StoreBackend::Mysql => {
            let pool = connect_database(config).await?;
            Ok(Persistence {
                store: Arc::new(MySqlOtpStore::new(pool.get_pool().clone())),
                users: Arc::new(MySqlUserRepository::new(pool.get_pool().clone())),
                needs_cleanup: true,
                health_checks: vec![Arc::new(pool.clone()) as Arc<dyn HealthCheck>],
                database: Some(pool),
            })
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    info!(
        environment = %config.environment,
        store = ?config.otp.store,
        delivery = ?config.otp.delivery,
        "Starting BoardHub API"
    );

    let persistence = connect_persistence(&config).await?;
    let delivery = create_delivery_channel(config.otp.delivery, &config.mail)
        .context("failed to configure email delivery")?;

    let mut health_checks = persistence.health_checks;
    health_checks.extend(delivery.health_check);

    let _cleanup = if persistence.needs_cleanup {
        let cleanup = OtpCleanupService::new(
            persistence.store.clone(),
            OtpCleanupConfig::from_interval(config.otp.cleanup_interval_seconds),
        );
        Arc::new(cleanup).start_background_task()
    } else {
        None
    };

    let state = web::Data::new(
        AppState::build(persistence.store, delivery.channel, persistence.users, &config)
            .with_health_checks(health_checks),
    );

    let bind_address = config.server.bind_address();
    info!(address = %bind_address, "Server listening");

    let app_config = config.clone();
    let mut server = HttpServer::new(move || create_app(state.clone(), &app_config));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await
        .context("server error")?;

    if let Some(pool) = persistence.database {
        pool.close().await;
    }
    info!("Server stopped");
    Ok(())
}
