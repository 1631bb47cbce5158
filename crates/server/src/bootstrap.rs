use std::sync::Arc;

use mifugo_core::config::AppConfig;
use mifugo_db::repositories::{
    RequisitionRepository, SqlRequisitionRepository, SqlUserDirectory, UserDirectory,
};
use mifugo_db::{connect_with_settings, migrations, DbPool};
use mifugo_notify::recipients::RecipientResolver;
use mifugo_notify::{EmailChannel, SmsChannel, TimeoutSweeper, TransitionReactor};
use thiserror::Error;
use tracing::info;

use crate::health::ChannelStatus;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub reactor: Arc<TransitionReactor>,
    pub sweeper: Arc<TimeoutSweeper>,
    pub channels: ChannelStatus,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let users: Arc<dyn UserDirectory> = Arc::new(SqlUserDirectory::new(db_pool.clone()));
    let requisitions: Arc<dyn RequisitionRepository> =
        Arc::new(SqlRequisitionRepository::new(db_pool.clone()));

    let email = EmailChannel::new(&config.smtp);
    let sms = SmsChannel::new(config.sms.clone());
    let channels = ChannelStatus {
        email_configured: email.is_configured(),
        sms_configured: sms.is_configured(),
    };
    info!(
        event_name = "system.bootstrap.channels",
        email_configured = channels.email_configured,
        sms_configured = channels.sms_configured,
        "notification channels initialized"
    );

    let reactor = Arc::new(TransitionReactor::new(
        RecipientResolver::new(users),
        Arc::new(email),
        Arc::new(sms),
        config.workflow.clone(),
    ));
    let sweeper = Arc::new(TimeoutSweeper::new(requisitions, reactor.clone(), &config.workflow));

    Ok(Application { config, db_pool, reactor, sweeper, channels })
}
