use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::DatabaseConfig;

pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    let options = match &config.url {
        Some(url) => url.parse::<PgConnectOptions>()?,
        None => {
            let options = PgConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.user)
                .database(&config.name)
                .ssl_mode(config.ssl_mode);
            // Leave an empty password unset so PGPASSWORD and .pgpass still apply.
            if config.password.is_empty() {
                options
            } else {
                options.password(&config.password)
            }
        }
    };

    Ok(options.options([("TimeZone", config.timezone.as_str())]))
}

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(connect_options(config)?)
        .await
}
