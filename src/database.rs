use std::sync::OnceLock;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::{config::Config, services::response::ServiceError};

pub async fn connection_pool(config: &Config) -> Result<&'static PgPool, ServiceError> {
	static POOL: OnceLock<PgPool> = OnceLock::new();

	let p = match POOL.get() {
		None => {
			let url = config
				.database_url
				.as_deref()
				.ok_or_else(|| ServiceError::ConfigError("DATABASE_URL must be set!".into()))?;
			let pool = PgPoolOptions::new().max_connections(30).connect(url).await?;
			POOL.get_or_init(|| pool)
		}
		Some(pool) => pool,
	};
	Ok(p)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), ServiceError> {
	sqlx::migrate!("./migrations").run(pool).await?;
	tracing::info!("database migrations applied");
	Ok(())
}
