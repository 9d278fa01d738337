use std::sync::Arc;

use crate::{
	adapters::repositories::{EntityStore, MemoryStore, PgStore},
	common::page_cache::{MokaPageCache, PageCache},
	config::{Config, StorageBackend},
	database::{connection_pool, run_migrations},
	services::{authorization::AuthorizationGate, feed::FeedAssembler, follow::FollowManager, response::ServiceError},
};

/// Collaborators shared by every request.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<dyn EntityStore>,
	pub page_cache: Arc<dyn PageCache>,
	pub config: Arc<Config>,
}

impl AppState {
	pub fn new(
		store: Arc<dyn EntityStore>,
		page_cache: Arc<dyn PageCache>,
		config: Arc<Config>,
	) -> Self {
		Self {
			store,
			page_cache,
			config,
		}
	}

	pub fn feed(&self) -> FeedAssembler {
		FeedAssembler::new(self.store.clone())
	}

	pub fn follows(&self) -> FollowManager {
		FollowManager::new(self.store.clone())
	}

	pub fn gate(&self) -> AuthorizationGate {
		AuthorizationGate::new(self.config.login_url.clone())
	}

	/// Feeds are aggregates over all posts, so any post write drops every
	/// cached page.
	pub async fn invalidate_pages(&self) {
		self.page_cache.clear().await;
	}
}

pub struct Bootstrap;
impl Bootstrap {
	pub async fn app_state(config: Arc<Config>) -> Result<AppState, ServiceError> {
		let store: Arc<dyn EntityStore> = match config.storage {
			StorageBackend::Postgres => {
				let pool = connection_pool(&config).await?;
				run_migrations(pool).await?;
				Arc::new(PgStore::new(pool.clone()))
			}
			StorageBackend::Memory => {
				tracing::warn!("running on the in-memory store, nothing will be persisted");
				Arc::new(MemoryStore::new())
			}
		};
		let page_cache = Arc::new(MokaPageCache::new(config.page_cache_capacity));

		Ok(AppState::new(store, page_cache, config))
	}

	/// In-memory wiring with default settings.
	pub fn in_memory() -> AppState {
		let config = Config::default();
		AppState::new(
			Arc::new(MemoryStore::new()),
			Arc::new(MokaPageCache::new(config.page_cache_capacity)),
			Arc::new(config),
		)
	}
}
