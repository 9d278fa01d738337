use std::{
	sync::atomic::{AtomicU64, Ordering},
	time::{Duration, Instant},
};

use async_trait::async_trait;
use axum::{
	http::header,
	response::{IntoResponse, Response},
};
use bytes::Bytes;
use moka::{future::Cache, Expiry};

/// Rendered output of a whole page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedPage {
	pub content_type: &'static str,
	pub body: Bytes,
}

impl CachedPage {
	pub fn json(body: Bytes) -> Self {
		Self {
			content_type: "application/json",
			body,
		}
	}
}

impl IntoResponse for CachedPage {
	fn into_response(self) -> Response {
		([(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
	}
}

/// Whole-page output cache keyed by request path.
///
/// Entries live until their TTL lapses or `clear` drops everything; there is
/// no per-key invalidation.
///
/// Every `clear` moves the cache to a new generation. A page rendered from
/// data read before a `clear` is stored with `set_unless_cleared`, which
/// drops it when the generation has moved on in the meantime.
#[async_trait]
pub trait PageCache: Send + Sync {
	async fn get(
		&self,
		key: &str,
	) -> Option<CachedPage>;

	async fn set(
		&self,
		key: String,
		page: CachedPage,
		ttl: Duration,
	);

	fn generation(&self) -> u64;

	async fn set_unless_cleared(
		&self,
		key: String,
		page: CachedPage,
		ttl: Duration,
		generation: u64,
	);

	async fn clear(&self);
}

#[derive(Clone, Debug)]
struct TimedPage {
	page: CachedPage,
	ttl: Duration,
}

struct PageExpiry;

impl Expiry<String, TimedPage> for PageExpiry {
	fn expire_after_create(
		&self,
		_key: &String,
		value: &TimedPage,
		_created_at: Instant,
	) -> Option<Duration> {
		Some(value.ttl)
	}

	fn expire_after_update(
		&self,
		_key: &String,
		value: &TimedPage,
		_updated_at: Instant,
		_duration_until_expiry: Option<Duration>,
	) -> Option<Duration> {
		Some(value.ttl)
	}
}

pub struct MokaPageCache {
	pages: Cache<String, TimedPage>,
	generation: AtomicU64,
}

impl MokaPageCache {
	pub fn new(capacity: u64) -> Self {
		Self {
			pages: Cache::builder().max_capacity(capacity).expire_after(PageExpiry).build(),
			generation: AtomicU64::new(0),
		}
	}
}

#[async_trait]
impl PageCache for MokaPageCache {
	async fn get(
		&self,
		key: &str,
	) -> Option<CachedPage> {
		self.pages.get(key).await.map(|timed| timed.page)
	}

	async fn set(
		&self,
		key: String,
		page: CachedPage,
		ttl: Duration,
	) {
		self.pages.insert(key, TimedPage { page, ttl }).await;
	}

	fn generation(&self) -> u64 {
		self.generation.load(Ordering::SeqCst)
	}

	async fn set_unless_cleared(
		&self,
		key: String,
		page: CachedPage,
		ttl: Duration,
		generation: u64,
	) {
		if self.generation() != generation {
			return;
		}
		self.set(key.clone(), page, ttl).await;
		// a clear that bumped the generation before this insert landed missed it
		if self.generation() != generation {
			self.pages.invalidate(&key).await;
		}
	}

	async fn clear(&self) {
		self.generation.fetch_add(1, Ordering::SeqCst);
		self.pages.invalidate_all();
		tracing::debug!("page cache cleared");
	}
}
