use std::time::Duration;

use crate::services::response::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
	Postgres,
	Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
	/// Which events we want to log when `RUST_LOG` is not set
	pub log_level: String,

	/// Port server is listening to
	pub server_ip_port: String,
	pub storage: StorageBackend,
	/// Required for the Postgres backend
	pub database_url: Option<String>,
	pub allow_origins: String,

	/// Where anonymous writers are sent, `next` is appended
	pub login_url: String,
	/// Header the upstream identity provider puts the username in
	pub identity_header: String,

	pub page_cache_ttl: Duration,
	pub page_cache_capacity: u64,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			log_level: "info".to_string(),
			server_ip_port: "0.0.0.0:80".to_string(),
			storage: StorageBackend::Memory,
			database_url: None,
			allow_origins: "http://localhost:3000,http://localhost:3001".to_string(),
			login_url: "/auth/login/".to_string(),
			identity_header: "x-authenticated-user".to_string(),
			page_cache_ttl: Duration::from_secs(20),
			page_cache_capacity: 1000,
		}
	}
}

impl Config {
	pub fn new() -> Result<Config, ServiceError> {
		dotenv::dotenv().ok();
		let defaults = Config::default();

		let storage = match std::env::var("STORAGE_BACKEND").unwrap_or("postgres".into()).as_str() {
			"postgres" => StorageBackend::Postgres,
			"memory" => StorageBackend::Memory,
			other => return Err(ServiceError::ConfigError(format!("unknown STORAGE_BACKEND `{other}`"))),
		};
		let database_url = std::env::var("DATABASE_URL").ok();
		if storage == StorageBackend::Postgres && database_url.is_none() {
			return Err(ServiceError::ConfigError("DATABASE_URL must be set!".into()));
		}

		let log_level = std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level);
		let server_ip_port = std::env::var("SERVER_IP_PORT").unwrap_or(defaults.server_ip_port);
		let allow_origins = std::env::var("ALLOW_ORIGINS").unwrap_or(defaults.allow_origins);
		let login_url = std::env::var("LOGIN_URL").unwrap_or(defaults.login_url);
		let identity_header = std::env::var("IDENTITY_HEADER").unwrap_or(defaults.identity_header);
		let page_cache_ttl = match std::env::var("PAGE_CACHE_TTL_SECS") {
			Ok(raw) => Duration::from_secs(parse_number("PAGE_CACHE_TTL_SECS", &raw)?),
			Err(_) => defaults.page_cache_ttl,
		};
		let page_cache_capacity = match std::env::var("PAGE_CACHE_CAPACITY") {
			Ok(raw) => parse_number("PAGE_CACHE_CAPACITY", &raw)?,
			Err(_) => defaults.page_cache_capacity,
		};

		Ok(Config {
			log_level,
			server_ip_port,
			storage,
			database_url,
			allow_origins,
			login_url,
			identity_header,
			page_cache_ttl,
			page_cache_capacity,
		})
	}
}

fn parse_number(
	name: &str,
	raw: &str,
) -> Result<u64, ServiceError> {
	raw.trim()
		.parse::<u64>()
		.map_err(|_| ServiceError::ConfigError(format!("{name} must be a non-negative integer, got `{raw}`")))
}

#[test]
fn test_parse_number_reports_variable() {
	assert_eq!(parse_number("PAGE_CACHE_TTL_SECS", " 20 ").unwrap(), 20);
	let err = parse_number("PAGE_CACHE_TTL_SECS", "soon").unwrap_err();
	assert!(err.to_string().contains("PAGE_CACHE_TTL_SECS"));
}
