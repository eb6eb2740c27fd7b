mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Lineage, Postgres, Search, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::Read { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config =
		toml::from_str(&raw).map_err(|err| Error::Parse { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.search.min_limit == 0 {
		return Err(Error::Validation {
			message: "search.min_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_limit < cfg.search.min_limit {
		return Err(Error::Validation {
			message: "search.max_limit must be greater than or equal to search.min_limit."
				.to_string(),
		});
	}
	if !(cfg.search.min_limit..=cfg.search.max_limit).contains(&cfg.search.default_limit) {
		return Err(Error::Validation {
			message: "search.default_limit must be between search.min_limit and search.max_limit."
				.to_string(),
		});
	}

	for (label, value) in
		[("lineage.producer", &cfg.lineage.producer), ("lineage.schema_url", &cfg.lineage.schema_url)]
	{
		if value.is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let log_level = cfg.service.log_level.trim();

	cfg.service.log_level =
		if log_level.is_empty() { "info".to_string() } else { log_level.to_string() };
	cfg.lineage.producer = cfg.lineage.producer.trim().to_string();
	cfg.lineage.schema_url = cfg.lineage.schema_url.trim().to_string();
}
