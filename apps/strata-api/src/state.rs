use std::sync::Arc;

use strata_config::Config;
use strata_service::StrataService;
use strata_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<StrataService>,
}
impl AppState {
	/// Connects to Postgres and brings the schema up to date.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::with_db(config, db))
	}

	pub fn with_db(config: Config, db: Db) -> Self {
		Self { service: Arc::new(StrataService::new(config, db)) }
	}
}
