pub mod allocator;
pub mod datasets;
pub mod executor;
pub mod full_search;
pub mod jobs;
pub mod lineage_stats;
pub mod simple_search;
pub mod time_serde;

mod error;

pub use datasets::{DatasetId, DatasetResult, SchemaField};
pub use error::{Error, Result};
pub use executor::{EntitySearch, Executor, Facets, SearchParams};
pub use full_search::{FullSearch, FullSearchRequest, FullSearchResponse, FullSearchResults};
pub use jobs::{JobId, JobResult};
pub use lineage_stats::{LineageStatistics, StatisticsScope};
pub use simple_search::{SimpleSearchRequest, SimpleSearchResponse, SimpleSearchResult};

use std::{future::Future, pin::Pin};

use strata_config::Config;
use strata_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub struct StrataService {
	pub cfg: Config,
	pub db: Db,
}
impl StrataService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db }
	}
}
