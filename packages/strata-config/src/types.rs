use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub lineage: Lineage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Result budget bounds shared by the search routes and the orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_limit")]
	pub default_limit: u32,
	#[serde(default = "default_min_limit")]
	pub min_limit: u32,
	/// Requests above this limit are clamped, not rejected.
	#[serde(default = "default_max_limit")]
	pub max_limit: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: default_limit(),
			min_limit: default_min_limit(),
			max_limit: default_max_limit(),
		}
	}
}

/// Identity embedded in every `lineageStatistics` facet document.
#[derive(Debug, Clone, Deserialize)]
pub struct Lineage {
	#[serde(default = "default_producer")]
	pub producer: String,
	#[serde(default = "default_schema_url")]
	pub schema_url: String,
}
impl Default for Lineage {
	fn default() -> Self {
		Self { producer: default_producer(), schema_url: default_schema_url() }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_limit() -> u32 {
	20
}

fn default_min_limit() -> u32 {
	1
}

fn default_max_limit() -> u32 {
	100
}

fn default_producer() -> String {
	"https://github.com/strata-lineage/strata".to_string()
}

fn default_schema_url() -> String {
	"https://github.com/strata-lineage/strata/spec/facets/lineage-statistics.json".to_string()
}
