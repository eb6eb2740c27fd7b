use time::OffsetDateTime;

use crate::{Error, Result, StrataService};
use strata_storage::{
	models::{EntityKind, SearchSort, SimpleSearchRow},
	search::{self, MatchFilter},
};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimpleSearchRequest {
	pub query: String,
	pub filter: Option<EntityKind>,
	pub sort: SearchSort,
	pub limit: u32,
	pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSearchResult {
	#[serde(rename = "type")]
	pub kind: EntityKind,
	pub name: String,
	pub namespace: String,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSearchResponse {
	pub total_count: u64,
	pub results: Vec<SimpleSearchResult>,
}

impl StrataService {
	/// Name-only search across both collections, without facets or budgeting.
	pub async fn simple_search(&self, req: SimpleSearchRequest) -> Result<SimpleSearchResponse> {
		if req.query.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "query must not be blank.".to_string() });
		}

		let limit = req.limit.min(self.cfg.search.max_limit);
		let rows = search::simple_search(
			&self.db.pool,
			MatchFilter { query: &req.query, namespace: req.namespace.as_deref() },
			req.filter,
			req.sort,
			i64::from(limit),
		)
		.await?;
		let results = rows.into_iter().filter_map(to_result).collect::<Vec<_>>();

		Ok(SimpleSearchResponse { total_count: results.len() as u64, results })
	}
}

fn to_result(row: SimpleSearchRow) -> Option<SimpleSearchResult> {
	let Some(kind) = EntityKind::parse(&row.r#type) else {
		tracing::warn!(entity_type = %row.r#type, "Skipping search row of unknown entity type.");

		return None;
	};

	Some(SimpleSearchResult {
		kind,
		name: row.name,
		namespace: row.namespace_name,
		updated_at: row.updated_at,
	})
}
