use std::collections::HashMap;

use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, Result,
	executor::{EntityShape, Facets},
};
use strata_storage::{facets, models::JobRow, search::JobView};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobId {
	pub namespace: String,
	pub name: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
	pub id: JobId,
	#[serde(rename = "type")]
	pub job_type: String,
	pub name: String,
	pub simple_name: String,
	pub parent_job_name: Option<String>,
	pub parent_job_uuid: Option<Uuid>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	pub namespace: String,
	pub location: Option<String>,
	pub description: Option<String>,
	pub current_version: Option<Uuid>,
	pub latest_run: Option<Uuid>,
	pub tags: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub facets: Option<Facets>,
}

/// Job facets come from the timeline of the job's most recent run only.
pub struct JobShape;
impl EntityShape for JobShape {
	type Item = JobResult;
	type View = JobView;

	fn facet_owner(row: &JobRow) -> Option<Uuid> {
		row.latest_run_uuid
	}

	fn load_facets<'a>(
		pool: &'a PgPool,
		owners: &'a [Uuid],
		names: Option<&'a [String]>,
	) -> BoxFuture<'a, Result<HashMap<Uuid, Facets>>> {
		Box::pin(async move {
			let timelines = facets::job_facet_timelines(pool, owners, names).await?;

			Ok(timelines
				.into_iter()
				.map(|(run_id, timeline)| (run_id, fold_timeline(timeline)))
				.collect())
		})
	}

	fn project(row: JobRow, facets: Option<Facets>) -> JobResult {
		JobResult {
			id: JobId { namespace: row.namespace_name.clone(), name: row.name.clone() },
			job_type: row.r#type,
			name: row.name,
			simple_name: row.simple_name,
			parent_job_name: row.parent_job_name,
			parent_job_uuid: row.parent_job_uuid,
			created_at: row.created_at,
			updated_at: row.updated_at,
			namespace: row.namespace_name,
			location: row.location,
			description: row.description,
			current_version: row.current_version_uuid,
			latest_run: row.latest_run_uuid,
			tags: row.tags,
			facets,
		}
	}
}

/// Replays an ascending timeline so the last event for each name wins.
fn fold_timeline(timeline: Vec<(String, Value)>) -> Facets {
	timeline.into_iter().collect()
}
