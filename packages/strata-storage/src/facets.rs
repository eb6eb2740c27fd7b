//! Append-only facet store.
//!
//! Facet rows are never updated in place. Readers resolve the current document for a name with
//! [`latest_by_name`] (datasets) or read a whole run timeline (jobs).

use std::collections::HashMap;

use serde_json::{Map, Value};
use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{DatasetFacetRecord, DatasetFacetRow, FacetKind, JobFacetRecord, JobFacetRow},
};

pub const LINEAGE_STATISTICS_FACET: &str = "lineageStatistics";

const DATASET_FACET_KINDS: [(&str, FacetKind); 12] = [
	("documentation", FacetKind::Dataset),
	("description", FacetKind::Dataset),
	("schema", FacetKind::Dataset),
	("dataSource", FacetKind::Dataset),
	("lifecycleStateChange", FacetKind::Dataset),
	("version", FacetKind::Dataset),
	("columnLineage", FacetKind::Dataset),
	("ownership", FacetKind::Dataset),
	("dataQualityMetrics", FacetKind::Input),
	("dataQualityAssertions", FacetKind::Input),
	("outputStatistics", FacetKind::Output),
	(LINEAGE_STATISTICS_FACET, FacetKind::Dataset),
];

/// Kind of a well-known dataset facet name; unrecognized names are [`FacetKind::Unknown`].
pub fn dataset_facet_kind_for(name: &str) -> FacetKind {
	DATASET_FACET_KINDS
		.iter()
		.find(|(known, _)| known.eq_ignore_ascii_case(name))
		.map(|(_, kind)| *kind)
		.unwrap_or(FacetKind::Unknown)
}

fn ensure_object(name: &str, document: &Value) -> Result<()> {
	if document.is_object() {
		return Ok(());
	}

	Err(Error::InvalidArgument(format!("Facet {name} must be a JSON object.")))
}

pub async fn insert_dataset_facet<'e, E>(executor: E, record: &DatasetFacetRecord) -> Result<()>
where
	E: PgExecutor<'e>,
{
	ensure_object(&record.name, &record.document)?;

	sqlx::query(
		"\
INSERT INTO dataset_facets (
	created_at,
	dataset_uuid,
	dataset_version_uuid,
	run_uuid,
	lineage_event_time,
	lineage_event_type,
	type,
	name,
	facet
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
	)
	.bind(record.created_at)
	.bind(record.dataset_id)
	.bind(record.owner_version_id)
	.bind(record.source_run_id)
	.bind(record.source_event_time)
	.bind(record.source_event_type.as_deref())
	.bind(record.kind.as_str())
	.bind(record.name.as_str())
	.bind(&record.document)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn insert_job_facet<'e, E>(executor: E, record: &JobFacetRecord) -> Result<()>
where
	E: PgExecutor<'e>,
{
	ensure_object(&record.name, &record.document)?;

	sqlx::query(
		"\
INSERT INTO job_facets (
	created_at,
	job_uuid,
	run_uuid,
	lineage_event_time,
	lineage_event_type,
	name,
	facet
)
VALUES ($1,$2,$3,$4,$5,$6,$7)",
	)
	.bind(record.created_at)
	.bind(record.job_id)
	.bind(record.run_id)
	.bind(record.source_event_time)
	.bind(record.source_event_type.as_deref())
	.bind(record.name.as_str())
	.bind(&record.document)
	.execute(executor)
	.await?;

	Ok(())
}

/// Candidate dataset facet rows for the given versions, oldest first.
///
/// An empty or absent `names` selects every name.
pub async fn dataset_facet_rows<'e, E>(
	executor: E,
	version_ids: &[Uuid],
	kinds: &[FacetKind],
	names: Option<&[String]>,
) -> Result<Vec<DatasetFacetRow>>
where
	E: PgExecutor<'e>,
{
	if version_ids.is_empty() || kinds.is_empty() {
		return Ok(Vec::new());
	}

	let kinds = kinds.iter().map(|kind| kind.as_str().to_string()).collect::<Vec<_>>();
	let names = names.map(<[String]>::to_vec).unwrap_or_default();
	let rows = sqlx::query_as::<_, DatasetFacetRow>(
		"\
SELECT
	dataset_version_uuid,
	type AS kind,
	name,
	facet,
	created_at
FROM dataset_facets
WHERE dataset_version_uuid = ANY($1::uuid[])
	AND type = ANY($2::text[])
	AND (cardinality($3::text[]) = 0 OR name = ANY($3::text[]))
ORDER BY created_at ASC, seq ASC",
	)
	.bind(version_ids)
	.bind(&kinds)
	.bind(&names)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn latest_dataset_facets_for<'e, E>(
	executor: E,
	version_ids: &[Uuid],
	kinds: &[FacetKind],
	names: Option<&[String]>,
) -> Result<HashMap<Uuid, Map<String, Value>>>
where
	E: PgExecutor<'e>,
{
	let rows = dataset_facet_rows(executor, version_ids, kinds, names).await?;

	Ok(latest_by_name(rows))
}

pub async fn latest_dataset_facets<'e, E>(
	executor: E,
	version_id: Uuid,
	kinds: &[FacetKind],
	names: Option<&[String]>,
) -> Result<Map<String, Value>>
where
	E: PgExecutor<'e>,
{
	let mut by_version = latest_dataset_facets_for(executor, &[version_id], kinds, names).await?;

	Ok(by_version.remove(&version_id).unwrap_or_default())
}

/// Reduces facet rows to one document per `(owner version, name)`.
///
/// The row with the greatest `created_at` wins. Among equal timestamps the row that comes later in
/// `rows` wins, so callers pass rows in storage order.
pub fn latest_by_name(rows: Vec<DatasetFacetRow>) -> HashMap<Uuid, Map<String, Value>> {
	let mut latest: HashMap<(Uuid, String), (OffsetDateTime, Value)> = HashMap::new();

	for row in rows {
		let key = (row.dataset_version_uuid, row.name);
		let newer = latest.get(&key).is_none_or(|(created_at, _)| *created_at <= row.created_at);

		if newer {
			latest.insert(key, (row.created_at, row.facet));
		}
	}

	let mut by_owner: HashMap<Uuid, Map<String, Value>> = HashMap::new();

	for ((owner, name), (_, document)) in latest {
		by_owner.entry(owner).or_default().insert(name, document);
	}

	by_owner
}

/// Facet timelines of the given runs, ascending by lineage event time; no deduplication.
pub async fn job_facet_timelines<'e, E>(
	executor: E,
	run_ids: &[Uuid],
	names: Option<&[String]>,
) -> Result<HashMap<Uuid, Vec<(String, Value)>>>
where
	E: PgExecutor<'e>,
{
	if run_ids.is_empty() {
		return Ok(HashMap::new());
	}

	let names = names.map(<[String]>::to_vec).unwrap_or_default();
	let rows = sqlx::query_as::<_, JobFacetRow>(
		"\
SELECT
	run_uuid,
	name,
	facet,
	lineage_event_time
FROM job_facets
WHERE run_uuid = ANY($1::uuid[])
	AND (cardinality($2::text[]) = 0 OR name = ANY($2::text[]))
ORDER BY run_uuid, lineage_event_time ASC, seq ASC",
	)
	.bind(run_ids)
	.bind(&names)
	.fetch_all(executor)
	.await?;
	let mut timelines: HashMap<Uuid, Vec<(String, Value)>> = HashMap::new();

	for row in rows {
		timelines.entry(row.run_uuid).or_default().push((row.name, row.facet));
	}

	Ok(timelines)
}

pub async fn job_facet_timeline<'e, E>(
	executor: E,
	run_id: Uuid,
	names: Option<&[String]>,
) -> Result<Vec<(String, Value)>>
where
	E: PgExecutor<'e>,
{
	let mut timelines = job_facet_timelines(executor, &[run_id], names).await?;

	Ok(timelines.remove(&run_id).unwrap_or_default())
}
