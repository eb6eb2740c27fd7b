use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{Result, models::LineageEdge};

/// Current version of a dataset, or `None` when the dataset is unknown or has no version yet.
pub async fn current_version_of<'e, E>(executor: E, dataset_id: Uuid) -> Result<Option<Uuid>>
where
	E: PgExecutor<'e>,
{
	let version: Option<Option<Uuid>> =
		sqlx::query_scalar("SELECT current_version_uuid FROM datasets WHERE uuid = $1")
			.bind(dataset_id)
			.fetch_optional(executor)
			.await?;

	Ok(version.flatten())
}

pub async fn version_belongs_to<'e, E>(
	executor: E,
	dataset_id: Uuid,
	version_id: Uuid,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let exists = sqlx::query_scalar(
		"SELECT EXISTS (SELECT 1 FROM dataset_versions WHERE uuid = $1 AND dataset_uuid = $2)",
	)
	.bind(version_id)
	.bind(dataset_id)
	.fetch_one(executor)
	.await?;

	Ok(exists)
}

/// Jobs reading or writing the dataset through their current version only.
///
/// Mappings of superseded job versions are ignored.
pub async fn current_io_edges<'e, E>(executor: E, dataset_id: Uuid) -> Result<Vec<LineageEdge>>
where
	E: PgExecutor<'e>,
{
	let edges = sqlx::query_as::<_, LineageEdge>(
		"\
SELECT
	io.io_type,
	io.job_uuid,
	j.namespace_name,
	j.type AS job_type
FROM job_versions_io_mapping AS io
INNER JOIN jobs_view AS j ON j.uuid = io.job_uuid
WHERE io.dataset_uuid = $1 AND io.is_current_job_version = TRUE
ORDER BY io.job_uuid, io.io_type",
	)
	.bind(dataset_id)
	.fetch_all(executor)
	.await?;

	Ok(edges)
}
