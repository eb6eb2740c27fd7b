//! Minimal writers for the entity tables that search and lineage statistics read.
//!
//! Entity lifecycle belongs to the ingestion side, so these exist only to seed test databases.

use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::Result;

pub async fn insert_dataset(
	pool: &PgPool,
	namespace: &str,
	name: &str,
	updated_at: OffsetDateTime,
) -> Result<Uuid> {
	let dataset_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO datasets (
	uuid,
	type,
	created_at,
	updated_at,
	namespace_name,
	source_name,
	name,
	physical_name
)
VALUES ($1, 'DB_TABLE', $2, $2, $3, 'test_source', $4, $4)",
	)
	.bind(dataset_id)
	.bind(updated_at)
	.bind(namespace)
	.bind(name)
	.execute(pool)
	.await?;

	Ok(dataset_id)
}

/// Adds a dataset version and makes it current.
pub async fn insert_dataset_version(
	pool: &PgPool,
	dataset_id: Uuid,
	fields: Option<Value>,
) -> Result<Uuid> {
	let version_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO dataset_versions (uuid, dataset_uuid, version, lifecycle_state, fields)
VALUES ($1, $2, $3, 'CREATE', $4)",
	)
	.bind(version_id)
	.bind(dataset_id)
	.bind(Uuid::new_v4())
	.bind(fields)
	.execute(pool)
	.await?;
	sqlx::query("UPDATE datasets SET current_version_uuid = $1 WHERE uuid = $2")
		.bind(version_id)
		.bind(dataset_id)
		.execute(pool)
		.await?;

	Ok(version_id)
}

pub async fn soft_delete_dataset(pool: &PgPool, dataset_id: Uuid) -> Result<()> {
	sqlx::query("UPDATE datasets SET is_deleted = true WHERE uuid = $1")
		.bind(dataset_id)
		.execute(pool)
		.await?;

	Ok(())
}

pub async fn insert_job(
	pool: &PgPool,
	namespace: &str,
	name: &str,
	job_type: &str,
	updated_at: OffsetDateTime,
) -> Result<Uuid> {
	let job_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO jobs (uuid, type, created_at, updated_at, namespace_name, name, simple_name)
VALUES ($1, $2, $3, $3, $4, $5, $5)",
	)
	.bind(job_id)
	.bind(job_type)
	.bind(updated_at)
	.bind(namespace)
	.bind(name)
	.execute(pool)
	.await?;

	Ok(job_id)
}

/// Adds a job version, makes it current, and retires the I/O mappings of older versions.
pub async fn insert_job_version(
	pool: &PgPool,
	job_id: Uuid,
	latest_run_id: Option<Uuid>,
) -> Result<Uuid> {
	let version_id = Uuid::new_v4();
	let mut tx = pool.begin().await?;

	sqlx::query(
		"\
INSERT INTO job_versions (uuid, job_uuid, version, namespace_name, job_name, latest_run_uuid)
SELECT $1, j.uuid, $2, j.namespace_name, j.name, $3
FROM jobs AS j
WHERE j.uuid = $4",
	)
	.bind(version_id)
	.bind(Uuid::new_v4())
	.bind(latest_run_id)
	.bind(job_id)
	.execute(&mut *tx)
	.await?;
	sqlx::query("UPDATE jobs SET current_version_uuid = $1 WHERE uuid = $2")
		.bind(version_id)
		.bind(job_id)
		.execute(&mut *tx)
		.await?;
	sqlx::query(
		"\
UPDATE job_versions_io_mapping
SET is_current_job_version = false
WHERE job_uuid = $1 AND job_version_uuid <> $2",
	)
	.bind(job_id)
	.bind(version_id)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(version_id)
}

pub async fn symlink_job(pool: &PgPool, alias_id: Uuid, target_id: Uuid) -> Result<()> {
	sqlx::query("UPDATE jobs SET symlink_target_uuid = $1 WHERE uuid = $2")
		.bind(target_id)
		.bind(alias_id)
		.execute(pool)
		.await?;

	Ok(())
}

/// Records that `job_version_id` reads (`INPUT`) or writes (`OUTPUT`) the dataset.
pub async fn map_io(
	pool: &PgPool,
	job_id: Uuid,
	job_version_id: Uuid,
	dataset_id: Uuid,
	io_type: &str,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO job_versions_io_mapping (job_version_uuid, dataset_uuid, io_type, job_uuid)
VALUES ($1, $2, $3, $4)",
	)
	.bind(job_version_id)
	.bind(dataset_id)
	.bind(io_type)
	.bind(job_id)
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn tag_dataset(pool: &PgPool, dataset_id: Uuid, tag: &str) -> Result<()> {
	let tag_id = ensure_tag(pool, tag).await?;

	sqlx::query("INSERT INTO datasets_tag_mapping (dataset_uuid, tag_uuid) VALUES ($1, $2)")
		.bind(dataset_id)
		.bind(tag_id)
		.execute(pool)
		.await?;

	Ok(())
}

pub async fn tag_job(pool: &PgPool, job_id: Uuid, tag: &str) -> Result<()> {
	let tag_id = ensure_tag(pool, tag).await?;

	sqlx::query("INSERT INTO jobs_tag_mapping (job_uuid, tag_uuid) VALUES ($1, $2)")
		.bind(job_id)
		.bind(tag_id)
		.execute(pool)
		.await?;

	Ok(())
}

async fn ensure_tag(pool: &PgPool, tag: &str) -> Result<Uuid> {
	let tag_id: Uuid = sqlx::query_scalar(
		"\
INSERT INTO tags (uuid, name)
VALUES ($1, $2)
ON CONFLICT (name) DO UPDATE SET updated_at = now()
RETURNING uuid",
	)
	.bind(Uuid::new_v4())
	.bind(tag)
	.fetch_one(pool)
	.await?;

	Ok(tag_id)
}
