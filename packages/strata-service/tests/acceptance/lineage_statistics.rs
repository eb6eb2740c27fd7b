use serde_json::json;
use time::OffsetDateTime;

use strata_service::Error;
use strata_storage::{
	facets::{self, LINEAGE_STATISTICS_FACET},
	models::FacetKind,
};
use strata_testkit::fixtures;

#[tokio::test]
#[ignore = "Requires external Postgres. Set STRATA_PG_DSN to run."]
async fn recompute_counts_current_edges_and_appends_history() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping recompute_counts_current_edges_and_appends_history; set STRATA_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let pool = &service.db.pool;
	let now = OffsetDateTime::now_utc();
	let dataset = fixtures::insert_dataset(pool, "warehouse", "analytics.orders", now)
		.await
		.expect("Failed to insert dataset.");
	let version = fixtures::insert_dataset_version(pool, dataset, None)
		.await
		.expect("Failed to insert dataset version.");
	let writer = fixtures::insert_job(pool, "ingest", "load_orders", "BATCH", now)
		.await
		.expect("Failed to insert job.");
	let writer_version = fixtures::insert_job_version(pool, writer, None)
		.await
		.expect("Failed to insert job version.");
	let reader = fixtures::insert_job(pool, "reporting", "orders_dashboard", "STREAM", now)
		.await
		.expect("Failed to insert job.");
	let reader_old = fixtures::insert_job_version(pool, reader, None)
		.await
		.expect("Failed to insert job version.");

	fixtures::map_io(pool, writer, writer_version, dataset, "OUTPUT")
		.await
		.expect("Failed to map job output.");
	fixtures::map_io(pool, reader, reader_old, dataset, "INPUT")
		.await
		.expect("Failed to map job input.");

	let first = service
		.recompute_lineage_statistics(dataset)
		.await
		.expect("Failed to recompute lineage statistics.")
		.expect("Expected statistics for a versioned dataset.");

	assert_eq!(first.in_edges, 1);
	assert_eq!(first.out_edges, 1);
	assert_eq!(first.producing_namespaces, vec!["ingest"]);
	assert_eq!(first.consuming_namespaces, vec!["reporting"]);
	assert_eq!(first.consuming_job_types, Some(vec!["STREAM".to_string()]));

	// A new reader version without mappings supersedes the old edge.
	fixtures::insert_job_version(pool, reader, None).await.expect("Failed to insert job version.");

	let second = service
		.recompute_lineage_statistics(dataset)
		.await
		.expect("Failed to recompute lineage statistics.")
		.expect("Expected statistics for a versioned dataset.");

	assert_eq!(second.in_edges, 1);
	assert_eq!(second.out_edges, 0);
	assert!(second.consuming_namespaces.is_empty());

	let stored: i64 = sqlx::query_scalar(
		"SELECT COUNT(*) FROM dataset_facets WHERE dataset_version_uuid = $1 AND name = $2",
	)
	.bind(version)
	.bind(LINEAGE_STATISTICS_FACET)
	.fetch_one(pool)
	.await
	.expect("Failed to count lineage statistics rows.");

	assert_eq!(stored, 2);

	let latest = facets::latest_dataset_facets(pool, version, &[FacetKind::Dataset], None)
		.await
		.expect("Failed to read dataset facets.");
	let document = &latest[LINEAGE_STATISTICS_FACET];

	assert_eq!(document["outEdges"], json!(0));
	assert_eq!(document["_producer"], json!(service.cfg.lineage.producer));
	assert_eq!(document["_schema"], json!(service.cfg.lineage.schema_url));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set STRATA_PG_DSN to run."]
async fn version_recompute_targets_the_given_version() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping version_recompute_targets_the_given_version; set STRATA_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let pool = &service.db.pool;
	let dataset =
		fixtures::insert_dataset(pool, "warehouse", "analytics.orders", OffsetDateTime::now_utc())
			.await
			.expect("Failed to insert dataset.");
	let older = fixtures::insert_dataset_version(pool, dataset, None)
		.await
		.expect("Failed to insert dataset version.");

	fixtures::insert_dataset_version(pool, dataset, None)
		.await
		.expect("Failed to insert dataset version.");

	let statistics = service
		.recompute_lineage_statistics_for_version(dataset, older)
		.await
		.expect("Failed to recompute lineage statistics.")
		.expect("Expected statistics for a versioned dataset.");

	assert!(statistics.producing_job_types.is_none());

	let latest = facets::latest_dataset_facets(pool, older, &[FacetKind::Dataset], None)
		.await
		.expect("Failed to read dataset facets.");
	let document = &latest[LINEAGE_STATISTICS_FACET];

	assert_eq!(document["inEdges"], json!(0));
	assert!(document.get("producingJobTypes").is_none());

	let other =
		fixtures::insert_dataset(pool, "warehouse", "analytics.users", OffsetDateTime::now_utc())
			.await
			.expect("Failed to insert dataset.");

	fixtures::insert_dataset_version(pool, other, None)
		.await
		.expect("Failed to insert dataset version.");

	let err = service
		.recompute_lineage_statistics_for_version(other, older)
		.await
		.expect_err("Expected a foreign version to be rejected.");

	assert!(matches!(err, Error::NotFound { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set STRATA_PG_DSN to run."]
async fn unversioned_dataset_is_skipped_without_writing() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping unversioned_dataset_is_skipped_without_writing; set STRATA_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let pool = &service.db.pool;
	let dataset =
		fixtures::insert_dataset(pool, "warehouse", "analytics.orders", OffsetDateTime::now_utc())
			.await
			.expect("Failed to insert dataset.");
	let statistics = service
		.recompute_lineage_statistics(dataset)
		.await
		.expect("Failed to recompute lineage statistics.");

	assert!(statistics.is_none());

	let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dataset_facets")
		.fetch_one(pool)
		.await
		.expect("Failed to count dataset facets.");

	assert_eq!(stored, 0);

	let unknown = service
		.recompute_lineage_statistics(uuid::Uuid::new_v4())
		.await
		.expect("Failed to recompute lineage statistics.");

	assert!(unknown.is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
