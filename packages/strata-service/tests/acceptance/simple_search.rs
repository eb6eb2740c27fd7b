use time::{Duration, OffsetDateTime};

use strata_service::SimpleSearchRequest;
use strata_storage::models::{EntityKind, SearchSort};
use strata_testkit::fixtures;

#[tokio::test]
#[ignore = "Requires external Postgres. Set STRATA_PG_DSN to run."]
async fn simple_search_merges_both_collections() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping simple_search_merges_both_collections; set STRATA_PG_DSN to run this test.");

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let pool = &service.db.pool;
	let now = OffsetDateTime::now_utc();

	fixtures::insert_dataset(pool, "warehouse", "orders_daily", now - Duration::hours(2))
		.await
		.expect("Failed to insert dataset.");
	fixtures::insert_job(pool, "etl", "orders_rollup", "BATCH", now)
		.await
		.expect("Failed to insert job.");

	let deleted = fixtures::insert_dataset(pool, "warehouse", "orders_legacy", now)
		.await
		.expect("Failed to insert dataset.");

	fixtures::soft_delete_dataset(pool, deleted).await.expect("Failed to soft delete dataset.");

	let request = SimpleSearchRequest {
		query: "orders".to_string(),
		filter: None,
		sort: SearchSort::UpdatedAt,
		limit: 10,
		namespace: None,
	};
	let response = service.simple_search(request.clone()).await.expect("Simple search failed.");

	assert_eq!(response.total_count, 2);
	assert_eq!(response.results[0].kind, EntityKind::Job);
	assert_eq!(response.results[0].name, "orders_rollup");
	assert_eq!(response.results[1].kind, EntityKind::Dataset);

	let datasets_only = service
		.simple_search(SimpleSearchRequest { filter: Some(EntityKind::Dataset), ..request.clone() })
		.await
		.expect("Simple search failed.");

	assert_eq!(datasets_only.total_count, 1);
	assert_eq!(datasets_only.results[0].namespace, "warehouse");

	let scoped = service
		.simple_search(SimpleSearchRequest { namespace: Some("etl".to_string()), ..request })
		.await
		.expect("Simple search failed.");

	assert_eq!(scoped.total_count, 1);
	assert_eq!(scoped.results[0].kind, EntityKind::Job);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
