use serde_json::json;
use time::{Duration, OffsetDateTime};

use strata_service::FullSearchRequest;
use strata_storage::{
	facets,
	models::{EntityKind, FacetKind, SearchSort},
};
use strata_testkit::fixtures;

fn request(query: &str) -> FullSearchRequest {
	FullSearchRequest {
		query: query.to_string(),
		filter: None,
		sort: SearchSort::UpdatedAt,
		limit: 20,
		offset: 0,
		namespace: None,
		facets: true,
		facet_names: None,
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set STRATA_PG_DSN to run."]
async fn full_search_hides_deleted_datasets_and_job_aliases() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping full_search_hides_deleted_datasets_and_job_aliases; set STRATA_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let pool = &service.db.pool;
	let now = OffsetDateTime::now_utc();
	let orders = fixtures::insert_dataset(pool, "warehouse", "analytics.orders", now)
		.await
		.expect("Failed to insert dataset.");

	fixtures::insert_dataset(pool, "warehouse", "analytics.users", now - Duration::hours(1))
		.await
		.expect("Failed to insert dataset.");

	let retired = fixtures::insert_dataset(pool, "warehouse", "analytics.retired", now)
		.await
		.expect("Failed to insert dataset.");

	fixtures::soft_delete_dataset(pool, retired).await.expect("Failed to soft delete dataset.");
	fixtures::insert_dataset(pool, "warehouse", "billing.invoices", now)
		.await
		.expect("Failed to insert dataset.");
	fixtures::tag_dataset(pool, orders, "PII").await.expect("Failed to tag dataset.");

	let rollup = fixtures::insert_job(pool, "etl", "analytics_rollup", "BATCH", now)
		.await
		.expect("Failed to insert job.");
	let alias = fixtures::insert_job(pool, "etl", "analytics_rollup_v0", "BATCH", now)
		.await
		.expect("Failed to insert job.");

	fixtures::symlink_job(pool, alias, rollup).await.expect("Failed to symlink job.");

	let results = service.full_search(request("ANALYTICS")).await.expect("Full search failed.");

	assert_eq!(results.total_count, 3);
	assert_eq!(
		results.datasets.iter().map(|dataset| dataset.name.as_str()).collect::<Vec<_>>(),
		vec!["analytics.orders", "analytics.users"]
	);
	assert_eq!(results.datasets[0].tags, vec!["PII".to_string()]);
	assert_eq!(results.jobs.len(), 1);
	assert_eq!(results.jobs[0].name, "analytics_rollup");

	let jobs_only = service
		.full_search(FullSearchRequest { filter: Some(EntityKind::Job), ..request("analytics") })
		.await
		.expect("Filtered search failed.");

	assert_eq!(jobs_only.total_count, 1);
	assert!(jobs_only.datasets.is_empty());

	let by_name = service
		.full_search(FullSearchRequest { sort: SearchSort::Name, limit: 1, ..request("analytics") })
		.await
		.expect("Sorted search failed.");

	assert_eq!(by_name.total_count, 3);
	assert_eq!(by_name.datasets.len() + by_name.jobs.len(), 1);
	assert_eq!(by_name.datasets[0].name, "analytics.orders");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set STRATA_PG_DSN to run."]
async fn full_search_matches_wildcards_literally() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping full_search_matches_wildcards_literally; set STRATA_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let pool = &service.db.pool;
	let now = OffsetDateTime::now_utc();

	fixtures::insert_dataset(pool, "warehouse", "raw_events", now)
		.await
		.expect("Failed to insert dataset.");
	fixtures::insert_dataset(pool, "warehouse", "rawXevents", now)
		.await
		.expect("Failed to insert dataset.");

	let results = service.full_search(request("raw_")).await.expect("Full search failed.");

	assert_eq!(results.total_count, 1);
	assert_eq!(results.datasets[0].name, "raw_events");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set STRATA_PG_DSN to run."]
async fn dataset_results_carry_latest_non_output_facets() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping dataset_results_carry_latest_non_output_facets; set STRATA_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let pool = &service.db.pool;
	let now = OffsetDateTime::now_utc();
	let dataset = fixtures::insert_dataset(pool, "warehouse", "analytics.orders", now)
		.await
		.expect("Failed to insert dataset.");
	let version = fixtures::insert_dataset_version(
		pool,
		dataset,
		Some(json!([{ "name": "order_id", "type": "BIGINT", "tags": [] }])),
	)
	.await
	.expect("Failed to insert dataset version.");

	super::add_dataset_facet(
		pool,
		dataset,
		version,
		"schema",
		json!({ "fields": 1 }),
		now - Duration::minutes(10),
	)
	.await;
	super::add_dataset_facet(pool, dataset, version, "schema", json!({ "fields": 2 }), now).await;
	super::add_dataset_facet(pool, dataset, version, "dataQualityMetrics", json!({ "rows": 9 }), now)
		.await;
	super::add_dataset_facet(pool, dataset, version, "outputStatistics", json!({ "rows": 9 }), now)
		.await;
	super::add_dataset_facet(pool, dataset, version, "customFacet", json!({ "k": "v" }), now)
		.await;

	let results = service.full_search(request("orders")).await.expect("Full search failed.");
	let result = &results.datasets[0];
	let attached = result.facets.as_ref().expect("Expected facets to be attached.");

	assert_eq!(attached.len(), 3);
	assert_eq!(attached["schema"], json!({ "fields": 2 }));
	assert!(attached.contains_key("dataQualityMetrics"));
	assert!(attached.contains_key("customFacet"));
	assert!(!attached.contains_key("outputStatistics"));
	assert_eq!(result.fields.as_ref().map(Vec::len), Some(1));
	assert_eq!(result.current_version, Some(version));

	let output = facets::latest_dataset_facets(pool, version, &[FacetKind::Output], None)
		.await
		.expect("Failed to read output facets.");

	assert_eq!(output["outputStatistics"], json!({ "rows": 9 }));

	let named = service
		.full_search(FullSearchRequest {
			facet_names: Some(vec!["schema".to_string()]),
			..request("orders")
		})
		.await
		.expect("Full search failed.");
	let named_facets = named.datasets[0].facets.as_ref().expect("Expected facets to be attached.");

	assert_eq!(named_facets.keys().collect::<Vec<_>>(), vec!["schema"]);

	let without = service
		.full_search(FullSearchRequest { facets: false, ..request("orders") })
		.await
		.expect("Full search failed.");

	assert!(without.datasets[0].facets.is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set STRATA_PG_DSN to run."]
async fn job_results_replay_latest_run_timeline() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping job_results_replay_latest_run_timeline; set STRATA_PG_DSN to run this test.");

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let pool = &service.db.pool;
	let now = OffsetDateTime::now_utc();
	let job = fixtures::insert_job(pool, "etl", "analytics_rollup", "BATCH", now)
		.await
		.expect("Failed to insert job.");
	let old_run = uuid::Uuid::new_v4();
	let latest_run = uuid::Uuid::new_v4();

	fixtures::insert_job_version(pool, job, Some(latest_run))
		.await
		.expect("Failed to insert job version.");
	super::add_job_facet(pool, job, old_run, "sql", json!({ "query": "old" }), now).await;
	super::add_job_facet(
		pool,
		job,
		latest_run,
		"sql",
		json!({ "query": "first" }),
		now - Duration::minutes(5),
	)
	.await;
	super::add_job_facet(pool, job, latest_run, "sql", json!({ "query": "second" }), now).await;
	super::add_job_facet(
		pool,
		job,
		latest_run,
		"sourceCode",
		json!({ "language": "python" }),
		now - Duration::minutes(1),
	)
	.await;

	let results = service.full_search(request("rollup")).await.expect("Full search failed.");
	let result = &results.jobs[0];
	let attached = result.facets.as_ref().expect("Expected facets to be attached.");

	assert_eq!(result.latest_run, Some(latest_run));
	assert_eq!(attached.len(), 2);
	assert_eq!(attached["sql"], json!({ "query": "second" }));
	assert_eq!(attached["sourceCode"], json!({ "language": "python" }));

	let timeline = facets::job_facet_timeline(pool, latest_run, None)
		.await
		.expect("Failed to read job facet timeline.");

	assert_eq!(
		timeline.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
		vec!["sql", "sourceCode", "sql"]
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
