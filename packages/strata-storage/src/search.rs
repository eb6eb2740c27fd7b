use sqlx::{FromRow, PgExecutor, Postgres, QueryBuilder, postgres::PgRow};

use crate::{
	Result,
	models::{DatasetRow, EntityKind, JobRow, SearchSort, SimpleSearchRow},
};

/// SQL surface of one searchable entity collection.
///
/// The collection view is always aliased `e` and must expose `uuid`, `name`, `namespace_name` and
/// `updated_at`.
pub trait EntityView {
	type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;

	const KIND: EntityKind;
	/// Bare view used for counting.
	const SOURCE: &'static str;
	/// Projection plus the joins needed to build `Row`.
	const SELECT: &'static str;
	/// Rows failing this predicate are never visible to search.
	const VISIBLE: &'static str;
}

pub struct DatasetView;
impl EntityView for DatasetView {
	type Row = DatasetRow;

	const KIND: EntityKind = EntityKind::Dataset;
	const SELECT: &'static str = "\
SELECT
	e.uuid,
	e.type,
	e.created_at,
	e.updated_at,
	e.namespace_name,
	e.name,
	e.physical_name,
	e.source_name,
	e.description,
	e.current_version_uuid,
	e.last_modified_at,
	e.is_deleted,
	dv.lifecycle_state,
	dv.fields,
	COALESCE(t.tags, ARRAY[]::text[]) AS tags
FROM datasets_view AS e
LEFT JOIN dataset_versions AS dv ON dv.uuid = e.current_version_uuid
LEFT JOIN (
	SELECT m.dataset_uuid, ARRAY_AGG(tg.name ORDER BY tg.name) AS tags
	FROM datasets_tag_mapping AS m
	INNER JOIN tags AS tg ON tg.uuid = m.tag_uuid
	GROUP BY m.dataset_uuid
) AS t ON t.dataset_uuid = e.uuid";
	const SOURCE: &'static str = "datasets_view AS e";
	const VISIBLE: &'static str = "e.is_deleted = false";
}

pub struct JobView;
impl EntityView for JobView {
	type Row = JobRow;

	const KIND: EntityKind = EntityKind::Job;
	const SELECT: &'static str = "\
SELECT
	e.uuid,
	e.type,
	e.created_at,
	e.updated_at,
	e.namespace_name,
	e.name,
	e.simple_name,
	e.parent_job_name,
	e.parent_job_uuid,
	e.current_location AS location,
	e.description,
	e.current_version_uuid,
	jv.latest_run_uuid,
	COALESCE(t.tags, ARRAY[]::text[]) AS tags
FROM jobs_view AS e
LEFT JOIN job_versions AS jv ON jv.uuid = e.current_version_uuid
LEFT JOIN (
	SELECT m.job_uuid, ARRAY_AGG(tg.name ORDER BY tg.name) AS tags
	FROM jobs_tag_mapping AS m
	INNER JOIN tags AS tg ON tg.uuid = m.tag_uuid
	GROUP BY m.job_uuid
) AS t ON t.job_uuid = e.uuid";
	const SOURCE: &'static str = "jobs_view AS e";
	// Symlinked jobs are aliases of their target and would otherwise show up twice.
	const VISIBLE: &'static str = "e.symlink_target_uuid IS NULL";
}

#[derive(Debug, Clone, Copy)]
pub struct MatchFilter<'a> {
	pub query: &'a str,
	pub namespace: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
	pub filter: MatchFilter<'a>,
	pub sort: SearchSort,
	pub limit: i64,
	pub offset: i64,
}

/// `ILIKE` pattern matching `query` as a literal substring.
pub fn contains_pattern(query: &str) -> String {
	let mut pattern = String::with_capacity(query.len() + 2);

	pattern.push('%');

	for ch in query.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			pattern.push('\\');
		}

		pattern.push(ch);
	}

	pattern.push('%');

	pattern
}

pub async fn count_matching<'e, V, E>(executor: E, filter: MatchFilter<'_>) -> Result<i64>
where
	V: EntityView,
	E: PgExecutor<'e>,
{
	let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");

	builder.push(V::SOURCE);
	push_match_predicate::<V>(&mut builder, filter);

	let count: i64 = builder.build_query_scalar().fetch_one(executor).await?;

	Ok(count)
}

pub async fn fetch_page<'e, V, E>(executor: E, page: PageRequest<'_>) -> Result<Vec<V::Row>>
where
	V: EntityView,
	E: PgExecutor<'e>,
{
	let mut builder = QueryBuilder::<Postgres>::new(V::SELECT);

	push_match_predicate::<V>(&mut builder, page.filter);
	push_order(&mut builder, page.sort, "e.");
	builder.push(" LIMIT ");
	builder.push_bind(page.limit);
	builder.push(" OFFSET ");
	builder.push_bind(page.offset);

	let rows: Vec<V::Row> = builder.build_query_as().fetch_all(executor).await?;

	Ok(rows)
}

/// Name-only search over both collections in one statement.
pub async fn simple_search<'e, E>(
	executor: E,
	filter: MatchFilter<'_>,
	kind: Option<EntityKind>,
	sort: SearchSort,
	limit: i64,
) -> Result<Vec<SimpleSearchRow>>
where
	E: PgExecutor<'e>,
{
	let mut builder =
		QueryBuilder::<Postgres>::new("SELECT type, name, namespace_name, updated_at FROM (");
	let mut branches = 0;

	for candidate in [EntityKind::Dataset, EntityKind::Job] {
		if kind.is_some_and(|kind| kind != candidate) {
			continue;
		}
		if branches > 0 {
			builder.push(" UNION ALL ");
		}

		builder.push("SELECT '");
		builder.push(candidate.as_str());
		builder.push("' AS type, e.uuid, e.name, e.namespace_name, e.updated_at FROM ");

		match candidate {
			EntityKind::Dataset => {
				builder.push(DatasetView::SOURCE);
				push_match_predicate::<DatasetView>(&mut builder, filter);
			},
			EntityKind::Job => {
				builder.push(JobView::SOURCE);
				push_match_predicate::<JobView>(&mut builder, filter);
			},
		}

		branches += 1;
	}

	builder.push(") AS results");
	push_order(&mut builder, sort, "");
	builder.push(" LIMIT ");
	builder.push_bind(limit);

	let rows: Vec<SimpleSearchRow> = builder.build_query_as().fetch_all(executor).await?;

	Ok(rows)
}

fn push_match_predicate<V>(builder: &mut QueryBuilder<'_, Postgres>, filter: MatchFilter<'_>)
where
	V: EntityView,
{
	builder.push(" WHERE e.name ILIKE ");
	builder.push_bind(contains_pattern(filter.query));

	if let Some(namespace) = filter.namespace {
		builder.push(" AND e.namespace_name = ");
		builder.push_bind(namespace.to_string());
	}

	builder.push(" AND ");
	builder.push(V::VISIBLE);
}

// `uuid` breaks ties so paging is stable across requests.
fn push_order(builder: &mut QueryBuilder<'_, Postgres>, sort: SearchSort, prefix: &str) {
	let order = match sort {
		SearchSort::UpdatedAt => format!(" ORDER BY {prefix}updated_at DESC, {prefix}uuid ASC"),
		SearchSort::Name => format!(" ORDER BY {prefix}name ASC, {prefix}uuid ASC"),
	};

	builder.push(order);
}
