use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use strata_service::{
	Error, FullSearchRequest, FullSearchResponse, LineageStatistics, SimpleSearchRequest,
	SimpleSearchResponse,
};
use strata_storage::models::{EntityKind, SearchSort};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/v1/search", get(simple_search))
		.route("/api/v1/search/full", get(full_search))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route(
			"/v1/admin/datasets/{dataset_id}/lineage_statistics",
			post(recompute_lineage_statistics),
		)
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn full_search(
	State(state): State<AppState>,
	Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<FullSearchResponse>, ApiError> {
	let req = RawSearchQuery::from_pairs(pairs).into_full(&state.service.cfg.search)?;
	let response = state.service.full_search(req).await?;

	Ok(Json(response))
}

async fn simple_search(
	State(state): State<AppState>,
	Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<SimpleSearchResponse>, ApiError> {
	let req = RawSearchQuery::from_pairs(pairs).into_simple(&state.service.cfg.search)?;
	let response = state.service.simple_search(req).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct LineageStatisticsQuery {
	version_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct LineageStatisticsResponse {
	updated: bool,
	statistics: Option<LineageStatistics>,
}

async fn recompute_lineage_statistics(
	State(state): State<AppState>,
	Path(dataset_id): Path<String>,
	Query(query): Query<LineageStatisticsQuery>,
) -> Result<Json<LineageStatisticsResponse>, ApiError> {
	let dataset_id = parse_uuid(&dataset_id, "dataset_id")?;
	let statistics = match query.version_id.as_deref() {
		Some(version_id) => {
			let version_id = parse_uuid(version_id, "version_id")?;

			state.service.recompute_lineage_statistics_for_version(dataset_id, version_id).await?
		},
		None => state.service.recompute_lineage_statistics(dataset_id).await?,
	};

	Ok(Json(LineageStatisticsResponse { updated: statistics.is_some(), statistics }))
}

/// Search query string before validation.
///
/// Scalar keys keep their last value. `facetNames` may repeat and may hold comma-separated names.
#[derive(Debug, Default)]
struct RawSearchQuery {
	q: Option<String>,
	filter: Option<String>,
	sort: Option<String>,
	limit: Option<String>,
	offset: Option<String>,
	namespace: Option<String>,
	facets: Option<String>,
	facet_names: Vec<String>,
}
impl RawSearchQuery {
	fn from_pairs(pairs: Vec<(String, String)>) -> Self {
		let mut raw = Self::default();

		for (key, value) in pairs {
			match key.as_str() {
				"q" => raw.q = Some(value),
				"filter" => raw.filter = Some(value),
				"sort" => raw.sort = Some(value),
				"limit" => raw.limit = Some(value),
				"offset" => raw.offset = Some(value),
				"namespace" => raw.namespace = Some(value),
				"facets" => raw.facets = Some(value),
				"facetNames" => raw.facet_names.extend(
					value
						.split(',')
						.map(str::trim)
						.filter(|name| !name.is_empty())
						.map(str::to_string),
				),
				_ => {},
			}
		}

		raw
	}

	fn into_full(self, cfg: &strata_config::Search) -> Result<FullSearchRequest, ApiError> {
		Ok(FullSearchRequest {
			query: required_query(self.q.as_deref())?,
			filter: parse_filter(self.filter.as_deref())?,
			sort: parse_sort(self.sort.as_deref())?,
			limit: parse_limit(self.limit.as_deref(), cfg)?,
			offset: parse_offset(self.offset.as_deref())?,
			namespace: parse_namespace(self.namespace),
			facets: parse_facets(self.facets.as_deref())?,
			facet_names: (!self.facet_names.is_empty()).then_some(self.facet_names),
		})
	}

	fn into_simple(self, cfg: &strata_config::Search) -> Result<SimpleSearchRequest, ApiError> {
		Ok(SimpleSearchRequest {
			query: required_query(self.q.as_deref())?,
			filter: parse_filter(self.filter.as_deref())?,
			sort: parse_sort(self.sort.as_deref())?,
			limit: parse_limit(self.limit.as_deref(), cfg)?,
			namespace: parse_namespace(self.namespace),
		})
	}
}

fn required_query(raw: Option<&str>) -> Result<String, ApiError> {
	match raw {
		Some(query) if !query.trim().is_empty() => Ok(query.to_string()),
		_ => Err(invalid_field("q", "q is required and must not be blank.")),
	}
}

fn parse_filter(raw: Option<&str>) -> Result<Option<EntityKind>, ApiError> {
	let Some(raw) = raw else {
		return Ok(None);
	};

	EntityKind::parse(raw)
		.map(Some)
		.ok_or_else(|| invalid_field("filter", "filter must be one of dataset or job."))
}

fn parse_sort(raw: Option<&str>) -> Result<SearchSort, ApiError> {
	let Some(raw) = raw else {
		return Ok(SearchSort::default());
	};

	SearchSort::parse(raw)
		.ok_or_else(|| invalid_field("sort", "sort must be one of name or updated_at."))
}

/// Values above the maximum are accepted here and clamped by the service.
fn parse_limit(raw: Option<&str>, cfg: &strata_config::Search) -> Result<u32, ApiError> {
	let Some(raw) = raw else {
		return Ok(cfg.default_limit);
	};
	let message = format!("limit must be an integer of at least {}.", cfg.min_limit);
	let limit = raw.trim().parse::<i64>().map_err(|_| invalid_field("limit", message.clone()))?;

	if limit < i64::from(cfg.min_limit) {
		return Err(invalid_field("limit", message));
	}

	Ok(u32::try_from(limit).unwrap_or(u32::MAX))
}

fn parse_offset(raw: Option<&str>) -> Result<u32, ApiError> {
	let Some(raw) = raw else {
		return Ok(0);
	};

	raw.trim()
		.parse::<u32>()
		.map_err(|_| invalid_field("offset", "offset must be a non-negative integer."))
}

fn parse_namespace(raw: Option<String>) -> Option<String> {
	raw.map(|namespace| namespace.trim().to_string()).filter(|namespace| !namespace.is_empty())
}

fn parse_facets(raw: Option<&str>) -> Result<bool, ApiError> {
	match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
		None => Ok(true),
		Some("true") => Ok(true),
		Some("false") => Ok(false),
		Some(_) => Err(invalid_field("facets", "facets must be true or false.")),
	}
}

fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, ApiError> {
	Uuid::parse_str(raw.trim())
		.map_err(|_| invalid_field(field, format!("{field} must be a valid UUID.")))
}

fn invalid_field(field: &str, message: impl Into<String>) -> ApiError {
	json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, Some(vec![field.to_string()]))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			Error::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage error while serving request.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Internal storage error.",
					None,
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
