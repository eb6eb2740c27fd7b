use std::collections::HashMap;

use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, Result,
	executor::{EntityShape, Facets},
};
use strata_storage::{
	facets,
	models::{DatasetRow, FacetKind},
	search::DatasetView,
};

/// OUTPUT facets describe what a job wrote and stay out of dataset projections.
pub const DATASET_SEARCH_FACET_KINDS: [FacetKind; 3] =
	[FacetKind::Dataset, FacetKind::Unknown, FacetKind::Input];

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DatasetId {
	pub namespace: String,
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SchemaField {
	pub name: String,
	#[serde(rename = "type", default)]
	pub field_type: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub description: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetResult {
	pub id: DatasetId,
	#[serde(rename = "type")]
	pub dataset_type: String,
	pub name: String,
	pub physical_name: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	pub namespace: String,
	pub source_name: String,
	pub tags: Vec<String>,
	#[serde(with = "crate::time_serde::option")]
	pub last_modified_at: Option<OffsetDateTime>,
	pub last_lifecycle_state: Option<String>,
	pub description: Option<String>,
	pub current_version: Option<Uuid>,
	pub is_deleted: bool,
	pub fields: Option<Vec<SchemaField>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub facets: Option<Facets>,
}

pub struct DatasetShape;
impl EntityShape for DatasetShape {
	type Item = DatasetResult;
	type View = DatasetView;

	fn facet_owner(row: &DatasetRow) -> Option<Uuid> {
		row.current_version_uuid
	}

	fn load_facets<'a>(
		pool: &'a PgPool,
		owners: &'a [Uuid],
		names: Option<&'a [String]>,
	) -> BoxFuture<'a, Result<HashMap<Uuid, Facets>>> {
		Box::pin(async move {
			let facets =
				facets::latest_dataset_facets_for(pool, owners, &DATASET_SEARCH_FACET_KINDS, names)
					.await?;

			Ok(facets)
		})
	}

	fn project(row: DatasetRow, facets: Option<Facets>) -> DatasetResult {
		let fields = parse_fields(row.uuid, row.fields);

		DatasetResult {
			id: DatasetId { namespace: row.namespace_name.clone(), name: row.name.clone() },
			dataset_type: row.r#type,
			name: row.name,
			physical_name: row.physical_name,
			created_at: row.created_at,
			updated_at: row.updated_at,
			namespace: row.namespace_name,
			source_name: row.source_name,
			tags: row.tags,
			last_modified_at: row.last_modified_at,
			last_lifecycle_state: row.lifecycle_state,
			description: row.description,
			current_version: row.current_version_uuid,
			is_deleted: row.is_deleted,
			fields,
			facets,
		}
	}
}

fn parse_fields(dataset_id: Uuid, raw: Option<Value>) -> Option<Vec<SchemaField>> {
	let raw = raw?;

	match serde_json::from_value(raw) {
		Ok(fields) => Some(fields),
		Err(err) => {
			tracing::warn!(%dataset_id, error = %err, "Dropping unreadable dataset schema fields.");

			None
		},
	}
}
