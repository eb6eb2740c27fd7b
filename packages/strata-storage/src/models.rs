use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
	Dataset,
	Job,
}
impl EntityKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Dataset => "DATASET",
			Self::Job => "JOB",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_uppercase().as_str() {
			"DATASET" => Some(Self::Dataset),
			"JOB" => Some(Self::Job),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchSort {
	Name,
	#[default]
	UpdatedAt,
}
impl SearchSort {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"name" => Some(Self::Name),
			"updated_at" => Some(Self::UpdatedAt),
			_ => None,
		}
	}
}

/// Kind of a dataset facet, persisted as upper-case text in `dataset_facets.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacetKind {
	Dataset,
	Input,
	Output,
	Unknown,
}
impl FacetKind {
	pub const ALL: [Self; 4] = [Self::Dataset, Self::Input, Self::Output, Self::Unknown];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Dataset => "DATASET",
			Self::Input => "INPUT",
			Self::Output => "OUTPUT",
			Self::Unknown => "UNKNOWN",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.as_str().eq_ignore_ascii_case(raw.trim()))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoType {
	Input,
	Output,
}
impl IoType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Input => "INPUT",
			Self::Output => "OUTPUT",
		}
	}
}

#[derive(Debug, Clone)]
pub struct DatasetFacetRecord {
	pub dataset_id: Uuid,
	pub owner_version_id: Uuid,
	pub kind: FacetKind,
	pub name: String,
	pub document: Value,
	pub created_at: OffsetDateTime,
	pub source_run_id: Option<Uuid>,
	pub source_event_time: OffsetDateTime,
	pub source_event_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JobFacetRecord {
	pub job_id: Uuid,
	pub run_id: Option<Uuid>,
	pub name: String,
	pub document: Value,
	pub created_at: OffsetDateTime,
	pub source_event_time: OffsetDateTime,
	pub source_event_type: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DatasetFacetRow {
	pub dataset_version_uuid: Uuid,
	pub kind: String,
	pub name: String,
	pub facet: Value,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobFacetRow {
	pub run_uuid: Uuid,
	pub name: String,
	pub facet: Value,
	pub lineage_event_time: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct DatasetRow {
	pub uuid: Uuid,
	pub r#type: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub namespace_name: String,
	pub name: String,
	pub physical_name: String,
	pub source_name: String,
	pub description: Option<String>,
	pub current_version_uuid: Option<Uuid>,
	pub last_modified_at: Option<OffsetDateTime>,
	pub is_deleted: bool,
	pub lifecycle_state: Option<String>,
	pub fields: Option<Value>,
	pub tags: Vec<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct JobRow {
	pub uuid: Uuid,
	pub r#type: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub namespace_name: String,
	pub name: String,
	pub simple_name: String,
	pub parent_job_name: Option<String>,
	pub parent_job_uuid: Option<Uuid>,
	pub location: Option<String>,
	pub description: Option<String>,
	pub current_version_uuid: Option<Uuid>,
	pub latest_run_uuid: Option<Uuid>,
	pub tags: Vec<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SimpleSearchRow {
	pub r#type: String,
	pub name: String,
	pub namespace_name: String,
	pub updated_at: OffsetDateTime,
}

/// One current job-version edge touching a dataset.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LineageEdge {
	pub io_type: String,
	pub job_uuid: Uuid,
	pub namespace_name: String,
	pub job_type: Option<String>,
}
impl LineageEdge {
	pub fn io(&self) -> Option<IoType> {
		match self.io_type.as_str() {
			"INPUT" => Some(IoType::Input),
			"OUTPUT" => Some(IoType::Output),
			_ => None,
		}
	}
}
