//! Derived `lineageStatistics` dataset facet.
//!
//! Every recompute appends a fresh document. Older documents stay in the facet history and are
//! shadowed by latest-by-name resolution.

use std::collections::BTreeSet;

use serde_json::{Value, json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, StrataService};
use strata_config::Lineage;
use strata_storage::{
	facets::{self, LINEAGE_STATISTICS_FACET},
	lineage,
	models::{DatasetFacetRecord, FacetKind, IoType, LineageEdge},
};

pub const LINEAGE_UPDATE_EVENT: &str = "LINEAGE_UPDATE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsScope {
	/// Includes the job type sets.
	AllTime,
	Version,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageStatistics {
	/// Distinct jobs producing the dataset.
	pub in_edges: u64,
	/// Distinct jobs consuming the dataset.
	pub out_edges: u64,
	pub consuming_namespaces: Vec<String>,
	pub producing_namespaces: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub producing_job_types: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub consuming_job_types: Option<Vec<String>>,
}
impl LineageStatistics {
	pub fn from_edges(edges: &[LineageEdge], scope: StatisticsScope) -> Self {
		let mut producers = BTreeSet::new();
		let mut consumers = BTreeSet::new();
		let mut producing_namespaces = BTreeSet::new();
		let mut consuming_namespaces = BTreeSet::new();
		let mut producing_job_types = BTreeSet::new();
		let mut consuming_job_types = BTreeSet::new();

		for edge in edges {
			let (jobs, namespaces, job_types) = match edge.io() {
				Some(IoType::Output) =>
					(&mut producers, &mut producing_namespaces, &mut producing_job_types),
				Some(IoType::Input) =>
					(&mut consumers, &mut consuming_namespaces, &mut consuming_job_types),
				None => continue,
			};

			jobs.insert(edge.job_uuid);
			namespaces.insert(edge.namespace_name.clone());

			if let Some(job_type) = &edge.job_type {
				job_types.insert(job_type.clone());
			}
		}

		let all_time = scope == StatisticsScope::AllTime;

		Self {
			in_edges: producers.len() as u64,
			out_edges: consumers.len() as u64,
			consuming_namespaces: consuming_namespaces.into_iter().collect(),
			producing_namespaces: producing_namespaces.into_iter().collect(),
			producing_job_types: all_time.then(|| producing_job_types.into_iter().collect()),
			consuming_job_types: all_time.then(|| consuming_job_types.into_iter().collect()),
		}
	}

	/// Facet document as stored, stamped with the producer and schema URLs.
	pub fn to_document(&self, lineage: &Lineage) -> Value {
		let mut document = json!({
			"_producer": lineage.producer,
			"_schema": lineage.schema_url,
			"inEdges": self.in_edges,
			"outEdges": self.out_edges,
			"consumingNamespaces": self.consuming_namespaces,
			"producingNamespaces": self.producing_namespaces,
		});

		if let Some(job_types) = &self.producing_job_types {
			document["producingJobTypes"] = json!(job_types);
		}
		if let Some(job_types) = &self.consuming_job_types {
			document["consumingJobTypes"] = json!(job_types);
		}

		document
	}
}

impl StrataService {
	/// Recomputes all-time statistics and attaches them to the dataset's current version.
	///
	/// Returns `None` without writing when the dataset has no current version.
	pub async fn recompute_lineage_statistics(
		&self,
		dataset_id: Uuid,
	) -> Result<Option<LineageStatistics>> {
		self.recompute_lineage(dataset_id, None, StatisticsScope::AllTime).await
	}

	/// Recomputes statistics for one dataset version, without the job type sets.
	///
	/// Fails with [`Error::NotFound`] when the version belongs to another dataset.
	pub async fn recompute_lineage_statistics_for_version(
		&self,
		dataset_id: Uuid,
		version_id: Uuid,
	) -> Result<Option<LineageStatistics>> {
		self.recompute_lineage(dataset_id, Some(version_id), StatisticsScope::Version).await
	}

	async fn recompute_lineage(
		&self,
		dataset_id: Uuid,
		version_id: Option<Uuid>,
		scope: StatisticsScope,
	) -> Result<Option<LineageStatistics>> {
		let mut tx = self.db.pool.begin().await?;
		let Some(current_version) = lineage::current_version_of(&mut *tx, dataset_id).await? else {
			tracing::debug!(%dataset_id, "Skipping lineage statistics for unversioned dataset.");

			return Ok(None);
		};
		if let Some(version_id) = version_id
			&& !lineage::version_belongs_to(&mut *tx, dataset_id, version_id).await?
		{
			return Err(Error::NotFound {
				message: format!("Version {version_id} does not belong to dataset {dataset_id}."),
			});
		}

		let edges = lineage::current_io_edges(&mut *tx, dataset_id).await?;
		let statistics = LineageStatistics::from_edges(&edges, scope);
		let owner_version_id = version_id.unwrap_or(current_version);
		let now = OffsetDateTime::now_utc();
		let record = DatasetFacetRecord {
			dataset_id,
			owner_version_id,
			kind: FacetKind::Dataset,
			name: LINEAGE_STATISTICS_FACET.to_string(),
			document: statistics.to_document(&self.cfg.lineage),
			created_at: now,
			source_run_id: None,
			source_event_time: now,
			source_event_type: Some(LINEAGE_UPDATE_EVENT.to_string()),
		};

		facets::insert_dataset_facet(&mut *tx, &record).await?;

		tx.commit().await?;

		tracing::info!(
			%dataset_id,
			%owner_version_id,
			in_edges = statistics.in_edges,
			out_edges = statistics.out_edges,
			"Lineage statistics recorded."
		);

		Ok(Some(statistics))
	}
}
