//! Federated search over datasets and jobs.
//!
//! Unfiltered requests count both collections, split the budget with [`allocator::budget`], and
//! fetch each collection only when it was allotted rows. Filtered requests never touch the other
//! collection.

use crate::{
	Error, Result, StrataService,
	allocator::{self, CollectionBudget},
	datasets::{DatasetResult, DatasetShape},
	executor::{EntitySearch, Executor, SearchParams},
	jobs::{JobResult, JobShape},
};
use strata_storage::models::{EntityKind, SearchSort};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FullSearchRequest {
	pub query: String,
	pub filter: Option<EntityKind>,
	pub sort: SearchSort,
	pub limit: u32,
	pub offset: u32,
	pub namespace: Option<String>,
	pub facets: bool,
	pub facet_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSearchResults<D, J> {
	pub total_count: u64,
	pub datasets: Vec<D>,
	pub jobs: Vec<J>,
}

pub type FullSearchResponse = FullSearchResults<DatasetResult, JobResult>;

pub struct FullSearch<D, J> {
	datasets: D,
	jobs: J,
	max_limit: u32,
}
impl<D, J> FullSearch<D, J>
where
	D: EntitySearch,
	J: EntitySearch,
{
	pub fn new(datasets: D, jobs: J, max_limit: u32) -> Self {
		Self { datasets, jobs, max_limit }
	}

	pub async fn search(
		&self,
		req: &FullSearchRequest,
	) -> Result<FullSearchResults<D::Item, J::Item>> {
		let limit = u64::from(req.limit.min(self.max_limit));
		let offset = u64::from(req.offset);
		let namespace = req.namespace.as_deref();

		match req.filter {
			Some(EntityKind::Dataset) => {
				let params = search_params(req, CollectionBudget { limit, offset });
				let datasets = fetch(&self.datasets, &params).await?;
				let total_count = self.datasets.count(&req.query, namespace).await?;

				Ok(FullSearchResults { total_count, datasets, jobs: Vec::new() })
			},
			Some(EntityKind::Job) => {
				let params = search_params(req, CollectionBudget { limit, offset });
				let jobs = fetch(&self.jobs, &params).await?;
				let total_count = self.jobs.count(&req.query, namespace).await?;

				Ok(FullSearchResults { total_count, datasets: Vec::new(), jobs })
			},
			None => {
				let available_datasets = self.datasets.count(&req.query, namespace).await?;
				let available_jobs = self.jobs.count(&req.query, namespace).await?;
				let budget =
					allocator::budget(limit, offset, available_datasets, available_jobs);

				tracing::debug!(
					available_datasets,
					available_jobs,
					dataset_limit = budget.datasets.limit,
					dataset_offset = budget.datasets.offset,
					job_limit = budget.jobs.limit,
					job_offset = budget.jobs.offset,
					"Allocated search budget."
				);

				let datasets =
					fetch(&self.datasets, &search_params(req, budget.datasets)).await?;
				let jobs = fetch(&self.jobs, &search_params(req, budget.jobs)).await?;

				Ok(FullSearchResults {
					total_count: available_datasets + available_jobs,
					datasets,
					jobs,
				})
			},
		}
	}
}

impl StrataService {
	pub async fn full_search(&self, req: FullSearchRequest) -> Result<FullSearchResponse> {
		if req.query.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "query must not be blank.".to_string() });
		}

		let search = FullSearch::new(
			Executor::<DatasetShape>::new(self.db.pool.clone()),
			Executor::<JobShape>::new(self.db.pool.clone()),
			self.cfg.search.max_limit,
		);

		search.search(&req).await
	}
}

fn search_params(req: &FullSearchRequest, budget: CollectionBudget) -> SearchParams {
	SearchParams {
		query: req.query.clone(),
		namespace: req.namespace.clone(),
		sort: req.sort,
		limit: budget.limit,
		offset: budget.offset,
		include_facets: req.facets,
		facet_names: if req.facets { req.facet_names.clone() } else { None },
	}
}

async fn fetch<S>(collection: &S, params: &SearchParams) -> Result<Vec<S::Item>>
where
	S: EntitySearch,
{
	if params.limit == 0 {
		return Ok(Vec::new());
	}

	collection.search(params).await
}
