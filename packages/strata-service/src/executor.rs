//! One search implementation shared by every entity collection.
//!
//! An [`EntityShape`] supplies what differs between collections (SQL view, facet source, output
//! projection). [`Executor`] runs the shared count/page/facet pipeline over it.

use std::{collections::HashMap, marker::PhantomData};

use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{BoxFuture, Result};
use strata_storage::{
	models::SearchSort,
	search::{self, EntityView, MatchFilter, PageRequest},
};

pub type Facets = Map<String, Value>;

type RowOf<S> = <<S as EntityShape>::View as EntityView>::Row;

#[derive(Debug, Clone)]
pub struct SearchParams {
	pub query: String,
	pub namespace: Option<String>,
	pub sort: SearchSort,
	pub limit: u64,
	pub offset: u64,
	pub include_facets: bool,
	pub facet_names: Option<Vec<String>>,
}
impl SearchParams {
	pub fn facet_selection(&self) -> FacetSelection<'_> {
		if !self.include_facets {
			return FacetSelection::Disabled;
		}

		match self.facet_names.as_deref() {
			Some(names) if !names.is_empty() => FacetSelection::Named(names),
			_ => FacetSelection::All,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetSelection<'a> {
	Disabled,
	All,
	Named(&'a [String]),
}
impl<'a> FacetSelection<'a> {
	/// Name filter to hand to the facet store; `None` selects every name.
	pub fn names(self) -> Option<&'a [String]> {
		match self {
			Self::Named(names) => Some(names),
			Self::Disabled | Self::All => None,
		}
	}
}

pub trait EntitySearch
where
	Self: Send + Sync,
{
	type Item: Send;

	fn count<'a>(
		&'a self,
		query: &'a str,
		namespace: Option<&'a str>,
	) -> BoxFuture<'a, Result<u64>>;

	fn search<'a>(&'a self, params: &'a SearchParams) -> BoxFuture<'a, Result<Vec<Self::Item>>>;
}

pub trait EntityShape
where
	Self: Send + Sync + 'static,
{
	type View: EntityView;
	type Item: Send;

	/// Key the row's facets are stored under, if it has any.
	fn facet_owner(row: &RowOf<Self>) -> Option<Uuid>;

	fn load_facets<'a>(
		pool: &'a PgPool,
		owners: &'a [Uuid],
		names: Option<&'a [String]>,
	) -> BoxFuture<'a, Result<HashMap<Uuid, Facets>>>;

	/// `facets` is `None` when facets were not requested.
	fn project(row: RowOf<Self>, facets: Option<Facets>) -> Self::Item;
}

pub struct Executor<S> {
	pool: PgPool,
	shape: PhantomData<fn() -> S>,
}
impl<S> Executor<S> {
	pub fn new(pool: PgPool) -> Self {
		Self { pool, shape: PhantomData }
	}
}

impl<S> EntitySearch for Executor<S>
where
	S: EntityShape,
{
	type Item = S::Item;

	fn count<'a>(
		&'a self,
		query: &'a str,
		namespace: Option<&'a str>,
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let count =
				search::count_matching::<S::View, _>(&self.pool, MatchFilter { query, namespace })
					.await?;

			Ok(u64::try_from(count).unwrap_or_default())
		})
	}

	fn search<'a>(&'a self, params: &'a SearchParams) -> BoxFuture<'a, Result<Vec<Self::Item>>> {
		Box::pin(async move {
			let page = PageRequest {
				filter: MatchFilter {
					query: &params.query,
					namespace: params.namespace.as_deref(),
				},
				sort: params.sort,
				limit: to_sql_bound(params.limit),
				offset: to_sql_bound(params.offset),
			};
			let rows = search::fetch_page::<S::View, _>(&self.pool, page).await?;
			let selection = params.facet_selection();

			if selection == FacetSelection::Disabled {
				return Ok(rows.into_iter().map(|row| S::project(row, None)).collect());
			}

			let owners = rows.iter().filter_map(S::facet_owner).collect::<Vec<_>>();
			let mut facets = S::load_facets(&self.pool, &owners, selection.names()).await?;

			Ok(rows
				.into_iter()
				.map(|row| {
					let attached = S::facet_owner(&row)
						.and_then(|owner| facets.remove(&owner))
						.unwrap_or_default();

					S::project(row, Some(attached))
				})
				.collect())
		})
	}
}

fn to_sql_bound(value: u64) -> i64 {
	i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
	use strata_storage::models::SearchSort;

	use super::{FacetSelection, SearchParams};

	fn params(include_facets: bool, facet_names: Option<Vec<String>>) -> SearchParams {
		SearchParams {
			query: "orders".to_string(),
			namespace: None,
			sort: SearchSort::UpdatedAt,
			limit: 10,
			offset: 0,
			include_facets,
			facet_names,
		}
	}

	#[test]
	fn disabled_facets_ignore_requested_names() {
		let params = params(false, Some(vec!["schema".to_string()]));

		assert_eq!(params.facet_selection(), FacetSelection::Disabled);
	}

	#[test]
	fn absent_or_empty_names_select_every_facet() {
		assert_eq!(params(true, None).facet_selection(), FacetSelection::All);
		assert_eq!(params(true, Some(Vec::new())).facet_selection(), FacetSelection::All);
		assert_eq!(params(true, None).facet_selection().names(), None);
	}

	#[test]
	fn named_selection_passes_names_through() {
		let names = vec!["schema".to_string(), "ownership".to_string()];
		let params = params(true, Some(names.clone()));

		assert_eq!(params.facet_selection().names(), Some(names.as_slice()));
	}
}
