//! Splits one result budget across the dataset and job collections.
//!
//! The odd unit of an odd total goes to the first collection (datasets) before the second one is
//! considered. Capacity a scarce collection cannot use moves to the other collection.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionBudget {
	pub limit: u64,
	pub offset: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
	pub datasets: CollectionBudget,
	pub jobs: CollectionBudget,
}

/// Divides `total` between two collections holding `available_a` and `available_b` rows.
///
/// The result never exceeds either availability and sums to `total` whenever the collections
/// together hold at least that many rows.
pub fn allocate(total: u64, available_a: u64, available_b: u64) -> (u64, u64) {
	if available_a == 0 && available_b == 0 {
		return (0, 0);
	}
	if available_a == 0 {
		return (0, total.min(available_b));
	}
	if available_b == 0 {
		return (total.min(available_a), 0);
	}

	let base = total / 2;
	let mut remainder = total % 2;
	let mut limit_a = base.min(available_a);
	let mut limit_b = base.min(available_b);

	if remainder > 0 && limit_a < available_a {
		let grown = (limit_a + remainder).min(available_a);

		remainder -= grown - limit_a;
		limit_a = grown;
	}

	// Measured against the even split, before the remainder moved anything.
	let unused_a = base.saturating_sub(available_a);
	let unused_b = base.saturating_sub(available_b);

	if unused_a > 0 {
		limit_b = (limit_b + unused_a).min(available_b);
	}
	if unused_b > 0 {
		limit_a = (limit_a + unused_b).min(available_a);
	}
	if remainder > 0 && limit_b < available_b {
		limit_b = (limit_b + remainder).min(available_b);
	}

	(limit_a, limit_b)
}

/// Offsets are placed first against the raw counts, then limits against what remains after them.
pub fn budget(limit: u64, offset: u64, available_datasets: u64, available_jobs: u64) -> Budget {
	let (dataset_offset, job_offset) = allocate(offset, available_datasets, available_jobs);
	let (dataset_limit, job_limit) = allocate(
		limit,
		available_datasets.saturating_sub(dataset_offset),
		available_jobs.saturating_sub(job_offset),
	);

	Budget {
		datasets: CollectionBudget { limit: dataset_limit, offset: dataset_offset },
		jobs: CollectionBudget { limit: job_limit, offset: job_offset },
	}
}
