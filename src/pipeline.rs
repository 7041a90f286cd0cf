//! Listing store → filter predicates → sort selector.
//!
//! `run` is the pure pipeline. `ListingPipeline` wraps it with a memo keyed on
//! the filter state and the generation of the listing set, so re-running it on
//! every keystroke only recomputes when an input actually changed.

use crate::filter::{FilterState, Predicates};
use crate::models::JobListing;
use crate::sort::sort_by_listing;

/// Filtered, ordered view over a listing set.
#[derive(Debug, Clone)]
pub struct ResultSet<'a> {
    pub listings: Vec<&'a JobListing>,
    pub total: usize,
}

impl ResultSet<'_> {
    pub fn result_count(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

pub fn run<'a>(listings: &'a [JobListing], state: &FilterState) -> ResultSet<'a> {
    ResultSet {
        listings: order(listings, state).into_iter().map(|i| &listings[i]).collect(),
        total: listings.len(),
    }
}

/// Indices of the matching listings in display order.
fn order(listings: &[JobListing], state: &FilterState) -> Vec<usize> {
    let predicates = Predicates::new(state);
    let mut hits: Vec<(usize, &JobListing)> = listings
        .iter()
        .enumerate()
        .filter(|(_, l)| predicates.matches(l))
        .collect();
    sort_by_listing(&mut hits, state.sort_key(), |h| h.1);
    hits.into_iter().map(|(i, _)| i).collect()
}

#[derive(Debug)]
struct Memo {
    state: FilterState,
    generation: u64,
    order: Vec<usize>,
}

/// Owns the candidate set for one page and memoizes the last result.
#[derive(Debug, Default)]
pub struct ListingPipeline {
    listings: Vec<JobListing>,
    generation: u64,
    memo: Option<Memo>,
    recomputations: usize,
}

impl ListingPipeline {
    pub fn new(listings: Vec<JobListing>) -> Self {
        Self {
            listings,
            ..Self::default()
        }
    }

    pub fn listings(&self) -> &[JobListing] {
        &self.listings
    }

    pub fn total(&self) -> usize {
        self.listings.len()
    }

    /// Swaps in a freshly fetched candidate set.
    pub fn replace_listings(&mut self, listings: Vec<JobListing>) {
        self.listings = listings;
        self.generation += 1;
    }

    /// How many times the filter/sort pass actually ran.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }

    pub fn results(&mut self, state: &FilterState) -> ResultSet<'_> {
        let fresh = matches!(
            &self.memo,
            Some(m) if m.generation == self.generation && m.state == *state
        );
        if !fresh {
            let order = order(&self.listings, state);
            self.recomputations += 1;
            tracing::debug!(
                matched = order.len(),
                total = self.listings.len(),
                "recomputed listing results"
            );
            self.memo = Some(Memo {
                state: state.clone(),
                generation: self.generation,
                order,
            });
        }

        let order = self.memo.as_ref().map(|m| m.order.as_slice()).unwrap_or_default();
        ResultSet {
            listings: order.iter().map(|&i| &self.listings[i]).collect(),
            total: self.listings.len(),
        }
    }
}
