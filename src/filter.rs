use std::collections::BTreeSet;

use crate::models::{JobListing, JobType, SortKey};

pub const SALARY_FLOOR: i64 = 0;
pub const SALARY_CEILING: i64 = 20_000_000;
pub const SALARY_STEP: i64 = 500_000;

/// User-chosen constraints narrowing the visible listings.
///
/// Lives for one browsing session and is never persisted. Every field has a
/// dedicated mutator; none of them touch anything but the state itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    search_text: String,
    location_text: String,
    salary_low: i64,
    salary_high: i64,
    selected_types: BTreeSet<JobType>,
    selected_categories: BTreeSet<String>,
    sort_key: SortKey,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            location_text: String::new(),
            salary_low: SALARY_FLOOR,
            salary_high: SALARY_CEILING,
            selected_types: BTreeSet::new(),
            selected_categories: BTreeSet::new(),
            sort_key: SortKey::Latest,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session seeded from an incoming `category` navigation parameter.
    pub fn with_category(category: Option<String>) -> Self {
        let mut state = Self::default();
        if let Some(category) = category {
            state.selected_categories.insert(category);
        }
        state
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn location_text(&self) -> &str {
        &self.location_text
    }

    pub fn salary_range(&self) -> (i64, i64) {
        (self.salary_low, self.salary_high)
    }

    pub fn selected_types(&self) -> &BTreeSet<JobType> {
        &self.selected_types
    }

    pub fn selected_categories(&self) -> &BTreeSet<String> {
        &self.selected_categories
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    pub fn set_location_text(&mut self, text: impl Into<String>) {
        self.location_text = text.into();
    }

    /// Sets both salary bounds. Negative bounds become zero and an inverted
    /// range is clamped by lowering `low` to `high`.
    pub fn set_salary_range(&mut self, low: i64, high: i64) {
        let high = high.max(SALARY_FLOOR);
        let low = low.max(SALARY_FLOOR).min(high);
        self.salary_low = low;
        self.salary_high = high;
    }

    /// Slider step for the lower bound; stays within the slider's range and
    /// drags the upper bound along when it passes it.
    pub fn set_salary_low(&mut self, low: i64) {
        let low = low.min(SALARY_CEILING);
        let high = self.salary_high.max(low);
        self.set_salary_range(low, high);
    }

    /// Slider step for the upper bound, capped at `SALARY_CEILING`.
    pub fn set_salary_high(&mut self, high: i64) {
        self.set_salary_range(self.salary_low, high.min(SALARY_CEILING));
    }

    pub fn set_type(&mut self, job_type: JobType, checked: bool) {
        if checked {
            self.selected_types.insert(job_type);
        } else {
            self.selected_types.remove(&job_type);
        }
    }

    pub fn toggle_type(&mut self, job_type: JobType) {
        let checked = !self.selected_types.contains(&job_type);
        self.set_type(job_type, checked);
    }

    pub fn set_category(&mut self, category: impl Into<String>, checked: bool) {
        let category = category.into();
        if checked {
            self.selected_categories.insert(category);
        } else {
            self.selected_categories.remove(&category);
        }
    }

    pub fn toggle_category(&mut self, category: &str) {
        let checked = !self.selected_categories.contains(category);
        self.set_category(category, checked);
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.sort_key = key;
    }

    /// Drops every narrowing predicate. The sort key is kept.
    pub fn clear_filters(&mut self) {
        let sort_key = self.sort_key;
        *self = Self::default();
        self.sort_key = sort_key;
    }

    pub fn is_unfiltered(&self) -> bool {
        let sort_key = self.sort_key;
        *self
            == Self {
                sort_key,
                ..Self::default()
            }
    }

    pub fn matches(&self, listing: &JobListing) -> bool {
        Predicates::new(self).matches(listing)
    }
}

/// A `FilterState` with its text already lowercased, so a pass over the
/// listing set lowercases each needle once.
pub struct Predicates<'a> {
    state: &'a FilterState,
    search: String,
    location: String,
    remote_only: bool,
}

impl<'a> Predicates<'a> {
    pub fn new(state: &'a FilterState) -> Self {
        let location = state.location_text.to_lowercase();
        Self {
            state,
            search: state.search_text.to_lowercase(),
            remote_only: location == "remote",
            location,
        }
    }

    pub fn matches(&self, listing: &JobListing) -> bool {
        self.matches_search(listing)
            && self.matches_location(listing)
            && self.matches_salary(listing)
            && self.matches_type(listing)
            && self.matches_category(listing)
    }

    fn matches_search(&self, listing: &JobListing) -> bool {
        self.search.is_empty()
            || listing.title.to_lowercase().contains(&self.search)
            || listing.company.to_lowercase().contains(&self.search)
            || listing.description.to_lowercase().contains(&self.search)
    }

    fn matches_location(&self, listing: &JobListing) -> bool {
        self.location.is_empty()
            || listing.location.to_lowercase().contains(&self.location)
            || (self.remote_only && listing.remote)
    }

    fn matches_salary(&self, listing: &JobListing) -> bool {
        listing.salary.min >= self.state.salary_low && listing.salary.max <= self.state.salary_high
    }

    fn matches_type(&self, listing: &JobListing) -> bool {
        self.state.selected_types.is_empty() || self.state.selected_types.contains(&listing.job_type)
    }

    fn matches_category(&self, listing: &JobListing) -> bool {
        self.state.selected_categories.is_empty()
            || self.state.selected_categories.contains(&listing.category)
    }
}
