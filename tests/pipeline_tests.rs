use jobboard::deeplink::seed_category;
use jobboard::filter::FilterState;
use jobboard::models::{JobListing, JobType, SortKey};
use jobboard::pipeline::{ListingPipeline, run};
use jobboard::sample::sample_listings;

fn titles(listings: &[&JobListing]) -> Vec<String> {
    listings.iter().map(|l| l.title.clone()).collect()
}

#[test]
fn test_default_state_returns_everything_latest_first() {
    let listings = sample_listings();
    let results = run(&listings, &FilterState::new());

    assert_eq!(results.result_count(), listings.len());
    let dates: Vec<_> = results.listings.iter().map(|l| l.posted_at).collect();
    assert!(dates.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_empty_search_excludes_nothing() {
    let listings = sample_listings();
    let state = FilterState::new();
    assert!(listings.iter().all(|l| state.matches(l)));
}

#[test]
fn test_filtering_is_idempotent() {
    let listings = sample_listings();
    let mut state = FilterState::new();
    state.set_search_text("a");
    state.set_location_text("dar es salaam");
    state.set_salary_range(7_000_000, 16_000_000);

    let first = run(&listings, &state);
    assert_eq!(first.result_count(), 4);
    let narrowed: Vec<JobListing> = first.listings.iter().map(|l| (*l).clone()).collect();
    let second = run(&narrowed, &state);
    assert_eq!(titles(&first.listings), titles(&second.listings));
}

#[test]
fn test_sort_is_stable_for_equal_keys() {
    let mut listings = sample_listings();
    // Give the three Technology listings the same posting date
    let date = listings[0].posted_at;
    for l in listings.iter_mut().filter(|l| l.category == "Technology") {
        l.posted_at = date;
    }

    let results = run(&listings, &FilterState::new());
    let tech: Vec<i64> = results
        .listings
        .iter()
        .filter(|l| l.category == "Technology")
        .map(|l| l.id)
        .collect();
    assert_eq!(tech, vec![1, 4, 5]);
}

#[test]
fn test_contract_type_keeps_selcom_only() {
    let listings = sample_listings();
    let mut state = FilterState::new();
    state.set_type(JobType::Contract, true);

    let results = run(&listings, &state);
    assert!(results.listings.iter().all(|l| l.job_type == JobType::Contract));
    assert_eq!(results.result_count(), 1);
    let selcom = results.listings[0];
    assert_eq!((selcom.title.as_str(), selcom.company.as_str()), ("Frontend Developer", "Selcom"));
    assert_eq!((selcom.salary.min, selcom.salary.max), (7_000_000, 10_000_000));
}

#[test]
fn test_remote_location_selects_remote_listings() {
    let listings = sample_listings();
    let mut state = FilterState::new();
    state.set_location_text("remote");

    let results = run(&listings, &state);
    let expected: Vec<i64> = listings.iter().filter(|l| l.remote).map(|l| l.id).collect();
    let got: Vec<i64> = results.listings.iter().map(|l| l.id).collect();
    assert_eq!(got, expected);
    assert!(results
        .listings
        .iter()
        .any(|l| l.title == "Product Designer" && l.company == "Tigo Tanzania"));
}

#[test]
fn test_salary_high_ordering() {
    let listings = sample_listings();
    let mut state = FilterState::new();
    state.set_sort_key(SortKey::SalaryHigh);

    let results = run(&listings, &state);
    assert_eq!(
        titles(&results.listings),
        vec![
            "Senior Software Engineer",
            "Data Scientist",
            "Product Designer",
            "Marketing Manager",
            "Frontend Developer",
            "HR Generalist",
        ]
    );
}

#[test]
fn test_salary_range_narrowing() {
    let listings = sample_listings();
    let mut state = FilterState::new();
    state.set_salary_range(0, 9_000_000);

    let results = run(&listings, &state);
    assert!(results.listings.iter().all(|l| l.salary.max <= 9_000_000));
    assert!(!results.listings.iter().any(|l| l.title == "Senior Software Engineer"));
    assert!(results.listings.iter().any(|l| l.title == "HR Generalist"));
}

#[test]
fn test_clearing_filters_restores_count() {
    let mut pipeline = ListingPipeline::new(sample_listings());
    let mut state = FilterState::new();
    state.set_search_text("developer");
    state.set_location_text("remote");
    state.set_type(JobType::Contract, true);
    state.set_category("Technology", true);
    state.set_salary_range(5_000_000, 12_000_000);
    assert_eq!(pipeline.results(&state).result_count(), 1);

    state.clear_filters();
    let total = pipeline.total();
    assert_eq!(pipeline.results(&state).result_count(), total);
}

#[test]
fn test_category_deep_link_seeds_filter() {
    let listings = sample_listings();
    let state = FilterState::with_category(seed_category(Some("https://jobs.example/jobs?category=Technology")));

    let results = run(&listings, &state);
    assert_eq!(results.result_count(), 3);
    assert!(results.listings.iter().all(|l| l.category == "Technology"));
}

#[test]
fn test_route_path_deep_link_seeds_filter() {
    let listings = sample_listings();
    let state = FilterState::with_category(seed_category(Some("/jobs?category=design")));

    let results = run(&listings, &state);
    assert_eq!(results.result_count(), 1);
    assert_eq!(results.listings[0].title, "Product Designer");
}

#[test]
fn test_unknown_deep_link_category_shows_empty_state() {
    let listings = sample_listings();
    let state = FilterState::with_category(seed_category(Some("?category=Agriculture")));
    assert!(run(&listings, &state).is_empty());
}

#[test]
fn test_unrecognized_sort_key_falls_back_to_latest() {
    let listings = sample_listings();
    let mut fallback = FilterState::new();
    fallback.set_sort_key(SortKey::parse_lenient("most-relevant"));

    assert_eq!(
        titles(&run(&listings, &fallback).listings),
        titles(&run(&listings, &FilterState::new()).listings)
    );
}
