//! Pulls listings from the hosted data API. Errors stay here: nothing
//! malformed reaches the pipeline.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;

use crate::db::Database;
use crate::models::{JobListing, NewListing};

pub struct ListingSource {
    client: Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub fetched: usize,
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl ListingSource {
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("jobboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key,
        })
    }

    pub fn fetch(&self) -> Result<Vec<JobListing>> {
        let mut request = self.client.get(&self.url).header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request
            .send()
            .with_context(|| format!("Failed to reach {}", self.url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Listing API returned {} for {}", status, self.url));
        }

        let body = response.text().context("Failed to read listing API response")?;
        parse_listings(&body)
    }

    /// Fetches and stores every valid listing as active.
    pub fn import_into(&self, db: &Database) -> Result<ImportStats> {
        let listings = self.fetch()?;
        store_listings(db, listings)
    }
}

pub fn parse_listings(body: &str) -> Result<Vec<JobListing>> {
    serde_json::from_str(body).context("Listing API response is not a JSON array of listings")
}

/// Stores `listings` keyed on their source id, skipping any whose salary range
/// is inverted. Listings seen on an earlier import are updated in place.
pub fn store_listings(db: &Database, listings: Vec<JobListing>) -> Result<ImportStats> {
    let mut stats = ImportStats {
        fetched: listings.len(),
        ..ImportStats::default()
    };
    let mut valid: Vec<(i64, NewListing)> = Vec::with_capacity(listings.len());
    for listing in listings {
        if !listing.salary.is_valid() {
            tracing::warn!(
                id = listing.id,
                min = listing.salary.min,
                max = listing.salary.max,
                "skipping listing with inverted salary range"
            );
            stats.skipped += 1;
            continue;
        }
        valid.push((listing.id, listing.into()));
    }
    (stats.imported, stats.updated) = db.upsert_imported(&valid)?;
    tracing::info!(
        fetched = stats.fetched,
        imported = stats.imported,
        updated = stats.updated,
        skipped = stats.skipped,
        "listing import finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[
        {"id": 101, "title": "Accountant", "company": "NMB Bank", "location": "Mwanza, Tanzania",
         "salary": {"min": 5000000, "max": 7000000}, "type": "Full-time", "category": "Finance",
         "postedAt": "2024-01-20T08:00:00Z", "requirements": ["CPA"]},
        {"id": 102, "title": "Sales Lead", "company": "Bakhresa", "location": "Zanzibar",
         "salary": {"min": 9000000, "max": 4000000}, "type": "Contract", "category": "Sales",
         "postedAt": "2024-01-18T08:00:00Z"}
    ]"#;

    #[test]
    fn parses_api_payload() {
        let listings = parse_listings(BODY).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].requirements, vec!["CPA"]);
    }

    #[test]
    fn rejects_non_array_payload() {
        assert!(parse_listings(r#"{"error": "unauthorized"}"#).is_err());
    }

    #[test]
    fn inverted_salaries_are_skipped() {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        let stats = store_listings(&db, parse_listings(BODY).unwrap()).unwrap();
        assert_eq!((stats.fetched, stats.imported, stats.skipped), (2, 1, 1));
        assert_eq!(db.active_listings().unwrap()[0].title, "Accountant");
    }

    #[test]
    fn importing_twice_updates_in_place() {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        store_listings(&db, parse_listings(BODY).unwrap()).unwrap();

        let mut again = parse_listings(BODY).unwrap();
        again[0].title = "Senior Accountant".to_string();
        let stats = store_listings(&db, again).unwrap();
        assert_eq!((stats.imported, stats.updated, stats.skipped), (0, 1, 1));

        let stored = db.list_listings(None).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Senior Accountant");
    }
}
