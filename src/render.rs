//! Text rendering of a result set. Receives listings already filtered and
//! ordered; never narrows or reorders them.

use chrono::{DateTime, Utc};

use crate::models::{JobListing, ViewMode};

pub const EMPTY_TITLE: &str = "No jobs found";
pub const EMPTY_HINT: &str = "Try adjusting your search criteria or filters";

const CARD_WIDTH: usize = 44;
const SHOWN_TAGS: usize = 3;

pub fn format_salary(min: i64, max: i64) -> String {
    format!("TZS {} - {}", millions(min), millions(max))
}

pub fn millions(amount: i64) -> String {
    format!("{:.1}M", amount as f64 / 1_000_000.0)
}

pub fn time_ago(posted: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - posted).num_seconds().unsigned_abs();
    let days = secs.div_ceil(86_400);
    if days == 1 {
        "1 day ago".to_string()
    } else {
        format!("{} days ago", days)
    }
}

/// First three requirement tags, then a `+N more` marker.
pub fn tag_line(requirements: &[String]) -> String {
    let mut parts: Vec<String> = requirements
        .iter()
        .take(SHOWN_TAGS)
        .map(|r| format!("[{}]", r))
        .collect();
    if requirements.len() > SHOWN_TAGS {
        parts.push(format!("[+{} more]", requirements.len() - SHOWN_TAGS));
    }
    parts.join(" ")
}

pub fn summary(shown: usize, total: usize) -> String {
    format!("Showing {} of {} jobs", shown, total)
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn render(listings: &[&JobListing], total: usize, mode: ViewMode, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str(&summary(listings.len(), total));
    out.push_str("\n\n");

    if listings.is_empty() {
        out.push_str(EMPTY_TITLE);
        out.push('\n');
        out.push_str(EMPTY_HINT);
        out.push('\n');
        return out;
    }

    match mode {
        ViewMode::List => render_list(&mut out, listings),
        ViewMode::Grid => render_grid(&mut out, listings, now),
    }
    out
}

fn render_list(out: &mut String, listings: &[&JobListing]) {
    out.push_str(&format!(
        "{:<5} {:<28} {:<20} {:<22} {:<10} {:>20}\n",
        "ID", "TITLE", "COMPANY", "LOCATION", "TYPE", "SALARY"
    ));
    out.push_str(&"-".repeat(110));
    out.push('\n');
    for job in listings {
        let marker = if job.urgent { "!" } else { " " };
        out.push_str(&format!(
            "{}{:<4} {:<28} {:<20} {:<22} {:<10} {:>20}\n",
            marker,
            job.id,
            truncate(&job.title, 26),
            truncate(&job.company, 18),
            truncate(&location_label(job), 20),
            job.job_type.as_str(),
            format_salary(job.salary.min, job.salary.max)
        ));
    }
}

fn render_grid(out: &mut String, listings: &[&JobListing], now: DateTime<Utc>) {
    for row in listings.chunks(2) {
        let cards: Vec<Vec<String>> = row.iter().map(|job| card(job, now)).collect();
        let height = cards.iter().map(Vec::len).max().unwrap_or(0);
        for i in 0..height {
            let line: Vec<String> = cards
                .iter()
                .map(|c| format!("{:<width$}", c.get(i).map(String::as_str).unwrap_or(""), width = CARD_WIDTH))
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
}

fn card(job: &JobListing, now: DateTime<Utc>) -> Vec<String> {
    let inner = CARD_WIDTH - 4;
    let mut title = format!("#{} {}", job.id, job.title);
    if job.urgent {
        title.push_str(" [Urgent]");
    }

    let mut body = vec![
        truncate(&title, inner),
        truncate(&job.company, inner),
        truncate(&location_label(job), inner),
        format!("{} | {}", job.job_type, format_salary(job.salary.min, job.salary.max)),
        truncate(&tag_line(&job.requirements), inner),
        time_ago(job.posted_at, now),
    ];
    body.retain(|l| !l.is_empty());

    let mut lines = Vec::with_capacity(body.len() + 2);
    lines.push(format!("+{}+", "-".repeat(CARD_WIDTH - 2)));
    for l in body {
        lines.push(format!("| {:<width$} |", l, width = inner));
    }
    lines.push(format!("+{}+", "-".repeat(CARD_WIDTH - 2)));
    lines
}

pub fn location_label(job: &JobListing) -> String {
    if job.remote {
        format!("{} (Remote)", job.location)
    } else {
        job.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_listings;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_705_363_200, 0).unwrap() // 2024-01-16
    }

    #[test]
    fn salary_is_shown_in_millions() {
        assert_eq!(format_salary(7_000_000, 10_000_000), "TZS 7.0M - 10.0M");
        assert_eq!(format_salary(7_500_000, 9_300_000), "TZS 7.5M - 9.3M");
    }

    #[test]
    fn age_rounds_partial_days_up() {
        let posted = DateTime::from_timestamp(1_705_276_800, 0).unwrap(); // 2024-01-15
        assert_eq!(time_ago(posted, now()), "1 day ago");
        let later = now() + chrono::Duration::hours(5);
        assert_eq!(time_ago(posted, later), "2 days ago");
    }

    #[test]
    fn tags_collapse_after_three() {
        let reqs: Vec<String> = ["Python", "ML", "SQL", "Stats", "3+ years"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tag_line(&reqs), "[Python] [ML] [SQL] [+2 more]");
        assert_eq!(tag_line(&reqs[..2]), "[Python] [ML]");
    }

    #[test]
    fn empty_result_renders_empty_state() {
        let out = render(&[], 6, ViewMode::Grid, now());
        assert!(out.contains("Showing 0 of 6 jobs"));
        assert!(out.contains(EMPTY_TITLE));
        assert!(out.contains(EMPTY_HINT));
    }

    #[test]
    fn list_and_grid_show_every_listing_in_order() {
        let all = sample_listings();
        let refs: Vec<&JobListing> = all.iter().collect();
        for mode in [ViewMode::List, ViewMode::Grid] {
            let out = render(&refs, refs.len(), mode, now());
            let positions: Vec<usize> = all
                .iter()
                .map(|l| out.find(&l.title).expect("title rendered"))
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]), "{mode:?}");
            assert!(out.contains("Showing 6 of 6 jobs"));
        }
    }

    #[test]
    fn grid_places_two_cards_per_row() {
        let all = sample_listings();
        let refs: Vec<&JobListing> = all.iter().take(2).collect();
        let out = render(&refs, 2, ViewMode::Grid, now());
        let row = out.lines().find(|l| l.contains("Senior Software Engineer")).unwrap();
        assert!(row.contains("Product Designer"));
    }
}
