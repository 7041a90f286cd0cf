//! The employer "Post a Job" form: raw text fields in, a validated listing out.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

use crate::error::PostingError;
use crate::models::{ApplicationMethod, JobType, NewListing, Salary};

#[derive(Debug, Clone, Default)]
pub struct JobPostingForm {
    pub company_name: String,
    pub job_title: String,
    pub description: String,
    pub requirements: String,
    pub salary: String,
    pub location: String,
    pub deadline: String,
    pub application_method: String,
    pub job_type: String,
    pub category: String,
    pub remote: bool,
    pub urgent: bool,
}

impl JobPostingForm {
    /// Checks each field in form order and reports the first one that fails.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<NewListing, PostingError> {
        let company = required(&self.company_name, "company name")?;
        let title = required(&self.job_title, "job title")?;
        let description = required(&self.description, "job description")?;
        let salary = parse_salary(&self.salary)?;
        let location = required(&self.location, "location")?;
        let deadline = parse_deadline(&self.deadline, now.date_naive())?;
        let application = parse_application_method(&self.application_method)?;
        let job_type = required(&self.job_type, "job type")?;
        let job_type = job_type
            .parse::<JobType>()
            .map_err(|_| PostingError::JobType(job_type))?;
        let category = required(&self.category, "category")?;

        Ok(NewListing {
            title,
            company,
            location,
            salary,
            job_type,
            category,
            description,
            posted_at: now,
            remote: self.remote,
            requirements: split_requirements(&self.requirements),
            urgent: self.urgent,
            deadline,
            application,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, PostingError> {
    let value = value.trim();
    if value.is_empty() {
        Err(PostingError::Missing(field))
    } else {
        Ok(value.to_string())
    }
}

/// One requirement per line; a single line may also be comma separated.
pub fn split_requirements(raw: &str) -> Vec<String> {
    let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let items: Vec<&str> = if lines.len() == 1 {
        lines[0].split(',').collect()
    } else {
        lines
    };
    items
        .into_iter()
        .map(|s| s.trim().trim_start_matches(['-', '*']).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn salary_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:tzs\s*)?([\d,]+(?:\.\d+)?)\s*([mk])?\s*(?:-|–|to)\s*(?:tzs\s*)?([\d,]+(?:\.\d+)?)\s*([mk])?$")
            .ok()
    })
    .as_ref()
}

/// Reads `7000000-10000000`, `7M - 10M`, `TZS 7.5M-10M` or `7,000,000 to 10,000,000`.
pub fn parse_salary(raw: &str) -> Result<Salary, PostingError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(PostingError::Missing("salary"));
    }
    let caps = salary_regex()
        .and_then(|re| re.captures(text))
        .ok_or_else(|| PostingError::Salary(raw.to_string()))?;

    let amount = |num: usize, unit: usize| -> Result<i64, PostingError> {
        let digits = caps[num].replace(',', "");
        let value: f64 = digits
            .parse()
            .map_err(|_| PostingError::Salary(raw.to_string()))?;
        let scale = match caps.get(unit).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(u) if u == "m" => 1_000_000.0,
            Some(u) if u == "k" => 1_000.0,
            _ => 1.0,
        };
        Ok((value * scale).round() as i64)
    };

    let min = amount(1, 2)?;
    let max = amount(3, 4)?;
    if min > max {
        return Err(PostingError::SalaryOrder { min, max });
    }
    Ok(Salary::new(min, max))
}

fn parse_deadline(raw: &str, today: NaiveDate) -> Result<Option<NaiveDate>, PostingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| PostingError::Deadline(raw.to_string()))?;
    if date < today {
        return Err(PostingError::DeadlinePassed(raw.to_string()));
    }
    Ok(Some(date))
}

/// `internal` (or blank), an email address, or an http(s) URL.
pub fn parse_application_method(raw: &str) -> Result<ApplicationMethod, PostingError> {
    let raw = raw.trim();
    let lower = raw.to_lowercase();
    if lower.is_empty() || lower == "internal" {
        return Ok(ApplicationMethod::Internal);
    }
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return reqwest::Url::parse(raw)
            .map(|url| ApplicationMethod::External(url.to_string()))
            .map_err(|_| PostingError::ApplicationMethod(raw.to_string()));
    }
    let address = raw.strip_prefix("mailto:").unwrap_or(raw);
    match address.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') && !address.contains(' ') => {
            Ok(ApplicationMethod::Email(address.to_string()))
        }
        _ => Err(PostingError::ApplicationMethod(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_705_276_800, 0).unwrap() // 2024-01-15
    }

    fn filled() -> JobPostingForm {
        JobPostingForm {
            company_name: "Selcom".to_string(),
            job_title: "Backend Engineer".to_string(),
            description: "Build payment APIs.".to_string(),
            requirements: "Rust\nPostgreSQL\n- 3+ years experience".to_string(),
            salary: "TZS 7.5M - 10M".to_string(),
            location: "Dar es Salaam, Tanzania".to_string(),
            deadline: "2024-02-28".to_string(),
            application_method: "careers@selcom.net".to_string(),
            job_type: "Full-time".to_string(),
            category: "Technology".to_string(),
            remote: true,
            urgent: false,
        }
    }

    #[test]
    fn salary_pattern_compiles() {
        assert!(salary_regex().is_some());
        assert_eq!(parse_salary("7,000,000 to 10,000,000").unwrap(), Salary::new(7_000_000, 10_000_000));
    }

    #[test]
    fn complete_form_becomes_listing() {
        let listing = filled().validate(now()).unwrap();
        assert_eq!(listing.salary, Salary::new(7_500_000, 10_000_000));
        assert_eq!(listing.job_type, JobType::FullTime);
        assert_eq!(listing.requirements, vec!["Rust", "PostgreSQL", "3+ years experience"]);
        assert_eq!(listing.deadline, NaiveDate::from_ymd_opt(2024, 2, 28));
        assert_eq!(
            listing.application,
            ApplicationMethod::Email("careers@selcom.net".to_string())
        );
        assert_eq!(listing.posted_at, now());
    }

    #[test]
    fn first_missing_field_is_reported() {
        let mut form = filled();
        form.job_title = "  ".to_string();
        form.location.clear();
        assert_eq!(form.validate(now()).unwrap_err(), PostingError::Missing("job title"));
    }

    #[test]
    fn salary_formats() {
        assert_eq!(parse_salary("7000000-10000000").unwrap(), Salary::new(7_000_000, 10_000_000));
        assert_eq!(parse_salary("7,000,000 to 10,000,000").unwrap(), Salary::new(7_000_000, 10_000_000));
        assert_eq!(parse_salary("800k - 1.2M").unwrap(), Salary::new(800_000, 1_200_000));
        assert!(matches!(parse_salary("negotiable"), Err(PostingError::Salary(_))));
        assert_eq!(
            parse_salary("10M - 7M").unwrap_err(),
            PostingError::SalaryOrder { min: 10_000_000, max: 7_000_000 }
        );
    }

    #[test]
    fn past_deadline_is_rejected() {
        let mut form = filled();
        form.deadline = "2023-12-31".to_string();
        assert!(matches!(form.validate(now()), Err(PostingError::DeadlinePassed(_))));
        form.deadline = "31/12/2024".to_string();
        assert!(matches!(form.validate(now()), Err(PostingError::Deadline(_))));
    }

    #[test]
    fn application_methods() {
        assert_eq!(parse_application_method("").unwrap(), ApplicationMethod::Internal);
        assert_eq!(
            parse_application_method("https://selcom.net/careers").unwrap(),
            ApplicationMethod::External("https://selcom.net/careers".to_string())
        );
        assert!(parse_application_method("call us").is_err());
    }

    #[test]
    fn comma_separated_requirements() {
        assert_eq!(split_requirements("React, CSS ,HTML"), vec!["React", "CSS", "HTML"]);
        assert!(split_requirements("").is_empty());
    }
}
