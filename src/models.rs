use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Categories offered by the filter sidebar.
pub const CATEGORIES: [&str; 6] = [
    "Technology",
    "Design",
    "Marketing",
    "Human Resources",
    "Sales",
    "Finance",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Salary {
    pub min: i64,
    pub max: i64,
}

impl Salary {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Freelance,
    Internship,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Contract,
        JobType::Freelance,
        JobType::Internship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Freelance => "Freelance",
            JobType::Internship => "Internship",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
        JobType::ALL
            .into_iter()
            .find(|t| t.as_str().to_lowercase() == wanted || wanted == t.as_str().to_lowercase().replace('-', ""))
            .ok_or_else(|| BoardError::InvalidValue {
                field: "job type",
                value: s.to_string(),
            })
    }
}

/// A single job posting. Read-only once it enters the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Salary,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "postedAt", alias = "posted_at")]
    pub posted_at: DateTime<Utc>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub urgent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Latest,
    Oldest,
    SalaryHigh,
    SalaryLow,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::Latest,
        SortKey::Oldest,
        SortKey::SalaryHigh,
        SortKey::SalaryLow,
    ];

    /// Parses a sort key, falling back to `Latest` for anything unrecognised.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "latest" => SortKey::Latest,
            "oldest" => SortKey::Oldest,
            "salary-high" => SortKey::SalaryHigh,
            "salary-low" => SortKey::SalaryLow,
            other => {
                tracing::warn!(sort_key = other, "unknown sort key, using latest");
                SortKey::Latest
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Latest => "latest",
            SortKey::Oldest => "oldest",
            SortKey::SalaryHigh => "salary-high",
            SortKey::SalaryLow => "salary-low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Latest => "Latest",
            SortKey::Oldest => "Oldest",
            SortKey::SalaryHigh => "Salary: High to Low",
            SortKey::SalaryLow => "Salary: Low to High",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SortKey::Latest => SortKey::Oldest,
            SortKey::Oldest => SortKey::SalaryHigh,
            SortKey::SalaryHigh => SortKey::SalaryLow,
            SortKey::SalaryLow => SortKey::Latest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        }
    }
}

impl FromStr for ViewMode {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            _ => Err(BoardError::InvalidValue {
                field: "view mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Moderation state of a stored listing. Only `Active` listings are browsable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Active,
    Paused,
    Rejected,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Active => "active",
            ListingStatus::Paused => "paused",
            ListingStatus::Rejected => "rejected",
        }
    }

    /// Whether a listing in this state may move to `next`.
    pub fn can_become(&self, next: ListingStatus) -> bool {
        matches!(
            (self, next),
            (ListingStatus::Pending, ListingStatus::Active)
                | (ListingStatus::Pending, ListingStatus::Rejected)
                | (ListingStatus::Active, ListingStatus::Paused)
                | (ListingStatus::Active, ListingStatus::Rejected)
                | (ListingStatus::Paused, ListingStatus::Active)
        )
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ListingStatus::Pending),
            "active" => Ok(ListingStatus::Active),
            "paused" => Ok(ListingStatus::Paused),
            "rejected" => Ok(ListingStatus::Rejected),
            _ => Err(BoardError::InvalidValue {
                field: "listing status",
                value: s.to_string(),
            }),
        }
    }
}

/// A moderation command, with the only state it may be applied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Reject,
    Pause,
    Resume,
}

impl ModerationAction {
    /// States the listing must be in for this action to apply.
    pub fn allowed_from(&self) -> &'static [ListingStatus] {
        match self {
            ModerationAction::Approve => &[ListingStatus::Pending],
            ModerationAction::Reject => &[ListingStatus::Pending, ListingStatus::Active],
            ModerationAction::Pause => &[ListingStatus::Active],
            ModerationAction::Resume => &[ListingStatus::Paused],
        }
    }

    pub fn target(&self) -> ListingStatus {
        match self {
            ModerationAction::Approve | ModerationAction::Resume => ListingStatus::Active,
            ModerationAction::Reject => ListingStatus::Rejected,
            ModerationAction::Pause => ListingStatus::Paused,
        }
    }
}

/// Where an employer has got to with one application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    #[default]
    Submitted,
    UnderReview,
    Shortlisted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under-review",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Rejection is final; any other state may move to a different one.
    pub fn can_become(&self, next: ApplicationStatus) -> bool {
        *self != ApplicationStatus::Rejected && *self != next
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(ApplicationStatus::Submitted),
            "under-review" => Ok(ApplicationStatus::UnderReview),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(BoardError::InvalidValue {
                field: "application status",
                value: s.to_string(),
            }),
        }
    }
}

/// How candidates apply to a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "lowercase")]
pub enum ApplicationMethod {
    Internal,
    Email(String),
    External(String),
}

impl ApplicationMethod {
    pub fn kind(&self) -> &'static str {
        match self {
            ApplicationMethod::Internal => "internal",
            ApplicationMethod::Email(_) => "email",
            ApplicationMethod::External(_) => "external",
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            ApplicationMethod::Internal => None,
            ApplicationMethod::Email(t) | ApplicationMethod::External(t) => Some(t),
        }
    }

    pub fn from_parts(kind: &str, target: Option<String>) -> Result<Self, BoardError> {
        match (kind, target) {
            ("internal", _) => Ok(ApplicationMethod::Internal),
            ("email", Some(t)) => Ok(ApplicationMethod::Email(t)),
            ("external", Some(t)) => Ok(ApplicationMethod::External(t)),
            (other, _) => Err(BoardError::InvalidValue {
                field: "application method",
                value: other.to_string(),
            }),
        }
    }
}

/// A listing that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Salary,
    pub job_type: JobType,
    pub category: String,
    pub description: String,
    pub posted_at: DateTime<Utc>,
    pub remote: bool,
    pub requirements: Vec<String>,
    pub urgent: bool,
    pub deadline: Option<NaiveDate>,
    pub application: ApplicationMethod,
}

impl From<JobListing> for NewListing {
    fn from(l: JobListing) -> Self {
        Self {
            title: l.title,
            company: l.company,
            location: l.location,
            salary: l.salary,
            job_type: l.job_type,
            category: l.category,
            description: l.description,
            posted_at: l.posted_at,
            remote: l.remote,
            requirements: l.requirements,
            urgent: l.urgent,
            deadline: None,
            application: ApplicationMethod::Internal,
        }
    }
}

/// Everything the detail page shows about one listing.
#[derive(Debug, Clone)]
pub struct ListingDetail {
    pub listing: JobListing,
    pub status: ListingStatus,
    pub deadline: Option<NaiveDate>,
    pub application: ApplicationMethod,
    pub applicants: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub listing_id: i64,
    pub applicant: String,
    pub status: ApplicationStatus,
    pub applied_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_type_parses_display_and_loose_forms() {
        assert_eq!("Full-time".parse::<JobType>().unwrap(), JobType::FullTime);
        assert_eq!("part time".parse::<JobType>().unwrap(), JobType::PartTime);
        assert_eq!("fulltime".parse::<JobType>().unwrap(), JobType::FullTime);
        assert_eq!("contract".parse::<JobType>().unwrap(), JobType::Contract);
        assert!("gig".parse::<JobType>().is_err());
    }

    #[test]
    fn unknown_sort_key_falls_back_to_latest() {
        assert_eq!(SortKey::parse_lenient("salary-high"), SortKey::SalaryHigh);
        assert_eq!(SortKey::parse_lenient("random"), SortKey::Latest);
        assert_eq!(SortKey::parse_lenient(""), SortKey::Latest);
    }

    #[test]
    fn listing_json_uses_wire_names() {
        let json = r#"{
            "id": 9,
            "title": "QA Engineer",
            "company": "Halotel",
            "location": "Dodoma, Tanzania",
            "salary": {"min": 5000000, "max": 7000000},
            "type": "Internship",
            "category": "Technology",
            "postedAt": "2024-02-01T00:00:00Z"
        }"#;
        let listing: JobListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.job_type, JobType::Internship);
        assert!(!listing.remote);
        assert!(listing.requirements.is_empty());
    }

    #[test]
    fn status_transitions() {
        assert!(ListingStatus::Pending.can_become(ListingStatus::Active));
        assert!(ListingStatus::Paused.can_become(ListingStatus::Active));
        assert!(!ListingStatus::Rejected.can_become(ListingStatus::Active));
        assert!(!ListingStatus::Pending.can_become(ListingStatus::Paused));
    }

    #[test]
    fn resume_and_approve_have_distinct_sources() {
        assert_eq!(ModerationAction::Resume.allowed_from(), &[ListingStatus::Paused]);
        assert_eq!(ModerationAction::Approve.allowed_from(), &[ListingStatus::Pending]);
        assert_eq!(ModerationAction::Resume.target(), ModerationAction::Approve.target());
    }

    #[test]
    fn application_status_names() {
        assert_eq!("under-review".parse::<ApplicationStatus>().unwrap(), ApplicationStatus::UnderReview);
        assert_eq!(ApplicationStatus::Shortlisted.to_string(), "shortlisted");
        assert!("hired".parse::<ApplicationStatus>().is_err());
        assert!(!ApplicationStatus::Rejected.can_become(ApplicationStatus::Shortlisted));
        assert!(ApplicationStatus::Submitted.can_become(ApplicationStatus::UnderReview));
    }
}
