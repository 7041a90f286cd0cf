use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{JobListing, JobType, Salary};

fn posted(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn tags(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The six demo listings shown before any real data is imported.
pub fn sample_listings() -> Vec<JobListing> {
    vec![
        JobListing {
            id: 1,
            title: "Senior Software Engineer".to_string(),
            company: "Vodacom Tanzania".to_string(),
            location: "Dar es Salaam, Tanzania".to_string(),
            salary: Salary::new(12_000_000, 18_000_000),
            job_type: JobType::FullTime,
            category: "Technology".to_string(),
            description: "Join our team of innovative engineers building the next generation of telecommunications products.".to_string(),
            posted_at: posted(2024, 1, 15),
            remote: false,
            requirements: tags(&["React", "Node.js", "TypeScript", "5+ years experience"]),
            urgent: true,
        },
        JobListing {
            id: 2,
            title: "Product Designer".to_string(),
            company: "Tigo Tanzania".to_string(),
            location: "Dar es Salaam, Tanzania".to_string(),
            salary: Salary::new(9_000_000, 13_000_000),
            job_type: JobType::FullTime,
            category: "Design".to_string(),
            description: "Create beautiful and intuitive user experiences for our digital products.".to_string(),
            posted_at: posted(2024, 1, 14),
            remote: true,
            requirements: tags(&["Figma", "Adobe Creative Suite", "User Research", "3+ years experience"]),
            urgent: false,
        },
        JobListing {
            id: 3,
            title: "Marketing Manager".to_string(),
            company: "Azam Media".to_string(),
            location: "Dar es Salaam, Tanzania".to_string(),
            salary: Salary::new(8_000_000, 11_000_000),
            job_type: JobType::FullTime,
            category: "Marketing".to_string(),
            description: "Lead our marketing efforts and drive growth across all channels.".to_string(),
            posted_at: posted(2024, 1, 13),
            remote: false,
            requirements: tags(&["Digital Marketing", "Analytics", "Campaign Management", "4+ years experience"]),
            urgent: false,
        },
        JobListing {
            id: 4,
            title: "Data Scientist".to_string(),
            company: "CRDB Bank".to_string(),
            location: "Dar es Salaam, Tanzania".to_string(),
            salary: Salary::new(11_000_000, 16_000_000),
            job_type: JobType::FullTime,
            category: "Technology".to_string(),
            description: "Analyze complex data sets to drive business insights and machine learning models for banking solutions.".to_string(),
            posted_at: posted(2024, 1, 12),
            remote: false,
            requirements: tags(&["Python", "Machine Learning", "SQL", "Statistics", "3+ years experience"]),
            urgent: true,
        },
        JobListing {
            id: 5,
            title: "Frontend Developer".to_string(),
            company: "Selcom".to_string(),
            location: "Dar es Salaam, Tanzania".to_string(),
            salary: Salary::new(7_000_000, 10_000_000),
            job_type: JobType::Contract,
            category: "Technology".to_string(),
            description: "Build responsive and interactive web applications for fintech solutions.".to_string(),
            posted_at: posted(2024, 1, 11),
            remote: true,
            requirements: tags(&["React", "JavaScript", "CSS", "HTML", "2+ years experience"]),
            urgent: false,
        },
        JobListing {
            id: 6,
            title: "HR Generalist".to_string(),
            company: "Twiga Foods Tanzania".to_string(),
            location: "Arusha, Tanzania".to_string(),
            salary: Salary::new(6_000_000, 8_000_000),
            job_type: JobType::PartTime,
            category: "Human Resources".to_string(),
            description: "Support all aspects of human resources including recruiting, onboarding, and employee relations.".to_string(),
            posted_at: posted(2024, 1, 10),
            remote: false,
            requirements: tags(&["HR Experience", "Communication", "Organization", "2+ years experience"]),
            urgent: false,
        },
    ]
}
