use anyhow::Result;
use clap::ValueEnum;

use crate::db::{BoardStats, Database};
use crate::error::BoardError;
use crate::models::{Application, JobListing, ListingStatus, NewListing};
use crate::render::{format_salary, truncate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    #[value(name = "jobseeker")]
    JobSeeker,
    Employer,
    Admin,
}

#[derive(Debug, Clone)]
pub struct CompanyListing {
    pub listing: JobListing,
    pub status: ListingStatus,
    pub applicants: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployerStats {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub total_applications: i64,
}

/// One dashboard per role, chosen once in `Dashboard::load`.
#[derive(Debug, Clone)]
pub enum Dashboard {
    JobSeeker {
        user: String,
        applications: Vec<(Application, JobListing)>,
        saved: Vec<JobListing>,
    },
    Employer {
        company: String,
        stats: EmployerStats,
        listings: Vec<CompanyListing>,
        received: Vec<(Application, JobListing)>,
    },
    Admin {
        stats: BoardStats,
        pending: Vec<JobListing>,
    },
}

impl Dashboard {
    /// Builds the dashboard for `role`. Job seekers need a user name and
    /// employers a company.
    pub fn load(db: &Database, role: Role, user: Option<&str>, company: Option<&str>) -> Result<Self> {
        match role {
            Role::JobSeeker => {
                let user = user.ok_or(BoardError::LoginRequired)?;
                Ok(Dashboard::JobSeeker {
                    user: user.to_string(),
                    applications: db.list_applications(user)?,
                    saved: db.list_bookmarks(user)?,
                })
            }
            Role::Employer => {
                let company = company.or(user).ok_or(BoardError::LoginRequired)?;
                let listings: Vec<CompanyListing> = db
                    .listings_for_company(company)?
                    .into_iter()
                    .map(|(listing, status, applicants)| CompanyListing {
                        listing,
                        status,
                        applicants,
                    })
                    .collect();
                Ok(Dashboard::Employer {
                    company: company.to_string(),
                    stats: employer_stats(&listings),
                    listings,
                    received: db.applications_for_company(company)?,
                })
            }
            Role::Admin => Ok(Dashboard::Admin {
                stats: db.stats()?,
                pending: db.list_listings(Some(ListingStatus::Pending))?,
            }),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            Dashboard::JobSeeker {
                user,
                applications,
                saved,
            } => render_job_seeker(&mut out, user, applications, saved),
            Dashboard::Employer {
                company,
                stats,
                listings,
                received,
            } => render_employer(&mut out, company, stats, listings, received),
            Dashboard::Admin { stats, pending } => render_admin(&mut out, stats, pending),
        }
        out
    }
}

fn render_job_seeker(out: &mut String, user: &str, applications: &[(Application, JobListing)], saved: &[JobListing]) {
    out.push_str(&format!("Job Seeker Dashboard - {}\n", user));
    out.push_str(&format!("\nApplied Jobs ({})\n", applications.len()));
    if applications.is_empty() {
        out.push_str("  No applications yet.\n");
    }
    for (app, job) in applications {
        out.push_str(&format!(
            "  #{:<4} {:<28} {:<20} {:<14} {}\n",
            job.id,
            truncate(&job.title, 26),
            truncate(&job.company, 18),
            app.status,
            app.applied_at
        ));
    }

    out.push_str(&format!("\nSaved Jobs ({})\n", saved.len()));
    if saved.is_empty() {
        out.push_str("  No saved jobs.\n");
    }
    for job in saved {
        out.push_str(&format!(
            "  #{:<4} {:<28} {:<20} {}\n",
            job.id,
            truncate(&job.title, 26),
            truncate(&job.company, 18),
            format_salary(job.salary.min, job.salary.max)
        ));
    }
}

fn render_employer(
    out: &mut String,
    company: &str,
    stats: &EmployerStats,
    listings: &[CompanyListing],
    received: &[(Application, JobListing)],
) {
    out.push_str(&format!("Employer Dashboard - {}\n", company));
    out.push_str(&format!(
        "\nTotal Jobs: {}   Active Jobs: {}   Applications: {}\n",
        stats.total_jobs, stats.active_jobs, stats.total_applications
    ));

    out.push_str("\nYour Job Postings\n");
    if listings.is_empty() {
        out.push_str("  No postings yet. Use 'jobboard post' to add one.\n");
    }
    for l in listings {
        out.push_str(&format!(
            "  #{:<4} {:<30} {:<9} {:>4} applicant(s)\n",
            l.listing.id,
            truncate(&l.listing.title, 28),
            l.status,
            l.applicants
        ));
    }

    out.push_str(&format!("\nApplications Received ({})\n", received.len()));
    for (app, job) in received {
        out.push_str(&format!(
            "  app #{:<4} {:<20} {:<28} {}\n",
            app.id,
            truncate(&app.applicant, 18),
            truncate(&job.title, 26),
            app.status
        ));
    }
}

fn render_admin(out: &mut String, stats: &BoardStats, pending: &[JobListing]) {
    out.push_str("Admin Panel\n");
    out.push_str(&format!(
        "\nListings: {}   Active: {}   Pending: {}   Employers: {}   Applications: {}\n",
        stats.total_listings, stats.active_listings, stats.pending_listings, stats.employers, stats.applications
    ));
    out.push_str(&format!("\nPending Approval ({})\n", pending.len()));
    if pending.is_empty() {
        out.push_str("  Nothing waiting for review.\n");
    }
    for job in pending {
        out.push_str(&format!(
            "  #{:<4} {:<30} {}\n",
            job.id,
            truncate(&job.title, 28),
            job.company
        ));
    }
}

fn employer_stats(listings: &[CompanyListing]) -> EmployerStats {
    EmployerStats {
        total_jobs: listings.len(),
        active_jobs: listings
            .iter()
            .filter(|l| l.status == ListingStatus::Active)
            .count(),
        total_applications: listings.iter().map(|l| l.applicants).sum(),
    }
}

/// Stores a validated posting as pending until an admin approves it.
pub fn submit_posting(db: &Database, posting: &NewListing) -> Result<i64> {
    let id = db.add_listing(posting, ListingStatus::Pending)?;
    tracing::info!(listing = id, company = %posting.company, "posting submitted for review");
    Ok(id)
}
