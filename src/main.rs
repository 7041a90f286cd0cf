use anyhow::{Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use jobboard::config::Settings;
use jobboard::dashboard::{Dashboard, Role, submit_posting};
use jobboard::db::Database;
use jobboard::deeplink::seed_category;
use jobboard::detail::{self, ApplyOutcome};
use jobboard::error::BoardError;
use jobboard::fetch::ListingSource;
use jobboard::filter::{FilterState, SALARY_CEILING};
use jobboard::models::{ApplicationStatus, JobType, ModerationAction, SortKey, ViewMode};
use jobboard::pipeline;
use jobboard::posting::JobPostingForm;
use jobboard::render::{self, format_salary, location_label};
use jobboard::tui;

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(version)]
#[command(about = "Job board - browse, post, and moderate job listings")]
struct Cli {
    /// Database file (overrides config and JOBBOARD_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Acting user name (overrides config and JOBBOARD_USER)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Filter flags shared by `list` and `browse`.
#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Job title, keywords, or company
    #[arg(short, long, default_value = "")]
    search: String,

    /// City, region, or "remote"
    #[arg(short, long, default_value = "")]
    location: String,

    /// Lowest acceptable minimum salary (TZS)
    #[arg(long, default_value_t = 0)]
    salary_min: i64,

    /// Highest acceptable maximum salary (TZS)
    #[arg(long, default_value_t = SALARY_CEILING)]
    salary_max: i64,

    /// Job type (repeatable): full-time, part-time, contract, freelance, internship
    #[arg(short = 't', long = "type")]
    types: Vec<String>,

    /// Category (repeatable)
    #[arg(short, long = "category")]
    categories: Vec<String>,

    /// Sort order: latest, oldest, salary-high, salary-low
    #[arg(long, default_value = "latest")]
    sort: String,

    /// Incoming link to seed the category from, e.g. "?category=Design"
    #[arg(long)]
    link: Option<String>,
}

impl FilterArgs {
    fn to_state(&self) -> Result<FilterState> {
        let mut state = FilterState::with_category(seed_category(self.link.as_deref()));
        state.set_search_text(self.search.as_str());
        state.set_location_text(self.location.as_str());
        state.set_salary_range(self.salary_min, self.salary_max);
        for t in &self.types {
            state.set_type(t.parse::<JobType>()?, true);
        }
        for c in &self.categories {
            state.set_category(c.as_str(), true);
        }
        state.set_sort_key(SortKey::parse_lenient(&self.sort));
        Ok(state)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init {
        /// Also load the demo listings
        #[arg(long)]
        seed: bool,
    },

    /// Load the demo listings
    Seed,

    /// List active jobs
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Layout: grid or list
        #[arg(long, default_value = "list")]
        view: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Browse jobs interactively
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show job details
    Show {
        /// Listing ID
        id: i64,
    },

    /// Post a job (held for admin approval)
    Post {
        #[arg(long)]
        company: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// One per line, or comma separated
        #[arg(long, default_value = "")]
        requirements: String,
        /// e.g. "7M - 10M" or "7000000-10000000"
        #[arg(long)]
        salary: String,
        #[arg(long)]
        location: String,
        /// YYYY-MM-DD
        #[arg(long, default_value = "")]
        deadline: String,
        /// internal, an email address, or an http(s) URL
        #[arg(long, default_value = "internal")]
        apply: String,
        #[arg(long = "type")]
        job_type: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        remote: bool,
        #[arg(long)]
        urgent: bool,
    },

    /// Apply to a job
    Apply {
        /// Listing ID
        id: i64,
    },

    /// Save or unsave a job
    Bookmark {
        /// Listing ID
        id: i64,
    },

    /// Show the dashboard for a role
    Dashboard {
        #[arg(short, long, value_enum)]
        role: Role,

        /// Company name (employer dashboard)
        #[arg(long)]
        company: Option<String>,
    },

    /// Change a listing's moderation status
    Moderate {
        #[command(subcommand)]
        command: ModerateCommands,
    },

    /// Move an application through review (employer)
    Review {
        /// Application ID (see the employer dashboard)
        id: i64,

        #[arg(value_enum)]
        status: ApplicationStatus,
    },

    /// Import listings from the hosted data API
    Import {
        /// API URL (defaults to config api_url)
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum ModerateCommands {
    /// Approve a pending listing (admin)
    Approve { id: i64 },
    /// Reject a listing (admin)
    Reject { id: i64 },
    /// Pause an active listing (employer)
    Pause { id: i64 },
    /// Resume a paused listing (employer)
    Resume { id: i64 },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(db) = cli.db {
        settings.database = Some(db);
    }
    if cli.user.is_some() {
        settings.user = cli.user;
    }
    let user = settings.user.as_deref();
    let db = Database::open(&settings.database_path())?;

    match cli.command {
        Commands::Init { seed } => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
            if seed {
                let added = db.seed_sample()?;
                println!("Added {} demo listings", added);
            }
        }

        Commands::Seed => {
            db.ensure_initialized()?;
            let added = db.seed_sample()?;
            println!("Added {} demo listings", added);
        }

        Commands::List { filters, view, json } => {
            db.ensure_initialized()?;
            let state = filters.to_state()?;
            let view: ViewMode = view.parse()?;
            let listings = db.active_listings()?;
            let results = pipeline::run(&listings, &state);
            if json {
                println!("{}", serde_json::to_string_pretty(&results.listings)?);
            } else {
                print!("{}", render::render(&results.listings, results.total, view, Utc::now()));
            }
        }

        Commands::Browse { filters } => {
            db.ensure_initialized()?;
            tui::run_browse(&db, filters.to_state()?, settings.user.clone())?;
        }

        Commands::Show { id } => {
            db.ensure_initialized()?;
            match db.get_detail(id)? {
                Some(detail) => {
                    let job = &detail.listing;
                    println!("Job #{}", job.id);
                    println!("Title: {}", job.title);
                    println!("Company: {}", job.company);
                    println!("Location: {}", location_label(job));
                    println!("Type: {}", job.job_type);
                    println!("Category: {}", job.category);
                    println!("Salary: {}", format_salary(job.salary.min, job.salary.max));
                    println!("Status: {}", detail.status);
                    if job.urgent {
                        println!("Urgent hiring");
                    }
                    println!("Posted: {}", job.posted_at.format("%Y-%m-%d"));
                    if let Some(deadline) = detail.deadline {
                        println!("Deadline: {}", deadline);
                    }
                    println!("Applicants: {}", detail.applicants);
                    match detail.application.target() {
                        Some(target) => println!("Apply via {}: {}", detail.application.kind(), target),
                        None => println!("Apply via jobboard: jobboard apply {}", job.id),
                    }
                    if !job.description.is_empty() {
                        println!("\n--- Job Description ---\n{}", textwrap::fill(&job.description, 80));
                    }
                    if !job.requirements.is_empty() {
                        println!("\n--- Requirements ---");
                        for req in &job.requirements {
                            println!("  * {}", req);
                        }
                    }
                    if let Some(user) = user {
                        if db.is_bookmarked(job.id, user)? {
                            println!("\n(bookmarked)");
                        }
                    }
                }
                None => {
                    println!("Job #{} not found.", id);
                }
            }
        }

        Commands::Post {
            company,
            title,
            description,
            requirements,
            salary,
            location,
            deadline,
            apply,
            job_type,
            category,
            remote,
            urgent,
        } => {
            db.ensure_initialized()?;
            let form = JobPostingForm {
                company_name: company,
                job_title: title,
                description,
                requirements,
                salary,
                location,
                deadline,
                application_method: apply,
                job_type,
                category,
                remote,
                urgent,
            };
            let posting = form.validate(Utc::now()).map_err(BoardError::from)?;
            let id = submit_posting(&db, &posting)?;
            println!("Submitted job #{} for review.", id);
        }

        Commands::Apply { id } => {
            db.ensure_initialized()?;
            let listing = db.get_detail(id)?.ok_or(BoardError::ListingNotFound(id))?;
            match detail::apply(&db, &listing, user)? {
                ApplyOutcome::Submitted { application_id } => {
                    println!("Application submitted! (application #{})", application_id)
                }
                ApplyOutcome::Mailto(link) => println!("Apply by email:\n{}", link),
                ApplyOutcome::External(url) => println!("Apply on the employer's site:\n{}", url),
            }
        }

        Commands::Bookmark { id } => {
            db.ensure_initialized()?;
            if detail::bookmark(&db, id, user)? {
                println!("Job #{} saved to your bookmarks.", id);
            } else {
                println!("Job #{} removed from your bookmarks.", id);
            }
        }

        Commands::Dashboard { role, company } => {
            db.ensure_initialized()?;
            let dashboard = Dashboard::load(&db, role, user, company.as_deref())?;
            print!("{}", dashboard.render());
        }

        Commands::Moderate { command } => {
            db.ensure_initialized()?;
            let (id, action) = match command {
                ModerateCommands::Approve { id } => (id, ModerationAction::Approve),
                ModerateCommands::Reject { id } => (id, ModerationAction::Reject),
                ModerateCommands::Pause { id } => (id, ModerationAction::Pause),
                ModerateCommands::Resume { id } => (id, ModerationAction::Resume),
            };
            let previous = db.moderate(id, action)?;
            println!("Job #{}: {} -> {}", id, previous, action.target());
        }

        Commands::Review { id, status } => {
            db.ensure_initialized()?;
            let previous = db.set_application_status(id, status)?;
            println!("Application #{}: {} -> {}", id, previous, status);
        }

        Commands::Import { url } => {
            db.ensure_initialized()?;
            let url = url
                .or_else(|| settings.api_url.clone())
                .ok_or_else(|| anyhow!("No API URL. Pass --url or set api_url / JOBBOARD_API_URL."))?;
            println!("Fetching listings from {}...", url);
            let source = ListingSource::new(&url, settings.api_key.clone())?;
            let stats = source.import_into(&db)?;

            println!("\nResults:");
            println!("  Listings fetched:  {}", stats.fetched);
            println!("  Listings imported: {}", stats.imported);
            println!("  Listings updated:  {}", stats.updated);
            if stats.skipped > 0 {
                println!("  Skipped (invalid): {}", stats.skipped);
            }
        }
    }

    Ok(())
}
