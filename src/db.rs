use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

use crate::error::BoardError;
use crate::models::{
    Application, ApplicationMethod, ApplicationStatus, JobListing, JobType, ListingDetail,
    ListingStatus, ModerationAction, NewListing, Salary,
};
use crate::sample::sample_listings;

const LISTING_COLUMNS: &str = "l.id, l.title, l.company, l.location, l.salary_min, l.salary_max,
     l.job_type, l.category, l.description, l.posted_at, l.remote, l.requirements, l.urgent";

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BoardStats {
    pub total_listings: i64,
    pub active_listings: i64,
    pub pending_listings: i64,
    pub employers: i64,
    pub applications: i64,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        tracing::debug!(path = %path.display(), "opened listing store");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn default_path() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobboard") {
            proj_dirs.data_dir().join("jobboard.db")
        } else {
            PathBuf::from("jobboard.db")
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                location TEXT NOT NULL,
                salary_min INTEGER NOT NULL,
                salary_max INTEGER NOT NULL,
                job_type TEXT NOT NULL CHECK (job_type IN ('Full-time', 'Part-time', 'Contract', 'Freelance', 'Internship')),
                category TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                posted_at TEXT NOT NULL,
                remote INTEGER NOT NULL DEFAULT 0,
                requirements TEXT NOT NULL DEFAULT '[]',
                urgent INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'active', 'paused', 'rejected')),
                deadline TEXT,
                apply_method TEXT NOT NULL DEFAULT 'internal' CHECK (apply_method IN ('internal', 'email', 'external')),
                apply_target TEXT,
                source_id INTEGER,
                CHECK (salary_min <= salary_max)
            );

            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                listing_id INTEGER NOT NULL REFERENCES listings(id),
                applicant TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'submitted' CHECK (status IN ('submitted', 'under-review', 'shortlisted', 'rejected')),
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (listing_id, applicant)
            );

            CREATE TABLE IF NOT EXISTS bookmarks (
                listing_id INTEGER NOT NULL REFERENCES listings(id),
                user TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (listing_id, user)
            );

            CREATE INDEX IF NOT EXISTS idx_listings_status ON listings(status);
            CREATE INDEX IF NOT EXISTS idx_listings_company ON listings(company);
            CREATE INDEX IF NOT EXISTS idx_applications_applicant ON applications(applicant);
            "#,
        )?;
        self.migrate()?;
        tracing::info!(path = %self.path.display(), "listing store initialized");
        Ok(())
    }

    /// Brings stores created by older builds up to the current schema.
    fn migrate(&self) -> Result<()> {
        let has_source: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info('listings') WHERE name = 'source_id'",
            [],
            |row| row.get(0),
        )?;
        if has_source == 0 {
            self.conn.execute_batch("ALTER TABLE listings ADD COLUMN source_id INTEGER;")?;
            tracing::info!("added listings.source_id");
        }
        self.conn.execute_batch(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_listings_source ON listings(source_id);",
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='listings'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(BoardError::NotInitialized.into());
        }
        Ok(())
    }

    /// Loads the demo listings as active. Returns how many were added.
    pub fn seed_sample(&self) -> Result<usize> {
        let mut added = 0;
        for listing in sample_listings() {
            self.add_listing(&listing.into(), ListingStatus::Active)?;
            added += 1;
        }
        Ok(added)
    }

    // --- Listing operations ---

    pub fn add_listing(&self, listing: &NewListing, status: ListingStatus) -> Result<i64> {
        self.insert_listing(listing, status, None)
    }

    fn insert_listing(&self, listing: &NewListing, status: ListingStatus, source_id: Option<i64>) -> Result<i64> {
        if !listing.salary.is_valid() {
            return Err(anyhow!(
                "Salary minimum {} is above maximum {}",
                listing.salary.min,
                listing.salary.max
            ));
        }
        let requirements = serde_json::to_string(&listing.requirements)?;
        self.conn.execute(
            "INSERT INTO listings (title, company, location, salary_min, salary_max, job_type,
                                   category, description, posted_at, remote, requirements, urgent,
                                   status, deadline, apply_method, apply_target, source_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                listing.title,
                listing.company,
                listing.location,
                listing.salary.min,
                listing.salary.max,
                listing.job_type.as_str(),
                listing.category,
                listing.description,
                listing.posted_at.to_rfc3339(),
                listing.remote,
                requirements,
                listing.urgent,
                status.as_str(),
                listing.deadline.map(|d| d.to_string()),
                listing.application.kind(),
                listing.application.target(),
                source_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Upserts listings pulled from a remote source, keyed on the source's id,
    /// in one transaction. New rows go live as active; rows already present keep
    /// their moderation status. Returns `(added, updated)`.
    pub fn upsert_imported(&self, listings: &[(i64, NewListing)]) -> Result<(usize, usize)> {
        let tx = self.conn.unchecked_transaction()?;
        let mut added = 0;
        let mut updated = 0;
        for (source_id, listing) in listings {
            let existing: Option<i64> = tx
                .query_row("SELECT id FROM listings WHERE source_id = ?1", [source_id], |row| row.get(0))
                .optional()?;
            match existing {
                Some(id) => {
                    let requirements = serde_json::to_string(&listing.requirements)?;
                    tx.execute(
                        "UPDATE listings SET title = ?1, company = ?2, location = ?3, salary_min = ?4,
                                salary_max = ?5, job_type = ?6, category = ?7, description = ?8,
                                posted_at = ?9, remote = ?10, requirements = ?11, urgent = ?12
                         WHERE id = ?13",
                        params![
                            listing.title,
                            listing.company,
                            listing.location,
                            listing.salary.min,
                            listing.salary.max,
                            listing.job_type.as_str(),
                            listing.category,
                            listing.description,
                            listing.posted_at.to_rfc3339(),
                            listing.remote,
                            requirements,
                            listing.urgent,
                            id,
                        ],
                    )?;
                    updated += 1;
                }
                None => {
                    self.insert_listing(listing, ListingStatus::Active, Some(*source_id))?;
                    added += 1;
                }
            }
        }
        tx.commit()?;
        Ok((added, updated))
    }

    /// Listings in insertion order, optionally restricted to one status.
    pub fn list_listings(&self, status: Option<ListingStatus>) -> Result<Vec<JobListing>> {
        let mut sql = format!("SELECT {} FROM listings l", LISTING_COLUMNS);
        if status.is_some() {
            sql.push_str(" WHERE l.status = ?1");
        }
        sql.push_str(" ORDER BY l.id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = if let Some(s) = status {
            stmt.query_map([s.as_str()], Self::row_to_listing)?
        } else {
            stmt.query_map([], Self::row_to_listing)?
        };

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list listings")
    }

    /// The browsable candidate set.
    pub fn active_listings(&self) -> Result<Vec<JobListing>> {
        self.list_listings(Some(ListingStatus::Active))
    }

    pub fn listings_for_company(&self, company: &str) -> Result<Vec<(JobListing, ListingStatus, i64)>> {
        let sql = format!(
            "SELECT {}, l.status,
                    (SELECT COUNT(*) FROM applications a WHERE a.listing_id = l.id)
             FROM listings l
             WHERE LOWER(l.company) = LOWER(?1)
             ORDER BY l.id DESC",
            LISTING_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([company], |row| {
            let applicants: i64 = row.get(14)?;
            Ok((Self::row_to_listing(row)?, status_at(row, 13)?, applicants))
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list company listings")
    }

    pub fn get_listing(&self, id: i64) -> Result<Option<JobListing>> {
        let sql = format!("SELECT {} FROM listings l WHERE l.id = ?1", LISTING_COLUMNS);
        self.conn
            .query_row(&sql, [id], Self::row_to_listing)
            .optional()
            .context("Failed to load listing")
    }

    pub fn get_detail(&self, id: i64) -> Result<Option<ListingDetail>> {
        let sql = format!(
            "SELECT {}, l.status, l.deadline, l.apply_method, l.apply_target,
                    (SELECT COUNT(*) FROM applications a WHERE a.listing_id = l.id)
             FROM listings l WHERE l.id = ?1",
            LISTING_COLUMNS
        );
        self.conn
            .query_row(&sql, [id], |row| {
                let deadline: Option<String> = row.get(14)?;
                let deadline = deadline
                    .map(|d| d.parse::<NaiveDate>())
                    .transpose()
                    .map_err(|e| conversion_error(14, e))?;
                let kind: String = row.get(15)?;
                let application = ApplicationMethod::from_parts(&kind, row.get(16)?)
                    .map_err(|e| conversion_error(15, e))?;
                Ok(ListingDetail {
                    listing: Self::row_to_listing(row)?,
                    status: status_at(row, 13)?,
                    deadline,
                    application,
                    applicants: row.get(17)?,
                })
            })
            .optional()
            .context("Failed to load listing detail")
    }

    pub fn get_status(&self, id: i64) -> Result<ListingStatus> {
        self.conn
            .query_row("SELECT status FROM listings WHERE id = ?1", [id], |row| status_at(row, 0))
            .optional()?
            .ok_or_else(|| BoardError::ListingNotFound(id).into())
    }

    /// Applies a moderation command, which only succeeds from its own source states.
    pub fn moderate(&self, id: i64, action: ModerationAction) -> Result<ListingStatus> {
        self.set_status_from(id, action.allowed_from(), action.target())
    }

    /// Moves a listing to `next` only if it is currently in one of `expected`.
    pub fn set_status_from(&self, id: i64, expected: &[ListingStatus], next: ListingStatus) -> Result<ListingStatus> {
        let current = self.get_status(id)?;
        if !expected.contains(&current) {
            return Err(BoardError::InvalidTransition {
                id,
                from: current.to_string(),
                to: next.to_string(),
            }
            .into());
        }
        self.set_status(id, next)
    }

    /// Moves a listing to `next` if the moderation rules allow it.
    pub fn set_status(&self, id: i64, next: ListingStatus) -> Result<ListingStatus> {
        let current = self.get_status(id)?;
        if !current.can_become(next) {
            return Err(BoardError::InvalidTransition {
                id,
                from: current.to_string(),
                to: next.to_string(),
            }
            .into());
        }
        self.conn.execute(
            "UPDATE listings SET status = ?1 WHERE id = ?2",
            params![next.as_str(), id],
        )?;
        tracing::info!(listing = id, from = %current, to = %next, "listing status changed");
        Ok(current)
    }

    fn row_to_listing(row: &rusqlite::Row) -> rusqlite::Result<JobListing> {
        let job_type: String = row.get(6)?;
        let posted_at: String = row.get(9)?;
        let requirements: String = row.get(11)?;
        Ok(JobListing {
            id: row.get(0)?,
            title: row.get(1)?,
            company: row.get(2)?,
            location: row.get(3)?,
            salary: Salary::new(row.get(4)?, row.get(5)?),
            job_type: job_type
                .parse::<JobType>()
                .map_err(|e| conversion_error(6, e))?,
            category: row.get(7)?,
            description: row.get(8)?,
            posted_at: DateTime::parse_from_rfc3339(&posted_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| conversion_error(9, e))?,
            remote: row.get(10)?,
            requirements: serde_json::from_str(&requirements).map_err(|e| conversion_error(11, e))?,
            urgent: row.get(12)?,
        })
    }

    // --- Application and bookmark operations ---

    pub fn apply(&self, listing_id: i64, applicant: &str) -> Result<i64> {
        if self.get_listing(listing_id)?.is_none() {
            return Err(BoardError::ListingNotFound(listing_id).into());
        }
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO applications (listing_id, applicant) VALUES (?1, ?2)",
            params![listing_id, applicant],
        )?;
        if inserted == 0 {
            return Err(BoardError::AlreadyApplied {
                user: applicant.to_string(),
                listing_id,
            }
            .into());
        }
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_applications(&self, applicant: &str) -> Result<Vec<(Application, JobListing)>> {
        let sql = format!(
            "SELECT {}, a.id, a.listing_id, a.applicant, a.status, a.applied_at
             FROM applications a
             JOIN listings l ON a.listing_id = l.id
             WHERE a.applicant = ?1
             ORDER BY a.id DESC",
            LISTING_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([applicant], |row| {
            Ok((
                Application {
                    id: row.get(13)?,
                    listing_id: row.get(14)?,
                    applicant: row.get(15)?,
                    status: application_status_at(row, 16)?,
                    applied_at: row.get(17)?,
                },
                Self::row_to_listing(row)?,
            ))
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list applications")
    }

    /// Applications received by a company's listings, newest first.
    pub fn applications_for_company(&self, company: &str) -> Result<Vec<(Application, JobListing)>> {
        let sql = format!(
            "SELECT {}, a.id, a.listing_id, a.applicant, a.status, a.applied_at
             FROM applications a
             JOIN listings l ON a.listing_id = l.id
             WHERE LOWER(l.company) = LOWER(?1)
             ORDER BY a.id DESC",
            LISTING_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([company], |row| {
            Ok((
                Application {
                    id: row.get(13)?,
                    listing_id: row.get(14)?,
                    applicant: row.get(15)?,
                    status: application_status_at(row, 16)?,
                    applied_at: row.get(17)?,
                },
                Self::row_to_listing(row)?,
            ))
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list company applications")
    }

    /// Moves an application along the review process; returns the previous status.
    pub fn set_application_status(&self, id: i64, next: ApplicationStatus) -> Result<ApplicationStatus> {
        let current = self
            .conn
            .query_row("SELECT status FROM applications WHERE id = ?1", [id], |row| {
                application_status_at(row, 0)
            })
            .optional()?
            .ok_or(BoardError::ApplicationNotFound(id))?;
        if !current.can_become(next) {
            return Err(BoardError::InvalidApplicationTransition {
                id,
                from: current.to_string(),
                to: next.to_string(),
            }
            .into());
        }
        self.conn.execute(
            "UPDATE applications SET status = ?1 WHERE id = ?2",
            params![next.as_str(), id],
        )?;
        tracing::info!(application = id, from = %current, to = %next, "application status changed");
        Ok(current)
    }

    /// Flips the bookmark; returns whether the listing is now bookmarked.
    pub fn toggle_bookmark(&self, listing_id: i64, user: &str) -> Result<bool> {
        if self.get_listing(listing_id)?.is_none() {
            return Err(BoardError::ListingNotFound(listing_id).into());
        }
        let removed = self.conn.execute(
            "DELETE FROM bookmarks WHERE listing_id = ?1 AND user = ?2",
            params![listing_id, user],
        )?;
        if removed > 0 {
            return Ok(false);
        }
        self.conn.execute(
            "INSERT INTO bookmarks (listing_id, user) VALUES (?1, ?2)",
            params![listing_id, user],
        )?;
        Ok(true)
    }

    pub fn is_bookmarked(&self, listing_id: i64, user: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bookmarks WHERE listing_id = ?1 AND user = ?2",
            params![listing_id, user],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn list_bookmarks(&self, user: &str) -> Result<Vec<JobListing>> {
        let sql = format!(
            "SELECT {} FROM bookmarks b
             JOIN listings l ON b.listing_id = l.id
             WHERE b.user = ?1
             ORDER BY b.created_at DESC, l.id DESC",
            LISTING_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user], Self::row_to_listing)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list bookmarks")
    }

    pub fn stats(&self) -> Result<BoardStats> {
        self.conn
            .query_row(
                "SELECT
                    (SELECT COUNT(*) FROM listings),
                    (SELECT COUNT(*) FROM listings WHERE status = 'active'),
                    (SELECT COUNT(*) FROM listings WHERE status = 'pending'),
                    (SELECT COUNT(DISTINCT LOWER(company)) FROM listings),
                    (SELECT COUNT(*) FROM applications)",
                [],
                |row| {
                    Ok(BoardStats {
                        total_listings: row.get(0)?,
                        active_listings: row.get(1)?,
                        pending_listings: row.get(2)?,
                        employers: row.get(3)?,
                        applications: row.get(4)?,
                    })
                },
            )
            .context("Failed to compute board stats")
    }
}

fn status_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<ListingStatus> {
    let status: String = row.get(idx)?;
    status.parse().map_err(|e| conversion_error(idx, e))
}

fn application_status_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<ApplicationStatus> {
    let status: String = row.get(idx)?;
    status.parse().map_err(|e| conversion_error(idx, e))
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}
