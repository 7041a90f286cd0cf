use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Database not initialized. Run 'jobboard init' first.")]
    NotInitialized,

    #[error("Listing #{0} not found")]
    ListingNotFound(i64),

    #[error("You need to log in first (pass --user)")]
    LoginRequired,

    #[error("{user} has already applied to listing #{listing_id}")]
    AlreadyApplied { user: String, listing_id: i64 },

    #[error("Listing #{id} cannot move from {from} to {to}")]
    InvalidTransition { id: i64, from: String, to: String },

    #[error("Job #{id} is not accepting applications ({status})")]
    NotAcceptingApplications { id: i64, status: String },

    #[error("Application #{0} not found")]
    ApplicationNotFound(i64),

    #[error("Application #{id} cannot move from {from} to {to}")]
    InvalidApplicationTransition { id: i64, from: String, to: String },

    #[error("Invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Invalid posting: {0}")]
    InvalidPosting(#[from] PostingError),
}

/// First field that failed validation on the job posting form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostingError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("could not read salary '{0}' (try 7000000-10000000 or 7M - 10M)")]
    Salary(String),

    #[error("salary minimum {min} is above maximum {max}")]
    SalaryOrder { min: i64, max: i64 },

    #[error("unknown job type '{0}'")]
    JobType(String),

    #[error("deadline '{0}' is not a YYYY-MM-DD date")]
    Deadline(String),

    #[error("deadline {0} is in the past")]
    DeadlinePassed(String),

    #[error("application method '{0}' must be 'internal', an email address, or an http(s) URL")]
    ApplicationMethod(String),
}
