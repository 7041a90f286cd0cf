use anyhow::Result;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::db::Database;
use crate::error::BoardError;
use crate::models::{ApplicationMethod, ListingDetail, ListingStatus};

/// What happened when a user pressed "Apply Now".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Recorded in the store.
    Submitted { application_id: i64 },
    /// The employer takes applications by email; open this link.
    Mailto(String),
    /// The employer takes applications on their own site.
    External(String),
}

/// Characters escaped in mailto headers; unreserved URI characters pass through.
const MAILTO: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

pub fn mailto_link(address: &str, title: &str, company: &str) -> String {
    let subject = format!("Application for {}", title);
    let body = format!(
        "Dear Hiring Manager,\r\n\r\nI am interested in applying for the {} position at {}.",
        title, company
    );
    format!(
        "mailto:{}?subject={}&body={}",
        address,
        utf8_percent_encode(&subject, MAILTO),
        utf8_percent_encode(&body, MAILTO)
    )
}

/// Applies `user` to the listing. Anonymous visitors must log in first, and
/// only active listings take applications.
pub fn apply(db: &Database, detail: &ListingDetail, user: Option<&str>) -> Result<ApplyOutcome> {
    let user = user.ok_or(BoardError::LoginRequired)?;
    let listing = &detail.listing;
    if detail.status != ListingStatus::Active {
        return Err(BoardError::NotAcceptingApplications {
            id: listing.id,
            status: detail.status.to_string(),
        }
        .into());
    }
    let outcome = match &detail.application {
        ApplicationMethod::Internal => ApplyOutcome::Submitted {
            application_id: db.apply(listing.id, user)?,
        },
        ApplicationMethod::Email(address) => {
            ApplyOutcome::Mailto(mailto_link(address, &listing.title, &listing.company))
        }
        ApplicationMethod::External(url) => ApplyOutcome::External(url.clone()),
    };
    tracing::info!(listing = listing.id, user, method = detail.application.kind(), "apply");
    Ok(outcome)
}

/// Toggles a bookmark for `user`; returns whether it is now saved.
pub fn bookmark(db: &Database, listing_id: i64, user: Option<&str>) -> Result<bool> {
    let user = user.ok_or(BoardError::LoginRequired)?;
    db.toggle_bookmark(listing_id, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModerationAction, NewListing};
    use crate::sample::sample_listings;

    fn store_with(application: ApplicationMethod) -> (Database, ListingDetail) {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        let mut listing: NewListing = sample_listings().remove(4).into();
        listing.application = application;
        let id = db.add_listing(&listing, ListingStatus::Active).unwrap();
        let detail = db.get_detail(id).unwrap().unwrap();
        (db, detail)
    }

    #[test]
    fn anonymous_apply_requires_login() {
        let (db, detail) = store_with(ApplicationMethod::Internal);
        let err = apply(&db, &detail, None).unwrap_err();
        assert!(matches!(err.downcast_ref::<BoardError>(), Some(BoardError::LoginRequired)));
    }

    #[test]
    fn internal_apply_is_recorded_once() {
        let (db, detail) = store_with(ApplicationMethod::Internal);
        let first = apply(&db, &detail, Some("amina")).unwrap();
        assert!(matches!(first, ApplyOutcome::Submitted { .. }));

        let again = apply(&db, &detail, Some("amina")).unwrap_err();
        assert!(matches!(
            again.downcast_ref::<BoardError>(),
            Some(BoardError::AlreadyApplied { .. })
        ));
        assert_eq!(db.get_detail(detail.listing.id).unwrap().unwrap().applicants, 1);
    }

    #[test]
    fn paused_or_pending_listings_refuse_applications() {
        let (db, detail) = store_with(ApplicationMethod::Internal);
        let id = detail.listing.id;
        db.moderate(id, ModerationAction::Pause).unwrap();
        let paused = db.get_detail(id).unwrap().unwrap();
        let err = apply(&db, &paused, Some("amina")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BoardError>(),
            Some(BoardError::NotAcceptingApplications { status, .. }) if status == "paused"
        ));

        let listing: NewListing = sample_listings().remove(0).into();
        let pending_id = db.add_listing(&listing, ListingStatus::Pending).unwrap();
        let pending = db.get_detail(pending_id).unwrap().unwrap();
        assert!(apply(&db, &pending, Some("amina")).is_err());
        assert!(db.list_applications("amina").unwrap().is_empty());
    }

    #[test]
    fn mailto_escapes_non_ascii_and_reserved() {
        let link = mailto_link("hr@azam.co.tz", "Mhasibu & Mkaguzi", "Azam Café");
        assert!(link.contains("subject=Application%20for%20Mhasibu%20%26%20Mkaguzi&"));
        assert!(link.contains("Azam%20Caf%C3%A9."));
        assert!(link.contains("%0D%0A%0D%0A"));
    }

    #[test]
    fn email_apply_builds_mailto() {
        let (db, detail) = store_with(ApplicationMethod::Email("jobs@selcom.net".to_string()));
        let ApplyOutcome::Mailto(link) = apply(&db, &detail, Some("amina")).unwrap() else {
            panic!("expected mailto");
        };
        assert!(link.starts_with("mailto:jobs@selcom.net?subject=Application%20for%20Frontend%20Developer"));
        assert!(link.contains("position%20at%20Selcom."));
    }

    #[test]
    fn bookmark_toggles() {
        let (db, detail) = store_with(ApplicationMethod::Internal);
        let id = detail.listing.id;
        assert!(bookmark(&db, id, None).is_err());
        assert!(bookmark(&db, id, Some("amina")).unwrap());
        assert!(db.is_bookmarked(id, "amina").unwrap());
        assert!(!bookmark(&db, id, Some("amina")).unwrap());
    }
}
