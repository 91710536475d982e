//! Issue reporting - records problems at a pātaka for its kaitiaki.
//!
//! Reports are stored with status "Open". Delivering the notification email and
//! uploading the photo happen outside this crate; a report only carries the
//! photo's reference.

use crate::{
    core::location,
    entities::{Issue, issue},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Deserializer};
use tracing::{info, instrument};

/// An issue report as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    /// Pātaka the report is about
    #[serde(alias = "patakaId")]
    pub location_id: i64,
    /// What the reporter saw
    #[serde(default)]
    pub description: Option<String>,
    /// Reference to an already-uploaded photo
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Reporter's name
    #[serde(default)]
    pub reporter_name: Option<String>,
    /// Reporter's email
    #[serde(default)]
    pub reporter_email: Option<String>,
    /// Whether the reporter may be contacted
    #[serde(default, deserialize_with = "lenient_bool")]
    pub ok_to_contact: bool,
}

/// Form posts send checkboxes as strings or numbers as often as booleans.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Number(n) => n == 1,
        Flag::Text(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "y"
        ),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loose `local@domain.tld` shape check, no whitespace allowed.
#[must_use]
pub fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

impl NewIssue {
    /// Trims every text field and drops the blank ones.
    #[must_use]
    pub fn cleaned(self) -> Self {
        Self {
            location_id: self.location_id,
            description: non_blank(self.description),
            photo_url: non_blank(self.photo_url),
            reporter_name: non_blank(self.reporter_name),
            reporter_email: non_blank(self.reporter_email),
            ok_to_contact: self.ok_to_contact,
        }
    }

    /// Checks a cleaned report.
    ///
    /// # Errors
    /// [`Error::IncompleteReport`] without a description or photo, or
    /// [`Error::InvalidEmail`] for a malformed reporter email.
    pub fn validate(&self) -> Result<()> {
        if self.description.is_none() && self.photo_url.is_none() {
            return Err(Error::IncompleteReport);
        }
        if let Some(email) = self
            .reporter_email
            .as_ref()
            .filter(|email| !looks_like_email(email))
        {
            return Err(Error::InvalidEmail {
                email: email.clone(),
            });
        }
        Ok(())
    }
}

/// Stores an issue report with status "Open".
///
/// # Errors
/// - [`Error::IncompleteReport`] / [`Error::InvalidEmail`] for rejected input
/// - [`Error::LocationNotFound`] if the pātaka does not exist or is deleted
#[instrument(skip(db, report), fields(location_id = report.location_id))]
pub async fn report_issue<C>(db: &C, report: NewIssue) -> Result<issue::Model>
where
    C: ConnectionTrait,
{
    let report = report.cleaned();
    report.validate()?;
    let location = location::get_location(db, report.location_id).await?;

    let now = Utc::now();
    let stored = issue::ActiveModel {
        location_id: Set(location.id),
        description: Set(report.description),
        photo_url: Set(report.photo_url),
        reporter_name: Set(report.reporter_name),
        reporter_email: Set(report.reporter_email),
        ok_to_contact: Set(report.ok_to_contact),
        status: Set(issue::STATUS_OPEN.to_string()),
        is_test: Set(location.is_test),
        created_at: Set(now),
        last_updated: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(issue_id = stored.id, "Issue reported at {}", location.name);
    Ok(stored)
}

/// Retrieves a location's issue reports, newest first.
pub async fn get_issues_for_location<C>(db: &C, location_id: i64) -> Result<Vec<issue::Model>>
where
    C: ConnectionTrait,
{
    Issue::find()
        .filter(issue::Column::LocationId.eq(location_id))
        .order_by_desc(issue::Column::CreatedAt)
        .order_by_desc(issue::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
