//! Client session state - the donate, take and report wizards as explicit state
//! machines.
//!
//! A [`Session`] owns everything a single client visit needs: the cupboard listing
//! it loaded and the [`Workflow`] in progress. Steps advance only through the
//! transition methods; an out-of-order step is rejected and leaves the state as it
//! was.

use crate::{
    core::{
        inventory::InventoryLine,
        issue::NewIssue,
        report::CupboardSummary,
        transaction::{Submission, SubmittedItem},
    },
    entities::TransactionType,
    errors::{Error, Result},
};

/// Which wizard a workflow drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Leave food at a pātaka
    Donate,
    /// Take food from a pātaka
    Take,
    /// Report a problem at a pātaka
    Report,
}

impl Action {
    /// Ledger effect of completing this action, `None` for reports.
    #[must_use]
    pub const fn transaction_type(self) -> Option<TransactionType> {
        match self {
            Self::Donate => Some(TransactionType::Donation),
            Self::Take => Some(TransactionType::Collection),
            Self::Report => None,
        }
    }
}

/// What a reporter fills in on the details step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueDetails {
    /// What the reporter saw
    pub description: Option<String>,
    /// Reporter's name
    pub reporter_name: Option<String>,
    /// Reporter's email
    pub reporter_email: Option<String>,
    /// Whether the reporter may be contacted
    pub ok_to_contact: bool,
}

/// Wizard progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    /// Nothing chosen yet
    Idle,
    /// A pātaka was scanned or picked
    LocationSelected {
        /// Chosen pātaka
        location_id: i64,
    },
    /// A photo was taken, or the photo step was skipped
    PhotoCaptured {
        /// Chosen pātaka
        location_id: i64,
        /// Uploaded photo reference, `None` when skipped
        photo_url: Option<String>,
    },
    /// The item list was confirmed
    ItemsConfirmed {
        /// Chosen pātaka
        location_id: i64,
        /// Uploaded photo reference
        photo_url: Option<String>,
        /// Items with final quantities
        items: Vec<SubmittedItem>,
    },
    /// The submission was handed off
    Submitted {
        /// What was sent
        submission: Submission,
    },
    /// The issue details were filled in and checked
    IssueDescribed {
        /// Report ready to send
        issue: NewIssue,
    },
    /// The issue report was handed off
    Reported {
        /// What was sent
        issue: NewIssue,
    },
}

impl WorkflowState {
    /// Short state name used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LocationSelected { .. } => "location selected",
            Self::PhotoCaptured { .. } => "photo captured",
            Self::ItemsConfirmed { .. } => "items confirmed",
            Self::Submitted { .. } => "submitted",
            Self::IssueDescribed { .. } => "issue described",
            Self::Reported { .. } => "reported",
        }
    }
}

/// One run through the donate, take or report wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    action: Action,
    state: WorkflowState,
}

impl Workflow {
    /// Starts a new wizard in [`WorkflowState::Idle`].
    #[must_use]
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            state: WorkflowState::Idle,
        }
    }

    /// The wizard being driven.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Current step.
    #[must_use]
    pub const fn state(&self) -> &WorkflowState {
        &self.state
    }

    const fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            from: self.state.name(),
            action,
        }
    }

    /// Chooses the pātaka. Allowed from idle, or to change a previous choice.
    pub fn select_location(&mut self, location_id: i64) -> Result<()> {
        match self.state {
            WorkflowState::Idle | WorkflowState::LocationSelected { .. } => {
                self.state = WorkflowState::LocationSelected { location_id };
                Ok(())
            }
            _ => Err(self.invalid("select location")),
        }
    }

    /// Records the photo step. `None` means the user skipped the photo.
    pub fn capture_photo(&mut self, photo_url: Option<String>) -> Result<()> {
        match self.state {
            WorkflowState::LocationSelected { location_id } => {
                self.state = WorkflowState::PhotoCaptured {
                    location_id,
                    photo_url,
                };
                Ok(())
            }
            _ => Err(self.invalid("capture photo")),
        }
    }

    /// Confirms the item list.
    ///
    /// Donations need at least one unit of every named item. Takes clamp each
    /// listed item to what `available` shows on the shelf and drop lines that end
    /// up at zero; items not in `available` keep their requested quantity and are
    /// checked again when the collection posts.
    ///
    /// # Errors
    /// [`Error::InvalidQuantity`] for a donated line below one unit,
    /// [`Error::EmptySubmission`] if nothing is left after cleaning, or
    /// [`Error::InvalidTransition`] outside the photo step.
    pub fn confirm_items(
        &mut self,
        items: Vec<SubmittedItem>,
        available: &[InventoryLine],
    ) -> Result<()> {
        let (location_id, photo_url) = match &self.state {
            WorkflowState::PhotoCaptured {
                location_id,
                photo_url,
            } => (*location_id, photo_url.clone()),
            _ => return Err(self.invalid("confirm items")),
        };
        if self.action == Action::Report {
            return Err(self.invalid("confirm items"));
        }

        let mut cleaned = Vec::with_capacity(items.len());
        for mut item in items {
            if item.name.trim().is_empty() {
                continue;
            }
            match self.action {
                Action::Donate if item.quantity < 1 => {
                    return Err(Error::InvalidQuantity {
                        quantity: item.quantity,
                    });
                }
                Action::Donate | Action::Report => {}
                Action::Take => item.quantity = clamp_to_available(&item, available),
            }
            if item.quantity > 0 {
                cleaned.push(item);
            }
        }
        if cleaned.is_empty() {
            return Err(Error::EmptySubmission);
        }

        self.state = WorkflowState::ItemsConfirmed {
            location_id,
            photo_url,
            items: cleaned,
        };
        Ok(())
    }

    /// Finishes the wizard and returns the submission to post.
    pub fn submit(&mut self, comment: Option<String>) -> Result<Submission> {
        let submission = match (&self.state, self.action.transaction_type()) {
            (
                WorkflowState::ItemsConfirmed {
                    location_id,
                    photo_url,
                    items,
                },
                Some(transaction_type),
            ) => Submission {
                location_id: *location_id,
                transaction_type,
                items: items.clone(),
                comment: comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
                photo_url: photo_url.clone(),
            },
            _ => return Err(self.invalid("submit")),
        };
        self.state = WorkflowState::Submitted {
            submission: submission.clone(),
        };
        Ok(submission)
    }

    /// Fills in the report details. Only the report wizard has this step.
    ///
    /// # Errors
    /// [`Error::IncompleteReport`] when neither the details nor the earlier photo
    /// step supplied anything to report, [`Error::InvalidEmail`] for a malformed
    /// address, or [`Error::InvalidTransition`] outside the photo step.
    pub fn describe_issue(&mut self, details: IssueDetails) -> Result<()> {
        let issue = match (&self.state, self.action) {
            (
                WorkflowState::PhotoCaptured {
                    location_id,
                    photo_url,
                },
                Action::Report,
            ) => NewIssue {
                location_id: *location_id,
                description: details.description,
                photo_url: photo_url.clone(),
                reporter_name: details.reporter_name,
                reporter_email: details.reporter_email,
                ok_to_contact: details.ok_to_contact,
            }
            .cleaned(),
            _ => return Err(self.invalid("describe issue")),
        };
        issue.validate()?;
        self.state = WorkflowState::IssueDescribed { issue };
        Ok(())
    }

    /// Finishes the report wizard and returns the report to store.
    pub fn submit_report(&mut self) -> Result<NewIssue> {
        let issue = match &self.state {
            WorkflowState::IssueDescribed { issue } => issue.clone(),
            _ => return Err(self.invalid("submit report")),
        };
        self.state = WorkflowState::Reported {
            issue: issue.clone(),
        };
        Ok(issue)
    }

    /// Abandons or restarts the wizard.
    pub fn reset(&mut self) {
        self.state = WorkflowState::Idle;
    }
}

fn clamp_to_available(item: &SubmittedItem, available: &[InventoryLine]) -> i64 {
    let wanted = item.name.trim().to_lowercase();
    available
        .iter()
        .find(|line| line.name.to_lowercase() == wanted)
        .map_or(item.quantity.max(0), |line| item.quantity.clamp(0, line.quantity.max(0)))
}

/// Reads a pātaka id from scanned QR text of the form `Pataka 12`.
#[must_use]
pub fn parse_qr_payload(text: &str) -> Option<i64> {
    let mut parts = text.split_whitespace();
    let label = parts.next()?;
    let id = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let label = label.to_lowercase();
    if label != "pataka" && label != "pātaka" {
        return None;
    }
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}

/// State owned by one client visit.
#[derive(Debug, Clone, Default)]
pub struct Session {
    cupboards: Vec<CupboardSummary>,
    workflow: Option<Workflow>,
}

impl Session {
    /// Starts a session over a loaded cupboard listing.
    #[must_use]
    pub const fn new(cupboards: Vec<CupboardSummary>) -> Self {
        Self {
            cupboards,
            workflow: None,
        }
    }

    /// Every loaded cupboard.
    #[must_use]
    pub fn cupboards(&self) -> &[CupboardSummary] {
        &self.cupboards
    }

    /// Replaces the listing after a refresh.
    pub fn replace_cupboards(&mut self, cupboards: Vec<CupboardSummary>) {
        self.cupboards = cupboards;
    }

    /// Cupboards whose name, address or any item name contains `term`,
    /// case-insensitively. A blank term matches everything.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&CupboardSummary> {
        let term = term.trim().to_lowercase();
        self.cupboards
            .iter()
            .filter(|c| {
                term.is_empty()
                    || c.name.to_lowercase().contains(&term)
                    || c.address.to_lowercase().contains(&term)
                    || c.inventory
                        .iter()
                        .any(|line| line.name.to_lowercase().contains(&term))
            })
            .collect()
    }

    /// Looks up a loaded cupboard by id.
    #[must_use]
    pub fn cupboard(&self, location_id: i64) -> Option<&CupboardSummary> {
        self.cupboards.iter().find(|c| c.id == location_id)
    }

    /// Starts a wizard, replacing any wizard in progress.
    pub fn begin(&mut self, action: Action) -> &mut Workflow {
        self.workflow.insert(Workflow::new(action))
    }

    /// The wizard in progress, if any.
    #[must_use]
    pub const fn workflow(&self) -> Option<&Workflow> {
        self.workflow.as_ref()
    }

    fn workflow_mut(&mut self, action: &'static str) -> Result<&mut Workflow> {
        self.workflow.as_mut().ok_or(Error::InvalidTransition {
            from: WorkflowState::Idle.name(),
            action,
        })
    }

    /// Selects a cupboard in the running wizard.
    ///
    /// # Errors
    /// [`Error::LocationNotFound`] if the id is not in the loaded listing.
    pub fn select_cupboard(&mut self, location_id: i64) -> Result<()> {
        if self.cupboard(location_id).is_none() {
            return Err(Error::LocationNotFound { id: location_id });
        }
        self.workflow_mut("select location")?
            .select_location(location_id)
    }

    /// Selects the cupboard named by scanned QR text.
    ///
    /// # Errors
    /// [`Error::InvalidQrCode`] for text that is not a pātaka code, otherwise as
    /// [`Session::select_cupboard`].
    pub fn select_from_qr(&mut self, text: &str) -> Result<()> {
        let location_id = parse_qr_payload(text).ok_or_else(|| Error::InvalidQrCode {
            text: text.trim().to_string(),
        })?;
        self.select_cupboard(location_id)
    }

    /// Confirms items, clamping takes against the selected cupboard's listing.
    pub fn confirm_items(&mut self, items: Vec<SubmittedItem>) -> Result<()> {
        let selected = match self.workflow.as_ref().map(Workflow::state) {
            Some(WorkflowState::PhotoCaptured { location_id, .. }) => Some(*location_id),
            _ => None,
        };
        let available = selected
            .and_then(|id| self.cupboards.iter().find(|c| c.id == id))
            .map(|c| c.inventory.clone())
            .unwrap_or_default();
        self.workflow_mut("confirm items")?
            .confirm_items(items, &available)
    }

    /// Records the photo step of the running wizard.
    pub fn capture_photo(&mut self, photo_url: Option<String>) -> Result<()> {
        self.workflow_mut("capture photo")?.capture_photo(photo_url)
    }

    /// Fills in the details step of the running report wizard.
    pub fn describe_issue(&mut self, details: IssueDetails) -> Result<()> {
        self.workflow_mut("describe issue")?.describe_issue(details)
    }

    /// Finishes the running donate or take wizard.
    pub fn submit(&mut self, comment: Option<String>) -> Result<Submission> {
        self.workflow_mut("submit")?.submit(comment)
    }

    /// Finishes the running report wizard.
    pub fn submit_report(&mut self) -> Result<NewIssue> {
        self.workflow_mut("submit report")?.submit_report()
    }

    /// Drops the running wizard.
    pub fn cancel(&mut self) {
        self.workflow = None;
    }
}
