//! Issue entity - problems reported at a pātaka for its kaitiaki to follow up.
//!
//! A report carries a description, a photo reference or both. Reporter contact
//! details are optional.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status every new report starts in.
pub const STATUS_OPEN: &str = "Open";

/// Issue database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Pātaka the report is about
    pub location_id: i64,
    /// What the reporter saw
    pub description: Option<String>,
    /// Reference to an uploaded photo
    pub photo_url: Option<String>,
    /// Reporter's name, if given
    pub reporter_name: Option<String>,
    /// Reporter's email, if given
    pub reporter_email: Option<String>,
    /// Whether the reporter agreed to be contacted
    pub ok_to_contact: bool,
    /// Workflow status, "Open" on creation
    pub status: String,
    /// Copied from the location when reported
    pub is_test: bool,
    /// When the report was made
    pub created_at: DateTimeUtc,
    /// When the report last changed
    pub last_updated: DateTimeUtc,
}

/// Defines relationships between `Issue` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each issue belongs to one location
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
