//! Location business logic - lookups and geography for pātaka.
//!
//! Locations are long-lived reference data. Lookups here treat a soft-deleted
//! location exactly like a missing one.

use crate::{
    entities::{Location, location},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*, sea_query::Expr};

/// Mean Earth radius used for haversine distances.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl From<&location::Model> for Coordinates {
    fn from(location: &location::Model) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// Fields needed to provision a new pātaka.
#[derive(Debug, Clone, Default)]
pub struct NewLocation {
    /// Display name
    pub name: String,
    /// First address line
    pub address_line1: String,
    /// Second address line
    pub address_line2: Option<String>,
    /// Suburb
    pub suburb: Option<String>,
    /// City
    pub city: Option<String>,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Whether the location only holds test data
    pub is_test: bool,
}

/// Finds a live location by id.
///
/// # Errors
/// Returns [`Error::LocationNotFound`] when no row exists or the row is soft-deleted.
pub async fn get_location<C>(db: &C, location_id: i64) -> Result<location::Model>
where
    C: ConnectionTrait,
{
    Location::find_by_id(location_id)
        .one(db)
        .await?
        .filter(|l| !l.is_deleted)
        .ok_or(Error::LocationNotFound { id: location_id })
}

/// Lists live locations ordered by name. Test locations are included only on request.
pub async fn list_locations<C>(db: &C, include_test: bool) -> Result<Vec<location::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Location::find().filter(location::Column::IsDeleted.eq(false));
    if !include_test {
        query = query.filter(location::Column::IsTest.eq(false));
    }
    query
        .order_by_asc(location::Column::Name)
        .order_by_asc(location::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Provisions a new location.
///
/// # Errors
/// Returns [`Error::Config`] when the name or first address line is blank or the
/// coordinates are out of range.
pub async fn create_location<C>(db: &C, new: NewLocation) -> Result<location::Model>
where
    C: ConnectionTrait,
{
    if new.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Location name cannot be empty".to_string(),
        });
    }
    if new.address_line1.trim().is_empty() {
        return Err(Error::Config {
            message: "Location address cannot be empty".to_string(),
        });
    }
    if !(-90.0..=90.0).contains(&new.latitude) || !(-180.0..=180.0).contains(&new.longitude) {
        return Err(Error::Config {
            message: format!(
                "Coordinates out of range: {}, {}",
                new.latitude, new.longitude
            ),
        });
    }

    let model = location::ActiveModel {
        name: Set(new.name.trim().to_string()),
        address_line1: Set(new.address_line1.trim().to_string()),
        address_line2: Set(new.address_line2),
        suburb: Set(new.suburb),
        city: Set(new.city),
        latitude: Set(new.latitude),
        longitude: Set(new.longitude),
        is_test: Set(new.is_test),
        is_deleted: Set(false),
        last_updated: Set(Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Moves a location's `last_updated` forward after a transaction posts.
pub(crate) async fn touch_last_updated<C>(
    db: &C,
    location_id: i64,
    at: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    Location::update_many()
        .col_expr(location::Column::LastUpdated, Expr::value(at))
        .filter(location::Column::Id.eq(location_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Joins the address parts that are present with ", ".
#[must_use]
pub fn format_address(location: &location::Model) -> String {
    std::iter::once(Some(location.address_line1.as_str()))
        .chain([
            location.address_line2.as_deref(),
            location.suburb.as_deref(),
            location.city.as_deref(),
        ])
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Great-circle distance between two points in kilometres.
#[must_use]
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Returns the candidate closest to `from`, or `None` when there are no candidates.
pub fn nearest<'a, T, F>(candidates: &'a [T], from: Coordinates, coords: F) -> Option<&'a T>
where
    F: Fn(&T) -> Coordinates,
{
    candidates
        .iter()
        .map(|c| (c, distance_km(from, coords(c))))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(c, _)| c)
}
