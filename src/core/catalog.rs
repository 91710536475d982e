//! Catalog business logic - food categories and items.
//!
//! Categories are seeded from configuration. Items are created lazily the first
//! time a donation names something the catalog does not know yet.

use crate::{
    config::settings::Config,
    entities::{FoodCategory, FoodItem, food_category, food_item},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Name of the catch-all category.
pub const OTHER_CATEGORY: &str = "Other";

/// Image tags only count as food suggestions above this confidence.
pub const MIN_TAG_CONFIDENCE: f64 = 0.5;

/// Most suggestions returned for one photo.
pub const MAX_FOOD_TAGS: usize = 10;

/// Substrings that mark an image tag as food.
const FOOD_KEYWORDS: [&str; 48] = [
    "apple", "banana", "orange", "lemon", "lime", "pear", "grape", "berry", "fruit",
    "broccoli", "carrot", "potato", "onion", "tomato", "lettuce", "cabbage", "vegetable",
    "bread", "rice", "pasta", "cereal", "noodle", "flour", "grain",
    "milk", "cheese", "egg", "yogurt", "butter", "dairy",
    "chicken", "beef", "fish", "tuna", "salmon", "meat",
    "bean", "corn", "pea", "soup", "sauce", "can", "canned",
    "food", "produce", "fresh", "packaged", "grocery",
];

/// A tag returned by an image recognition service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageTag {
    /// Tag text, e.g. "banana"
    pub name: String,
    /// Confidence between 0 and 1
    pub confidence: f64,
}

/// A food suggestion offered on the donate screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodTag {
    /// Tag text as the service returned it
    pub name: String,
    /// Confidence rounded to two decimals
    pub confidence: f64,
}

fn is_food_word(name: &str) -> bool {
    let name = name.to_lowercase();
    FOOD_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

/// Turns raw image tags into donate-screen suggestions.
///
/// Keeps tags whose name contains a food keyword and whose confidence is above
/// [`MIN_TAG_CONFIDENCE`], in their original order, rounds confidence to two
/// decimals and returns at most [`MAX_FOOD_TAGS`].
#[must_use]
pub fn filter_food_tags(tags: &[ImageTag]) -> Vec<FoodTag> {
    tags.iter()
        .filter(|tag| tag.confidence > MIN_TAG_CONFIDENCE && is_food_word(&tag.name))
        .map(|tag| FoodTag {
            name: tag.name.clone(),
            confidence: (tag.confidence * 100.0).round() / 100.0,
        })
        .take(MAX_FOOD_TAGS)
        .collect()
}

/// Retrieves all categories ordered by id, the order matching is attempted in.
pub async fn list_categories<C>(db: &C) -> Result<Vec<food_category::Model>>
where
    C: ConnectionTrait,
{
    FoodCategory::find()
        .order_by_asc(food_category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Inserts every configured category that does not exist yet. Returns how many
/// were added; running it twice adds nothing the second time.
#[instrument(skip_all)]
pub async fn seed_categories<C>(db: &C, config: &Config) -> Result<usize>
where
    C: ConnectionTrait,
{
    let mut known: Vec<String> = list_categories(db)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let mut added = 0;

    for category in &config.categories {
        let name = category.name.trim();
        if name.is_empty() {
            return Err(Error::Config {
                message: "Category name cannot be empty".to_string(),
            });
        }
        if known.iter().any(|k| k.eq_ignore_ascii_case(name)) {
            debug!("Category '{}' already present", name);
            continue;
        }

        food_category::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        known.push(name.to_string());
        added += 1;
    }

    info!("Seeded {} new categories", added);
    Ok(added)
}

/// Picks a category for an item name.
///
/// The first word of the name is searched for, case-insensitively, inside each
/// category name in order. Without a match the "Other" category is used if it
/// exists.
#[must_use]
pub fn match_category<'a>(
    categories: &'a [food_category::Model],
    item_name: &str,
) -> Option<&'a food_category::Model> {
    let first_word = item_name.split_whitespace().next().map(str::to_lowercase);

    first_word
        .and_then(|word| {
            categories
                .iter()
                .find(|c| c.name.to_lowercase().contains(&word))
        })
        .or_else(|| {
            categories
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(OTHER_CATEGORY))
        })
}

/// Picks a category using an explicit hint first, then [`match_category`].
#[must_use]
pub fn resolve_category<'a>(
    categories: &'a [food_category::Model],
    item_name: &str,
    hint: Option<&str>,
) -> Option<&'a food_category::Model> {
    hint.map(str::trim)
        .filter(|h| !h.is_empty())
        .and_then(|h| categories.iter().find(|c| c.name.to_lowercase() == h.to_lowercase()))
        .or_else(|| match_category(categories, item_name))
}

/// Finds the item a pātaka should record `name` against, creating it if needed.
///
/// Location-scoped items win over shared catalog items. Names compare
/// case-insensitively after trimming.
pub async fn find_or_create_item<C>(
    db: &C,
    location_id: i64,
    name: &str,
    category: Option<&food_category::Model>,
) -> Result<food_item::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if let Some(existing) = find_item(db, location_id, name).await? {
        return Ok(existing);
    }

    debug!("Creating item '{}' at location {}", name, location_id);
    food_item::ActiveModel {
        name: Set(name.to_string()),
        category_id: Set(category.map(|c| c.id)),
        location_id: Set(Some(location_id)),
        is_deleted: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Looks up a live item by name for a location, falling back to the shared catalog.
pub async fn find_item<C>(db: &C, location_id: i64, name: &str) -> Result<Option<food_item::Model>>
where
    C: ConnectionTrait,
{
    let wanted = name.trim().to_lowercase();
    let candidates = FoodItem::find()
        .filter(food_item::Column::IsDeleted.eq(false))
        .filter(
            food_item::Column::LocationId
                .eq(location_id)
                .or(food_item::Column::LocationId.is_null()),
        )
        .order_by_asc(food_item::Column::Id)
        .all(db)
        .await?;

    let (scoped, shared): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .filter(|item| item.name.trim().to_lowercase() == wanted)
        .partition(|item| item.location_id.is_some());

    Ok(scoped.into_iter().next().or_else(|| shared.into_iter().next()))
}
