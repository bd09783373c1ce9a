//! The ingestion boundary: every wire shape the backend has ever produced is
//! turned into the canonical [`Recipe`] here, so nothing downstream has to
//! care about legacy strings or MongoDB extended JSON.

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

use crate::model::{HierarchicalItem, Recipe};

/// Markdown image syntax: `![alt](url)`
static IMAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[.*?\]\((.*?)\)").expect("valid image regex"));

/// A number as the backend may encode it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    MongoInt {
        #[serde(rename = "$numberInt")]
        value: String,
    },
    MongoLong {
        #[serde(rename = "$numberLong")]
        value: String,
    },
    MongoDouble {
        #[serde(rename = "$numberDouble")]
        value: String,
    },
    Text(String),
}

impl RawNumber {
    /// Unwrap to a non-negative integer; anything unparsable becomes 0
    pub fn as_u32(&self) -> u32 {
        let parsed = match self {
            RawNumber::Int(n) => Some(*n),
            RawNumber::Float(f) => Some(f.trunc() as i64),
            RawNumber::MongoInt { value }
            | RawNumber::MongoLong { value }
            | RawNumber::Text(value) => parse_integer(value),
            RawNumber::MongoDouble { value } => {
                value.trim().parse::<f64>().ok().map(|f| f.trunc() as i64)
            }
        };

        match parsed {
            Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
            Some(_) => 0,
            None => {
                warn!("Unable to read number from {:?}", self);
                0
            }
        }
    }
}

/// Mirrors JavaScript `parseInt`: leading digits win, trailing junk is ignored
fn parse_integer(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// One content line as it may arrive on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawContentItem {
    Text(String),
    Item {
        text: String,
        #[serde(default)]
        level: Option<RawNumber>,
    },
    Other(Value),
}

impl From<HierarchicalItem> for RawContentItem {
    fn from(item: HierarchicalItem) -> Self {
        RawContentItem::Item {
            text: item.text,
            level: Some(RawNumber::Int(i64::from(item.level))),
        }
    }
}

impl RawContentItem {
    pub fn text(&self) -> String {
        match self {
            RawContentItem::Text(text) => text.clone(),
            RawContentItem::Item { text, .. } => text.clone(),
            RawContentItem::Other(Value::Number(n)) => n.to_string(),
            RawContentItem::Other(Value::Bool(b)) => b.to_string(),
            RawContentItem::Other(Value::Null) => String::new(),
            RawContentItem::Other(other) => {
                warn!("Unable to extract text from content item: {}", other);
                String::new()
            }
        }
    }

    pub fn level(&self) -> u32 {
        match self {
            RawContentItem::Item {
                level: Some(level), ..
            } => level.as_u32(),
            _ => 0,
        }
    }

    pub fn normalize(&self) -> HierarchicalItem {
        HierarchicalItem {
            text: self.text(),
            level: self.level(),
        }
    }
}

/// A content field: normally an array, occasionally something else entirely
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawContent {
    List(Vec<RawContentItem>),
    Other(Value),
}

/// Document id: plain string or `{"$oid": "..."}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Plain(String),
    ObjectId {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl RawId {
    pub fn into_string(self) -> String {
        match self {
            RawId::Plain(id) => id,
            RawId::ObjectId { oid } => oid,
        }
    }
}

/// Recipe exactly as `GET /api/recipes/:id` returns it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRecipe {
    #[serde(rename = "_id")]
    pub id: Option<RawId>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<RawNumber>,
    pub description: Option<String>,
    pub materials: Option<RawContent>,
    pub calculations: Option<RawContent>,
    pub procedure: Option<RawContent>,
    pub extra_info: Option<RawContent>,
    pub image_url: Option<String>,
    pub all_image_urls: Option<Vec<String>>,
    pub source_url: Option<String>,
}

/// Convert any content array to canonical hierarchical items
pub fn normalize_content(items: &[RawContentItem]) -> Vec<HierarchicalItem> {
    items.iter().map(RawContentItem::normalize).collect()
}

fn normalize_field(field: Option<RawContent>, name: &str) -> Vec<HierarchicalItem> {
    match field {
        Some(RawContent::List(items)) => normalize_content(&items),
        Some(RawContent::Other(value)) => {
            warn!("Content field '{}' is not an array: {}", name, value);
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Apply the normalization boundary to a raw backend recipe
pub fn normalize_recipe(raw: RawRecipe) -> Recipe {
    let mut recipe = Recipe {
        id: raw.id.map(RawId::into_string).unwrap_or_default(),
        name: raw.name.unwrap_or_default(),
        category: raw.category.unwrap_or_default(),
        difficulty: raw.difficulty.as_ref().map(RawNumber::as_u32).unwrap_or(0),
        description: raw.description.unwrap_or_default(),
        materials: normalize_field(raw.materials, "materials"),
        calculations: normalize_field(raw.calculations, "calculations"),
        procedure: normalize_field(raw.procedure, "procedure"),
        extra_info: normalize_field(raw.extra_info, "extraInfo"),
        image_url: raw.image_url.unwrap_or_default(),
        all_image_urls: raw.all_image_urls.unwrap_or_default(),
        images: Vec::new(),
        source_url: raw.source_url.unwrap_or_default(),
    };
    recipe.images = extract_recipe_images(&recipe);
    debug!(
        "Normalized recipe '{}' with {} image(s)",
        recipe.name,
        recipe.images.len()
    );
    recipe
}

/// Collect every image URL of a recipe: the main image, the backend's list,
/// then any markdown image found in the text. GitHub raw links are rewritten
/// to the media CDN, which serves LFS-tracked files.
pub fn extract_recipe_images(recipe: &Recipe) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();

    if !recipe.image_url.is_empty() {
        images.push(recipe.image_url.clone());
    }

    for url in &recipe.all_image_urls {
        if !images.contains(url) {
            images.push(url.clone());
        }
    }

    let texts = std::iter::once(recipe.description.as_str()).chain(
        [
            &recipe.materials,
            &recipe.calculations,
            &recipe.procedure,
            &recipe.extra_info,
        ]
        .into_iter()
        .flatten()
        .map(|item| item.text.as_str()),
    );

    for text in texts {
        for capture in IMAGE_REGEX.captures_iter(text) {
            let url = &capture[1];
            if url.is_empty() {
                continue;
            }
            let processed = to_media_url(url);
            if !images.contains(&processed) {
                images.push(processed);
            }
        }
    }

    images
}

fn to_media_url(url: &str) -> String {
    if url.contains("raw.githubusercontent.com") {
        url.replacen(
            "raw.githubusercontent.com",
            "media.githubusercontent.com/media",
            1,
        )
    } else {
        url.to_string()
    }
}
