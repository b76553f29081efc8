//! Domain types for the catalog dataset and remote resource identifiers.
//!
//! Dataset types are serializable/deserializable via serde + serde_yaml and
//! are never mutated by the seed pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a remote document collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub String);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CollectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CollectionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a remote object-storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketId(pub String);

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BucketId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BucketId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A store-assigned document or file identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of add-on a customization represents.
///
/// Unknown kinds parse into [`CustomizationType::Other`] so that a bad record
/// fails its own validation instead of the whole dataset parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomizationType {
    Topping,
    Side,
    Size,
    Crust,
    Bread,
    Spice,
    Base,
    Sauce,
    Other(String),
}

impl CustomizationType {
    pub fn as_str(&self) -> &str {
        match self {
            CustomizationType::Topping => "topping",
            CustomizationType::Side => "side",
            CustomizationType::Size => "size",
            CustomizationType::Crust => "crust",
            CustomizationType::Bread => "bread",
            CustomizationType::Spice => "spice",
            CustomizationType::Base => "base",
            CustomizationType::Sauce => "sauce",
            CustomizationType::Other(raw) => raw,
        }
    }

    /// `true` for one of the eight kinds the catalog schema knows about.
    pub fn is_known(&self) -> bool {
        !matches!(self, CustomizationType::Other(_))
    }
}

impl From<String> for CustomizationType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "topping" => CustomizationType::Topping,
            "side" => CustomizationType::Side,
            "size" => CustomizationType::Size,
            "crust" => CustomizationType::Crust,
            "bread" => CustomizationType::Bread,
            "spice" => CustomizationType::Spice,
            "base" => CustomizationType::Base,
            "sauce" => CustomizationType::Sauce,
            _ => CustomizationType::Other(s),
        }
    }
}

impl From<&str> for CustomizationType {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<CustomizationType> for String {
    fn from(t: CustomizationType) -> Self {
        t.as_str().to_owned()
    }
}

impl fmt::Display for CustomizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Dataset structs
// ---------------------------------------------------------------------------

/// A menu category, created verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub description: String,
}

/// An add-on customization. `name` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customization {
    pub name: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub kind: CustomizationType,
}

/// A menu item definition as it appears in the source dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    /// Source image location; uploaded to the bucket during seeding.
    pub image_url: String,
    pub price: f64,
    pub rating: f64,
    pub calories: u32,
    pub protein: u32,
    /// Name of the [`Category`] this item belongs to.
    pub category_name: String,
    /// Names of the customizations this item offers.
    #[serde(default)]
    pub customizations: Vec<String>,
}

/// The immutable reference dataset the pipeline seeds from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceDataset {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub customizations: Vec<Customization>,
    #[serde(default)]
    pub menu: Vec<MenuItem>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
