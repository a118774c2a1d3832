//! Listing records: plots of land and rental houses
//!
//! Both record kinds implement [`Listing`], which gives the filter engine,
//! the stores and the directory a single shape to work with. Records are
//! immutable once stored; the only lifecycle operations are insert (the store
//! assigns `id` and `created_at`) and delete.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Opaque listing identifier assigned by the listing store
///
/// Ordering is the natural ordering of the textual representation, which is
/// what the `newest` sort uses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a time-ordered identifier (UUIDv7 text)
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ListingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The two collections held by the listing store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Plots,
    Rentals,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Plots => "plots",
            Collection::Rentals => "rentals",
        }
    }

    /// Singular name used in messages ("plot", "rental")
    pub fn singular(&self) -> &'static str {
        match self {
            Collection::Plots => "plot",
            Collection::Rentals => "rental",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a closed enumeration receives an unknown spelling
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! closed_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

closed_enum!(PlotType, "plot type", {
    Residential => "Residential",
    Commercial => "Commercial",
    Agricultural => "Agricultural",
    Industrial => "Industrial",
});

closed_enum!(Furnishing, "furnishing", {
    Unfurnished => "Unfurnished",
    SemiFurnished => "Semi-Furnished",
    FullyFurnished => "Fully Furnished",
});

// Sizes are not normalized across units; filters compare the raw number.
closed_enum!(SizeUnit, "size unit", {
    SqFt => "sq ft",
    Acres => "acres",
});

/// Common shape of every stored listing
pub trait Listing: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Record without store-assigned fields, as submitted by the admin surface
    type Draft: Clone + Send + Sync + Serialize + DeserializeOwned + Validate + 'static;

    /// Collection this record kind lives in
    const COLLECTION: Collection;

    /// Build the stored record once the store has assigned identity
    fn from_draft(id: ListingId, created_at: DateTime<Utc>, draft: Self::Draft) -> Self;

    fn id(&self) -> &ListingId;

    fn title(&self) -> &str;

    fn location(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    /// Amount used by the price sorts (plot price, monthly rent)
    fn price_amount(&self) -> f64;

    /// Value used by the size sort (plot size, house square feet)
    fn size_value(&self) -> f64;

    fn images(&self) -> &[String];

    fn images_mut(&mut self) -> &mut Vec<String>;

    /// Copy of the record whose empty image list is replaced by `placeholder`
    fn with_display_images(&self, placeholder: &str) -> Self {
        let mut shown = self.clone();
        if shown.images().is_empty() {
            shown.images_mut().push(placeholder.to_string());
        }
        shown
    }
}

/// A plot of land for sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub id: ListingId,
    pub title: String,
    pub price: f64,
    pub location: String,
    pub size: f64,
    pub size_unit: SizeUnit,
    pub dimensions: String,
    #[serde(rename = "type")]
    pub plot_type: PlotType,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Plot as submitted for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewPlot {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
    #[validate(length(min = 1, message = "location must not be empty"))]
    pub location: String,
    #[validate(range(exclusive_min = 0.0, message = "size must be positive"))]
    pub size: f64,
    pub size_unit: SizeUnit,
    #[serde(default)]
    pub dimensions: String,
    #[serde(rename = "type")]
    pub plot_type: PlotType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Listing for Plot {
    type Draft = NewPlot;

    const COLLECTION: Collection = Collection::Plots;

    fn from_draft(id: ListingId, created_at: DateTime<Utc>, draft: NewPlot) -> Self {
        Self {
            id,
            title: draft.title,
            price: draft.price,
            location: draft.location,
            size: draft.size,
            size_unit: draft.size_unit,
            dimensions: draft.dimensions,
            plot_type: draft.plot_type,
            description: draft.description,
            images: draft.images,
            features: draft.features,
            created_at,
        }
    }

    fn id(&self) -> &ListingId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn price_amount(&self) -> f64 {
        self.price
    }

    fn size_value(&self) -> f64 {
        self.size
    }

    fn images(&self) -> &[String] {
        &self.images
    }

    fn images_mut(&mut self) -> &mut Vec<String> {
        &mut self.images
    }
}

/// A house offered for rent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalHouse {
    pub id: ListingId,
    pub title: String,
    pub monthly_rent: f64,
    pub deposit: f64,
    pub location: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub sqft: u32,
    pub furnishing: Furnishing,
    /// Calendar date as entered (`YYYY-MM-DD`), may be empty
    #[serde(default)]
    pub available_from: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Rental house as submitted for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewRentalHouse {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(range(min = 0.0, message = "monthly rent must not be negative"))]
    pub monthly_rent: f64,
    #[validate(range(min = 0.0, message = "deposit must not be negative"))]
    pub deposit: f64,
    #[validate(length(min = 1, message = "location must not be empty"))]
    pub location: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub sqft: u32,
    pub furnishing: Furnishing,
    #[serde(default)]
    pub available_from: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl Listing for RentalHouse {
    type Draft = NewRentalHouse;

    const COLLECTION: Collection = Collection::Rentals;

    fn from_draft(id: ListingId, created_at: DateTime<Utc>, draft: NewRentalHouse) -> Self {
        Self {
            id,
            title: draft.title,
            monthly_rent: draft.monthly_rent,
            deposit: draft.deposit,
            location: draft.location,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            sqft: draft.sqft,
            furnishing: draft.furnishing,
            available_from: draft.available_from,
            description: draft.description,
            images: draft.images,
            amenities: draft.amenities,
            created_at,
        }
    }

    fn id(&self) -> &ListingId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn price_amount(&self) -> f64 {
        self.monthly_rent
    }

    fn size_value(&self) -> f64 {
        f64::from(self.sqft)
    }

    fn images(&self) -> &[String] {
        &self.images
    }

    fn images_mut(&mut self) -> &mut Vec<String> {
        &mut self.images
    }
}
