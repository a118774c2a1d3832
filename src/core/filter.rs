//! Filter/sort engine shared by the plot and rental listing pages
//!
//! Pure functions over a snapshot: the input slice is never mutated and a new
//! ordered vector is returned. Criteria hold the raw text a form or query
//! string supplies. An absent or empty field imposes no constraint, and so
//! does a numeric field that does not parse. Every supplied constraint must
//! hold for a record to stay in the result.
//!
//! A `min` greater than its `max` is applied as given and yields nothing.

use crate::core::listing::{Furnishing, Listing, ListingId, Plot, PlotType, RentalHouse};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Bedroom filter value meaning "this many or more"
pub const BEDROOMS_OR_MORE: u32 = 5;

/// Bathroom filter value meaning "this many or more"
pub const BATHROOMS_OR_MORE: u32 = 4;

/// Requested result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Descending by identifier text
    #[default]
    Newest,
    /// Ascending by price (monthly rent for rentals)
    PriceLow,
    /// Descending by price (monthly rent for rentals)
    PriceHigh,
    /// Descending by size (square feet for rentals)
    Size,
}

impl SortKey {
    /// Parse a sort key, falling back to [`SortKey::Newest`] for anything unknown
    pub fn parse_lossy(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for SortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortKey::Newest),
            "price-low" => Ok(SortKey::PriceLow),
            "price-high" => Ok(SortKey::PriceHigh),
            "size" => Ok(SortKey::Size),
            _ => Err(()),
        }
    }
}

/// A set of constraints over listings of type `T`
pub trait Criteria<T> {
    /// Whether `item` satisfies every supplied constraint
    fn matches(&self, item: &T) -> bool;
}

/// Plot listing criteria, as entered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotCriteria {
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_size: Option<String>,
    pub max_size: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub plot_type: Option<String>,
}

/// Rental listing criteria, as entered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalCriteria {
    pub min_rent: Option<String>,
    pub max_rent: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub location: Option<String>,
    pub furnishing: Option<String>,
}

/// Text of a field that counts as supplied (present and non-empty)
fn supplied(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().filter(|s| !s.is_empty())
}

/// Numeric bound, or `None` when absent or malformed
fn bound(raw: &Option<String>) -> Option<f64> {
    supplied(raw)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Whole-number filter value, or `None` when absent or malformed
fn count(raw: &Option<String>) -> Option<u32> {
    supplied(raw).and_then(|s| s.trim().parse::<u32>().ok())
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|m| value >= m) && max.is_none_or(|m| value <= m)
}

fn location_matches(location: &str, needle: &Option<String>) -> bool {
    supplied(needle).is_none_or(|n| location.to_lowercase().contains(&n.to_lowercase()))
}

/// Exact enum match; "all" and empty impose nothing, unknown spellings match nothing
fn choice_matches<E: FromStr + PartialEq>(value: &E, raw: &Option<String>) -> bool {
    match supplied(raw) {
        None | Some("all") => true,
        Some(s) => s.parse::<E>().is_ok_and(|wanted| wanted == *value),
    }
}

/// Exact count match, except the sentinel which means "sentinel or more"
fn count_matches(value: u32, wanted: Option<u32>, or_more: u32) -> bool {
    match wanted {
        None => true,
        Some(n) if n == or_more => value >= or_more,
        Some(n) => value == n,
    }
}

impl Criteria<Plot> for PlotCriteria {
    fn matches(&self, plot: &Plot) -> bool {
        within(plot.price, bound(&self.min_price), bound(&self.max_price))
            && within(plot.size, bound(&self.min_size), bound(&self.max_size))
            && location_matches(&plot.location, &self.location)
            && choice_matches::<PlotType>(&plot.plot_type, &self.plot_type)
    }
}

impl Criteria<RentalHouse> for RentalCriteria {
    fn matches(&self, house: &RentalHouse) -> bool {
        within(house.monthly_rent, bound(&self.min_rent), bound(&self.max_rent))
            && count_matches(house.bedrooms, count(&self.bedrooms), BEDROOMS_OR_MORE)
            && count_matches(house.bathrooms, count(&self.bathrooms), BATHROOMS_OR_MORE)
            && location_matches(&house.location, &self.location)
            && choice_matches::<Furnishing>(&house.furnishing, &self.furnishing)
    }
}

fn compare<T: Listing>(a: &T, b: &T, sort: SortKey) -> Ordering {
    match sort {
        SortKey::Newest => b.id().cmp(a.id()),
        SortKey::PriceLow => a.price_amount().total_cmp(&b.price_amount()),
        SortKey::PriceHigh => b.price_amount().total_cmp(&a.price_amount()),
        SortKey::Size => b.size_value().total_cmp(&a.size_value()),
    }
}

/// Filter `items` by `criteria` and order the survivors by `sort`
///
/// The sort is stable: records comparing equal keep their input order.
pub fn filter_and_sort<T, C>(items: &[T], criteria: &C, sort: SortKey) -> Vec<T>
where
    T: Listing,
    C: Criteria<T> + ?Sized,
{
    let mut result: Vec<T> = items
        .iter()
        .filter(|item| criteria.matches(item))
        .cloned()
        .collect();
    result.sort_by(|a, b| compare(a, b, sort));
    result
}

pub fn filter_plots(plots: &[Plot], criteria: &PlotCriteria, sort: SortKey) -> Vec<Plot> {
    filter_and_sort(plots, criteria, sort)
}

pub fn filter_rentals(
    houses: &[RentalHouse],
    criteria: &RentalCriteria,
    sort: SortKey,
) -> Vec<RentalHouse> {
    filter_and_sort(houses, criteria, sort)
}

/// Look up a record by id; `None` is the not-found case
pub fn find_by_id<'a, T: Listing>(items: &'a [T], id: &ListingId) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

/// The first `n` records in directory order
pub fn featured<T: Listing>(items: &[T], n: usize) -> Vec<T> {
    items.iter().take(n).cloned().collect()
}

/// Other plots of the same type, first `n`
pub fn similar_plots(plots: &[Plot], plot: &Plot, n: usize) -> Vec<Plot> {
    plots
        .iter()
        .filter(|p| p.id != plot.id && p.plot_type == plot.plot_type)
        .take(n)
        .cloned()
        .collect()
}

/// Other rentals with the same bedroom count, first `n`
pub fn similar_rentals(houses: &[RentalHouse], house: &RentalHouse, n: usize) -> Vec<RentalHouse> {
    houses
        .iter()
        .filter(|h| h.id != house.id && h.bedrooms == house.bedrooms)
        .take(n)
        .cloned()
        .collect()
}
