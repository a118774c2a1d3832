//! Core module containing the listing model, the filter engine and the
//! store-facing traits

pub mod auth;
pub mod error;
pub mod events;
pub mod filter;
pub mod listing;
pub mod service;

pub use auth::{AuthContext, AuthGate, AuthPolicy};
pub use error::{AuthError, ListingError, StoreError, WriteOp};
pub use events::{ChangeAction, ChangeEvent, ChangeFeed, EventBus, EventEnvelope};
pub use filter::{Criteria, PlotCriteria, RentalCriteria, SortKey, filter_and_sort};
pub use listing::{
    Collection, Furnishing, Listing, ListingId, NewPlot, NewRentalHouse, Plot, PlotType,
    RentalHouse, SizeUnit,
};
pub use service::{Credentials, ListingService, Session, SessionService};
