//! HTTP handlers for the listing site
//!
//! Reads are served from the directory snapshot; writes go through the
//! directory to the store and become visible once the change feed has been
//! processed. Admin routes and session routes resolve the caller from the
//! request's bearer token through [`Caller`].

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::convert::Infallible;
use tokio_stream::{Stream, StreamExt, wrappers::WatchStream};

use super::AppState;
use super::extract::Caller;
use crate::core::auth::AuthPolicy;
use crate::core::error::ListingError;
use crate::core::filter::{self, PlotCriteria, RentalCriteria, SortKey};
use crate::core::listing::{Collection, Listing, ListingId, NewPlot, NewRentalHouse, Plot, RentalHouse};
use crate::core::service::{Credentials, Session};

/// `sort` query parameter, parsed leniently
#[derive(Debug, Default, Deserialize)]
pub struct SortParam {
    #[serde(default)]
    pub sort: Option<String>,
}

impl SortParam {
    fn key(&self) -> SortKey {
        SortKey::parse_lossy(self.sort.as_deref())
    }
}

/// Response for list endpoints
#[derive(Debug, Serialize)]
pub struct ListingPage<T> {
    pub items: Vec<T>,
    pub count: usize,
    pub sort: SortKey,
}

/// A listing together with related listings for its detail page
#[derive(Debug, Serialize)]
pub struct ListingDetail<T> {
    pub listing: T,
    pub similar: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct Featured {
    pub plots: Vec<Plot>,
    pub rentals: Vec<RentalHouse>,
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

fn displayed<T: Listing>(items: Vec<T>, placeholder: &str) -> Vec<T> {
    items
        .iter()
        .map(|item| item.with_display_images(placeholder))
        .collect()
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "estate-listings"
    }))
}

// === Listings ===

pub async fn list_plots(
    State(state): State<AppState>,
    Query(criteria): Query<PlotCriteria>,
    Query(sort): Query<SortParam>,
) -> Json<ListingPage<Plot>> {
    let sort = sort.key();
    let items = filter::filter_plots(&state.directory.plots(), &criteria, sort);
    let items = displayed(items, &state.listings.placeholder_image);

    Json(ListingPage {
        count: items.len(),
        items,
        sort,
    })
}

pub async fn list_rentals(
    State(state): State<AppState>,
    Query(criteria): Query<RentalCriteria>,
    Query(sort): Query<SortParam>,
) -> Json<ListingPage<RentalHouse>> {
    let sort = sort.key();
    let items = filter::filter_rentals(&state.directory.rentals(), &criteria, sort);
    let items = displayed(items, &state.listings.placeholder_image);

    Json(ListingPage {
        count: items.len(),
        items,
        sort,
    })
}

pub async fn get_plot(
    State(state): State<AppState>,
    Path(id): Path<ListingId>,
) -> Result<Json<ListingDetail<Plot>>, ListingError> {
    let plots = state.directory.plots();
    let plot = filter::find_by_id(&plots, &id)
        .ok_or_else(|| ListingError::not_found(Collection::Plots, id.clone()))?;

    let placeholder = &state.listings.placeholder_image;
    let similar = filter::similar_plots(&plots, plot, state.listings.similar_count);

    Ok(Json(ListingDetail {
        listing: plot.with_display_images(placeholder),
        similar: displayed(similar, placeholder),
    }))
}

pub async fn get_rental(
    State(state): State<AppState>,
    Path(id): Path<ListingId>,
) -> Result<Json<ListingDetail<RentalHouse>>, ListingError> {
    let rentals = state.directory.rentals();
    let house = filter::find_by_id(&rentals, &id)
        .ok_or_else(|| ListingError::not_found(Collection::Rentals, id.clone()))?;

    let placeholder = &state.listings.placeholder_image;
    let similar = filter::similar_rentals(&rentals, house, state.listings.similar_count);

    Ok(Json(ListingDetail {
        listing: house.with_display_images(placeholder),
        similar: displayed(similar, placeholder),
    }))
}

pub async fn featured(State(state): State<AppState>) -> Json<Featured> {
    let n = state.listings.featured_count;
    let placeholder = &state.listings.placeholder_image;

    Json(Featured {
        plots: displayed(filter::featured(&state.directory.plots(), n), placeholder),
        rentals: displayed(filter::featured(&state.directory.rentals(), n), placeholder),
    })
}

// === Admin ===

pub async fn create_plot(
    State(state): State<AppState>,
    caller: Caller,
    Json(draft): Json<NewPlot>,
) -> Result<(StatusCode, Json<Plot>), ListingError> {
    caller.require(AuthPolicy::AdminOnly)?;
    let plot = state.directory.create_plot(draft).await?;
    Ok((StatusCode::CREATED, Json(plot)))
}

pub async fn delete_plot(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ListingId>,
) -> Result<StatusCode, ListingError> {
    caller.require(AuthPolicy::AdminOnly)?;
    state.directory.delete_plot(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_rental(
    State(state): State<AppState>,
    caller: Caller,
    Json(draft): Json<NewRentalHouse>,
) -> Result<(StatusCode, Json<RentalHouse>), ListingError> {
    caller.require(AuthPolicy::AdminOnly)?;
    let house = state.directory.create_rental(draft).await?;
    Ok((StatusCode::CREATED, Json(house)))
}

pub async fn delete_rental(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ListingId>,
) -> Result<StatusCode, ListingError> {
    caller.require(AuthPolicy::AdminOnly)?;
    state.directory.delete_rental(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// === Auth ===

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Session>, ListingError> {
    Ok(Json(state.auth.login(&credentials).await?))
}

pub async fn signup(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<Session>), ListingError> {
    let session = state.auth.signup(&credentials).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// End the caller's own session; without a token there is nothing to end
pub async fn logout(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<StatusCode, ListingError> {
    if let Some(token) = caller.token() {
        state.auth.logout(token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn session(State(state): State<AppState>, caller: Caller) -> Json<SessionStatus> {
    let session = caller.token().and_then(|token| state.auth.session(token));
    Json(SessionStatus {
        authenticated: session.is_some(),
        session,
    })
}

// === Events ===

/// One `directory` event per snapshot revision
pub async fn directory_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::from_changes(state.directory.watch())
        .map(|revision| Ok(Event::default().event("directory").data(revision.to_string())));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
