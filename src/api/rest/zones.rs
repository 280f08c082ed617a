use std::cmp::Ordering;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::listing::{name_matches, select_range, SortOrder};
use crate::error::AppError;
use crate::models::coordinate::Coordinate;
use crate::models::user::User;
use crate::models::zone::{Zone, ZoneKind, ZoneView};
use crate::state::AppState;
use crate::store::GeoStore;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/zones", post(create_zone).get(list_zones))
        .route(
            "/zones/:id",
            get(get_zone).patch(update_zone).delete(delete_zone),
        )
        .route("/zones/:id/users", get(zone_occupants))
}

#[derive(Deserialize)]
pub struct CreateZoneRequest {
    pub id: Option<Uuid>,
    pub name: String,
    pub coordinate: Coordinate,
    pub kind: ZoneKind,
    pub capacity: u32,
    pub radius_km: f64,
}

#[derive(Deserialize)]
pub struct UpdateZoneRequest {
    pub name: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub kind: Option<ZoneKind>,
    pub capacity: Option<u32>,
    pub radius_km: Option<f64>,
}

/// Sort keys over the live occupancy fields as well as the name.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSortKey {
    Name,
    UsersWithin,
    Risk,
    IsCapacityExceeded,
}

impl ZoneSortKey {
    fn compare(self, a: &ZoneView, b: &ZoneView) -> Ordering {
        match self {
            ZoneSortKey::Name => a.name.cmp(&b.name),
            ZoneSortKey::UsersWithin => a.occupancy.users_within.cmp(&b.occupancy.users_within),
            ZoneSortKey::Risk => a.occupancy.risk.cmp(&b.occupancy.risk),
            ZoneSortKey::IsCapacityExceeded => a
                .occupancy
                .is_capacity_exceeded
                .cmp(&b.occupancy.is_capacity_exceeded),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ZoneListQuery {
    pub q: Option<String>,
    pub kind: Option<ZoneKind>,
    pub sort: Option<ZoneSortKey>,
    #[serde(default)]
    pub order: SortOrder,
    pub from: Option<usize>,
    pub to: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupantSortKey {
    Name,
    Email,
    LastUpdated,
}

impl OccupantSortKey {
    fn compare(self, a: &User, b: &User) -> Ordering {
        match self {
            OccupantSortKey::Name => a.name.cmp(&b.name),
            OccupantSortKey::Email => a.email.cmp(&b.email),
            OccupantSortKey::LastUpdated => a.last_updated.cmp(&b.last_updated),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OccupantListQuery {
    pub sort: Option<OccupantSortKey>,
    #[serde(default)]
    pub order: SortOrder,
    pub from: Option<usize>,
    pub to: Option<usize>,
}

fn validate_zone(zone: &Zone) -> Result<(), AppError> {
    if zone.name.trim().is_empty() {
        return Err(AppError::InvalidInput("name cannot be empty".to_string()));
    }

    if zone.capacity == 0 {
        return Err(AppError::InvalidInput("capacity must be > 0".to_string()));
    }

    if !zone.radius_km.is_finite() || zone.radius_km <= 0.0 {
        return Err(AppError::InvalidInput("radius_km must be > 0".to_string()));
    }

    zone.coordinate.validate()
}

async fn create_zone(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateZoneRequest>,
) -> Result<Json<ZoneView>, AppError> {
    let zone = Zone {
        id: payload.id.unwrap_or_else(Uuid::new_v4),
        name: payload.name.trim().to_string(),
        coordinate: payload.coordinate,
        kind: payload.kind,
        capacity: payload.capacity,
        radius_km: payload.radius_km,
        visited_users: Vec::new(),
    };
    validate_zone(&zone)?;

    if !state.store.insert_zone(zone.clone()) {
        return Err(AppError::Conflict(format!("zone {} already exists", zone.id)));
    }

    Ok(Json(state.tracer.zone_view(&zone)?))
}

async fn list_zones(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ZoneListQuery>,
) -> Result<Json<Vec<ZoneView>>, AppError> {
    let mut views = state
        .store
        .list_zones()
        .iter()
        .filter(|zone| query.kind.is_none_or(|kind| zone.kind == kind))
        .filter(|zone| name_matches(&zone.name, query.q.as_deref()))
        .map(|zone| state.tracer.zone_view(zone))
        .collect::<Result<Vec<_>, _>>()?;

    // occupancy is only known once the views are built
    if let Some(key) = query.sort {
        views.sort_by(|a, b| query.order.apply(key.compare(a, b)));
    }

    Ok(Json(select_range(views, query.from, query.to)?))
}

async fn get_zone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ZoneView>, AppError> {
    let zone = state
        .store
        .zone(id)?
        .ok_or_else(|| AppError::NotFound(format!("zone {} not found", id)))?;

    Ok(Json(state.tracer.zone_view(&zone)?))
}

async fn update_zone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateZoneRequest>,
) -> Result<Json<ZoneView>, AppError> {
    let mut patched = state
        .store
        .zone(id)?
        .ok_or_else(|| AppError::NotFound(format!("zone {} not found", id)))?;

    if let Some(name) = payload.name {
        patched.name = name.trim().to_string();
    }
    if let Some(coordinate) = payload.coordinate {
        patched.coordinate = coordinate;
    }
    if let Some(kind) = payload.kind {
        patched.kind = kind;
    }
    if let Some(capacity) = payload.capacity {
        patched.capacity = capacity;
    }
    if let Some(radius_km) = payload.radius_km {
        patched.radius_km = radius_km;
    }
    validate_zone(&patched)?;

    // visit history is owned by the engine; only descriptive fields change here
    let found = state.store.update_zone(id, &mut |zone| {
        zone.name = patched.name.clone();
        zone.coordinate = patched.coordinate;
        zone.kind = patched.kind;
        zone.capacity = patched.capacity;
        zone.radius_km = patched.radius_km;
    })?;
    if !found {
        return Err(AppError::NotFound(format!("zone {} not found", id)));
    }

    Ok(Json(state.tracer.zone_view(&patched)?))
}

async fn delete_zone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Zone>, AppError> {
    let zone = state
        .store
        .remove_zone(id)
        .ok_or_else(|| AppError::NotFound(format!("zone {} not found", id)))?;
    state.metrics.forget_zone(id);

    Ok(Json(zone))
}

async fn zone_occupants(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<OccupantListQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    let mut users = state.tracer.users_in_zone(id)?;

    if let Some(key) = query.sort {
        users.sort_by(|a, b| query.order.apply(key.compare(a, b)));
    }

    Ok(Json(select_range(users, query.from, query.to)?))
}
