//! Endpoints driven by the mobile client's periodic location reports.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::activity::{Activity, VisitEvent};
use crate::models::coordinate::Coordinate;
use crate::models::user::{NearbyUsers, User, UserSnapshot};
use crate::models::zone::{ZoneResolution, ZoneSnapshot};
use crate::state::AppState;
use crate::store::GeoStore;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/:id/check-in", post(check_in))
        .route("/users/:id/nearby", post(nearby))
        .route("/users/:id/recent-zones", get(recent_zones))
        .route("/users/:id/recent-contacts", get(recent_contacts))
        .route("/zones/:id/recent-users", get(recent_users))
}

#[derive(Deserialize)]
pub struct LocationRequest {
    pub coordinate: Coordinate,
}

#[derive(Deserialize)]
pub struct WindowQuery {
    pub days: Option<u32>,
}

impl WindowQuery {
    fn days(&self, state: &AppState) -> u32 {
        self.days
            .unwrap_or(state.tracer.settings().history_window_days)
    }
}

/// Stores the reported position and marks the user as active.
fn report_location(state: &AppState, id: Uuid, coordinate: Coordinate) -> Result<User, AppError> {
    coordinate.validate()?;
    let now = state.clock.now();

    let mut reported = None;
    let found = state.store.update_user(id, &mut |user| {
        user.coordinate = Some(coordinate);
        user.is_active = true;
        user.last_updated = now;
        reported = Some(user.clone());
    })?;

    match reported {
        Some(user) if found => Ok(user),
        _ => Err(AppError::NotFound(format!("user {} not found", id))),
    }
}

async fn check_in(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LocationRequest>,
) -> Result<Json<ZoneResolution>, AppError> {
    let user = report_location(&state, id, payload.coordinate)?;

    let start = Instant::now();
    let resolution = match state.tracer.resolve_zone_for_user(&user) {
        Ok(resolution) => resolution,
        Err(err) => {
            state
                .metrics
                .observe_resolution("error", start.elapsed().as_secs_f64());
            error!(user_id = %id, error = %err, "zone resolution failed");
            return Err(err);
        }
    };

    let outcome = if resolution.zone.is_some() {
        "resolved"
    } else {
        "unresolved"
    };
    state
        .metrics
        .observe_resolution(outcome, start.elapsed().as_secs_f64());

    let at = user.last_updated;
    let activity = Activity {
        id: Uuid::new_v4(),
        user_id: user.id,
        zone_id: resolution.zone.as_ref().map(|zone| zone.id),
        at,
    };
    state.activities.insert(activity.id, activity);

    if let Some(zone) = &resolution.zone {
        state
            .metrics
            .set_zone_occupancy(zone.id, zone.occupancy.users_within);

        let event = VisitEvent {
            user_id: user.id,
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            risk: zone.occupancy.risk,
            users_within: zone.occupancy.users_within,
            at,
        };
        let _ = state.visit_events_tx.send(event);
    }

    Ok(Json(resolution))
}

async fn nearby(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LocationRequest>,
) -> Result<Json<NearbyUsers>, AppError> {
    let user = report_location(&state, id, payload.coordinate)?;

    let nearby = state.tracer.find_nearby(&user)?;
    state
        .metrics
        .close_contacts_total
        .inc_by(nearby.contact_count as u64);

    Ok(Json(nearby))
}

async fn recent_zones(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<Vec<ZoneSnapshot>>, AppError> {
    let days = window.days(&state);
    Ok(Json(state.tracer.recent_zones_for_user(id, days)?))
}

async fn recent_contacts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<Vec<UserSnapshot>>, AppError> {
    let days = window.days(&state);
    Ok(Json(state.tracer.recent_users_for_user(id, days)?))
}

async fn recent_users(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<Vec<UserSnapshot>>, AppError> {
    let days = window.days(&state);
    Ok(Json(state.tracer.recent_users_for_zone(id, days)?))
}
