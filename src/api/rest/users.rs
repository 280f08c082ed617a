use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::coordinate::Coordinate;
use crate::models::user::{Role, User};
use crate::state::AppState;
use crate::store::GeoStore;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub infected: bool,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub infected: Option<bool>,
    pub is_active: Option<bool>,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name cannot be empty".to_string()));
    }

    let email = payload.email.trim();
    if !email.contains('@') {
        return Err(AppError::InvalidInput(format!("invalid email {email}")));
    }

    if let Some(coordinate) = &payload.coordinate {
        coordinate.validate()?;
    }

    let user = User {
        id: payload.id.unwrap_or_else(Uuid::new_v4),
        role: payload.role.unwrap_or(Role::User),
        name: name.to_string(),
        email: email.to_string(),
        coordinate: payload.coordinate,
        is_active: true,
        infected: payload.infected,
        last_updated: state.clock.now(),
        visited_zones: Vec::new(),
        contacts: Vec::new(),
    };

    if !state.store.insert_user(user.clone()) {
        return Err(AppError::Conflict(format!("user {} already exists", user.id)));
    }

    Ok(Json(user))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<User>> {
    Json(state.store.list_users())
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .user(id)?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;

    Ok(Json(user))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let name = match payload.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::InvalidInput("name cannot be empty".to_string())),
        other => other.map(str::to_string),
    };

    let mut updated = None;
    let found = state.store.update_user(id, &mut |user| {
        if let Some(name) = &name {
            user.name = name.clone();
        }
        if let Some(infected) = payload.infected {
            user.infected = infected;
        }
        if let Some(is_active) = payload.is_active {
            user.is_active = is_active;
        }
        updated = Some(user.clone());
    })?;

    match updated {
        Some(user) if found => Ok(Json(user)),
        _ => Err(AppError::NotFound(format!("user {} not found", id))),
    }
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .remove_user(id)
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;

    Ok(Json(user))
}
