use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::activity::Activity;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/activities", get(list_activities))
}

#[derive(Deserialize)]
pub struct ActivityFilter {
    pub user_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
}

async fn list_activities(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ActivityFilter>,
) -> Json<Vec<Activity>> {
    let mut activities: Vec<Activity> = state
        .activities
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|activity| filter.user_id.is_none_or(|id| activity.user_id == id))
        .filter(|activity| filter.zone_id.is_none_or(|id| activity.zone_id == Some(id)))
        .collect();

    activities.sort_by(|a, b| b.at.cmp(&a.at));
    Json(activities)
}
