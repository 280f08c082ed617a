use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::zone::RiskTier;

/// One check-in, appended to the activity log and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub zone_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

/// Broadcast to live subscribers whenever a check-in lands in a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitEvent {
    pub user_id: Uuid,
    pub zone_id: Uuid,
    pub zone_name: String,
    pub risk: RiskTier,
    pub users_within: usize,
    pub at: DateTime<Utc>,
}
