use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::coordinate::Coordinate;
use crate::models::zone::ZoneSnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    SuperUser,
    Admin,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub coordinate: Option<Coordinate>,
    pub is_active: bool,
    pub infected: bool,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub visited_zones: Vec<ZoneSnapshot>,
    #[serde(default)]
    pub contacts: Vec<UserSnapshot>,
}

impl User {
    pub fn snapshot(&self, visited_at: DateTime<Utc>) -> UserSnapshot {
        UserSnapshot {
            id: self.id,
            role: self.role,
            name: self.name.clone(),
            email: self.email.clone(),
            coordinate: self.coordinate,
            infected: self.infected,
            visited_at,
        }
    }
}

/// Point-in-time copy of a user stored in another entity's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSnapshot {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub coordinate: Option<Coordinate>,
    pub infected: bool,
    pub visited_at: DateTime<Utc>,
}

/// A visible neighbour. Identity is withheld; only the position is shared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NearbyUser {
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyUsers {
    pub contact_count: usize,
    pub users: Vec<NearbyUser>,
}
