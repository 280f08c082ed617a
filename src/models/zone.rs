use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::coordinate::Coordinate;
use crate::models::user::UserSnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ZoneKind {
    Zone,
    SubZone,
}

/// Congestion tiers, declared lowest to highest so `Ord` follows risk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskTier {
    Minimum,
    Low,
    Medium,
    High,
    Maximum,
}

/// The durable zone document. Occupancy is never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: Uuid,
    pub name: String,
    pub coordinate: Coordinate,
    pub kind: ZoneKind,
    pub capacity: u32,
    pub radius_km: f64,
    #[serde(default)]
    pub visited_users: Vec<UserSnapshot>,
}

/// Live occupancy derived at read time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Occupancy {
    pub users_within: usize,
    pub risk: RiskTier,
    pub is_capacity_exceeded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneView {
    pub id: Uuid,
    pub name: String,
    pub coordinate: Coordinate,
    pub kind: ZoneKind,
    pub capacity: u32,
    pub radius_km: f64,
    #[serde(flatten)]
    pub occupancy: Occupancy,
}

impl ZoneView {
    pub fn new(zone: &Zone, occupancy: Occupancy) -> Self {
        Self {
            id: zone.id,
            name: zone.name.clone(),
            coordinate: zone.coordinate,
            kind: zone.kind,
            capacity: zone.capacity,
            radius_km: zone.radius_km,
            occupancy,
        }
    }

    pub fn snapshot(&self, visited_at: DateTime<Utc>) -> ZoneSnapshot {
        ZoneSnapshot {
            id: self.id,
            name: self.name.clone(),
            coordinate: self.coordinate,
            kind: self.kind,
            capacity: self.capacity,
            radius_km: self.radius_km,
            occupancy: self.occupancy,
            visited_at,
        }
    }
}

/// Point-in-time copy of a zone stored in a user's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneSnapshot {
    pub id: Uuid,
    pub name: String,
    pub coordinate: Coordinate,
    pub kind: ZoneKind,
    pub capacity: u32,
    pub radius_km: f64,
    #[serde(flatten)]
    pub occupancy: Occupancy,
    pub visited_at: DateTime<Utc>,
}

/// Outcome of resolving a user's position. `zone` is `None` when no zone
/// encloses the user; that is not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneResolution {
    pub zone: Option<ZoneView>,
    pub sub_zones: Vec<ZoneView>,
}
