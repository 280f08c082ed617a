use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::geo::{haversine_km, within_radius};
use crate::models::coordinate::Coordinate;
use crate::models::user::User;
use crate::models::zone::{Zone, ZoneKind};
use crate::store::{GeoStore, StoreError, UserQuery};

/// Document plus its insertion sequence, used to keep result order stable.
struct Document<T> {
    seq: u64,
    doc: T,
}

/// `DashMap`-backed document store. Each user and zone is its own entry, so
/// per-document updates only lock that document's shard.
pub struct InMemoryStore {
    users: DashMap<Uuid, Document<User>>,
    zones: DashMap<Uuid, Document<Zone>>,
    next_seq: AtomicU64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            zones: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    fn seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns `false` without touching the store if the id is taken.
    pub fn insert_user(&self, user: User) -> bool {
        match self.users.entry(user.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Document {
                    seq: self.seq(),
                    doc: user,
                });
                true
            }
        }
    }

    pub fn insert_zone(&self, zone: Zone) -> bool {
        match self.zones.entry(zone.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Document {
                    seq: self.seq(),
                    doc: zone,
                });
                true
            }
        }
    }

    pub fn remove_user(&self, id: Uuid) -> Option<User> {
        self.users.remove(&id).map(|(_, entry)| entry.doc)
    }

    pub fn remove_zone(&self, id: Uuid) -> Option<Zone> {
        self.zones.remove(&id).map(|(_, entry)| entry.doc)
    }

    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<(u64, User)> = self
            .users
            .iter()
            .map(|entry| (entry.seq, entry.doc.clone()))
            .collect();
        users.sort_by_key(|(seq, _)| *seq);
        users.into_iter().map(|(_, user)| user).collect()
    }

    pub fn list_zones(&self) -> Vec<Zone> {
        let mut zones: Vec<(u64, Zone)> = self
            .zones
            .iter()
            .map(|entry| (entry.seq, entry.doc.clone()))
            .collect();
        zones.sort_by_key(|(seq, _)| *seq);
        zones.into_iter().map(|(_, zone)| zone).collect()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Flags every active user last seen before `cutoff` as inactive.
    pub fn deactivate_idle_users(&self, cutoff: DateTime<Utc>) -> usize {
        let mut deactivated = 0;
        for mut entry in self.users.iter_mut() {
            let user = &mut entry.doc;
            if user.is_active && user.last_updated < cutoff {
                user.is_active = false;
                deactivated += 1;
            }
        }
        deactivated
    }

    fn zones_by_distance(
        &self,
        center: &Coordinate,
        radius_km: f64,
        kind: ZoneKind,
    ) -> Vec<(f64, u64, Zone)> {
        let mut zones: Vec<(f64, u64, Zone)> = self
            .zones
            .iter()
            .filter(|entry| entry.doc.kind == kind)
            .filter_map(|entry| {
                let distance = haversine_km(center, &entry.doc.coordinate);
                (distance <= radius_km).then(|| (distance, entry.seq, entry.doc.clone()))
            })
            .collect();

        zones.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        zones
    }
}

impl GeoStore for InMemoryStore {
    fn users_within(
        &self,
        center: &Coordinate,
        radius_km: f64,
        query: &UserQuery,
    ) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<(u64, User)> = self
            .users
            .iter()
            .filter(|entry| query.matches(&entry.doc))
            .filter_map(|entry| {
                let coordinate = entry.doc.coordinate?;
                within_radius(center, &coordinate, radius_km)
                    .then(|| (entry.seq, entry.doc.clone()))
            })
            .collect();

        users.sort_by_key(|(seq, _)| *seq);
        Ok(users.into_iter().map(|(_, user)| user).collect())
    }

    fn count_users_within(
        &self,
        center: &Coordinate,
        radius_km: f64,
        query: &UserQuery,
    ) -> Result<usize, StoreError> {
        Ok(self
            .users
            .iter()
            .filter(|entry| query.matches(&entry.doc))
            .filter(|entry| {
                entry
                    .doc
                    .coordinate
                    .is_some_and(|coordinate| within_radius(center, &coordinate, radius_km))
            })
            .count())
    }

    fn zones_within(
        &self,
        center: &Coordinate,
        radius_km: f64,
        kind: ZoneKind,
    ) -> Result<Vec<Zone>, StoreError> {
        let mut zones = self.zones_by_distance(center, radius_km, kind);
        zones.sort_by_key(|(_, seq, _)| *seq);
        Ok(zones.into_iter().map(|(_, _, zone)| zone).collect())
    }

    fn nearest_zones(
        &self,
        center: &Coordinate,
        max_distance_m: f64,
        kind: ZoneKind,
    ) -> Result<Vec<Zone>, StoreError> {
        let zones = self.zones_by_distance(center, max_distance_m / 1000.0, kind);
        Ok(zones.into_iter().map(|(_, _, zone)| zone).collect())
    }

    fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.doc.clone()))
    }

    fn zone(&self, id: Uuid) -> Result<Option<Zone>, StoreError> {
        Ok(self.zones.get(&id).map(|entry| entry.doc.clone()))
    }

    fn update_user(
        &self,
        id: Uuid,
        apply: &mut dyn FnMut(&mut User),
    ) -> Result<bool, StoreError> {
        match self.users.get_mut(&id) {
            Some(mut entry) => {
                apply(&mut entry.doc);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update_zone(
        &self,
        id: Uuid,
        apply: &mut dyn FnMut(&mut Zone),
    ) -> Result<bool, StoreError> {
        match self.zones.get_mut(&id) {
            Some(mut entry) => {
                apply(&mut entry.doc);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
