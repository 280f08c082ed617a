//! Geo query provider boundary.
//!
//! The engine only talks to [`GeoStore`]; any datastore that can answer
//! point-in-radius and nearest-first queries and apply atomic per-document
//! updates satisfies it. [`memory::InMemoryStore`] is the bundled backend.

pub mod memory;

use thiserror::Error;
use uuid::Uuid;

use crate::models::coordinate::Coordinate;
use crate::models::user::{Role, User};
use crate::models::zone::{Zone, ZoneKind};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query on {collection} failed: {reason}")]
    Query {
        collection: &'static str,
        reason: String,
    },

    #[error("{0} collection unavailable")]
    Unavailable(&'static str),
}

/// Filter applied to user radius queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserQuery {
    pub active_only: bool,
    pub role: Option<Role>,
    pub exclude: Option<Uuid>,
}

impl UserQuery {
    /// Active ordinary users, the population that counts as occupants.
    pub fn traceable() -> Self {
        Self {
            active_only: true,
            role: Some(Role::User),
            exclude: None,
        }
    }

    pub fn excluding(mut self, id: Uuid) -> Self {
        self.exclude = Some(id);
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        if self.active_only && !user.is_active {
            return false;
        }
        if self.role.is_some_and(|role| role != user.role) {
            return false;
        }
        self.exclude != Some(user.id)
    }
}

pub trait GeoStore: Send + Sync {
    /// Users matching `query` whose coordinate lies within `radius_km` of `center`.
    fn users_within(
        &self,
        center: &Coordinate,
        radius_km: f64,
        query: &UserQuery,
    ) -> Result<Vec<User>, StoreError>;

    fn count_users_within(
        &self,
        center: &Coordinate,
        radius_km: f64,
        query: &UserQuery,
    ) -> Result<usize, StoreError> {
        Ok(self.users_within(center, radius_km, query)?.len())
    }

    /// Zones of `kind` within `radius_km` of `center`, in no particular order.
    fn zones_within(
        &self,
        center: &Coordinate,
        radius_km: f64,
        kind: ZoneKind,
    ) -> Result<Vec<Zone>, StoreError>;

    /// Zones of `kind` within `max_distance_m`, nearest first. Equal distances
    /// keep a stable order across calls.
    fn nearest_zones(
        &self,
        center: &Coordinate,
        max_distance_m: f64,
        kind: ZoneKind,
    ) -> Result<Vec<Zone>, StoreError>;

    fn user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    fn zone(&self, id: Uuid) -> Result<Option<Zone>, StoreError>;

    /// Applies `apply` to the user document atomically. Returns `false` if
    /// the document does not exist. `apply` must not call back into the store.
    fn update_user(
        &self,
        id: Uuid,
        apply: &mut dyn FnMut(&mut User),
    ) -> Result<bool, StoreError>;

    /// Zone counterpart of [`GeoStore::update_user`].
    fn update_zone(
        &self,
        id: Uuid,
        apply: &mut dyn FnMut(&mut Zone),
    ) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::UserQuery;
    use crate::models::user::{Role, User};

    fn user(role: Role, is_active: bool) -> User {
        User {
            id: Uuid::new_v4(),
            role,
            name: "someone".to_string(),
            email: "someone@example.com".to_string(),
            coordinate: None,
            is_active,
            infected: false,
            last_updated: Utc::now(),
            visited_zones: Vec::new(),
            contacts: Vec::new(),
        }
    }

    #[test]
    fn traceable_query_skips_admins_and_inactive_users() {
        let query = UserQuery::traceable();
        assert!(query.matches(&user(Role::User, true)));
        assert!(!query.matches(&user(Role::User, false)));
        assert!(!query.matches(&user(Role::Admin, true)));
        assert!(!query.matches(&user(Role::SuperUser, true)));
    }

    #[test]
    fn excluding_drops_the_requester() {
        let me = user(Role::User, true);
        let query = UserQuery::traceable().excluding(me.id);
        assert!(!query.matches(&me));
        assert!(query.matches(&user(Role::User, true)));
    }
}
