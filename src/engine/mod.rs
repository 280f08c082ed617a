//! Contact tracing core: zone resolution, proximity matching and the
//! reciprocal visit history kept on users and zones.

pub mod history;
pub mod proximity;
pub mod risk;
pub mod sweep;
pub mod zones;

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::EngineSettings;
use crate::error::AppError;
use crate::models::user::User;
use crate::models::zone::{Zone, ZoneView};
use crate::store::{GeoStore, UserQuery};

/// Entry point for every tracing operation. Holds no mutable state of its
/// own; all reads and writes go through the [`GeoStore`].
pub struct ContactTracer {
    store: Arc<dyn GeoStore>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
}

impl ContactTracer {
    pub fn new(store: Arc<dyn GeoStore>, clock: Arc<dyn Clock>, settings: EngineSettings) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Current occupants of `zone`. A failed lookup degrades to an empty set.
    fn occupants(&self, zone: &Zone) -> Vec<User> {
        match self
            .store
            .users_within(&zone.coordinate, zone.radius_km, &UserQuery::traceable())
        {
            Ok(users) => users,
            Err(err) => {
                warn!(
                    zone_id = %zone.id,
                    error = %err,
                    "unable to trace users within zone; treating occupancy as zero"
                );
                Vec::new()
            }
        }
    }

    /// Zone with its occupancy computed from live data.
    pub fn zone_view(&self, zone: &Zone) -> Result<ZoneView, AppError> {
        let users_within = match self.store.count_users_within(
            &zone.coordinate,
            zone.radius_km,
            &UserQuery::traceable(),
        ) {
            Ok(count) => count,
            Err(err) => {
                warn!(
                    zone_id = %zone.id,
                    error = %err,
                    "unable to count users within zone; treating occupancy as zero"
                );
                0
            }
        };

        Ok(ZoneView::new(zone, risk::occupancy(zone, users_within)?))
    }
}

fn contains_user(users: &[User], id: Uuid) -> bool {
    users.iter().any(|user| user.id == id)
}
