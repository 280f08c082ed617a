use tracing::{debug, info};

use uuid::Uuid;

use crate::engine::{contains_user, risk, ContactTracer};
use crate::error::AppError;
use crate::models::user::User;
use crate::models::zone::{Zone, ZoneKind, ZoneResolution, ZoneView};
use crate::store::UserQuery;

impl ContactTracer {
    /// Finds the nearest zone that currently counts `user` as an occupant,
    /// records the visit on both sides and resolves the sub-zones inside it.
    pub fn resolve_zone_for_user(&self, user: &User) -> Result<ZoneResolution, AppError> {
        let Some(coordinate) = user.coordinate else {
            debug!(user_id = %user.id, "user has no coordinate; skipping zone resolution");
            return Ok(ZoneResolution::default());
        };

        let candidates = self.store.nearest_zones(
            &coordinate,
            self.settings.zone_search_radius_km * 1000.0,
            ZoneKind::Zone,
        )?;

        for zone in &candidates {
            let occupants = self.occupants(zone);
            if !contains_user(&occupants, user.id) {
                continue;
            }

            let view = ZoneView::new(zone, risk::occupancy(zone, occupants.len())?);
            self.record_zone_visit(user, &view)?;

            let sub_zones = self.resolve_sub_zones(zone, user)?;

            info!(
                user_id = %user.id,
                zone_id = %view.id,
                users_within = view.occupancy.users_within,
                risk = ?view.occupancy.risk,
                sub_zones = sub_zones.len(),
                "zone resolved"
            );

            return Ok(ZoneResolution {
                zone: Some(view),
                sub_zones,
            });
        }

        debug!(
            user_id = %user.id,
            candidates = candidates.len(),
            "no enclosing zone"
        );
        Ok(ZoneResolution::default())
    }

    /// Every sub-zone inside `zone`'s radius, with live occupancy. Only the
    /// ones that contain `user` get a history entry.
    pub fn resolve_sub_zones(&self, zone: &Zone, user: &User) -> Result<Vec<ZoneView>, AppError> {
        let sub_zones =
            self.store
                .zones_within(&zone.coordinate, zone.radius_km, ZoneKind::SubZone)?;

        let mut views = Vec::with_capacity(sub_zones.len());
        for sub_zone in &sub_zones {
            let occupants = self.occupants(sub_zone);
            let view = ZoneView::new(sub_zone, risk::occupancy(sub_zone, occupants.len())?);

            if contains_user(&occupants, user.id) {
                self.record_zone_visit(user, &view)?;
            }

            views.push(view);
        }

        Ok(views)
    }

    /// Users currently inside zone `zone_id`. Unlike resolution, a failed
    /// lookup is reported rather than treated as an empty zone.
    pub fn users_in_zone(&self, zone_id: Uuid) -> Result<Vec<User>, AppError> {
        let zone = self
            .store
            .zone(zone_id)?
            .ok_or_else(|| AppError::NotFound(format!("zone {zone_id} not found")))?;

        Ok(self
            .store
            .users_within(&zone.coordinate, zone.radius_km, &UserQuery::traceable())?)
    }
}
