use tracing::debug;

use crate::engine::history::record_visit;
use crate::engine::ContactTracer;
use crate::error::AppError;
use crate::models::user::{NearbyUser, NearbyUsers, User, UserSnapshot};
use crate::store::UserQuery;

impl ContactTracer {
    /// Two-tier neighbour search around `user`.
    ///
    /// Everyone inside the visible radius is returned by position only.
    /// Everyone inside the narrower contact radius is recorded on the
    /// requester's contact list; the write is one-directional.
    pub fn find_nearby(&self, user: &User) -> Result<NearbyUsers, AppError> {
        let coordinate = user.coordinate.ok_or_else(|| {
            AppError::InvalidInput(format!("user {} has no coordinate", user.id))
        })?;
        coordinate.validate()?;

        let query = UserQuery::traceable().excluding(user.id);
        let visible =
            self.store
                .users_within(&coordinate, self.settings.visible_radius_km, &query)?;
        let contacts =
            self.store
                .users_within(&coordinate, self.settings.contact_radius_km, &query)?;

        if !contacts.is_empty() {
            let at = self.clock.now();
            let snapshots: Vec<UserSnapshot> =
                contacts.iter().map(|contact| contact.snapshot(at)).collect();

            let found = self.store.update_user(user.id, &mut |doc| {
                for snapshot in &snapshots {
                    record_visit(&mut doc.contacts, snapshot.clone());
                }
            })?;
            if !found {
                return Err(AppError::NotFound(format!("user {} not found", user.id)));
            }
        }

        debug!(
            user_id = %user.id,
            visible = visible.len(),
            contacts = contacts.len(),
            "nearby users matched"
        );

        Ok(NearbyUsers {
            contact_count: contacts.len(),
            users: visible
                .iter()
                .filter_map(|other| other.coordinate)
                .map(|coordinate| NearbyUser { coordinate })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use crate::engine::fixtures::{origin, start, tracer, tracer_over, user_at, FailingStore};
    use crate::error::AppError;
    use crate::geo::offset_north;
    use crate::models::user::Role;
    use crate::store::{GeoStore, StoreError};

    #[test]
    fn visible_and_contact_sets_use_different_radii() {
        let (store, _clock, tracer) = tracer();
        let me = user_at(Some(origin()));
        let close = user_at(Some(offset_north(&origin(), 0.04)));
        let passing = user_at(Some(offset_north(&origin(), 0.08)));
        let distant = user_at(Some(offset_north(&origin(), 0.5)));
        for u in [&me, &close, &passing, &distant] {
            store.insert_user(u.clone());
        }

        let nearby = tracer.find_nearby(&me).unwrap();
        assert_eq!(nearby.contact_count, 1);
        assert_eq!(nearby.users.len(), 2);

        let stored = store.user(me.id).unwrap().unwrap();
        assert_eq!(stored.contacts.len(), 1);
        assert_eq!(stored.contacts[0].id, close.id);

        // one-directional: the contact's own list is untouched
        assert!(store.user(close.id).unwrap().unwrap().contacts.is_empty());
    }

    #[test]
    fn requester_is_never_its_own_neighbour() {
        let (store, _clock, tracer) = tracer();
        let me = user_at(Some(origin()));
        store.insert_user(me.clone());

        let nearby = tracer.find_nearby(&me).unwrap();
        assert_eq!(nearby.contact_count, 0);
        assert!(nearby.users.is_empty());
    }

    #[test]
    fn inactive_and_privileged_users_are_ignored() {
        let (store, _clock, tracer) = tracer();
        let me = user_at(Some(origin()));
        let mut asleep = user_at(Some(offset_north(&origin(), 0.01)));
        asleep.is_active = false;
        let mut admin = user_at(Some(offset_north(&origin(), 0.01)));
        admin.role = Role::Admin;
        for u in [&me, &asleep, &admin] {
            store.insert_user(u.clone());
        }

        let nearby = tracer.find_nearby(&me).unwrap();
        assert_eq!(nearby.contact_count, 0);
        assert!(nearby.users.is_empty());
    }

    #[test]
    fn missing_coordinate_is_invalid_input() {
        let (store, _clock, tracer) = tracer();
        let me = user_at(None);
        store.insert_user(me.clone());

        let err = tracer.find_nearby(&me).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn repeated_contact_is_refreshed_not_duplicated() {
        let (store, clock, tracer) = tracer();
        let me = user_at(Some(origin()));
        let close = user_at(Some(offset_north(&origin(), 0.02)));
        store.insert_user(me.clone());
        store.insert_user(close.clone());

        tracer.find_nearby(&me).unwrap();
        clock.advance(Duration::minutes(5));
        tracer.find_nearby(&me).unwrap();

        let stored = store.user(me.id).unwrap().unwrap();
        assert_eq!(stored.contacts.len(), 1);
        assert_eq!(stored.contacts[0].visited_at, start() + Duration::minutes(5));

        let recent = tracer.recent_users_for_user(me.id, 14).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, close.id);
    }

    #[test]
    fn unknown_requester_with_contacts_is_not_found() {
        let (store, _clock, tracer) = tracer();
        let ghost = user_at(Some(origin()));
        store.insert_user(user_at(Some(offset_north(&origin(), 0.01))));

        let err = tracer.find_nearby(&ghost).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn failed_user_query_is_a_provider_failure() {
        let store = Arc::new(FailingStore {
            users_down: true,
            ..FailingStore::default()
        });
        let me = user_at(Some(origin()));
        store.inner.insert_user(me.clone());
        store
            .inner
            .insert_user(user_at(Some(offset_north(&origin(), 0.01))));

        let tracer = tracer_over(store.clone());
        let err = tracer.find_nearby(&me).unwrap_err();
        assert!(matches!(
            err,
            AppError::ProviderFailure(StoreError::Query {
                collection: "users",
                ..
            })
        ));
        assert!(store.inner.user(me.id).unwrap().unwrap().contacts.is_empty());
    }
}
