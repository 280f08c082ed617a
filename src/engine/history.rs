use chrono::{DateTime, Days, FixedOffset, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::engine::ContactTracer;
use crate::error::AppError;
use crate::models::user::{User, UserSnapshot};
use crate::models::zone::{ZoneSnapshot, ZoneView};

/// A timestamped snapshot of some counterpart, kept in a visit list.
pub trait HistoryEntry {
    fn counterpart_id(&self) -> Uuid;
    fn visited_at(&self) -> DateTime<Utc>;
}

impl HistoryEntry for UserSnapshot {
    fn counterpart_id(&self) -> Uuid {
        self.id
    }

    fn visited_at(&self) -> DateTime<Utc> {
        self.visited_at
    }
}

impl HistoryEntry for ZoneSnapshot {
    fn counterpart_id(&self) -> Uuid {
        self.id
    }

    fn visited_at(&self) -> DateTime<Utc> {
        self.visited_at
    }
}

/// Pulls any existing entry for the same counterpart, then pushes `entry`.
/// The list keeps insertion order with at most one entry per counterpart.
pub fn record_visit<T: HistoryEntry>(list: &mut Vec<T>, entry: T) {
    let counterpart = entry.counterpart_id();
    list.retain(|existing| existing.counterpart_id() != counterpart);
    list.push(entry);
}

/// Local midnight `window_days - 1` calendar days before `now`.
pub fn window_start(
    now: DateTime<Utc>,
    window_days: u32,
    utc_offset_hours: i32,
) -> Result<DateTime<Utc>, AppError> {
    if window_days == 0 {
        return Err(AppError::InvalidInput(
            "window must cover at least one day".to_string(),
        ));
    }

    let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
        AppError::InvalidInput(format!("invalid utc offset {utc_offset_hours}h"))
    })?;

    let first_day = now
        .with_timezone(&offset)
        .date_naive()
        .checked_sub_days(Days::new(u64::from(window_days) - 1))
        .ok_or_else(|| {
            AppError::InvalidInput(format!("window of {window_days} days is out of range"))
        })?;

    offset
        .from_local_datetime(&first_day.and_time(NaiveTime::MIN))
        .single()
        .map(|start| start.with_timezone(&Utc))
        .ok_or_else(|| AppError::Internal(format!("no local midnight for {first_day}")))
}

/// Entries visited on or after the window start, newest first.
pub fn recent_within_window<T: HistoryEntry + Clone>(
    list: &[T],
    window_days: u32,
    now: DateTime<Utc>,
    utc_offset_hours: i32,
) -> Result<Vec<T>, AppError> {
    let start = window_start(now, window_days, utc_offset_hours)?;

    let mut recent: Vec<T> = list
        .iter()
        .filter(|entry| entry.visited_at() >= start)
        .cloned()
        .collect();
    recent.sort_by(|a, b| b.visited_at().cmp(&a.visited_at()));

    Ok(recent)
}

impl ContactTracer {
    /// Writes both halves of a zone visit: the zone on the user's list and
    /// the user on the zone's list. Each half is one atomic document update.
    pub(crate) fn record_zone_visit(&self, user: &User, zone: &ZoneView) -> Result<(), AppError> {
        let at = self.clock.now();
        let zone_snapshot = zone.snapshot(at);
        let user_snapshot = user.snapshot(at);

        let user_found = self.store.update_user(user.id, &mut |doc| {
            record_visit(&mut doc.visited_zones, zone_snapshot.clone());
        })?;
        if !user_found {
            return Err(AppError::NotFound(format!("user {} not found", user.id)));
        }

        let zone_found = self.store.update_zone(zone.id, &mut |doc| {
            record_visit(&mut doc.visited_users, user_snapshot.clone());
        })?;
        if !zone_found {
            return Err(AppError::NotFound(format!("zone {} not found", zone.id)));
        }

        Ok(())
    }

    pub fn recent_zones_for_user(
        &self,
        user_id: Uuid,
        window_days: u32,
    ) -> Result<Vec<ZoneSnapshot>, AppError> {
        let user = self
            .store
            .user(user_id)?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))?;

        recent_within_window(
            &user.visited_zones,
            window_days,
            self.clock.now(),
            self.settings.utc_offset_hours,
        )
    }

    pub fn recent_users_for_zone(
        &self,
        zone_id: Uuid,
        window_days: u32,
    ) -> Result<Vec<UserSnapshot>, AppError> {
        let zone = self
            .store
            .zone(zone_id)?
            .ok_or_else(|| AppError::NotFound(format!("zone {zone_id} not found")))?;

        recent_within_window(
            &zone.visited_users,
            window_days,
            self.clock.now(),
            self.settings.utc_offset_hours,
        )
    }

    /// Close contacts recorded on `user_id` by the proximity matcher.
    pub fn recent_users_for_user(
        &self,
        user_id: Uuid,
        window_days: u32,
    ) -> Result<Vec<UserSnapshot>, AppError> {
        let user = self
            .store
            .user(user_id)?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))?;

        recent_within_window(
            &user.contacts,
            window_days,
            self.clock.now(),
            self.settings.utc_offset_hours,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
    use uuid::Uuid;

    use super::{record_visit, recent_within_window, window_start};
    use crate::error::AppError;
    use crate::models::user::{Role, UserSnapshot};

    fn local(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, day, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn visit(id: Uuid, at: DateTime<Utc>) -> UserSnapshot {
        UserSnapshot {
            id,
            role: Role::User,
            name: "visitor".to_string(),
            email: "visitor@example.com".to_string(),
            coordinate: None,
            infected: false,
            visited_at: at,
        }
    }

    #[test]
    fn revisiting_keeps_one_entry_with_latest_time() {
        let a = Uuid::new_v4();
        let mut list = Vec::new();
        record_visit(&mut list, visit(a, local(1, 9, 0)));
        record_visit(&mut list, visit(a, local(1, 9, 5)));

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].visited_at, local(1, 9, 5));
    }

    #[test]
    fn revisit_moves_counterpart_to_tail() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut list = Vec::new();
        record_visit(&mut list, visit(a, local(1, 9, 0)));
        record_visit(&mut list, visit(b, local(1, 9, 1)));
        record_visit(&mut list, visit(a, local(1, 9, 2)));

        let ids: Vec<Uuid> = list.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn window_starts_at_local_midnight() {
        let start = window_start(local(21, 10, 30), 14, 8).unwrap();
        assert_eq!(start, local(8, 0, 0));
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 7, 16, 0, 0).unwrap());
    }

    #[test]
    fn one_day_window_is_today_only() {
        let start = window_start(local(21, 0, 10), 1, 8).unwrap();
        assert_eq!(start, local(21, 0, 0));
    }

    #[test]
    fn zero_day_window_is_invalid() {
        assert!(window_start(local(21, 10, 0), 0, 8).is_err());
    }

    #[test]
    fn window_past_the_calendar_range_is_invalid() {
        let result = window_start(local(21, 10, 0), 100_000_000, 8);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn boundary_day_is_inclusive() {
        let now = local(21, 10, 0);
        let on_boundary = visit(Uuid::new_v4(), local(8, 0, 0));
        let just_before = visit(Uuid::new_v4(), local(8, 0, 0) - Duration::seconds(1));
        let list = vec![on_boundary.clone(), just_before];

        let recent = recent_within_window(&list, 14, now, 8).unwrap();
        assert_eq!(recent, vec![on_boundary]);
    }

    #[test]
    fn recent_entries_are_newest_first() {
        let now = local(21, 10, 0);
        let older = visit(Uuid::new_v4(), local(15, 8, 0));
        let newer = visit(Uuid::new_v4(), local(20, 8, 0));
        let list = vec![older.clone(), newer.clone()];

        let recent = recent_within_window(&list, 14, now, 8).unwrap();
        assert_eq!(recent, vec![newer, older]);
    }

    #[test]
    fn day_one_visit_replaced_by_day_twenty_is_the_only_live_entry() {
        let zone_visitor = Uuid::new_v4();
        let mut list = Vec::new();
        record_visit(&mut list, visit(zone_visitor, local(1, 12, 0)));
        record_visit(&mut list, visit(zone_visitor, local(20, 12, 0)));

        let recent = recent_within_window(&list, 14, local(21, 12, 0), 8).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].visited_at, local(20, 12, 0));

        // day 1 alone would already be outside the window on day 21
        let stale = vec![visit(zone_visitor, local(1, 12, 0))];
        assert!(recent_within_window(&stale, 14, local(21, 12, 0), 8)
            .unwrap()
            .is_empty());
    }
}
