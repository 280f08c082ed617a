use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::state::AppState;

/// Periodically flags users who stopped reporting as inactive so they no
/// longer count as occupants or neighbours.
pub async fn run_inactive_sweep(state: Arc<AppState>, every: Duration, max_idle: ChronoDuration) {
    info!(
        interval_secs = every.as_secs(),
        max_idle_minutes = max_idle.num_minutes(),
        "inactive user sweep started"
    );

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        sweep_once(&state, max_idle);
    }
}

pub fn sweep_once(state: &AppState, max_idle: ChronoDuration) -> usize {
    let cutoff = state.clock.now() - max_idle;
    let deactivated = state.store.deactivate_idle_users(cutoff);

    if deactivated > 0 {
        state
            .metrics
            .users_deactivated_total
            .inc_by(deactivated as u64);
        info!(deactivated, %cutoff, "inactive users disabled");
    } else {
        debug!(%cutoff, "no inactive users");
    }

    deactivated
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::sweep_once;
    use crate::clock::FixedClock;
    use crate::config::EngineSettings;
    use crate::models::user::{Role, User};
    use crate::state::AppState;

    #[test]
    fn sweep_disables_only_idle_users() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let state = AppState::with_clock(
            EngineSettings::default(),
            16,
            Arc::new(FixedClock::new(now)),
        );

        let make = |last_updated| User {
            id: Uuid::new_v4(),
            role: Role::User,
            name: "runner".to_string(),
            email: "runner@example.com".to_string(),
            coordinate: None,
            is_active: true,
            infected: false,
            last_updated,
            visited_zones: Vec::new(),
            contacts: Vec::new(),
        };
        let idle = make(now - Duration::minutes(90));
        let recent = make(now - Duration::minutes(5));
        state.store.insert_user(idle.clone());
        state.store.insert_user(recent.clone());

        assert_eq!(sweep_once(&state, Duration::minutes(60)), 1);
        assert_eq!(sweep_once(&state, Duration::minutes(60)), 0);
        assert_eq!(state.metrics.users_deactivated_total.get(), 1);
    }
}
