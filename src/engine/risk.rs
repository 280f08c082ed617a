use crate::error::AppError;
use crate::models::zone::{Occupancy, RiskTier, Zone};

const MAXIMUM_THRESHOLD: f64 = 100.0;
const HIGH_THRESHOLD: f64 = 80.0;
const MEDIUM_THRESHOLD: f64 = 60.0;
const LOW_THRESHOLD: f64 = 40.0;

/// Occupants per kilometre of radius as a percentage of capacity.
pub fn risk_score(radius_km: f64, capacity: u32, users_within: usize) -> Result<f64, AppError> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "zone radius must be > 0, got {radius_km}"
        )));
    }

    if capacity == 0 {
        return Err(AppError::InvalidInput(
            "zone capacity must be > 0".to_string(),
        ));
    }

    Ok(users_within as f64 / radius_km / capacity as f64 * 100.0)
}

pub fn risk_tier(radius_km: f64, capacity: u32, users_within: usize) -> Result<RiskTier, AppError> {
    let score = risk_score(radius_km, capacity, users_within)?;

    let tier = if score > MAXIMUM_THRESHOLD {
        RiskTier::Maximum
    } else if score > HIGH_THRESHOLD {
        RiskTier::High
    } else if score > MEDIUM_THRESHOLD {
        RiskTier::Medium
    } else if score > LOW_THRESHOLD {
        RiskTier::Low
    } else {
        RiskTier::Minimum
    };

    Ok(tier)
}

/// Derives the live occupancy view for `zone` given its current head count.
pub fn occupancy(zone: &Zone, users_within: usize) -> Result<Occupancy, AppError> {
    let risk = risk_tier(zone.radius_km, zone.capacity, users_within)?;
    let is_capacity_exceeded =
        risk == RiskTier::Maximum && users_within > zone.capacity as usize;

    Ok(Occupancy {
        users_within,
        risk,
        is_capacity_exceeded,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{occupancy, risk_score, risk_tier};
    use crate::models::coordinate::Coordinate;
    use crate::models::zone::{RiskTier, Zone, ZoneKind};

    fn zone(radius_km: f64, capacity: u32) -> Zone {
        Zone {
            id: Uuid::new_v4(),
            name: "market".to_string(),
            coordinate: Coordinate::new(101.6869, 3.1390),
            kind: ZoneKind::Zone,
            capacity,
            radius_km,
            visited_users: Vec::new(),
        }
    }

    #[test]
    fn tiers_for_radius_two_capacity_ten() {
        let cases = [
            (25, RiskTier::Maximum),
            (17, RiskTier::High),
            (13, RiskTier::Medium),
            (9, RiskTier::Low),
            (4, RiskTier::Minimum),
        ];
        for (users_within, expected) in cases {
            assert_eq!(risk_tier(2.0, 10, users_within).unwrap(), expected);
        }
        assert!((risk_score(2.0, 10, 25).unwrap() - 125.0).abs() < 1e-9);
    }

    #[test]
    fn exact_threshold_stays_in_lower_tier() {
        // score == 100 is not > 100
        assert_eq!(risk_tier(2.0, 10, 20).unwrap(), RiskTier::High);
        assert_eq!(risk_tier(1.0, 10, 4).unwrap(), RiskTier::Minimum);
    }

    #[test]
    fn tier_never_drops_as_occupancy_grows() {
        for (radius_km, capacity) in [(0.5, 3), (1.0, 5), (2.0, 10), (7.5, 40)] {
            let mut previous = RiskTier::Minimum;
            for users_within in 0..200 {
                let tier = risk_tier(radius_km, capacity, users_within).unwrap();
                assert!(tier >= previous);
                previous = tier;
            }
        }
    }

    #[test]
    fn zero_radius_or_capacity_is_rejected() {
        assert!(risk_tier(0.0, 10, 3).is_err());
        assert!(risk_tier(-1.0, 10, 3).is_err());
        assert!(risk_tier(f64::NAN, 10, 3).is_err());
        assert!(risk_tier(1.0, 0, 3).is_err());
    }

    #[test]
    fn capacity_exceeded_only_at_maximum_risk() {
        let crowded = occupancy(&zone(1.0, 5), 6).unwrap();
        assert_eq!(crowded.risk, RiskTier::Maximum);
        assert!(crowded.is_capacity_exceeded);

        // wide zone: more people than capacity but spread thin
        let sparse = occupancy(&zone(2.5, 5), 6).unwrap();
        assert_eq!(sparse.risk, RiskTier::Low);
        assert!(!sparse.is_capacity_exceeded);

        // small zone: maximum risk while still under capacity
        let tight = occupancy(&zone(0.5, 10), 6).unwrap();
        assert_eq!(tight.risk, RiskTier::Maximum);
        assert!(!tight.is_capacity_exceeded);
    }
}
