use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub inactive_after_minutes: i64,
    pub sweep_interval_secs: u64,
    pub engine: EngineSettings,
}

/// Tunables for zone resolution, proximity matching and history windows.
///
/// Defaults are the fixed domain constants: 100 km zone search, 100 m
/// visible radius, 50 m contact radius, 14 day history, UTC+8 calendar days.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub zone_search_radius_km: f64,
    pub visible_radius_km: f64,
    pub contact_radius_km: f64,
    pub history_window_days: u32,
    pub utc_offset_hours: i32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            zone_search_radius_km: 100.0,
            visible_radius_km: 0.1,
            contact_radius_km: 0.05,
            history_window_days: 14,
            utc_offset_hours: 8,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = EngineSettings::default();

        let engine = EngineSettings {
            zone_search_radius_km: parse_or_default(
                "ZONE_SEARCH_RADIUS_KM",
                defaults.zone_search_radius_km,
            )?,
            visible_radius_km: parse_or_default("VISIBLE_RADIUS_KM", defaults.visible_radius_km)?,
            contact_radius_km: parse_or_default("CONTACT_RADIUS_KM", defaults.contact_radius_km)?,
            history_window_days: parse_or_default(
                "HISTORY_WINDOW_DAYS",
                defaults.history_window_days,
            )?,
            utc_offset_hours: parse_or_default("UTC_OFFSET_HOURS", defaults.utc_offset_hours)?,
        };
        engine.validate()?;

        let inactive_after_minutes = parse_or_default("INACTIVE_AFTER_MINUTES", 60)?;
        if inactive_after_minutes <= 0 {
            return Err(AppError::Internal(
                "invalid INACTIVE_AFTER_MINUTES: must be > 0".to_string(),
            ));
        }

        let sweep_interval_secs = parse_or_default("SWEEP_INTERVAL_SECS", 600)?;
        if sweep_interval_secs == 0 {
            return Err(AppError::Internal(
                "invalid SWEEP_INTERVAL_SECS: must be > 0".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            inactive_after_minutes,
            sweep_interval_secs,
            engine,
        })
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        let radii = [
            ("ZONE_SEARCH_RADIUS_KM", self.zone_search_radius_km),
            ("VISIBLE_RADIUS_KM", self.visible_radius_km),
            ("CONTACT_RADIUS_KM", self.contact_radius_km),
        ];
        for (key, value) in radii {
            if !value.is_finite() || value <= 0.0 {
                return Err(AppError::Internal(format!("invalid {key}: must be > 0")));
            }
        }

        if self.contact_radius_km > self.visible_radius_km {
            return Err(AppError::Internal(
                "invalid CONTACT_RADIUS_KM: must not exceed VISIBLE_RADIUS_KM".to_string(),
            ));
        }

        if self.history_window_days == 0 {
            return Err(AppError::Internal(
                "invalid HISTORY_WINDOW_DAYS: must be > 0".to_string(),
            ));
        }

        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(AppError::Internal(
                "invalid UTC_OFFSET_HOURS: must be within -12..=14".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
