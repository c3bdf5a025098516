//! Core configuration
//!
//! Loaded once from environment variables (with `.env` support). Only the
//! settings that change business-rule outcomes live here: the store's
//! timezone and the business-day cutoff that decides which date a
//! late-night order belongs to.

use chrono::NaiveTime;
use chrono_tz::Tz;

/// Environment variable names
const ENV_TIMEZONE: &str = "FONDA_TIMEZONE";
const ENV_DAY_CUTOFF: &str = "FONDA_DAY_CUTOFF";

/// Default business timezone
const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Mexico_City;

#[derive(Debug, Clone, Copy)]
pub struct CoreConfig {
    /// Business timezone for receipt dates, hour buckets, report ranges
    pub timezone: Tz,
    /// Business-day cutoff: orders before this local time count toward
    /// the previous date (a 02:00 cutoff keeps the late shift on
    /// "yesterday's" receipt numbers)
    pub day_cutoff: NaiveTime,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            day_cutoff: NaiveTime::from_hms_opt(2, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl CoreConfig {
    /// Load from environment, falling back to defaults field by field
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let timezone = std::env::var(ENV_TIMEZONE)
            .ok()
            .and_then(|s| {
                s.parse::<Tz>()
                    .map_err(|e| {
                        tracing::warn!("Invalid {}: {}, using default", ENV_TIMEZONE, e);
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_TIMEZONE);

        let day_cutoff = std::env::var(ENV_DAY_CUTOFF)
            .ok()
            .map(|s| parse_cutoff(&s))
            .unwrap_or_else(|| NaiveTime::from_hms_opt(2, 0, 0).unwrap_or(NaiveTime::MIN));

        Self { timezone, day_cutoff }
    }
}

/// Parse a cutoff time string (HH:MM); falls back to 00:00
pub fn parse_cutoff(cutoff: &str) -> NaiveTime {
    NaiveTime::parse_from_str(cutoff, "%H:%M").unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to parse day cutoff '{}': {}, falling back to 00:00",
            cutoff,
            e
        );
        NaiveTime::MIN
    })
}
