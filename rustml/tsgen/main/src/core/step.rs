//! Sampling-step parsing for pandas-style frequency strings.
//!
//! Accepts an optional integer multiplier followed by a unit alias,
//! e.g. `"10min"`, `"10T"`, `"30s"`, `"1h"`, `"2D"`, `"500ms"`.

use crate::api::error::{TsgenError, TsgenResult};
use chrono::TimeDelta;
use serde::{Deserialize, Deserializer};

pub const DEFAULT_STEP: &str = "10min";

pub fn parse_step(text: &str) -> TsgenResult<TimeDelta> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (count, unit) = text.split_at(split);

    let count: i64 = if count.is_empty() {
        1
    } else {
        count
            .parse()
            .map_err(|_| TsgenError::InvalidConfig(format!("invalid step '{}'", text)))?
    };

    let step = match unit.trim() {
        "D" | "d" | "day" | "days" => TimeDelta::try_days(count),
        "H" | "h" | "hour" | "hours" => TimeDelta::try_hours(count),
        "T" | "min" | "minute" | "minutes" => TimeDelta::try_minutes(count),
        "S" | "s" | "sec" | "second" | "seconds" => TimeDelta::try_seconds(count),
        "L" | "ms" => TimeDelta::try_milliseconds(count),
        "U" | "us" => Some(TimeDelta::microseconds(count)),
        _ => None,
    };

    match step {
        Some(step) if step > TimeDelta::zero() => Ok(step),
        _ => Err(TsgenError::InvalidConfig(format!("invalid step '{}'", text))),
    }
}

pub(crate) fn default_step() -> TimeDelta {
    TimeDelta::minutes(10)
}

pub(crate) fn deserialize_step<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_step(&text).map_err(serde::de::Error::custom)
}
