//! Conversion of grid time axes to calendar epochs.
//!
//! Gridded datasets store time as a number of units elapsed since a reference date,
//! declared in the CF convention style, e.g. `"hours since 1800-01-01 00:00:0.0"`.
//! [`TimeUnits`] parses that declaration once and converts axis values to and from
//! [`hifitime::Epoch`] (UTC).
use std::{fmt, str::FromStr, sync::LazyLock};

use hifitime::{Epoch, Unit};
use regex::Regex;

use crate::{constants::Timestamp, storm_errors::StormError};

static CF_UNITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^\s*
        (?P<unit>days?|hours?|minutes?|seconds?)\s+since\s+
        (?P<year>-?\d{1,4})-(?P<month>\d{1,2})-(?P<day>\d{1,2})
        (?:[\sT]+(?P<hour>\d{1,2}):(?P<minute>\d{1,2})(?::(?P<second>\d{1,2}(?:\.\d*)?))?)?
        \s*(?:Z|UTC)?\s*$",
    )
    .expect("CF time units regex is valid")
});

/// Parsed CF-style time units: a step unit and a reference epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    unit: Unit,
    origin: Epoch,
    declaration: String,
}

impl TimeUnits {
    /// Parse a declaration such as `"days since 2000-01-01"` or
    /// `"hours since 1800-01-01 00:00:0.0"`.
    ///
    /// Errors
    /// ----------
    /// * [`StormError::InvalidTimeUnits`] if the declaration does not match the
    ///   `<unit> since <date> [<time>]` form or names an invalid calendar date.
    pub fn parse(declaration: &str) -> Result<Self, StormError> {
        let invalid = || StormError::InvalidTimeUnits(declaration.to_string());
        let caps = CF_UNITS.captures(declaration).ok_or_else(invalid)?;

        let unit = match caps["unit"].to_ascii_lowercase().trim_end_matches('s') {
            "day" => Unit::Day,
            "hour" => Unit::Hour,
            "minute" => Unit::Minute,
            _ => Unit::Second,
        };

        let field = |name: &str| -> Result<u8, StormError> {
            caps.name(name)
                .map_or(Ok(0), |m| m.as_str().parse::<u8>().map_err(|_| invalid()))
        };
        let year: i32 = caps["year"].parse().map_err(|_| invalid())?;
        let seconds: f64 = caps
            .name("second")
            .map_or(Ok(0.0), |m| m.as_str().parse::<f64>().map_err(|_| invalid()))?;
        let whole_seconds = seconds.trunc();
        let nanos = ((seconds - whole_seconds) * 1e9).round() as u32;

        let origin = Epoch::maybe_from_gregorian_utc(
            year,
            field("month")?,
            field("day")?,
            field("hour")?,
            field("minute")?,
            whole_seconds as u8,
            nanos,
        )
        .map_err(|_| invalid())?;

        Ok(TimeUnits {
            unit,
            origin,
            declaration: declaration.trim().to_string(),
        })
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn origin(&self) -> Epoch {
        self.origin
    }

    /// Epoch of a time axis value.
    pub fn to_epoch(&self, value: Timestamp) -> Epoch {
        self.origin + self.unit * value
    }

    /// Time axis value of an epoch, inverse of [`TimeUnits::to_epoch`].
    pub fn to_value(&self, epoch: Epoch) -> Timestamp {
        (epoch - self.origin).to_unit(self.unit)
    }
}

impl FromStr for TimeUnits {
    type Err = StormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeUnits::parse(s)
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.declaration)
    }
}
