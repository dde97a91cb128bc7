//! Time duration value type used to bound lock acquisition.
//!
//! A [`Duration`] pairs a [`TimeUnit`] with a magnitude and converts into an
//! absolute [`Deadline`] in the caller's clock. The `Eternal` unit is a
//! distinguished sentinel meaning "no timeout" - it maps to
//! [`Deadline::Never`] rather than participating in deadline arithmetic.

use std::time::{Duration as StdDuration, Instant};

use crate::error::{Error, Result};

/// Unit of time, expressed as a multiplier into milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// One millisecond.
    Millisecond,
    /// 1000 milliseconds.
    Second,
    /// 60000 milliseconds.
    Minute,
    /// 3600000 milliseconds.
    Hour,
    /// Sentinel: no timeout at all.
    Eternal,
}

impl TimeUnit {
    /// Milliseconds per unit, or `None` for the `Eternal` sentinel.
    #[must_use]
    pub const fn millis_per_unit(self) -> Option<u64> {
        match self {
            Self::Millisecond => Some(1),
            Self::Second => Some(1_000),
            Self::Minute => Some(60_000),
            Self::Hour => Some(3_600_000),
            Self::Eternal => None,
        }
    }
}

/// An immutable time interval: magnitude + unit.
///
/// # Examples
///
/// ```
/// use anylock::{Duration, TimeUnit};
///
/// let half_minute = Duration::new(TimeUnit::Second, 30.0)?;
/// assert_eq!(half_minute.as_millis(), Some(30_000.0));
/// # Ok::<(), anylock::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Duration {
    unit: TimeUnit,
    amount: f64,
}

impl Duration {
    /// A zero-length duration: bounded waits attempt exactly once.
    pub const ZERO: Self = Self {
        unit: TimeUnit::Millisecond,
        amount: 0.0,
    };

    /// The unbounded duration: bounded waits never give up.
    pub const ETERNAL: Self = Self {
        unit: TimeUnit::Eternal,
        amount: 1.0,
    };

    /// Create a duration of `amount` units.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDurationAmount`] when `amount` is negative,
    /// `NaN`, or infinite.
    pub fn new(unit: TimeUnit, amount: f64) -> Result<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidDurationAmount { amount });
        }
        Ok(Self { unit, amount })
    }

    /// Create a duration of exactly one unit.
    #[must_use]
    pub const fn of(unit: TimeUnit) -> Self {
        Self { unit, amount: 1.0 }
    }

    /// Shorthand for a millisecond-unit duration.
    pub fn from_millis(amount: f64) -> Result<Self> {
        Self::new(TimeUnit::Millisecond, amount)
    }

    /// The unit this duration is expressed in.
    #[must_use]
    pub const fn time_unit(&self) -> TimeUnit {
        self.unit
    }

    /// The magnitude, in units.
    #[must_use]
    pub const fn amount(&self) -> f64 {
        self.amount
    }

    /// Total length in milliseconds, or `None` for an eternal duration.
    #[must_use]
    pub fn as_millis(&self) -> Option<f64> {
        self.unit
            .millis_per_unit()
            .map(|multiplier| self.amount * multiplier as f64)
    }

    /// Compute the absolute deadline `start + amount * unit`.
    ///
    /// Eternal durations map to [`Deadline::Never`]; no arithmetic is done
    /// with the sentinel. Durations too large to represent saturate to an
    /// unbounded deadline.
    #[must_use]
    pub fn deadline_after(&self, start: Instant) -> Deadline {
        match self.as_millis() {
            None => Deadline::Never,
            Some(millis) => StdDuration::try_from_secs_f64(millis / 1_000.0)
                .ok()
                .and_then(|offset| start.checked_add(offset))
                .map_or(Deadline::Never, Deadline::At),
        }
    }
}

/// An absolute point in time beyond which a bounded wait gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Give up once `now` reaches this instant.
    At(Instant),
    /// Never give up.
    Never,
}

impl Deadline {
    /// `true` once the deadline has passed (never for [`Deadline::Never`]).
    #[must_use]
    pub fn is_reached(&self, now: Instant) -> bool {
        match self {
            Self::Never => false,
            Self::At(at) => now >= *at,
        }
    }

    /// Time remaining until the deadline, or `None` when unbounded.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<StdDuration> {
        match self {
            Self::Never => None,
            Self::At(at) => Some(at.saturating_duration_since(now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_multipliers() {
        assert_eq!(TimeUnit::Millisecond.millis_per_unit(), Some(1));
        assert_eq!(TimeUnit::Second.millis_per_unit(), Some(1_000));
        assert_eq!(TimeUnit::Minute.millis_per_unit(), Some(60_000));
        assert_eq!(TimeUnit::Hour.millis_per_unit(), Some(3_600_000));
        assert_eq!(TimeUnit::Eternal.millis_per_unit(), None);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let result = Duration::new(TimeUnit::Millisecond, -1.0);
        assert!(matches!(
            result,
            Err(Error::InvalidDurationAmount { .. })
        ));
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        assert!(Duration::new(TimeUnit::Second, f64::NAN).is_err());
        assert!(Duration::new(TimeUnit::Second, f64::INFINITY).is_err());
    }

    #[test]
    fn test_adjusted_time_arithmetic() -> Result<()> {
        let duration = Duration::new(TimeUnit::Second, 1.5)?;
        assert_eq!(duration.as_millis(), Some(1_500.0));

        let start = Instant::now();
        match duration.deadline_after(start) {
            Deadline::At(at) => assert_eq!(at - start, StdDuration::from_millis(1_500)),
            Deadline::Never => panic!("finite duration must yield a finite deadline"),
        }
        Ok(())
    }

    #[test]
    fn test_eternal_maps_to_never() {
        let start = Instant::now();
        assert_eq!(Duration::ETERNAL.deadline_after(start), Deadline::Never);
        assert_eq!(Duration::of(TimeUnit::Eternal).as_millis(), None);
    }

    #[test]
    fn test_zero_deadline_is_immediately_reached() {
        let start = Instant::now();
        let deadline = Duration::ZERO.deadline_after(start);
        assert!(deadline.is_reached(start));
    }

    #[test]
    fn test_deadline_never_is_never_reached() {
        assert!(!Deadline::Never.is_reached(Instant::now()));
        assert_eq!(Deadline::Never.remaining(Instant::now()), None);
    }

    #[test]
    fn test_oversized_duration_saturates() -> Result<()> {
        let huge = Duration::new(TimeUnit::Hour, 1.0e300)?;
        assert_eq!(huge.deadline_after(Instant::now()), Deadline::Never);
        Ok(())
    }

    #[test]
    fn test_accessors() -> Result<()> {
        let duration = Duration::new(TimeUnit::Minute, 2.0)?;
        assert_eq!(duration.time_unit(), TimeUnit::Minute);
        assert_eq!(duration.amount(), 2.0);
        Ok(())
    }
}
