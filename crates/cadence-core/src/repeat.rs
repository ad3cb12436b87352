//! Repeat specifications for periodically scheduled work.

use std::fmt;

/// How many times a repeating entry fires in total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repetitions {
    /// Fire exactly this many times. `Finite(0)` never fires.
    Finite(u64),
    /// Fire until the scheduler ends.
    Infinite,
}

impl fmt::Display for Repetitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(n) => write!(f, "{n}"),
            Self::Infinite => write!(f, "inf"),
        }
    }
}

/// Interval and repetition count for a repeating schedule entry.
///
/// After each firing, an entry with repetitions remaining is re-inserted
/// at `time + interval`. The interval is validated to be non-zero at
/// scheduling time — a zero interval would never advance the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepeatSpec {
    /// Logical-time distance between firings. Always ≥ 1.
    pub interval: u64,
    /// Firings remaining, counting the one about to happen.
    pub repetitions: Repetitions,
}

impl RepeatSpec {
    /// Whether this spec has at least one firing left.
    pub fn fires(&self) -> bool {
        !matches!(self.repetitions, Repetitions::Finite(0))
    }

    /// The spec for the next firing, or `None` if this firing was the
    /// last one.
    pub fn after_firing(&self) -> Option<RepeatSpec> {
        match self.repetitions {
            Repetitions::Infinite => Some(*self),
            Repetitions::Finite(n) if n > 1 => Some(RepeatSpec {
                interval: self.interval,
                repetitions: Repetitions::Finite(n - 1),
            }),
            Repetitions::Finite(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn finite_count_is_total_firings() {
        // repetitions = 3 → fires three times, then stops.
        let mut spec = RepeatSpec {
            interval: 10,
            repetitions: Repetitions::Finite(3),
        };
        let mut firings = 0;
        loop {
            assert!(spec.fires());
            firings += 1;
            match spec.after_firing() {
                Some(next) => spec = next,
                None => break,
            }
        }
        assert_eq!(firings, 3);
    }

    #[test]
    fn zero_repetitions_never_fires() {
        let spec = RepeatSpec {
            interval: 5,
            repetitions: Repetitions::Finite(0),
        };
        assert!(!spec.fires());
    }

    #[test]
    fn display_shows_remaining_count() {
        assert_eq!(Repetitions::Finite(3).to_string(), "3");
        assert_eq!(Repetitions::Infinite.to_string(), "inf");
    }

    #[test]
    fn infinite_stays_infinite() {
        let spec = RepeatSpec {
            interval: 1,
            repetitions: Repetitions::Infinite,
        };
        let next = spec.after_firing().unwrap();
        assert_eq!(next, spec);
    }

    proptest! {
        #[test]
        fn after_firing_decrements_finite(n in 1u64..10_000, interval in 1u64..1_000) {
            let spec = RepeatSpec {
                interval,
                repetitions: Repetitions::Finite(n),
            };
            match spec.after_firing() {
                Some(next) => {
                    prop_assert_eq!(next.interval, interval);
                    prop_assert_eq!(next.repetitions, Repetitions::Finite(n - 1));
                }
                None => prop_assert_eq!(n, 1),
            }
        }
    }
}
