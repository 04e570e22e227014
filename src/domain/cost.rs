//! Cost values
//!
//! A [`Cost`] is a non-negative number or [`Cost::INFINITE`], which marks a
//! task or fact with no known relaxed plan. Infinity absorbs addition, so an
//! unreachable subtask makes every sum it appears in unreachable.

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A non-negative cost estimate, possibly infinite
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Cost(f64);

impl Cost {
    pub const ZERO: Cost = Cost(0.0);
    pub const INFINITE: Cost = Cost(f64::INFINITY);

    /// Creates a finite cost, or `None` if `value` is negative, NaN or infinite
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && value >= 0.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the underlying number (`f64::INFINITY` when unreachable)
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    pub fn is_infinite(self) -> bool {
        !self.0.is_finite()
    }

    /// Returns the smaller of two costs
    pub fn min(self, other: Cost) -> Cost {
        if other < self {
            other
        } else {
            self
        }
    }

    /// Returns the larger of two costs
    pub fn max(self, other: Cost) -> Cost {
        if other > self {
            other
        } else {
            self
        }
    }

    /// Maximum over an iterator, `Cost::ZERO` when empty
    pub fn max_of(costs: impl IntoIterator<Item = Cost>) -> Cost {
        costs.into_iter().fold(Cost::ZERO, Cost::max)
    }

    /// Minimum over an iterator, `None` when empty
    pub fn min_of(costs: impl IntoIterator<Item = Cost>) -> Option<Cost> {
        costs.into_iter().reduce(Cost::min)
    }

    /// Total order for sorting; costs are never NaN
    pub fn total_cmp(&self, other: &Cost) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0 + rhs.0)
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// JSON has no infinity, so unreachable costs travel as null
impl Serialize for Cost {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.is_infinite() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Cost {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<f64>::deserialize(deserializer)? {
            None => Ok(Cost::INFINITE),
            Some(value) => Cost::new(value).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid cost: {}", value))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost(value: f64) -> Cost {
        Cost::new(value).unwrap()
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Cost::new(-1.0).is_none());
        assert!(Cost::new(f64::NAN).is_none());
        assert!(Cost::new(f64::INFINITY).is_none());
        assert_eq!(Cost::new(0.0), Some(Cost::ZERO));
    }

    #[test]
    fn infinity_absorbs_addition() {
        assert!((cost(3.0) + Cost::INFINITE).is_infinite());
        assert_eq!(cost(1.0) + cost(2.0), cost(3.0));
    }

    #[test]
    fn min_and_max() {
        assert_eq!(cost(1.0).min(cost(2.0)), cost(1.0));
        assert_eq!(cost(1.0).max(Cost::INFINITE), Cost::INFINITE);
        assert_eq!(Cost::max_of([]), Cost::ZERO);
        assert_eq!(Cost::max_of([cost(2.0), cost(5.0), cost(1.0)]), cost(5.0));
        assert_eq!(Cost::min_of([]), None);
        assert_eq!(Cost::min_of([Cost::INFINITE, cost(4.0)]), Some(cost(4.0)));
    }

    #[test]
    fn sum_of_empty_is_zero() {
        let total: Cost = std::iter::empty().sum();
        assert_eq!(total, Cost::ZERO);
    }

    #[test]
    fn display() {
        assert_eq!(cost(3.0).to_string(), "3");
        assert_eq!(cost(2.5).to_string(), "2.5");
        assert_eq!(Cost::INFINITE.to_string(), "inf");
    }

    #[test]
    fn json_encoding_uses_null_for_infinity() {
        assert_eq!(serde_json::to_string(&cost(2.0)).unwrap(), "2.0");
        assert_eq!(serde_json::to_string(&Cost::INFINITE).unwrap(), "null");

        let parsed: Cost = serde_json::from_str("null").unwrap();
        assert!(parsed.is_infinite());
        let parsed: Cost = serde_json::from_str("4").unwrap();
        assert_eq!(parsed, cost(4.0));
        assert!(serde_json::from_str::<Cost>("-1").is_err());
    }
}
