use std::fmt;

use serde::{Serialize, Serializer};

use crate::model::Bar;

/// Intrabar direction: buying when the bar closes above its open, selling otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pressure {
    Buying,
    Selling,
}

impl Pressure {
    /// Strict comparison: a bar closing exactly at its open is `Selling`.
    pub fn of(bar: &Bar) -> Self {
        if bar.close > bar.open {
            Self::Buying
        } else {
            Self::Selling
        }
    }

    pub fn sign(self) -> i8 {
        match self {
            Self::Buying => 1,
            Self::Selling => -1,
        }
    }
}

impl fmt::Display for Pressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{:+}", self.sign()))
    }
}

impl Serialize for Pressure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.sign())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::{bar, linear_bars};

    #[test]
    fn close_above_open_is_buying() {
        assert_eq!(Pressure::of(&bar(0, 10.0, 12.0, 9.0, 11.0, 1.0)), Pressure::Buying);
    }

    #[test]
    fn close_below_open_is_selling() {
        assert_eq!(Pressure::of(&bar(0, 11.0, 12.0, 9.0, 10.0, 1.0)), Pressure::Selling);
    }

    #[test]
    fn close_equal_to_open_is_selling() {
        let flat = bar(0, 10.0, 10.5, 9.5, 10.0, 1.0);
        assert_eq!(Pressure::of(&flat).sign(), -1);
    }

    #[test]
    fn linear_series_is_all_buying() {
        assert!(linear_bars(30).iter().all(|b| Pressure::of(b) == Pressure::Buying));
    }

    #[test]
    fn display_and_serialize_as_sign() {
        assert_eq!(Pressure::Buying.to_string(), "+1");
        assert_eq!(Pressure::Selling.to_string(), "-1");
        assert_eq!(serde_json::to_string(&Pressure::Selling).unwrap(), "-1");
    }
}
