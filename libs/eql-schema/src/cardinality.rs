//! The cardinality lattice
//!
//! Every expression carries a guaranteed bound on how many elements it can
//! produce. The five values form a lattice over `(lower, upper)` bounds:
//!
//! | value        | bounds   |
//! |--------------|----------|
//! | `Empty`      | `(0, 0)` |
//! | `AtMostOne`  | `(0, 1)` |
//! | `One`        | `(1, 1)` |
//! | `Many`       | `(0, ∞)` |
//! | `AtLeastOne` | `(1, ∞)` |
//!
//! Two composition operators exist. [`Cardinality::multiply`] pairs two
//! independent sub-results (function arguments, path steps) and is the bounds
//! product. [`Cardinality::merge`] combines alternative branches (`??`,
//! `if/else`, `union`) and is defined by an explicit table rather than a
//! derived formula.

use serde::{Deserialize, Serialize};

/// Lower bound of a cardinality: zero or one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lower {
    Zero,
    One,
}

/// Upper bound of a cardinality: zero, one, or unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upper {
    Zero,
    One,
    Inf,
}

/// How many elements an expression can produce.
///
/// Wire names match the introspection output verbatim (`"One"`,
/// `"AtMostOne"`, ...), so this deserializes straight out of pointer records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    Empty,
    AtMostOne,
    One,
    Many,
    AtLeastOne,
}

impl Cardinality {
    fn bounds(self) -> (Lower, Upper) {
        match self {
            Cardinality::Empty => (Lower::Zero, Upper::Zero),
            Cardinality::AtMostOne => (Lower::Zero, Upper::One),
            Cardinality::One => (Lower::One, Upper::One),
            Cardinality::Many => (Lower::Zero, Upper::Inf),
            Cardinality::AtLeastOne => (Lower::One, Upper::Inf),
        }
    }

    fn from_bounds(lower: Lower, upper: Upper) -> Cardinality {
        match (lower, upper) {
            (_, Upper::Zero) => Cardinality::Empty,
            (Lower::Zero, Upper::One) => Cardinality::AtMostOne,
            (Lower::One, Upper::One) => Cardinality::One,
            (Lower::Zero, Upper::Inf) => Cardinality::Many,
            (Lower::One, Upper::Inf) => Cardinality::AtLeastOne,
        }
    }

    /// Combine the cardinalities of two independent sub-results that are
    /// paired into one composite result.
    ///
    /// Bounds product with `0 * ∞ = 0`. `Empty` absorbs, `One` is the
    /// identity.
    pub fn multiply(self, other: Cardinality) -> Cardinality {
        let (l1, u1) = self.bounds();
        let (l2, u2) = other.bounds();

        let lower = match (l1, l2) {
            (Lower::One, Lower::One) => Lower::One,
            _ => Lower::Zero,
        };
        let upper = match (u1, u2) {
            (Upper::Zero, _) | (_, Upper::Zero) => Upper::Zero,
            (Upper::One, u) | (u, Upper::One) => u,
            (Upper::Inf, Upper::Inf) => Upper::Inf,
        };

        Cardinality::from_bounds(lower, upper)
    }

    /// Fold [`multiply`](Cardinality::multiply) over a sequence, starting from
    /// the identity `One`.
    pub fn multiply_all<I>(cardinalities: I) -> Cardinality
    where
        I: IntoIterator<Item = Cardinality>,
    {
        cardinalities
            .into_iter()
            .fold(Cardinality::One, Cardinality::multiply)
    }

    /// Combine the cardinalities of two alternative branches of which exactly
    /// one contributes to the visible result.
    ///
    /// Defined by table, not formula:
    ///
    /// ```text
    ///              Empty  AtMostOne  One         Many  AtLeastOne
    /// Empty        Empty  Empty      Empty       Empty Empty
    /// AtMostOne    Empty  AtMostOne  AtMostOne   Many  Many
    /// One          Empty  AtMostOne  One         Many  AtLeastOne
    /// Many         Empty  Many       Many        Many  Many
    /// AtLeastOne   Empty  Many       AtLeastOne  Many  AtLeastOne
    /// ```
    pub fn merge(self, other: Cardinality) -> Cardinality {
        use Cardinality::*;
        match (self, other) {
            (Empty, _) | (_, Empty) => Empty,

            (AtMostOne, AtMostOne) => AtMostOne,
            (AtMostOne, One) | (One, AtMostOne) => AtMostOne,
            (AtMostOne, Many) | (Many, AtMostOne) => Many,
            (AtMostOne, AtLeastOne) | (AtLeastOne, AtMostOne) => Many,

            (One, One) => One,
            (One, Many) | (Many, One) => Many,
            (One, AtLeastOne) | (AtLeastOne, One) => AtLeastOne,

            (Many, Many) => Many,
            (Many, AtLeastOne) | (AtLeastOne, Many) => Many,

            (AtLeastOne, AtLeastOne) => AtLeastOne,
        }
    }

    /// Clamp the upper bound to one, preserving the lower bound.
    ///
    /// `Many` → `AtMostOne`, `AtLeastOne` → `One`, everything else unchanged.
    pub fn override_upper_one(self) -> Cardinality {
        let (lower, upper) = self.bounds();
        let upper = match upper {
            Upper::Zero => Upper::Zero,
            _ => Upper::One,
        };
        Cardinality::from_bounds(lower, upper)
    }

    /// Clamp the lower bound to zero, preserving the upper bound.
    ///
    /// `One` → `AtMostOne`, `AtLeastOne` → `Many`, everything else unchanged.
    pub fn override_lower_zero(self) -> Cardinality {
        let (_, upper) = self.bounds();
        Cardinality::from_bounds(Lower::Zero, upper)
    }

    /// Raise the lower bound to one, preserving the upper bound.
    ///
    /// Applied to a present optional argument: an argument that may be empty
    /// must not zero out the enclosing call's result count.
    pub fn override_lower_one(self) -> Cardinality {
        let (_, upper) = self.bounds();
        match upper {
            Upper::Zero => Cardinality::Empty,
            _ => Cardinality::from_bounds(Lower::One, upper),
        }
    }

    /// Cardinality contribution of an optional parameter.
    ///
    /// An absent optional argument never reduces the result's possible count,
    /// so it contributes the multiplicative identity.
    pub fn optional_param(arg: Option<Cardinality>) -> Cardinality {
        match arg {
            Some(c) => c,
            None => Cardinality::One,
        }
    }

    /// Whether the value admits an empty result (lower bound zero).
    pub fn can_be_empty(self) -> bool {
        self.bounds().0 == Lower::Zero
    }

    /// Whether the value admits more than one element (unbounded upper).
    pub fn is_multi(self) -> bool {
        self.bounds().1 == Upper::Inf
    }
}

#[cfg(test)]
mod tests {
    use super::Cardinality::{self, *};

    const ALL: [Cardinality; 5] = [Empty, AtMostOne, One, Many, AtLeastOne];

    #[test]
    fn multiply_matches_bounds_product() {
        let expected = [
            // rows: Empty, AtMostOne, One, Many, AtLeastOne
            [Empty, Empty, Empty, Empty, Empty],
            [Empty, AtMostOne, AtMostOne, Many, Many],
            [Empty, AtMostOne, One, Many, AtLeastOne],
            [Empty, Many, Many, Many, Many],
            [Empty, Many, AtLeastOne, Many, AtLeastOne],
        ];
        for (i, c1) in ALL.iter().enumerate() {
            for (j, c2) in ALL.iter().enumerate() {
                assert_eq!(
                    c1.multiply(*c2),
                    expected[i][j],
                    "multiply({c1:?}, {c2:?})"
                );
            }
        }
    }

    #[test]
    fn merge_matches_design_table() {
        let expected = [
            [Empty, Empty, Empty, Empty, Empty],
            [Empty, AtMostOne, AtMostOne, Many, Many],
            [Empty, AtMostOne, One, Many, AtLeastOne],
            [Empty, Many, Many, Many, Many],
            [Empty, Many, AtLeastOne, Many, AtLeastOne],
        ];
        for (i, c1) in ALL.iter().enumerate() {
            for (j, c2) in ALL.iter().enumerate() {
                assert_eq!(c1.merge(*c2), expected[i][j], "merge({c1:?}, {c2:?})");
            }
        }
    }

    #[test]
    fn merge_at_most_one_with_one() {
        // Pinned separately: AtMostOne row, One column is AtMostOne. This is
        // the entry the upstream design comment and an old unit test
        // disagreed on; the production runtime follows the table.
        assert_eq!(AtMostOne.merge(One), AtMostOne);
        assert_eq!(One.merge(AtMostOne), AtMostOne);
    }

    #[test]
    fn merge_is_commutative() {
        for c1 in ALL {
            for c2 in ALL {
                assert_eq!(c1.merge(c2), c2.merge(c1));
            }
        }
    }

    #[test]
    fn multiply_identity_and_absorption() {
        for c in ALL {
            assert_eq!(One.multiply(c), c);
            assert_eq!(c.multiply(One), c);
            assert_eq!(Empty.multiply(c), Empty);
            assert_eq!(c.merge(Empty), Empty);
        }
    }

    #[test]
    fn bound_overrides() {
        assert_eq!(Many.override_upper_one(), AtMostOne);
        assert_eq!(AtLeastOne.override_upper_one(), One);
        assert_eq!(One.override_upper_one(), One);
        assert_eq!(Empty.override_upper_one(), Empty);

        assert_eq!(One.override_lower_zero(), AtMostOne);
        assert_eq!(AtLeastOne.override_lower_zero(), Many);
        assert_eq!(Many.override_lower_zero(), Many);

        assert_eq!(AtMostOne.override_lower_one(), One);
        assert_eq!(Many.override_lower_one(), AtLeastOne);
        assert_eq!(Empty.override_lower_one(), Empty);
    }

    #[test]
    fn optional_param_defaults_to_identity() {
        assert_eq!(Cardinality::optional_param(None), One);
        assert_eq!(Cardinality::optional_param(Some(Many)), Many);
    }

    #[test]
    fn multiply_all_folds_from_identity() {
        assert_eq!(Cardinality::multiply_all([]), One);
        assert_eq!(Cardinality::multiply_all([Many, AtMostOne]), Many);
        assert_eq!(Cardinality::multiply_all([One, One, AtMostOne]), AtMostOne);
        assert_eq!(Cardinality::multiply_all([AtLeastOne, Empty]), Empty);
    }

    #[test]
    fn serde_round_trips_wire_names() {
        let c: Cardinality = serde_json::from_str("\"AtMostOne\"").unwrap();
        assert_eq!(c, AtMostOne);
        assert_eq!(serde_json::to_string(&Many).unwrap(), "\"Many\"");
    }
}
