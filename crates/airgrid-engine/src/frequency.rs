//! Recurrence rules for schedules.
//!
//! A [`Frequency`] is a bitmask over the weeks of a month. Ordinal bits select
//! the n-th occurrence of the anchor's weekday in a month, [`Frequency::LAST`]
//! selects the final one, and [`Frequency::ONE_ON_TWO`] ignores month structure
//! entirely and repeats every 14 days from the anchor.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::month::YearMonth;

/// A validated frequency bit-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FrequencyRepr", into = "u8")]
pub struct Frequency(u8);

/// Accepts either the raw bit value or a frequency name in serialized input.
#[derive(Deserialize)]
#[serde(untagged)]
enum FrequencyRepr {
    Bits(u8),
    Name(String),
}

const ORDINALS: u8 = 0b0_1111;
const KNOWN: u8 = 0b11_1111;

/// Named frequencies, in display order.
const NAMES: &[(&str, Frequency)] = &[
    ("ponctual", Frequency::PONCTUAL),
    ("first", Frequency::FIRST),
    ("second", Frequency::SECOND),
    ("third", Frequency::THIRD),
    ("fourth", Frequency::FOURTH),
    ("last", Frequency::LAST),
    ("first_and_third", Frequency::FIRST_AND_THIRD),
    ("second_and_fourth", Frequency::SECOND_AND_FOURTH),
    ("every", Frequency::EVERY),
    ("one_on_two", Frequency::ONE_ON_TWO),
];

impl Frequency {
    /// No recurrence: the program is broadcast through standalone diffusions.
    pub const PONCTUAL: Self = Self(0);
    pub const FIRST: Self = Self(0b00_0001);
    pub const SECOND: Self = Self(0b00_0010);
    pub const THIRD: Self = Self(0b00_0100);
    pub const FOURTH: Self = Self(0b00_1000);
    pub const LAST: Self = Self(0b01_0000);
    pub const FIRST_AND_THIRD: Self = Self(0b00_0101);
    pub const SECOND_AND_FOURTH: Self = Self(0b00_1010);
    /// Every occurrence of the weekday in the month.
    pub const EVERY: Self = Self(0b01_1111);
    /// Every 14 days from the anchor, across month boundaries.
    pub const ONE_ON_TWO: Self = Self(0b10_0000);

    /// Validate a raw bit-set.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidFrequency` for unknown bits or when
    /// `one_on_two` is combined with ordinal bits.
    pub fn new(bits: u8) -> Result<Self> {
        if bits & !KNOWN != 0 {
            return Err(EngineError::InvalidFrequency(format!(
                "unknown bits in {bits:#08b}"
            )));
        }
        if bits & Self::ONE_ON_TWO.0 != 0 && bits != Self::ONE_ON_TWO.0 {
            return Err(EngineError::InvalidFrequency(format!(
                "one_on_two cannot be combined with week ordinals ({bits:#08b})"
            )));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_ponctual(self) -> bool {
        self.0 == 0
    }

    pub fn is_every(self) -> bool {
        self == Self::EVERY
    }

    pub fn is_one_on_two(self) -> bool {
        self == Self::ONE_ON_TWO
    }

    /// The name of this frequency, if it is one of the named combinations.
    pub fn name(self) -> Option<&'static str> {
        NAMES.iter().find(|(_, f)| *f == self).map(|(n, _)| *n)
    }

    /// Dates of `month` selected by this rule for a schedule anchored at `anchor`.
    ///
    /// Ordinals index the anchor's weekday within the month starting at 1,
    /// independent of which weekday the month starts on. `last` always picks the
    /// final match, whether the month has four or five of them. The result is
    /// sorted ascending.
    pub fn occurrences_in_month(self, anchor: NaiveDate, month: YearMonth) -> Vec<NaiveDate> {
        if self.is_ponctual() {
            return Vec::new();
        }

        let weekday = anchor.weekday();
        let candidates: Vec<NaiveDate> = month.days().filter(|d| d.weekday() == weekday).collect();

        if self.is_one_on_two() {
            return candidates
                .into_iter()
                .filter(|d| (*d - anchor).num_days().rem_euclid(14) == 0)
                .collect();
        }

        if self.is_every() {
            return candidates;
        }

        let count = candidates.len();
        candidates
            .into_iter()
            .enumerate()
            .filter(|(i, _)| self.selects(i + 1, count))
            .map(|(_, d)| d)
            .collect()
    }

    /// Whether `date` is one of the dates this rule produces for its own month.
    pub fn matches(self, anchor: NaiveDate, date: NaiveDate) -> bool {
        self.occurrences_in_month(anchor, YearMonth::of(date))
            .contains(&date)
    }

    /// Whether the `index`-th (1-based) of `count` weekday matches is selected.
    fn selects(self, index: usize, count: usize) -> bool {
        let ordinal = index <= 4 && self.0 & ORDINALS & (1 << (index - 1)) != 0;
        let last = index == count && self.contains(Self::LAST);
        ordinal || last
    }
}

impl TryFrom<u8> for Frequency {
    type Error = EngineError;

    fn try_from(bits: u8) -> Result<Self> {
        Self::new(bits)
    }
}

impl TryFrom<FrequencyRepr> for Frequency {
    type Error = EngineError;

    fn try_from(repr: FrequencyRepr) -> Result<Self> {
        match repr {
            FrequencyRepr::Bits(bits) => Self::new(bits),
            FrequencyRepr::Name(name) => name.parse(),
        }
    }
}

impl From<Frequency> for u8 {
    fn from(f: Frequency) -> Self {
        f.0
    }
}

impl FromStr for Frequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some((_, f)) = NAMES.iter().find(|(n, _)| n.eq_ignore_ascii_case(s)) {
            return Ok(*f);
        }
        match s.parse::<u8>() {
            Ok(bits) => Self::new(bits),
            Err(_) => Err(EngineError::InvalidFrequency(format!("unknown frequency '{s}'"))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#08b}", self.0),
        }
    }
}
