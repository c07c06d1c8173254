//! Tests for frequency bit-sets and month date selection.

use airgrid_engine::{EngineError, Frequency, YearMonth};
use chrono::NaiveDate;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn month(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

fn days(dates: &[NaiveDate]) -> Vec<u32> {
    use chrono::Datelike;
    dates.iter().map(|d| d.day()).collect()
}

// Mondays: October 2015 has 4 (5, 12, 19, 26), November 2015 has 5 (2 .. 30).
const MONDAY: (i32, u32, u32) = (2015, 10, 5);

fn monday_anchor() -> NaiveDate {
    date(MONDAY.0, MONDAY.1, MONDAY.2)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn named_combinations_are_valid() {
    for bits in [0u8, 1, 2, 4, 8, 16, 5, 10, 31, 32, 3, 17, 21] {
        assert!(Frequency::new(bits).is_ok(), "{bits:#b} should be valid");
    }
}

#[test]
fn one_on_two_with_ordinals_is_rejected() {
    let err = Frequency::new(0b10_0001).unwrap_err();
    assert!(matches!(err, EngineError::InvalidFrequency(_)));
    assert!(Frequency::new(0b11_1111).is_err());
}

#[test]
fn unknown_bits_are_rejected() {
    assert!(matches!(
        Frequency::new(64),
        Err(EngineError::InvalidFrequency(_))
    ));
}

#[test]
fn composite_constants_match_their_parts() {
    assert_eq!(Frequency::FIRST_AND_THIRD.bits(), 5);
    assert_eq!(Frequency::SECOND_AND_FOURTH.bits(), 10);
    assert_eq!(Frequency::EVERY.bits(), 31);
    assert_eq!(Frequency::ONE_ON_TWO.bits(), 32);
    assert!(Frequency::FIRST_AND_THIRD.contains(Frequency::THIRD));
    assert!(!Frequency::FIRST_AND_THIRD.contains(Frequency::SECOND));
}

#[test]
fn parses_names_and_numbers() {
    assert_eq!("first_and_third".parse::<Frequency>().unwrap(), Frequency::FIRST_AND_THIRD);
    assert_eq!("ONE_ON_TWO".parse::<Frequency>().unwrap(), Frequency::ONE_ON_TWO);
    assert_eq!("10".parse::<Frequency>().unwrap(), Frequency::SECOND_AND_FOURTH);
    assert!("fortnightly".parse::<Frequency>().is_err());
    assert!("33".parse::<Frequency>().is_err());
}

#[test]
fn deserializes_from_number_or_name() {
    let f: Frequency = serde_json::from_str("5").unwrap();
    assert_eq!(f, Frequency::FIRST_AND_THIRD);
    let f: Frequency = serde_json::from_str("\"last\"").unwrap();
    assert_eq!(f, Frequency::LAST);
    assert!(serde_json::from_str::<Frequency>("33").is_err());
    assert_eq!(serde_json::to_string(&Frequency::EVERY).unwrap(), "31");
}

#[test]
fn display_uses_names() {
    assert_eq!(Frequency::SECOND_AND_FOURTH.to_string(), "second_and_fourth");
    assert_eq!(Frequency::new(0b1_0001).unwrap().name(), None);
}

// ---------------------------------------------------------------------------
// Ordinals
// ---------------------------------------------------------------------------

#[test]
fn first_and_third_in_month_starting_on_sunday() {
    // November 2015 starts on a Sunday; Fridays are 6, 13, 20, 27.
    let anchor = date(2015, 10, 23);
    let dates = Frequency::FIRST_AND_THIRD.occurrences_in_month(anchor, month(2015, 11));
    assert_eq!(dates, vec![date(2015, 11, 6), date(2015, 11, 20)]);
}

#[test]
fn second_and_fourth() {
    let dates = Frequency::SECOND_AND_FOURTH.occurrences_in_month(monday_anchor(), month(2015, 11));
    assert_eq!(days(&dates), vec![9, 23]);
}

#[test]
fn last_in_month_with_four_matches() {
    let dates = Frequency::LAST.occurrences_in_month(monday_anchor(), month(2015, 10));
    assert_eq!(dates, vec![date(2015, 10, 26)]);
}

#[test]
fn last_in_month_with_five_matches() {
    let dates = Frequency::LAST.occurrences_in_month(monday_anchor(), month(2015, 11));
    assert_eq!(dates, vec![date(2015, 11, 30)]);
}

#[test]
fn fourth_is_never_the_fifth() {
    let dates = Frequency::FOURTH.occurrences_in_month(monday_anchor(), month(2015, 11));
    assert_eq!(dates, vec![date(2015, 11, 23)]);
}

#[test]
fn fourth_and_last_coincide_in_four_match_month() {
    let f = Frequency::new(Frequency::FOURTH.bits() | Frequency::LAST.bits()).unwrap();
    assert_eq!(days(&f.occurrences_in_month(monday_anchor(), month(2015, 10))), vec![26]);
    assert_eq!(days(&f.occurrences_in_month(monday_anchor(), month(2015, 11))), vec![23, 30]);
}

#[test]
fn every_returns_all_weekday_matches() {
    assert_eq!(
        days(&Frequency::EVERY.occurrences_in_month(monday_anchor(), month(2015, 10))),
        vec![5, 12, 19, 26]
    );
    assert_eq!(
        days(&Frequency::EVERY.occurrences_in_month(monday_anchor(), month(2015, 11))),
        vec![2, 9, 16, 23, 30]
    );
}

#[test]
fn ponctual_produces_nothing() {
    assert!(Frequency::PONCTUAL
        .occurrences_in_month(monday_anchor(), month(2015, 11))
        .is_empty());
}

#[test]
fn leap_february_has_five_of_its_first_weekday() {
    // February 2016 starts on a Monday and has 29 days.
    let dates = Frequency::LAST.occurrences_in_month(monday_anchor(), month(2016, 2));
    assert_eq!(dates, vec![date(2016, 2, 29)]);
}

// ---------------------------------------------------------------------------
// One on two
// ---------------------------------------------------------------------------

#[test]
fn one_on_two_in_anchor_month() {
    let anchor = date(2015, 10, 2);
    let dates = Frequency::ONE_ON_TWO.occurrences_in_month(anchor, month(2015, 10));
    assert_eq!(days(&dates), vec![2, 16, 30]);
}

#[test]
fn one_on_two_carries_across_month_boundary() {
    let anchor = date(2015, 10, 2);
    let dates = Frequency::ONE_ON_TWO.occurrences_in_month(anchor, month(2015, 11));
    assert_eq!(days(&dates), vec![13, 27]);
}

#[test]
fn one_on_two_before_anchor_uses_euclidean_modulo() {
    // 2015-10-16 minus 28 and 42 days.
    let anchor = date(2015, 10, 16);
    let dates = Frequency::ONE_ON_TWO.occurrences_in_month(anchor, month(2015, 9));
    assert_eq!(days(&dates), vec![4, 18]);
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[test]
fn matches_selected_dates_only() {
    let anchor = date(2015, 10, 2);
    assert!(Frequency::ONE_ON_TWO.matches(anchor, date(2015, 11, 13)));
    assert!(!Frequency::ONE_ON_TWO.matches(anchor, date(2015, 11, 6)));
    assert!(Frequency::LAST.matches(monday_anchor(), date(2015, 11, 30)));
    assert!(!Frequency::LAST.matches(monday_anchor(), date(2015, 11, 23)));
    // Right week, wrong weekday.
    assert!(!Frequency::EVERY.matches(monday_anchor(), date(2015, 11, 24)));
}
