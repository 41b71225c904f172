use super::*;
use rust_decimal::Decimal;
use time::{Date, Month, Time};

#[test]
fn truthy_accepts_booleans_numbers_and_text() {
    assert_eq!(Value::Bool(true).truthy(), Some(true));
    assert_eq!(Value::Int(0).truthy(), Some(false));
    assert_eq!(Value::Int(-3).truthy(), Some(true));
    assert_eq!(Value::Text("Yes".into()).truthy(), Some(true));
    assert_eq!(Value::Text("off".into()).truthy(), Some(false));
    assert_eq!(Value::Text("maybe".into()).truthy(), None);
    assert_eq!(Value::Null.truthy(), None);
}

#[test]
fn numeric_comparison_widens_across_variants() {
    let int = Value::Int(42);
    let dec = Value::Decimal(Decimal::new(420, 1));
    let big = Value::IntBig(BigInt::from(42));

    assert_eq!(int.cmp_numeric(&dec), Some(Ordering::Equal));
    assert_eq!(int.cmp_numeric(&big), Some(Ordering::Equal));
    assert_eq!(dec.cmp_numeric(&big), Some(Ordering::Equal));
    assert!(int.loose_eq(&dec));
}

#[test]
fn huge_big_integers_dominate_decimals_by_sign() {
    let huge = Value::IntBig(BigInt::from(10).pow(60));
    let dec = Value::Decimal(Decimal::MAX);

    assert_eq!(huge.cmp_numeric(&dec), Some(Ordering::Greater));

    let negative = Value::IntBig(-BigInt::from(10).pow(60));
    assert_eq!(negative.cmp_numeric(&dec), Some(Ordering::Less));
}

#[test]
fn text_operations_casefold() {
    let value = Value::Text("User-050".into());

    assert_eq!(value.text_contains("user", TextMode::Ci), Some(true));
    assert_eq!(value.text_contains("user", TextMode::Cs), Some(false));
    assert_eq!(value.text_starts_with("USER", TextMode::Ci), Some(true));
    assert_eq!(value.text_ends_with("050", TextMode::Ci), Some(true));
    assert_eq!(value.text_eq("user-050", TextMode::Ci), Some(true));
}

#[test]
fn temporal_text_forms_are_stable() {
    let date = Date::from_calendar_date(2024, Month::January, 15).unwrap();
    let time = Time::from_hms(9, 5, 0).unwrap();

    assert_eq!(Value::Date(date).to_text().as_deref(), Some("2024-01-15"));
    assert_eq!(Value::Time(time).to_text().as_deref(), Some("09:05:00"));
    assert_eq!(
        Value::DateTime(date.with_time(time)).to_text().as_deref(),
        Some("2024-01-15T09:05:00Z")
    );
}

#[test]
fn canonical_cmp_is_total_for_mixed_variants() {
    let left = Value::Bool(true);
    let right = Value::Text("x".into());

    assert_ne!(left.canonical_cmp(&right), Ordering::Equal);
    assert_eq!(
        left.canonical_cmp(&right),
        right.canonical_cmp(&left).reverse()
    );
}
