use super::*;
use chrono::TimeZone;
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).single().unwrap()
}

#[test]
fn test_numeric_accepts_numbers_and_numeric_strings() {
    assert_eq!(numeric(&json!(3)), Some(3.0));
    assert_eq!(numeric(&json!(2.5)), Some(2.5));
    assert_eq!(numeric(&json!(" 7.25 ")), Some(7.25));
    assert_eq!(numeric(&json!("n/a")), None);
    assert_eq!(numeric(&json!(true)), None);
    assert_eq!(numeric(&json!(null)), None);
    assert_eq!(numeric(&json!([1])), None);
}

#[test]
fn test_sum_numeric_double_counts_nested_matches() {
    let payload = json!({"request_count": 5, "nested": {"request_count": 3}});
    assert_eq!(sum_numeric(&["request_count"], &payload), 8.0);
}

#[test]
fn test_sum_numeric_walks_arrays_and_multiple_keys() {
    let payload = json!({
        "data": [
            {"results": [{"num_model_requests": 4, "input_tokens": 100}]},
            {"results": [{"request_count": "6", "input_tokens": 50}]},
        ]
    });
    assert_eq!(
        sum_numeric(&["num_model_requests", "request_count"], &payload),
        10.0
    );
    assert_eq!(sum_numeric(&["input_tokens"], &payload), 150.0);
    assert_eq!(sum_numeric(&["missing"], &payload), 0.0);
}

#[test]
fn test_sum_cost_reads_nested_amount_value() {
    let payload = json!({
        "data": [
            {"results": [{"amount": {"value": 0.5, "currency": "usd"}}]},
            {"results": [{"amount": {"value": "1.25", "currency": "usd"}}]},
            {"results": [{"cost_usd": 2}]},
        ]
    });
    assert_eq!(sum_cost_usd(&payload, &["cost_usd"], true), 3.75);
    assert_eq!(sum_cost_usd(&payload, &["cost_usd"], false), 2.0);
}

#[test]
fn test_sum_cost_flat_keys_skipped_beside_amount() {
    let payload = json!({
        "data": [{"results": [
            {"amount": {"value": 0.5, "currency": "usd"}, "cost_usd": 0.5, "total_cost_usd": 0.5},
            {"total_cost_usd": "0.25"},
        ]}]
    });
    assert_eq!(sum_cost_usd(&payload, &["cost_usd", "total_cost_usd"], true), 0.75);
    assert_eq!(sum_cost_usd(&payload, &["cost_usd", "total_cost_usd"], false), 1.25);
}

#[test]
fn test_parse_decimal_setting() {
    assert_eq!(parse_decimal_setting("25"), Some(25.0));
    assert_eq!(parse_decimal_setting(" $12.5 "), Some(12.5));
    assert_eq!(parse_decimal_setting("lots"), None);
    assert_eq!(parse_decimal_setting("inf"), None);
}

#[test]
fn test_parse_reset_seconds_forms() {
    assert_eq!(parse_reset("30s", now()), Some(now() + Duration::seconds(30)));
    assert_eq!(parse_reset("60", now()), Some(now() + Duration::seconds(60)));
    assert_eq!(
        parse_reset("45000ms", now()),
        Some(now() + Duration::seconds(45))
    );
    assert_eq!(
        parse_reset("0.5s", now()),
        Some(now() + Duration::milliseconds(500))
    );
}

#[test]
fn test_parse_reset_compound_durations() {
    assert_eq!(parse_reset("6m0s", now()), Some(now() + Duration::seconds(360)));
    assert_eq!(
        parse_reset("1h2m3s", now()),
        Some(now() + Duration::seconds(3723))
    );
    assert_eq!(parse_reset("1m", now()), Some(now() + Duration::seconds(60)));
}

#[test]
fn test_parse_reset_timestamp_and_garbage() {
    let expected = Utc.with_ymd_and_hms(2026, 3, 14, 13, 0, 0).single().unwrap();
    assert_eq!(parse_reset("2026-03-14T13:00:00Z", now()), Some(expected));
    assert_eq!(parse_reset("2026-03-14T14:00:00+01:00", now()), Some(expected));
    assert_eq!(parse_reset("", now()), None);
    assert_eq!(parse_reset("soon", now()), None);
    assert_eq!(parse_reset("-5", now()), None);
}

#[test]
fn test_parse_reset_out_of_range_is_none() {
    assert_eq!(parse_reset("99999999999999", now()), None);
    assert_eq!(parse_reset("99999999999999s", now()), None);
    assert_eq!(parse_reset("99999999999999999ms", now()), None);
    assert_eq!(parse_reset("99999999999999h", now()), None);
    assert_eq!(parse_reset("1e300", now()), None);
}
