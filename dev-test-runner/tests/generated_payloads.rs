use dev_test_runner::*;
use mqtt_modelgen::support::{self, Validate};
use mqtt_modelgen::{DecodeError, Model, ValidationError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

const FIXTURE: &str = include_str!("../../tests/fixtures/asyncapi.yml");

fn model() -> Model {
    mqtt_modelgen::compile_str(FIXTURE).unwrap().model()
}

fn round_trip<T>(payload: &[u8]) -> T
where
    T: DeserializeOwned + Serialize + Validate + PartialEq + std::fmt::Debug,
{
    let first: T = support::decode(payload).unwrap();
    let again: T = support::decode(&support::encode(&first).unwrap()).unwrap();
    assert_eq!(again, first);
    first
}

#[test]
fn wrgb_list_becomes_fixed_array() {
    let c: AVRPCMColorSet = support::decode(br#"{"wrgb": [1, 2, 3, 4]}"#).unwrap();
    assert_eq!(c.wrgb_values(), [1, 2, 3, 4]);

    let c: AVRPCMColorSet = support::decode(br#"{"wrgb": [1.0, 2, 3, 4]}"#).unwrap();
    assert_eq!(c.wrgb_values(), [1, 2, 3, 4]);

    assert!(matches!(
        support::decode::<AVRPCMColorSet>(br#"{"wrgb": [1, 2, 3]}"#),
        Err(DecodeError::Parse(_))
    ));
    assert!(support::decode::<AVRPCMColorSet>(br#"{"wrgb": [1, 2, 3, 256]}"#).is_err());
    assert!(support::decode::<AVRPCMColorSet>(br#"{"wrgb": [1, 2, 3, 123.45]}"#).is_err());

    assert!(matches!(AVRPCMColorSetWrgbItem::new(256), Err(ValidationError::Bound { .. })));
    assert_eq!(AVRPCMColorSetWrgbItem::new(255).unwrap().get(), 255);
}

#[test]
fn closed_property_sets() {
    assert!(support::decode::<AVRPCMColorSet>(br#"{"wrgb": [0, 0, 0, 0], "extra": 1}"#).is_err());
    assert!(support::decode::<AVREmptyMessage>(br#"{"x": 1}"#).is_err());
    assert!(support::decode::<AVRPCMColorSet>(b"{}").is_err());
}

#[test]
fn inclusive_and_exclusive_bounds() {
    let servo = |v: i64| format!(r#"{{"servo": {v}, "percent": 50}}"#);
    assert!(support::decode::<AVRPCMServoPercent>(servo(7).as_bytes()).is_ok());
    let err = support::decode::<AVRPCMServoPercent>(servo(8).as_bytes()).unwrap_err();
    assert!(matches!(err, DecodeError::Invalid(ValidationError::Bound { .. })), "{err:?}");

    let speed = |v: i64| format!(r#"{{"servo": 1, "percent": 50, "speed": {v}}}"#);
    assert!(support::decode::<AVRPCMServoPercent>(speed(10).as_bytes()).is_err());
    assert!(support::decode::<AVRPCMServoPercent>(speed(9).as_bytes()).is_ok());
    assert!(support::decode::<AVRPCMServoPercent>(speed(0).as_bytes()).is_err());
    assert!(support::decode::<AVRPCMServoPercent>(speed(1).as_bytes()).is_ok());
}

#[test]
fn optional_fields_take_defaults() {
    let s: AVRPCMServoPercent = support::decode(br#"{"servo": 1, "percent": 0}"#).unwrap();
    assert_eq!(s.mode.as_deref(), Some("absolute"));
    assert_eq!(s.steps, Some(3));
    assert_eq!(s.speed, None);
}

#[test]
fn empty_messages_compare_equal() {
    let a: AVREmptyMessage = support::decode(b"").unwrap();
    let b: AVREmptyMessage = support::decode(b"{}").unwrap();
    assert_eq!(a, b);
    assert_eq!(a, AVREmptyMessage::default());
}

#[test]
fn encode_then_decode_is_stable() {
    round_trip::<AVRPCMColorSet>(br#"{"wrgb": [0, 128, 255, 12]}"#);
    round_trip::<AVRPCMServoPercent>(br#"{"servo": 2, "percent": 12.5, "mode": "relative"}"#);
    round_trip::<AVRFusionPositionNed>(
        br#"{"n": 1, "e": 2, "d": 3, "frame": {}, "origin": {"lat": 1.5, "lon": -2}}"#,
    );
    round_trip::<AVREmptyMessage>(b"");
}

#[test]
fn topics_route_to_message_types() {
    assert_eq!(topics::message_type_for_topic(topics::AVR_PCM_SET_BASE_COLOR), Some("AVRPCMColorSet"));
    assert_eq!(topics::message_type_for_topic("avr/unknown"), None);
}

fn generated<T>(payload: &[u8]) -> Option<serde_json::Value>
where
    T: DeserializeOwned + Serialize + Validate,
{
    support::decode::<T>(payload).ok().map(|v| serde_json::to_value(&v).unwrap())
}

#[test]
fn dynamic_model_agrees_with_generated_types() {
    let m = model();
    let cases: &[(&str, fn(&[u8]) -> Option<serde_json::Value>, &str)] = &[
        ("AVRPCMColorSet", generated::<AVRPCMColorSet>, r#"{"wrgb": [1, 2, 3, 4]}"#),
        ("AVRPCMColorSet", generated::<AVRPCMColorSet>, r#"{"wrgb": [1.0, 2, 3, 4]}"#),
        ("AVRPCMColorSet", generated::<AVRPCMColorSet>, r#"{"wrgb": [1, 2, 3]}"#),
        ("AVRPCMColorSet", generated::<AVRPCMColorSet>, r#"{"wrgb": [1, 2, 3, 256]}"#),
        ("AVRPCMColorSet", generated::<AVRPCMColorSet>, r#"{"wrgb": [0, 0, 0, 0], "x": 1}"#),
        ("AVRPCMColorSet", generated::<AVRPCMColorSet>, ""),
        ("AVRPCMServoPercent", generated::<AVRPCMServoPercent>, r#"{"servo": 7, "percent": 100}"#),
        ("AVRPCMServoPercent", generated::<AVRPCMServoPercent>, r#"{"servo": 8, "percent": 1}"#),
        ("AVRPCMServoPercent", generated::<AVRPCMServoPercent>, r#"{"servo": 1.0, "percent": 1}"#),
        ("AVRPCMServoPercent", generated::<AVRPCMServoPercent>, r#"{"servo": 1, "percent": 100.5}"#),
        ("AVRPCMServoPercent", generated::<AVRPCMServoPercent>, r#"{"servo": 1, "percent": 1, "steps": 2.5}"#),
        ("AVRPCMServoPercent", generated::<AVRPCMServoPercent>, r#"{"servo": 1, "percent": 1, "mode": null}"#),
        ("AVRPCMServoPercent", generated::<AVRPCMServoPercent>, r#"{"servo": 1, "percent": 1, "mode": "sideways"}"#),
        ("AVRFusionPositionNed", generated::<AVRFusionPositionNed>, r#"{"n": 1, "e": 2, "d": 3, "frame": {}}"#),
        ("AVRFusionPositionNed", generated::<AVRFusionPositionNed>, r#"{"n": 1, "e": 2, "d": 3, "frame": null}"#),
        ("AVRFusionPositionNed", generated::<AVRFusionPositionNed>, r#"{"n": 1, "e": 2, "d": 3}"#),
        (
            "AVRFusionPositionNed",
            generated::<AVRFusionPositionNed>,
            r#"{"n": 1, "e": 2, "d": 3, "frame": {}, "origin": {"lat": 91, "lon": 0}}"#,
        ),
        ("AVREmptyMessage", generated::<AVREmptyMessage>, ""),
        ("AVREmptyMessage", generated::<AVREmptyMessage>, "null"),
        ("AVREmptyMessage", generated::<AVREmptyMessage>, r#"{"x": 1}"#),
    ];

    for (class, decode, payload) in cases {
        let dynamic = m.decode(class, payload.as_bytes()).ok().map(|i| i.to_json());
        let typed = decode(payload.as_bytes());
        assert_eq!(dynamic, typed, "{class} {payload}");
    }
}

#[test]
fn generated_json_matches_the_model_shape() {
    let s: AVRPCMServoPercent = support::decode(br#"{"servo": 3, "percent": 42}"#).unwrap();
    assert_eq!(
        serde_json::to_value(&s).unwrap(),
        json!({"servo": 3, "percent": 42.0, "mode": "absolute", "speed": null, "steps": 3})
    );
}
