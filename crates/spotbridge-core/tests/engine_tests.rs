//! Engine loading, ABI verification, and the string-bearing exports.

mod common;

use spotbridge_core::{BridgeError, SpotEngine};

#[test]
fn loads_and_reports_the_expected_struct_size() {
    let engine = SpotEngine::load(common::stub_image()).expect("stub engine loads");
    assert_eq!(engine.struct_size(), 128);
}

#[test]
fn malformed_image_fails_to_load() {
    let err = SpotEngine::load(b"\0asm not actually a module").unwrap_err();
    assert!(matches!(err, BridgeError::Load(_)), "got {err:?}");
}

#[test]
fn struct_size_drift_is_fatal_before_any_handle_exists() {
    let err = SpotEngine::load(common::mismatched_image(64)).unwrap_err();
    match err {
        BridgeError::AbiMismatch { reported, expected } => {
            assert_eq!(reported, 64);
            assert_eq!(expected, 128);
        }
        other => panic!("expected AbiMismatch, got {other:?}"),
    }
}

#[test]
fn version_is_nul_trimmed() {
    let engine = SpotEngine::load(common::stub_image()).expect("stub engine loads");
    assert_eq!(engine.version().expect("version readable"), "2.0b");
}

#[test]
fn low_error_codes_have_distinct_registered_messages() {
    let engine = SpotEngine::load(common::stub_image()).expect("stub engine loads");
    let messages: Vec<String> = (1000..=1004)
        .map(|code| engine.error_message(code).expect("translation succeeds"))
        .collect();
    for message in &messages {
        assert!(!message.is_empty());
    }
    for (i, a) in messages.iter().enumerate() {
        for b in &messages[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn codes_past_the_registered_range_translate_to_empty() {
    // The boundary of the registered range belongs to the engine; all the
    // bridge guarantees is that an unregistered code is not an error.
    let engine = SpotEngine::load(common::stub_image()).expect("stub engine loads");
    assert_eq!(engine.error_message(1500).expect("translation succeeds"), "");
    assert_eq!(engine.error_message(0).expect("translation succeeds"), "");
}

#[test]
fn allocator_exhaustion_is_surfaced_not_forwarded() {
    let engine =
        SpotEngine::load(common::exhausted_allocator_image()).expect("stub engine loads");
    let err = engine.version().unwrap_err();
    assert!(matches!(err, BridgeError::Allocation { .. }), "got {err:?}");
}
