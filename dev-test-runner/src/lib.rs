//! Payload models generated from `tests/fixtures/asyncapi.yml`.
include!(concat!(env!("OUT_DIR"), "/payloads.rs"));
