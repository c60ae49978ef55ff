//! Proptest strategies for pipeline and registry properties.

use proptest::prelude::*;

/// Number of behaviors wrapped around a handler.
pub fn behavior_count_strategy() -> impl Strategy<Value = usize> {
    0usize..12
}

/// Sequence of registered keys over a small key space so duplicates are common.
pub fn registration_sequence_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, 1..32)
}

/// Message text carried by a request.
pub fn message_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,24}"
}
