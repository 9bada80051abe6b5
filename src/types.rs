//! Core record types for the write and read paths.
//!
//! A [`Fact`] is one reportable measurement. Field order here is the key
//! order of the form-encoded body sent to the remote service.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Fact
// ============================================================================

/// One reportable measurement submitted to the remote service.
///
/// Values are passed through as-is: dates are ISO 8601 strings that are
/// never parsed, nothing checks that `period_start <= period_end` or that
/// ids are positive, and negative numbers are rendered as plain decimal
/// strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub period_start: String,
    pub period_end: String,
    /// Granularity tag, e.g. `"month"`. Opaque to this crate.
    pub period_key: String,
    pub indicator_to_mo_id: i64,
    /// 0 asks the service to create a new fact.
    pub indicator_to_mo_fact_id: i64,
    pub value: i64,
    pub fact_time: String,
    /// Encoded as `0`/`1` on the wire.
    #[serde(with = "plan_flag")]
    pub is_plan: bool,
    pub auth_user_id: i64,
    #[serde(default)]
    pub comment: String,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "indicator {} value {} for {}..{} ({}{}) by user {}",
            self.indicator_to_mo_id,
            self.value,
            self.period_start,
            self.period_end,
            self.period_key,
            if self.is_plan { ", plan" } else { "" },
            self.auth_user_id,
        )?;
        if !self.comment.is_empty() {
            write!(f, " \"{}\"", self.comment)?;
        }
        Ok(())
    }
}

/// `is_plan` goes out as an integer flag. When reading batch files both
/// `true`/`false` and `0`/`1` are accepted; any other integer has no `bool`
/// meaning and is a file-format error. A `Fact` already in memory is never
/// checked.
mod plan_flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(is_plan: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*is_plan))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Int(0) => Ok(false),
            Flag::Int(1) => Ok(true),
            Flag::Int(n) => Err(de::Error::custom(format!(
                "is_plan must be 0 or 1, got {n}"
            ))),
        }
    }
}

// ============================================================================
// Fact Query (read path)
// ============================================================================

/// Parameters for fetching the facts of one indicator over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactQuery {
    pub period_start: String,
    pub period_end: String,
    pub period_key: String,
    pub indicator_to_mo_id: i64,
}
