//! Built-in sample batch used when no facts file is given.

use crate::types::{Fact, FactQuery};

const SAMPLE_INDICATOR_ID: i64 = 227_373;
const SAMPLE_USER_ID: i64 = 40;
const SAMPLE_COMMENT: &str = "buffer Last_name";
const SAMPLE_PERIOD_START: &str = "2024-12-01";
const SAMPLE_PERIOD_END: &str = "2024-12-31";

/// `count` monthly facts for December 2024 with values `1..=count`.
pub fn sample_batch(count: u32) -> Vec<Fact> {
    (1..=count)
        .map(|value| Fact {
            period_start: SAMPLE_PERIOD_START.to_string(),
            period_end: SAMPLE_PERIOD_END.to_string(),
            period_key: "month".to_string(),
            indicator_to_mo_id: SAMPLE_INDICATOR_ID,
            indicator_to_mo_fact_id: 0,
            value: i64::from(value),
            fact_time: SAMPLE_PERIOD_END.to_string(),
            is_plan: false,
            auth_user_id: SAMPLE_USER_ID,
            comment: SAMPLE_COMMENT.to_string(),
        })
        .collect()
}

/// Query matching the sample batch.
pub fn sample_query() -> FactQuery {
    FactQuery {
        period_start: SAMPLE_PERIOD_START.to_string(),
        period_end: SAMPLE_PERIOD_END.to_string(),
        period_key: "month".to_string(),
        indicator_to_mo_id: SAMPLE_INDICATOR_ID,
    }
}
