//! Daily extremum tracking
//!
//! A tracked state `hub.dev.msg.airTemperature` keeps its extrema under
//! `hub.dev.msg.today.min.airTemperature` and the matching `yesterday`
//! slot. Same-day updates write only when the extremum actually moves; a
//! day rollover snapshots today into yesterday and restarts today from the
//! observed value.

use crate::buckets::{read_number, same_bucket, Granularity};
use chrono::{DateTime, Utc};
use tempest_core::types::StatePath;
use tempest_store::{StateStore, StateValue, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

impl Extremum {
    fn key(self) -> &'static str {
        match self {
            Extremum::Min => "min",
            Extremum::Max => "max",
        }
    }

    fn pick(self, a: f64, b: f64) -> f64 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }
}

fn slot_paths(state: &StatePath, extremum: Extremum) -> Option<(StatePath, StatePath)> {
    let (base, leaf) = state.split_leaf()?;
    let today = StatePath::new(base)
        .child("today")
        .child(extremum.key())
        .child(leaf);
    let yesterday = StatePath::new(base)
        .child("yesterday")
        .child(extremum.key())
        .child(leaf);
    Some((today, yesterday))
}

pub async fn apply_min_max<S: StateStore>(
    store: &S,
    state: &StatePath,
    value: f64,
    extremum: Extremum,
    now: DateTime<Utc>,
    prior: Option<DateTime<Utc>>,
) -> StoreResult<()> {
    let Some((today, yesterday)) = slot_paths(state, extremum) else {
        return Ok(());
    };

    match read_number(store, &today).await? {
        // first record for this path: today starts at the observed value
        None => {
            store
                .upsert_value(today.as_str(), StateValue::Number(value), None)
                .await?;
        }
        Some(old) => {
            if same_bucket(now, prior, Granularity::Day) {
                let candidate = extremum.pick(old, value);
                if candidate != old {
                    store
                        .upsert_value(today.as_str(), StateValue::Number(candidate), None)
                        .await?;
                }
            } else {
                // snapshot the outgoing day before restarting today
                store
                    .upsert_value(yesterday.as_str(), StateValue::Number(old), None)
                    .await?;
                store
                    .upsert_value(today.as_str(), StateValue::Number(value), None)
                    .await?;
            }
        }
    }
    Ok(())
}
