//! Hour and calendar-day rolling accumulators
//!
//! Rollover is decided purely from packet-embedded timestamps: the current
//! observation's time against the previously stored time for the same path.
//! A missing prior record always initializes instead of failing, so the
//! very first qualifying observation on a path produces a valid bucket.

use chrono::{DateTime, Timelike, Utc};
use tempest_core::types::StatePath;
use tempest_store::{StateStore, StateValue, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hour,
    Day,
}

/// True when `now` and `prior` fall into the same bucket. No prior
/// observation means no rollover: the bucket initializes in place.
pub fn same_bucket(
    now: DateTime<Utc>,
    prior: Option<DateTime<Utc>>,
    granularity: Granularity,
) -> bool {
    let Some(prior) = prior else {
        return true;
    };
    match granularity {
        // full calendar date, not weekday index: gaps longer than a week
        // must still roll over
        Granularity::Hour => now.date_naive() == prior.date_naive() && now.hour() == prior.hour(),
        Granularity::Day => now.date_naive() == prior.date_naive(),
    }
}

pub(crate) async fn read_number<S: StateStore>(
    store: &S,
    path: &StatePath,
) -> StoreResult<Option<f64>> {
    Ok(store
        .get_current_value(path.as_str())
        .await?
        .and_then(|stored| stored.value.as_f64()))
}

/// Accumulating sum bucket (e.g. rain amount): add within the bucket; on
/// rollover the outgoing value lands in the previous slot before the
/// current slot restarts from `value`.
#[allow(clippy::too_many_arguments)]
pub async fn apply_sum<S: StateStore>(
    store: &S,
    channel: &StatePath,
    current_name: &str,
    previous_name: &str,
    granularity: Granularity,
    value: f64,
    now: DateTime<Utc>,
    prior: Option<DateTime<Utc>>,
) -> StoreResult<()> {
    let current_path = channel.child(current_name);
    let old = read_number(store, &current_path).await?.unwrap_or(0.0);

    let next = if same_bucket(now, prior, granularity) {
        old + value
    } else {
        store
            .upsert_value(
                channel.child(previous_name).as_str(),
                StateValue::Number(old),
                None,
            )
            .await?;
        value
    };
    store
        .upsert_value(current_path.as_str(), StateValue::Number(next), None)
        .await?;
    Ok(())
}

/// Duration bucket: accumulate `increment` while `qualifies` holds. Inside
/// a bucket a non-qualifying tick leaves the slot untouched; on rollover
/// the outgoing value is preserved and the new bucket starts at `increment`
/// or zero.
#[allow(clippy::too_many_arguments)]
pub async fn apply_duration<S: StateStore>(
    store: &S,
    channel: &StatePath,
    current_name: &str,
    previous_name: &str,
    granularity: Granularity,
    qualifies: bool,
    increment: f64,
    now: DateTime<Utc>,
    prior: Option<DateTime<Utc>>,
) -> StoreResult<()> {
    let current_path = channel.child(current_name);
    let old = read_number(store, &current_path).await?.unwrap_or(0.0);

    if same_bucket(now, prior, granularity) {
        if qualifies {
            store
                .upsert_value(
                    current_path.as_str(),
                    StateValue::Number(old + increment),
                    None,
                )
                .await?;
        }
    } else {
        store
            .upsert_value(
                channel.child(previous_name).as_str(),
                StateValue::Number(old),
                None,
            )
            .await?;
        let restart = if qualifies { increment } else { 0.0 };
        store
            .upsert_value(current_path.as_str(), StateValue::Number(restart), None)
            .await?;
    }
    Ok(())
}
