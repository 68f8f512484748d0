//! Per-packet processing: decode, address, derive, aggregate
//!
//! One datagram flows through here at a time. Every read-modify-write
//! against the store is awaited before the next field is examined, which
//! serializes all updates for a path by construction; fields are visited in
//! positional order, so a derived value only ever reads values that
//! logically arrived before its trigger.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

use tempest_core::decode;
use tempest_core::derive;
use tempest_core::identity;
use tempest_core::schema::{self, FieldDefinition, FieldKind, MessageSchema};
use tempest_core::types::{Observation, RawValue, StatePath};
use tempest_store::{StateStore, StateValue};

use crate::buckets::{self, Granularity};
use crate::minmax::{self, Extremum};
use crate::{ProcessError, ProcessResult};

/// Connection-alive indicator path; clears itself after a silence window
const CONNECTION_STATE: &str = "info.connection";

/// Engine settings supplied by the host shell
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Station altitude above sea level in meters, for pressure reduction
    pub altitude_m: f64,
    /// Silence window after which the connection indicator clears
    pub connection_expiry: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            altitude_m: 0.0,
            connection_expiry: Duration::from_secs(600),
        }
    }
}

/// The decode-and-derive aggregation engine
pub struct Engine<S> {
    store: S,
    config: EngineConfig,
}

impl<S: StateStore> Engine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process one raw datagram end to end. Per-field problems are logged
    /// and skipped; the returned error covers whole-packet conditions the
    /// caller should log before moving to the next packet.
    pub async fn process_datagram(&self, raw: &[u8]) -> ProcessResult<()> {
        let observation = decode::decode(raw)?;

        // a decodable packet proves the link is alive
        self.store
            .upsert_value(
                CONNECTION_STATE,
                StateValue::Bool(true),
                Some(self.config.connection_expiry),
            )
            .await?;

        self.process_observation(&observation, std::str::from_utf8(raw).ok())
            .await
    }

    /// Process an already-decoded observation. `raw_text` is recorded as
    /// the channel's last-message snapshot when present.
    pub async fn process_observation(
        &self,
        observation: &Observation,
        raw_text: Option<&str>,
    ) -> ProcessResult<()> {
        let Some(message_schema) = schema::message_schema(&observation.message_type) else {
            return Err(ProcessError::UnknownMessageType(
                observation.message_type.clone(),
            ));
        };

        let identity =
            identity::resolve(observation).map_err(|_| ProcessError::Unaddressable)?;
        for node in &identity.device_nodes {
            self.store
                .ensure_node(node.path.as_str(), &node.descriptor)
                .await?;
        }
        let channel = &identity.channel;
        self.store
            .ensure_node(channel.as_str(), message_schema.display_name)
            .await?;

        if let Some(text) = raw_text {
            self.store
                .upsert_value(
                    channel.child("lastMessage").as_str(),
                    StateValue::Text(text.to_string()),
                    None,
                )
                .await?;
        }

        // the previously stored observation time decides bucket rollover;
        // it must be read before this packet's timestamp write lands
        let prior = self.read_prior_timestamp(channel).await?;
        let now = observation.timestamp;

        for (group, values) in &observation.field_groups {
            let Some(group_schema) = message_schema.group(group) else {
                warn!(
                    message_type = %observation.message_type,
                    group = %group,
                    "message contains unknown field group, skipping"
                );
                continue;
            };
            for (index, raw_value) in values.iter().enumerate() {
                let Some(def) = group_schema.fields.get(index) else {
                    warn!(
                        message_type = %observation.message_type,
                        group = %group,
                        index,
                        value = ?raw_value,
                        "message contains unknown field index, skipping"
                    );
                    continue;
                };
                self.apply_field(channel, message_schema, def, raw_value, now, prior)
                    .await?;
            }
        }
        Ok(())
    }

    async fn read_prior_timestamp(
        &self,
        channel: &StatePath,
    ) -> ProcessResult<Option<DateTime<Utc>>> {
        let stored = buckets::read_number(&self.store, &channel.child("timestamp")).await?;
        Ok(stored.and_then(|secs| DateTime::from_timestamp(secs as i64, 0)))
    }

    async fn read_number(&self, path: &StatePath) -> ProcessResult<Option<f64>> {
        Ok(buckets::read_number(&self.store, path).await?)
    }

    async fn write_number(&self, path: &StatePath, value: f64) -> ProcessResult<()> {
        self.store
            .upsert_value(path.as_str(), StateValue::Number(value), None)
            .await?;
        Ok(())
    }

    async fn write_text(&self, path: &StatePath, value: String) -> ProcessResult<()> {
        self.store
            .upsert_value(path.as_str(), StateValue::Text(value), None)
            .await?;
        Ok(())
    }

    async fn apply_field(
        &self,
        channel: &StatePath,
        message_schema: &MessageSchema,
        def: &FieldDefinition,
        raw_value: &RawValue,
        now: Option<DateTime<Utc>>,
        prior: Option<DateTime<Utc>>,
    ) -> ProcessResult<()> {
        let state = channel.child(def.name);

        if def.kind == FieldKind::Text {
            match raw_value {
                RawValue::Text(text) => self.write_text(&state, text.clone()).await?,
                RawValue::Null => debug!(state = %state, "null value, nothing to record"),
                other => warn!(
                    message_type = message_schema.message_type,
                    field = def.name,
                    value = ?other,
                    "expected text value, skipping"
                ),
            }
            return Ok(());
        }

        let Some(mut value) = raw_value.as_f64() else {
            if !raw_value.is_null() {
                warn!(
                    message_type = message_schema.message_type,
                    field = def.name,
                    value = ?raw_value,
                    "expected numeric value, skipping"
                );
            }
            return Ok(());
        };

        // known sensor glitch: a raw 0 hPa reading is discarded outright,
        // with no derived value and no accumulator update
        if def.name == "stationPressure" && value == 0.0 {
            debug!(state = %state, "zero station pressure glitch, discarding");
            return Ok(());
        }

        // zero average strike distance means no lightning was detected
        if def.name == "lightningStrikeAvgDistance" && value == 0.0 {
            value = derive::NO_LIGHTNING_SENTINEL_KM;
        }

        if let Some(now) = now {
            if schema::is_min_tracked(def.name) {
                minmax::apply_min_max(&self.store, &state, value, Extremum::Min, now, prior)
                    .await?;
            }
            if schema::is_max_tracked(def.name) {
                minmax::apply_min_max(&self.store, &state, value, Extremum::Max, now, prior)
                    .await?;
            }
        }

        self.write_number(&state, value).await?;

        match def.name {
            "stationPressure" => {
                self.derive_reduced_pressure(channel, value, now, prior)
                    .await?
            }
            "relativeHumidity" => {
                self.derive_dewpoint(channel, value, now, prior).await?;
                self.derive_feels_like(channel, value, now, prior).await?;
            }
            "windDirection" => {
                let cardinal = derive::cardinal_direction(value);
                self.write_text(&channel.child("windDirectionCardinal"), cardinal.to_string())
                    .await?;
            }
            "windSpeed" | "windGust" | "windLull" | "windAvg" => {
                self.derive_beaufort(channel, def.name, value, now, prior)
                    .await?
            }
            "sensor_status" => {
                let text = derive::sensor_status_text(value as u32);
                self.write_text(&channel.child("sensor_statusText"), text)
                    .await?;
            }
            "precipAccumulated" => self.apply_rain(channel, value, now, prior).await?,
            "solarRadiation" => self.apply_sunshine(channel, value, now, prior).await?,
            _ => {}
        }
        Ok(())
    }

    /// Sea-level reduction, triggered by a station pressure reading. Falls
    /// back to standard-atmosphere temperature and humidity until real
    /// readings have arrived.
    async fn derive_reduced_pressure(
        &self,
        channel: &StatePath,
        station_pressure: f64,
        now: Option<DateTime<Utc>>,
        prior: Option<DateTime<Utc>>,
    ) -> ProcessResult<()> {
        let temperature = self
            .read_number(&channel.child("airTemperature"))
            .await?
            .unwrap_or(derive::DEFAULT_TEMPERATURE_C);
        let humidity = self
            .read_number(&channel.child("relativeHumidity"))
            .await?
            .unwrap_or(derive::DEFAULT_HUMIDITY_PCT);

        let reduced =
            derive::reduced_pressure(station_pressure, temperature, humidity, self.config.altitude_m);
        let state = channel.child("reducedPressure");
        if let Some(now) = now {
            minmax::apply_min_max(&self.store, &state, reduced, Extremum::Min, now, prior).await?;
            minmax::apply_min_max(&self.store, &state, reduced, Extremum::Max, now, prior).await?;
        }
        self.write_number(&state, reduced).await
    }

    /// Dewpoint, triggered by humidity; temperature precedes humidity in
    /// every observation layout, so the stored reading is current
    async fn derive_dewpoint(
        &self,
        channel: &StatePath,
        humidity: f64,
        now: Option<DateTime<Utc>>,
        prior: Option<DateTime<Utc>>,
    ) -> ProcessResult<()> {
        let Some(temperature) = self.read_number(&channel.child("airTemperature")).await? else {
            debug!(channel = %channel, "air temperature not yet known, skipping dewpoint");
            return Ok(());
        };

        let dewpoint = derive::dewpoint(temperature, humidity);
        let state = channel.child("dewpoint");
        if let Some(now) = now {
            minmax::apply_min_max(&self.store, &state, dewpoint, Extremum::Min, now, prior).await?;
            minmax::apply_min_max(&self.store, &state, dewpoint, Extremum::Max, now, prior).await?;
        }
        self.write_number(&state, dewpoint).await
    }

    async fn derive_feels_like(
        &self,
        channel: &StatePath,
        humidity: f64,
        now: Option<DateTime<Utc>>,
        prior: Option<DateTime<Utc>>,
    ) -> ProcessResult<()> {
        let Some(temperature) = self.read_number(&channel.child("airTemperature")).await? else {
            debug!(channel = %channel, "air temperature not yet known, skipping feels-like");
            return Ok(());
        };
        let Some(wind_avg) = self.read_number(&channel.child("windAvg")).await? else {
            debug!(channel = %channel, "average wind not yet known, skipping feels-like");
            return Ok(());
        };

        let feels_like = derive::feels_like(temperature, wind_avg, humidity);
        let state = channel.child("feelsLike");
        if let Some(now) = now {
            minmax::apply_min_max(&self.store, &state, feels_like, Extremum::Min, now, prior)
                .await?;
            minmax::apply_min_max(&self.store, &state, feels_like, Extremum::Max, now, prior)
                .await?;
        }
        self.write_number(&state, feels_like).await
    }

    /// Beaufort force, one derived state per source field so gust, lull,
    /// average and instantaneous speeds do not overwrite each other
    async fn derive_beaufort(
        &self,
        channel: &StatePath,
        source_field: &str,
        speed: f64,
        now: Option<DateTime<Utc>>,
        prior: Option<DateTime<Utc>>,
    ) -> ProcessResult<()> {
        let state_name = match source_field {
            "windGust" => "beaufortGust",
            "windLull" => "beaufortLull",
            "windAvg" => "beaufortAvg",
            _ => "beaufort",
        };
        let force = f64::from(derive::beaufort(speed));
        let state = channel.child(state_name);
        if let Some(now) = now {
            minmax::apply_min_max(&self.store, &state, force, Extremum::Max, now, prior).await?;
        }
        self.write_number(&state, force).await
    }

    async fn apply_rain(
        &self,
        channel: &StatePath,
        accumulated: f64,
        now: Option<DateTime<Utc>>,
        prior: Option<DateTime<Utc>>,
    ) -> ProcessResult<()> {
        let raining = accumulated > 0.0;
        self.store
            .upsert_value(
                channel.child("isRaining").as_str(),
                StateValue::Bool(raining),
                None,
            )
            .await?;

        let Some(now) = now else {
            debug!(channel = %channel, "observation has no timestamp, skipping rain buckets");
            return Ok(());
        };

        buckets::apply_sum(
            &self.store,
            channel,
            "precipAccumulatedCurrentHour",
            "precipAccumulatedPreviousHour",
            Granularity::Hour,
            accumulated,
            now,
            prior,
        )
        .await?;
        buckets::apply_sum(
            &self.store,
            channel,
            "precipAccumulatedToday",
            "precipAccumulatedYesterday",
            Granularity::Day,
            accumulated,
            now,
            prior,
        )
        .await?;

        // durations and intensity need the sensor's report interval; a
        // wrong interval would silently corrupt the accumulators, so the
        // tick is skipped rather than defaulted
        let Some(interval_min) = self.read_number(&channel.child("reportInterval")).await? else {
            debug!(channel = %channel, "report interval not yet known, skipping rain duration");
            return Ok(());
        };
        if interval_min <= 0.0 {
            warn!(channel = %channel, interval_min, "implausible report interval, skipping rain duration");
            return Ok(());
        }

        buckets::apply_duration(
            &self.store,
            channel,
            "precipDurationCurrentHour",
            "precipDurationPreviousHour",
            Granularity::Hour,
            raining,
            interval_min,
            now,
            prior,
        )
        .await?;
        buckets::apply_duration(
            &self.store,
            channel,
            "precipDurationToday",
            "precipDurationYesterday",
            Granularity::Day,
            raining,
            interval_min / 60.0,
            now,
            prior,
        )
        .await?;

        let rate = derive::rain_rate_mm_per_hour(accumulated, interval_min);
        self.write_text(
            &channel.child("rainIntensity"),
            derive::classify_rain_rate(rate).label().to_string(),
        )
        .await
    }

    async fn apply_sunshine(
        &self,
        channel: &StatePath,
        radiation: f64,
        now: Option<DateTime<Utc>>,
        prior: Option<DateTime<Utc>>,
    ) -> ProcessResult<()> {
        self.store
            .upsert_value(
                channel.child("isSunny").as_str(),
                StateValue::Bool(radiation >= derive::SUNSHINE_THRESHOLD_WM2),
                None,
            )
            .await?;

        let Some(now) = now else {
            debug!(channel = %channel, "observation has no timestamp, skipping sunshine buckets");
            return Ok(());
        };
        let Some(interval_min) = self.read_number(&channel.child("reportInterval")).await? else {
            debug!(channel = %channel, "report interval not yet known, skipping sunshine duration");
            return Ok(());
        };
        if interval_min <= 0.0 {
            warn!(channel = %channel, interval_min, "implausible report interval, skipping sunshine duration");
            return Ok(());
        }

        let sunny = radiation > derive::SUNSHINE_THRESHOLD_WM2;
        buckets::apply_duration(
            &self.store,
            channel,
            "sunshineDurationCurrentHour",
            "sunshineDurationPreviousHour",
            Granularity::Hour,
            sunny,
            interval_min,
            now,
            prior,
        )
        .await?;
        buckets::apply_duration(
            &self.store,
            channel,
            "sunshineDurationToday",
            "sunshineDurationYesterday",
            Granularity::Day,
            sunny,
            interval_min / 60.0,
            now,
            prior,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempest_store::MemoryStore;

    const BASE: &str = "HB-00054321.ST-00012345.obs_st";

    fn engine(altitude_m: f64) -> Engine<Arc<MemoryStore>> {
        Engine::new(
            Arc::new(MemoryStore::new()),
            EngineConfig {
                altitude_m,
                ..EngineConfig::default()
            },
        )
    }

    /// Tempest observation with the fields the tests care about; the rest
    /// stay at quiet-weather values
    fn obs_st(ts: i64, pressure: f64, temperature: f64, humidity: f64, precip: f64, solar: f64) -> Vec<u8> {
        json!({
            "serial_number": "ST-00012345",
            "type": "obs_st",
            "hub_sn": "HB-00054321",
            "obs": [[
                ts, 0.2, 1.3, 2.7, 187, 3, pressure, temperature, humidity,
                24000, 2.5, solar, precip, 0, 0, 0, 2.61, 5
            ]],
            "firmware_revision": 129
        })
        .to_string()
        .into_bytes()
    }

    async fn number(engine: &Engine<Arc<MemoryStore>>, path: &str) -> Option<f64> {
        engine
            .store()
            .get_current_value(path)
            .await
            .unwrap()
            .and_then(|stored| stored.value.as_f64())
    }

    async fn text(engine: &Engine<Arc<MemoryStore>>, path: &str) -> Option<String> {
        engine
            .store()
            .get_current_value(path)
            .await
            .unwrap()
            .and_then(|stored| stored.value.as_text().map(str::to_string))
    }

    #[tokio::test]
    async fn test_obs_st_end_to_end() {
        let engine = engine(100.0);
        let packet = obs_st(1700000000, 1013.0, 20.0, 60.0, 0.0, 540.0);
        engine.process_datagram(&packet).await.unwrap();

        // raw fields landed under the channel path
        assert_eq!(number(&engine, &format!("{BASE}.airTemperature")).await, Some(20.0));
        assert_eq!(number(&engine, &format!("{BASE}.relativeHumidity")).await, Some(60.0));
        assert_eq!(number(&engine, &format!("{BASE}.timestamp")).await, Some(1700000000.0));

        // derived values
        assert_eq!(number(&engine, &format!("{BASE}.dewpoint")).await, Some(12.0));
        assert_eq!(text(&engine, &format!("{BASE}.windDirectionCardinal")).await.as_deref(), Some("S"));
        assert_eq!(number(&engine, &format!("{BASE}.beaufortAvg")).await, Some(1.0));
        assert_eq!(number(&engine, &format!("{BASE}.beaufortGust")).await, Some(2.0));
        assert_eq!(
            engine.store().get_current_value(&format!("{BASE}.isSunny")).await.unwrap().unwrap().value.as_bool(),
            Some(true)
        );

        // devices and channel registered
        let store = engine.store();
        assert_eq!(store.node_descriptor("HB-00054321").await.as_deref(), Some("Hub: HB-00054321"));
        assert_eq!(
            store.node_descriptor("HB-00054321.ST-00012345").await.as_deref(),
            Some("Tempest: ST-00012345")
        );
        assert_eq!(
            store.node_descriptor(BASE).await.as_deref(),
            Some("Observation (Tempest)")
        );

        // link indicator and raw snapshot
        assert_eq!(
            store.get_current_value("info.connection").await.unwrap().unwrap().value.as_bool(),
            Some(true)
        );
        assert!(text(&engine, &format!("{BASE}.lastMessage")).await.unwrap().contains("obs_st"));
    }

    #[tokio::test]
    async fn test_reduced_pressure_uses_last_known_readings() {
        let engine = engine(100.0);

        // first packet: pressure precedes temperature and humidity, so the
        // reduction runs on standard-atmosphere defaults
        engine
            .process_datagram(&obs_st(1700000000, 1013.0, 20.0, 60.0, 0.0, 0.0))
            .await
            .unwrap();
        let first = number(&engine, &format!("{BASE}.reducedPressure")).await.unwrap();

        // second packet: last-known readings are now 20 °C / 60 %
        engine
            .process_datagram(&obs_st(1700000060, 1013.0, 20.0, 60.0, 0.0, 0.0))
            .await
            .unwrap();
        let second = number(&engine, &format!("{BASE}.reducedPressure")).await.unwrap();

        assert!((second - 1024.8).abs() < 0.05, "got {second}");
        // defaults (15 °C, 50 %) give a different reduction than the real readings
        assert!((first - second).abs() > 0.05);
    }

    #[tokio::test]
    async fn test_station_pressure_glitch_is_discarded() {
        let engine = engine(100.0);
        engine
            .process_datagram(&obs_st(1700000000, 0.0, 20.0, 60.0, 0.0, 0.0))
            .await
            .unwrap();

        assert_eq!(number(&engine, &format!("{BASE}.stationPressure")).await, None);
        assert_eq!(number(&engine, &format!("{BASE}.reducedPressure")).await, None);
        assert_eq!(number(&engine, &format!("{BASE}.today.min.stationPressure")).await, None);
        assert_eq!(number(&engine, &format!("{BASE}.today.max.stationPressure")).await, None);

        // the rest of the packet was still processed
        assert_eq!(number(&engine, &format!("{BASE}.airTemperature")).await, Some(20.0));
    }

    #[tokio::test]
    async fn test_lightning_distance_sentinel() {
        let engine = engine(0.0);
        engine
            .process_datagram(&obs_st(1700000000, 1000.0, 15.0, 50.0, 0.0, 0.0))
            .await
            .unwrap();
        // strike distance 0 in the packet means nothing was detected
        assert_eq!(
            number(&engine, &format!("{BASE}.lightningStrikeAvgDistance")).await,
            Some(999.0)
        );
    }

    #[tokio::test]
    async fn test_rain_buckets_and_intensity() {
        let engine = engine(0.0);

        // first packet: report interval unknown until it is stored, so only
        // the amount buckets move
        engine
            .process_datagram(&obs_st(1700000000, 1000.0, 15.0, 50.0, 1.0, 0.0))
            .await
            .unwrap();
        assert_eq!(number(&engine, &format!("{BASE}.precipAccumulatedCurrentHour")).await, Some(1.0));
        assert_eq!(number(&engine, &format!("{BASE}.precipDurationCurrentHour")).await, None);

        // second packet, same hour: interval known from the first packet
        engine
            .process_datagram(&obs_st(1700000300, 1000.0, 15.0, 50.0, 1.0, 0.0))
            .await
            .unwrap();
        assert_eq!(number(&engine, &format!("{BASE}.precipAccumulatedCurrentHour")).await, Some(2.0));
        assert_eq!(number(&engine, &format!("{BASE}.precipDurationCurrentHour")).await, Some(5.0));

        // 1 mm per 5-minute interval is 12 mm/h
        assert_eq!(text(&engine, &format!("{BASE}.rainIntensity")).await.as_deref(), Some("heavy"));
        assert_eq!(
            engine.store().get_current_value(&format!("{BASE}.isRaining")).await.unwrap().unwrap().value.as_bool(),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_hourly_rollover_property() {
        let engine = engine(0.0);

        // 24 observations spaced one hour apart within one calendar day,
        // rain amounts 1..=24
        let day_start = 1714521600; // 2024-05-01 00:00:00 UTC
        for hour in 0..24i64 {
            let packet = obs_st(
                day_start + hour * 3600,
                1000.0,
                15.0,
                50.0,
                (hour + 1) as f64,
                0.0,
            );
            engine.process_datagram(&packet).await.unwrap();
        }

        assert_eq!(number(&engine, &format!("{BASE}.precipAccumulatedCurrentHour")).await, Some(24.0));
        assert_eq!(number(&engine, &format!("{BASE}.precipAccumulatedPreviousHour")).await, Some(23.0));
        assert_eq!(number(&engine, &format!("{BASE}.precipAccumulatedToday")).await, Some(300.0));

        // max tracking is monotone: the day's maximum temperature is the
        // last (highest) reading seen
        assert_eq!(number(&engine, &format!("{BASE}.today.max.airTemperature")).await, Some(15.0));
    }

    #[tokio::test]
    async fn test_day_rollover_snapshots_yesterday() {
        let engine = engine(0.0);
        let day_start = 1714521600; // 2024-05-01 00:00:00 UTC

        engine
            .process_datagram(&obs_st(day_start + 23 * 3600, 1000.0, 18.0, 50.0, 3.0, 0.0))
            .await
            .unwrap();
        // first observation of the next day
        engine
            .process_datagram(&obs_st(day_start + 24 * 3600, 1000.0, 12.0, 50.0, 0.5, 0.0))
            .await
            .unwrap();

        assert_eq!(number(&engine, &format!("{BASE}.precipAccumulatedYesterday")).await, Some(3.0));
        assert_eq!(number(&engine, &format!("{BASE}.precipAccumulatedToday")).await, Some(0.5));
        assert_eq!(number(&engine, &format!("{BASE}.yesterday.max.airTemperature")).await, Some(18.0));
        assert_eq!(number(&engine, &format!("{BASE}.today.max.airTemperature")).await, Some(12.0));
    }

    #[tokio::test]
    async fn test_device_status_sensor_text() {
        let engine = engine(0.0);
        let packet = json!({
            "serial_number": "AR-00004049",
            "type": "device_status",
            "hub_sn": "HB-00054321",
            "timestamp": 1700000000,
            "uptime": 2189,
            "voltage": 3.50,
            "firmware_revision": 17,
            "rssi": -17,
            "hub_rssi": -87,
            "sensor_status": 9,
            "debug": 0
        })
        .to_string();
        engine.process_datagram(packet.as_bytes()).await.unwrap();

        assert_eq!(
            text(&engine, "HB-00054321.AR-00004049.device_status.sensor_statusText").await.as_deref(),
            Some("Lightning failed, Pressure failed")
        );
        assert_eq!(
            number(&engine, "HB-00054321.AR-00004049.device_status.voltage").await,
            Some(3.5)
        );
    }

    #[tokio::test]
    async fn test_rapid_wind_cardinal_and_beaufort() {
        let engine = engine(0.0);
        let packet = json!({
            "serial_number": "SK-00008453",
            "type": "rapid_wind",
            "hub_sn": "HB-00054321",
            "ob": [1700000000, 2.0, 90]
        })
        .to_string();
        engine.process_datagram(packet.as_bytes()).await.unwrap();

        let base = "HB-00054321.SK-00008453.rapid_wind";
        assert_eq!(text(&engine, &format!("{base}.windDirectionCardinal")).await.as_deref(), Some("E"));
        assert_eq!(number(&engine, &format!("{base}.beaufort")).await, Some(2.0));
        assert_eq!(number(&engine, &format!("{base}.today.max.windSpeed")).await, Some(2.0));
    }

    #[tokio::test]
    async fn test_whole_packet_failures() {
        let engine = engine(0.0);

        let err = engine.process_datagram(b"{ not json").await.unwrap_err();
        assert!(matches!(err, ProcessError::Decode(_)));

        let err = engine
            .process_datagram(br#"{"type":"obs_future","serial_number":"ST-1","obs":[[1,2]]}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::UnknownMessageType(_)));

        let err = engine
            .process_datagram(br#"{"type":"rapid_wind","ob":[1700000000,1.0,90]}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Unaddressable));
    }

    #[tokio::test]
    async fn test_unknown_group_and_index_are_skipped() {
        let engine = engine(0.0);
        let packet = json!({
            "serial_number": "SK-00008453",
            "type": "rapid_wind",
            "hub_sn": "HB-00054321",
            "ob": [1700000000, 2.0, 90, 12345],
            "surprise": [1, 2, 3]
        })
        .to_string();
        // extra group and extra positional value are logged and skipped,
        // the known fields still land
        engine.process_datagram(packet.as_bytes()).await.unwrap();
        assert_eq!(
            number(&engine, "HB-00054321.SK-00008453.rapid_wind.windSpeed").await,
            Some(2.0)
        );
    }
}
