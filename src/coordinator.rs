use crate::prelude::*;

use crate::energy::{EnergyTotals, LoadStatus, TotalsStore};
use crate::marstek::frame::MetricSnapshot;
use crate::marstek::meter::Meter;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
    Reading(Reading),
    Shutdown,
}

/// One named sensor value as the reporting side sees it. Channels with a
/// cumulative kWh counter carry both, formatted "<instant>;<cumulative>".
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub name: &'static str,
    pub value: String,
}

/// Drives one meter: gates polls to the refresh interval, fetches and
/// decodes, runs the accumulator against the persisted totals, and emits
/// readings. A poll is synchronous end-to-end; the only suspension point is
/// the bounded receive inside the meter transport.
pub struct Coordinator {
    channels: Channels,
    meter: Meter,
    store: TotalsStore,
    refresh_interval: Duration,
    last_update: Option<Instant>,
    last_heartbeat_time: Option<Instant>,
}

impl Coordinator {
    pub fn new(config: &Config, channels: Channels) -> Self {
        Self {
            channels,
            meter: Meter::new(config),
            store: TotalsStore::new(config.totals_file()),
            refresh_interval: config.refresh_interval(),
            last_update: None,
            last_heartbeat_time: None,
        }
    }

    /// Called on every host tick; a no-op until the refresh interval has
    /// elapsed since the last successful poll. A failed poll does not
    /// advance the gate, so the next tick retries immediately.
    pub async fn on_tick(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_update {
            if now.duration_since(last) < self.refresh_interval {
                return;
            }
        }

        self.poll(now).await;
    }

    async fn poll(&mut self, now: Instant) {
        let snapshot = match self.meter.fetch().await {
            Ok(snapshot) => snapshot,
            Err(err) if err.is_timeout() => {
                warn!("error fetching meter data: {}", err);
                return;
            }
            Err(err) => {
                error!("error fetching meter data: {}", err);
                return;
            }
        };

        debug!("meter data: {:?}", snapshot);

        // Interval measured against the previous successful poll, taken
        // after the fetch completed. Lazily initialized, so the first poll
        // integrates over a zero-length interval and attributes no energy.
        let current_time = Instant::now();
        let delta_t = match self.last_heartbeat_time {
            Some(previous) => current_time.duration_since(previous),
            None => Duration::ZERO,
        };
        self.last_heartbeat_time = Some(current_time);

        let delta_hours = delta_t.as_secs_f64() / 3600.0;

        let (mut totals, status) = self.store.load();
        match status {
            LoadStatus::Loaded => {}
            LoadStatus::Absent => info!("no energy totals found, starting from zero"),
            LoadStatus::Corrupt => warn!("energy totals unreadable, starting from zero"),
        }

        totals.integrate(&snapshot, delta_hours);

        if let Err(err) = self.store.save(&totals) {
            error!("error saving energy totals: {}", err);
        }

        self.publish_readings(&snapshot, &totals);

        self.last_update = Some(now);
        debug!("meter data updated");
    }

    fn publish_readings(&self, snapshot: &MetricSnapshot, totals: &EnergyTotals) {
        // the four kWh-tracked channels carry their cumulative counters
        self.emit(
            "total_power",
            format!("{};{:.3}", snapshot.int("total_power"), totals.total_power),
        );
        self.emit(
            "a_phase_power",
            format!("{};{:.3}", snapshot.int("A_phase_power"), totals.a),
        );
        self.emit(
            "b_phase_power",
            format!("{};{:.3}", snapshot.int("B_phase_power"), totals.b),
        );
        self.emit(
            "c_phase_power",
            format!("{};{:.3}", snapshot.int("C_phase_power"), totals.c),
        );

        for (name, label) in [
            ("a_charge_power", "A_charge_power"),
            ("b_charge_power", "B_charge_power"),
            ("c_charge_power", "C_charge_power"),
            ("a_discharge_power", "A_discharge_power"),
            ("b_discharge_power", "B_discharge_power"),
            ("c_discharge_power", "C_discharge_power"),
            ("total_charge_power", "Total_charge_power"),
            ("total_discharge_power", "Total_discharge_power"),
        ] {
            self.emit(name, snapshot.int(label).to_string());
        }

        // the battery aggregate counters report energy in mWh
        let abc_chrg_kwh = snapshot.watts("ABC_chrg_power") / 1_000_000.0;
        self.emit(
            "abc_charge",
            format!("{};{:.3}", snapshot.int("ABC_chrg_nb"), abc_chrg_kwh),
        );

        // the discharge count has no slot in the response; falls back to 0
        let abc_dchrg_kwh = snapshot.watts("ABC_dchrg_power") / 1_000_000.0;
        self.emit(
            "abc_discharge",
            format!("{};{:.3}", snapshot.int("ABC_dchrg_nb"), abc_dchrg_kwh),
        );
    }

    fn emit(&self, name: &'static str, value: String) {
        let _ = self
            .channels
            .readings
            .send(ChannelData::Reading(Reading { name, value }));
    }
}
