use crate::prelude::*;

use crate::marstek::frame::MetricSnapshot;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persisted cumulative energy counters in kWh. The JSON layout matches the
/// historical `energy_totals.json` document, so already-accumulated totals
/// carry over.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyTotals {
    #[serde(default)]
    pub total_power: f64,
    #[serde(rename = "A", default)]
    pub a: f64,
    #[serde(rename = "B", default)]
    pub b: f64,
    #[serde(rename = "C", default)]
    pub c: f64,
}

impl EnergyTotals {
    /// Left-hold integration: the latest instantaneous power is assumed
    /// constant over the whole elapsed interval, including idle time between
    /// polls. Changing this to an average of consecutive samples would break
    /// compatibility with persisted historical totals.
    pub fn integrate(&mut self, snapshot: &MetricSnapshot, delta_hours: f64) {
        self.total_power += snapshot.watts("total_power") * delta_hours / 1000.0;
        self.a += snapshot.watts("A_phase_power") * delta_hours / 1000.0;
        self.b += snapshot.watts("B_phase_power") * delta_hours / 1000.0;
        self.c += snapshot.watts("C_phase_power") * delta_hours / 1000.0;
    }
}

/// How a load resolved, for diagnostics only. Absent and corrupt storage
/// both zero-init; neither is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    Absent,
    Corrupt,
}

/// Durable store for the totals record. Single-process, single-writer; the
/// coordinator re-reads from disk on every accumulation step rather than
/// caching, so state always matches disk across restarts.
#[derive(Clone, Debug)]
pub struct TotalsStore {
    path: PathBuf,
}

impl TotalsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> (EnergyTotals, LoadStatus) {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return (EnergyTotals::default(), LoadStatus::Absent);
            }
            Err(_) => return (EnergyTotals::default(), LoadStatus::Corrupt),
        };

        match serde_json::from_str(&content) {
            Ok(totals) => (totals, LoadStatus::Loaded),
            Err(_) => (EnergyTotals::default(), LoadStatus::Corrupt),
        }
    }

    pub fn save(&self, totals: &EnergyTotals) -> Result<()> {
        let json = serde_json::to_string(totals)?;
        std::fs::write(&self.path, json)
            .map_err(|err| anyhow!("error writing {}: {}", self.path.display(), err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn snapshot(total: i64, a: i64, b: i64, c: i64) -> MetricSnapshot {
        let mut values = vec![Value::Null; crate::marstek::frame::FIELD_COUNT];
        values[4] = Value::from(a); // A_phase_power
        values[5] = Value::from(b); // B_phase_power
        values[6] = Value::from(c); // C_phase_power
        values[10] = Value::from(total); // total_power
        MetricSnapshot::new(values)
    }

    #[test]
    fn zero_interval_changes_nothing() {
        let mut totals = EnergyTotals {
            total_power: 5.0,
            a: 1.0,
            b: 2.0,
            c: 3.0,
        };
        let before = totals.clone();
        totals.integrate(&snapshot(9999, 9999, 9999, 9999), 0.0);
        assert_eq!(totals, before);
    }

    #[test]
    fn one_hour_at_constant_power() {
        let mut totals = EnergyTotals::default();
        totals.integrate(&snapshot(1000, 400, 300, 300), 1.0);
        assert!((totals.total_power - 1.0).abs() < 1e-9);
        assert!((totals.a - 0.4).abs() < 1e-9);
        assert!((totals.b - 0.3).abs() < 1e-9);
        assert!((totals.c - 0.3).abs() < 1e-9);
    }

    #[test]
    fn two_half_steps_equal_one_full_step() {
        let reading = snapshot(750, 250, 250, 250);

        let mut split = EnergyTotals::default();
        split.integrate(&reading, 0.25);
        split.integrate(&reading, 0.25);

        let mut whole = EnergyTotals::default();
        whole.integrate(&reading, 0.5);

        assert!((split.total_power - whole.total_power).abs() < 1e-9);
        assert!((split.a - whole.a).abs() < 1e-9);
        assert!((split.b - whole.b).abs() < 1e-9);
        assert!((split.c - whole.c).abs() < 1e-9);
    }

    #[test]
    fn null_powers_integrate_as_zero() {
        let empty = MetricSnapshot::new(vec![]);
        let mut totals = EnergyTotals {
            total_power: 2.5,
            ..Default::default()
        };
        totals.integrate(&empty, 4.0);
        assert_eq!(totals.total_power, 2.5);
        assert_eq!(totals.a, 0.0);
    }
}
