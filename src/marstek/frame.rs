use crate::prelude::*;

use bytes::{BufMut, BytesMut};
use serde_json::Value;

pub const SOH: u8 = 0x01;
pub const STX: u8 = 0x02;
pub const ETX: u8 = 0x03;
pub const SEPARATOR: char = '|';

pub const FIELD_COUNT: usize = 32;

/// Positional field names of a meter response body, in wire order.
pub const LABELS: [&str; FIELD_COUNT] = [
    "meter_dev_type",
    "meter_mac_code",
    "hhm_dev_type",
    "hhm_mac_code",
    "A_phase_power",
    "B_phase_power",
    "C_phase_power",
    "A_charge_power",
    "B_charge_power",
    "C_charge_power",
    "total_power",
    "A_discharge_power",
    "B_discharge_power",
    "C_discharge_power",
    "Total_charge_power",
    "Total_discharge_power",
    "A_chrg_nb",
    "B_chrg_nb",
    "C_chrg_nb",
    "ABC_chrg_nb",
    "wifi_rssi",
    "info_idx",
    "x_chrg_power",
    "A_chrg_power",
    "B_chrg_power",
    "C_chrg_power",
    "ABC_chrg_power",
    "x_dchrg_power",
    "A_dchrg_power",
    "B_dchrg_power",
    "C_dchrg_power",
    "ABC_dchrg_power",
];

/// The five identity fields sent in every request. The two reserved fields
/// are fixed at "0" and not configurable. Fields are concatenated verbatim;
/// a field containing '|' is undefined behaviour on the meter side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub device_type: String,
    pub battery_mac: String,
    pub ct_type: String,
    pub ct_mac: String,
}

/// One poll's decoded response: the 32 labelled fields in wire order.
/// Values are integers where the text parses as one, raw text otherwise,
/// and Null for fields beyond the received count.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricSnapshot {
    values: Vec<Value>,
}

impl MetricSnapshot {
    pub fn new(mut values: Vec<Value>) -> Self {
        values.resize(FIELD_COUNT, Value::Null);
        Self { values }
    }

    fn index(label: &str) -> Option<usize> {
        LABELS.iter().position(|l| *l == label)
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        Self::index(label).map(|i| &self.values[i])
    }

    /// Integer value of a field, with missing/null/non-numeric degrading
    /// to 0 so partial responses flow through as zeros.
    pub fn int(&self, label: &str) -> i64 {
        match self.get(label) {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn watts(&self, label: &str) -> f64 {
        self.int(label) as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        LABELS.iter().copied().zip(self.values.iter())
    }
}

/// The frame's length field encodes the total frame length including its own
/// digits, so the digit count feeds back into the value. Grow the assumed
/// digit count until it matches the width of the candidate total. Converges
/// within a couple of rounds for any realistic identity.
fn solve_total_length(base: usize) -> usize {
    let mut digits = 1;
    for _ in 0..4 {
        let total = base + digits;
        let width = total.to_string().len();
        if width == digits {
            return total;
        }
        digits = width;
    }
    base + digits
}

/// Build the request frame for an identity. Pure function of the identity;
/// the meter transport builds it once and reuses it for every poll.
pub fn build_request(identity: &Identity) -> Vec<u8> {
    let body = format!(
        "|{}|{}|{}|{}|0|0",
        identity.device_type, identity.battery_mac, identity.ct_type, identity.ct_mac
    );

    // SOH + STX + body + ETX + 2 checksum digits, before the length digits
    let base = 1 + 1 + body.len() + 1 + 2;
    let total = solve_total_length(base);

    let mut frame = BytesMut::with_capacity(total);
    frame.put_u8(SOH);
    frame.put_u8(STX);
    frame.put(total.to_string().as_bytes());
    frame.put(body.as_bytes());
    frame.put_u8(ETX);

    let xor = frame.iter().fold(0u8, |acc, b| acc ^ b);
    frame.put(format!("{:02x}", xor).as_bytes());

    frame.to_vec()
}

/// Decode a response frame into a snapshot.
///
/// The header is SOH, STX and the ASCII digits of the total-length field;
/// the prefix width follows the digit run rather than assuming two digits,
/// so a frame whose length field grows to three digits still decodes. The
/// trailer is ETX plus two checksum digits, stripped unvalidated. The body
/// splits on '|' with the segment before the leading separator discarded,
/// then maps positionally onto the 32 labels.
pub fn decode_response(data: &[u8]) -> Result<MetricSnapshot, FetchError> {
    let digits = data
        .iter()
        .skip(2)
        .take_while(|b| b.is_ascii_digit())
        .count();
    let prefix = 2 + digits;

    if digits == 0 || data.len() < prefix + 3 {
        return Err(FetchError::Decode(format!(
            "frame too short: {} bytes",
            data.len()
        )));
    }

    let body = &data[prefix..data.len() - 3];
    let body = match std::str::from_utf8(body) {
        Ok(text) if text.is_ascii() => text,
        _ => return Err(FetchError::Decode("invalid ASCII encoding".to_string())),
    };

    let mut fields = body.split(SEPARATOR);
    fields.next(); // everything before the leading separator maps to no field

    let values = LABELS
        .iter()
        .map(|_| match fields.next() {
            Some(text) => match text.parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(text.to_string()),
            },
            None => Value::Null,
        })
        .collect();

    Ok(MetricSnapshot::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_length_is_self_consistent() {
        // base sizes either side of the digit-count boundaries
        for base in [7, 8, 9, 10, 96, 97, 98, 99, 100, 500, 995, 996, 9995] {
            let total = solve_total_length(base);
            assert_eq!(
                total,
                base + total.to_string().len(),
                "base {} gave total {}",
                base,
                total
            );
        }
    }

    #[test]
    fn snapshot_unknown_label_is_zero() {
        let snapshot = MetricSnapshot::new(vec![]);
        assert_eq!(snapshot.get("no_such_field"), None);
        assert_eq!(snapshot.int("no_such_field"), 0);
    }

    #[test]
    fn snapshot_non_numeric_is_zero_watts() {
        let mut values = vec![Value::Null; FIELD_COUNT];
        values[10] = Value::String("n/a".to_string());
        let snapshot = MetricSnapshot::new(values);
        assert_eq!(snapshot.watts("total_power"), 0.0);
    }
}
