#![allow(dead_code)] // not every test binary uses every helper

use marstek_bridge::config::Config;

/// Build a meter-style response frame around arbitrary body fields, with a
/// correct self-referential length field and XOR checksum trailer.
pub fn meter_frame(fields: &[&str]) -> Vec<u8> {
    let body = fields
        .iter()
        .map(|f| format!("|{}", f))
        .collect::<String>();

    let base = 1 + 1 + body.len() + 1 + 2;
    let mut digits = 1;
    let total = loop {
        let candidate = base + digits;
        let width = candidate.to_string().len();
        if width == digits {
            break candidate;
        }
        digits = width;
    };

    let mut frame = vec![0x01, 0x02];
    frame.extend_from_slice(total.to_string().as_bytes());
    frame.extend_from_slice(body.as_bytes());
    frame.push(0x03);
    let xor = frame.iter().fold(0u8, |acc, b| acc ^ b);
    frame.extend_from_slice(format!("{:02x}", xor).as_bytes());
    frame
}

/// A full 32-field response body with the four integrated power channels
/// set and everything else zero.
pub fn full_response(total: i64, a: i64, b: i64, c: i64) -> Vec<u8> {
    let mut fields = vec!["0".to_string(); 32];
    fields[0] = "HME-3".to_string();
    fields[4] = a.to_string();
    fields[5] = b.to_string();
    fields[6] = c.to_string();
    fields[10] = total.to_string();
    let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
    meter_frame(&refs)
}

pub fn test_config(host: &str, port: u16, totals_file: &str) -> Config {
    Config {
        host: host.to_string(),
        port,
        device_type: "HMG-50".to_string(),
        battery_mac: "acd929a739fd".to_string(),
        ct_mac: "009b08069c30".to_string(),
        ct_type: "HME-3".to_string(),
        refresh_interval: 60,
        timeout: 1,
        totals_file: totals_file.to_string(),
        loglevel: "info".to_string(),
    }
}
