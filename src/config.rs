use crate::prelude::*;

use crate::marstek::frame::Identity;
use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub host: String,

    #[serde(default = "Config::default_port")]
    pub port: u16,

    #[serde(default = "Config::default_device_type")]
    pub device_type: String,

    pub battery_mac: String,
    pub ct_mac: String,

    #[serde(default = "Config::default_ct_type")]
    pub ct_type: String,

    /// Minimum seconds between actual network polls. The tick loop runs more
    /// often than this; the coordinator gates on it.
    #[serde(default = "Config::default_refresh_interval")]
    pub refresh_interval: u64,

    /// Receive timeout for one request/response pair, in seconds.
    #[serde(default = "Config::default_timeout")]
    pub timeout: u64,

    #[serde(default = "Config::default_totals_file")]
    pub totals_file: String,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,
}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("error reading {}: {}", file, err))?;
        let config: Self = serde_yaml::from_str(&content)?;

        if config.refresh_interval == 0 {
            bail!("refresh_interval must be a positive number of seconds");
        }

        Ok(config)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn identity(&self) -> Identity {
        Identity {
            device_type: self.device_type.clone(),
            battery_mac: self.battery_mac.clone(),
            ct_type: self.ct_type.clone(),
            ct_mac: self.ct_mac.clone(),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn totals_file(&self) -> &str {
        &self.totals_file
    }

    pub fn loglevel(&self) -> String {
        self.loglevel.clone()
    }

    fn default_port() -> u16 {
        12345
    }

    fn default_device_type() -> String {
        "HMG-50".to_string()
    }

    fn default_ct_type() -> String {
        "HME-3".to_string()
    }

    fn default_refresh_interval() -> u64 {
        60
    }

    fn default_timeout() -> u64 {
        5
    }

    fn default_totals_file() -> String {
        "energy_totals.json".to_string()
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<Config> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    #[test]
    fn minimal_config_fills_defaults() -> Result<()> {
        let config = parse(
            "host: 10.0.0.37\nbattery_mac: acd929a739fd\nct_mac: 009b08069c30\n",
        )?;

        assert_eq!(config.host(), "10.0.0.37");
        assert_eq!(config.port(), 12345);
        assert_eq!(config.device_type, "HMG-50");
        assert_eq!(config.ct_type, "HME-3");
        assert_eq!(config.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.totals_file(), "energy_totals.json");
        assert_eq!(config.loglevel(), "info");

        Ok(())
    }

    #[test]
    fn identity_preserves_field_order() -> Result<()> {
        let config = parse(
            "host: 10.0.0.37\nbattery_mac: aa\nct_mac: bb\nct_type: HME-4\ndevice_type: HMG-25\n",
        )?;

        let identity = config.identity();
        assert_eq!(identity.device_type, "HMG-25");
        assert_eq!(identity.battery_mac, "aa");
        assert_eq!(identity.ct_type, "HME-4");
        assert_eq!(identity.ct_mac, "bb");

        Ok(())
    }
}
