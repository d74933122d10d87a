//! Wi-Fi access point parameters.
//!
//! The browser reaches the bridge by joining a dedicated access point: fixed
//! SSID, WPA/WPA2 pre-shared key, one channel, at most one associated
//! station.  Bringing the radio up is the host's job (hostapd); this module
//! holds the parameters, checks them against 802.11 limits and renders them
//! as a hostapd configuration.

use std::fmt;

use thiserror::Error;

/// Longest SSID 802.11 allows, in bytes.
pub const MAX_SSID_LEN: usize = 32;

/// WPA passphrase length bounds, in ASCII characters.
pub const PSK_LEN_RANGE: std::ops::RangeInclusive<usize> = 8..=63;

/// 2.4 GHz channels accepted by the bridge.
pub const CHANNEL_RANGE: std::ops::RangeInclusive<u8> = 1..=13;

/// Why an [`AccessPointConfig`] cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessPointError {
    #[error("SSID must not be empty")]
    EmptySsid,

    #[error("SSID is {0} bytes long (max {MAX_SSID_LEN})")]
    SsidTooLong(usize),

    #[error("WPA passphrase must be 8 to 63 characters, got {0}")]
    PassphraseLength(usize),

    #[error("WPA passphrase must be printable ASCII")]
    PassphraseNotAscii,

    #[error("channel {0} is outside 1..=13")]
    InvalidChannel(u8),

    #[error("at least one station must be allowed to associate")]
    NoStations,
}

/// Authentication mode of the access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// No encryption.  Only used when the passphrase is empty.
    Open,
    /// WPA and WPA2 with a pre-shared key.
    WpaWpa2Psk,
}

/// Access point settings.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessPointConfig {
    pub ssid: String,
    pub passphrase: String,
    pub channel: u8,
    pub max_stations: u8,
}

impl AccessPointConfig {
    pub const DEFAULT_SSID: &'static str = "ESP32 LoRa Chat 1";
    pub const DEFAULT_PASSPHRASE: &'static str = "VoltiqSmart";
    pub const DEFAULT_CHANNEL: u8 = 1;
    pub const DEFAULT_MAX_STATIONS: u8 = 1;

    /// WPA/WPA2-PSK unless the passphrase is empty.
    pub fn auth_mode(&self) -> AuthMode {
        if self.passphrase.is_empty() {
            AuthMode::Open
        } else {
            AuthMode::WpaWpa2Psk
        }
    }

    /// Checks the settings against 802.11 limits.
    ///
    /// # Errors
    ///
    /// Returns the first [`AccessPointError`] found.
    pub fn validate(&self) -> Result<(), AccessPointError> {
        if self.ssid.is_empty() {
            return Err(AccessPointError::EmptySsid);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(AccessPointError::SsidTooLong(self.ssid.len()));
        }
        if self.auth_mode() == AuthMode::WpaWpa2Psk {
            if !self.passphrase.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
                return Err(AccessPointError::PassphraseNotAscii);
            }
            if !PSK_LEN_RANGE.contains(&self.passphrase.len()) {
                return Err(AccessPointError::PassphraseLength(self.passphrase.len()));
            }
        }
        if !CHANNEL_RANGE.contains(&self.channel) {
            return Err(AccessPointError::InvalidChannel(self.channel));
        }
        if self.max_stations == 0 {
            return Err(AccessPointError::NoStations);
        }
        Ok(())
    }

    /// Renders a hostapd configuration for `interface`.
    pub fn to_hostapd_conf(&self, interface: &str) -> String {
        let mut conf = format!(
            "interface={interface}\n\
             driver=nl80211\n\
             ssid={}\n\
             hw_mode=g\n\
             channel={}\n\
             max_num_sta={}\n\
             ignore_broadcast_ssid=0\n",
            self.ssid, self.channel, self.max_stations
        );
        if self.auth_mode() == AuthMode::WpaWpa2Psk {
            conf.push_str("auth_algs=1\n");
            conf.push_str("wpa=3\n");
            conf.push_str("wpa_key_mgmt=WPA-PSK\n");
            conf.push_str("wpa_pairwise=TKIP CCMP\n");
            conf.push_str("rsn_pairwise=CCMP\n");
            conf.push_str(&format!("wpa_passphrase={}\n", self.passphrase));
        }
        conf
    }
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        Self {
            ssid: Self::DEFAULT_SSID.to_string(),
            passphrase: Self::DEFAULT_PASSPHRASE.to_string(),
            channel: Self::DEFAULT_CHANNEL,
            max_stations: Self::DEFAULT_MAX_STATIONS,
        }
    }
}

// The passphrase stays out of logs.
impl fmt::Debug for AccessPointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPointConfig")
            .field("ssid", &self.ssid)
            .field("passphrase", &"<redacted>")
            .field("channel", &self.channel)
            .field("max_stations", &self.max_stations)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
