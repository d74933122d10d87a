//! Hands the access point settings to the host's Wi-Fi stack.
//!
//! The bridge does not drive the radio itself.  When asked to, it writes a
//! hostapd configuration built from [`AccessPointConfig`] so that the host
//! brings up the same network the chat page expects.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::domain::AccessPointConfig;

/// Validates `ap` and writes its hostapd configuration to `path`.
///
/// # Errors
///
/// Fails if the settings are invalid or the file cannot be written.
pub fn write_hostapd_conf(
    ap: &AccessPointConfig,
    interface: &str,
    path: &Path,
) -> anyhow::Result<()> {
    ap.validate().context("invalid access point settings")?;

    std::fs::write(path, ap.to_hostapd_conf(interface))
        .with_context(|| format!("failed to write hostapd configuration to {}", path.display()))?;

    info!(
        "wrote hostapd configuration for SSID {:?} on {interface} to {}",
        ap.ssid,
        path.display()
    );
    Ok(())
}
