//! HTTP client for the light accessories' device API.
//!
//! The devices expose a small JSON API on port 9123:
//! `GET/PUT /elgato/accessory-info` and `GET/PUT /elgato/lights`.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Port the accessories' HTTP API listens on.
pub const DEVICE_API_PORT: u16 = 9123;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Metadata reported by `GET /elgato/accessory-info`, plus the address
/// it was fetched from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfo {
    /// Not part of the device's JSON; filled in after a fetch.
    pub ip: String,
    pub product_name: String,
    pub hardware_board_type: i64,
    pub hardware_revision: String,
    pub mac_address: String,
    pub firmware_build_number: i64,
    pub firmware_version: String,
    pub serial_number: String,
    pub display_name: String,
}

/// State of a single light as reported by `GET /elgato/lights`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightState {
    #[serde(default)]
    pub on: i32,
    #[serde(default)]
    pub brightness: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LightsEnvelope {
    number_of_lights: i32,
    lights: Vec<LightState>,
}

/// Reject out-of-range parameters before any network traffic happens.
pub fn validate_light_params(brightness: i32, temperature: Option<i32>) -> Result<()> {
    if !(0..=100).contains(&brightness) {
        bail!("brightness must be between 0 and 100");
    }
    if let Some(t) = temperature
        && !(143..=344).contains(&t)
    {
        bail!("temperature must be between 143 and 344");
    }
    Ok(())
}

#[derive(Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
}

impl DeviceClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http })
    }

    fn url(ip: &str, path: &str) -> String {
        format!("http://{ip}:{DEVICE_API_PORT}{path}")
    }

    /// Fetch a device's metadata.
    pub async fn accessory_info(&self, ip: &str) -> Result<DeviceInfo> {
        let url = Self::url(ip, "/elgato/accessory-info");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("getting accessory info for {ip}"))?
            .error_for_status()
            .with_context(|| format!("getting accessory info for {ip}"))?;
        let mut info: DeviceInfo = resp
            .json()
            .await
            .with_context(|| format!("parsing accessory info from {ip}"))?;
        info.ip = ip.to_owned();
        Ok(info)
    }

    /// Fetch the state of a device's (single) light.
    pub async fn light_state(&self, ip: &str) -> Result<LightState> {
        let url = Self::url(ip, "/elgato/lights");
        let envelope: LightsEnvelope = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("getting light state for {ip}"))?
            .error_for_status()
            .with_context(|| format!("getting light state for {ip}"))?
            .json()
            .await
            .with_context(|| format!("parsing light state from {ip}"))?;
        envelope
            .lights
            .into_iter()
            .next()
            .with_context(|| format!("no lights in response from {ip}"))
    }

    /// Set brightness (and optionally temperature) on a device. `on` is
    /// derived from the brightness: 0 turns the light off.
    pub async fn set_light(
        &self,
        ip: &str,
        brightness: i32,
        temperature: Option<i32>,
    ) -> Result<LightState> {
        validate_light_params(brightness, temperature)?;

        let body = LightsEnvelope {
            number_of_lights: 1,
            lights: vec![LightState {
                on: i32::from(brightness > 0),
                brightness,
                temperature,
            }],
        };

        let url = Self::url(ip, "/elgato/lights");
        let envelope: LightsEnvelope = self
            .http
            .put(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("updating light at {ip}"))?
            .error_for_status()
            .with_context(|| format!("updating light at {ip}"))?
            .json()
            .await
            .with_context(|| format!("parsing light update response from {ip}"))?;
        envelope
            .lights
            .into_iter()
            .next()
            .with_context(|| format!("no lights in response from {ip}"))
    }

    /// Rename a device.
    pub async fn set_display_name(&self, ip: &str, name: &str) -> Result<()> {
        let url = Self::url(ip, "/elgato/accessory-info");
        self.http
            .put(&url)
            .json(&serde_json::json!({ "displayName": name }))
            .send()
            .await
            .with_context(|| format!("setting device name for {ip}"))?
            .error_for_status()
            .with_context(|| format!("setting device name for {ip}"))?;
        Ok(())
    }
}
