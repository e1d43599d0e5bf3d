//! Daemon configuration, read from the persistence store with built-in
//! defaults. Every key can be provisioned out-of-band by writing the
//! store file.

use crate::store::KvStore;

const DEFAULT_HOSTNAME: &str = "elights-controller.local";
const DEFAULT_SERVICE_NAME: &str = "_elg._tcp.local";
const DEFAULT_INSTANCE_NAME: &str = "Elights Controller";
const DEFAULT_API_LISTEN: &str = "0.0.0.0:80";

#[derive(Debug, Clone)]
pub struct Config {
    /// Hostname answered over mDNS (store key `MDNS_HOSTNAME`).
    pub hostname: String,
    /// Service name hunted for discovery (store key `SERVICE_NAME`).
    pub service_name: String,
    /// Instance name used in our own announcements (store key
    /// `INSTANCE_NAME`).
    pub instance_name: String,
    /// HTTP API listen address (store key `API_LISTEN`).
    pub api_listen: String,
    /// WiFi credentials kept for provisioning tooling; link bring-up
    /// itself is the host OS's job.
    pub wifi_ssid: Option<String>,
    pub wifi_pass: Option<String>,
}

impl Config {
    pub fn load(store: &KvStore) -> Self {
        Self {
            hostname: store
                .get("MDNS_HOSTNAME")
                .unwrap_or_else(|| DEFAULT_HOSTNAME.to_owned()),
            service_name: store
                .get("SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_owned()),
            instance_name: store
                .get("INSTANCE_NAME")
                .unwrap_or_else(|| DEFAULT_INSTANCE_NAME.to_owned()),
            api_listen: store
                .get("API_LISTEN")
                .unwrap_or_else(|| DEFAULT_API_LISTEN.to_owned()),
            wifi_ssid: store.get("WIFI_SSID"),
            wifi_pass: store.get("WIFI_PASS"),
        }
    }
}
