//! In-memory directory of discovered devices.
//!
//! Entries are keyed both by address and by serial number, inserted by
//! the reconciler after a successful metadata fetch. Devices that go
//! offline are never purged.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use crate::device::DeviceInfo;

#[derive(Default)]
struct Inner {
    by_ip: BTreeMap<String, DeviceInfo>,
    by_serial: BTreeMap<String, DeviceInfo>,
}

/// Shared handle to the device directory.
#[derive(Clone, Default)]
pub struct DeviceDirectory {
    inner: Arc<RwLock<Inner>>,
}

impl DeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, info: DeviceInfo) {
        let mut inner = self.inner.write().expect("directory lock poisoned");
        inner.by_serial.insert(info.serial_number.clone(), info.clone());
        inner.by_ip.insert(info.ip.clone(), info);
    }

    /// Addresses with a cached entry, for diffing against discoveries.
    pub fn known_ips(&self) -> BTreeSet<String> {
        let inner = self.inner.read().expect("directory lock poisoned");
        inner.by_ip.keys().cloned().collect()
    }

    pub fn all(&self) -> Vec<DeviceInfo> {
        let inner = self.inner.read().expect("directory lock poisoned");
        inner.by_ip.values().cloned().collect()
    }

    pub fn by_serial(&self, serial: &str) -> Option<DeviceInfo> {
        let inner = self.inner.read().expect("directory lock poisoned");
        inner.by_serial.get(serial).cloned()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("directory lock poisoned");
        inner.by_ip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(ip: &str, serial: &str) -> DeviceInfo {
        DeviceInfo {
            ip: ip.to_owned(),
            serial_number: serial.to_owned(),
            display_name: "Test Light".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_indexes_both_keys() {
        let dir = DeviceDirectory::new();
        dir.insert(info("192.168.1.42", "SN1"));

        assert_eq!(dir.len(), 1);
        assert!(dir.known_ips().contains("192.168.1.42"));
        assert_eq!(dir.by_serial("SN1").unwrap().ip, "192.168.1.42");
        assert!(dir.by_serial("SN2").is_none());
    }

    #[test]
    fn test_reinsert_updates_entry() {
        let dir = DeviceDirectory::new();
        dir.insert(info("192.168.1.42", "SN1"));

        let mut updated = info("192.168.1.42", "SN1");
        updated.display_name = "Renamed".to_owned();
        dir.insert(updated);

        assert_eq!(dir.len(), 1);
        assert_eq!(dir.by_serial("SN1").unwrap().display_name, "Renamed");
    }

    #[test]
    fn test_entries_are_never_evicted() {
        let dir = DeviceDirectory::new();
        dir.insert(info("192.168.1.42", "SN1"));
        dir.insert(info("192.168.1.43", "SN2"));
        assert_eq!(dir.all().len(), 2);
    }
}
