//! Device identity derived from the ESP32 factory MAC address.
//!
//! The id is the full MAC in lowercase colon form (`de:ad:be:ef:ca:fe`).
//! It keys every outbound JSON message, is matched against `deviceId` in
//! inbound commands and suffixes the MQTT client id.

use core::fmt::Write;

/// `aa:bb:cc:dd:ee:ff` (17 chars).
pub type DeviceIdString = heapless::String<32>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    let _ = write!(
        id,
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
    id
}

/// Network hostname from the last 3 MAC bytes: `smarthammer-xxyyzz`.
pub fn hostname(mac: &MacAddress) -> heapless::String<24> {
    let mut name = heapless::String::<24>::new();
    let _ = write!(name, "smarthammer-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}
