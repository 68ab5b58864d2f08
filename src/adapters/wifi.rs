//! Wi-Fi station-mode adapter.
//!
//! Starts the STA interface at boot and mirrors link state into
//! [`DeviceState`].  Credentials are baked in at build time from
//! `SMARTHAMMER_WIFI_SSID` / `SMARTHAMMER_WIFI_PASS`.
//!
//! Nothing here waits for the radio.  `EspWifi::connect` only issues the
//! association request; [`WifiAdapter::poll`] reads the link level and the
//! [`LinkSupervisor`] decides when to ask again.
//!
//! ## Reconnection policy
//!
//! While the link is down a connect request is issued immediately, then
//! after 1 s, 2 s, 4 s … capped at 16 s.  The backoff resets once the
//! interface has an address.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi`.
//! - **all other targets**: simulation stub whose access point can be
//!   switched off and on by tests.

use core::fmt;
use log::{debug, info, warn};

use crate::error::{CommsError, Error};
use crate::state::DeviceState;
use crate::tick::elapsed_ms;

const INITIAL_BACKOFF_MS: u32 = 1_000;
const MAX_BACKOFF_MS: u32 = 16_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    DriverFailed,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::DriverFailed => write!(f, "WiFi driver start failed"),
        }
    }
}

impl From<WifiError> for Error {
    fn from(e: WifiError) -> Self {
        match e {
            WifiError::ConnectionFailed => Self::Comms(CommsError::WifiConnectFailed),
            WifiError::DriverFailed => Self::Init("wifi driver"),
            WifiError::NoCredentials => Self::Config("wifi credentials missing"),
            WifiError::InvalidSsid => Self::Config("wifi ssid invalid"),
            WifiError::InvalidPassword => Self::Config("wifi password invalid"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), WifiError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), WifiError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, WifiError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut s = heapless::String::new();
        s.push_str(ssid).map_err(|_| WifiError::InvalidSsid)?;
        let mut p = heapless::String::new();
        p.push_str(password).map_err(|_| WifiError::InvalidPassword)?;
        Ok(Self { ssid: s, password: p })
    }

    /// Credentials compiled in from the build environment.
    pub fn from_build_env() -> Result<Self, WifiError> {
        let ssid = option_env!("SMARTHAMMER_WIFI_SSID").ok_or(WifiError::NoCredentials)?;
        Self::new(ssid, option_env!("SMARTHAMMER_WIFI_PASS").unwrap_or(""))
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Link supervision
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Up,
    /// `attempt` connect requests issued since the link was last up.
    Down { attempt: u32 },
}

/// Decides when to request a (re)connect from the observed link level.
pub struct LinkSupervisor {
    state: LinkState,
    backoff_ms: u32,
    last_attempt: Option<u32>,
}

impl LinkSupervisor {
    pub fn new() -> Self {
        Self {
            state: LinkState::Down { attempt: 0 },
            backoff_ms: INITIAL_BACKOFF_MS,
            last_attempt: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Feed the link level seen at `now`.  Updates the shared flag and
    /// returns `true` when the caller should issue a connect request.
    pub fn update(&mut self, link_up: bool, now: u32, state: &DeviceState) -> bool {
        state.set_wifi_connected(link_up);

        if link_up {
            if self.state != LinkState::Up {
                info!("WiFi: link up");
            }
            self.state = LinkState::Up;
            self.backoff_ms = INITIAL_BACKOFF_MS;
            self.last_attempt = None;
            return false;
        }

        let attempt = match self.state {
            LinkState::Up => {
                warn!("WiFi: connection lost, reconnecting");
                0
            }
            LinkState::Down { attempt } => attempt,
        };
        self.state = LinkState::Down { attempt };

        match self.last_attempt {
            None => {}
            Some(last) if elapsed_ms(now, last) >= self.backoff_ms => {
                self.backoff_ms = (self.backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
            Some(_) => return false,
        }

        debug!("WiFi: connect attempt {}", attempt + 1);
        self.state = LinkState::Down {
            attempt: attempt + 1,
        };
        self.last_attempt = Some(now);
        true
    }
}

impl Default for LinkSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct WifiAdapter {
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    link: LinkSupervisor,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    /// Configure STA mode and start the driver.  Association happens on
    /// the following polls.
    pub fn start(
        modem: esp_idf_svc::hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: esp_idf_svc::nvs::EspDefaultNvsPartition,
        creds: &WifiCredentials,
    ) -> Result<Self, WifiError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

        let mut wifi = EspWifi::new(modem, sysloop, Some(nvs)).map_err(|e| {
            warn!("WiFi: driver init failed ({})", e);
            WifiError::DriverFailed
        })?;

        let config = Configuration::Client(ClientConfiguration {
            ssid: creds.ssid.clone(),
            password: creds.password.clone(),
            auth_method: if creds.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });

        wifi.set_configuration(&config)
            .and_then(|()| wifi.start())
            .map_err(|e| {
                warn!("WiFi: start failed ({})", e);
                WifiError::DriverFailed
            })?;

        info!("WiFi: station started for '{}'", creds.ssid);
        Ok(Self {
            wifi,
            link: LinkSupervisor::new(),
        })
    }

    /// Refresh the link flag and, when due, request a reconnect.
    pub fn poll(&mut self, now: u32, state: &DeviceState) {
        let up = self.wifi.is_up().unwrap_or(false);
        if self.link.update(up, now, state) {
            if let Err(e) = self.wifi.connect() {
                debug!("WiFi: connect request rejected ({})", e);
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub struct WifiAdapter {
    ssid: heapless::String<32>,
    link: LinkSupervisor,
    ap_available: bool,
    associated: bool,
    connect_requests: u32,
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn start(creds: &WifiCredentials) -> Result<Self, WifiError> {
        info!("WiFi(sim): station started for '{}'", creds.ssid);
        Ok(Self {
            ssid: creds.ssid.clone(),
            link: LinkSupervisor::new(),
            ap_available: true,
            associated: false,
            connect_requests: 0,
        })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Switch the simulated access point.  Turning it off drops the link.
    pub fn set_ap_available(&mut self, available: bool) {
        self.ap_available = available;
        if !available {
            self.associated = false;
        }
    }

    pub fn connect_requests(&self) -> u32 {
        self.connect_requests
    }

    /// A connect request associates by the next poll if the AP is up.
    pub fn poll(&mut self, now: u32, state: &DeviceState) {
        if self.link.update(self.associated, now, state) {
            self.connect_requests += 1;
            self.associated = self.ap_available;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
