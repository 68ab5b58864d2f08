//! System control adapter: restart and factory reset.
//!
//! - **`target_os = "espidf"`**: `esp_restart()`; factory reset erases the
//!   default NVS partition first.  Neither returns.
//! - **all other targets**: records the request so host runs and tests can
//!   observe it.
//!
//! [`DeferredReset`] is the port handed to the MQTT event task.  It only
//! posts the request to [`DeviceState`]; the control loop stops the motor
//! and blanks the LEDs before it calls [`SystemAdapter`].

use log::{info, warn};

use crate::app::ports::SystemPort;
use crate::state::{DeviceState, ResetKind};

/// Posts reset requests for the control loop to carry out.
pub struct DeferredReset<'a> {
    state: &'a DeviceState,
}

impl<'a> DeferredReset<'a> {
    pub fn new(state: &'a DeviceState) -> Self {
        Self { state }
    }
}

impl SystemPort for DeferredReset<'_> {
    fn restart(&mut self) {
        info!("system: restart deferred to control loop");
        self.state.request_reset(ResetKind::Restart);
    }

    fn factory_reset(&mut self) {
        info!("system: factory reset deferred to control loop");
        self.state.request_reset(ResetKind::FactoryReset);
    }
}

#[derive(Debug, Default)]
pub struct SystemAdapter {
    #[cfg(not(target_os = "espidf"))]
    restarts: u32,
    #[cfg(not(target_os = "espidf"))]
    factory_resets: u32,
}

impl SystemAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(target_os = "espidf")]
impl SystemPort for SystemAdapter {
    fn restart(&mut self) {
        warn!("system: restarting");
        esp_idf_svc::hal::reset::restart();
    }

    fn factory_reset(&mut self) {
        warn!("system: erasing NVS");
        // SAFETY: no NVS handles are written after this point; we reboot next.
        let rc = unsafe { esp_idf_svc::sys::nvs_flash_erase() };
        if rc != esp_idf_svc::sys::ESP_OK as i32 {
            warn!("system: nvs_flash_erase failed (rc={})", rc);
        }
        self.restart();
    }
}

#[cfg(not(target_os = "espidf"))]
impl SystemAdapter {
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn factory_resets(&self) -> u32 {
        self.factory_resets
    }
}

#[cfg(not(target_os = "espidf"))]
impl SystemPort for SystemAdapter {
    fn restart(&mut self) {
        warn!("system(sim): restart requested");
        self.restarts += 1;
    }

    fn factory_reset(&mut self) {
        warn!("system(sim): factory reset requested");
        self.factory_resets += 1;
        self.restart();
    }
}
