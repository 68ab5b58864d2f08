//! Smart Hammer firmware: main entry point.
//!
//! Hexagonal architecture driven by a cooperative polling scheduler.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter          MqttAdapter       SystemAdapter      │
//! │  (Input+Accel+Motor+LED)  (Publisher)       (SystemPort)       │
//! │  Connectivity (WifiAdapter + MqttAdapter)   time · device_id   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            HammerService (pure logic)                  │    │
//! │  │  Buttons · Gesture · Hit detector · Vibration pulse    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (Control 10 ms · Outbound 100 ms) · OutboundQueue   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use smarthammer::adapters::device_id;
use smarthammer::adapters::hardware::HardwareAdapter;
use smarthammer::adapters::log_sink::LogPublisher;
use smarthammer::adapters::network::Connectivity;
use smarthammer::adapters::system::SystemAdapter;
use smarthammer::adapters::time::millis;
use smarthammer::adapters::wifi::{WifiAdapter, WifiCredentials};
use smarthammer::app::outbound::{OutboundQueue, OutboundSender};
use smarthammer::app::ports::IndicatorPort;
use smarthammer::app::service::{BOARD_BUTTONS, HammerService, HammerTasks};
use smarthammer::config::HammerConfig;
use smarthammer::drivers::hw_init;
use smarthammer::drivers::motor::MotorDriver;
use smarthammer::drivers::status_led::{LedState, StatusLeds};
use smarthammer::pins;
use smarthammer::scheduler::Scheduler;
use smarthammer::sensors::Lsm6dsl;
use smarthammer::state::DeviceState;

// ── Shared state ──────────────────────────────────────────────
//
// Read and written from the control loop and the MQTT client's event
// task; every field is atomic.

static DEVICE_STATE: DeviceState = DeviceState::new(50);
static OUTBOUND: OutboundQueue = OutboundQueue::new();

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Smart Hammer v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = HammerConfig::default();
    config.validate()?;
    DEVICE_STATE.set_vibration_level(config.vibration.default_level);

    // ── 2. Hardware peripherals ───────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(pins::I2C_FREQ_HZ.Hz()),
    )?;
    let mut accel = Lsm6dsl::new(i2c, pins::LSM6DSL_I2C_ADDR);
    if let Err(e) = accel.init() {
        // Keep running: buttons, commands and the motor still work.
        warn!("LSM6DSL init failed ({}), hit detection disabled", e);
    }

    let mut hw = HardwareAdapter::new(accel, MotorDriver::new(), StatusLeds::new());
    let mut leds = LedState {
        green: true,
        red: !hw.accel_ready(),
        blue: false,
    };
    if let Err(e) = hw.set_leds(leds) {
        warn!("LED: initial state not applied ({})", e);
    }

    // ── 3. Device identity ────────────────────────────────────
    let mac = device_id::read_mac();
    let dev_id = device_id::device_id(&mac);
    info!("Device ID: {} (hostname: {})", dev_id, device_id::hostname(&mac));

    // ── 4. Network ────────────────────────────────────────────
    // Association and the MQTT session come up from the loop.
    let wifi = match WifiCredentials::from_build_env() {
        Ok(creds) => match WifiAdapter::start(peripherals.modem, sysloop, nvs, &creds) {
            Ok(w) => Some(w),
            Err(e) => {
                error!("WiFi: {}, running offline", e);
                None
            }
        },
        Err(e) => {
            warn!("WiFi: {}, running offline", e);
            None
        }
    };
    let mut network = Connectivity::new(wifi, &config.mqtt, &dev_id);

    // ── 5. Application ────────────────────────────────────────
    let mut service = HammerService::new(config.clone(), &BOARD_BUTTONS)?;
    let mut sender = OutboundSender::new(&dev_id, &config.mqtt.publish_topic)?;
    let mut scheduler = Scheduler::from_config(&config.scheduler);
    let mut system = SystemAdapter::new();
    let mut offline = LogPublisher::new();

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let now = millis();

        network.poll(now, &DEVICE_STATE);

        match network.mqtt() {
            Some(m) => {
                let mut tasks = HammerTasks {
                    service: &mut service,
                    sender: &mut sender,
                    hw: &mut hw,
                    publisher: m,
                    system: &mut system,
                    state: &DEVICE_STATE,
                    queue: &OUTBOUND,
                };
                scheduler.tick(now, &DEVICE_STATE, &mut tasks);
            }
            None => {
                let mut tasks = HammerTasks {
                    service: &mut service,
                    sender: &mut sender,
                    hw: &mut hw,
                    publisher: &mut offline,
                    system: &mut system,
                    state: &DEVICE_STATE,
                    queue: &OUTBOUND,
                };
                scheduler.tick(now, &DEVICE_STATE, &mut tasks);
            }
        }

        let current = service.indicators(&DEVICE_STATE);
        if current != leds {
            leds = current;
            info!("LED: g={} r={} b={}", leds.green, leds.red, leds.blue);
        }

        FreeRtos::delay_ms(config.scheduler.control_interval_ms);
    }
}
