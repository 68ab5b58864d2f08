//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                 |
//! |-------------|---------------------|-----------------------------|
//! | `hardware`  | InputPort           | ESP32 GPIO (buttons)        |
//! |             | AccelPort           | LSM6DSL over I²C            |
//! |             | MotorPort           | LEDC PWM (vibration motor)  |
//! |             | IndicatorPort       | Status LEDs                 |
//! | `log_sink`  | Publisher           | Serial log output           |
//! | `mqtt`      | Publisher           | ESP-IDF MQTT client         |
//! | `network`   |                     | Wi-Fi and MQTT supervision  |
//! | `system`    | SystemPort          | esp_restart / NVS erase     |
//! |             | SystemPort          | deferred reset requests     |
//! | `time`      | TickFn              | ESP32 high-resolution timer |
//! | `wifi`      |                     | ESP-IDF WiFi STA            |
//! | `device_id` |                     | Factory MAC (eFuse)         |

pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod network;
pub mod system;
pub mod time;
pub mod wifi;
