//! Button, motor and LED drivers plus one-shot hardware initialisation.

pub mod button;
pub mod hw_init;
pub mod motor;
pub mod status_led;
pub mod vibration;
