//! GPIO / peripheral pin assignments for the Smart Hammer board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Buttons (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// BOOT strap button.  Held → factory reset.
pub const BOOT_BUTTON_GPIO: i32 = 0;
/// Handle button the user squeezes while swinging.
pub const ACTION_BUTTON_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Status LEDs (discrete, active HIGH)
// ---------------------------------------------------------------------------

pub const LED_GREEN_GPIO: i32 = 16;
pub const LED_RED_GPIO: i32 = 17;
pub const LED_BLUE_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Vibration motor (N-MOSFET low-side switch, PWM)
// ---------------------------------------------------------------------------

pub const MOTOR_PWM_GPIO: i32 = 25;
/// LEDC base frequency for the ERM motor.
pub const MOTOR_PWM_FREQ_HZ: u32 = 5_000;

// ---------------------------------------------------------------------------
// I²C bus (LSM6DSL accelerometer)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const I2C_FREQ_HZ: u32 = 100_000;
/// LSM6DSL address with SA0 pulled high.
pub const LSM6DSL_I2C_ADDR: u8 = 0x6B;
