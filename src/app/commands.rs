//! Inbound commands received over MQTT.
//!
//! Two payload shapes are accepted:
//!
//! ```text
//! // direct
//! {"deviceId": "de:ad:be:ef:ca:fe", "operation": "setting", "value": 75}
//!
//! // AWS IoT job envelope
//! {"jobId": "42", "jobDocument": {"operation": "setting",
//!                                 "value": {"VIBRATION_VALUE": 75}}}
//! ```
//!
//! `deviceId` is optional; when present it must match this device.  A
//! rejected payload never touches [`DeviceState`].

use log::{info, warn};
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::error::CommandError;
use crate::state::DeviceState;

use super::ports::SystemPort;

/// Commands the device acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// New hit-feedback motor level (0–100 %).
    SetVibration(u8),
    /// Reboot request.
    Restart,
}

// ── Wire format ───────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    job_id: Option<IgnoredAny>,
    job_document: Option<RawBody>,
    device_id: Option<String>,
    operation: Option<String>,
    value: Option<RawValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBody {
    device_id: Option<String>,
    operation: Option<String>,
    value: Option<RawValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Level(i64),
    Fields {
        #[serde(rename = "VIBRATION_VALUE")]
        vibration_value: i64,
    },
}

impl RawValue {
    fn level(&self) -> i64 {
        match self {
            Self::Level(v) | Self::Fields { vibration_value: v } => *v,
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────

/// Decode and validate a command addressed to `own_id`.
pub fn parse_command(payload: &[u8], own_id: &str) -> Result<Command, CommandError> {
    let raw: RawEnvelope =
        serde_json::from_slice(payload).map_err(|_| CommandError::Malformed)?;

    let body = match (raw.job_id, raw.job_document) {
        (Some(_), Some(doc)) => doc,
        (Some(_), None) => return Err(CommandError::Malformed),
        (None, _) => RawBody {
            device_id: raw.device_id,
            operation: raw.operation,
            value: raw.value,
        },
    };

    if let Some(id) = body.device_id.as_deref() {
        if !id.eq_ignore_ascii_case(own_id) {
            return Err(CommandError::WrongDevice);
        }
    }

    match body.operation.as_deref() {
        Some("setting") => {
            let level = body.value.ok_or(CommandError::MissingValue)?.level();
            let level = u8::try_from(level)
                .ok()
                .filter(|l| *l <= 100)
                .ok_or(CommandError::OutOfRange(level))?;
            Ok(Command::SetVibration(level))
        }
        Some("restart") => Ok(Command::Restart),
        Some(_) => Err(CommandError::UnknownOperation),
        None => Err(CommandError::Malformed),
    }
}

/// Apply a validated command.
pub fn apply(command: Command, state: &DeviceState, system: &mut impl SystemPort) {
    match command {
        Command::SetVibration(level) => {
            state.set_vibration_level(level);
            info!("command: vibration level = {}", level);
        }
        Command::Restart => {
            info!("command: restart requested");
            system.restart();
        }
    }
}

/// Parse and apply in one go; rejections are logged and leave state untouched.
pub fn handle_payload(
    payload: &[u8],
    own_id: &str,
    state: &DeviceState,
    system: &mut impl SystemPort,
) -> Result<Command, CommandError> {
    match parse_command(payload, own_id) {
        Ok(cmd) => {
            apply(cmd, state, system);
            Ok(cmd)
        }
        Err(e) => {
            warn!("command: rejected ({})", e);
            Err(e)
        }
    }
}
