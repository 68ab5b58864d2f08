//! Integration tests for inbound MQTT commands: parse, validate, apply.

use crate::mock_hw::{DEVICE_ID, MockSystem};

use smarthammer::app::commands::{Command, handle_payload};
use smarthammer::error::CommandError;
use smarthammer::state::DeviceState;

#[test]
fn setting_for_this_device_updates_level() {
    let state = DeviceState::default();
    let mut sys = MockSystem::default();
    let p = br#"{"deviceId":"de:ad:be:ef:ca:fe","operation":"setting","value":75}"#;

    assert_eq!(
        handle_payload(p, DEVICE_ID, &state, &mut sys),
        Ok(Command::SetVibration(75))
    );
    assert_eq!(state.vibration_level(), 75);
}

#[test]
fn setting_for_other_device_is_ignored() {
    let state = DeviceState::default();
    let mut sys = MockSystem::default();
    let p = br#"{"deviceId":"aa:bb:cc:dd:ee:ff","operation":"setting","value":75}"#;

    assert_eq!(
        handle_payload(p, DEVICE_ID, &state, &mut sys),
        Err(CommandError::WrongDevice)
    );
    assert_eq!(state.vibration_level(), 50);
}

#[test]
fn job_document_setting_applies() {
    let state = DeviceState::default();
    let mut sys = MockSystem::default();
    let p = br#"{"jobId":"update-1","jobDocument":{"operation":"setting","value":{"VIBRATION_VALUE":15}}}"#;

    assert_eq!(
        handle_payload(p, DEVICE_ID, &state, &mut sys),
        Ok(Command::SetVibration(15))
    );
    assert_eq!(state.vibration_level(), 15);
}

#[test]
fn restart_reaches_system_port() {
    let state = DeviceState::default();
    let mut sys = MockSystem::default();

    assert_eq!(
        handle_payload(br#"{"operation":"restart"}"#, DEVICE_ID, &state, &mut sys),
        Ok(Command::Restart)
    );
    assert_eq!(sys.restarts, 1);
    assert_eq!(sys.factory_resets, 0);
}

#[test]
fn rejected_payloads_leave_state_untouched() {
    let state = DeviceState::default();
    state.set_vibration_level(33);
    let mut sys = MockSystem::default();

    let payloads: [&[u8]; 6] = [
        b"{",
        br#"{"operation":"setting","value":"high"}"#,
        br#"{"operation":"setting","value":150}"#,
        br#"{"operation":"explode"}"#,
        br#"{"value":10}"#,
        br#"{"jobId":"x"}"#,
    ];
    for p in payloads {
        assert!(handle_payload(p, DEVICE_ID, &state, &mut sys).is_err());
    }
    assert_eq!(state.vibration_level(), 33);
    assert_eq!(sys.restarts, 0);
}
