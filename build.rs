fn main() {
    println!("cargo:rerun-if-env-changed=SMARTHAMMER_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=SMARTHAMMER_WIFI_PASS");
    println!("cargo:rerun-if-env-changed=SMARTHAMMER_MQTT_URL");

    // Only the device build links against ESP-IDF; host test builds skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
