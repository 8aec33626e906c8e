pub mod services {
    use btleplug::api::bleuuid::uuid_from_u16;
    use uuid::Uuid;

    pub const BATTERY_SERVICE: Uuid = uuid_from_u16(0x180F);
    pub const DEVICE_INFORMATION: Uuid = uuid_from_u16(0x180A);
}

/// Name shown when a device did not advertise one.
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";
