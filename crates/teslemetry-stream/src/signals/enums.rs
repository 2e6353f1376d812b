//! Lookup tables for enumerated signal values
//!
//! The service sends enumerations as prefixed strings (`ShiftStateD`,
//! `WindowStatePartiallyOpen`). Each table strips its prefix and maps the rest
//! onto a lowercase label.

use super::EnumTable;

pub static BMS_STATE: EnumTable = EnumTable::new(
    "BMSState",
    &[
        "unknown", "standby", "drive", "support", "charge", "feim", "clearfault", "fault",
        "weld", "test", "sna",
    ],
);

pub static CABIN_OVERHEAT_PROTECTION_MODE_STATE: EnumTable = EnumTable::new(
    "CabinOverheatProtectionModeState",
    &["unknown", "off", "on", "fanonly"],
);

pub static CABLE_TYPE: EnumTable = EnumTable::new(
    "CableType",
    &["unknown", "iec", "sae", "gb_ac", "gb_dc", "sna"],
);

pub static CAR_TYPE: EnumTable = EnumTable::new(
    "CarType",
    &[
        "unknown", "models", "modelx", "model3", "modely", "semitruck", "cybertruck",
    ],
);

pub static CHARGE_PORT: EnumTable =
    EnumTable::new("ChargePort", &["unknown", "us", "eu", "gb", "ccs"]);

pub static CHARGE_PORT_LATCH: EnumTable = EnumTable::new(
    "ChargePortLatch",
    &["unknown", "sna", "disengaged", "engaged", "blocking"],
);

pub static CHARGE_STATE: EnumTable = EnumTable::new(
    "ChargeState",
    &[
        "unknown", "disconnected", "nopower", "starting", "charging", "complete", "stopped",
    ],
);

pub static CHARGE_UNIT_PREFERENCE: EnumTable =
    EnumTable::new("ChargeUnit", &["unknown", "distance", "percent"]);

pub static CLIMATE_KEEPER_MODE_STATE: EnumTable = EnumTable::new(
    "ClimateKeeperModeState",
    &["unknown", "off", "on", "dog", "party"],
);

pub static CLIMATE_OVERHEAT_PROTECTION_TEMP_LIMIT: EnumTable = EnumTable::new(
    "ClimateOverheatProtectionTempLimit",
    &["unknown", "high", "medium", "low"],
);

pub static DEFROST_MODE_STATE: EnumTable = EnumTable::new(
    "DefrostModeState",
    &["unknown", "off", "normal", "max", "autodefog"],
);

pub static DETAILED_CHARGE_STATE: EnumTable = EnumTable::new(
    "DetailedChargeState",
    &[
        "unknown", "disconnected", "nopower", "starting", "charging", "complete", "stopped",
    ],
);

pub static DISPLAY_STATE: EnumTable = EnumTable::new(
    "DisplayState",
    &[
        "unknown", "off", "dim", "accessory", "on", "driving", "charging", "lock", "sentry",
        "dog", "entertainment",
    ],
);

pub static DISTANCE_UNIT: EnumTable =
    EnumTable::new("DistanceUnit", &["unknown", "miles", "kilometers"]);

pub static DRIVE_INVERTER_STATE: EnumTable = EnumTable::new(
    "DriveInverterState",
    &["unknown", "unavailable", "standby", "fault", "abort", "enable"],
);

pub static FAST_CHARGER: EnumTable = EnumTable::new(
    "FastCharger",
    &[
        "unknown", "supercharger", "chademo", "gb", "acsinglewirecan", "combo",
        "mcsinglewirecan", "other", "tesla", "sna",
    ],
);

pub static FOLLOW_DISTANCE: EnumTable = EnumTable::new(
    "FollowDistance",
    &["unknown", "1", "2", "3", "4", "5", "6", "7"],
);

pub static FORWARD_COLLISION_SENSITIVITY: EnumTable = EnumTable::new(
    "ForwardCollisionSensitivity",
    &["unknown", "off", "late", "average", "early"],
);

pub static GUEST_MODE_MOBILE_ACCESS: EnumTable = EnumTable::new(
    "GuestModeMobileAccess",
    &[
        "unknown",
        "init",
        "notauthenticated",
        "authenticated",
        "aborteddriving",
        "abortedusingremotestart",
        "abortedusingblekeys",
        "abortedvaletmode",
        "abortedguestmodeoff",
        "aborteddriveauthtimeexceeded",
        "abortednodatareceived",
        "requestingfrommothership",
        "requestingfromauthd",
        "abortedfetchfailed",
        "abortedbaddatareceived",
        "showingqrcode",
        "swipedaway",
        "dismissedqrcodeexpired",
        "succeededpairednewblekey",
    ],
);

pub static HVAC_AUTO_MODE_STATE: EnumTable =
    EnumTable::new("HvacAutoModeState", &["unknown", "on", "override"]);

pub static HVAC_POWER_STATE: EnumTable = EnumTable::new(
    "HvacPowerState",
    &["unknown", "off", "on", "precondition", "overheatprotect"],
);

pub static HVIL_STATUS: EnumTable = EnumTable::new("HvilStatus", &["unknown", "fault", "ok"]);

pub static LANE_ASSIST_LEVEL: EnumTable = EnumTable::new(
    "LaneAssistLevel",
    &["unknown", "none", "warning", "assist"],
);

pub static POWERSHARE_STATE: EnumTable = EnumTable::new(
    "PowershareState",
    &[
        "unknown", "inactive", "handshaking", "init", "enabled", "enabledreconnectingsoon",
        "stopped",
    ],
);

pub static POWERSHARE_STOP_REASON_STATUS: EnumTable = EnumTable::new(
    "PowershareStopReasonStatus",
    &[
        "unknown", "none", "soctoolow", "retry", "fault", "user", "reconnecting",
        "authentication",
    ],
);

pub static POWERSHARE_TYPE_STATUS: EnumTable = EnumTable::new(
    "PowershareTypeStatus",
    &["unknown", "none", "load", "home"],
);

pub static PRESSURE_UNIT: EnumTable = EnumTable::new("PressureUnit", &["unknown", "psi", "bar"]);

pub static SCHEDULED_CHARGING_MODE: EnumTable = EnumTable::new(
    "ScheduledChargingMode",
    &["unknown", "off", "startat", "departby"],
);

pub static SENTRY_MODE_STATE: EnumTable = EnumTable::new(
    "SentryModeState",
    &["unknown", "off", "idle", "armed", "aware", "panic", "quiet"],
);

pub static SHIFT_STATE: EnumTable = EnumTable::new(
    "ShiftState",
    &["unknown", "invalid", "p", "r", "n", "d", "sna"],
);

pub static TEMPERATURE_UNIT: EnumTable = EnumTable::new(
    "TemperatureUnit",
    &["unknown", "fahrenheit", "celsius"],
);

pub static WINDOW_STATE: EnumTable = EnumTable::new(
    "WindowState",
    &["unknown", "closed", "partiallyopen", "opened"],
);
