//! Known telemetry signals

use super::enums::*;
use super::{SignalSpec, ValueKind};

/// Every signal the telemetry service can stream, sorted by name
pub static SIGNALS: &[SignalSpec] = &[
    SignalSpec::new("ACChargingEnergyIn", ValueKind::Float),
    SignalSpec::new("ACChargingPower", ValueKind::Float),
    SignalSpec::new("AutoSeatClimateLeft", ValueKind::Bool),
    SignalSpec::new("AutoSeatClimateRight", ValueKind::Bool),
    SignalSpec::new("AutomaticBlindSpotCamera", ValueKind::Bool),
    SignalSpec::new("AutomaticEmergencyBrakingOff", ValueKind::Bool),
    SignalSpec::new("BMSState", ValueKind::Enum(&BMS_STATE)),
    SignalSpec::new("BatteryHeaterOn", ValueKind::Bool),
    SignalSpec::new("BatteryLevel", ValueKind::Float),
    SignalSpec::new("BlindSpotCollisionWarningChime", ValueKind::Bool),
    SignalSpec::new("BmsFullchargecomplete", ValueKind::Bool),
    SignalSpec::new("BrakePedal", ValueKind::Bool),
    SignalSpec::new("BrakePedalPos", ValueKind::Float),
    SignalSpec::new("BrickVoltageMax", ValueKind::Float),
    SignalSpec::new("BrickVoltageMin", ValueKind::Float),
    SignalSpec::new("CabinOverheatProtectionMode", ValueKind::Enum(&CABIN_OVERHEAT_PROTECTION_MODE_STATE)),
    SignalSpec::new("CabinOverheatProtectionTemperatureLimit", ValueKind::Enum(&CLIMATE_OVERHEAT_PROTECTION_TEMP_LIMIT)),
    SignalSpec::new("CarType", ValueKind::Enum(&CAR_TYPE)),
    SignalSpec::new("CenterDisplay", ValueKind::Enum(&DISPLAY_STATE)),
    SignalSpec::new("ChargeAmps", ValueKind::Float),
    SignalSpec::new("ChargeCurrentRequest", ValueKind::Int),
    SignalSpec::new("ChargeCurrentRequestMax", ValueKind::Int),
    SignalSpec::new("ChargeEnableRequest", ValueKind::Bool),
    SignalSpec::new("ChargeLimitSoc", ValueKind::Int),
    SignalSpec::new("ChargePort", ValueKind::Enum(&CHARGE_PORT)),
    SignalSpec::new("ChargePortColdWeatherMode", ValueKind::Bool),
    SignalSpec::new("ChargePortDoorOpen", ValueKind::Bool),
    SignalSpec::new("ChargePortLatch", ValueKind::Enum(&CHARGE_PORT_LATCH)),
    SignalSpec::new("ChargeState", ValueKind::Enum(&CHARGE_STATE)),
    SignalSpec::new("ChargerPhases", ValueKind::Int),
    SignalSpec::new("ChargingCableType", ValueKind::Enum(&CABLE_TYPE)),
    SignalSpec::new("ClimateKeeperMode", ValueKind::Enum(&CLIMATE_KEEPER_MODE_STATE)),
    SignalSpec::new("ClimateSeatCoolingFrontLeft", ValueKind::Text),
    SignalSpec::new("ClimateSeatCoolingFrontRight", ValueKind::Text),
    SignalSpec::new("CruiseFollowDistance", ValueKind::Enum(&FOLLOW_DISTANCE)),
    SignalSpec::new("CruiseSetSpeed", ValueKind::Int),
    SignalSpec::new("CurrentLimitMph", ValueKind::Int),
    SignalSpec::new("DCChargingEnergyIn", ValueKind::Float),
    SignalSpec::new("DCChargingPower", ValueKind::Float),
    SignalSpec::new("DCDCEnable", ValueKind::Bool),
    SignalSpec::new("DefrostForPreconditioning", ValueKind::Bool),
    SignalSpec::new("DefrostMode", ValueKind::Enum(&DEFROST_MODE_STATE)),
    SignalSpec::new("DestinationLocation", ValueKind::Location),
    SignalSpec::new("DestinationName", ValueKind::Text),
    SignalSpec::new("DetailedChargeState", ValueKind::Enum(&DETAILED_CHARGE_STATE)),
    SignalSpec::new("DiAxleSpeedF", ValueKind::Float),
    SignalSpec::new("DiAxleSpeedR", ValueKind::Float),
    SignalSpec::new("DiAxleSpeedREL", ValueKind::Float),
    SignalSpec::new("DiAxleSpeedRER", ValueKind::Float),
    SignalSpec::new("DiHeatsinkTF", ValueKind::Float),
    SignalSpec::new("DiHeatsinkTR", ValueKind::Float),
    SignalSpec::new("DiHeatsinkTREL", ValueKind::Float),
    SignalSpec::new("DiHeatsinkTRER", ValueKind::Float),
    SignalSpec::new("DiInverterTF", ValueKind::Float),
    SignalSpec::new("DiInverterTR", ValueKind::Float),
    SignalSpec::new("DiInverterTREL", ValueKind::Float),
    SignalSpec::new("DiInverterTRER", ValueKind::Float),
    SignalSpec::new("DiMotorCurrentF", ValueKind::Float),
    SignalSpec::new("DiMotorCurrentR", ValueKind::Float),
    SignalSpec::new("DiMotorCurrentREL", ValueKind::Float),
    SignalSpec::new("DiMotorCurrentRER", ValueKind::Float),
    SignalSpec::new("DiSlaveTorqueCmd", ValueKind::Float),
    SignalSpec::new("DiStateF", ValueKind::Enum(&DRIVE_INVERTER_STATE)),
    SignalSpec::new("DiStateR", ValueKind::Enum(&DRIVE_INVERTER_STATE)),
    SignalSpec::new("DiStateREL", ValueKind::Enum(&DRIVE_INVERTER_STATE)),
    SignalSpec::new("DiStateRER", ValueKind::Enum(&DRIVE_INVERTER_STATE)),
    SignalSpec::new("DiStatorTempF", ValueKind::Float),
    SignalSpec::new("DiStatorTempR", ValueKind::Float),
    SignalSpec::new("DiStatorTempREL", ValueKind::Float),
    SignalSpec::new("DiStatorTempRER", ValueKind::Float),
    SignalSpec::new("DiTorqueActualF", ValueKind::Float),
    SignalSpec::new("DiTorqueActualR", ValueKind::Float),
    SignalSpec::new("DiTorqueActualREL", ValueKind::Float),
    SignalSpec::new("DiTorqueActualRER", ValueKind::Float),
    SignalSpec::new("DiTorquemotor", ValueKind::Int),
    SignalSpec::new("DiVBatF", ValueKind::Float),
    SignalSpec::new("DiVBatR", ValueKind::Float),
    SignalSpec::new("DiVBatREL", ValueKind::Float),
    SignalSpec::new("DiVBatRER", ValueKind::Float),
    SignalSpec::new("DoorState", ValueKind::Object),
    SignalSpec::new("DriveRail", ValueKind::Bool),
    SignalSpec::new("DriverSeatBelt", ValueKind::Bool),
    SignalSpec::new("DriverSeatOccupied", ValueKind::Bool),
    SignalSpec::new("EfficiencyPackage", ValueKind::Text),
    SignalSpec::new("EmergencyLaneDepartureAvoidance", ValueKind::Bool),
    SignalSpec::new("EnergyRemaining", ValueKind::Float),
    SignalSpec::new("EstBatteryRange", ValueKind::Float),
    SignalSpec::new("EstimatedHoursToChargeTermination", ValueKind::Float),
    SignalSpec::new("EuropeVehicle", ValueKind::Bool),
    SignalSpec::new("ExpectedEnergyPercentAtTripArrival", ValueKind::Int),
    SignalSpec::new("ExteriorColor", ValueKind::Text),
    SignalSpec::new("FastChargerPresent", ValueKind::Bool),
    SignalSpec::new("FastChargerType", ValueKind::Enum(&FAST_CHARGER)),
    SignalSpec::new("FdWindow", ValueKind::Enum(&WINDOW_STATE)),
    SignalSpec::new("ForwardCollisionWarning", ValueKind::Enum(&FORWARD_COLLISION_SENSITIVITY)),
    SignalSpec::new("FpWindow", ValueKind::Enum(&WINDOW_STATE)),
    SignalSpec::new("Gear", ValueKind::Enum(&SHIFT_STATE)),
    SignalSpec::new("GpsHeading", ValueKind::Float),
    SignalSpec::new("GpsState", ValueKind::Bool),
    SignalSpec::new("GuestModeEnabled", ValueKind::Bool),
    SignalSpec::new("GuestModeMobileAccessState", ValueKind::Enum(&GUEST_MODE_MOBILE_ACCESS)),
    SignalSpec::new("HomelinkDeviceCount", ValueKind::Int),
    SignalSpec::new("HomelinkNearby", ValueKind::Bool),
    SignalSpec::new("HvacACEnabled", ValueKind::Bool),
    SignalSpec::new("HvacAutoMode", ValueKind::Enum(&HVAC_AUTO_MODE_STATE)),
    SignalSpec::new("HvacFanSpeed", ValueKind::Int),
    SignalSpec::new("HvacFanStatus", ValueKind::Int),
    SignalSpec::new("HvacLeftTemperatureRequest", ValueKind::Float),
    SignalSpec::new("HvacPower", ValueKind::Enum(&HVAC_POWER_STATE)),
    SignalSpec::new("HvacRightTemperatureRequest", ValueKind::Float),
    SignalSpec::new("HvacSteeringWheelHeatAuto", ValueKind::Bool),
    SignalSpec::new("HvacSteeringWheelHeatLevel", ValueKind::Int),
    SignalSpec::new("Hvil", ValueKind::Enum(&HVIL_STATUS)),
    SignalSpec::new("IdealBatteryRange", ValueKind::Float),
    SignalSpec::new("InsideTemp", ValueKind::Float),
    SignalSpec::new("IsolationResistance", ValueKind::Float),
    SignalSpec::new("LaneDepartureAvoidance", ValueKind::Enum(&LANE_ASSIST_LEVEL)),
    SignalSpec::new("LateralAcceleration", ValueKind::Float),
    SignalSpec::new("LifetimeEnergyUsed", ValueKind::Float),
    SignalSpec::new("LifetimeEnergyUsedDrive", ValueKind::Float),
    SignalSpec::new("LocatedAtFavorite", ValueKind::Bool),
    SignalSpec::new("LocatedAtHome", ValueKind::Bool),
    SignalSpec::new("LocatedAtWork", ValueKind::Bool),
    SignalSpec::new("Location", ValueKind::Location),
    SignalSpec::new("Locked", ValueKind::Bool),
    SignalSpec::new("LongitudinalAcceleration", ValueKind::Float),
    SignalSpec::new("MilesToArrival", ValueKind::Float),
    SignalSpec::new("MinutesToArrival", ValueKind::Float),
    SignalSpec::new("ModuleTempMax", ValueKind::Float),
    SignalSpec::new("ModuleTempMin", ValueKind::Float),
    SignalSpec::new("NotEnoughPowerToHeat", ValueKind::Text),
    SignalSpec::new("NumBrickVoltageMax", ValueKind::Int),
    SignalSpec::new("NumBrickVoltageMin", ValueKind::Int),
    SignalSpec::new("NumModuleTempMax", ValueKind::Int),
    SignalSpec::new("NumModuleTempMin", ValueKind::Int),
    SignalSpec::new("Odometer", ValueKind::Float),
    SignalSpec::new("OffroadLightbarPresent", ValueKind::Bool),
    SignalSpec::new("OriginLocation", ValueKind::Location),
    SignalSpec::new("OutsideTemp", ValueKind::Float),
    SignalSpec::new("PackCurrent", ValueKind::Float),
    SignalSpec::new("PackVoltage", ValueKind::Float),
    SignalSpec::new("PairedPhoneKeyAndKeyFobQty", ValueKind::Int),
    SignalSpec::new("PassengerSeatBelt", ValueKind::Text),
    SignalSpec::new("PedalPosition", ValueKind::Float),
    SignalSpec::new("PinToDriveEnabled", ValueKind::Bool),
    SignalSpec::new("PowershareHoursLeft", ValueKind::Float),
    SignalSpec::new("PowershareInstantaneousPowerKW", ValueKind::Float),
    SignalSpec::new("PowershareStatus", ValueKind::Enum(&POWERSHARE_STATE)),
    SignalSpec::new("PowershareStopReason", ValueKind::Enum(&POWERSHARE_STOP_REASON_STATUS)),
    SignalSpec::new("PowershareType", ValueKind::Enum(&POWERSHARE_TYPE_STATUS)),
    SignalSpec::new("PreconditioningEnabled", ValueKind::Bool),
    SignalSpec::new("RatedRange", ValueKind::Float),
    SignalSpec::new("RdWindow", ValueKind::Enum(&WINDOW_STATE)),
    SignalSpec::new("RearDisplayHvacEnabled", ValueKind::Bool),
    SignalSpec::new("RearSeatHeaters", ValueKind::Text),
    SignalSpec::new("RemoteStartEnabled", ValueKind::Bool),
    SignalSpec::new("RightHandDrive", ValueKind::Bool),
    SignalSpec::new("RoofColor", ValueKind::Text),
    SignalSpec::new("RouteLastUpdated", ValueKind::Int),
    SignalSpec::new("RouteTrafficMinutesDelay", ValueKind::Int),
    SignalSpec::new("RpWindow", ValueKind::Enum(&WINDOW_STATE)),
    SignalSpec::new("ScheduledChargingMode", ValueKind::Enum(&SCHEDULED_CHARGING_MODE)),
    SignalSpec::new("ScheduledChargingPending", ValueKind::Bool),
    SignalSpec::new("ScheduledChargingStartTime", ValueKind::Text),
    SignalSpec::new("ScheduledDepartureTime", ValueKind::Text),
    SignalSpec::new("SeatHeaterLeft", ValueKind::Int),
    SignalSpec::new("SeatHeaterRearCenter", ValueKind::Int),
    SignalSpec::new("SeatHeaterRearLeft", ValueKind::Int),
    SignalSpec::new("SeatHeaterRearRight", ValueKind::Int),
    SignalSpec::new("SeatHeaterRight", ValueKind::Int),
    SignalSpec::new("SentryMode", ValueKind::Enum(&SENTRY_MODE_STATE)),
    SignalSpec::new("ServiceMode", ValueKind::Bool),
    SignalSpec::new("Setting24HourTime", ValueKind::Bool),
    SignalSpec::new("SettingChargeUnit", ValueKind::Enum(&CHARGE_UNIT_PREFERENCE)),
    SignalSpec::new("SettingDistanceUnit", ValueKind::Enum(&DISTANCE_UNIT)),
    SignalSpec::new("SettingTemperatureUnit", ValueKind::Enum(&TEMPERATURE_UNIT)),
    SignalSpec::new("SettingTirePressureUnit", ValueKind::Enum(&PRESSURE_UNIT)),
    SignalSpec::new("Soc", ValueKind::Float),
    SignalSpec::new("SoftwareUpdateDownloadPercentComplete", ValueKind::Int),
    SignalSpec::new("SoftwareUpdateExpectedDurationMinutes", ValueKind::Int),
    SignalSpec::new("SoftwareUpdateInstallationPercentComplete", ValueKind::Int),
    SignalSpec::new("SoftwareUpdateScheduledStartTime", ValueKind::Text),
    SignalSpec::new("SoftwareUpdateVersion", ValueKind::Text),
    SignalSpec::new("SpeedLimitMode", ValueKind::Bool),
    SignalSpec::new("SpeedLimitWarning", ValueKind::Text),
    SignalSpec::new("SuperchargerSessionTripPlanner", ValueKind::Bool),
    SignalSpec::new("TimeToFullCharge", ValueKind::Float),
    SignalSpec::new("TonneauOpenPercent", ValueKind::Float),
    SignalSpec::new("TonneauPosition", ValueKind::Text),
    SignalSpec::new("TonneauTentMode", ValueKind::Text),
    SignalSpec::new("TpmsHardWarnings", ValueKind::Int),
    SignalSpec::new("TpmsLastSeenPressureTimeFl", ValueKind::Text),
    SignalSpec::new("TpmsLastSeenPressureTimeFr", ValueKind::Text),
    SignalSpec::new("TpmsLastSeenPressureTimeRl", ValueKind::Text),
    SignalSpec::new("TpmsLastSeenPressureTimeRr", ValueKind::Text),
    SignalSpec::new("TpmsPressureFl", ValueKind::Float),
    SignalSpec::new("TpmsPressureFr", ValueKind::Float),
    SignalSpec::new("TpmsPressureRl", ValueKind::Float),
    SignalSpec::new("TpmsPressureRr", ValueKind::Float),
    SignalSpec::new("TpmsSoftWarnings", ValueKind::Int),
    SignalSpec::new("Trim", ValueKind::Text),
    SignalSpec::new("ValetModeEnabled", ValueKind::Bool),
    SignalSpec::new("VehicleName", ValueKind::Text),
    SignalSpec::new("VehicleSpeed", ValueKind::Float),
    SignalSpec::new("Version", ValueKind::Text),
    SignalSpec::new("WheelType", ValueKind::Text),
    SignalSpec::new("WiperHeatEnabled", ValueKind::Bool),
];
