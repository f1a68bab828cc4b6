#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineKind {
    HaulTruck,
    GrindingMill,
    IndustrialBoiler,
}

impl MachineKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::HaulTruck => "haul_truck",
            Self::GrindingMill => "grinding_mill",
            Self::IndustrialBoiler => "industrial_boiler",
        }
    }

    pub fn failure_modes(self) -> &'static [FailureMode] {
        match self {
            Self::HaulTruck | Self::GrindingMill => {
                &[FailureMode::Vibration, FailureMode::Temperature]
            }
            Self::IndustrialBoiler => &[FailureMode::Temperature, FailureMode::Emission],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Vibration,
    Temperature,
    Emission,
}

impl FailureMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Vibration => "vibration",
            Self::Temperature => "temperature",
            Self::Emission => "emission",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

const fn range(name: &'static str, min: f64, max: f64) -> MetricRange {
    MetricRange { name, min, max }
}

#[derive(Debug)]
pub struct MachineProfile {
    pub machine_id: &'static str,
    pub kind: MachineKind,
    pub metrics: &'static [MetricRange],
}

const HAUL_TRUCK: MachineProfile = MachineProfile {
    machine_id: "TRUCK-21",
    kind: MachineKind::HaulTruck,
    metrics: &[
        range("rpm", 1400.0, 1900.0),
        range("temperature", 80.0, 100.0),
        range("vibration", 2.0, 4.5),
        range("fuel_rate_lh", 9.0, 15.0),
        range("co2_ppm", 420.0, 550.0),
        range("pressure", 85.0, 110.0),
        range("speed_kmh", 15.0, 45.0),
    ],
};

const GRINDING_MILL: MachineProfile = MachineProfile {
    machine_id: "MILL-3",
    kind: MachineKind::GrindingMill,
    metrics: &[
        range("rpm", 1200.0, 1600.0),
        range("temperature", 90.0, 115.0),
        range("vibration", 3.0, 5.5),
        range("fuel_rate_lh", 0.0, 2.0),
        range("co2_ppm", 400.0, 500.0),
        range("pressure", 95.0, 125.0),
        range("load_tons", 50.0, 150.0),
        range("kwh", 150.0, 250.0),
    ],
};

const INDUSTRIAL_BOILER: MachineProfile = MachineProfile {
    machine_id: "BOILER-7",
    kind: MachineKind::IndustrialBoiler,
    metrics: &[
        range("rpm", 0.0, 0.0),
        range("temperature", 150.0, 220.0),
        range("vibration", 1.5, 3.0),
        range("fuel_rate_lh", 20.0, 40.0),
        range("co2_ppm", 500.0, 800.0),
        range("pressure", 120.0, 180.0),
        range("steam_pressure_bar", 80.0, 120.0),
        range("kwh", 50.0, 100.0),
    ],
};

static PROFILES: [MachineProfile; 3] = [HAUL_TRUCK, GRINDING_MILL, INDUSTRIAL_BOILER];

/// Unknown machine ids are simulated with the haul truck profile.
pub fn profile_for(machine_id: &str) -> &'static MachineProfile {
    PROFILES
        .iter()
        .find(|p| p.machine_id.eq_ignore_ascii_case(machine_id.trim()))
        .unwrap_or(&PROFILES[0])
}
