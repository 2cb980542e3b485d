use crate::error::ProbeError;

pub mod scripted;

pub type PersonId = String;
pub type VehicleId = String;
pub type EdgeId = String;

pub const STAGE_WAITING_FOR_ANY: &str = "waiting for ANY";
pub const STAGE_DRIVING: &str = "driving";
pub const STAGE_ARRIVED: &str = "waiting (Arrived at destination)";

pub const TYPE_ORDINARY_CAR: &str = "DEFAULT_VEHTYPE";
pub const TYPE_BUS_S: &str = "BUS_S";
pub const TYPE_BUS_M: &str = "BUS_M";
pub const TYPE_BUS_L: &str = "BUS_L";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonStage {
    WaitingForAny,
    Driving,
    Arrived,
    /// Walking, transfers and anything the oracle adds later.
    Other,
}

impl PersonStage {
    pub fn from_description(description: &str) -> Self {
        match description {
            STAGE_WAITING_FOR_ANY => Self::WaitingForAny,
            STAGE_DRIVING => Self::Driving,
            STAGE_ARRIVED => Self::Arrived,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BusSize {
    S,
    M,
    L,
}

impl BusSize {
    pub const ALL: [BusSize; 3] = [BusSize::S, BusSize::M, BusSize::L];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleClass {
    OrdinaryCar,
    Bus(BusSize),
}

impl VehicleClass {
    /// Classify an oracle type id. Unknown ids are fatal for the step.
    pub fn from_type_id(type_id: &str) -> Result<Self, ProbeError> {
        match type_id {
            TYPE_ORDINARY_CAR => Ok(Self::OrdinaryCar),
            TYPE_BUS_S => Ok(Self::Bus(BusSize::S)),
            TYPE_BUS_M => Ok(Self::Bus(BusSize::M)),
            TYPE_BUS_L => Ok(Self::Bus(BusSize::L)),
            other => Err(ProbeError::UnsupportedVehicleType(other.to_string())),
        }
    }
}

/// Read-only view of the running simulation for the current step.
///
/// Every property is a separate query, mirroring how the simulation's
/// remote control interface is addressed.
pub trait SimulationOracle {
    fn person_ids(&mut self) -> Result<Vec<PersonId>, ProbeError>;
    /// Human readable description of the person's current stage.
    fn person_stage(&mut self, person_id: &str) -> Result<String, ProbeError>;
    /// Seconds the person has spent waiting so far.
    fn person_waiting_time(&mut self, person_id: &str) -> Result<f64, ProbeError>;

    fn vehicle_ids(&mut self) -> Result<Vec<VehicleId>, ProbeError>;
    fn vehicle_type(&mut self, vehicle_id: &str) -> Result<String, ProbeError>;
    /// Cumulative distance driven, in meters.
    fn vehicle_distance(&mut self, vehicle_id: &str) -> Result<f64, ProbeError>;
    fn vehicle_road(&mut self, vehicle_id: &str) -> Result<EdgeId, ProbeError>;
}
