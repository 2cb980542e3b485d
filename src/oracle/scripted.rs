use crate::error::ProbeError;
use crate::oracle::{EdgeId, PersonId, SimulationOracle, VehicleId};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersonFrame {
    pub id: PersonId,
    pub stage: String,
    #[serde(default)]
    pub waiting_time: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VehicleFrame {
    pub id: VehicleId,
    pub type_id: String,
    /// Meters.
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub road_id: EdgeId,
}

/// Everything the simulation reported for one step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Frame {
    pub step: u64,
    #[serde(default)]
    pub people: Vec<PersonFrame>,
    #[serde(default)]
    pub vehicles: Vec<VehicleFrame>,
}

impl Frame {
    pub fn new(step: u64) -> Self {
        Self {
            step,
            people: Vec::new(),
            vehicles: Vec::new(),
        }
    }

    pub fn person(mut self, id: &str, stage: &str, waiting_time: f64) -> Self {
        self.people.push(PersonFrame {
            id: id.to_string(),
            stage: stage.to_string(),
            waiting_time,
        });
        self
    }

    pub fn vehicle(mut self, id: &str, type_id: &str, distance: f64, road_id: &str) -> Self {
        self.vehicles.push(VehicleFrame {
            id: id.to_string(),
            type_id: type_id.to_string(),
            distance,
            road_id: road_id.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    pub frames: Vec<Frame>,
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse trace: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("trace contains no frames")]
    Empty,
}

pub fn load_trace_from_path(path: impl AsRef<Path>) -> Result<Trace, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    parse_trace(&contents)
}

pub fn parse_trace(contents: &str) -> Result<Trace, TraceError> {
    let trace: Trace = serde_json::from_str(contents)?;
    if trace.frames.is_empty() {
        return Err(TraceError::Empty);
    }
    Ok(trace)
}

/// Oracle that replays recorded frames one step at a time.
#[derive(Debug, Clone)]
pub struct ScriptedOracle {
    frames: Vec<Frame>,
    cursor: Option<usize>,
    failure: Option<String>,
}

impl ScriptedOracle {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            cursor: None,
            failure: None,
        }
    }

    pub fn from_trace(trace: Trace) -> Self {
        Self::new(trace.frames)
    }

    /// Every query fails with `message`, as if the simulation connection dropped.
    pub fn failing(message: &str) -> Self {
        Self {
            frames: Vec::new(),
            cursor: None,
            failure: Some(message.to_string()),
        }
    }

    /// Moves to the next frame and returns its step, or `None` once exhausted.
    pub fn next_step(&mut self) -> Option<u64> {
        let next = self.cursor.map_or(0, |index| index + 1);
        let frame = self.frames.get(next)?;
        self.cursor = Some(next);
        Some(frame.step)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn current(&self) -> Result<&Frame, ProbeError> {
        if let Some(message) = &self.failure {
            return Err(ProbeError::Oracle(message.clone()));
        }
        self.cursor
            .and_then(|index| self.frames.get(index))
            .ok_or_else(|| ProbeError::Oracle("no frame loaded".to_string()))
    }

    fn person(&self, person_id: &str) -> Result<&PersonFrame, ProbeError> {
        let frame = self.current()?;
        frame
            .people
            .iter()
            .find(|person| person.id == person_id)
            .ok_or_else(|| {
                ProbeError::Oracle(format!("unknown person {person_id} at step {}", frame.step))
            })
    }

    fn vehicle(&self, vehicle_id: &str) -> Result<&VehicleFrame, ProbeError> {
        let frame = self.current()?;
        frame
            .vehicles
            .iter()
            .find(|vehicle| vehicle.id == vehicle_id)
            .ok_or_else(|| {
                ProbeError::Oracle(format!(
                    "unknown vehicle {vehicle_id} at step {}",
                    frame.step
                ))
            })
    }
}

impl SimulationOracle for ScriptedOracle {
    fn person_ids(&mut self) -> Result<Vec<PersonId>, ProbeError> {
        Ok(self
            .current()?
            .people
            .iter()
            .map(|person| person.id.clone())
            .collect())
    }

    fn person_stage(&mut self, person_id: &str) -> Result<String, ProbeError> {
        Ok(self.person(person_id)?.stage.clone())
    }

    fn person_waiting_time(&mut self, person_id: &str) -> Result<f64, ProbeError> {
        Ok(self.person(person_id)?.waiting_time)
    }

    fn vehicle_ids(&mut self) -> Result<Vec<VehicleId>, ProbeError> {
        Ok(self
            .current()?
            .vehicles
            .iter()
            .map(|vehicle| vehicle.id.clone())
            .collect())
    }

    fn vehicle_type(&mut self, vehicle_id: &str) -> Result<String, ProbeError> {
        Ok(self.vehicle(vehicle_id)?.type_id.clone())
    }

    fn vehicle_distance(&mut self, vehicle_id: &str) -> Result<f64, ProbeError> {
        Ok(self.vehicle(vehicle_id)?.distance)
    }

    fn vehicle_road(&mut self, vehicle_id: &str) -> Result<EdgeId, ProbeError> {
        Ok(self.vehicle(vehicle_id)?.road_id.clone())
    }
}
