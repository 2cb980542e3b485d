//! Per-step statistics for transit passengers and the bus fleet.
//!
//! [`StatisticsProbe::measure`] is called once per simulation step. People and
//! buses are folded into long-lived records, and every counter of the new
//! [`StepStats`] is recomputed from those records rather than carried forward
//! incrementally.

use crate::error::ProbeError;
use crate::oracle::{
    BusSize, EdgeId, PersonId, PersonStage, SimulationOracle, VehicleClass, VehicleId,
};
use crate::stats::StepStats;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct PersonObservation {
    id: PersonId,
    stage: PersonStage,
    /// Only queried while the person waits for a ride.
    waiting_time: Option<f64>,
}

#[derive(Debug, Clone)]
struct BusObservation {
    id: VehicleId,
    size: BusSize,
    distance_km: f64,
    road_id: EdgeId,
}

#[derive(Debug, Default)]
struct Snapshot {
    people: Vec<PersonObservation>,
    /// Every vehicle present this step, ordinary cars included.
    vehicle_ids: HashSet<VehicleId>,
    buses: Vec<BusObservation>,
}

#[derive(Debug)]
pub struct StatisticsProbe {
    depot_edge: EdgeId,
    history: BTreeMap<u64, StepStats>,
    last_step_stats: StepStats,
    waiting_time_per_person: BTreeMap<PersonId, f64>,
    arrived_people: BTreeSet<PersonId>,
    bus_types: BTreeMap<VehicleId, BusSize>,
    distance_per_bus: BTreeMap<VehicleId, f64>,
    edge_per_bus: BTreeMap<VehicleId, EdgeId>,
    buses_not_at_depot: Vec<VehicleId>,
}

impl StatisticsProbe {
    pub fn new(depot_edge: impl Into<EdgeId>) -> Self {
        let seed = StepStats::new(0);
        let mut history = BTreeMap::new();
        history.insert(0, seed.clone());
        Self {
            depot_edge: depot_edge.into(),
            history,
            last_step_stats: seed,
            waiting_time_per_person: BTreeMap::new(),
            arrived_people: BTreeSet::new(),
            bus_types: BTreeMap::new(),
            distance_per_bus: BTreeMap::new(),
            edge_per_bus: BTreeMap::new(),
            buses_not_at_depot: Vec::new(),
        }
    }

    pub fn depot_edge(&self) -> &str {
        &self.depot_edge
    }

    /// Recorded steps in ascending order, including the step 0 seed.
    pub fn history(&self) -> impl Iterator<Item = &StepStats> {
        self.history.values()
    }

    pub fn step_stats(&self, step: u64) -> Option<&StepStats> {
        self.history.get(&step)
    }

    pub fn last_step_stats(&self) -> &StepStats {
        &self.last_step_stats
    }

    pub fn arrived_people(&self) -> &BTreeSet<PersonId> {
        &self.arrived_people
    }

    pub fn buses_not_at_depot(&self) -> &[VehicleId] {
        &self.buses_not_at_depot
    }

    /// Queries the oracle for `step` and records the resulting statistics.
    ///
    /// All queries and validation happen before any record is touched, so an
    /// error leaves the probe exactly as it was before the call.
    pub fn measure<O>(&mut self, step: u64, oracle: &mut O) -> Result<&StepStats, ProbeError>
    where
        O: SimulationOracle + ?Sized,
    {
        let snapshot = observe(oracle)?;
        self.check_waiting_records(&snapshot)?;

        let mut stats = StepStats::new(step);
        self.count_people(&snapshot.people, &mut stats);
        self.sum_arrived(&mut stats);
        self.retire_vanished_buses(&snapshot.vehicle_ids);
        self.count_buses(&snapshot.buses, &mut stats);
        self.count_buses_not_at_depot(&mut stats);
        self.apply_count_floor(&mut stats);
        self.sum_distances(&mut stats);

        debug!(
            step,
            people_total = stats.number_of_people_total,
            arrived = stats.number_of_people_arrived,
            driving = stats.number_of_people_driving,
            waiting = stats.number_of_people_waiting,
            buses_s = stats.number_of_buses_s,
            buses_m = stats.number_of_buses_m,
            buses_l = stats.number_of_buses_l,
            "Step measured"
        );

        self.history.insert(step, stats.clone());
        self.last_step_stats = stats;
        Ok(&self.last_step_stats)
    }

    fn check_waiting_records(&self, snapshot: &Snapshot) -> Result<(), ProbeError> {
        let newly_arrived = snapshot.people.iter().filter(|person| {
            person.stage == PersonStage::Arrived && !self.arrived_people.contains(&person.id)
        });
        for person in newly_arrived {
            if !self.waiting_time_per_person.contains_key(&person.id) {
                warn!(person_id = %person.id, "Person arrived without ever waiting");
                return Err(ProbeError::MissingWaitingRecord(person.id.clone()));
            }
        }
        Ok(())
    }

    fn count_people(&mut self, people: &[PersonObservation], stats: &mut StepStats) {
        for person in people {
            match person.stage {
                PersonStage::WaitingForAny => {
                    stats.number_of_people_waiting += 1;
                    if let Some(waiting_time) = person.waiting_time {
                        self.waiting_time_per_person
                            .insert(person.id.clone(), waiting_time);
                    }
                }
                PersonStage::Driving => stats.number_of_people_driving += 1,
                PersonStage::Arrived => {
                    self.arrived_people.insert(person.id.clone());
                }
                PersonStage::Other => {}
            }
        }
    }

    /// Re-sums every person that ever arrived, not only this step's arrivals.
    fn sum_arrived(&self, stats: &mut StepStats) {
        // check_waiting_records guarantees every arrived person has a record.
        stats.total_waiting_time = self
            .arrived_people
            .iter()
            .filter_map(|person_id| self.waiting_time_per_person.get(person_id))
            .fold(0.0, |total, waiting_time| total + waiting_time);
        stats.number_of_people_arrived = self.arrived_people.len() as u64;
        stats.number_of_people_total = self.waiting_time_per_person.len() as u64;
    }

    fn retire_vanished_buses(&mut self, present: &HashSet<VehicleId>) {
        let vanished: Vec<VehicleId> = self
            .edge_per_bus
            .keys()
            .filter(|vehicle_id| !present.contains(*vehicle_id))
            .cloned()
            .collect();

        for vehicle_id in vanished {
            let Some(final_edge) = self.edge_per_bus.remove(&vehicle_id) else {
                continue;
            };
            let at_depot = final_edge == self.depot_edge;
            info!(
                vehicle_id = %vehicle_id,
                final_edge = %final_edge,
                at_depot,
                "Bus left the simulation"
            );
            if !at_depot {
                self.buses_not_at_depot.push(vehicle_id);
            }
        }
    }

    fn count_buses(&mut self, buses: &[BusObservation], stats: &mut StepStats) {
        for bus in buses {
            self.bus_types.entry(bus.id.clone()).or_insert(bus.size);
            self.distance_per_bus
                .insert(bus.id.clone(), bus.distance_km);
            *stats.bus_count_mut(bus.size) += 1;
            self.edge_per_bus
                .insert(bus.id.clone(), bus.road_id.clone());
        }
    }

    /// Buses that left away from the depot keep counting at every later step.
    fn count_buses_not_at_depot(&self, stats: &mut StepStats) {
        for vehicle_id in &self.buses_not_at_depot {
            if let Some(size) = self.bus_types.get(vehicle_id) {
                *stats.bus_count_mut(*size) += 1;
            }
        }
    }

    fn apply_count_floor(&self, stats: &mut StepStats) {
        for size in BusSize::ALL {
            let previous = self.last_step_stats.bus_count(size);
            let count = stats.bus_count_mut(size);
            if previous > *count {
                *count = previous;
            }
        }
    }

    fn sum_distances(&self, stats: &mut StepStats) {
        for (vehicle_id, distance_km) in &self.distance_per_bus {
            if let Some(size) = self.bus_types.get(vehicle_id) {
                *stats.total_distance_mut(*size) += distance_km;
            }
        }
    }
}

fn observe<O>(oracle: &mut O) -> Result<Snapshot, ProbeError>
where
    O: SimulationOracle + ?Sized,
{
    let mut snapshot = Snapshot::default();

    for person_id in oracle.person_ids()? {
        let stage = PersonStage::from_description(&oracle.person_stage(&person_id)?);
        let waiting_time = match stage {
            PersonStage::WaitingForAny => Some(oracle.person_waiting_time(&person_id)?),
            _ => None,
        };
        snapshot.people.push(PersonObservation {
            id: person_id,
            stage,
            waiting_time,
        });
    }

    for vehicle_id in oracle.vehicle_ids()? {
        let type_id = oracle.vehicle_type(&vehicle_id)?;
        let class = match VehicleClass::from_type_id(&type_id) {
            Ok(class) => class,
            Err(err) => {
                warn!(vehicle_id = %vehicle_id, type_id = %type_id, "Unsupported vehicle type");
                return Err(err);
            }
        };
        if let VehicleClass::Bus(size) = class {
            let distance_m = oracle.vehicle_distance(&vehicle_id)?;
            let road_id = oracle.vehicle_road(&vehicle_id)?;
            snapshot.buses.push(BusObservation {
                id: vehicle_id.clone(),
                size,
                distance_km: distance_m / 1000.0,
                road_id,
            });
        }
        snapshot.vehicle_ids.insert(vehicle_id);
    }

    Ok(snapshot)
}
