use crate::oracle::BusSize;

pub const CSV_HEADER: &str = "step;\
number_of_people_total;number_of_people_arrived;number_of_people_driving;number_of_people_waiting;\
total_waiting_time;\
number_of_buses_s;number_of_buses_m;number_of_buses_l;\
total_distance_buses_s;total_distance_buses_m;total_distance_buses_l";

pub const CSV_FIELDS: [&str; 12] = [
    "step",
    "number_of_people_total",
    "number_of_people_arrived",
    "number_of_people_driving",
    "number_of_people_waiting",
    "total_waiting_time",
    "number_of_buses_s",
    "number_of_buses_m",
    "number_of_buses_l",
    "total_distance_buses_s",
    "total_distance_buses_m",
    "total_distance_buses_l",
];

/// Aggregated counters for a single simulation step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepStats {
    pub step: u64,
    pub number_of_people_total: u64,
    pub number_of_people_arrived: u64,
    pub number_of_people_driving: u64,
    pub number_of_people_waiting: u64,
    /// Seconds, summed over every arrived person.
    pub total_waiting_time: f64,
    pub number_of_buses_s: u64,
    pub number_of_buses_m: u64,
    pub number_of_buses_l: u64,
    /// Kilometers.
    pub total_distance_buses_s: f64,
    pub total_distance_buses_m: f64,
    pub total_distance_buses_l: f64,
}

impl StepStats {
    pub fn new(step: u64) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    pub fn bus_count(&self, size: BusSize) -> u64 {
        match size {
            BusSize::S => self.number_of_buses_s,
            BusSize::M => self.number_of_buses_m,
            BusSize::L => self.number_of_buses_l,
        }
    }

    pub fn bus_count_mut(&mut self, size: BusSize) -> &mut u64 {
        match size {
            BusSize::S => &mut self.number_of_buses_s,
            BusSize::M => &mut self.number_of_buses_m,
            BusSize::L => &mut self.number_of_buses_l,
        }
    }

    pub fn total_distance(&self, size: BusSize) -> f64 {
        match size {
            BusSize::S => self.total_distance_buses_s,
            BusSize::M => self.total_distance_buses_m,
            BusSize::L => self.total_distance_buses_l,
        }
    }

    pub fn total_distance_mut(&mut self, size: BusSize) -> &mut f64 {
        match size {
            BusSize::S => &mut self.total_distance_buses_s,
            BusSize::M => &mut self.total_distance_buses_m,
            BusSize::L => &mut self.total_distance_buses_l,
        }
    }

    /// Fields in header order, floats with six decimals.
    pub fn csv_record(&self) -> [String; 12] {
        [
            self.step.to_string(),
            self.number_of_people_total.to_string(),
            self.number_of_people_arrived.to_string(),
            self.number_of_people_driving.to_string(),
            self.number_of_people_waiting.to_string(),
            format!("{:.6}", self.total_waiting_time),
            self.number_of_buses_s.to_string(),
            self.number_of_buses_m.to_string(),
            self.number_of_buses_l.to_string(),
            format!("{:.6}", self.total_distance_buses_s),
            format!("{:.6}", self.total_distance_buses_m),
            format!("{:.6}", self.total_distance_buses_l),
        ]
    }

    pub fn to_csv_line(&self) -> String {
        self.csv_record().join(";")
    }
}
