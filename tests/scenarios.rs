use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};
use transit_stats::oracle::scripted::{Frame, ScriptedOracle};
use transit_stats::oracle::{
    STAGE_ARRIVED, STAGE_DRIVING, STAGE_WAITING_FOR_ANY, TYPE_BUS_L, TYPE_BUS_M, TYPE_BUS_S,
    TYPE_ORDINARY_CAR,
};
use transit_stats::output::write_results;
use transit_stats::stats::CSV_HEADER;
use transit_stats::{ProbeError, StatisticsProbe, StepStats};

const DEPOT: &str = "depot_out";

fn replay(probe: &mut StatisticsProbe, frames: Vec<Frame>) -> Result<(), ProbeError> {
    let mut oracle = ScriptedOracle::new(frames);
    while let Some(step) = oracle.next_step() {
        probe.measure(step, &mut oracle)?;
    }
    Ok(())
}

fn stats_at(probe: &StatisticsProbe, step: u64) -> Result<&StepStats, ProbeError> {
    probe.step_stats(step).ok_or(ProbeError::MissingStep(step))
}

#[test]
fn waiting_person_counts_as_arrived_from_arrival_onward() -> Result<(), ProbeError> {
    let mut probe = StatisticsProbe::new(DEPOT);
    let mut frames = vec![
        Frame::new(1).person("p1", STAGE_WAITING_FOR_ANY, 1.0),
        Frame::new(2).person("p1", STAGE_WAITING_FOR_ANY, 2.0),
        Frame::new(3).person("p1", STAGE_WAITING_FOR_ANY, 3.0),
    ];
    frames.extend((4..8).map(|step| Frame::new(step).person("p1", STAGE_ARRIVED, 0.0)));
    // The person may leave the oracle entirely after arriving.
    frames.extend((8..10).map(Frame::new));

    replay(&mut probe, frames)?;

    for step in 1..4 {
        let stats = stats_at(&probe, step)?;
        assert_eq!(stats.number_of_people_arrived, 0);
        assert_eq!(stats.number_of_people_waiting, 1);
        assert_eq!(stats.total_waiting_time, 0.0);
    }
    for step in 4..10 {
        let stats = stats_at(&probe, step)?;
        assert_eq!(stats.number_of_people_arrived, 1);
        assert_eq!(stats.number_of_people_waiting, 0);
        assert_eq!(stats.number_of_people_total, 1);
        assert_eq!(stats.total_waiting_time, 3.0);
    }
    Ok(())
}

#[test]
fn bus_lost_away_from_depot_stays_counted() -> Result<(), ProbeError> {
    let mut probe = StatisticsProbe::new(DEPOT);
    let mut frames: Vec<Frame> = (1..5)
        .map(|step| Frame::new(step).vehicle("bus_s_1", TYPE_BUS_S, step as f64 * 500.0, "e3"))
        .collect();
    frames.extend((5..8).map(Frame::new));
    frames.extend(
        (8..10).map(|step| Frame::new(step).vehicle("bus_s_2", TYPE_BUS_S, 0.0, "depot_in")),
    );

    replay(&mut probe, frames)?;

    assert_eq!(probe.buses_not_at_depot(), ["bus_s_1".to_string()]);
    for step in 5..8 {
        let stats = stats_at(&probe, step)?;
        assert_eq!(stats.number_of_buses_s, 1);
        assert_eq!(stats.total_distance_buses_s, 2.0);
    }
    for step in 8..10 {
        assert_eq!(stats_at(&probe, step)?.number_of_buses_s, 2);
    }
    Ok(())
}

#[test]
fn bus_counts_never_decrease() -> Result<(), ProbeError> {
    let mut probe = StatisticsProbe::new(DEPOT);
    let frames = vec![
        Frame::new(1)
            .vehicle("m1", TYPE_BUS_M, 0.0, "e1")
            .vehicle("m2", TYPE_BUS_M, 0.0, "e1")
            .vehicle("l1", TYPE_BUS_L, 0.0, "e1"),
        Frame::new(2)
            .vehicle("m1", TYPE_BUS_M, 400.0, DEPOT)
            .vehicle("l1", TYPE_BUS_L, 300.0, "e1"),
        Frame::new(3).vehicle("l1", TYPE_BUS_L, 600.0, DEPOT),
        Frame::new(4),
        Frame::new(5).vehicle("s1", TYPE_BUS_S, 10.0, "e2"),
        Frame::new(6),
    ];

    replay(&mut probe, frames)?;

    let history: Vec<&StepStats> = probe.history().collect();
    for pair in history.windows(2) {
        assert!(pair[1].number_of_buses_s >= pair[0].number_of_buses_s);
        assert!(pair[1].number_of_buses_m >= pair[0].number_of_buses_m);
        assert!(pair[1].number_of_buses_l >= pair[0].number_of_buses_l);
    }
    let last = probe.last_step_stats();
    assert_eq!(last.number_of_buses_m, 2);
    assert_eq!(last.number_of_buses_l, 1);
    assert_eq!(last.number_of_buses_s, 1);
    Ok(())
}

#[test]
fn ordinary_cars_never_reach_bus_counters() -> Result<(), ProbeError> {
    let mut probe = StatisticsProbe::new(DEPOT);
    let frames = (1..6)
        .map(|step| {
            let frame = Frame::new(step).person("driver", STAGE_DRIVING, 0.0);
            if step < 4 {
                frame.vehicle("car_1", TYPE_ORDINARY_CAR, step as f64 * 1000.0, "e9")
            } else {
                frame
            }
        })
        .collect();

    replay(&mut probe, frames)?;

    for stats in probe.history() {
        assert_eq!(stats.number_of_buses_s + stats.number_of_buses_m + stats.number_of_buses_l, 0);
        assert_eq!(stats.total_distance_buses_s, 0.0);
        assert_eq!(stats.total_distance_buses_m, 0.0);
        assert_eq!(stats.total_distance_buses_l, 0.0);
    }
    assert!(probe.buses_not_at_depot().is_empty());
    assert_eq!(probe.last_step_stats().number_of_people_driving, 1);
    Ok(())
}

#[test]
fn unsupported_type_stops_replay_without_storing_step() -> Result<(), ProbeError> {
    let mut probe = StatisticsProbe::new(DEPOT);
    let mut oracle = ScriptedOracle::new(vec![
        Frame::new(1).vehicle("bus_1", TYPE_BUS_S, 0.0, "e1"),
        Frame::new(2).vehicle("ferry_1", "FERRY", 0.0, "river"),
        Frame::new(3),
    ]);

    let mut failure = None;
    while let Some(step) = oracle.next_step() {
        if let Err(err) = probe.measure(step, &mut oracle) {
            failure = Some((step, err));
            break;
        }
    }

    let (step, err) = failure.ok_or(ProbeError::MissingStep(2))?;
    assert_eq!(step, 2);
    assert_eq!(err.to_string(), "unsupported vehicle type: FERRY");
    assert!(probe.step_stats(2).is_none());
    assert!(probe.step_stats(1).is_some());
    Ok(())
}

#[test]
fn csv_rows_match_stored_records() -> Result<(), Box<dyn std::error::Error>> {
    let mut probe = StatisticsProbe::new(DEPOT);
    let frames = (0..10)
        .map(|step| {
            let mut frame = Frame::new(step)
                .person("p1", if step < 5 { STAGE_WAITING_FOR_ANY } else { STAGE_ARRIVED }, step as f64 * 1.25)
                .person("p2", STAGE_WAITING_FOR_ANY, step as f64 / 3.0)
                .vehicle("car", TYPE_ORDINARY_CAR, 1.0, "e1");
            if step <= 8 {
                let road = if step == 8 { DEPOT } else { "e2" };
                frame = frame.vehicle("bus_m", TYPE_BUS_M, step as f64 * 333.3, road);
            }
            frame
        })
        .collect();
    replay(&mut probe, frames)?;

    let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
    let path = std::env::temp_dir().join(format!("transit-stats-roundtrip-{unique}.csv"));
    let rows = write_results(&path, &probe, 0, 10, 2)?;
    let contents = fs::read_to_string(&path)?;
    let _ = fs::remove_file(&path);

    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    let data: Vec<Vec<&str>> = lines.map(|line| line.split(';').collect()).collect();
    assert_eq!(rows, 5);
    assert_eq!(data.len(), 5);

    for (row, expected_step) in data.iter().zip([0u64, 2, 4, 6, 8]) {
        let stats = stats_at(&probe, expected_step)?;
        assert_eq!(row.len(), 12);
        assert_eq!(row[0].parse::<u64>()?, stats.step);
        assert_eq!(row[1].parse::<u64>()?, stats.number_of_people_total);
        assert_eq!(row[2].parse::<u64>()?, stats.number_of_people_arrived);
        assert_eq!(row[3].parse::<u64>()?, stats.number_of_people_driving);
        assert_eq!(row[4].parse::<u64>()?, stats.number_of_people_waiting);
        assert_eq!(row[5], format!("{:.6}", stats.total_waiting_time));
        assert_eq!(row[6].parse::<u64>()?, stats.number_of_buses_s);
        assert_eq!(row[7].parse::<u64>()?, stats.number_of_buses_m);
        assert_eq!(row[8].parse::<u64>()?, stats.number_of_buses_l);
        assert_eq!(row[9], format!("{:.6}", stats.total_distance_buses_s));
        assert_eq!(row[10], format!("{:.6}", stats.total_distance_buses_m));
        assert_eq!(row[11], format!("{:.6}", stats.total_distance_buses_l));
        for float_field in [row[5], row[9], row[10], row[11]] {
            let (_, fraction) = float_field.split_once('.').ok_or("missing decimal point")?;
            assert_eq!(fraction.len(), 6);
        }
    }
    assert_eq!(
        data[0].join(";"),
        "0;2;0;0;2;0.000000;0;1;0;0.000000;0.000000;0.000000"
    );
    assert_eq!(
        data[3].join(";"),
        "6;2;1;0;1;5.000000;0;1;0;0.000000;1.999800;0.000000"
    );
    assert_eq!(data[4][2], "1");
    assert_eq!(data[4][5], "5.000000");
    assert_eq!(data[4][10], "2.666400");
    Ok(())
}
