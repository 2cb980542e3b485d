use crate::error::ProbeError;
use crate::probe::StatisticsProbe;
use crate::stats::CSV_FIELDS;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write the header and one row per step in `(start..end).step_by(delta)`.
///
/// Rows are rendered before anything is written, so a missing step leaves the
/// sink untouched.
pub fn write_csv<W: Write>(
    writer: &mut W,
    probe: &StatisticsProbe,
    start: u64,
    end: u64,
    delta: u64,
) -> Result<usize, ProbeError> {
    let records = render_records(probe, start, end, delta)?;
    write_records(writer, &records)
}

/// Create (or truncate) `path` and write the selected steps to it.
pub fn write_results(
    path: impl AsRef<Path>,
    probe: &StatisticsProbe,
    start: u64,
    end: u64,
    delta: u64,
) -> Result<usize, ProbeError> {
    let path = path.as_ref();
    // Rendered before the file is truncated.
    let records = render_records(probe, start, end, delta)?;
    let rows = write_records(File::create(path)?, &records)?;
    info!(path = %path.display(), rows, start, end, delta, "Statistics written");
    Ok(rows)
}

/// Same as [`write_results`] with the last measured step as the exclusive end.
pub fn write_results_to_last(
    path: impl AsRef<Path>,
    probe: &StatisticsProbe,
    start: u64,
    delta: u64,
) -> Result<usize, ProbeError> {
    let end = probe.last_step_stats().step;
    write_results(path, probe, start, end, delta)
}

fn write_records<W: Write>(writer: W, records: &[[String; 12]]) -> Result<usize, ProbeError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    writer.write_record(CSV_FIELDS)?;
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(records.len())
}

fn render_records(
    probe: &StatisticsProbe,
    start: u64,
    end: u64,
    delta: u64,
) -> Result<Vec<[String; 12]>, ProbeError> {
    if delta == 0 {
        return Err(ProbeError::InvalidStride);
    }
    let step_by = usize::try_from(delta).map_err(|_| ProbeError::InvalidStride)?;
    (start..end)
        .step_by(step_by)
        .map(|step| {
            probe
                .step_stats(step)
                .map(|stats| stats.csv_record())
                .ok_or(ProbeError::MissingStep(step))
        })
        .collect()
}
