use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unsupported vehicle type: {0}")]
    UnsupportedVehicleType(String),
    #[error("no statistics recorded for step {0}")]
    MissingStep(u64),
    #[error("person {0} arrived without a recorded waiting time")]
    MissingWaitingRecord(String),
    #[error("step delta must be greater than zero")]
    InvalidStride,
    #[error("oracle error: {0}")]
    Oracle(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
