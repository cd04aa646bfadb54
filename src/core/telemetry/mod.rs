// Telemetry module - record decoding and the persistence seam
pub mod record;
pub mod sink;

pub use record::{
    DecodedRecord, FireReading, FireStatus, GasStatus, HomeEnvironment, PetReading, PlantReading,
    RecordDecoder, Supply, Thresholds, ToiletState,
};
pub use sink::{dispatch, LogSink, TelemetrySink};
