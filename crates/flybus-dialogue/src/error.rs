use thiserror::Error;

/// Invariant violations found while loading the compiled-in fact store.
#[derive(Debug, Error, PartialEq)]
pub enum KnowledgeError {
    #[error("invalid clock time '{value}' in {field}")]
    InvalidClockTime { field: &'static str, value: String },

    #[error("timetable is not sorted by terminal departure at entry {index}")]
    UnsortedTimetable { index: usize },

    #[error("timetable entry {index} does not reach the airport after leaving the terminal")]
    InconsistentDeparture { index: usize },

    #[error("{tier} tier: children must travel free")]
    ChargedChildFare { tier: String },

    #[error("{tier} tier: return fare for {band} exceeds two one-way fares")]
    ReturnFareTooHigh { tier: String, band: String },

    #[error("bus stop {stop} references unknown area '{area}'")]
    UnknownArea { stop: u32, area: String },

    #[error("duplicate bus stop number {0}")]
    DuplicateStop(u32),

    #[error("landmark alias '{alias}' points at missing bus stop {stop}")]
    DanglingLandmark { alias: String, stop: u32 },
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("session '{session_id}' changed since it was read (expected revision {expected}, found {found})")]
    Stale {
        session_id: String,
        expected: u64,
        found: u64,
    },
}
