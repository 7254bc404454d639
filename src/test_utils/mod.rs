//! In-process doubles for exercising loaders and sessions without a server.

pub mod recording;

pub use recording::{Event, EventLog, RecordingConnection};
