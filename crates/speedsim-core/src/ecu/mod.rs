//! ECU Data Model
//!
//! The real-time data record exchanged over the wire, the engine operating
//! modes, and read-only projections of both for monitoring front-ends.

mod mode;
mod status;
mod view;

pub use mode::EngineMode;
pub use status::{offset, EngineStatus, AUX_SIZE, FORMAT_VERSION, STATUS_SIZE, TEMP_OFFSET};
pub use view::{RealtimeView, StatisticsView, StatusView};
