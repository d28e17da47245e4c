//! # SpeedSim Core Library
//!
//! Engine model and serial protocol for the SpeedSim ECU simulator.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - The 79-byte real-time data record ("wire record") exchanged over the protocol
//! - A timed engine simulation with an operating-mode state machine
//! - A Speeduino-compatible command handler (`A`, `Q`, `V`/`v`, `S`, `n`)
//! - Transport, clock and random source traits with real and fake implementations
//!
//! ## Example
//!
//! ```rust,ignore
//! use speedsim_core::prelude::*;
//!
//! let clock = SystemClock::new();
//! let mut engine = EngineSimulator::new(clock, EntropyRandom::new());
//! engine.initialize();
//!
//! let mut protocol = ProtocolHandler::new(TcpChannel::listen("127.0.0.1:5555")?);
//! protocol.begin()?;
//!
//! loop {
//!     engine.tick();
//!     protocol.poll(engine.status())?;
//! }
//! ```

pub mod ecu;
pub mod engine;
pub mod platform;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ecu::{EngineMode, EngineStatus, RealtimeView, StatisticsView, StatusView};
    pub use crate::engine::EngineSimulator;
    pub use crate::platform::{
        EntropyRandom, ManualClock, RandomProvider, ScriptedRandom, SeededRandom, SystemClock,
        TimeProvider,
    };
    pub use crate::protocol::{
        MemoryChannel, PollOutcome, ProtocolError, ProtocolHandler, SerialChannel,
        SerialInterface, TcpChannel,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
