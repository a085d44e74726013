//! Session layer for Skydrop.
//!
//! This crate plays one run of the scheduling protocol:
//!
//! 1. **State machine** — [`Session`] tracks the [`Phase`] of the run and
//!    decides what to send for each inbound message
//! 2. **Decisions** — a [`DecisionPolicy`] answers every `GetMoves`
//!    ([`GreedyPolicy`] is the reference baseline)
//! 3. **Run loop** — [`run_session`] wires the machine to a connection and
//!    a codec, and always closes the connection at the end
//!
//! # How it fits in the stack
//!
//! ```text
//! Binary (above)  ← builds the config, opens the connection
//!     ↕
//! Session Layer (this crate)  ← protocol phases, policy calls
//!     ↕
//! Protocol Layer (below)  ← Value, ServerMessage, ClientMessage, Codec
//! ```

mod config;
mod driver;
mod error;
mod policy;
mod report;
mod state;

pub use config::{
    endpoint_url, SessionConfig, COMPETITION_ENDPOINT, TESTING_ENDPOINT,
};
pub use driver::run_session;
pub use error::{PolicyError, SessionError};
pub use policy::{DecisionPolicy, GreedyPolicy};
pub use report::format_stats;
pub use state::{Phase, Session, SessionOutcome, SessionStats, Transition};
