//! The poll-cycle coordinator and its supporting pieces.
//!
//! [`Agent`] is the top-level orchestrator: it owns the integration
//! registry, the extraction boundary, the repositories, the process
//! guard, and the in-memory session state, and runs the scheduled
//! poll / recommendation / recalculation jobs.

pub mod coordinator;
pub mod guard;
pub mod reasoning;
pub mod recommend;
pub mod session;

pub use coordinator::Agent;
pub use guard::ProcessGuard;
pub use session::{AgentSessionState, AgentStatus, SessionStats};
