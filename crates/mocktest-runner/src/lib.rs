//! mocktest-runner: drives a test session in real time.
//!
//! [`SessionHost`] owns a [`TestSession`](mocktest_core::engine::TestSession)
//! and the one [`SessionTimer`] that counts it down, applying commands and
//! ticks on a single task and reporting what happened as events.

pub mod host;
pub mod timer;

pub use host::{HostSummary, SessionCommand, SessionEvent, SessionHost};
pub use timer::SessionTimer;
