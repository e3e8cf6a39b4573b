//! Daemon core: shared context plus the execution and recovery loops.

pub mod context;
pub mod tick;

pub use context::DaemonContext;
pub use tick::run;
