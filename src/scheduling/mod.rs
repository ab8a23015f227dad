//! Work schedule domain: shift overlap rules, the approval workflow and the
//! service that sequences store writes with change-log records.

pub mod conflict;
pub mod locks;
pub mod report;
pub mod service;
pub mod workflow;

pub use service::{ScheduleService, is_conflicting};
