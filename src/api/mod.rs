pub mod accounting_period;
pub mod agent_document;
pub mod change_log;
pub mod employee;
pub mod pickup_point;
pub mod report;
pub mod schedule;
