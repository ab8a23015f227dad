pub mod accounting_period;
pub mod agent;
pub mod agent_document;
pub mod change_log;
pub mod employee;
pub mod pickup_point;
pub mod report;
pub mod role;
pub mod schedule;
pub mod shift;
pub mod user;
