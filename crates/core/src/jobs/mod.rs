pub mod event_bus;
pub mod job_scheduler;
