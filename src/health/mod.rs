//! Health checks: a one-user, one-iteration run classified as up or down.
mod check;
mod target;


pub use check::{HealthReport, health_check_scenario, run_health_check, run_health_check_logged};
pub use target::{
    HealthCheckRecord, HealthSettings, MonitoredTarget, StaticRegistry, TargetRegistry,
    TargetStatus, check_all_targets, check_target,
};
