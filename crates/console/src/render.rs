//! Plain-text rendering for the `stakeboard` binary.

use std::fmt::Write;

use stakeboard_core::countdown::CountdownDisplay;
use stakeboard_core::distribution::{DistributionStatus, ExecutionSummary, PoolStats};
use stakeboard_core::ros_editor::SlotRow;
use stakeboard_core::wat::format_wat;

use crate::notify::{Toast, ToastLevel};

pub fn render_status(status: &DistributionStatus, countdown: Option<&CountdownDisplay>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Today's distribution: {}", status.status.label());

    if let Some(at) = status.scheduled_for {
        let _ = writeln!(out, "  Scheduled for:    {}", format_wat(at));
    }
    if let Some(countdown) = countdown {
        let _ = writeln!(out, "  Executes in:      {}", countdown.text());
    }
    if let Some(values) = &status.values {
        let _ = writeln!(out, "  ROS percentage:   {}%", values.ros_percentage);
        let _ = writeln!(out, "  Premium pool:     {:.2}", values.premium_pool_amount);
        let _ = writeln!(out, "  Performance pool: {:.2}", values.performance_pool_amount);
        if let Some(description) = values.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "  Description:      {description}");
        }
    }
    if let Some(execution) = &status.last_execution {
        render_execution(&mut out, execution);
    }
    out
}

fn render_execution(out: &mut String, execution: &ExecutionSummary) {
    let _ = writeln!(out, "  Last execution:   {}", execution.status.label());
    if let Some(at) = execution.executed_at {
        let _ = writeln!(out, "    Executed at:    {}", format_wat(at));
    }
    if let Some(ms) = execution.duration_ms {
        let _ = writeln!(out, "    Duration:       {ms} ms");
    }
    for (name, pool) in [
        ("ROS", &execution.ros),
        ("Premium", &execution.premium_pool),
        ("Performance", &execution.performance_pool),
    ] {
        if let Some(pool) = pool {
            render_pool(out, name, pool);
        }
    }
    let _ = writeln!(out, "    Total:          {:.2}", execution.total_distributed());
    if let Some(error) = &execution.error {
        let _ = writeln!(out, "    Error:          {error}");
    }
}

fn render_pool(out: &mut String, name: &str, pool: &PoolStats) {
    let _ = writeln!(
        out,
        "    {name:<15} {:.2} to {} recipients ({} failed)",
        pool.total_distributed, pool.recipients, pool.failed
    );
}

pub fn render_slots(rows: &[SlotRow], total: f64, warning: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4} {:<9} {:<16} {:<10} {:>8} {:>14}",
        "#", "Time", "Label", "Status", "ROS %", "Estimated"
    );
    for row in rows {
        let status = row.status.map(|s| s.label()).unwrap_or("-");
        let estimated = row
            .estimated
            .map(|e| format!("{e:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let lock = if row.locked { " (locked)" } else { "" };
        let _ = writeln!(
            out,
            "{:<4} {:<9} {:<16} {:<10} {:>8.2} {:>14}{lock}",
            row.slot_number, row.time, row.label, status, row.ros_percentage, estimated
        );
    }
    let _ = writeln!(out, "Total: {total:.2}%");
    if let Some(warning) = warning {
        let _ = writeln!(out, "Warning: {warning}");
    }
    out
}

pub fn render_toast(toast: &Toast) -> String {
    let tag = match toast.level {
        ToastLevel::Success => "ok",
        ToastLevel::Info => "info",
        ToastLevel::Warning => "warn",
        ToastLevel::Error => "error",
    };
    format!("[{tag}] {}", toast.message)
}
