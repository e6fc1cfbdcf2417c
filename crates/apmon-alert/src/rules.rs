//! One [`crate::PolicyRule`] per alert category.

pub mod critical_exceptions;
pub mod dependency_failures;
pub mod failure_rate;
pub mod response_time;
pub mod slow_requests;

/// Quotes `s` as a KQL string literal.
pub(crate) fn kql_string(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// KQL `ago(..)` argument for the rule window.
pub(crate) fn window_literal(window_minutes: u32) -> String {
    if window_minutes % 60 == 0 {
        format!("{}h", window_minutes / 60)
    } else {
        format!("{window_minutes}m")
    }
}
