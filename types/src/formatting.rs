//! Centralized number formatting utilities.
//!
//! The analysis core never formats user-facing strings itself; renderers
//! (the CLI today) go through this module so percentages and durations look
//! the same everywhere.

/// Format a percentage value with 1 decimal place.
///
/// # Examples
/// ```
/// use tomestone_types::formatting::format_pct;
/// assert_eq!(format_pct(42.66), "42.7%");
/// assert_eq!(format_pct(100.0), "100.0%");
/// ```
pub fn format_pct(n: f64) -> String {
    format!("{:.1}%", n)
}

/// Format a millisecond duration as `M:SS`.
///
/// Sub-second remainders are truncated, matching how fight clocks are
/// usually displayed.
///
/// # Examples
/// ```
/// use tomestone_types::formatting::format_duration_ms;
/// assert_eq!(format_duration_ms(125_000), "2:05");
/// assert_eq!(format_duration_ms(59_900), "0:59");
/// assert_eq!(format_duration_ms(0), "0:00");
/// ```
pub fn format_duration_ms(ms: i64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Format a millisecond delta for display next to a timing judgment.
///
/// Deltas under ten seconds stay in milliseconds; longer ones switch to
/// one-decimal seconds.
///
/// # Examples
/// ```
/// use tomestone_types::formatting::format_delta_ms;
/// assert_eq!(format_delta_ms(450), "450ms");
/// assert_eq!(format_delta_ms(12_240), "12.2s");
/// assert_eq!(format_delta_ms(-800), "-800ms");
/// ```
pub fn format_delta_ms(ms: i64) -> String {
    if ms.abs() < 10_000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}
