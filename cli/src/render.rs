//! Plain-text rendering of a report.
//!
//! This is the presentation layer: it resolves template ids into English
//! text and formats the numbers. The core never does either.

use serde_json::Value;
use tomestone_core::report::template;
use tomestone_core::{Report, ReportEntry};
use tomestone_types::Severity;
use tomestone_types::formatting::{format_delta_ms, format_duration_ms, format_pct};

pub fn render_report(report: &Report, min_severity: Severity) -> String {
    let entries = report.with_min_severity(min_severity);
    if entries.is_empty() {
        return "no findings\n".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        out.push_str(&render_entry(entry));
        out.push('\n');
    }
    out
}

fn render_entry(entry: &ReportEntry) -> String {
    let f = &entry.finding;
    format!("[{}] {}: {}", tag(f.severity), entry.handle, message(f.template, &f.data))
}

fn tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "INFO",
        Severity::Warning => "WARN",
        Severity::Error => "FAIL",
    }
}

fn message(template: &str, data: &serde_json::Map<String, Value>) -> String {
    let text = |key: &str| data.get(key).and_then(Value::as_str).unwrap_or("?").to_string();
    let num = |key: &str| data.get(key).and_then(Value::as_i64).unwrap_or(0);
    let pct = |key: &str| format_pct(data.get(key).and_then(Value::as_f64).unwrap_or(0.0));
    let pool = |key: &str| {
        data.get(key)
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" / ")
            })
            .unwrap_or_else(|| "?".to_string())
    };

    match template {
        template::LATE_FIRST_USE => format!(
            "{} first used {} late (at {}, expected by {})",
            pool("actions"),
            format_delta_ms(num("delta_ms")),
            format_duration_ms(num("observed_ms")),
            format_duration_ms(num("expected_ms")),
        ),
        template::LATE_USE => format!(
            "use #{} was {} late (at {})",
            num("use_index"),
            format_delta_ms(num("delta_ms")),
            format_duration_ms(num("observed_ms")),
        ),
        template::DOWNTIME => format!(
            "{}: {} of possible uses lost ({}/{} used)",
            pool("actions"),
            pct("downtime_pct"),
            num("observed_uses"),
            num("expected_uses"),
        ),
        template::BUFF_UPTIME => {
            format!("{} uptime {}", text("status_name"), pct("uptime_pct"))
        }
        template::BUFF_LOW_UPTIME => format!(
            "{} uptime {} (expected {})",
            text("status_name"),
            pct("uptime_pct"),
            pct("expected_pct"),
        ),
        template::DEATHS => format!(
            "died {} time(s): {}",
            num("count"),
            data.get("timestamps_ms")
                .and_then(Value::as_array)
                .map(|ts| ts
                    .iter()
                    .filter_map(Value::as_i64)
                    .map(format_duration_ms)
                    .collect::<Vec<_>>()
                    .join(", "))
                .unwrap_or_default(),
        ),
        template::MODULE_FAILED => {
            format!("module {} failed: {}", text("module"), text("error"))
        }
        template::UNKNOWN_REFERENCE => {
            format!("log references unknown {} id {}", text("ref_kind"), num("id"))
        }
        // Unrecognized template: dump the raw data so nothing is lost.
        other => format!("{other} {}", Value::Object(data.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tomestone_core::Finding;
    use tomestone_core::Report;

    #[test]
    fn test_render_late_first_use() {
        let report = Report::from_findings(vec![
            Finding::new("cooldown_downtime", Severity::Warning, template::LATE_FIRST_USE)
                .with("actions", vec!["High Jump"])
                .with("delta_ms", 450)
                .with("observed_ms", 12_200)
                .with("expected_ms", 11_750),
        ]);

        let text = render_report(&report, Severity::Info);
        assert_eq!(
            text,
            "[WARN] cooldown_downtime/0: High Jump first used 450ms late (at 0:12, expected by 0:11)\n"
        );
    }

    #[test]
    fn test_severity_filter_hides_info() {
        let report = Report::from_findings(vec![
            Finding::new("buff_uptime", Severity::Info, template::BUFF_UPTIME)
                .with("status_name", "Battle Litany")
                .with("uptime_pct", 99.3),
        ]);

        assert_eq!(render_report(&report, Severity::Warning), "no findings\n");
        let shown = render_report(&report, Severity::Info);
        assert!(shown.contains("Battle Litany uptime 99.3%"));
    }
}
