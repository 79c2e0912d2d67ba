//! Pure formatting functions for UI output.
//!
//! Table builders return strings so they can be tested; the `display_*`
//! functions print.

use chrono::{DateTime, TimeZone, Utc};
use console::{measure_text_width, pad_str, style, Alignment};

use crate::boundary::BoundaryWarning;
use crate::concourse::Build;
use crate::coordinator::{DeleteOutcome, ReleaseOutcome, ReleasePlan, RollbackOutcome, RollbackPlan};
use crate::domain::{short_hash, Acknowledgement, PartialFailure, ReleaseRecord, ReleaseState};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Print what went through, what failed and how to reconcile.
pub fn display_partial_failure(report: &PartialFailure) {
    eprintln!(
        "{} {} of {} partially applied",
        style("ERROR:").red().bold(),
        report.operation,
        style(&report.target).bold()
    );
    for step in &report.completed {
        eprintln!("  {} {}", style("✓").green(), step);
    }
    eprintln!("  {} {}: {}", style("✗").red(), report.failed, report.cause);
    eprintln!(
        "{} {}",
        style("State:").yellow().bold(),
        describe_state(&report.state())
    );
    eprintln!(
        "{} {}",
        style("Remediation:").yellow().bold(),
        report.remediation()
    );
}

/// Which backends hold the release after a partial failure
pub fn describe_state(state: &ReleaseState) -> String {
    let presence = |exists: bool| if exists { "present" } else { "missing" };
    let summary = format!(
        "tag {}, release record {}, pipeline {}",
        presence(state.tag_exists),
        presence(state.release_record_exists),
        if state.pipeline_triggered {
            "triggered"
        } else {
            "not triggered"
        }
    );
    if state.is_consistent() {
        summary
    } else {
        format!("{} (backends out of sync)", summary)
    }
}

/// `Xh Ym`, `Xm Ys`, or `In progress` when the build has not finished
pub fn format_duration(seconds: Option<i64>) -> String {
    match seconds {
        Some(total) => {
            let hours = total / 3600;
            let minutes = (total % 3600) / 60;
            let secs = total % 60;
            if hours > 0 {
                format!("{}h {}m", hours, minutes)
            } else {
                format!("{}m {}s", minutes, secs)
            }
        }
        None => "In progress".to_string(),
    }
}

pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_unix(seconds: Option<i64>) -> String {
    format_timestamp(seconds.and_then(|s| Utc.timestamp_opt(s, 0).single()))
}

fn styled_status(status: &str) -> String {
    match status {
        "succeeded" => style(status).green().to_string(),
        "failed" | "errored" => style(status).red().to_string(),
        "started" | "pending" => style(status).yellow().to_string(),
        _ => status.to_string(),
    }
}

/// Left-aligned table; widths follow the visible text so styled cells line up.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(measure_text_width(cell));
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad_str(cell, *width, Alignment::Left, None).into_owned())
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![
        line(headers.iter().map(|h| style(h).bold().to_string()).collect()),
        line(widths.iter().map(|w| "-".repeat(*w)).collect()),
    ];
    out.extend(rows.iter().map(|row| line(row.clone())));
    out.join("\n")
}

pub fn release_table(records: &[ReleaseRecord]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.tag.clone(),
                r.title.clone(),
                format_timestamp(r.created_at),
                r.author.clone().unwrap_or_else(|| "-".to_string()),
                r.url.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&["Tag", "Name", "Published", "Author", "URL"], &rows)
}

pub fn build_table(builds: &[Build]) -> String {
    let rows: Vec<Vec<String>> = builds
        .iter()
        .map(|b| {
            vec![
                b.name.clone(),
                b.job_name.clone().unwrap_or_else(|| "-".to_string()),
                styled_status(&b.status),
                format_unix(b.start_time),
                format_duration(b.duration_secs()),
            ]
        })
        .collect();
    render_table(&["Build", "Job", "Status", "Started", "Duration"], &rows)
}

fn describe_ack(ack: &Acknowledgement) -> String {
    let mut text = match (&ack.build_name, ack.build_id) {
        (Some(name), _) => format!("build #{}", name),
        (None, Some(id)) => format!("build #{}", id),
        (None, None) => "build".to_string(),
    };
    if let Some(url) = &ack.url {
        text.push_str(&format!(" ({})", url));
    }
    text
}

pub fn display_release_plan(plan: &ReleasePlan, message: &str) {
    println!("\n{}", style("Release plan:").bold());
    println!("  Version: {}", style(&plan.version).green());
    println!("  Tag:     {}", plan.tag);
    println!("  Commit:  {}", short_hash(&plan.commit));
    println!("  Title:   {}", plan.title);
    println!("  Message: {}", message);
}

pub fn display_release_outcome(outcome: &ReleaseOutcome) {
    display_success(&format!(
        "Released {} at {}",
        style(&outcome.tag).green().bold(),
        short_hash(&outcome.commit)
    ));
    display_status(&format!("Pipeline accepted {}", describe_ack(&outcome.acknowledgement)));
}

pub fn display_rollback_plan(plan: &RollbackPlan) {
    println!("\n{}", style("Rollback plan:").bold());
    println!("  Target:  {}", style(&plan.tag).yellow());
    println!("  Commit:  {}", short_hash(&plan.commit));
    println!(
        "  Trigger: version={} is_rollback={}",
        plan.trigger.version, plan.trigger.is_rollback
    );
}

pub fn display_rollback_outcome(outcome: &RollbackOutcome) {
    display_success(&format!(
        "Rollback to {} requested, pipeline accepted {}",
        style(&outcome.tag).yellow().bold(),
        describe_ack(&outcome.acknowledgement)
    ));
}

pub fn display_delete_outcome(outcome: &DeleteOutcome) {
    let part = |deleted: bool| if deleted { "deleted" } else { "already absent" };
    display_success(&format!(
        "Release {}: record {}, tag {}",
        style(&outcome.tag).bold(),
        part(outcome.record_deleted),
        part(outcome.tag_deleted)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Step;
    use crate::error::{Backend, VoyagerError};

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(59)), "0m 59s");
        assert_eq!(format_duration(Some(125)), "2m 5s");
        assert_eq!(format_duration(Some(3 * 3600 + 7 * 60 + 3)), "3h 7m");
        assert_eq!(format_duration(None), "In progress");
    }

    #[test]
    fn test_format_timestamp() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(format_timestamp(Some(t)), "2024-03-01 09:30:00");
        assert_eq!(format_timestamp(None), "-");
    }

    #[test]
    fn test_release_table_columns() {
        let mut record = ReleaseRecord::new("v1.0.0", "abc", "First", "");
        record.author = Some("octocat".to_string());
        let table = console::strip_ansi_codes(&release_table(&[record])).to_string();

        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("Tag"));
        assert!(lines[0].contains("Published"));
        assert!(lines[2].starts_with("v1.0.0"));
        assert!(lines[2].contains("octocat"));
    }

    #[test]
    fn test_build_table_shows_progress() {
        let build = Build {
            id: 9,
            name: "9".to_string(),
            job_name: Some("rollback".to_string()),
            status: "started".to_string(),
            start_time: Some(1_700_000_000),
            end_time: None,
        };
        let table = console::strip_ansi_codes(&build_table(&[build])).to_string();
        assert!(table.contains("In progress"));
        assert!(table.contains("rollback"));
    }

    #[test]
    fn test_describe_ack() {
        let ack = Acknowledgement {
            build_id: Some(4),
            build_name: None,
            url: Some("https://ci/builds/4".to_string()),
        };
        assert_eq!(describe_ack(&ack), "build #4 (https://ci/builds/4)");
    }

    #[test]
    fn test_describe_state() {
        let tag_only = ReleaseState {
            tag_exists: true,
            ..ReleaseState::default()
        };
        assert_eq!(
            describe_state(&tag_only),
            "tag present, release record missing, pipeline not triggered (backends out of sync)"
        );

        let complete = ReleaseState {
            tag_exists: true,
            release_record_exists: true,
            pipeline_triggered: true,
        };
        assert_eq!(
            describe_state(&complete),
            "tag present, release record present, pipeline triggered"
        );
    }

    #[test]
    fn test_partial_delete_state_is_out_of_sync() {
        let report = PartialFailure::new(
            "delete",
            "v2.0.0",
            vec![Step::DeleteRecord],
            Step::DeleteTag,
            VoyagerError::network(Backend::TagStore, "delete tag v2.0.0", "refused"),
        );
        let state = describe_state(&report.state());
        assert!(state.starts_with("tag present, release record missing"));
        assert!(state.ends_with("(backends out of sync)"));
    }

    #[test]
    fn test_display_partial_failure() {
        // Visual verification test - output is printed to stderr
        let report = PartialFailure::new(
            "release",
            "v1.0.0",
            vec![Step::CreateTag],
            Step::CreateRecord,
            VoyagerError::network(Backend::RecordStore, "create release v1.0.0", "timed out"),
        );
        display_partial_failure(&report);
    }
}
