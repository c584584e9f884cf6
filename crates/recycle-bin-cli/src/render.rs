use chrono::{Local, TimeZone};
use recycle_bin_core::{AuditReport, Deleted, Listing, PurgeSummary, Restored};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn format_timestamp(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.format(TIME_FORMAT).to_string(),
        None => secs.to_string(),
    }
}

pub fn deleted(outcome: &Deleted) -> String {
    format!(
        "File {} moved to recycle bin with id {}. Will be deleted after {} secs.",
        outcome.record.original_path, outcome.record.id, outcome.retention_secs
    )
}

pub fn listing(listing: &Listing) -> String {
    let records = match listing {
        Listing::Empty => return "No files in recycle bin".to_string(),
        Listing::Records(records) => records,
    };

    let mut out = String::from("ID | Original Path | Deleted On | Scheduled Deletion\n");
    out.push_str(&"-".repeat(60));
    out.push('\n');
    for record in records {
        out.push_str(&format!(
            "{} | {} | {} | {}\n",
            record.id,
            record.original_path,
            format_timestamp(record.delete_timestamp),
            format_timestamp(record.scheduled_deletion)
        ));
    }
    out
}

pub fn restored(outcome: &Restored) -> String {
    if outcome.was_renamed() {
        format!(
            "File restored to {} ({} is occupied)",
            outcome.destination.display(),
            outcome.original_path.display()
        )
    } else {
        format!("File restored to {}", outcome.destination.display())
    }
}

pub fn purge_summary(summary: &PurgeSummary) -> String {
    if summary.is_idle() {
        return "No expired files to purge".to_string();
    }
    let mut out = format!(
        "Purged {} expired files, failed to purge {} files",
        summary.purged, summary.failed
    );
    if summary.missing > 0 {
        out.push_str(&format!(
            " ({} were already missing from the recycle bin)",
            summary.missing
        ));
    }
    out
}

pub fn audit(report: &AuditReport) -> String {
    if report.is_consistent() {
        return "Recycle bin is consistent".to_string();
    }
    let mut out = String::new();
    if !report.orphan_files.is_empty() {
        out.push_str("Untracked files in recycle bin:\n");
        for path in &report.orphan_files {
            out.push_str(&format!("  {}\n", path.display()));
        }
    }
    if !report.stale_records.is_empty() {
        out.push_str("Records with no file in recycle bin:\n");
        for record in &report.stale_records {
            out.push_str(&format!("  {} | {}\n", record.id, record.original_path));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use recycle_bin_core::Record;
    use std::path::PathBuf;

    fn record(id: i64, path: &str) -> Record {
        Record {
            id,
            original_path: path.to_string(),
            delete_timestamp: 1_700_000_000,
            scheduled_deletion: 1_700_000_060,
            file_type: ".txt".to_string(),
        }
    }

    #[test]
    fn test_empty_listing_is_explicit() {
        assert_eq!(listing(&Listing::Empty), "No files in recycle bin");
    }

    #[test]
    fn test_listing_rows() {
        let out = listing(&Listing::Records(vec![
            record(1, "/tmp/a.txt"),
            record(2, "/tmp/b.txt"),
        ]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID | Original Path"));
        assert!(lines[2].starts_with("1 | /tmp/a.txt | "));
        assert!(lines[3].starts_with("2 | /tmp/b.txt | "));
        assert!(lines[2].ends_with(&format_timestamp(1_700_000_060)));
    }

    #[test]
    fn test_purge_summary_idle_vs_failed() {
        assert_eq!(
            purge_summary(&PurgeSummary::default()),
            "No expired files to purge"
        );
        let failed = PurgeSummary {
            purged: 0,
            failed: 3,
            missing: 0,
        };
        assert_eq!(
            purge_summary(&failed),
            "Purged 0 expired files, failed to purge 3 files"
        );
        let missing = PurgeSummary {
            purged: 2,
            failed: 0,
            missing: 1,
        };
        assert!(purge_summary(&missing).contains("1 were already missing"));
    }

    #[test]
    fn test_restored_mentions_collision() {
        let plain = Restored {
            id: 1,
            original_path: PathBuf::from("/tmp/a.txt"),
            destination: PathBuf::from("/tmp/a.txt"),
        };
        assert_eq!(restored(&plain), "File restored to /tmp/a.txt");

        let renamed = Restored {
            id: 1,
            original_path: PathBuf::from("/tmp/a.txt"),
            destination: PathBuf::from("/tmp/a_restored.txt"),
        };
        assert!(restored(&renamed).contains("/tmp/a_restored.txt"));
        assert!(restored(&renamed).contains("occupied"));
    }

    #[test]
    fn test_format_timestamp_shape() {
        let text = format_timestamp(1_700_000_000);
        assert_eq!(text.len(), "2023-11-14 22:13".len());
    }
}
