//! Plain-text rendering of reconciliation events.

use std::io::{self, Write};

use reconcile_engine::{FinalStatus, ObjectLine, Presence, ReportEvent, Reporter, Summary, format_size};

/// Timestamp layout of per-object lines.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes reconciliation events as console lines.
///
/// [`Reporter::report`] cannot fail, so the first write error is kept and
/// returned by [`ConsoleReporter::finish`]; later events are dropped.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleReporter<W> {
    /// Report to `out`.
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Section header printed before a network is processed.
    pub fn header(&mut self, title: &str) {
        self.write(format_args!("\n>>>>> {title} Processing <<<<<\n"));
    }

    /// The effective configuration, already masked.
    pub fn config(&mut self, rendered: &str) {
        self.write(format_args!("{rendered}\n"));
    }

    /// A bucket that could not be processed.
    pub fn failure(&mut self, err: &anyhow::Error) {
        self.write(format_args!("ERROR {err:#}\n"));
    }

    /// Blank separator after a network.
    pub fn end_section(&mut self) {
        self.write(format_args!("\n"));
    }

    /// Flush output and surface the first write error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write(&mut self, args: std::fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.out.write_fmt(args) {
            self.error = Some(err);
        }
    }

    fn object(&mut self, line: &ObjectLine) {
        let mut text = format!(
            "{:6}) {} key: {}",
            line.index,
            line.last_modified.format(TIMESTAMP_FORMAT),
            line.key
        );
        if let Some(size) = line.size {
            text.push_str(&format!("  size: {size}"));
        }
        match line.presence {
            Presence::Unchecked | Presence::Present => {}
            Presence::Missing => text.push_str(" [NOT_IN_2]"),
            Presence::Copied => text.push_str(" [NOT_IN_2] [COPIED]"),
        }
        self.write(format_args!("{text}\n"));
    }

    fn summary(&mut self, summary: &Summary) {
        if let Some(total) = summary.total_size {
            self.write(format_args!(
                "\nTotal size of listed objects: {} ({total})\n",
                format_size(total)
            ));
        }

        let bucket = summary.secondary_bucket.as_deref().unwrap_or_default();
        match summary.status {
            FinalStatus::Unchecked => {}
            FinalStatus::AllPresent => {
                self.write(format_args!("All checked objects exist in bucket '{bucket}'\n"));
            }
            FinalStatus::Missing { missing } => {
                self.write(format_args!("Missing {missing} objects in bucket '{bucket}'\n"));
            }
            FinalStatus::Copied { copied, missing } if copied == missing => {
                self.write(format_args!("Copied {copied} objects to bucket '{bucket}'\n"));
            }
            FinalStatus::Copied { copied, missing } => {
                self.write(format_args!(
                    "Copied {copied} of {missing} missing objects to bucket '{bucket}'\n"
                ));
            }
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, event: ReportEvent) {
        match event {
            ReportEvent::Buckets { names } => {
                self.write(format_args!("Buckets: {}  [{}]\n\n", names.len(), names.join(", ")));
            }
            ReportEvent::BucketCount { bucket, count } => {
                self.write(format_args!("{bucket}: {count} objects\n\n"));
            }
            ReportEvent::SecondaryCount { bucket, count } => {
                self.write(format_args!("Compare to  {bucket}: {count} objects\n\n"));
            }
            ReportEvent::Degraded { reason, .. } => {
                self.write(format_args!("WARNING: Cannot connect to secondary bucket: {reason}\n"));
            }
            ReportEvent::ListingStarted { bucket } => {
                self.write(format_args!("List of Objects in Bucket: {bucket}\n\n"));
            }
            ReportEvent::Issue { message, .. } => {
                self.write(format_args!("ERROR {message}\n"));
            }
            ReportEvent::Object(line) => self.object(&line),
            ReportEvent::Summary(summary) => self.summary(&summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn render(events: Vec<ReportEvent>) -> String {
        let mut console = ConsoleReporter::new(Vec::new());
        for event in events {
            console.report(event);
        }
        String::from_utf8(console.finish().expect("finish")).expect("utf8")
    }

    fn line(index: u64, size: Option<u64>, presence: Presence) -> ReportEvent {
        ReportEvent::Object(ObjectLine {
            index,
            last_modified: DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp"),
            key: "blocks/1.car".to_owned(),
            size,
            presence,
        })
    }

    #[test]
    fn test_should_render_bucket_overview() {
        let out = render(vec![
            ReportEvent::Buckets {
                names: vec!["alpha".into(), "beta".into()],
            },
            ReportEvent::BucketCount {
                bucket: "alpha".into(),
                count: 12,
            },
            ReportEvent::SecondaryCount {
                bucket: "beta".into(),
                count: 10,
            },
        ]);
        assert_eq!(
            out,
            "Buckets: 2  [alpha, beta]\n\nalpha: 12 objects\n\nCompare to  beta: 10 objects\n\n"
        );
    }

    #[test]
    fn test_should_render_object_lines() {
        let out = render(vec![
            line(3, Some(2048), Presence::Missing),
            line(4, None, Presence::Copied),
            line(1_234_567, None, Presence::Present),
        ]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "     3) 2023-11-14 22:13:20 key: blocks/1.car  size: 2048 [NOT_IN_2]"
        );
        assert_eq!(
            lines[1],
            "     4) 2023-11-14 22:13:20 key: blocks/1.car [NOT_IN_2] [COPIED]"
        );
        assert_eq!(lines[2], "1234567) 2023-11-14 22:13:20 key: blocks/1.car");
    }

    #[test]
    fn test_should_render_summary_states() {
        let summary = |status, total_size| {
            ReportEvent::Summary(Summary {
                total_size,
                missing: 0,
                copied: 0,
                secondary_bucket: Some("backup".into()),
                status,
            })
        };

        assert_eq!(
            render(vec![summary(FinalStatus::AllPresent, Some(1_500))]),
            "\nTotal size of listed objects: 1.5 KB (1500)\nAll checked objects exist in bucket 'backup'\n"
        );
        assert_eq!(
            render(vec![summary(FinalStatus::Missing { missing: 3 }, None)]),
            "Missing 3 objects in bucket 'backup'\n"
        );
        assert_eq!(
            render(vec![summary(FinalStatus::Copied { copied: 3, missing: 3 }, None)]),
            "Copied 3 objects to bucket 'backup'\n"
        );
        assert_eq!(
            render(vec![summary(FinalStatus::Copied { copied: 2, missing: 3 }, None)]),
            "Copied 2 of 3 missing objects to bucket 'backup'\n"
        );
        assert_eq!(render(vec![summary(FinalStatus::Unchecked, None)]), "");
    }

    #[test]
    fn test_should_render_warnings_and_issues() {
        let out = render(vec![
            ReportEvent::Degraded {
                bucket: "backup".into(),
                reason: "connection refused".into(),
            },
            ReportEvent::Issue {
                index: 2,
                message: "copy of a to backup failed".into(),
            },
        ]);
        assert_eq!(
            out,
            "WARNING: Cannot connect to secondary bucket: connection refused\nERROR copy of a to backup failed\n"
        );
    }

    #[test]
    fn test_should_keep_first_write_error() {
        #[derive(Debug)]
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut console = ConsoleReporter::new(Broken);
        console.header("Mainnet");
        console.end_section();
        let err = console.finish().unwrap_err();
        assert_eq!(err.to_string(), "closed");
    }
}
