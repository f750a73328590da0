//! Human-readable rendering of a run summary.

use colored::*;
use std::fmt::Write;

use super::summary::{Counters, RunSummary};

/// Render the end-of-run report.
pub fn render(summary: &RunSummary) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    let _ = writeln!(out, "{}", rule);
    let title = format!("{} summary", summary.family);
    if summary.cancelled {
        let _ = writeln!(out, "{} {}", title.bold(), "(cancelled)".yellow());
    } else {
        let _ = writeln!(out, "{}", title.bold());
    }
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{}", counters_line(&summary.totals));

    for level in &summary.levels {
        let _ = writeln!(out, "\nby {}:", level.level);
        write_entries(&mut out, level.entries.iter());
    }

    if !summary.branches.is_empty() {
        let header: Vec<&str> = summary.levels.iter().map(|l| l.level.as_str()).collect();
        let _ = writeln!(out, "\nby {}:", header.join("/"));
        write_entries(&mut out, summary.branches.iter());
    }

    if !summary.failures.is_empty() {
        let _ = writeln!(out, "\n{}", "failures:".red().bold());
        for failure in &summary.failures {
            let _ = writeln!(out, "  {}: {}", failure.unit, failure.detail);
        }
    }
    let _ = writeln!(out, "{}", rule);
    out
}

fn write_entries<'a>(out: &mut String, entries: impl Iterator<Item = (&'a String, &'a Counters)>) {
    let entries: Vec<_> = entries.collect();
    let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, counters) in entries {
        let _ = writeln!(out, "  {:width$}  {}", key, counters_line(counters), width = width);
    }
}

fn counters_line(c: &Counters) -> String {
    let failed = format!("failed {}", c.failed);
    let failed = if c.failed > 0 { failed.red() } else { failed.green() };
    format!(
        "discovered {}  attempted {}  succeeded {}  {}",
        c.discovered, c.attempted, c.succeeded, failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::OutcomeAggregator;
    use crate::domain::{JobFamily, SubmissionResult, TaxonomyPath, WorkUnit};

    #[test]
    fn test_render_includes_breakdowns_and_failures() {
        let agg = OutcomeAggregator::new(JobFamily::NerClean);
        let ok = WorkUnit::new(TaxonomyPath::parse(["nltk", "title", "a"]).unwrap(), "/in/a.json");
        let bad = WorkUnit::new(TaxonomyPath::parse(["spacy", "text", "b"]).unwrap(), "/in/b.json");
        agg.record_discovered(&ok);
        agg.record_discovered(&bad);
        agg.record(&ok, &SubmissionResult::Completed { exit_code: 0 });
        agg.record(
            &bad,
            &SubmissionResult::Failed {
                exit_code: Some(2),
                detail: "exited with status 2".into(),
            },
        );

        let text = render(&agg.report());
        assert!(text.contains("ner-clean summary"));
        assert!(text.contains("discovered 2  attempted 2  succeeded 1"));
        assert!(text.contains("by method:"));
        assert!(text.contains("by field:"));
        assert!(text.contains("by method/field:"));
        assert!(text.contains("spacy/text"));
        assert!(text.contains("failed 1"));
        assert!(text.contains("spacy/text/b: failed (exit 2): exited with status 2"));
    }

    #[test]
    fn test_render_flat_family_has_no_breakdown() {
        let agg = OutcomeAggregator::new(JobFamily::Scrape);
        let text = render(&agg.report());
        assert!(text.contains("scrape summary"));
        assert!(!text.contains("by "));
        assert!(!text.contains("failures:"));
    }

    #[test]
    fn test_render_marks_cancelled() {
        let agg = OutcomeAggregator::new(JobFamily::Scrape);
        agg.mark_cancelled();
        assert!(render(&agg.report()).contains("(cancelled)"));
    }
}
