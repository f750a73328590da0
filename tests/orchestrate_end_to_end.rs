//! End-to-end runs over temporary directory taxonomies.
//!
//! The synchronous family runs `sh -c` stand-ins for the cleaning program;
//! the scheduler families go through the in-memory mock scheduler.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use orchestrate::builder::RunSettings;
use orchestrate::config::Config;
use orchestrate::discovery::DiscoveryFilter;
use orchestrate::domain::{Field, JobDescriptor, JobFamily, SubmissionResult};
use orchestrate::runner::{CancelToken, Orchestrator};
use orchestrate::scheduler::{MockScheduler, SubmitThrottle};
use orchestrate::submit::{LocalRunner, SchedulerSubmitter, Submitter};

/// Exits 2 for every spacy/text unit. Positional args after `$0` are
/// `-f <item> -m <method> -fd <field> ...`.
const FAIL_SPACY_TEXT: &str = r#"[ "$4" = spacy ] && [ "$6" = text ] && exit 2; echo "cleaned $2"; exit 0"#;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "[]").unwrap();
}

fn clean_tree(dir: &TempDir) {
    for method in ["spacy", "nltk"] {
        for field in ["title", "text"] {
            for item in ["a", "b"] {
                touch(&dir.path().join("raw").join(method).join(field).join(format!("{}.json", item)));
            }
        }
    }
}

fn clean_settings(dir: &TempDir, script: &str) -> RunSettings {
    RunSettings::from_config(&Config::default(), JobFamily::NerClean)
        .with_program(vec!["sh".into(), "-c".into(), script.into(), "fake_clean".into()])
        .with_input_root(dir.path().join("raw"))
        .with_output_root(dir.path().join("cleaned"))
        .with_logs_dir(dir.path().join("logs"))
        .with_account("immigration-lab")
}

fn scheduler_settings(family: JobFamily, dir: &TempDir) -> RunSettings {
    RunSettings::from_config(&Config::default(), family)
        .with_input_root(dir.path().join("articles"))
        .with_output_root(dir.path().join("ner"))
        .with_scraper_config(dir.path().join("herald.yml"))
        .with_logs_dir(dir.path().join("logs"))
        .with_account("immigration-lab")
}

#[tokio::test]
async fn test_clean_run_counts_failures_per_level() {
    let dir = TempDir::new().unwrap();
    clean_tree(&dir);

    let summary = Orchestrator::new(JobFamily::NerClean, clean_settings(&dir, FAIL_SPACY_TEXT))
        .run(&LocalRunner::new())
        .await
        .unwrap();

    assert_eq!(summary.totals.discovered, 8);
    assert_eq!(summary.totals.attempted, 8);
    assert_eq!(summary.totals.succeeded, 6);
    assert_eq!(summary.totals.failed, 2);
    assert!(!summary.cancelled);

    assert_eq!(summary.counters("method", "spacy").unwrap().failed, 2);
    assert_eq!(summary.counters("method", "nltk").unwrap().failed, 0);
    assert_eq!(summary.counters("field", "text").unwrap().failed, 2);
    assert_eq!(summary.counters("field", "title").unwrap().failed, 0);
    assert_eq!(summary.branch("spacy/text").unwrap().failed, 2);
    assert_eq!(summary.branch("nltk/text").unwrap().succeeded, 2);

    let failed: Vec<&str> = summary.failures.iter().map(|f| f.unit.as_str()).collect();
    assert_eq!(failed, vec!["spacy/text/a.json", "spacy/text/b.json"]);
    assert!(summary.failures[0].detail.contains("exit 2"));

    // One log pair per unit in the flat logs directory.
    let logs = dir.path().join("logs");
    assert_eq!(fs::read_dir(&logs).unwrap().count(), 16);
    let out = fs::read_to_string(logs.join("clean_nltk_title_a.out")).unwrap();
    assert_eq!(out.trim(), "cleaned a.json");
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn test_clean_method_filter() {
    let dir = TempDir::new().unwrap();
    clean_tree(&dir);

    let summary = Orchestrator::new(JobFamily::NerClean, clean_settings(&dir, "exit 0"))
        .with_filter(DiscoveryFilter::new().with_level(0, "nltk"))
        .run(&LocalRunner::new())
        .await
        .unwrap();

    assert_eq!(summary.totals.discovered, 4);
    assert_eq!(summary.totals.succeeded, 4);
    assert!(summary.counters("method", "spacy").is_none());
}

/// Completes every unit and cancels the run from inside the third call.
struct CancelAfter {
    calls: AtomicUsize,
    after: usize,
    token: CancelToken,
}

#[async_trait]
impl Submitter for CancelAfter {
    async fn submit(&self, _descriptor: JobDescriptor) -> SubmissionResult {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.after {
            self.token.cancel();
        }
        SubmissionResult::Completed { exit_code: 0 }
    }

    fn description(&self) -> &str {
        "cancel-after"
    }
}

#[tokio::test]
async fn test_cancellation_keeps_partial_summary() {
    let dir = TempDir::new().unwrap();
    clean_tree(&dir);
    let token = CancelToken::new();
    let submitter = CancelAfter {
        calls: AtomicUsize::new(0),
        after: 3,
        token: token.clone(),
    };

    let summary = Orchestrator::new(JobFamily::NerClean, clean_settings(&dir, "exit 0"))
        .with_cancel_token(token)
        .run(&submitter)
        .await
        .unwrap();

    assert_eq!(summary.totals.discovered, 8);
    assert_eq!(summary.totals.attempted, 3);
    assert_eq!(summary.totals.succeeded, 3);
    assert!(summary.cancelled);
    assert!(summary.totals.is_consistent());
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn test_ner_analyze_submits_in_order() {
    let dir = TempDir::new().unwrap();
    for item in ["tribune", "herald", "courier"] {
        touch(&dir.path().join("articles").join(format!("{}.json", item)));
    }
    let scheduler = Arc::new(MockScheduler::new());
    let submitter = SchedulerSubmitter::new(scheduler.clone()).with_throttle(SubmitThrottle::disabled());
    let since = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

    let settings = scheduler_settings(JobFamily::NerAnalyze, &dir)
        .with_field(Field::Text)
        .with_since(since)
        .with_since_flag("--since");
    let summary = Orchestrator::new(JobFamily::NerAnalyze, settings)
        .run(&submitter)
        .await
        .unwrap();

    assert_eq!(summary.totals.succeeded, 3);
    assert!(summary.is_clean());

    let submitted = scheduler.submitted();
    let names: Vec<&str> = submitted.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["ner_text_courier", "ner_text_herald", "ner_text_tribune"]);

    let first = &submitted[0];
    let command = &first.command[2..];
    assert_eq!(command, &["courier.json", "--field", "text", "--since", "2024-03-01"]);
    assert_eq!(first.resources.time_limit(), "02:00:00");
    assert_eq!(first.stdout_path, dir.path().join("logs").join("ner_text_courier.out"));
}

#[tokio::test]
async fn test_scrape_rejections_do_not_stop_the_batch() {
    let dir = TempDir::new().unwrap();
    for i in 0..5 {
        touch(&dir.path().join("articles").join(format!("links_{}.json", i)));
    }
    let scheduler = Arc::new(MockScheduler::rejecting(|d| {
        (d.name == "scrape_links_1" || d.name == "scrape_links_3").then(|| "QOSMaxSubmitJobPerUserLimit".to_string())
    }));
    let submitter = SchedulerSubmitter::new(scheduler.clone()).with_throttle(SubmitThrottle::disabled());

    let summary = Orchestrator::new(JobFamily::Scrape, scheduler_settings(JobFamily::Scrape, &dir))
        .with_workers(2)
        .run(&submitter)
        .await
        .unwrap();

    assert_eq!(summary.totals.attempted, 5);
    assert_eq!(summary.totals.succeeded, 3);
    assert_eq!(summary.totals.failed, 2);
    let mut failed: Vec<&str> = summary.failures.iter().map(|f| f.unit.as_str()).collect();
    failed.sort();
    assert_eq!(failed, vec!["links_1.json", "links_3.json"]);
    assert!(summary.failures[0].detail.contains("QOSMaxSubmitJobPerUserLimit"));

    let first = &scheduler.submitted()[0];
    let output = dir.path().join("ner").join(first.name.trim_start_matches("scrape_").to_string() + ".json");
    assert!(first.command.contains(&"-c".to_string()));
    assert!(first.command.contains(&output.to_string_lossy().into_owned()));
}

#[test]
fn test_dry_run_plan_has_no_side_effects() {
    let dir = TempDir::new().unwrap();
    clean_tree(&dir);

    let plan = Orchestrator::new(JobFamily::NerClean, clean_settings(&dir, "exit 0"))
        .plan()
        .unwrap();
    assert_eq!(plan.len(), 8);
    assert_eq!(plan.jobs()[0].descriptor.name, "clean_nltk_text_a");

    let summary = plan.summary();
    assert_eq!(summary.totals.discovered, 8);
    assert_eq!(summary.totals.attempted, 0);
    assert!(!dir.path().join("logs").exists());
    assert!(!dir.path().join("cleaned").exists());
}

#[tokio::test]
async fn test_summary_json_round_trip_fields() {
    let dir = TempDir::new().unwrap();
    clean_tree(&dir);
    let summary = Orchestrator::new(JobFamily::NerClean, clean_settings(&dir, FAIL_SPACY_TEXT))
        .run(&LocalRunner::new())
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
    assert_eq!(value["family"], "ner-clean");
    assert_eq!(value["totals"]["failed"], 2);
    assert_eq!(value["branches"]["spacy/text"]["failed"], 2);
    assert_eq!(value["cancelled"], false);
}
