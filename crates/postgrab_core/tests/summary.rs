use std::path::Path;

use postgrab_core::{DownloadTarget, ItemOutcome, RunSummary, Shortcode};
use pretty_assertions::assert_eq;

#[test]
fn counts_track_every_recorded_item() {
    let mut summary = RunSummary::new();
    summary.record_success("AAA111");
    summary.record_failure("BBB222", "post not found");
    summary.record_success("CCC333");

    assert_eq!(summary.attempted(), 3);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.interrupted());
    assert_eq!(summary.labels(), vec!["AAA111", "BBB222", "CCC333"]);
    assert_eq!(
        summary.entries()[1].outcome,
        ItemOutcome::Failure {
            reason: "post not found".to_string()
        }
    );
}

#[test]
fn summary_serializes_with_status_tags() {
    let mut summary = RunSummary::new();
    summary.record_success("AAA111");
    summary.record_failure("BBB222", "boom");
    summary.mark_interrupted();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "attempted": 2,
            "succeeded": 1,
            "failed": 1,
            "interrupted": true,
            "entries": [
                {"label": "AAA111", "status": "success"},
                {"label": "BBB222", "status": "failure", "reason": "boom"}
            ]
        })
    );
}

#[test]
fn download_target_is_named_after_shortcode() {
    let code = Shortcode::parse("XyZ_123").unwrap();
    let target = DownloadTarget::for_shortcode(Path::new("."), &code);

    assert_eq!(target.dir(), Path::new("./XyZ_123"));
    assert_eq!(target.filename_base(), "XyZ_123");
}
