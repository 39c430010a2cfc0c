// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

const PYTHON_SOURCE: &str = r#"
import os
from pathlib import Path

class Walker:
    def __init__(self, root):
        self.root = root

    def walk(self):
        for entry in os.listdir(self.root):
            print(entry)

if __name__ == "__main__":
    Walker(".").walk()
"#;

struct Fixture {
    agent: Agent,
    scan_dir: std::path::PathBuf,
    _dirs: (tempfile::TempDir, tempfile::TempDir),
}

fn fixture() -> Fixture {
    let scan = tempdir().unwrap();
    let quarantine = tempdir().unwrap();
    let config = AgentConfig {
        master_ip: "127.0.0.1".into(),
        master_port: 5000,
        client_id: "test-agent".into(),
        scan_dirs: vec![scan.path().to_path_buf()],
        quarantine_dir: quarantine.path().join("q"),
        log_dir: quarantine.path().join("logs"),
        heartbeat_interval: Duration::from_secs(30),
        reconnect_delay: Duration::from_secs(10),
    };
    let agent = Agent::new(config).unwrap();
    Fixture { agent, scan_dir: scan.path().to_path_buf(), _dirs: (scan, quarantine) }
}

fn targets(langs: &[&str]) -> Vec<String> {
    langs.iter().map(|l| l.to_string()).collect()
}

#[test]
fn scan_quarantines_target_language_findings() {
    let fixture = fixture();
    let src = fixture.scan_dir.join("walker.py");
    std::fs::write(&src, PYTHON_SOURCE).unwrap();

    let findings = fixture.agent.collect_findings(&targets(&["python"]), None, None);

    assert_eq!(findings.len(), 1);
    assert!(!src.exists(), "matched file must be moved to quarantine");
    let quarantined = Path::new(&findings[0].filepath);
    assert!(quarantined.starts_with(fixture.agent.quarantine.root()));
    assert!(quarantined.exists());
    assert_eq!(findings[0].language, "python");
    assert_eq!(findings[0].decision, Decision::Delete);
}

#[test]
fn scan_leaves_non_target_languages_alone() {
    let fixture = fixture();
    let src = fixture.scan_dir.join("walker.py");
    std::fs::write(&src, PYTHON_SOURCE).unwrap();

    let findings = fixture.agent.collect_findings(&targets(&["java"]), None, None);

    assert!(findings.is_empty());
    assert!(src.exists(), "non-target files must stay put");
}

#[test]
fn scan_skips_plain_documents() {
    let fixture = fixture();
    let src = fixture.scan_dir.join("notes.txt");
    std::fs::write(&src, "Meeting notes about the quarterly roadmap.\n").unwrap();

    let findings = fixture.agent.collect_findings(&targets(&["python"]), None, None);

    assert!(findings.is_empty());
    assert!(src.exists());
}

#[test]
fn custom_extension_rule_quarantines_matches() {
    let fixture = fixture();
    std::fs::write(fixture.scan_dir.join("data.csv"), "a,b,c\n").unwrap();
    std::fs::write(fixture.scan_dir.join("keep.txt"), "hello\n").unwrap();

    let rule = CustomRule { extension: Some(".csv".into()), ..CustomRule::default() };
    let findings = fixture.agent.collect_findings(&[], None, Some(&rule));

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].language, "custom");
    assert_eq!(findings[0].method, "custom-filter");
    assert_eq!(findings[0].confidence, 0.90);
    assert!(!findings[0].file_hash.is_empty());
    assert!(fixture.scan_dir.join("keep.txt").exists());
}

#[test]
fn custom_keyword_rule_matches_content() {
    let fixture = fixture();
    std::fs::write(fixture.scan_dir.join("config.ini"), "api_secret = hunter2\n").unwrap();
    std::fs::write(fixture.scan_dir.join("clean.ini"), "color = blue\n").unwrap();

    let rule = CustomRule { keywords: Some("password, api_secret".into()), ..CustomRule::default() };
    let findings = fixture.agent.collect_findings(&[], None, Some(&rule));

    assert_eq!(findings.len(), 1);
    assert!(findings[0].filepath.ends_with("config.ini"));
}

#[test]
fn custom_regex_rule_matches_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("token.txt");
    std::fs::write(&path, "key=AKIA1234567890\n").unwrap();

    let rule = CustomRule { pattern: Some(r"AKIA\d+".into()), ..CustomRule::default() };
    assert!(matches_custom(&path, &rule));

    let bad = CustomRule { pattern: Some("[unclosed".into()), ..CustomRule::default() };
    assert!(!matches_custom(&path, &bad), "invalid patterns must not match");
}

#[test]
fn custom_name_rule_matches_filename_fragment() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("My-Report-FINAL.docx");
    std::fs::write(&path, "x").unwrap();

    let rule = CustomRule { name: Some("report".into()), ..CustomRule::default() };
    assert!(matches_custom(&path, &rule));

    let miss = CustomRule { name: Some("invoice".into()), ..CustomRule::default() };
    assert!(!matches_custom(&path, &miss));
}

#[test]
fn deletion_by_hash_is_idempotent() {
    let fixture = fixture();
    let src = fixture.scan_dir.join("x.py");
    std::fs::write(&src, "print('x')\n").unwrap();
    let quarantined = fixture.agent.quarantine.quarantine_file(&src).unwrap();
    let hash = sha256_file(&quarantined).unwrap();

    let entries = vec![ApprovedEntry {
        file_hash: hash.clone(),
        path: String::new(),
        record_id: String::new(),
    }];

    let reports = fixture.agent.perform_deletions(&entries);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, ReportStatus::Deleted);
    assert_eq!(reports[0].details, "deleted by hash");
    assert!(!quarantined.exists());

    // Re-delivered command: the file is gone, terminal failure
    let reports = fixture.agent.perform_deletions(&entries);
    assert_eq!(reports[0].status, ReportStatus::Failed);
    assert_eq!(reports[0].details, "file not found in quarantine");
    assert_eq!(reports[0].file_hash, hash);
}

#[test]
fn deletion_falls_back_to_hint_path() {
    let fixture = fixture();
    let src = fixture.scan_dir.join("x.py");
    std::fs::write(&src, "print('x')\n").unwrap();
    let quarantined = fixture.agent.quarantine.quarantine_file(&src).unwrap();

    let entries = vec![ApprovedEntry {
        file_hash: "no-such-hash".into(),
        path: quarantined.display().to_string(),
        record_id: String::new(),
    }];

    let reports = fixture.agent.perform_deletions(&entries);
    assert_eq!(reports[0].status, ReportStatus::Deleted);
    assert_eq!(reports[0].details, "deleted by path fallback");
    assert!(!quarantined.exists());
}

#[test]
fn deletion_report_keeps_hint_path_when_nothing_found() {
    let fixture = fixture();

    let entries = vec![ApprovedEntry {
        file_hash: String::new(),
        path: "/nowhere/x.py".into(),
        record_id: String::new(),
    }];

    let reports = fixture.agent.perform_deletions(&entries);
    assert_eq!(reports[0].status, ReportStatus::Failed);
    assert_eq!(reports[0].details, "file not found in quarantine");
    assert_eq!(reports[0].path, "/nowhere/x.py");
}
