// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;
use tempfile::tempdir;
use yare::parameterized;

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

const JAVA_SOURCE: &str = r#"
package com.example.app;

import java.util.List;

public class Main {
    public static void main(String[] args) {
        System.out.println("hello");
    }

    private int count(List<String> items) {
        return items.size();
    }
}
"#;

const C_SOURCE: &str = r#"
#include <stdio.h>
#include <stdlib.h>

#define MAX 128

struct point { int x; int y; };

int main(int argc, char **argv) {
    char *buf = malloc(MAX);
    printf("%d\n", argc);
    free(buf);
    return 0;
}
"#;

const PLAIN_TEXT: &str = "Meeting notes\n\nDiscussed the quarterly roadmap and hiring plan.\nNext sync on Friday.\n";

fn write_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content).unwrap();
    path
}

#[parameterized(
    python = { "walker.py", PYTHON_SOURCE, "python" },
    java = { "Main.java", JAVA_SOURCE, "java" },
    c = { "main.c", C_SOURCE, "c" },
)]
fn code_files_are_flagged_delete(name: &str, source: &str, language: &str) {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, name, source.as_bytes());

    let finding = Detector::new().analyze(&path);

    assert_eq!(finding.language, language);
    assert_eq!(finding.decision, Decision::Delete, "reason: {}", finding.reason);
    assert!(finding.confidence > 0.75);
    assert_eq!(finding.method, "pattern-based");
    assert!(!finding.file_hash.is_empty());
}

#[test]
fn plain_text_is_kept() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "notes.txt", PLAIN_TEXT.as_bytes());

    let finding = Detector::new().analyze(&path);

    assert_eq!(finding.decision, Decision::Keep, "reason: {}", finding.reason);
    assert!(finding.confidence < 0.25);
}

#[test]
fn binary_files_short_circuit_to_keep() {
    let dir = tempdir().unwrap();
    let mut content = vec![0u8; 64];
    content.extend_from_slice(b"def main():");
    let path = write_file(&dir, "blob.bin", &content);

    let finding = Detector::new().analyze(&path);

    assert_eq!(finding.decision, Decision::Keep);
    assert_eq!(finding.language, "none");
    assert_eq!(finding.method, "binary-filter");
    assert_eq!(finding.confidence, 1.0);
}

#[test]
fn high_bit_noise_counts_as_binary() {
    // >30% of bytes outside the text set (control chars below 0x20)
    let mut content = Vec::new();
    for _ in 0..100 {
        content.extend_from_slice(&[0x01, 0x02, b'a']);
    }
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "noise.dat", &content);

    assert!(is_binary(&path));
}

#[test]
fn matching_extension_boosts_confidence() {
    // Sparse python content: enough to score, not enough for full marks
    let source = "import os\nprint(os.name)\n";
    let dir = tempdir().unwrap();
    let with_ext = write_file(&dir, "script.py", source.as_bytes());
    let without_ext = write_file(&dir, "script.txt", source.as_bytes());

    let detector = Detector::new();
    let boosted = detector.analyze(&with_ext);
    let plain = detector.analyze(&without_ext);

    assert_eq!(boosted.language, "python");
    assert!(
        boosted.confidence > plain.confidence,
        "{} should exceed {}",
        boosted.confidence,
        plain.confidence
    );
}

#[test]
fn missing_file_yields_error_finding() {
    let finding = Detector::new().analyze(std::path::Path::new("/nonexistent/x.py"));

    assert_eq!(finding.decision, Decision::Keep);
    assert_eq!(finding.method, "error");
    assert_eq!(finding.confidence, 0.0);
    assert!(finding.file_hash.is_empty());
}

#[test]
fn sha256_file_matches_known_digest() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "x.txt", b"abc");

    let hash = sha256_file(&path).unwrap();
    assert_eq!(hash, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
}

#[test]
fn empty_file_is_not_binary() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "empty", b"");

    assert!(!is_binary(&path));
}
