// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pattern-based code detection engine.
//!
//! Pure scoring over file content: regex pattern hits count double,
//! keyword hits count once, small bonuses for indentation and brackets.
//! Binary files short-circuit to `keep` before any scoring.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::warn;

use sweep_wire::{Decision, FileFinding};

use crate::rules::{LanguageRules, RULES};

/// Bytes of content considered for scoring.
const CONTENT_SAMPLE: usize = 50_000;
/// Bytes sampled for the binary check.
const BINARY_SAMPLE: usize = 8_192;
/// Score that maps to full confidence.
const FULL_CONFIDENCE_SCORE: f64 = 30.0;

struct CompiledRules {
    language: &'static str,
    patterns: Vec<(Regex, &'static str)>,
    keywords: Vec<Regex>,
    extensions: &'static [&'static str],
}

/// Compiled rule set, built once per agent.
pub struct Detector {
    rules: Vec<CompiledRules>,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector {
    pub fn new() -> Self {
        let rules = RULES.iter().map(compile_rules).collect();
        Self { rules }
    }

    /// Analyze one file into a finding. Never fails: unreadable or
    /// unparseable files come back as `keep` with the error in `reason`.
    pub fn analyze(&self, path: &Path) -> FileFinding {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());

        let (size, modified_time) = match std::fs::metadata(path) {
            Ok(meta) => (meta.len(), modified_iso(&meta)),
            Err(e) => {
                return error_finding(path, &filename, format!("Error reading file: {e}"));
            }
        };
        let file_hash = sha256_file(path).unwrap_or_default();

        if is_binary(path) {
            return FileFinding {
                filepath: path.display().to_string(),
                filename,
                size,
                modified_time,
                decision: Decision::Keep,
                confidence: 1.0,
                language: "none".to_string(),
                method: "binary-filter".to_string(),
                reason: "Binary file, not code".to_string(),
                file_hash,
            };
        }

        let content = match read_sample(path, CONTENT_SAMPLE) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                return FileFinding {
                    filepath: path.display().to_string(),
                    filename,
                    size,
                    modified_time,
                    decision: Decision::Keep,
                    confidence: 0.5,
                    language: "none".to_string(),
                    method: "error".to_string(),
                    reason: format!("Error reading file: {e}"),
                    file_hash,
                };
            }
        };

        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        let extension_lang = self
            .rules
            .iter()
            .find(|rules| rules.extensions.contains(&extension.as_str()))
            .map(|rules| rules.language);

        let (language, score, matches) = self.best_language(&content);
        let mut confidence = (score as f64 / FULL_CONFIDENCE_SCORE).min(1.0);
        if extension_lang == Some(language) {
            confidence = (confidence * 1.3).min(1.0);
        }

        let (decision, reason) = if confidence > 0.75 {
            (
                Decision::Delete,
                format!("High confidence {language} code: {}", matches.join(", ")),
            )
        } else if confidence < 0.25 {
            (
                Decision::Keep,
                format!("Low confidence, no significant code patterns (score: {score})"),
            )
        } else {
            (
                Decision::Ambiguous,
                format!("Medium confidence {language} code (score: {score}), needs manual verification"),
            )
        };

        FileFinding {
            filepath: path.display().to_string(),
            filename,
            size,
            modified_time,
            decision,
            confidence,
            language: language.to_string(),
            method: "pattern-based".to_string(),
            reason,
            file_hash,
        }
    }

    /// Score all languages and pick the best, with the top pattern
    /// descriptions for the reason text.
    fn best_language(&self, content: &str) -> (&'static str, usize, Vec<String>) {
        let mut best: (&'static str, usize, Vec<String>) = ("none", 0, Vec::new());

        for rules in &self.rules {
            let mut score = 0usize;
            let mut matches = Vec::new();

            for (pattern, description) in &rules.patterns {
                let count = pattern.find_iter(content).count();
                if count > 0 {
                    score += count * 2;
                    matches.push(format!("{description} ({count}x)"));
                }
            }
            for keyword in &rules.keywords {
                score += keyword.find_iter(content).count();
            }

            if score > best.1 {
                matches.truncate(3);
                best = (rules.language, score, matches);
            }
        }

        if best.1 == 0 {
            return ("none", 0, Vec::new());
        }

        // Structure bonuses apply to the winning language only; they are
        // not language-specific evidence.
        let mut score = best.1;
        if indented_code(content) {
            score += 3;
        }
        if content.contains(['{', '}', '[', ']', '(', ')']) {
            score += 2;
        }
        (best.0, score, best.2)
    }
}

fn compile_rules(rules: &LanguageRules) -> CompiledRules {
    let patterns = rules
        .patterns
        .iter()
        .filter_map(|(pattern, description)| match Regex::new(pattern) {
            Ok(regex) => Some((regex, *description)),
            Err(e) => {
                warn!(language = rules.language, pattern = *pattern, error = %e, "invalid detection pattern");
                None
            }
        })
        .collect();
    let keywords = rules
        .keywords
        .iter()
        .filter_map(|keyword| Regex::new(&format!(r"\b{}\b", regex::escape(keyword))).ok())
        .collect();
    CompiledRules { language: rules.language, patterns, keywords, extensions: rules.extensions }
}

fn indented_code(content: &str) -> bool {
    content.lines().any(|line| {
        let trimmed = line.trim_start_matches([' ', '\t']);
        trimmed.len() < line.len() && trimmed.chars().next().is_some_and(|c| c.is_alphanumeric())
    })
}

fn modified_iso(meta: &std::fs::Metadata) -> String {
    meta.modified()
        .map(|time| DateTime::<Utc>::from(time).to_rfc3339())
        .unwrap_or_default()
}

fn error_finding(path: &Path, filename: &str, reason: String) -> FileFinding {
    FileFinding {
        filepath: path.display().to_string(),
        filename: filename.to_string(),
        size: 0,
        modified_time: String::new(),
        decision: Decision::Keep,
        confidence: 0.0,
        language: "none".to_string(),
        method: "error".to_string(),
        reason,
        file_hash: String::new(),
    }
}

/// SHA-256 of a file's full contents, lowercase hex.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Binary heuristic: a null byte, or more than 30% non-text bytes, in
/// the first 8 KiB. Unreadable files count as binary.
pub fn is_binary(path: &Path) -> bool {
    let chunk = match read_sample(path, BINARY_SAMPLE) {
        Ok(chunk) => chunk,
        Err(_) => return true,
    };
    if chunk.is_empty() {
        return false;
    }
    if chunk.contains(&0) {
        return true;
    }
    let non_text = chunk.iter().filter(|&&byte| !is_text_byte(byte)).count();
    non_text as f64 / chunk.len() as f64 > 0.3
}

fn is_text_byte(byte: u8) -> bool {
    matches!(byte, 7 | 8 | 9 | 10 | 12 | 13 | 27) || (0x20..=0xff).contains(&byte) && byte != 0x7f
}

pub(crate) fn read_sample(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; limit];
    let mut filled = 0;
    loop {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
        if filled == buf.len() {
            break;
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
