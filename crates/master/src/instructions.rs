// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns admin intent into structured scan tasks.

use sweep_core::{is_supported, new_task_id, time_fmt};
use sweep_wire::{DateFilter, Message};

/// Errors from building a scan instruction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InstructionError {
    #[error("At least one target language must be specified")]
    NoLanguages,

    #[error("Unsupported languages: {0:?}")]
    Unsupported(Vec<String>),
}

/// Build a standard scan task for validated target languages.
pub fn create_scan_instruction(
    target_languages: &[String],
    date_filter: Option<DateFilter>,
) -> Result<Message, InstructionError> {
    if target_languages.is_empty() {
        return Err(InstructionError::NoLanguages);
    }
    let invalid: Vec<String> =
        target_languages.iter().filter(|l| !is_supported(l)).cloned().collect();
    if !invalid.is_empty() {
        return Err(InstructionError::Unsupported(invalid));
    }

    Ok(Message::ScanTask {
        task_id: new_task_id(),
        target_languages: target_languages.to_vec(),
        date_filter,
        custom: None,
        created_at: Some(time_fmt::now_iso()),
    })
}

/// Infer target languages from free-text admin instructions.
///
/// Deliberately conservative keyword matching; defaults to python when
/// nothing matches so a vague instruction still produces a useful scan.
pub fn infer_languages(instruction: &str) -> Vec<String> {
    let text = instruction.to_lowercase();
    let padded = format!(" {text} ");

    let mapping: &[(&str, &[&str])] = &[
        ("python", &["python", ".py"]),
        ("matlab", &["matlab", ".m "]),
        ("java", &["java"]),
        ("cpp", &["c++", "cpp", ".cpp", ".cc"]),
        ("c", &[" c ", " c-language ", ".c "]),
    ];

    let mut inferred = Vec::new();
    for (lang, hints) in mapping {
        if hints.iter().any(|hint| padded.contains(hint)) {
            inferred.push(lang.to_string());
        }
    }

    if inferred.is_empty() {
        inferred.push("python".to_string());
    }
    inferred
}

#[cfg(test)]
#[path = "instructions_tests.rs"]
mod tests;
