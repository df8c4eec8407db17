// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Turns free-form model replies into typed sections and code proposals.
//!
//! Both functions are best effort and never fail: a reply that ignores the
//! requested format produces empty sections or no proposal.

use rl_domain_types::{AnalysisSections, CodeChangeProposal};

const CODE_START: &str = "CODE_START";
const CODE_END: &str = "CODE_END";

/// Whether `line` opens with a label: one or more ASCII word characters
/// followed directly by a colon.
fn starts_with_label(line: &str) -> bool {
    let word_len = line
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    word_len > 0 && line.as_bytes().get(word_len) == Some(&b':')
}

/// Split into segments at every line break followed by a label line
fn labelled_segments(raw: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for line in raw.split('\n') {
        match segments.last_mut() {
            Some(current) if !starts_with_label(line) => {
                current.push('\n');
                current.push_str(line);
            }
            _ => segments.push(line.to_string()),
        }
    }
    segments
}

fn section(segments: &[String], label: &str) -> String {
    segments
        .iter()
        .find_map(|segment| segment.strip_prefix(label))
        .map(|body| body.trim().to_string())
        .unwrap_or_default()
}

pub fn parse_analysis(raw: &str) -> AnalysisSections {
    let segments = labelled_segments(raw);
    AnalysisSections {
        overview: section(&segments, "OVERVIEW:"),
        analysis: section(&segments, "ANALYSIS:"),
        changes: section(&segments, "CHANGES:"),
        risks: section(&segments, "RISKS:"),
    }
}

/// Byte offset and length of the first `CODE_START` line, including its line
/// break. Mentions of the marker inside prose do not count.
fn opening_marker(raw: &str) -> Option<(usize, usize)> {
    raw.match_indices(CODE_START).find_map(|(at, _)| {
        let line_start = at == 0 || raw.as_bytes()[at - 1] == b'\n';
        let rest = &raw[at + CODE_START.len()..];
        let newline = if rest.starts_with("\r\n") {
            2
        } else if rest.starts_with('\n') {
            1
        } else {
            return None;
        };
        line_start.then_some((at, CODE_START.len() + newline))
    })
}

/// Extract the first `CODE_START` ... `CODE_END` block.
///
/// Both markers must sit on their own lines. The line breaks next to the
/// markers belong to the markers, not the code. A block with no code in it
/// is not a proposal.
pub fn extract_code_change(raw: &str) -> Option<CodeChangeProposal> {
    let (start, marker_len) = opening_marker(raw)?;
    let body = &raw[start + marker_len..];
    let end = body.find(&format!("\n{CODE_END}"))?;

    let content = &body[..end];
    let content = content.strip_suffix('\r').unwrap_or(content);
    if content.trim().is_empty() {
        return None;
    }

    Some(CodeChangeProposal {
        content: content.to_string(),
        description: raw[..start].trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_four_sections() {
        let raw = "OVERVIEW: A CLI.\nANALYSIS: Fine.\nCHANGES: None.\nRISKS: Low.";
        assert_eq!(
            parse_analysis(raw),
            AnalysisSections {
                overview: "A CLI.".into(),
                analysis: "Fine.".into(),
                changes: "None.".into(),
                risks: "Low.".into(),
            }
        );
    }

    #[test]
    fn missing_sections_are_empty() {
        let sections = parse_analysis("OVERVIEW: x\nRISKS: y");
        assert_eq!(sections.overview, "x");
        assert_eq!(sections.analysis, "");
        assert_eq!(sections.changes, "");
        assert_eq!(sections.risks, "y");
    }

    #[test]
    fn multiline_sections_stop_at_any_label() {
        let raw = "OVERVIEW: Parses input.\nIt is small.\nANALYSIS: Point one\n- detail\nNote: an aside\nCHANGES: none";
        let sections = parse_analysis(raw);
        assert_eq!(sections.overview, "Parses input.\nIt is small.");
        // "Note:" is a label too, so it ends the analysis section
        assert_eq!(sections.analysis, "Point one\n- detail");
        assert_eq!(sections.changes, "none");
    }

    #[test]
    fn first_occurrence_wins_and_preamble_is_ignored() {
        let raw = "Sure, here you go.\nOVERVIEW: first\nOVERVIEW: second";
        assert_eq!(parse_analysis(raw).overview, "first");
    }

    #[test]
    fn unformatted_reply_gives_empty_sections() {
        assert!(parse_analysis("Looks good to me!").is_empty());
        assert!(parse_analysis("").is_empty());
    }

    #[test]
    fn label_must_be_at_line_start_and_touch_the_colon() {
        assert!(starts_with_label("RISKS: x"));
        assert!(starts_with_label("step_2:"));
        assert!(!starts_with_label(" RISKS: x"));
        assert!(!starts_with_label("RISKS : x"));
        assert!(!starts_with_label(": x"));
        assert!(!starts_with_label("- item: x"));
    }

    #[test]
    fn extracts_code_and_description() {
        let raw = "I renamed the function.\nCODE_START\nfn b() {}\nCODE_END\nDone.";
        let change = extract_code_change(raw).unwrap();
        assert_eq!(change.content, "fn b() {}");
        assert_eq!(change.description, "I renamed the function.");
    }

    #[test]
    fn keeps_inner_blank_lines_and_handles_crlf() {
        let raw = "Desc\r\nCODE_START\r\na\n\nb\r\nCODE_END";
        let change = extract_code_change(raw).unwrap();
        assert_eq!(change.content, "a\n\nb");
        assert_eq!(change.description, "Desc");
    }

    #[test]
    fn only_first_block_is_used() {
        let raw = "CODE_START\none\nCODE_END\nCODE_START\ntwo\nCODE_END";
        let change = extract_code_change(raw).unwrap();
        assert_eq!(change.content, "one");
        assert_eq!(change.description, "");
    }

    #[test]
    fn missing_markers_yield_none() {
        assert_eq!(extract_code_change("no code here"), None);
        assert_eq!(extract_code_change("CODE_START\nunterminated"), None);
        assert_eq!(extract_code_change("CODE_END before CODE_START"), None);
    }

    #[test]
    fn inline_marker_mentions_are_not_blocks() {
        assert_eq!(
            extract_code_change("I will put the edit between CODE_START and CODE_END markers below."),
            None
        );

        let raw = "Edits go between CODE_START and CODE_END.\nCODE_START\nlet x = 2;\nCODE_END";
        let change = extract_code_change(raw).unwrap();
        assert_eq!(change.content, "let x = 2;");
        assert_eq!(change.description, "Edits go between CODE_START and CODE_END.");
    }

    #[test]
    fn empty_block_is_not_a_proposal() {
        assert_eq!(extract_code_change("CODE_START\nCODE_END"), None);
        assert_eq!(extract_code_change("Nothing to change.\nCODE_START\n\n  \nCODE_END"), None);
    }
}
