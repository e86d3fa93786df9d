//! # Header Matcher Module
//!
//! This module compares a detected header block against rendered template
//! candidates.
//!
//! Three notions of equality are used:
//! - exact: byte-for-byte equality
//! - structural: equal once trailing newlines are ignored
//! - semantic: equal once variable-like tokens (dates, times, emails, hashes,
//!   years) are masked and whitespace is collapsed

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use super::locator::HeaderRegion;

/// Ordered token-class rewrites applied before semantic comparison.
///
/// Dates must be masked before hashes so that `20240731` is read as a date.
static MASKS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
  [
    (r"\b[0-9]{4}[-/]?[0-9]{2}[-/]?[0-9]{2}\b", "<DATE>"),
    (r"\b[0-9]{2}[-/.][0-9]{2}[-/.][0-9]{4}\b", "<DATE>"),
    (r"\b[0-9]{2}:[0-9]{2}:[0-9]{2}\b", "<TIME>"),
    (r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}", "<EMAIL>"),
    (r"\b[0-9a-fA-F]{7,40}\b", "<HASH>"),
    (r"\b(?:19|20)[0-9]{2}\b", "<YEAR>"),
  ]
  .into_iter()
  .map(|(pattern, placeholder)| (Regex::new(pattern).expect("mask regex must compile"), placeholder))
  .collect()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex must compile"));

/// Masks variable-like tokens and normalizes whitespace.
///
/// The result is what semantic comparison operates on. It is exposed for
/// diagnostics and tests.
pub fn mask_variables(text: &str) -> String {
  let mut masked = Cow::Borrowed(text);
  for (regex, placeholder) in MASKS.iter() {
    if let Cow::Owned(replaced) = regex.replace_all(&masked, *placeholder) {
      masked = Cow::Owned(replaced);
    }
  }
  WHITESPACE.replace_all(&masked, " ").trim().to_string()
}

/// Returns `true` if both headers are identical once variable-like tokens are
/// masked.
///
/// An empty header never matches anything.
pub fn semantically_equal(existing: &str, expected: &str) -> bool {
  if existing.is_empty() || expected.is_empty() {
    return false;
  }
  mask_variables(existing) == mask_variables(expected)
}

/// Returns `true` if the headers only differ by leading or trailing newlines.
///
/// The planner writes headers without them, so a header it wrote compares
/// equal to its template.
pub fn structurally_equal(a: &str, b: &str) -> bool {
  trim_newlines(a) == trim_newlines(b)
}

/// Number of lines a rendered header occupies once leading and trailing
/// blank lines are dropped.
pub fn line_count(header: &str) -> usize {
  trim_newlines(header).split('\n').count()
}

fn trim_newlines(text: &str) -> &str {
  text.trim_matches(['\r', '\n'])
}

/// The part of a detected header block that a candidate is compared with.
///
/// The window spans as many leading lines of the block as the candidate has,
/// so comments that follow a conforming header (for example legacy text
/// demoted below it) do not prevent a match.
pub fn candidate_window<'a>(region: &HeaderRegion<'a>, candidate: &str) -> HeaderRegion<'a> {
  region.leading_lines(line_count(candidate))
}

/// A successful match between a header block and a rendered candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch<'a> {
  /// Index of the matching candidate
  pub index: usize,
  /// The portion of the header block that matched
  pub window: HeaderRegion<'a>,
}

/// Finds the first candidate whose text semantically matches the header
/// block.
pub fn find_match<'a, S: AsRef<str>>(region: &HeaderRegion<'a>, candidates: &[S]) -> Option<HeaderMatch<'a>> {
  if region.is_empty() {
    return None;
  }

  candidates.iter().enumerate().find_map(|(index, candidate)| {
    let window = candidate_window(region, candidate.as_ref());
    semantically_equal(window.text, candidate.as_ref()).then_some(HeaderMatch { index, window })
  })
}
