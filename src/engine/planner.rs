//! # Rewrite Planner Module
//!
//! This module computes the new content of a file once a header has to be
//! inserted or replaced. The output is always rebuilt as a whole:
//!
//! 1. the shebang line, if any, followed by one blank line
//! 2. the header, followed by one blank line
//! 3. the top-of-file directives, followed by one blank line
//! 4. other top-of-file comments (and a demoted previous header), followed by
//!    one blank line
//! 5. the rest of the file, unchanged

use super::locator::{HeaderRegion, is_blank, is_comment_line, is_directive, scan_lines, shebang_end};

/// What to do with the text of a header that is being replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Displaced {
  /// Keep the old text below the new header and the directives.
  Demote,
  /// Drop the old text.
  Discard,
}

/// Returns new content with `header` inserted at the top of `content`.
///
/// The header goes right after the shebang and above any directives, which
/// are moved below it together with any other leading comments.
pub fn insert(content: &str, header: &str) -> String {
  reassemble(content, header, None)
}

/// Returns new content where the header block `existing` is replaced by
/// `header`.
///
/// `existing` must have been located in `content`. With
/// [`Displaced::Demote`] the old block is kept below the directives so
/// hand-written text is never lost.
pub fn replace(content: &str, existing: &HeaderRegion<'_>, header: &str, displaced: Displaced) -> String {
  if existing.is_empty() {
    return insert(content, header);
  }

  let mut remaining = String::with_capacity(content.len() - existing.text.len());
  remaining.push_str(&content[..existing.start]);
  remaining.push_str(&content[existing.end..]);

  let demoted = match displaced {
    Displaced::Demote => Some(existing.text),
    Displaced::Discard => None,
  };
  reassemble(&remaining, header, demoted)
}

fn reassemble(content: &str, header: &str, demoted: Option<&str>) -> String {
  let split = shebang_end(content);
  let (shebang, middle) = content.split_at(split);

  let directives_end = scan_lines(middle, 0, |line| is_blank(line) || is_directive(line));
  let comments_end = scan_lines(middle, directives_end, is_comment_line);

  let directives = &middle[..directives_end];
  let comments = &middle[directives_end..comments_end];
  let rest = &middle[comments_end..];

  let mut out = String::with_capacity(content.len() + header.len() + demoted.map_or(0, str::len) + 8);

  if !shebang.is_empty() {
    out.push_str(trim_newlines(shebang));
    out.push_str("\n\n");
  }

  out.push_str(trim_newlines(header));
  out.push_str("\n\n");

  for block in [directives, comments, demoted.unwrap_or_default()] {
    let block = trim_newlines(block);
    if !block.trim().is_empty() {
      out.push_str(block);
      out.push_str("\n\n");
    }
  }

  out.push_str(rest);
  out
}

fn trim_newlines(text: &str) -> &str {
  text.trim_matches(['\r', '\n'])
}
