//! # Header Locator Module
//!
//! This module finds the leading header comment block of a file. It knows
//! about shebang lines and about top-of-file directives (build constraints,
//! generator pragmas, lint suppressions) that must stay above ordinary code
//! but never belong to the header itself.

/// Line-comment markers after which a directive keyword may follow.
const SLASH_DIRECTIVE_PREFIXES: [&str; 4] = ["go:", "+build", "nolint", "lint:"];

/// A contiguous block of comment and blank lines detected at the top of a
/// file.
///
/// Offsets are byte offsets into the content the region was located in.
/// `start` always points past any shebang line and `end` is exclusive. A
/// region with `start == end` means no header was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRegion<'a> {
  /// The text of the block, including its trailing blank lines
  pub text: &'a str,
  /// Offset of the first byte of the block
  pub start: usize,
  /// Offset one past the last byte of the block
  pub end: usize,
}

impl<'a> HeaderRegion<'a> {
  /// Creates a zero-length region at the given offset.
  pub const fn empty_at(offset: usize) -> Self {
    Self {
      text: "",
      start: offset,
      end: offset,
    }
  }

  /// Returns `true` if no header block was detected.
  pub const fn is_empty(&self) -> bool {
    self.start == self.end
  }

  /// Returns the sub-region made of the first `count` lines of this block.
  ///
  /// When the block has fewer lines than requested the whole block is
  /// returned.
  pub fn leading_lines(&self, count: usize) -> HeaderRegion<'a> {
    let len: usize = self.text.split_inclusive('\n').take(count).map(str::len).sum();
    HeaderRegion {
      text: &self.text[..len],
      start: self.start,
      end: self.start + len,
    }
  }
}

/// Locates the leading header block of `content`.
///
/// Detection starts after the shebang line (if any), skips blank lines and
/// directive lines, then collects consecutive comment and blank lines. It
/// stops at the first line of code or at a directive line.
pub fn locate(content: &str) -> HeaderRegion<'_> {
  let start = skip_blank_and_directives(content, shebang_end(content));

  let mut end = start;
  for line in content[start..].split_inclusive('\n') {
    if !is_comment_line(line) || is_directive(line) {
      break;
    }
    end += line.len();
  }

  if end == start {
    return HeaderRegion::empty_at(start);
  }

  HeaderRegion {
    text: &content[start..end],
    start,
    end,
  }
}

/// Returns the offset just past the shebang line, or `0` when the content
/// does not start with `#!`.
pub fn shebang_end(content: &str) -> usize {
  if !content.starts_with("#!") {
    return 0;
  }
  content.find('\n').map_or(content.len(), |nl| nl + 1)
}

/// Advances from `pos` over blank lines and directive lines.
pub fn skip_blank_and_directives(content: &str, pos: usize) -> usize {
  scan_lines(content, pos, |line| is_blank(line) || is_directive(line))
}

/// Advances from `pos` while `keep` accepts each successive line and returns
/// the offset of the first rejected line (or the end of the content).
pub(crate) fn scan_lines(content: &str, pos: usize, keep: impl Fn(&str) -> bool) -> usize {
  let mut end = pos;
  for line in content[pos..].split_inclusive('\n') {
    if !keep(line) {
      break;
    }
    end += line.len();
  }
  end
}

/// Returns `true` if the line is empty or only whitespace.
pub fn is_blank(line: &str) -> bool {
  line.trim().is_empty()
}

/// Returns `true` for blank lines and lines that look like comments.
///
/// Recognized forms are line comments (`//`, `#`, `;`) and block comment
/// pieces (`/*`, `*`, `*/`).
pub fn is_comment_line(line: &str) -> bool {
  let s = line.trim();
  s.is_empty() || ["//", "#", ";", "/*", "*"].iter().any(|prefix| s.starts_with(prefix))
}

/// Returns `true` if the line is a top-of-file directive.
///
/// Directives are:
/// - `//go:build`, `//go:generate` and the other `//go:` pragmas
/// - legacy `// +build` constraints
/// - `//nolint` and `//lint:` linter directives
/// - `# shellcheck ...` directives in shell scripts
pub fn is_directive(line: &str) -> bool {
  let s = line.trim();

  let Some(rest) = s.strip_prefix("//") else {
    return s
      .strip_prefix('#')
      .is_some_and(|rest| rest.trim_start().to_lowercase().starts_with("shellcheck"));
  };

  let rest = rest.trim();
  !rest.is_empty() && SLASH_DIRECTIVE_PREFIXES.iter().any(|prefix| rest.starts_with(prefix))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_locate_plain_header() {
    let content = "// Header\n// Author: Alice\n\npackage main\n";
    let region = locate(content);
    assert_eq!(region.text, "// Header\n// Author: Alice\n\n");
    assert_eq!(region.start, 0);
    assert_eq!(region.end, region.text.len());
  }

  #[test]
  fn test_locate_with_shebang() {
    let content = "#!/usr/bin/env bash\n# header line\n\necho hi\n";
    let region = locate(content);
    assert_eq!(region.text, "# header line\n\n");
    assert_eq!(region.start, "#!/usr/bin/env bash\n".len());
    assert_eq!(&content[region.start..region.end], region.text);
  }

  #[test]
  fn test_locate_no_header() {
    let region = locate("package main\n");
    assert!(region.is_empty());
    assert_eq!(region.start, 0);
    assert_eq!(region.text, "");
  }

  #[test]
  fn test_locate_shebang_and_code_only() {
    let content = "#!/bin/sh\necho hi\n";
    let region = locate(content);
    assert!(region.is_empty());
    assert_eq!(region.start, "#!/bin/sh\n".len());
  }

  #[test]
  fn test_locate_only_directives() {
    let content = "//go:build linux\n//nolint:errcheck\n\npackage main\n";
    let region = locate(content);
    assert!(region.is_empty());
    assert_eq!(region.start, "//go:build linux\n//nolint:errcheck\n\n".len());
  }

  #[test]
  fn test_locate_header_below_directives() {
    let content = "//go:build go1.20\n//nolint\n\n// Old header\n\npackage main\n";
    let region = locate(content);
    assert_eq!(region.text, "// Old header\n\n");
  }

  #[test]
  fn test_locate_stops_at_directive() {
    let content = "// old\n\n//go:build go1.20\n\npackage x\n";
    let region = locate(content);
    assert_eq!(region.text, "// old\n\n");
  }

  #[test]
  fn test_locate_block_comment() {
    let content = "/*\n * Copyright 2024\n */\n\nint main() {}\n";
    let region = locate(content);
    assert_eq!(region.text, "/*\n * Copyright 2024\n */\n\n");
  }

  #[test]
  fn test_locate_without_trailing_newline() {
    let content = "// only a comment";
    let region = locate(content);
    assert_eq!(region.text, "// only a comment");
    assert_eq!(region.end, content.len());
  }

  #[test]
  fn test_locate_empty_content() {
    let region = locate("");
    assert!(region.is_empty());
    assert_eq!(region.start, 0);
  }

  #[test]
  fn test_shebang_end() {
    assert_eq!(shebang_end("#!/bin/sh\necho"), 10);
    assert_eq!(shebang_end("#!/bin/sh"), 9);
    assert_eq!(shebang_end("echo"), 0);
    assert_eq!(shebang_end("# comment\n"), 0);
  }

  #[test]
  fn test_is_directive() {
    assert!(is_directive("//go:build linux\n"));
    assert!(is_directive("//go:generate stringer -type=Kind\n"));
    assert!(is_directive("// +build linux\n"));
    assert!(is_directive("//nolint:errcheck\n"));
    assert!(is_directive("//lint:file-ignore U1000 reason\n"));
    assert!(is_directive("# shellcheck disable=SC2086\n"));
    assert!(is_directive("#ShellCheck shell=bash\n"));

    assert!(!is_directive("// just a comment\n"));
    assert!(!is_directive("//\n"));
    assert!(!is_directive("# header\n"));
    assert!(!is_directive("package main\n"));
  }

  #[test]
  fn test_is_comment_line() {
    assert!(is_comment_line("// a\n"));
    assert!(is_comment_line("# a\n"));
    assert!(is_comment_line("; a\n"));
    assert!(is_comment_line("/* a\n"));
    assert!(is_comment_line(" * a\n"));
    assert!(is_comment_line(" */\n"));
    assert!(is_comment_line("   \n"));
    assert!(!is_comment_line("package main\n"));
  }

  #[test]
  fn test_leading_lines() {
    let content = "// one\n// two\n\n// three\n\ncode\n";
    let region = locate(content);
    let head = region.leading_lines(2);
    assert_eq!(head.text, "// one\n// two\n");
    assert_eq!(head.start, 0);
    assert_eq!(head.end, head.text.len());

    let all = region.leading_lines(100);
    assert_eq!(all, region);
  }
}
