//! Report lines returned from a provisioning batch.
//!
//! The leading glyph is a stable presentation contract: the admin UI colours
//! lines by prefix, and automated consumers match on it. Do not change the
//! prefix strings.

/// Prefix for a line that created a directory row.
pub const SUCCESS_PREFIX: &str = "✅ ";
/// Prefix for an informational line (processing, account created, skip).
pub const INFO_PREFIX: &str = "ℹ️ ";
/// Prefix for a per-line failure.
pub const FAILURE_PREFIX: &str = "❌ ";

/// Ordered, human-readable outcome log for one batch. Lines are appended in
/// processing order and never reordered.
#[derive(Debug, Default)]
pub struct Report {
  lines: Vec<String>,
}

impl Report {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn success(&mut self, message: impl AsRef<str>) {
    self.push(SUCCESS_PREFIX, message);
  }

  pub fn info(&mut self, message: impl AsRef<str>) {
    self.push(INFO_PREFIX, message);
  }

  pub fn failure(&mut self, message: impl AsRef<str>) {
    self.push(FAILURE_PREFIX, message);
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn into_lines(self) -> Vec<String> {
    self.lines
  }

  fn push(&mut self, prefix: &str, message: impl AsRef<str>) {
    self.lines.push(format!("{prefix}{}", message.as_ref()));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn prefixes_and_order_are_stable() {
    let mut report = Report::new();
    report.info("processing");
    report.success("added");
    report.failure("broken");

    let lines = report.into_lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with(INFO_PREFIX));
    assert!(lines[1].starts_with(SUCCESS_PREFIX));
    assert!(lines[2].starts_with(FAILURE_PREFIX));
  }
}
