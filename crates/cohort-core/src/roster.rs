//! Roster line parser — raw pasted text to provisioning records.
//!
//! Pipeline:
//!   raw &str
//!     └─ split lines, trim, drop blanks
//!          └─ parse_line() → ProvisioningRecord | LineError
//!
//! One outcome per non-blank line, in input order. No email-format
//! validation happens here beyond non-emptiness; that is the identity
//! store's concern.

use crate::{category::Category, error::LineError};

/// One validated roster line, ready to provision. Constructed only by the
/// parser, consumed once by the batch orchestrator, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRecord {
  pub last_name:  String,
  pub first_name: String,
  pub email:      String,
  pub category:   Category,
}

/// One non-blank input line with its parse outcome.
#[derive(Debug, Clone)]
pub struct RosterLine {
  /// The trimmed input line, kept for report messages.
  pub raw:    String,
  pub parsed: Result<ProvisioningRecord, LineError>,
}

/// Parse raw multi-line roster text.
///
/// Lines are `last;first;email;code`, or `last;first;email` when
/// `default_category` supplies the code out of band. An embedded fourth
/// field always wins over the default.
pub fn parse_roster(
  input: &str,
  default_category: Option<Category>,
) -> Vec<RosterLine> {
  input
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(|line| RosterLine {
      raw:    line.to_owned(),
      parsed: parse_line(line, default_category),
    })
    .collect()
}

fn parse_line(
  line: &str,
  default_category: Option<Category>,
) -> Result<ProvisioningRecord, LineError> {
  let parts: Vec<&str> = line.split(';').map(str::trim).collect();

  let required = if default_category.is_some() { 3 } else { 4 };
  if parts.len() < required {
    return Err(LineError::TooFewFields {
      expected: required,
      got:      parts.len(),
    });
  }

  let category = match parts.get(3) {
    Some(code) => Category::from_code(code)
      .ok_or_else(|| LineError::UnknownCategory((*code).to_owned()))?,
    None => match default_category {
      Some(category) => category,
      None => {
        return Err(LineError::TooFewFields {
          expected: 4,
          got:      parts.len(),
        });
      }
    },
  };

  let (last_name, first_name, email) = (parts[0], parts[1], parts[2]);
  for (field, value) in [
    ("last name", last_name),
    ("first name", first_name),
    ("email", email),
  ] {
    if value.is_empty() {
      return Err(LineError::EmptyField(field));
    }
  }

  Ok(ProvisioningRecord {
    last_name:  last_name.to_owned(),
    first_name: first_name.to_owned(),
    email:      email.to_owned(),
    category,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ok(line: &RosterLine) -> &ProvisioningRecord {
    line.parsed.as_ref().expect("line should parse")
  }

  fn err(line: &RosterLine) -> &LineError {
    line.parsed.as_ref().expect_err("line should be rejected")
  }

  #[test]
  fn four_field_line_parses() {
    let lines = parse_roster("Doe;Jane;jane.doe@example.org;E", None);
    assert_eq!(lines.len(), 1);
    let record = ok(&lines[0]);
    assert_eq!(record.last_name, "Doe");
    assert_eq!(record.first_name, "Jane");
    assert_eq!(record.email, "jane.doe@example.org");
    assert_eq!(record.category, Category::Student);
  }

  #[test]
  fn staff_code_maps_to_staff() {
    let lines = parse_roster("Smith;Ada;ada@example.org;P", None);
    assert_eq!(ok(&lines[0]).category, Category::Staff);
  }

  #[test]
  fn three_field_line_uses_default_category() {
    let lines =
      parse_roster("Doe;Jane;jane@example.org", Some(Category::Staff));
    assert_eq!(ok(&lines[0]).category, Category::Staff);
  }

  #[test]
  fn embedded_code_wins_over_default() {
    let lines =
      parse_roster("Doe;Jane;jane@example.org;E", Some(Category::Staff));
    assert_eq!(ok(&lines[0]).category, Category::Student);
  }

  #[test]
  fn three_fields_without_default_is_rejected() {
    let lines = parse_roster("Doe;Jane;jane@example.org", None);
    assert_eq!(
      *err(&lines[0]),
      LineError::TooFewFields { expected: 4, got: 3 }
    );
  }

  #[test]
  fn two_fields_is_rejected() {
    let lines = parse_roster("Doe;Jane", None);
    assert_eq!(lines.len(), 1);
    assert!(matches!(err(&lines[0]), LineError::TooFewFields { .. }));
  }

  #[test]
  fn empty_required_field_is_rejected() {
    let lines = parse_roster("Doe;;jane@example.org;E", None);
    assert_eq!(*err(&lines[0]), LineError::EmptyField("first name"));
  }

  #[test]
  fn unknown_category_code_is_rejected() {
    let lines = parse_roster("Doe;Jane;jane@example.org;X", None);
    assert_eq!(
      *err(&lines[0]),
      LineError::UnknownCategory("X".to_owned())
    );
  }

  #[test]
  fn blank_lines_are_dropped_and_order_preserved() {
    let input = "\nDoe;Jane;jane@example.org;E\n\n   \nRoe;Rick;rick@example.org;P\n";
    let lines = parse_roster(input, None);
    assert_eq!(lines.len(), 2);
    assert_eq!(ok(&lines[0]).email, "jane@example.org");
    assert_eq!(ok(&lines[1]).email, "rick@example.org");
  }

  #[test]
  fn parts_are_trimmed() {
    let lines = parse_roster("  Doe ; Jane ; jane@example.org ; E  ", None);
    let record = ok(&lines[0]);
    assert_eq!(record.last_name, "Doe");
    assert_eq!(record.email, "jane@example.org");
  }
}
