//! Category — which directory table a member belongs to.

use serde::{Deserialize, Serialize};

/// The two-valued member classification. `Student` covers current students
/// and alumni; `Staff` covers teaching and administrative personnel.
///
/// Each category owns its own profile table and id sequence. Adding a
/// category means adding a variant here and letting the compiler point at
/// every dispatch site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Student,
  Staff,
}

impl Category {
  /// All categories, in profile-lookup order (students first).
  pub const ALL: [Category; 2] = [Category::Student, Category::Staff];

  /// Parse a legacy roster code: `E` marks a student/alumni line, `P` a
  /// staff line. Returns `None` for anything else.
  pub fn from_code(code: &str) -> Option<Self> {
    match code {
      "E" => Some(Self::Student),
      "P" => Some(Self::Staff),
      _ => None,
    }
  }

  /// The roster code for this category.
  pub fn code(self) -> &'static str {
    match self {
      Self::Student => "E",
      Self::Staff => "P",
    }
  }
}

impl std::fmt::Display for Category {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::Student => "student",
      Self::Staff => "staff",
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_round_trip() {
    for category in Category::ALL {
      assert_eq!(Category::from_code(category.code()), Some(category));
    }
  }

  #[test]
  fn unknown_codes_rejected() {
    assert_eq!(Category::from_code(""), None);
    assert_eq!(Category::from_code("e"), None);
    assert_eq!(Category::from_code("X"), None);
  }
}
