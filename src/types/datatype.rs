//! Port datatype table and compatibility rule.
//!
//! The set of valid datatype names is fixed and process-wide; ports declare
//! a name as a plain string and the network validates it when an edge is
//! created.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Datatype that accepts every other datatype.
pub const ALL: &str = "all";

/// Valid port datatype names, in declaration order.
pub const DATATYPES: &[&str] = &[
  ALL, "bang", "string", "boolean", "number", "int", "object", "array", "date", "function",
  "stream",
];

/// Immutable lookup table over [`DATATYPES`].
#[derive(Debug)]
pub struct DatatypeTable {
  names: HashSet<&'static str>,
}

impl DatatypeTable {
  fn new(names: &'static [&'static str]) -> Self {
    Self {
      names: names.iter().copied().collect(),
    }
  }

  pub fn is_valid(&self, name: &str) -> bool {
    self.names.contains(name)
  }

  /// Comma-separated list of valid names, for error messages.
  pub fn describe(&self) -> String {
    DATATYPES.join(", ")
  }
}

/// The process-wide datatype table.
pub static DATATYPE_TABLE: Lazy<DatatypeTable> = Lazy::new(|| DatatypeTable::new(DATATYPES));

/// Returns true if `name` is a declared datatype.
pub fn is_valid_datatype(name: &str) -> bool {
  DATATYPE_TABLE.is_valid(name)
}

/// Out-port type `from` may feed in-port type `to` when both names are
/// identical or either side is `all`.
pub fn is_compatible(from: &str, to: &str) -> bool {
  from == to || from == ALL || to == ALL
}
