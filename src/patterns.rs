//! Regular expressions shared by every parse, compiled on first use.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::SvdResolverResult;

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> SvdResolverResult<&'static Regex> {
  if let Some(re) = cell.get() {
    return Ok(re);
  }
  let re = Regex::new(pattern)?;
  Ok(cell.get_or_init(|| re))
}

/// Runs of whitespace, collapsed in descriptions.
pub(crate) fn whitespace() -> SvdResolverResult<&'static Regex> {
  static WHITESPACE: OnceLock<Regex> = OnceLock::new();
  compiled(&WHITESPACE, r"\s+")
}

/// An inclusive numeric `dimIndex` range, `first-last`.
pub(crate) fn dim_range() -> SvdResolverResult<&'static Regex> {
  static DIM_RANGE: OnceLock<Regex> = OnceLock::new();
  compiled(&DIM_RANGE, r"^\s*(\d+)\s*-\s*(\d+)\s*$")
}

/// A `[msb:lsb]` bit range.
pub(crate) fn bit_range() -> SvdResolverResult<&'static Regex> {
  static BIT_RANGE: OnceLock<Regex> = OnceLock::new();
  compiled(&BIT_RANGE, r"^\[\s*(\d+)\s*:\s*(\d+)\s*\]$")
}

#[cfg(test)]
mod tests {
  use super::{bit_range, dim_range, whitespace};

  #[test]
  fn compiles_once() {
    assert!(std::ptr::eq(whitespace().unwrap(), whitespace().unwrap()));
    assert!(std::ptr::eq(dim_range().unwrap(), dim_range().unwrap()));
    assert!(std::ptr::eq(bit_range().unwrap(), bit_range().unwrap()));
  }

  #[test]
  fn matches_expected_shapes() {
    assert!(dim_range().unwrap().is_match("3 - 6"));
    assert!(!dim_range().unwrap().is_match("4x8"));
    assert!(bit_range().unwrap().is_match("[23:4]"));
    assert!(!bit_range().unwrap().is_match("23:4"));
  }
}
