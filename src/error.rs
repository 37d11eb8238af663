use crate::properties::Property;
use thiserror::Error;

/// Convenience type for a result that may contain an `SvdResolverError`.
pub type SvdResolverResult<T> = std::result::Result<T, SvdResolverError>;

/// Every way a description can fail to resolve. All of these abort the parse; no partial device
/// is ever returned.
#[derive(Debug, Error)]
pub enum SvdResolverError {
  /// The document is not well-formed XML.
  #[error("xml: {0}")]
  Xml(#[from] xmltree::ParseError),

  /// A mandatory element is missing or a value cannot be interpreted.
  #[error("<{element}>: {details}")]
  SchemaViolation { element: String, details: String },

  /// Ascending the owner chain for a `derivedFrom` path ran past the device.
  #[error("derivation path '{path}' ascends past the root of the description")]
  UnresolvedDerivationRoot { path: String },

  /// A segment of a `derivedFrom` path names nothing that has been built so far.
  #[error("cannot find '{segment}' of derivation path '{path}'")]
  UnresolvedDerivationSegment { path: String, segment: String },

  /// A `derivedFrom` path resolved, but to an element of another kind.
  #[error("derivation path '{path}' names a {found}, expected a {expected}")]
  DerivationKindMismatch {
    path: String,
    expected: &'static str,
    found: &'static str,
  },

  /// `dimIndex` is neither a comma separated list nor a numeric range.
  #[error("{name}: cannot interpret dimIndex '{dim_index}'")]
  InvalidDimIndex { name: String, dim_index: String },

  /// `dimIndex` names a different number of instances than `dim`.
  #[error("{name}: dim is {dim} but dimIndex yields {count} indices")]
  DimCountMismatch { name: String, dim: u32, count: usize },

  /// A field has neither bitOffset, lsb/msb nor bitRange.
  #[error("field '{field}' has no bit range")]
  MissingBitRange { field: String },

  /// A property is set neither on the element nor on any of its owners.
  #[error("'{path}' has no {property}, neither locally nor inherited")]
  PropertyNotFound { path: String, property: Property },

  #[error("regex: {0}")]
  Regex(#[from] regex::Error),
}

impl SvdResolverError {
  pub(crate) fn schema(element: &str, details: impl Into<String>) -> Self {
    SvdResolverError::SchemaViolation {
      element: element.to_owned(),
      details: details.into(),
    }
  }
}
