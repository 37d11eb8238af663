//! Resolves a CMSIS-SVD description into a fully expanded element graph: `derivedFrom` chains are
//! flattened, `dim` arrays are expanded into their instances, field bit ranges are canonicalized
//! and register properties are resolved through the containment hierarchy.

mod bit_range;
mod builder;
mod cluster;
mod derive;
mod device;
mod dim;
mod error;
mod field;
mod node;
mod options;
mod patterns;
mod peripheral;
mod properties;
mod register;
mod tree;
mod value;

pub use bit_range::{resolve_bit_range, BitRange};
pub use cluster::ClusterSpec;
pub use derive::Derivable;
pub use device::{
  CpuSpec, Device, DeviceSpec, EndianSpec, SauAccessSpec, SauRegionSpec, SauRegionsConfigSpec,
};
pub use dim::{expand, substitute, DimInstance, DimSpec, Repeatable};
pub use error::{SvdResolverError, SvdResolverResult};
pub use field::FieldSpec;
pub use node::SourceNode;
pub use options::ParseOptions;
pub use peripheral::{AddressBlockSpec, AddressBlockUsageSpec, InterruptSpec, PeripheralSpec};
pub use properties::{Property, PropertyGroup, PropertyInheriting, PropertySet, PropertyValue};
pub use register::RegisterSpec;
pub use tree::{Element, ElementId, ElementKind};
pub use value::{
  EnumeratedValueSetSpec, EnumeratedValueSpec, EnumeratedValueUsageSpec, EnumeratedValueValueSpec,
  ModifiedWriteValuesSpec, ReadActionSpec, WriteConstraintRangeSpec, WriteConstraintSpec,
};

use node::SvdEnum;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AccessSpec {
  ReadOnly,
  ReadWrite,
  ReadWriteOnce,
  WriteOnce,
  WriteOnly,
}
impl AccessSpec {
  pub fn can_read(&self) -> bool {
    match self {
      AccessSpec::ReadOnly | AccessSpec::ReadWrite | AccessSpec::ReadWriteOnce => true,
      _ => false,
    }
  }

  pub fn can_write(&self) -> bool {
    match self {
      AccessSpec::ReadWrite
      | AccessSpec::ReadWriteOnce
      | AccessSpec::WriteOnce
      | AccessSpec::WriteOnly => true,
      _ => false,
    }
  }
}
impl SvdEnum for AccessSpec {
  fn from_token(token: &str) -> Option<Self> {
    match token {
      "read-only" => Some(AccessSpec::ReadOnly),
      "read-write" => Some(AccessSpec::ReadWrite),
      "read-writeOnce" => Some(AccessSpec::ReadWriteOnce),
      "writeOnce" => Some(AccessSpec::WriteOnce),
      "write-only" => Some(AccessSpec::WriteOnly),
      _ => None,
    }
  }
}

/// Security privilege required to access an address region.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ProtectionSpec {
  Secure,
  NonSecure,
  Privileged,
}
impl SvdEnum for ProtectionSpec {
  fn from_token(token: &str) -> Option<Self> {
    match token {
      "s" => Some(ProtectionSpec::Secure),
      "n" => Some(ProtectionSpec::NonSecure),
      "p" => Some(ProtectionSpec::Privileged),
      _ => None,
    }
  }
}

/// Collapses runs of whitespace (including the line breaks SVD files wrap descriptions with) into
/// single spaces.
pub(crate) fn clean_whitespace_opt(text: Option<String>) -> SvdResolverResult<Option<String>> {
  match text {
    Some(t) => Ok(Some(clean_whitespace(&t)?)),
    None => Ok(None),
  }
}

pub(crate) fn clean_whitespace(text: &str) -> SvdResolverResult<String> {
  Ok(
    patterns::whitespace()?
      .replace_all(text.trim(), " ")
      .into_owned(),
  )
}

#[cfg(test)]
mod tests {
  use super::{clean_whitespace_opt, AccessSpec};

  #[test]
  fn cleans_whitespace() {
    let cleaned =
      clean_whitespace_opt(Some("  Timer\n      control\tregister ".to_owned())).unwrap();

    assert_eq!("Timer control register", cleaned.unwrap());
    assert!(clean_whitespace_opt(None).unwrap().is_none());
  }

  #[test]
  fn access_rights() {
    assert!(AccessSpec::ReadOnly.can_read());
    assert!(!AccessSpec::ReadOnly.can_write());
    assert!(AccessSpec::WriteOnce.can_write());
    assert!(!AccessSpec::WriteOnly.can_read());
  }
}
