//! The register property group (`size`, `access`, `protection`, `resetValue`, `resetMask`) and
//! its resolution up the owner chain.

use std::fmt;

use bitflags::bitflags;

use crate::{
  error::SvdResolverResult,
  node::{self, SourceNode},
  tree::{ElementId, Tree},
  AccessSpec, ProtectionSpec,
};

/// One member of the register property group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
  Size,
  Access,
  Protection,
  ResetValue,
  ResetMask,
}
impl Property {
  pub const ALL: [Property; 5] = [
    Property::Size,
    Property::Access,
    Property::Protection,
    Property::ResetValue,
    Property::ResetMask,
  ];

  /// The tag this property is read from.
  pub fn tag(self) -> &'static str {
    match self {
      Property::Size => "size",
      Property::Access => "access",
      Property::Protection => "protection",
      Property::ResetValue => "resetValue",
      Property::ResetMask => "resetMask",
    }
  }

  pub fn flag(self) -> PropertySet {
    match self {
      Property::Size => PropertySet::SIZE,
      Property::Access => PropertySet::ACCESS,
      Property::Protection => PropertySet::PROTECTION,
      Property::ResetValue => PropertySet::RESET_VALUE,
      Property::ResetMask => PropertySet::RESET_MASK,
    }
  }
}
impl fmt::Display for Property {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.tag())
  }
}

bitflags! {
  /// A set of properties, e.g. the ones an element kind may inherit from its owners.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct PropertySet: u8 {
    const SIZE = 1 << 0;
    const ACCESS = 1 << 1;
    const PROTECTION = 1 << 2;
    const RESET_VALUE = 1 << 3;
    const RESET_MASK = 1 << 4;
  }
}

/// A resolved property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
  Size(u32),
  Access(AccessSpec),
  Protection(ProtectionSpec),
  ResetValue(u64),
  ResetMask(u64),
}
impl PropertyValue {
  pub fn as_size(&self) -> Option<u32> {
    match *self {
      PropertyValue::Size(v) => Some(v),
      _ => None,
    }
  }

  pub fn as_access(&self) -> Option<AccessSpec> {
    match *self {
      PropertyValue::Access(v) => Some(v),
      _ => None,
    }
  }

  pub fn as_protection(&self) -> Option<ProtectionSpec> {
    match *self {
      PropertyValue::Protection(v) => Some(v),
      _ => None,
    }
  }

  pub fn as_reset_value(&self) -> Option<u64> {
    match *self {
      PropertyValue::ResetValue(v) => Some(v),
      _ => None,
    }
  }

  pub fn as_reset_mask(&self) -> Option<u64> {
    match *self {
      PropertyValue::ResetMask(v) => Some(v),
      _ => None,
    }
  }
}

/// The locally specified members of the property group. Unset members are `None`; their
/// effective value is looked up on demand through the owners.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PropertyGroup {
  /// The bit width of a register.
  pub size: Option<u32>,

  /// Access rights.
  pub access: Option<AccessSpec>,

  /// Security privilege required for access.
  pub protection: Option<ProtectionSpec>,

  /// Register value after reset.
  pub reset_value: Option<u64>,

  /// Bits of the register that have a defined reset value.
  pub reset_mask: Option<u64>,
}
impl PropertyGroup {
  /// Values assumed when a property is set nowhere in the owner chain.
  pub fn engine_defaults() -> Self {
    Self {
      size: Some(32),
      access: Some(AccessSpec::ReadWrite),
      protection: None,
      reset_value: Some(0),
      reset_mask: Some(0xFFFF_FFFF),
    }
  }

  pub fn get(&self, property: Property) -> Option<PropertyValue> {
    match property {
      Property::Size => self.size.map(PropertyValue::Size),
      Property::Access => self.access.map(PropertyValue::Access),
      Property::Protection => self.protection.map(PropertyValue::Protection),
      Property::ResetValue => self.reset_value.map(PropertyValue::ResetValue),
      Property::ResetMask => self.reset_mask.map(PropertyValue::ResetMask),
    }
  }

  /// Reads the members in `tags` from the child elements of `node`.
  pub(crate) fn parse<N: SourceNode>(node: &N, tags: PropertySet) -> SvdResolverResult<Self> {
    let mut group = Self::default();

    if tags.contains(PropertySet::SIZE) {
      group.size = node::integer_u32(node, "size")?;
    }
    if tags.contains(PropertySet::ACCESS) {
      group.access = node::enumeration(node, "access")?;
    }
    if tags.contains(PropertySet::PROTECTION) {
      group.protection = node::enumeration(node, "protection")?;
    }
    if tags.contains(PropertySet::RESET_VALUE) {
      group.reset_value = node::integer(node, "resetValue")?;
    }
    if tags.contains(PropertySet::RESET_MASK) {
      group.reset_mask = node::integer(node, "resetMask")?;
    }

    Ok(group)
  }

  /// Replaces every member that `local` sets.
  pub(crate) fn override_with(&mut self, local: &PropertyGroup) {
    if local.size.is_some() {
      self.size = local.size;
    }
    if local.access.is_some() {
      self.access = local.access;
    }
    if local.protection.is_some() {
      self.protection = local.protection;
    }
    if local.reset_value.is_some() {
      self.reset_value = local.reset_value;
    }
    if local.reset_mask.is_some() {
      self.reset_mask = local.reset_mask;
    }
  }
}

/// An element whose property group members may be inherited from its owners.
pub trait PropertyInheriting {
  /// The properties set on this element itself.
  fn local_properties(&self) -> &PropertyGroup;

  /// The properties this element takes from its owners when unset locally.
  fn inheritable(&self) -> PropertySet;

  /// The containing element.
  fn owner(&self) -> Option<ElementId>;
}

/// Effective value of `property` on `id`: the local value, else the nearest owner's local value if
/// the element inherits `property`, else `None`.
pub(crate) fn resolve(tree: &Tree, id: ElementId, property: Property) -> Option<PropertyValue> {
  let element = tree.get(id);

  if let Some(value) = element.local_properties().get(property) {
    return Some(value);
  }
  if !element.inheritable().contains(property.flag()) {
    return None;
  }

  let mut owner = element.owner();
  while let Some(id) = owner {
    let ancestor = tree.get(id);
    if let Some(value) = ancestor.local_properties().get(property) {
      return Some(value);
    }
    owner = ancestor.owner();
  }

  None
}
