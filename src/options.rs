use crate::properties::PropertySet;

/// Controls which register properties each element kind inherits from its owners, and how strict
/// the parse is about optional documentation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
  /// Properties that peripherals, clusters and registers inherit. Some schema revisions exclude
  /// `resetValue`/`resetMask` from the inherited group.
  pub register_properties: PropertySet,

  /// Properties that fields inherit.
  pub field_properties: PropertySet,

  /// Properties that address blocks inherit.
  pub address_block_properties: PropertySet,

  /// Properties that the SAU regions configuration inherits.
  pub sau_regions_config_properties: PropertySet,

  /// When set, peripherals, clusters, registers and fields that are not derived must carry a
  /// description.
  pub require_descriptions: bool,
}
impl Default for ParseOptions {
  fn default() -> Self {
    Self {
      register_properties: PropertySet::all(),
      field_properties: PropertySet::ACCESS,
      address_block_properties: PropertySet::PROTECTION,
      sau_regions_config_properties: PropertySet::PROTECTION,
      require_descriptions: false,
    }
  }
}
impl ParseOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register_properties(mut self, properties: PropertySet) -> Self {
    self.register_properties = properties;
    self
  }

  pub fn field_properties(mut self, properties: PropertySet) -> Self {
    self.field_properties = properties;
    self
  }

  pub fn address_block_properties(mut self, properties: PropertySet) -> Self {
    self.address_block_properties = properties;
    self
  }

  pub fn sau_regions_config_properties(mut self, properties: PropertySet) -> Self {
    self.sau_regions_config_properties = properties;
    self
  }

  pub fn require_descriptions(mut self, require: bool) -> Self {
    self.require_descriptions = require;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::ParseOptions;
  use crate::properties::PropertySet;

  #[test]
  fn defaults_inherit_whole_group_for_registers() {
    let options = ParseOptions::default();

    assert_eq!(PropertySet::all(), options.register_properties);
    assert_eq!(PropertySet::ACCESS, options.field_properties);
    assert!(!options.require_descriptions);
  }

  #[test]
  fn setters_override_defaults() {
    let options = ParseOptions::new()
      .register_properties(PropertySet::SIZE | PropertySet::ACCESS | PropertySet::PROTECTION)
      .require_descriptions(true);

    assert!(!options.register_properties.contains(PropertySet::RESET_VALUE));
    assert!(options.require_descriptions);
  }
}
