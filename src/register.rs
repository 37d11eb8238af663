use crate::{
  clean_whitespace_opt,
  derive::Derivable,
  dim::{self, Repeatable},
  error::{SvdResolverError, SvdResolverResult},
  node::{self, SourceNode},
  options::ParseOptions,
  properties::PropertySet,
  tree::{ElementId, ElementKind, ElementSpec},
  value::{ModifiedWriteValuesSpec, ReadActionSpec, WriteConstraintSpec},
};

/// Describes a register. Registers may be top-level constructs of a peripheral or may be nested
/// within register clusters. The name and the property group live on the element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterSpec {
  /// Short name to display instead of the register name.
  pub display_name: Option<String>,

  /// Description of the details of the register. May describe its purpose, operation, and effects
  /// on other parts of the device.
  pub description: Option<String>,

  /// Name of the C type generated for an array of registers.
  pub dim_name: Option<String>,

  /// Group of registers this one is an alternative for.
  pub alternate_group: Option<String>,

  /// Register that occupies the same address as this one.
  pub alternate_register: Option<String>,

  /// Register's starting address relative to its owner.
  pub address_offset: u32,

  /// C data type to use for the register in generated headers.
  pub data_type: Option<String>,

  /// Constraints for writing values to the register.
  pub write_constraint: Option<WriteConstraintSpec>,

  /// Default modified write values for fields on this register
  pub modified_write_values: Option<ModifiedWriteValuesSpec>,

  /// Side effect of reading the register.
  pub read_action: Option<ReadActionSpec>,

  /// The fields that exist on the register.
  pub fields: Vec<ElementId>,
}
impl Derivable for RegisterSpec {
  fn inherit_from(&mut self, source: &Self) {
    self.display_name = source.display_name.clone();
    self.description = source.description.clone();
    self.dim_name = source.dim_name.clone();
    self.alternate_group = source.alternate_group.clone();
    self.alternate_register = source.alternate_register.clone();
    self.address_offset = source.address_offset;
    self.data_type = source.data_type.clone();
    self.write_constraint = source.write_constraint.clone();
    self.modified_write_values = source.modified_write_values;
    self.read_action = source.read_action;
  }
}
impl Repeatable for RegisterSpec {
  fn apply_offset(&mut self, delta: u32) -> SvdResolverResult<()> {
    self.address_offset = dim::shift(Self::TAG, self.address_offset, delta)?;
    Ok(())
  }

  fn substitute_index(&mut self, index: &str) {
    dim::substitute_opt(&mut self.display_name, index);
    dim::substitute_opt(&mut self.description, index);
    dim::substitute_opt(&mut self.dim_name, index);
  }
}
impl ElementSpec for RegisterSpec {
  const TAG: &'static str = "register";
  const LOCAL_PROPERTIES: PropertySet = PropertySet::all();

  fn inheritable(options: &ParseOptions) -> PropertySet {
    options.register_properties
  }

  fn wrap(self) -> ElementKind {
    ElementKind::Register(self)
  }

  fn unwrap_ref(kind: &ElementKind) -> Option<&Self> {
    match kind {
      ElementKind::Register(s) => Some(s),
      _ => None,
    }
  }

  fn unwrap_mut(kind: &mut ElementKind) -> Option<&mut Self> {
    match kind {
      ElementKind::Register(s) => Some(s),
      _ => None,
    }
  }

  fn parse_local<N: SourceNode>(&mut self, node: &N) -> SvdResolverResult<()> {
    if let Some(display_name) = node::text(node, "displayName") {
      self.display_name = Some(display_name);
    }
    if let Some(description) = clean_whitespace_opt(node::text(node, "description"))? {
      self.description = Some(description);
    }
    if let Some(dim_name) = node::text(node, "dimName") {
      self.dim_name = Some(dim_name);
    }
    if let Some(group) = node::text(node, "alternateGroup") {
      self.alternate_group = Some(group);
    }
    if let Some(register) = node::text(node, "alternateRegister") {
      self.alternate_register = Some(register);
    }
    if let Some(offset) = node::integer_u32(node, "addressOffset")? {
      self.address_offset = offset;
    }
    if let Some(data_type) = node::text(node, "dataType") {
      self.data_type = Some(data_type);
    }
    if let Some(wc) = WriteConstraintSpec::parse(node)? {
      self.write_constraint = Some(wc);
    }
    if let Some(mwv) = node::enumeration(node, "modifiedWriteValues")? {
      self.modified_write_values = Some(mwv);
    }
    if let Some(ra) = node::enumeration(node, "readAction")? {
      self.read_action = Some(ra);
    }
    Ok(())
  }

  fn validate<N: SourceNode>(
    &self,
    node: &N,
    derived: bool,
    options: &ParseOptions,
  ) -> SvdResolverResult<()> {
    if let Some(fields) = node.child("fields") {
      if fields.children("field").is_empty() {
        return Err(SvdResolverError::schema(
          node.tag(),
          "<fields> needs at least one field",
        ));
      }
    }
    if derived {
      return Ok(());
    }
    node::mandatory_text(node, "addressOffset")?;
    if options.require_descriptions {
      node::mandatory(self.description.as_ref(), node.tag(), "description")?;
    }
    Ok(())
  }
}
