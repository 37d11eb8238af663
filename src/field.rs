use crate::{
  bit_range::{self, BitRange},
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

/// Describes a field on a register. The name and the access right live on the element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSpec {
  /// Description of the field's usage, purpose, and/or operation.
  pub description: Option<String>,

  /// Name of the C type generated for an array of fields.
  pub dim_name: Option<String>,

  /// The position of this field within its register.
  pub bit_range: BitRange,

  /// Constraints for writing values to the field.
  pub write_constraint: Option<WriteConstraintSpec>,

  /// Describes the manipulation of data written to this field. If `None`, the value written to
  /// the field is the value stored in the field.
  pub modified_write_values: Option<ModifiedWriteValuesSpec>,

  /// Side effect of reading the field.
  pub read_action: Option<ReadActionSpec>,

  /// Enumerated value sets of the field.
  pub enumerated_values: Vec<ElementId>,
}
impl FieldSpec {
  /// The bit mask for reading/writing this field on the parent register
  pub fn mask(&self) -> u64 {
    self.bit_range.mask()
  }

  pub fn offset(&self) -> u32 {
    self.bit_range.offset
  }

  pub fn width(&self) -> u32 {
    self.bit_range.width
  }
}
impl Derivable for FieldSpec {
  fn inherit_from(&mut self, source: &Self) {
    self.description = source.description.clone();
    self.dim_name = source.dim_name.clone();
    self.bit_range = source.bit_range;
    self.write_constraint = source.write_constraint.clone();
    self.modified_write_values = source.modified_write_values;
    self.read_action = source.read_action;
  }
}
impl Repeatable for FieldSpec {
  fn apply_offset(&mut self, delta: u32) -> SvdResolverResult<()> {
    let offset = dim::shift(Self::TAG, self.bit_range.offset, delta)?;
    dim::shift(Self::TAG, offset, self.bit_range.width)?;
    self.bit_range.offset = offset;
    Ok(())
  }

  fn substitute_index(&mut self, index: &str) {
    dim::substitute_opt(&mut self.description, index);
    dim::substitute_opt(&mut self.dim_name, index);
  }
}
impl ElementSpec for FieldSpec {
  const TAG: &'static str = "field";
  const LOCAL_PROPERTIES: PropertySet = PropertySet::ACCESS;

  fn inheritable(options: &ParseOptions) -> PropertySet {
    options.field_properties
  }

  fn wrap(self) -> ElementKind {
    ElementKind::Field(self)
  }

  fn unwrap_ref(kind: &ElementKind) -> Option<&Self> {
    match kind {
      ElementKind::Field(s) => Some(s),
      _ => None,
    }
  }

  fn unwrap_mut(kind: &mut ElementKind) -> Option<&mut Self> {
    match kind {
      ElementKind::Field(s) => Some(s),
      _ => None,
    }
  }

  fn parse_local<N: SourceNode>(&mut self, node: &N) -> SvdResolverResult<()> {
    if let Some(description) = clean_whitespace_opt(node::text(node, "description"))? {
      self.description = Some(description);
    }
    if let Some(dim_name) = node::text(node, "dimName") {
      self.dim_name = Some(dim_name);
    }
    if let Some(range) = bit_range::local_bit_range(node)? {
      self.bit_range = range;
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
    if derived {
      return Ok(());
    }
    if bit_range::local_bit_range(node)?.is_none() {
      return Err(SvdResolverError::MissingBitRange {
        field: node::text(node, "name").unwrap_or_else(|| "<unnamed>".to_owned()),
      });
    }
    if options.require_descriptions && self.description.is_none() {
      return Err(SvdResolverError::schema(
        node.tag(),
        "element 'description' is mandatory, but not present",
      ));
    }
    Ok(())
  }
}
