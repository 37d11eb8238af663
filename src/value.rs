use crate::{
  derive::Derivable,
  error::{SvdResolverError, SvdResolverResult},
  node::{self, SourceNode, SvdEnum},
  options::ParseOptions,
  properties::PropertySet,
  tree::{ElementKind, ElementSpec},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModifiedWriteValuesSpec {
  OneToClear,
  OneToSet,
  OneToToggle,
  ZeroToClear,
  ZeroToSet,
  ZeroToToggle,
  Clear,
  Set,
  Modify,
}
impl SvdEnum for ModifiedWriteValuesSpec {
  fn from_token(token: &str) -> Option<Self> {
    match token {
      "oneToClear" => Some(ModifiedWriteValuesSpec::OneToClear),
      "oneToSet" => Some(ModifiedWriteValuesSpec::OneToSet),
      "oneToToggle" => Some(ModifiedWriteValuesSpec::OneToToggle),

      "zeroToClear" => Some(ModifiedWriteValuesSpec::ZeroToClear),
      "zeroToSet" => Some(ModifiedWriteValuesSpec::ZeroToSet),
      "zeroToToggle" => Some(ModifiedWriteValuesSpec::ZeroToToggle),

      "clear" => Some(ModifiedWriteValuesSpec::Clear),
      "set" => Some(ModifiedWriteValuesSpec::Set),
      "modify" => Some(ModifiedWriteValuesSpec::Modify),
      _ => None,
    }
  }
}

/// Side effect of reading a register or field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadActionSpec {
  Clear,
  Set,
  Modify,
  ModifyExternal,
}
impl SvdEnum for ReadActionSpec {
  fn from_token(token: &str) -> Option<Self> {
    match token {
      "clear" => Some(ReadActionSpec::Clear),
      "set" => Some(ReadActionSpec::Set),
      "modify" => Some(ReadActionSpec::Modify),
      "modifyExternal" => Some(ReadActionSpec::ModifyExternal),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteConstraintSpec {
  UseEnumeratedValues,
  Range(WriteConstraintRangeSpec),
  WriteAsRead,
  Unconstrained,
}
impl WriteConstraintSpec {
  /// Reads the `writeConstraint` child of `node`, if any.
  pub(crate) fn parse<N: SourceNode>(node: &N) -> SvdResolverResult<Option<Self>> {
    let wc = match node.child("writeConstraint") {
      Some(wc) => wc,
      None => return Ok(None),
    };

    if node::boolean(wc, "writeAsRead")? == Some(true) {
      return Ok(Some(WriteConstraintSpec::WriteAsRead));
    }
    if node::boolean(wc, "useEnumeratedValues")? == Some(true) {
      return Ok(Some(WriteConstraintSpec::UseEnumeratedValues));
    }
    if let Some(range) = wc.child("range") {
      return Ok(Some(WriteConstraintSpec::Range(WriteConstraintRangeSpec {
        min: node::mandatory(node::integer(range, "minimum")?, range.tag(), "minimum")?,
        max: node::mandatory(node::integer(range, "maximum")?, range.tag(), "maximum")?,
      })));
    }

    Ok(Some(WriteConstraintSpec::Unconstrained))
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteConstraintRangeSpec {
  pub min: u64,
  pub max: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnumeratedValueUsageSpec {
  Read,
  Write,
  ReadWrite,
}
impl EnumeratedValueUsageSpec {
  pub fn can_read(&self) -> bool {
    *self != EnumeratedValueUsageSpec::Write
  }

  pub fn can_write(&self) -> bool {
    *self != EnumeratedValueUsageSpec::Read
  }
}
impl Default for EnumeratedValueUsageSpec {
  fn default() -> Self {
    EnumeratedValueUsageSpec::ReadWrite
  }
}
impl SvdEnum for EnumeratedValueUsageSpec {
  fn from_token(token: &str) -> Option<Self> {
    match token {
      "read" => Some(EnumeratedValueUsageSpec::Read),
      "write" => Some(EnumeratedValueUsageSpec::Write),
      "read-write" => Some(EnumeratedValueUsageSpec::ReadWrite),
      _ => None,
    }
  }
}

/// A set of named values of a field. The optional set name is the element name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumeratedValueSetSpec {
  /// Identifier used for the enumeration in generated headers.
  pub header_enum_name: Option<String>,

  /// Whether the values apply to reads, writes or both.
  pub usage: EnumeratedValueUsageSpec,

  pub values: Vec<EnumeratedValueSpec>,
}
impl EnumeratedValueSetSpec {
  /// The value named `name`, if any.
  pub fn value(&self, name: &str) -> Option<&EnumeratedValueSpec> {
    self.values.iter().find(|v| v.name == name)
  }

  /// The name matching a raw field value: an exact value if one exists, else the default.
  pub fn name_of(&self, raw: u64) -> Option<&str> {
    self
      .values
      .iter()
      .find(|v| v.value == EnumeratedValueValueSpec::Value(raw))
      .or_else(|| {
        self
          .values
          .iter()
          .find(|v| v.value == EnumeratedValueValueSpec::Default)
      })
      .map(|v| v.name.as_str())
  }
}
impl Derivable for EnumeratedValueSetSpec {
  fn inherit_from(&mut self, source: &Self) {
    self.header_enum_name = source.header_enum_name.clone();
    self.usage = source.usage;
    self.values = source.values.clone();
  }
}
impl ElementSpec for EnumeratedValueSetSpec {
  const TAG: &'static str = "enumeratedValues";
  const NAME_REQUIRED: bool = false;
  const LOCAL_PROPERTIES: PropertySet = PropertySet::empty();

  fn inheritable(_options: &ParseOptions) -> PropertySet {
    PropertySet::empty()
  }

  fn wrap(self) -> ElementKind {
    ElementKind::EnumeratedValues(self)
  }

  fn unwrap_ref(kind: &ElementKind) -> Option<&Self> {
    match kind {
      ElementKind::EnumeratedValues(s) => Some(s),
      _ => None,
    }
  }

  fn unwrap_mut(kind: &mut ElementKind) -> Option<&mut Self> {
    match kind {
      ElementKind::EnumeratedValues(s) => Some(s),
      _ => None,
    }
  }

  fn parse_local<N: SourceNode>(&mut self, node: &N) -> SvdResolverResult<()> {
    if let Some(name) = node::text(node, "headerEnumName") {
      self.header_enum_name = Some(name);
    }
    if let Some(usage) = node::enumeration(node, "usage")? {
      self.usage = usage;
    }

    for v in node.children("enumeratedValue") {
      let value = EnumeratedValueSpec::parse(v)?;
      match self.values.iter_mut().find(|e| e.name == value.name) {
        Some(existing) => *existing = value,
        None => self.values.push(value),
      }
    }

    Ok(())
  }

  fn validate<N: SourceNode>(
    &self,
    node: &N,
    _derived: bool,
    _options: &ParseOptions,
  ) -> SvdResolverResult<()> {
    if self.values.is_empty() {
      return Err(SvdResolverError::schema(
        node.tag(),
        "at least one enumeratedValue is required",
      ));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumeratedValueSpec {
  pub name: String,
  pub description: Option<String>,
  pub value: EnumeratedValueValueSpec,
}
impl EnumeratedValueSpec {
  pub(crate) fn parse<N: SourceNode>(node: &N) -> SvdResolverResult<Self> {
    let name = node::mandatory_text(node, "name")?;
    let value = match (node::integer(node, "value")?, node::boolean(node, "isDefault")?) {
      (Some(v), _) => EnumeratedValueValueSpec::Value(v),
      (None, Some(true)) => EnumeratedValueValueSpec::Default,
      (None, None) => {
        return Err(SvdResolverError::schema(
          node.tag(),
          format!("{}: no value and no isDefault tag", name),
        ))
      }
      (None, Some(false)) => {
        return Err(SvdResolverError::schema(
          node.tag(),
          format!("{}: no value where isDefault is false", name),
        ))
      }
    };

    Ok(Self {
      description: crate::clean_whitespace_opt(node::text(node, "description"))?,
      name,
      value,
    })
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumeratedValueValueSpec {
  Value(u64),
  Default,
}
