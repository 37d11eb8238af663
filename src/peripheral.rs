use crate::{
  clean_whitespace_opt,
  derive::Derivable,
  dim::{self, Repeatable},
  error::{SvdResolverError, SvdResolverResult},
  node::{self, SourceNode, SvdEnum},
  options::ParseOptions,
  properties::PropertySet,
  tree::{ElementId, ElementKind, ElementSpec},
};

/// What an address block is used for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddressBlockUsageSpec {
  Registers,
  Buffer,
  Reserved,
}
impl SvdEnum for AddressBlockUsageSpec {
  fn from_token(token: &str) -> Option<Self> {
    match token {
      "registers" => Some(AddressBlockUsageSpec::Registers),
      "buffer" => Some(AddressBlockUsageSpec::Buffer),
      "reserved" => Some(AddressBlockUsageSpec::Reserved),
      _ => None,
    }
  }
}
impl Default for AddressBlockUsageSpec {
  fn default() -> Self {
    AddressBlockUsageSpec::Registers
  }
}

/// Describes an address range uniquely mapped to a peripheral. Its protection lives on the
/// element and is inherited from the peripheral when unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressBlockSpec {
  /// The start address of the address block relative to the peripheral's base address.
  pub offset: u64,

  /// The number of address unit bits covered by this address block. The end of an address block is
  /// the sum of the peripheral's base address and the address block's offset and size.
  pub size: u64,

  pub usage: AddressBlockUsageSpec,
}
impl ElementSpec for AddressBlockSpec {
  const TAG: &'static str = "addressBlock";
  const NAME_REQUIRED: bool = false;
  const LOCAL_PROPERTIES: PropertySet = PropertySet::PROTECTION;

  fn inheritable(options: &ParseOptions) -> PropertySet {
    options.address_block_properties
  }

  fn wrap(self) -> ElementKind {
    ElementKind::AddressBlock(self)
  }

  fn unwrap_ref(kind: &ElementKind) -> Option<&Self> {
    match kind {
      ElementKind::AddressBlock(s) => Some(s),
      _ => None,
    }
  }

  fn unwrap_mut(kind: &mut ElementKind) -> Option<&mut Self> {
    match kind {
      ElementKind::AddressBlock(s) => Some(s),
      _ => None,
    }
  }

  fn parse_local<N: SourceNode>(&mut self, node: &N) -> SvdResolverResult<()> {
    self.offset = node::mandatory(node::integer(node, "offset")?, node.tag(), "offset")?;
    self.size = node::mandatory(node::integer(node, "size")?, node.tag(), "size")?;
    self.usage = node::mandatory(node::enumeration(node, "usage")?, node.tag(), "usage")?;
    Ok(())
  }
}

/// Describes an interrupt that exists on a peripheral.
#[derive(Debug, Clone, PartialEq)]
pub struct InterruptSpec {
  /// The unique name of the interrupt.
  pub name: String,

  /// Overview of the interrupt's purpose and function.
  pub description: Option<String>,

  /// The index value of the interrupt.
  pub value: u32,
}
impl InterruptSpec {
  pub(crate) fn parse<N: SourceNode>(node: &N) -> SvdResolverResult<Self> {
    Ok(Self {
      name: node::mandatory_text(node, "name")?,
      description: clean_whitespace_opt(node::text(node, "description"))?,
      value: node::mandatory(node::integer_u32(node, "value")?, node.tag(), "value")?,
    })
  }
}

/// Describes a peripheral on a device. The name and the default register properties live on the
/// element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeripheralSpec {
  /// The version of the peripheral description.
  pub version: Option<String>,

  /// Overview of the purpose and functionality of the peripheral.
  pub description: Option<String>,

  /// Name of the C type generated for an array of peripherals.
  pub dim_name: Option<String>,

  /// Peripheral occupying the same address range as this one.
  pub alternate_peripheral: Option<String>,

  /// Name of the group to which this peripheral belongs. This is optional and is mostly
  /// intended to visually group the peripheral with related peripherals in documentation
  /// and user interfaces.
  pub group_name: Option<String>,

  pub prepend_to_name: Option<String>,

  pub append_to_name: Option<String>,

  /// Name of the C struct generated for the peripheral.
  pub header_struct_name: Option<String>,

  /// C expression that must hold for the peripheral to be accessible.
  pub disable_condition: Option<String>,

  /// Lowest address reserved or used by the peripheral.
  pub base_address: u64,

  /// Interrupts that exist on this peripheral. Never taken over from a derivation source.
  pub interrupts: Vec<InterruptSpec>,

  /// Address ranges uniquely mapped to this peripheral.
  pub address_blocks: Vec<ElementId>,

  /// Top-level register clusters that exist on this peripheral. Clusters may contain registers
  /// or other clusters.
  pub clusters: Vec<ElementId>,

  /// Top-level registers that exist on this peripheral.
  pub registers: Vec<ElementId>,
}
impl PeripheralSpec {
  pub fn interrupt(&self, name: &str) -> Option<&InterruptSpec> {
    self.interrupts.iter().find(|i| i.name == name)
  }
}
impl Derivable for PeripheralSpec {
  fn inherit_from(&mut self, source: &Self) {
    self.version = source.version.clone();
    self.description = source.description.clone();
    self.dim_name = source.dim_name.clone();
    self.alternate_peripheral = source.alternate_peripheral.clone();
    self.group_name = source.group_name.clone();
    self.prepend_to_name = source.prepend_to_name.clone();
    self.append_to_name = source.append_to_name.clone();
    self.header_struct_name = source.header_struct_name.clone();
    self.disable_condition = source.disable_condition.clone();
    self.base_address = source.base_address;
  }
}
impl Repeatable for PeripheralSpec {
  fn apply_offset(&mut self, delta: u32) -> SvdResolverResult<()> {
    self.base_address = self
      .base_address
      .checked_add(u64::from(delta))
      .ok_or_else(|| {
        SvdResolverError::schema(
          Self::TAG,
          format!("base address {:#x} moved by {:#x} overflows", self.base_address, delta),
        )
      })?;
    Ok(())
  }

  fn substitute_index(&mut self, index: &str) {
    dim::substitute_opt(&mut self.description, index);
    dim::substitute_opt(&mut self.dim_name, index);
    dim::substitute_opt(&mut self.header_struct_name, index);
  }
}
impl ElementSpec for PeripheralSpec {
  const TAG: &'static str = "peripheral";
  const LOCAL_PROPERTIES: PropertySet = PropertySet::all();

  fn inheritable(options: &ParseOptions) -> PropertySet {
    options.register_properties
  }

  fn wrap(self) -> ElementKind {
    ElementKind::Peripheral(self)
  }

  fn unwrap_ref(kind: &ElementKind) -> Option<&Self> {
    match kind {
      ElementKind::Peripheral(s) => Some(s),
      _ => None,
    }
  }

  fn unwrap_mut(kind: &mut ElementKind) -> Option<&mut Self> {
    match kind {
      ElementKind::Peripheral(s) => Some(s),
      _ => None,
    }
  }

  fn parse_local<N: SourceNode>(&mut self, node: &N) -> SvdResolverResult<()> {
    let texts = [
      ("version", &mut self.version),
      ("dimName", &mut self.dim_name),
      ("alternatePeripheral", &mut self.alternate_peripheral),
      ("groupName", &mut self.group_name),
      ("prependToName", &mut self.prepend_to_name),
      ("appendToName", &mut self.append_to_name),
      ("headerStructName", &mut self.header_struct_name),
      ("disableCondition", &mut self.disable_condition),
    ];
    for (tag, target) in texts {
      if let Some(text) = node::text(node, tag) {
        *target = Some(text);
      }
    }

    if let Some(description) = clean_whitespace_opt(node::text(node, "description"))? {
      self.description = Some(description);
    }
    if let Some(base_address) = node::integer(node, "baseAddress")? {
      self.base_address = base_address;
    }

    self.interrupts = node
      .children("interrupt")
      .into_iter()
      .map(InterruptSpec::parse)
      .collect::<SvdResolverResult<Vec<InterruptSpec>>>()?;

    Ok(())
  }

  fn validate<N: SourceNode>(
    &self,
    node: &N,
    derived: bool,
    options: &ParseOptions,
  ) -> SvdResolverResult<()> {
    if let Some(registers) = node.child("registers") {
      if registers.children("register").is_empty() && registers.children("cluster").is_empty() {
        return Err(SvdResolverError::schema(
          node.tag(),
          "<registers> needs at least one register or cluster",
        ));
      }
    }
    if !derived {
      node::mandatory_text(node, "baseAddress")?;
      if options.require_descriptions {
        node::mandatory(self.description.as_ref(), node.tag(), "description")?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::{AddressBlockSpec, AddressBlockUsageSpec, PeripheralSpec};
  use crate::{
    derive::Derivable,
    dim::{DimInstance, Repeatable},
    options::ParseOptions,
    properties::{PropertyGroup, PropertySet},
    tree::ElementSpec,
    ProtectionSpec,
  };
  use xmltree::Element;

  #[test]
  fn can_parse_local_content() {
    let el: Element = Element::parse(
      r##"
      <peripheral>
        <name>TIMER0</name>
        <version>1.0</version>
        <description>A timer</description>
        <groupName>TIMER</groupName>
        <prependToName>T0_</prependToName>
        <baseAddress>0x40010000</baseAddress>
        <size>32</size>
        <interrupt>
          <name>TIMER0</name>
          <description>Timer 0 overflow</description>
          <value>4</value>
        </interrupt>
        <interrupt>
          <name>TIMER0_CC</name>
          <value>5</value>
        </interrupt>
      </peripheral>
      "##
        .as_bytes(),
    )
    .unwrap();

    let mut ps = PeripheralSpec::default();
    ps.parse_local(&el).unwrap();

    assert_eq!("1.0", ps.version.as_ref().unwrap());
    assert_eq!("TIMER", ps.group_name.as_ref().unwrap());
    assert_eq!("T0_", ps.prepend_to_name.as_ref().unwrap());
    assert_eq!(0x4001_0000, ps.base_address);
    assert_eq!(2, ps.interrupts.len());
    assert_eq!(5, ps.interrupt("TIMER0_CC").unwrap().value);
    assert!(ps.validate(&el, false, &ParseOptions::default()).is_ok());
  }

  #[test]
  fn derivation_leaves_interrupts_behind() {
    let el: Element = Element::parse(
      r##"
      <peripheral derivedFrom="TIMER0">
        <name>TIMER1</name>
        <baseAddress>0x40011000</baseAddress>
      </peripheral>
      "##
        .as_bytes(),
    )
    .unwrap();

    let mut source = PeripheralSpec::default();
    source.description = Some("A timer".to_owned());
    source.base_address = 0x4001_0000;
    source.interrupts = vec![super::InterruptSpec {
      name: "TIMER0".to_owned(),
      description: None,
      value: 4,
    }];

    let mut ps = PeripheralSpec::default();
    ps.inherit_from(&source);
    ps.parse_local(&el).unwrap();

    assert_eq!("A timer", ps.description.unwrap());
    assert_eq!(0x4001_1000, ps.base_address);
    assert!(ps.interrupts.is_empty());
  }

  #[test]
  fn repeats_by_base_address() {
    let mut ps = PeripheralSpec {
      base_address: 0x4000_0000,
      header_struct_name: Some("GPIO%s".to_owned()),
      ..PeripheralSpec::default()
    };

    ps.repeat(&DimInstance {
      index: Some("C".to_owned()),
      offset: 0x800,
      array: None,
    })
    .unwrap();

    assert_eq!(0x4000_0800, ps.base_address);
    assert_eq!("GPIOC", ps.header_struct_name.unwrap());
  }

  #[test]
  fn base_address_is_mandatory() {
    let el: Element = Element::parse("<peripheral><name>P</name></peripheral>".as_bytes()).unwrap();

    assert!(PeripheralSpec::default()
      .validate(&el, false, &ParseOptions::default())
      .is_err());
  }

  #[test]
  fn parses_address_block() {
    let el: Element = Element::parse(
      r##"
      <addressBlock>
        <offset>0</offset>
        <size>0x400</size>
        <usage>registers</usage>
        <protection>n</protection>
      </addressBlock>
      "##
        .as_bytes(),
    )
    .unwrap();

    let mut ab = AddressBlockSpec::default();
    ab.parse_local(&el).unwrap();
    let properties = PropertyGroup::parse(&el, AddressBlockSpec::LOCAL_PROPERTIES).unwrap();

    assert_eq!(0x400, ab.size);
    assert_eq!(AddressBlockUsageSpec::Registers, ab.usage);
    assert_eq!(Some(ProtectionSpec::NonSecure), properties.protection);
    assert!(properties.size.is_none());
    assert_eq!(
      PropertySet::PROTECTION,
      AddressBlockSpec::inheritable(&ParseOptions::default())
    );
  }
}
