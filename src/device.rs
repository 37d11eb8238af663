use tracing::debug;

use crate::{
  builder::Builder,
  clean_whitespace_opt,
  error::{SvdResolverError, SvdResolverResult},
  node::{self, SourceNode, SvdEnum},
  options::ParseOptions,
  properties::{self, Property, PropertyGroup, PropertySet, PropertyValue},
  tree::{Element, ElementId, ElementKind, ElementSpec, Tree},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndianSpec {
  Little,
  Big,
  Selectable,
  Other,
}
impl SvdEnum for EndianSpec {
  fn from_token(token: &str) -> Option<Self> {
    match token {
      "little" => Some(EndianSpec::Little),
      "big" => Some(EndianSpec::Big),
      "selectable" => Some(EndianSpec::Selectable),
      "other" => Some(EndianSpec::Other),
      _ => None,
    }
  }
}
impl Default for EndianSpec {
  fn default() -> Self {
    EndianSpec::Little
  }
}

/// Describes the processor core of the device. The name lives on the element.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuSpec {
  pub revision: String,
  pub endian: EndianSpec,
  pub mpu_present: bool,
  pub fpu_present: bool,
  pub fpu_double_precision: bool,
  pub dsp_present: bool,
  pub icache_present: bool,
  pub dcache_present: bool,
  pub itcm_present: bool,
  pub dtcm_present: bool,
  pub vtor_present: bool,
  pub nvic_priority_bits: u32,
  pub has_vendor_systick: bool,
  pub device_num_interrupts: Option<u32>,
  pub sau_num_regions: Option<u32>,
  pub sau_regions_config: Option<ElementId>,
}
impl Default for CpuSpec {
  fn default() -> Self {
    Self {
      revision: String::new(),
      endian: EndianSpec::default(),
      mpu_present: false,
      fpu_present: false,
      fpu_double_precision: false,
      dsp_present: false,
      icache_present: false,
      dcache_present: false,
      itcm_present: false,
      dtcm_present: false,
      vtor_present: true,
      nvic_priority_bits: 0,
      has_vendor_systick: false,
      device_num_interrupts: None,
      sau_num_regions: None,
      sau_regions_config: None,
    }
  }
}
impl ElementSpec for CpuSpec {
  const TAG: &'static str = "cpu";
  const LOCAL_PROPERTIES: PropertySet = PropertySet::empty();

  fn inheritable(_options: &ParseOptions) -> PropertySet {
    PropertySet::empty()
  }

  fn wrap(self) -> ElementKind {
    ElementKind::Cpu(self)
  }

  fn unwrap_ref(kind: &ElementKind) -> Option<&Self> {
    match kind {
      ElementKind::Cpu(s) => Some(s),
      _ => None,
    }
  }

  fn unwrap_mut(kind: &mut ElementKind) -> Option<&mut Self> {
    match kind {
      ElementKind::Cpu(s) => Some(s),
      _ => None,
    }
  }

  fn parse_local<N: SourceNode>(&mut self, node: &N) -> SvdResolverResult<()> {
    let tag = node.tag();
    self.revision = node::mandatory_text(node, "revision")?;
    self.endian = node::mandatory(node::enumeration(node, "endian")?, tag, "endian")?;
    self.mpu_present = node::mandatory(node::boolean(node, "mpuPresent")?, tag, "mpuPresent")?;
    self.fpu_present = node::mandatory(node::boolean(node, "fpuPresent")?, tag, "fpuPresent")?;
    self.fpu_double_precision = node::boolean(node, "fpuDP")?.unwrap_or(false);
    self.dsp_present = node::boolean(node, "dspPresent")?.unwrap_or(false);
    self.icache_present = node::boolean(node, "icachePresent")?.unwrap_or(false);
    self.dcache_present = node::boolean(node, "dcachePresent")?.unwrap_or(false);
    self.itcm_present = node::boolean(node, "itcmPresent")?.unwrap_or(false);
    self.dtcm_present = node::boolean(node, "dtcmPresent")?.unwrap_or(false);
    self.vtor_present = node::boolean(node, "vtorPresent")?.unwrap_or(true);
    self.nvic_priority_bits =
      node::mandatory(node::integer_u32(node, "nvicPrioBits")?, tag, "nvicPrioBits")?;
    self.has_vendor_systick = node::mandatory(
      node::boolean(node, "vendorSystickConfig")?,
      tag,
      "vendorSystickConfig",
    )?;
    self.device_num_interrupts = node::integer_u32(node, "deviceNumInterrupts")?;
    self.sau_num_regions = node::integer_u32(node, "sauNumRegions")?;
    Ok(())
  }
}

/// Access a SAU region grants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SauAccessSpec {
  NonSecureCallable,
  NonSecure,
}
impl SvdEnum for SauAccessSpec {
  fn from_token(token: &str) -> Option<Self> {
    match token {
      "c" => Some(SauAccessSpec::NonSecureCallable),
      "n" => Some(SauAccessSpec::NonSecure),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SauRegionSpec {
  pub name: Option<String>,
  pub enabled: bool,
  pub base: u64,
  pub limit: u64,
  pub access: SauAccessSpec,
}
impl SauRegionSpec {
  pub(crate) fn parse<N: SourceNode>(node: &N) -> SvdResolverResult<Self> {
    Ok(Self {
      name: node.attribute("name"),
      enabled: node::boolean_attribute(node, "enabled")?.unwrap_or(true),
      base: node::mandatory(node::integer(node, "base")?, node.tag(), "base")?,
      limit: node::mandatory(node::integer(node, "limit")?, node.tag(), "limit")?,
      access: node::mandatory(node::enumeration(node, "access")?, node.tag(), "access")?,
    })
  }
}

/// Preconfigured Secure Attribution Unit regions. The `protectionWhenDisabled` attribute is the
/// element's protection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SauRegionsConfigSpec {
  pub enabled: Option<bool>,
  pub regions: Vec<SauRegionSpec>,
}
impl ElementSpec for SauRegionsConfigSpec {
  const TAG: &'static str = "sauRegionsConfig";
  const NAME_REQUIRED: bool = false;
  const LOCAL_PROPERTIES: PropertySet = PropertySet::PROTECTION;

  fn inheritable(options: &ParseOptions) -> PropertySet {
    options.sau_regions_config_properties
  }

  fn local_properties<N: SourceNode>(node: &N) -> SvdResolverResult<PropertyGroup> {
    Ok(PropertyGroup {
      protection: node::enumeration_attribute(node, "protectionWhenDisabled")?,
      ..PropertyGroup::default()
    })
  }

  fn wrap(self) -> ElementKind {
    ElementKind::SauRegionsConfig(self)
  }

  fn unwrap_ref(kind: &ElementKind) -> Option<&Self> {
    match kind {
      ElementKind::SauRegionsConfig(s) => Some(s),
      _ => None,
    }
  }

  fn unwrap_mut(kind: &mut ElementKind) -> Option<&mut Self> {
    match kind {
      ElementKind::SauRegionsConfig(s) => Some(s),
      _ => None,
    }
  }

  fn parse_local<N: SourceNode>(&mut self, node: &N) -> SvdResolverResult<()> {
    self.enabled = node::boolean_attribute(node, "enabled")?;
    self.regions = node
      .children("region")
      .into_iter()
      .map(SauRegionSpec::parse)
      .collect::<SvdResolverResult<Vec<SauRegionSpec>>>()?;
    Ok(())
  }
}

/// The outermost frame of a description. The name and the default register properties live on
/// the element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSpec {
  pub schema_version: Option<String>,
  pub vendor: Option<String>,
  pub vendor_id: Option<String>,
  pub series: Option<String>,
  pub version: String,
  pub description: String,
  pub license_text: Option<String>,
  pub header_system_filename: Option<String>,
  pub header_definitions_prefix: Option<String>,
  pub address_unit_bits: u32,
  pub width: u32,
  pub cpu: Option<ElementId>,
  pub peripherals: Vec<ElementId>,
}
impl ElementSpec for DeviceSpec {
  const TAG: &'static str = "device";
  const LOCAL_PROPERTIES: PropertySet = PropertySet::all();

  fn inheritable(_options: &ParseOptions) -> PropertySet {
    PropertySet::empty()
  }

  fn wrap(self) -> ElementKind {
    ElementKind::Device(self)
  }

  fn unwrap_ref(kind: &ElementKind) -> Option<&Self> {
    match kind {
      ElementKind::Device(s) => Some(s),
      _ => None,
    }
  }

  fn unwrap_mut(kind: &mut ElementKind) -> Option<&mut Self> {
    match kind {
      ElementKind::Device(s) => Some(s),
      _ => None,
    }
  }

  fn parse_local<N: SourceNode>(&mut self, node: &N) -> SvdResolverResult<()> {
    let tag = node.tag();
    self.schema_version = node.attribute("schemaVersion");
    self.vendor = node::text(node, "vendor");
    self.vendor_id = node::text(node, "vendorID");
    self.series = node::text(node, "series");
    self.version = node::mandatory_text(node, "version")?;
    self.description = clean_whitespace_opt(Some(node::mandatory_text(node, "description")?))?
      .unwrap_or_default();
    self.license_text = node::text(node, "licenseText").map(|text| {
      text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("{}\n", line))
        .collect()
    });
    self.header_system_filename = node::text(node, "headerSystemFilename");
    self.header_definitions_prefix = node::text(node, "headerDefinitionsPrefix");
    self.address_unit_bits = node::mandatory(
      node::integer_u32(node, "addressUnitBits")?,
      tag,
      "addressUnitBits",
    )?;
    self.width = node::mandatory(node::integer_u32(node, "width")?, tag, "width")?;
    Ok(())
  }

  fn validate<N: SourceNode>(
    &self,
    node: &N,
    _derived: bool,
    _options: &ParseOptions,
  ) -> SvdResolverResult<()> {
    if self.peripherals.is_empty() {
      return Err(SvdResolverError::schema(
        node.tag(),
        "at least one element of 'peripheral' is mandatory in 'peripherals'",
      ));
    }
    Ok(())
  }
}

/// A fully resolved description: every element built, derived and expanded. Elements are
/// addressed by `ElementId` and only valid for the device that handed them out.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
  tree: Tree,
  root: ElementId,
}
impl Device {
  pub fn from_xml(xml: &str) -> SvdResolverResult<Self> {
    Self::from_xml_with_options(xml, &ParseOptions::default())
  }

  pub fn from_xml_with_options(xml: &str, options: &ParseOptions) -> SvdResolverResult<Self> {
    let root = xmltree::Element::parse(xml.as_bytes())?;
    Self::parse(&root, options)
  }

  /// Resolves a description from any source node tree. Fails on the first error; no partial
  /// device is returned.
  pub fn parse<N: SourceNode>(node: &N, options: &ParseOptions) -> SvdResolverResult<Self> {
    let (tree, root) = Builder::new(options).build(node)?;
    let device = Self { tree, root };

    debug!(
      "device '{}' resolved with {} peripherals",
      device.name(),
      device.peripherals().len()
    );
    Ok(device)
  }

  pub fn root(&self) -> ElementId {
    self.root
  }

  pub fn name(&self) -> &str {
    self.tree.get(self.root).name().unwrap_or_default()
  }

  pub fn spec(&self) -> Option<&DeviceSpec> {
    self.tree.spec::<DeviceSpec>(self.root)
  }

  pub fn get(&self, id: ElementId) -> Option<&Element> {
    self.tree.try_get(id)
  }

  pub fn cpu(&self) -> Option<&CpuSpec> {
    self
      .spec()
      .and_then(|d| d.cpu)
      .and_then(|id| self.tree.spec::<CpuSpec>(id))
  }

  pub fn peripherals(&self) -> &[ElementId] {
    self
      .spec()
      .map(|d| d.peripherals.as_slice())
      .unwrap_or_default()
  }

  /// Finds a direct child of `container` by name.
  pub fn find(&self, container: ElementId, name: &str) -> Option<ElementId> {
    self.get(container)?;
    self.tree.find(container, name)
  }

  /// Finds an element by its dotted path from the device, e.g. `TIMER0.CR.EN`.
  pub fn find_path(&self, path: &str) -> Option<ElementId> {
    path
      .split('.')
      .try_fold(self.root, |current, segment| self.tree.find(current, segment.trim()))
  }

  /// The dotted path of `id` from the device.
  pub fn path(&self, id: ElementId) -> Option<String> {
    self.get(id)?;
    Some(self.tree.path(id))
  }

  /// The effective value of `property` on `id`. `None` when neither the element nor any owner it
  /// inherits from sets it.
  pub fn resolve(&self, id: ElementId, property: Property) -> Option<PropertyValue> {
    self.get(id)?;
    properties::resolve(&self.tree, id, property)
  }

  /// Like `resolve`, but a property set nowhere is an error.
  pub fn require(&self, id: ElementId, property: Property) -> SvdResolverResult<PropertyValue> {
    self
      .resolve(id, property)
      .ok_or_else(|| SvdResolverError::PropertyNotFound {
        path: self.path(id).unwrap_or_default(),
        property,
      })
  }

  /// Like `resolve`, but falls back to `PropertyGroup::engine_defaults`.
  pub fn resolve_or_default(&self, id: ElementId, property: Property) -> Option<PropertyValue> {
    self
      .resolve(id, property)
      .or_else(|| PropertyGroup::engine_defaults().get(property))
  }

  /// Every member of the property group as `resolve` sees it.
  pub fn effective_properties(&self, id: ElementId) -> PropertyGroup {
    let value = |p| self.resolve(id, p);
    PropertyGroup {
      size: value(Property::Size).and_then(|v| v.as_size()),
      access: value(Property::Access).and_then(|v| v.as_access()),
      protection: value(Property::Protection).and_then(|v| v.as_protection()),
      reset_value: value(Property::ResetValue).and_then(|v| v.as_reset_value()),
      reset_mask: value(Property::ResetMask).and_then(|v| v.as_reset_mask()),
    }
  }

  /// Absolute address of a peripheral, cluster, register or address block. Fields and enumerated
  /// values report the address of their register. `None` when the sum leaves the 64-bit space.
  pub fn address(&self, id: ElementId) -> Option<u64> {
    let mut address = 0u64;
    let mut current = Some(id);

    while let Some(c) = current {
      let element = self.get(c)?;
      address = match element.kind() {
        ElementKind::Peripheral(p) => return address.checked_add(p.base_address),
        ElementKind::Cluster(c) => address.checked_add(u64::from(c.address_offset))?,
        ElementKind::Register(r) => address.checked_add(u64::from(r.address_offset))?,
        ElementKind::AddressBlock(b) => address.checked_add(b.offset)?,
        ElementKind::Field(_) | ElementKind::EnumeratedValues(_) => address,
        _ => return None,
      };
      current = element.owner();
    }

    None
  }

  /// Every register at or below `id`, depth first in document order.
  pub fn registers_of(&self, id: ElementId) -> Vec<ElementId> {
    self.collect(id, |e| e.as_register().is_some())
  }

  /// Every field at or below `id`, depth first in document order.
  pub fn fields_of(&self, id: ElementId) -> Vec<ElementId> {
    self.collect(id, |e| e.as_field().is_some())
  }

  fn collect<F>(&self, id: ElementId, matches: F) -> Vec<ElementId>
  where
    F: Fn(&Element) -> bool + Copy,
  {
    let element = match self.get(id) {
      Some(e) => e,
      None => return Vec::new(),
    };

    let mut found = Vec::new();
    if matches(element) {
      found.push(id);
    }
    for child in self.tree.children(id) {
      found.extend(self.collect(child, matches));
    }
    found
  }
}
