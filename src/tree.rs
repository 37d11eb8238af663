//! Arena holding every element of a device. Elements refer to their owner, their derivation source
//! and their children by `ElementId`; only the arena owns anything.

use crate::{
  cluster::ClusterSpec,
  device::{CpuSpec, DeviceSpec, SauRegionsConfigSpec},
  dim::{DimInstance, DimSpec, Repeatable},
  error::{SvdResolverError, SvdResolverResult},
  field::FieldSpec,
  node::SourceNode,
  options::ParseOptions,
  peripheral::{AddressBlockSpec, PeripheralSpec},
  properties::{PropertyGroup, PropertyInheriting, PropertySet},
  register::RegisterSpec,
  value::EnumeratedValueSetSpec,
};

/// Stable handle of an element within its device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// The kind-specific part of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
  Device(DeviceSpec),
  Cpu(CpuSpec),
  SauRegionsConfig(SauRegionsConfigSpec),
  Peripheral(PeripheralSpec),
  AddressBlock(AddressBlockSpec),
  Cluster(ClusterSpec),
  Register(RegisterSpec),
  Field(FieldSpec),
  EnumeratedValues(EnumeratedValueSetSpec),
}
impl ElementKind {
  /// The SVD tag this kind is read from.
  pub fn tag(&self) -> &'static str {
    match self {
      ElementKind::Device(_) => DeviceSpec::TAG,
      ElementKind::Cpu(_) => CpuSpec::TAG,
      ElementKind::SauRegionsConfig(_) => SauRegionsConfigSpec::TAG,
      ElementKind::Peripheral(_) => PeripheralSpec::TAG,
      ElementKind::AddressBlock(_) => AddressBlockSpec::TAG,
      ElementKind::Cluster(_) => ClusterSpec::TAG,
      ElementKind::Register(_) => RegisterSpec::TAG,
      ElementKind::Field(_) => FieldSpec::TAG,
      ElementKind::EnumeratedValues(_) => EnumeratedValueSetSpec::TAG,
    }
  }

  /// Children that can be found by name, in lookup order.
  fn named_children(&self) -> Vec<&Vec<ElementId>> {
    match self {
      ElementKind::Device(d) => vec![&d.peripherals],
      ElementKind::Peripheral(p) => vec![&p.clusters, &p.registers],
      ElementKind::Cluster(c) => vec![&c.clusters, &c.registers],
      ElementKind::Register(r) => vec![&r.fields],
      ElementKind::Field(f) => vec![&f.enumerated_values],
      _ => Vec::new(),
    }
  }

  fn child_lists(&self) -> Vec<&Vec<ElementId>> {
    match self {
      ElementKind::Peripheral(p) => vec![&p.address_blocks, &p.clusters, &p.registers],
      _ => self.named_children(),
    }
  }

  fn child_lists_mut(&mut self) -> Vec<&mut Vec<ElementId>> {
    match self {
      ElementKind::Device(d) => vec![&mut d.peripherals],
      ElementKind::Peripheral(p) => vec![&mut p.address_blocks, &mut p.clusters, &mut p.registers],
      ElementKind::Cluster(c) => vec![&mut c.clusters, &mut c.registers],
      ElementKind::Register(r) => vec![&mut r.fields],
      ElementKind::Field(f) => vec![&mut f.enumerated_values],
      _ => Vec::new(),
    }
  }

  /// Position in `child_lists` of the list that holds children like `child`.
  fn slot(&self, child: &ElementKind) -> Option<usize> {
    match (self, child) {
      (ElementKind::Device(_), ElementKind::Peripheral(_)) => Some(0),
      (ElementKind::Peripheral(_), ElementKind::AddressBlock(_)) => Some(0),
      (ElementKind::Peripheral(_), ElementKind::Cluster(_)) => Some(1),
      (ElementKind::Peripheral(_), ElementKind::Register(_)) => Some(2),
      (ElementKind::Cluster(_), ElementKind::Cluster(_)) => Some(0),
      (ElementKind::Cluster(_), ElementKind::Register(_)) => Some(1),
      (ElementKind::Register(_), ElementKind::Field(_)) => Some(0),
      (ElementKind::Field(_), ElementKind::EnumeratedValues(_)) => Some(0),
      _ => None,
    }
  }
}

/// A resolved element: identity, relations, local register properties and kind-specific data.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
  pub(crate) name: Option<String>,
  pub(crate) owner: Option<ElementId>,
  pub(crate) derived_from: Option<ElementId>,
  pub(crate) inherits: PropertySet,
  pub(crate) properties: PropertyGroup,
  pub(crate) array: Option<DimSpec>,
  pub(crate) kind: ElementKind,

  /// Set on copies made for a derived owner; a local sibling of the same name replaces them.
  pub(crate) copied: bool,
}
impl Element {
  /// Name of the element, after `%s` substitution.
  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  /// The element that contains this one. `None` only for the device.
  pub fn owner(&self) -> Option<ElementId> {
    self.owner
  }

  /// The element this one was derived from, if it carried a `derivedFrom` attribute.
  pub fn derived_from(&self) -> Option<ElementId> {
    self.derived_from
  }

  /// The locally specified register properties. Use `Device::resolve` for effective values.
  pub fn properties(&self) -> &PropertyGroup {
    &self.properties
  }

  /// Set when the element is a fixed-size array (`name[%s]`) rather than a set of instances.
  pub fn array(&self) -> Option<DimSpec> {
    self.array
  }

  pub fn kind(&self) -> &ElementKind {
    &self.kind
  }

  pub fn as_device(&self) -> Option<&DeviceSpec> {
    DeviceSpec::unwrap_ref(&self.kind)
  }

  pub fn as_cpu(&self) -> Option<&CpuSpec> {
    CpuSpec::unwrap_ref(&self.kind)
  }

  pub fn as_sau_regions_config(&self) -> Option<&SauRegionsConfigSpec> {
    SauRegionsConfigSpec::unwrap_ref(&self.kind)
  }

  pub fn as_peripheral(&self) -> Option<&PeripheralSpec> {
    PeripheralSpec::unwrap_ref(&self.kind)
  }

  pub fn as_address_block(&self) -> Option<&AddressBlockSpec> {
    AddressBlockSpec::unwrap_ref(&self.kind)
  }

  pub fn as_cluster(&self) -> Option<&ClusterSpec> {
    ClusterSpec::unwrap_ref(&self.kind)
  }

  pub fn as_register(&self) -> Option<&RegisterSpec> {
    RegisterSpec::unwrap_ref(&self.kind)
  }

  pub fn as_field(&self) -> Option<&FieldSpec> {
    FieldSpec::unwrap_ref(&self.kind)
  }

  pub fn as_enumerated_values(&self) -> Option<&EnumeratedValueSetSpec> {
    EnumeratedValueSetSpec::unwrap_ref(&self.kind)
  }

  /// Applies one array instance: `%s` substitution in the name and the kind's templated fields,
  /// then the instance's offset.
  pub(crate) fn repeat<T: ElementSpec + Repeatable>(
    &mut self,
    instance: &DimInstance,
  ) -> SvdResolverResult<()> {
    if let Some(ref index) = instance.index {
      self.name = self.name.as_ref().map(|n| crate::dim::substitute(n, index));
    }
    if let Some(spec) = T::unwrap_mut(&mut self.kind) {
      spec.repeat(instance)?;
    }
    self.array = instance.array;
    Ok(())
  }
}
impl PropertyInheriting for Element {
  fn local_properties(&self) -> &PropertyGroup {
    &self.properties
  }

  fn inheritable(&self) -> PropertySet {
    self.inherits
  }

  fn owner(&self) -> Option<ElementId> {
    self.owner
  }
}

/// Binds a kind-specific spec struct to its `ElementKind` variant and its local parsing rules.
pub(crate) trait ElementSpec: Clone + Default + Sized {
  const TAG: &'static str;

  /// Whether the element must end up with a name, either local or derived.
  const NAME_REQUIRED: bool = true;

  /// Register properties read from this kind's own node.
  const LOCAL_PROPERTIES: PropertySet;

  fn inheritable(options: &ParseOptions) -> PropertySet;

  /// Reads the locally set members of the property group.
  fn local_properties<N: SourceNode>(node: &N) -> SvdResolverResult<PropertyGroup> {
    PropertyGroup::parse(node, Self::LOCAL_PROPERTIES)
  }

  fn wrap(self) -> ElementKind;

  fn unwrap_ref(kind: &ElementKind) -> Option<&Self>;

  fn unwrap_mut(kind: &mut ElementKind) -> Option<&mut Self>;

  /// Overwrites every field present in `node`.
  fn parse_local<N: SourceNode>(&mut self, node: &N) -> SvdResolverResult<()>;

  /// Checks mandatory fields once construction is complete. Fields a derived element copied from
  /// its source count as present.
  fn validate<N: SourceNode>(
    &self,
    _node: &N,
    _derived: bool,
    _options: &ParseOptions,
  ) -> SvdResolverResult<()> {
    Ok(())
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Tree {
  elements: Vec<Element>,
}
impl Tree {
  pub(crate) fn alloc(
    &mut self,
    owner: Option<ElementId>,
    kind: ElementKind,
    inherits: PropertySet,
  ) -> ElementId {
    let id = ElementId(self.elements.len());
    self.elements.push(Element {
      name: None,
      owner,
      derived_from: None,
      inherits,
      properties: PropertyGroup::default(),
      array: None,
      kind,
      copied: false,
    });
    id
  }

  pub(crate) fn try_get(&self, id: ElementId) -> Option<&Element> {
    self.elements.get(id.0)
  }

  /// Ids are only handed out by this arena, so indexing cannot miss.
  pub(crate) fn get(&self, id: ElementId) -> &Element {
    &self.elements[id.0]
  }

  pub(crate) fn get_mut(&mut self, id: ElementId) -> &mut Element {
    &mut self.elements[id.0]
  }

  pub(crate) fn spec<T: ElementSpec>(&self, id: ElementId) -> Option<&T> {
    T::unwrap_ref(&self.get(id).kind)
  }

  pub(crate) fn spec_mut<T: ElementSpec>(&mut self, id: ElementId) -> Option<&mut T> {
    T::unwrap_mut(&mut self.get_mut(id).kind)
  }

  /// Finds a direct child of `container` by name, among the children that kind can be searched
  /// for: peripherals of a device, clusters then registers of a peripheral or cluster, fields of a
  /// register, enumerated value sets of a field.
  pub(crate) fn find(&self, container: ElementId, name: &str) -> Option<ElementId> {
    self
      .get(container)
      .kind
      .named_children()
      .into_iter()
      .flatten()
      .copied()
      .find(|id| self.get(*id).name.as_deref() == Some(name))
  }

  /// All children of `container`, list by list.
  pub(crate) fn children(&self, container: ElementId) -> Vec<ElementId> {
    self
      .get(container)
      .kind
      .child_lists()
      .into_iter()
      .flatten()
      .copied()
      .collect()
  }

  /// Walks `levels` owner links up from `id`.
  pub(crate) fn ancestor(&self, id: ElementId, levels: usize) -> Option<ElementId> {
    let mut current = id;
    for _ in 0..levels {
      current = self.get(current).owner?;
    }
    Some(current)
  }

  /// Appends `child` to the matching list of its owner. A child with the same name as a copy
  /// inherited through derivation takes the copy's place; two children of the same name built
  /// from the document are a schema violation.
  pub(crate) fn attach(&mut self, owner: ElementId, child: ElementId) -> SvdResolverResult<()> {
    let slot = match self.get(owner).kind.slot(&self.get(child).kind) {
      Some(slot) => slot,
      None => return Ok(()),
    };

    let position = match self.get(child).name {
      Some(ref name) => self.get(owner).kind.child_lists()[slot]
        .iter()
        .position(|c| self.get(*c).name.as_ref() == Some(name)),
      None => None,
    };

    if let Some(p) = position {
      let existing = self.get(owner).kind.child_lists()[slot][p];
      if !self.get(existing).copied {
        return Err(SvdResolverError::schema(
          self.get(child).kind.tag(),
          format!("duplicate name '{}'", self.path(existing)),
        ));
      }
    }

    if let Some(list) = self.get_mut(owner).kind.child_lists_mut().into_iter().nth(slot) {
      match position {
        Some(p) => list[p] = child,
        None => list.push(child),
      }
    }
    Ok(())
  }

  /// Copies `source` and everything below it, hanging the copy under `owner`.
  pub(crate) fn clone_subtree(&mut self, source: ElementId, owner: ElementId) -> ElementId {
    let mut element = self.get(source).clone();
    element.owner = Some(owner);
    element.copied = true;
    let id = ElementId(self.elements.len());
    self.elements.push(element);

    let mut kind = self.get(id).kind.clone();
    for list in kind.child_lists_mut() {
      for child in list.iter_mut() {
        *child = self.clone_subtree(*child, id);
      }
    }
    self.get_mut(id).kind = kind;

    id
  }

  /// Gives `target` its own copy of every child of `source`.
  pub(crate) fn clone_children(
    &mut self,
    source: ElementId,
    target: ElementId,
  ) -> SvdResolverResult<()> {
    for child in self.children(source) {
      let copy = self.clone_subtree(child, target);
      self.attach(target, copy)?;
    }
    Ok(())
  }

  /// Dotted path of names from the first named element below the device down to `id`.
  pub(crate) fn path(&self, id: ElementId) -> String {
    let mut names = Vec::new();
    let mut current = Some(id);
    while let Some(c) = current {
      let element = self.get(c);
      if element.owner.is_none() {
        break;
      }
      names.push(element.name.clone().unwrap_or_else(|| format!("<{}>", element.kind.tag())));
      current = element.owner;
    }
    names.reverse();
    names.join(".")
  }
}
