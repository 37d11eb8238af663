//! The single top-down pass that turns a source tree into an arena of resolved elements.
//!
//! Every element goes through the same steps: allocation under its owner, derivation (copying the
//! source's values and children), local overrides, `%s` substitution and offset for its array
//! instance, its own children in document order, and finally validation of mandatory content.

use tracing::debug;

use crate::{
  cluster::ClusterSpec,
  derive::{self, Derivable},
  device::{CpuSpec, DeviceSpec, SauRegionsConfigSpec},
  dim::{self, DimInstance, Repeatable},
  error::{SvdResolverError, SvdResolverResult},
  field::FieldSpec,
  node::{self, SourceNode},
  options::ParseOptions,
  peripheral::{AddressBlockSpec, PeripheralSpec},
  register::RegisterSpec,
  tree::{ElementId, ElementSpec, Tree},
  value::EnumeratedValueSetSpec,
};

pub(crate) struct Builder<'a> {
  tree: Tree,
  options: &'a ParseOptions,
}
impl<'a> Builder<'a> {
  pub(crate) fn new(options: &'a ParseOptions) -> Self {
    Self {
      tree: Tree::default(),
      options,
    }
  }

  /// Builds the device described by `node`, returning the arena and the device's id.
  pub(crate) fn build<N: SourceNode>(mut self, node: &N) -> SvdResolverResult<(Tree, ElementId)> {
    let id = self.start::<DeviceSpec>(None);
    self.parse_local::<DeviceSpec, N>(id, node)?;

    if let Some(cpu) = node.child("cpu") {
      let cpu = self.cpu(id, cpu)?;
      if let Some(device) = self.tree.spec_mut::<DeviceSpec>(id) {
        device.cpu = Some(cpu);
      }
    }

    let peripherals = node.child("peripherals").ok_or_else(|| {
      SvdResolverError::schema(node.tag(), "no element 'peripherals' found in 'device'")
    })?;
    self.repeated(id, peripherals, "peripheral", Self::peripheral)?;

    self.finish::<DeviceSpec, N>(id, node, false)?;
    Ok((self.tree, id))
  }

  fn cpu<N: SourceNode>(&mut self, owner: ElementId, node: &N) -> SvdResolverResult<ElementId> {
    let id = self.start::<CpuSpec>(Some(owner));
    self.parse_local::<CpuSpec, N>(id, node)?;

    if let Some(config) = node.child("sauRegionsConfig") {
      let config_id = self.start::<SauRegionsConfigSpec>(Some(id));
      self.parse_local::<SauRegionsConfigSpec, N>(config_id, config)?;
      self.finish::<SauRegionsConfigSpec, N>(config_id, config, false)?;
      if let Some(cpu) = self.tree.spec_mut::<CpuSpec>(id) {
        cpu.sau_regions_config = Some(config_id);
      }
    }

    self.finish::<CpuSpec, N>(id, node, false)?;
    Ok(id)
  }

  fn peripheral<N: SourceNode>(
    &mut self,
    owner: ElementId,
    node: &N,
    instance: &DimInstance,
  ) -> SvdResolverResult<ElementId> {
    let id = self.start::<PeripheralSpec>(Some(owner));
    let derived = self.derive_from::<PeripheralSpec, N>(id, node, instance)?;
    self.parse_local::<PeripheralSpec, N>(id, node)?;
    self.tree.get_mut(id).repeat::<PeripheralSpec>(instance)?;

    let blocks = node.children("addressBlock");
    if !blocks.is_empty() {
      if let Some(peripheral) = self.tree.spec_mut::<PeripheralSpec>(id) {
        peripheral.address_blocks.clear();
      }
    }
    for block in blocks {
      let block_id = self.start::<AddressBlockSpec>(Some(id));
      self.parse_local::<AddressBlockSpec, N>(block_id, block)?;
      self.finish::<AddressBlockSpec, N>(block_id, block, false)?;
      self.tree.attach(id, block_id)?;
    }

    if let Some(registers) = node.child("registers") {
      self.registers(id, registers)?;
    }

    self.finish::<PeripheralSpec, N>(id, node, derived)?;
    Ok(id)
  }

  /// Builds the clusters, then the registers, of a register container.
  fn registers<N: SourceNode>(&mut self, owner: ElementId, container: &N) -> SvdResolverResult<()> {
    // Not document order: all clusters are built before any register, however the two interleave.
    self.repeated(owner, container, "cluster", Self::cluster)?;
    self.repeated(owner, container, "register", Self::register)
  }

  fn cluster<N: SourceNode>(
    &mut self,
    owner: ElementId,
    node: &N,
    instance: &DimInstance,
  ) -> SvdResolverResult<ElementId> {
    let id = self.start::<ClusterSpec>(Some(owner));
    let derived = self.derive_from::<ClusterSpec, N>(id, node, instance)?;
    self.parse_local::<ClusterSpec, N>(id, node)?;
    self.tree.get_mut(id).repeat::<ClusterSpec>(instance)?;

    self.registers(id, node)?;

    self.finish::<ClusterSpec, N>(id, node, derived)?;
    Ok(id)
  }

  fn register<N: SourceNode>(
    &mut self,
    owner: ElementId,
    node: &N,
    instance: &DimInstance,
  ) -> SvdResolverResult<ElementId> {
    let id = self.start::<RegisterSpec>(Some(owner));
    let derived = self.derive_from::<RegisterSpec, N>(id, node, instance)?;
    self.parse_local::<RegisterSpec, N>(id, node)?;
    self.tree.get_mut(id).repeat::<RegisterSpec>(instance)?;

    if let Some(fields) = node.child("fields") {
      self.repeated(id, fields, "field", Self::field)?;
    }

    self.finish::<RegisterSpec, N>(id, node, derived)?;
    Ok(id)
  }

  fn field<N: SourceNode>(
    &mut self,
    owner: ElementId,
    node: &N,
    instance: &DimInstance,
  ) -> SvdResolverResult<ElementId> {
    let id = self.start::<FieldSpec>(Some(owner));
    let derived = self.derive_from::<FieldSpec, N>(id, node, instance)?;
    self.parse_local::<FieldSpec, N>(id, node)?;
    self.tree.get_mut(id).repeat::<FieldSpec>(instance)?;

    for values in node.children("enumeratedValues") {
      let values_id = self.enumerated_values(id, values)?;
      self.tree.attach(id, values_id)?;
    }

    self.finish::<FieldSpec, N>(id, node, derived)?;
    Ok(id)
  }

  fn enumerated_values<N: SourceNode>(
    &mut self,
    owner: ElementId,
    node: &N,
  ) -> SvdResolverResult<ElementId> {
    let id = self.start::<EnumeratedValueSetSpec>(Some(owner));
    let derived = self.derive_from::<EnumeratedValueSetSpec, N>(id, node, &DimInstance::single())?;
    self.parse_local::<EnumeratedValueSetSpec, N>(id, node)?;
    self.finish::<EnumeratedValueSetSpec, N>(id, node, derived)?;
    Ok(id)
  }

  /// Expands and builds every `tag` child of `container`, attaching each instance to `owner` as
  /// soon as it is complete so later siblings can derive from it.
  fn repeated<N, F>(
    &mut self,
    owner: ElementId,
    container: &N,
    tag: &str,
    build: F,
  ) -> SvdResolverResult<()>
  where
    N: SourceNode,
    F: Fn(&mut Self, ElementId, &N, &DimInstance) -> SvdResolverResult<ElementId>,
  {
    for node in container.children(tag) {
      for instance in dim::expand(node)? {
        let id = build(self, owner, node, &instance)?;
        self.tree.attach(owner, id)?;
      }
    }
    Ok(())
  }

  fn start<T: ElementSpec>(&mut self, owner: Option<ElementId>) -> ElementId {
    self
      .tree
      .alloc(owner, T::default().wrap(), T::inheritable(self.options))
  }

  /// Follows the `derivedFrom` attribute of `node`, if any: the element takes over the source's
  /// name, local properties and kind-specific values, and receives copies of its children.
  fn derive_from<T, N>(
    &mut self,
    id: ElementId,
    node: &N,
    instance: &DimInstance,
  ) -> SvdResolverResult<bool>
  where
    T: ElementSpec + Derivable,
    N: SourceNode,
  {
    let path = match node.attribute("derivedFrom") {
      Some(path) => path,
      None => return Ok(false),
    };
    if T::NAME_REQUIRED && node::text(node, "name").is_none() {
      return Err(SvdResolverError::schema(
        node.tag(),
        format!("element 'name' is mandatory, also when derived from '{}'", path),
      ));
    }
    let path = match instance.index {
      Some(ref index) => dim::substitute(&path, index),
      None => path,
    };

    let source = derive::resolve_path(&self.tree, self.tree.get(id).owner(), &path)?;
    let (name, properties, spec) = {
      let element = self.tree.get(source);
      let spec = T::unwrap_ref(element.kind()).cloned().ok_or_else(|| {
        SvdResolverError::DerivationKindMismatch {
          path: path.clone(),
          expected: T::TAG,
          found: element.kind().tag(),
        }
      })?;
      (element.name.clone(), element.properties, spec)
    };

    let element = self.tree.get_mut(id);
    element.name = name;
    element.properties = properties;
    element.derived_from = Some(source);
    if let Some(target) = T::unwrap_mut(&mut element.kind) {
      target.inherit_from(&spec);
    }
    self.tree.clone_children(source, id)?;

    debug!("{} '{}' derived from '{}'", T::TAG, path, self.tree.path(source));
    Ok(true)
  }

  /// Applies the content of `node` itself on top of whatever derivation copied.
  fn parse_local<T: ElementSpec, N: SourceNode>(
    &mut self,
    id: ElementId,
    node: &N,
  ) -> SvdResolverResult<()> {
    let properties = T::local_properties(node)?;
    let element = self.tree.get_mut(id);

    if let Some(name) = node::text(node, "name") {
      element.name = Some(name);
    }
    element.properties.override_with(&properties);
    if let Some(spec) = T::unwrap_mut(&mut element.kind) {
      spec.parse_local(node)?;
    }
    Ok(())
  }

  fn finish<T: ElementSpec, N: SourceNode>(
    &self,
    id: ElementId,
    node: &N,
    derived: bool,
  ) -> SvdResolverResult<()> {
    let element = self.tree.get(id);

    if T::NAME_REQUIRED && element.name().is_none() {
      return Err(SvdResolverError::schema(
        node.tag(),
        "element 'name' is mandatory, but not present",
      ));
    }
    if let Some(spec) = T::unwrap_ref(element.kind()) {
      spec.validate(node, derived, self.options)?;
    }
    Ok(())
  }
}
