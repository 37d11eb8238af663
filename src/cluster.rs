use crate::{
  clean_whitespace_opt,
  derive::Derivable,
  dim::{self, Repeatable},
  error::{SvdResolverError, SvdResolverResult},
  node::{self, SourceNode},
  options::ParseOptions,
  properties::PropertySet,
  tree::{ElementId, ElementKind, ElementSpec},
};

/// Describes a cluster of registers that exists on a peripheral. Clusters may be top-level
/// constructs of a peripheral or may be nested within other clusters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterSpec {
  /// Description of the details of the register cluster.
  pub description: Option<String>,

  /// Name of the C type generated for an array of clusters.
  pub dim_name: Option<String>,

  /// Cluster occupying the same address range as this one.
  pub alternate_cluster: Option<String>,

  /// Name of the C struct generated for the cluster.
  pub header_struct_name: Option<String>,

  /// Cluster's starting address relative to its owner.
  pub address_offset: u32,

  /// Registers directly within this cluster.
  pub registers: Vec<ElementId>,

  /// Clusters nested within this cluster.
  pub clusters: Vec<ElementId>,
}
impl Derivable for ClusterSpec {
  fn inherit_from(&mut self, source: &Self) {
    self.description = source.description.clone();
    self.dim_name = source.dim_name.clone();
    self.alternate_cluster = source.alternate_cluster.clone();
    self.header_struct_name = source.header_struct_name.clone();
    self.address_offset = source.address_offset;
  }
}
impl Repeatable for ClusterSpec {
  fn apply_offset(&mut self, delta: u32) -> SvdResolverResult<()> {
    self.address_offset = dim::shift(Self::TAG, self.address_offset, delta)?;
    Ok(())
  }

  fn substitute_index(&mut self, index: &str) {
    dim::substitute_opt(&mut self.description, index);
    dim::substitute_opt(&mut self.dim_name, index);
    dim::substitute_opt(&mut self.header_struct_name, index);
  }
}
impl ElementSpec for ClusterSpec {
  const TAG: &'static str = "cluster";
  const LOCAL_PROPERTIES: PropertySet = PropertySet::all();

  fn inheritable(options: &ParseOptions) -> PropertySet {
    options.register_properties
  }

  fn wrap(self) -> ElementKind {
    ElementKind::Cluster(self)
  }

  fn unwrap_ref(kind: &ElementKind) -> Option<&Self> {
    match kind {
      ElementKind::Cluster(s) => Some(s),
      _ => None,
    }
  }

  fn unwrap_mut(kind: &mut ElementKind) -> Option<&mut Self> {
    match kind {
      ElementKind::Cluster(s) => Some(s),
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
    if let Some(alternate) = node::text(node, "alternateCluster") {
      self.alternate_cluster = Some(alternate);
    }
    if let Some(name) = node::text(node, "headerStructName") {
      self.header_struct_name = Some(name);
    }
    if let Some(offset) = node::integer_u32(node, "addressOffset")? {
      self.address_offset = offset;
    }
    Ok(())
  }

  fn validate<N: SourceNode>(
    &self,
    node: &N,
    derived: bool,
    options: &ParseOptions,
  ) -> SvdResolverResult<()> {
    if self.registers.is_empty() && self.clusters.is_empty() {
      return Err(SvdResolverError::schema(
        node.tag(),
        "a cluster needs at least one register or cluster",
      ));
    }
    if !derived {
      node::mandatory_text(node, "addressOffset")?;
      if options.require_descriptions {
        node::mandatory_text(node, "description")?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::ClusterSpec;
  use crate::{
    derive::Derivable,
    dim::{DimInstance, Repeatable},
    options::ParseOptions,
    tree::ElementSpec,
  };
  use xmltree::Element;

  #[test]
  fn can_parse_local_content() {
    let el: Element = Element::parse(
      r##"
      <cluster>
        <name>CH%s</name>
        <description>Channel
          %s</description>
        <headerStructName>CH</headerStructName>
        <addressOffset>0x20</addressOffset>
      </cluster>
      "##
        .as_bytes(),
    )
    .unwrap();

    let mut cs = ClusterSpec::default();
    cs.parse_local(&el).unwrap();

    assert_eq!("Channel %s", cs.description.as_ref().unwrap());
    assert_eq!("CH", cs.header_struct_name.as_ref().unwrap());
    assert_eq!(0x20, cs.address_offset);

    cs.repeat(&DimInstance {
      index: Some("2".to_owned()),
      offset: 0x40,
      array: None,
    })
    .unwrap();

    assert_eq!("Channel 2", cs.description.unwrap());
    assert_eq!(0x60, cs.address_offset);
  }

  #[test]
  fn derived_cluster_keeps_source_offset() {
    let el: Element =
      Element::parse(r##"<cluster derivedFrom="A"><name>B</name></cluster>"##.as_bytes()).unwrap();

    let source = ClusterSpec {
      description: Some("Block".to_owned()),
      address_offset: 0x100,
      ..ClusterSpec::default()
    };

    let mut cs = ClusterSpec::default();
    cs.inherit_from(&source);
    cs.parse_local(&el).unwrap();

    assert_eq!(0x100, cs.address_offset);
    assert_eq!("Block", cs.description.unwrap());
  }

  #[test]
  fn empty_cluster_is_rejected() {
    let el: Element = Element::parse(
      "<cluster><name>C</name><addressOffset>0</addressOffset></cluster>".as_bytes(),
    )
    .unwrap();

    assert!(ClusterSpec::default()
      .validate(&el, false, &ParseOptions::default())
      .is_err());
  }
}
