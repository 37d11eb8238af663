//! `derivedFrom` path resolution.

use tracing::debug;

use crate::{
  error::{SvdResolverError, SvdResolverResult},
  tree::{ElementId, Tree},
};

/// An element kind that can be declared as a copy of another element of the same kind.
pub trait Derivable {
  /// Takes over every value of `source` except its children, which are copied separately.
  fn inherit_from(&mut self, source: &Self);
}

/// Resolves a dotted `derivedFrom` path relative to `owner`: for a path of `k` segments, ascends
/// `k - 1` owner links, then looks up each segment among the children of the previous one.
pub(crate) fn resolve_path(
  tree: &Tree,
  owner: Option<ElementId>,
  path: &str,
) -> SvdResolverResult<ElementId> {
  let segments: Vec<&str> = path.split('.').map(str::trim).collect();

  let mut current = owner
    .and_then(|owner| tree.ancestor(owner, segments.len() - 1))
    .ok_or_else(|| SvdResolverError::UnresolvedDerivationRoot {
      path: path.to_owned(),
    })?;

  for segment in segments {
    current = tree
      .find(current, segment)
      .ok_or_else(|| SvdResolverError::UnresolvedDerivationSegment {
        path: path.to_owned(),
        segment: segment.to_owned(),
      })?;
  }

  debug!("derivation path '{}' resolved to {}", path, tree.path(current));
  Ok(current)
}

#[cfg(test)]
mod tests {
  use super::resolve_path;
  use crate::{
    cluster::ClusterSpec,
    device::DeviceSpec,
    error::SvdResolverError,
    peripheral::PeripheralSpec,
    properties::PropertySet,
    register::RegisterSpec,
    tree::{ElementId, ElementKind, ElementSpec, Tree},
  };

  fn named(tree: &mut Tree, owner: ElementId, kind: ElementKind, name: &str) -> ElementId {
    let id = tree.alloc(Some(owner), kind, PropertySet::empty());
    tree.get_mut(id).name = Some(name.to_owned());
    tree.attach(owner, id).unwrap();
    id
  }

  /// DEV { TIMER0 { CR, CH { CCR } }, TIMER1 { SR } }
  fn sample() -> (Tree, Vec<ElementId>) {
    let mut tree = Tree::default();
    let device = tree.alloc(None, DeviceSpec::default().wrap(), PropertySet::empty());
    let timer0 = named(&mut tree, device, PeripheralSpec::default().wrap(), "TIMER0");
    let cr = named(&mut tree, timer0, RegisterSpec::default().wrap(), "CR");
    let ch = named(&mut tree, timer0, ClusterSpec::default().wrap(), "CH");
    let ccr = named(&mut tree, ch, RegisterSpec::default().wrap(), "CCR");
    let timer1 = named(&mut tree, device, PeripheralSpec::default().wrap(), "TIMER1");
    let sr = named(&mut tree, timer1, RegisterSpec::default().wrap(), "SR");
    (tree, vec![device, timer0, cr, ch, ccr, timer1, sr])
  }

  #[test]
  fn single_segment_searches_owner() {
    let (tree, ids) = sample();

    assert_eq!(ids[2], resolve_path(&tree, Some(ids[1]), "CR").unwrap());
    assert_eq!(ids[1], resolve_path(&tree, Some(ids[0]), "TIMER0").unwrap());
  }

  #[test]
  fn two_segments_ascend_one_level() {
    let (tree, ids) = sample();

    assert_eq!(ids[2], resolve_path(&tree, Some(ids[5]), "TIMER0.CR").unwrap());
    assert_eq!(ids[4], resolve_path(&tree, Some(ids[3]), "CH.CCR").unwrap());
  }

  #[test]
  fn three_segments_from_cluster() {
    let (tree, ids) = sample();

    assert_eq!(ids[4], resolve_path(&tree, Some(ids[3]), "TIMER0.CH.CCR").unwrap());
  }

  #[test]
  fn unknown_segment() {
    let (tree, ids) = sample();

    match resolve_path(&tree, Some(ids[1]), "UartCtrl0") {
      Err(SvdResolverError::UnresolvedDerivationSegment { segment, .. }) => {
        assert_eq!("UartCtrl0", segment)
      }
      other => panic!("unexpected result {:?}", other),
    }
  }

  #[test]
  fn ascends_past_root() {
    let (tree, ids) = sample();

    match resolve_path(&tree, Some(ids[1]), "A.B.C") {
      Err(SvdResolverError::UnresolvedDerivationRoot { path }) => assert_eq!("A.B.C", path),
      other => panic!("unexpected result {:?}", other),
    }
  }
}
