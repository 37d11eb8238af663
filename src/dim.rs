//! Expansion of `dim` definitions into their instances.

use std::convert::TryFrom;

use tracing::trace;

use crate::{
  error::{SvdResolverError, SvdResolverResult},
  node::{self, SourceNode},
  patterns,
};

/// Marker in a name that turns a `dim` definition into one fixed-size array.
const ARRAY_MARKER: &str = "[%s]";

/// The array shape of an element declared as `name[%s]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimSpec {
  /// Number of array elements.
  pub dim: u32,

  /// Address distance between consecutive array elements.
  pub dim_increment: u32,
}

/// One element produced by expanding a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct DimInstance {
  /// Text substituted for `%s`. `None` when the definition has no `dim`.
  pub index: Option<String>,

  /// Distance of this instance from the first one.
  pub offset: u32,

  /// Set when the instance stands for a whole array.
  pub array: Option<DimSpec>,
}
impl DimInstance {
  /// The instance of a definition without `dim`.
  pub fn single() -> Self {
    Self {
      index: None,
      offset: 0,
      array: None,
    }
  }
}

/// An element kind that can be repeated with `dim`.
pub trait Repeatable {
  /// Moves the element by `delta`: an address for peripherals, clusters and registers, a bit
  /// position for fields. Fails when the moved element no longer fits its address or bit space.
  fn apply_offset(&mut self, delta: u32) -> SvdResolverResult<()>;

  /// Replaces `%s` in every templated text of the element except its name.
  fn substitute_index(&mut self, index: &str);

  fn repeat(&mut self, instance: &DimInstance) -> SvdResolverResult<()> {
    if let Some(ref index) = instance.index {
      self.substitute_index(index);
    }
    self.apply_offset(instance.offset)
  }
}

/// Adds an instance offset to a 32-bit position of an `element`.
pub(crate) fn shift(element: &str, position: u32, delta: u32) -> SvdResolverResult<u32> {
  position.checked_add(delta).ok_or_else(|| {
    SvdResolverError::schema(
      element,
      format!("offset {:#x} moved by {:#x} overflows", position, delta),
    )
  })
}

/// Replaces every `%s` in `template` with `index`.
pub fn substitute(template: &str, index: &str) -> String {
  template.replace("%s", index)
}

/// Substitutes `index` into an optional text.
pub(crate) fn substitute_opt(template: &mut Option<String>, index: &str) {
  if let Some(t) = template.as_mut() {
    *t = substitute(t, index);
  }
}

/// Computes the instances `node` expands to, in order. A definition without `dim` yields exactly
/// one instance at offset zero.
pub fn expand<N: SourceNode>(node: &N) -> SvdResolverResult<Vec<DimInstance>> {
  let dim = match node::integer_u32(node, "dim")? {
    Some(dim) => dim,
    None => return Ok(vec![DimInstance::single()]),
  };

  let name = node::text(node, "name").unwrap_or_default();
  let dim_increment = node::mandatory(
    node::integer_u32(node, "dimIncrement")?,
    node.tag(),
    "dimIncrement",
  )?;
  if dim == 0 {
    return Err(SvdResolverError::schema(
      node.tag(),
      format!("{}: dim must be at least 1", name),
    ));
  }

  let indices = match node::text(node, "dimIndex") {
    Some(dim_index) => parse_dim_index(&name, &dim_index, dim)?,
    None => {
      let dim_name = node::text(node, "dimName").unwrap_or_default();
      if name.contains(ARRAY_MARKER) || dim_name.contains(ARRAY_MARKER) {
        trace!("{}: array of {} elements", name, dim);
        return Ok(vec![DimInstance {
          index: Some(dim.to_string()),
          offset: 0,
          array: Some(DimSpec { dim, dim_increment }),
        }]);
      }
      (0..dim).map(|i| i.to_string()).collect()
    }
  };

  let mut instances = Vec::with_capacity(indices.len());
  for (position, index) in indices.into_iter().enumerate() {
    let offset = u32::try_from(position)
      .ok()
      .and_then(|p| p.checked_mul(dim_increment))
      .ok_or_else(|| {
        SvdResolverError::schema(node.tag(), format!("{}: instance offset overflows", name))
      })?;

    trace!("{}: instance '{}' at offset {:#x}", name, index, offset);
    instances.push(DimInstance {
      index: Some(index),
      offset,
      array: None,
    });
  }

  Ok(instances)
}

/// Splits a `dimIndex` into its labels: either a comma separated list or an inclusive numeric
/// range `a-b`. The number of labels must equal `dim`; a range is counted before any label is
/// produced.
fn parse_dim_index(name: &str, dim_index: &str, dim: u32) -> SvdResolverResult<Vec<String>> {
  let invalid = || SvdResolverError::InvalidDimIndex {
    name: name.to_owned(),
    dim_index: dim_index.to_owned(),
  };
  let mismatch = |count: usize| SvdResolverError::DimCountMismatch {
    name: name.to_owned(),
    dim,
    count,
  };

  if dim_index.contains(',') {
    let labels: Vec<String> = dim_index.split(',').map(|s| s.trim().to_owned()).collect();
    if labels.len() != dim as usize {
      return Err(mismatch(labels.len()));
    }
    return Ok(labels);
  }

  if dim_index.contains('-') {
    let captures = patterns::dim_range()?
      .captures(dim_index)
      .ok_or_else(invalid)?;
    let first: u64 = captures[1].parse().map_err(|_| invalid())?;
    let last: u64 = captures[2].parse().map_err(|_| invalid())?;
    if last < first {
      return Err(invalid());
    }
    let count = (last - first).checked_add(1);
    if count != Some(u64::from(dim)) {
      let count = count
        .and_then(|c| usize::try_from(c).ok())
        .unwrap_or(usize::MAX);
      return Err(mismatch(count));
    }
    return Ok((first..=last).map(|i| i.to_string()).collect());
  }

  Err(invalid())
}
