//! The minimal view of a markup node the resolver consumes, and the scalar parsers layered on it.

use std::convert::TryFrom;

use xmltree::{Element, XMLNode};

use crate::error::{SvdResolverError, SvdResolverResult};

/// A node of the source document. Only attribute lookup, child lookup by tag and child text are
/// needed; anything that can provide those can be resolved into a device.
pub trait SourceNode: Sized {
  /// Tag name of this node, used in error messages.
  fn tag(&self) -> &str;

  /// Value of the attribute `name`, if present.
  fn attribute(&self, name: &str) -> Option<String>;

  /// All direct children with the given tag, in document order.
  fn children(&self, tag: &str) -> Vec<&Self>;

  /// Text of the first direct child with the given tag, if present.
  fn child_text(&self, tag: &str) -> Option<String>;

  /// The first direct child with the given tag.
  fn child(&self, tag: &str) -> Option<&Self> {
    self.children(tag).into_iter().next()
  }
}

impl SourceNode for Element {
  fn tag(&self) -> &str {
    &self.name
  }

  fn attribute(&self, name: &str) -> Option<String> {
    self.attributes.get(name).map(|v| v.trim().to_owned())
  }

  fn children(&self, tag: &str) -> Vec<&Self> {
    self
      .children
      .iter()
      .filter_map(|child| match child {
        XMLNode::Element(ref e) if e.name == tag => Some(e),
        _ => None,
      })
      .collect()
  }

  fn child_text(&self, tag: &str) -> Option<String> {
    let child = self.child(tag)?;
    let mut text = String::new();
    for node in child.children.iter() {
      match node {
        XMLNode::Text(ref t) | XMLNode::CData(ref t) => text.push_str(t),
        _ => {}
      }
    }
    Some(text.trim().to_owned())
  }
}

/// Enumerated tokens of the SVD schema.
pub(crate) trait SvdEnum: Sized {
  fn from_token(token: &str) -> Option<Self>;
}

pub(crate) fn text<N: SourceNode>(node: &N, tag: &str) -> Option<String> {
  node.child_text(tag)
}

pub(crate) fn mandatory_text<N: SourceNode>(node: &N, tag: &str) -> SvdResolverResult<String> {
  node.child_text(tag).ok_or_else(|| {
    SvdResolverError::schema(
      node.tag(),
      format!("element '{}' is mandatory, but not present", tag),
    )
  })
}

/// Parses a scaled non-negative integer: decimal, `0x` hexadecimal, or `0b`/`#` binary where `x`
/// marks a don't-care bit that reads as zero.
pub(crate) fn parse_integer(value: &str) -> Option<u64> {
  let value = value.trim().to_lowercase();

  if let Some(hex) = value.strip_prefix("0x") {
    u64::from_str_radix(hex, 16).ok()
  } else if let Some(bin) = value.strip_prefix("0b").or_else(|| value.strip_prefix('#')) {
    u64::from_str_radix(&bin.replace('x', "0"), 2).ok()
  } else {
    value.parse::<u64>().ok()
  }
}

pub(crate) fn integer<N: SourceNode>(node: &N, tag: &str) -> SvdResolverResult<Option<u64>> {
  match node.child_text(tag) {
    Some(ref raw) => match parse_integer(raw) {
      Some(v) => Ok(Some(v)),
      None => Err(SvdResolverError::schema(
        node.tag(),
        format!("'{}' is not a valid integer for '{}'", raw, tag),
      )),
    },
    None => Ok(None),
  }
}

pub(crate) fn integer_u32<N: SourceNode>(node: &N, tag: &str) -> SvdResolverResult<Option<u32>> {
  match integer(node, tag)? {
    Some(v) => u32::try_from(v).map(Some).map_err(|_| {
      SvdResolverError::schema(node.tag(), format!("'{}' does not fit in 32 bits", tag))
    }),
    None => Ok(None),
  }
}

pub(crate) fn parse_boolean(value: &str) -> Option<bool> {
  match value.trim().to_lowercase().as_str() {
    "true" | "1" => Some(true),
    "false" | "0" => Some(false),
    _ => None,
  }
}

fn boolean_value(
  element: &str,
  raw: Option<String>,
  what: &str,
) -> SvdResolverResult<Option<bool>> {
  match raw {
    Some(ref raw) => parse_boolean(raw).map(Some).ok_or_else(|| {
      SvdResolverError::schema(
        element,
        format!("'{}' is not a valid boolean for '{}'", raw, what),
      )
    }),
    None => Ok(None),
  }
}

pub(crate) fn boolean<N: SourceNode>(node: &N, tag: &str) -> SvdResolverResult<Option<bool>> {
  boolean_value(node.tag(), node.child_text(tag), tag)
}

pub(crate) fn boolean_attribute<N: SourceNode>(
  node: &N,
  name: &str,
) -> SvdResolverResult<Option<bool>> {
  boolean_value(node.tag(), node.attribute(name), name)
}

fn enumeration_value<T: SvdEnum>(
  element: &str,
  raw: Option<String>,
  what: &str,
) -> SvdResolverResult<Option<T>> {
  match raw {
    Some(ref raw) => T::from_token(raw).map(Some).ok_or_else(|| {
      SvdResolverError::schema(element, format!("unknown token '{}' for '{}'", raw, what))
    }),
    None => Ok(None),
  }
}

pub(crate) fn enumeration<T: SvdEnum, N: SourceNode>(
  node: &N,
  tag: &str,
) -> SvdResolverResult<Option<T>> {
  enumeration_value(node.tag(), node.child_text(tag), tag)
}

pub(crate) fn enumeration_attribute<T: SvdEnum, N: SourceNode>(
  node: &N,
  name: &str,
) -> SvdResolverResult<Option<T>> {
  enumeration_value(node.tag(), node.attribute(name), name)
}

pub(crate) fn mandatory<T>(value: Option<T>, element: &str, tag: &str) -> SvdResolverResult<T> {
  value.ok_or_else(|| {
    SvdResolverError::schema(
      element,
      format!("element '{}' is mandatory, but not present", tag),
    )
  })
}
