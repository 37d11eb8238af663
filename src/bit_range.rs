use crate::{
  error::{SvdResolverError, SvdResolverResult},
  node::{self, SourceNode},
  patterns,
};

/// Position of a field within its register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitRange {
  /// Position of the least significant bit.
  pub offset: u32,

  /// Number of bits. Never zero once resolved.
  pub width: u32,
}
impl BitRange {
  pub fn lsb(&self) -> u32 {
    self.offset
  }

  pub fn msb(&self) -> u32 {
    self.offset.saturating_add(self.width).saturating_sub(1)
  }

  /// The bits of the register this range covers.
  pub fn mask(&self) -> u64 {
    let bits = match self.width {
      w if w >= 64 => u64::MAX,
      w => (1u64 << w) - 1,
    };
    bits.checked_shl(self.offset).unwrap_or(0)
  }
}

/// Resolves whichever of `bitOffset`/`bitWidth`, `lsb`/`msb` or `bitRange` a field carries, in that
/// order of precedence.
pub fn resolve_bit_range<N: SourceNode>(node: &N) -> SvdResolverResult<BitRange> {
  local_bit_range(node)?.ok_or_else(|| SvdResolverError::MissingBitRange {
    field: node::text(node, "name").unwrap_or_else(|| "<unnamed>".to_owned()),
  })
}

/// Like `resolve_bit_range`, but reports a field without any encoding as `None`.
pub(crate) fn local_bit_range<N: SourceNode>(node: &N) -> SvdResolverResult<Option<BitRange>> {
  if let Some(offset) = node::integer_u32(node, "bitOffset")? {
    let width = node::integer_u32(node, "bitWidth")?.unwrap_or(1);
    return checked(node, offset, width).map(Some);
  }

  let lsb = node::integer_u32(node, "lsb")?;
  let msb = node::integer_u32(node, "msb")?;
  if let (Some(lsb), Some(msb)) = (lsb, msb) {
    return from_lsb_msb(node, lsb, msb).map(Some);
  }

  if let Some(range) = node::text(node, "bitRange") {
    let captures = patterns::bit_range()?
      .captures(&range).ok_or_else(|| {
      SvdResolverError::schema(node.tag(), format!("malformed bitRange '{}'", range))
    })?;
    let bound = |i: usize| {
      captures[i].parse::<u32>().map_err(|_| {
        SvdResolverError::schema(node.tag(), format!("malformed bitRange '{}'", range))
      })
    };
    let (msb, lsb) = (bound(1)?, bound(2)?);
    return from_lsb_msb(node, lsb, msb).map(Some);
  }

  Ok(None)
}

fn from_lsb_msb<N: SourceNode>(node: &N, lsb: u32, msb: u32) -> SvdResolverResult<BitRange> {
  if msb < lsb {
    return Err(SvdResolverError::schema(
      node.tag(),
      format!("msb {} is below lsb {}", msb, lsb),
    ));
  }
  let width = (msb - lsb).checked_add(1).ok_or_else(|| {
    SvdResolverError::schema(node.tag(), format!("bits {} to {} exceed 32 bits", lsb, msb))
  })?;
  checked(node, lsb, width)
}

fn checked<N: SourceNode>(node: &N, offset: u32, width: u32) -> SvdResolverResult<BitRange> {
  if width == 0 {
    return Err(SvdResolverError::schema(node.tag(), "bit width must be at least 1"));
  }
  if offset.checked_add(width).is_none() {
    return Err(SvdResolverError::schema(
      node.tag(),
      format!("{} bits at offset {} exceed 32 bits", width, offset),
    ));
  }
  Ok(BitRange { offset, width })
}
