use std::hash::Hash;

use crate::{db::Bloom, Result};

/// A [Bloom] implementation that does nothing. Pass this in wherever a
/// bitmap is required but a bloom-filter is not wanted.
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq)]
pub struct NoBitmap;

impl Bloom for NoBitmap {
    fn len(&self) -> Result<usize> {
        Ok(0)
    }

    fn add_key<Q: ?Sized + Hash>(&mut self, _key: &Q) {}

    fn add_keys<Q: Hash>(&mut self, _keys: &[Q]) {}

    fn add_digest32(&mut self, _digest: u32) {}

    fn add_digests32(&mut self, _digest: &[u32]) {}

    fn add_digest64(&mut self, _digest: u64) {}

    fn add_digests64(&mut self, _digest: &[u64]) {}

    fn build(&mut self) -> Result<()> {
        Ok(())
    }

    fn contains<Q: ?Sized + Hash>(&self, _element: &Q) -> bool {
        true
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn from_bytes(_buf: &[u8]) -> Result<(Self, usize)> {
        Ok((NoBitmap, 0))
    }

    fn or(&self, _other: &Self) -> Result<Self> {
        Ok(NoBitmap)
    }
}
