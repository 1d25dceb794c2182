use cbordata::Cborize;

use std::convert::TryFrom;

use crate::{db::Footprint, Result};

const DELTA_VER: u32 = 0x00030001;

/// Delta type, describe the older-versions of an indexed entry.
#[derive(Clone, Debug, Eq, PartialEq, Cborize)]
pub enum Delta<D> {
    U { delta: D, seqno: u64 },
    D { seqno: u64 },
}

impl<D> Delta<D> {
    pub const ID: u32 = DELTA_VER;

    pub fn to_seqno(&self) -> u64 {
        match self {
            Delta::U { seqno, .. } => *seqno,
            Delta::D { seqno } => *seqno,
        }
    }
}

impl<D> Footprint for Delta<D>
where
    D: Footprint,
{
    fn footprint(&self) -> Result<isize> {
        use std::mem::size_of;

        let n = err_at!(FailConvert, isize::try_from(size_of::<Delta<D>>()))?;
        match self {
            Delta::U { delta, .. } => Ok(n + delta.footprint()?),
            Delta::D { .. } => Ok(n),
        }
    }
}
