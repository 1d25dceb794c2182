//! Implement [Footprint] for native types and std-types.

use std::convert::TryFrom;

use crate::{db::Footprint, Result};

macro_rules! impl_footprint_basic_types {
    ($($type:ty),*) => (
        $(
            impl Footprint for $type {
                fn footprint(&self) -> Result<isize> {
                    use std::mem::size_of;
                    err_at!(FailConvert, isize::try_from(size_of::<$type>()))
                }
            }
        )*
    );
}

impl_footprint_basic_types![
    bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char
];

impl<T> Footprint for Vec<T>
where
    T: Footprint,
{
    fn footprint(&self) -> Result<isize> {
        use std::mem::size_of;

        let mut size = err_at!(
            FailConvert,
            isize::try_from(size_of::<Vec<T>>() + self.capacity())
        )?;

        for item in self.iter() {
            size += item.footprint()?
        }

        Ok(size)
    }
}

impl Footprint for String {
    fn footprint(&self) -> Result<isize> {
        use std::mem::size_of;
        err_at!(
            FailConvert,
            isize::try_from(size_of::<String>() + self.capacity())
        )
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
