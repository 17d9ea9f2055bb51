use super::{ByteCursor, Readable, Writable};
use crate::error::NetResult;

macro_rules! fixed_impl {
    (
        $({$ty:ty, $get:ident, $put:ident}),*
    ) => {
        $(
            impl Readable for $ty {
                fn read_from(data: &mut ByteCursor) -> NetResult<Self> {
                    data.$get()
                }
            }

            impl Writable for $ty {
                fn write_to(&self, target: &mut ByteCursor) -> NetResult<()> {
                    target.$put(*self)
                }
            }
        )*
    };
}

fixed_impl!(
    {u8, get_u8, put_u8},
    {bool, get_bool, put_bool},
    {i16, get_i16, put_i16},
    {u16, get_u16, put_u16},
    {i32, get_i32, put_i32},
    {u32, get_u32, put_u32},
    {i64, get_i64, put_i64},
    {u64, get_u64, put_u64},
    {f32, get_f32, put_f32}
);

macro_rules! varint_impl {
    (
        $($(#[$meta:meta])* $name:ident($inner:ty, $get:ident, $put:ident)),*
    ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(pub $inner);

            impl Readable for $name {
                fn read_from(data: &mut ByteCursor) -> NetResult<Self> {
                    Ok(Self(data.$get()?))
                }
            }

            impl Writable for $name {
                fn write_to(&self, target: &mut ByteCursor) -> NetResult<()> {
                    target.$put(self.0)
                }
            }

            impl From<$inner> for $name {
                fn from(value: $inner) -> Self {
                    Self(value)
                }
            }
        )*
    };
}

varint_impl!(
    /// Unsigned 32-bit varint.
    VarUInt(u32, get_uvarint32, put_uvarint32)
);

impl Readable for String {
    fn read_from(data: &mut ByteCursor) -> NetResult<Self> {
        data.get_string()
    }
}
impl Writable for String {
    fn write_to(&self, target: &mut ByteCursor) -> NetResult<()> {
        target.put_string(self)
    }
}
