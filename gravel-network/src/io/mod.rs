mod cursor;
mod primitives;
pub mod composite;
pub use cursor::*;
pub use primitives::*;

use crate::error::NetResult;

/// Objects which can be read from a [`ByteCursor`].
pub trait Readable: Sized {
    /// Read this object from the cursor.
    fn read_from(data: &mut ByteCursor) -> NetResult<Self>;
}

/// Objects which can be written to a [`ByteCursor`].
pub trait Writable {
    /// Write this object to the cursor.
    fn write_to(&self, target: &mut ByteCursor) -> NetResult<()>;
}

