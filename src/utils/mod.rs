pub(crate) mod bytes;
pub mod hexdump;

pub use self::hexdump::{CArrayOptions, format_c_array, read_range};
