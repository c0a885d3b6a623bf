use std::fmt::{self, Debug, Formatter};

/// Formats bytes as a `0x`-prefixed hex string in debug output.
pub struct Hex<'a>(pub &'a [u8]);

impl Debug for Hex<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "0x{}", alloy::hex::encode(self.0))
    }
}
