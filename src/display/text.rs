use core::fmt;

/// Four blank characters
pub const BLANK: Text4 = Text4(*b"    ");

/// Four ASCII characters as shown on the alphanumeric display
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Text4(pub [u8; 4]);

impl Text4 {
    /// Take the first four characters of `s`, padding with spaces.
    /// Non-ASCII characters are shown as `?`.
    pub fn new(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// Same as [`Text4::new`] for raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut out = *b"    ";
        for (slot, byte) in out.iter_mut().zip(bytes) {
            *slot = if byte.is_ascii() && !byte.is_ascii_control() {
                *byte
            } else {
                b'?'
            };
        }
        Self(out)
    }

    /// Right-align `bytes` in the four cells
    pub fn right_aligned(bytes: &[u8]) -> Self {
        let len = bytes.len().min(4);
        let mut out = [b' '; 4];
        out[4 - len..].copy_from_slice(&bytes[..len]);
        Self::from_bytes(&out)
    }

    /// The same character in all four cells
    pub const fn filled(c: u8) -> Self {
        Self([c; 4])
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Debug for Text4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text4({:?})", self.as_str())
    }
}

impl fmt::Display for Text4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Text4;

    #[test]
    fn test_padding_and_truncation() {
        assert_eq!(Text4::new("AB").as_bytes(), b"AB  ");
        assert_eq!(Text4::new("ABCDEF").as_bytes(), b"ABCD");
        assert_eq!(Text4::right_aligned(b"42").as_bytes(), b"  42");
        assert_eq!(Text4::from_bytes(&[b'A', 0x07]).as_bytes(), b"A?  ");
    }
}
