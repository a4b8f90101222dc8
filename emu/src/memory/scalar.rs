/// A fixed-width value that can be moved in and out of little-endian
/// byte storage, both guest memory and the vector register file.
pub trait Scalar: Copy + Default {
    const SIZE: usize;

    /// Reads the value from the first `SIZE` bytes of `bytes`.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Writes the value into the first `SIZE` bytes of `bytes`.
    fn write_le_slice(self, bytes: &mut [u8]);
}

macro_rules! impl_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl Scalar for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0_u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$t>::from_le_bytes(raw)
                }

                fn write_le_slice(self, bytes: &mut [u8]) {
                    bytes[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_scalar!(u8, u16, u32, u64, u128, i8, i16, i32, i64, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn little_endian_layout() {
        let mut bytes = [0_u8; 8];
        0xDEAD_BEEF_u32.write_le_slice(&mut bytes[2..]);
        assert_eq!(bytes, [0, 0, 0xEF, 0xBE, 0xAD, 0xDE, 0, 0]);
        assert_eq!(u16::from_le_slice(&bytes[3..]), 0xADBE);
        assert_eq!(i8::from_le_slice(&bytes[5..]), -34);
    }

    #[test]
    fn floats_use_their_bit_pattern() {
        let mut bytes = [0_u8; 8];
        1.5_f64.write_le_slice(&mut bytes);
        assert_eq!(u64::from_le_slice(&bytes), 1.5_f64.to_bits());
        assert_eq!(f32::SIZE, 4);
    }
}
