use std::fmt::{self, Write};

use crate::error::{Error, Result};

pub const BITS_PER_BYTE: usize = 8;

/// Line width used by the `Display` impl.
pub const DEFAULT_WRAP_WIDTH: usize = 80;

/// Fixed-size array of bits packed eight to a byte, least significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitArray {
    bytes: Box<[u8]>,
    num_bits: usize,
}

impl BitArray {
    // Create a new BitArray with a given number of bits, all clear
    pub fn new(num_bits: usize) -> Result<Self> {
        if num_bits == 0 {
            return Err(Error::InvalidSize(0));
        }

        let num_bytes = num_bits.div_ceil(BITS_PER_BYTE);
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(num_bytes)
            .map_err(|_| Error::OutOfMemory { bytes: num_bytes })?;
        bytes.resize(num_bytes, 0);

        log::debug!("allocated bit array of {} bits in {} bytes", num_bits, num_bytes);

        Ok(BitArray {
            bytes: bytes.into_boxed_slice(),
            num_bits,
        })
    }

    // Same as `new`, for sizes coming from signed input
    pub fn with_signed_size(num_bits: i64) -> Result<Self> {
        match usize::try_from(num_bits) {
            Ok(num_bits) => Self::new(num_bits),
            Err(_) => Err(Error::InvalidSize(num_bits)),
        }
    }

    /// Releases the buffer. Taking `self` by value means the array cannot be
    /// touched again afterwards:
    ///
    /// ```compile_fail
    /// let array = bitarray::BitArray::new(8).unwrap();
    /// array.destroy();
    /// array.len();
    /// ```
    pub fn destroy(self) {
        log::debug!("releasing bit array of {} bits", self.num_bits);
    }

    // Map a bit position to its byte and single-bit mask
    fn locate(&self, position: usize) -> Result<(usize, u8)> {
        if position >= self.num_bits {
            return Err(Error::IndexOutOfBounds {
                index: i64::try_from(position).unwrap_or(i64::MAX),
                size: self.num_bits,
            });
        }
        let byte = position / BITS_PER_BYTE;
        let offset = position % BITS_PER_BYTE;
        Ok((byte, 1 << offset))
    }

    /// Converts a signed index into a position, rejecting anything outside `[0, len)`.
    pub fn checked_position(&self, index: i64) -> Result<usize> {
        match usize::try_from(index) {
            Ok(position) if position < self.num_bits => Ok(position),
            _ => Err(Error::IndexOutOfBounds {
                index,
                size: self.num_bits,
            }),
        }
    }

    // Set a specific bit
    pub fn set_bit(&mut self, position: usize) -> Result<()> {
        let (byte, mask) = self.locate(position)?;
        self.bytes[byte] |= mask;
        Ok(())
    }

    // Clear a specific bit, whatever its current value
    pub fn unset_bit(&mut self, position: usize) -> Result<()> {
        let (byte, mask) = self.locate(position)?;
        self.bytes[byte] &= !mask;
        Ok(())
    }

    // Set a boolean value for a specific bit
    pub fn set_bool(&mut self, position: usize, value: bool) -> Result<()> {
        if value {
            self.set_bit(position)
        } else {
            self.unset_bit(position)
        }
    }

    // Read a specific bit as 0 or 1
    pub fn get_bit(&self, position: usize) -> Result<u8> {
        self.locate(position)?;
        Ok(self.bit(position))
    }

    pub fn is_bit_set(&self, position: usize) -> Result<bool> {
        self.get_bit(position).map(|bit| bit == 1)
    }

    // Callers must have bounds checked `position`
    fn bit(&self, position: usize) -> u8 {
        (self.bytes[position / BITS_PER_BYTE] >> (position % BITS_PER_BYTE)) & 1
    }

    pub fn len(&self) -> usize {
        self.num_bits
    }

    // Always false, construction rejects zero sized arrays
    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Renders the array with the bit string broken every `width` characters.
    /// A width of zero keeps the bits on a single line.
    pub fn render_wrapped(&self, width: usize) -> Wrapped<'_> {
        Wrapped { array: self, width }
    }
}

pub struct Wrapped<'a> {
    array: &'a BitArray,
    width: usize,
}

impl fmt::Display for Wrapped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let array = self.array;
        writeln!(f, "size: {} bits", array.len())?;
        writeln!(f, "bytes: {}", array.byte_len())?;
        for position in 0..array.len() {
            if self.width != 0 && position != 0 && position % self.width == 0 {
                f.write_char('\n')?;
            }
            f.write_char(if array.bit(position) == 1 { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl fmt::Display for BitArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.render_wrapped(DEFAULT_WRAP_WIDTH), f)
    }
}
