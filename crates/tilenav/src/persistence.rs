//! Binary persistence of [`TileMap`]s.
//!
//! The format is a sequence of signed, zig-zag encoded LEB128 varints:
//! width, height, grid size, followed by `width * height` cell words in row-major order.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::tile_map::TileMap;

/// A varint never needs more than this many bytes for 64 bits of payload.
const MAX_VARINT_LEN: usize = 10;

impl TileMap {
    /// Reads a tile map from `reader`.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, truncated input, malformed varints and dimensions that are not positive.
    /// No partially read map is ever returned.
    pub fn read_from(mut reader: impl Read) -> Result<Self, TileMapReadError> {
        let width = read_dimension(&mut reader, "width")?;
        let height = read_dimension(&mut reader, "height")?;
        let grid_size = read_dimension(&mut reader, "grid size")?;

        let cell_count = width as u64 * height as u64;
        if cell_count > usize::MAX as u64 {
            return Err(TileMapReadError::CellOverflow { width, height });
        }
        let mut cells = Vec::with_capacity((cell_count as usize).min(1 << 20));
        for _ in 0..cell_count {
            cells.push(read_varint(&mut reader)? as u64);
        }
        tracing::debug!("Read {width}x{height} tile map with grid size {grid_size}");
        TileMap::from_cells(width, height, grid_size, cells)
            .ok_or(TileMapReadError::CellOverflow { width, height })
    }

    /// Writes the tile map to `writer`.
    pub fn write_to(&self, mut writer: impl Write) -> io::Result<()> {
        write_varint(&mut writer, self.width() as i64)?;
        write_varint(&mut writer, self.height() as i64)?;
        write_varint(&mut writer, self.grid_size() as i64)?;
        for cell in self.cells() {
            write_varint(&mut writer, *cell as i64)?;
        }
        Ok(())
    }

    /// Encodes the tile map into a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)
            .expect("writing to a Vec never fails");
        bytes
    }
}

fn read_dimension(reader: &mut impl Read, name: &'static str) -> Result<u32, TileMapReadError> {
    let value = read_varint(reader)?;
    if value <= 0 || value > u32::MAX as i64 {
        return Err(TileMapReadError::InvalidDimension { name, value });
    }
    Ok(value as u32)
}

/// Reads one signed varint.
pub(crate) fn read_varint(reader: &mut impl Read) -> Result<i64, TileMapReadError> {
    let mut encoded = 0_u64;
    let mut shift = 0_u32;
    for i in 0..MAX_VARINT_LEN {
        let mut byte = [0_u8; 1];
        if let Err(err) = reader.read_exact(&mut byte) {
            return Err(if err.kind() == io::ErrorKind::UnexpectedEof {
                TileMapReadError::Truncated
            } else {
                TileMapReadError::Io(err)
            });
        }
        let byte = byte[0];
        // The tenth byte may only carry the final bit.
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(TileMapReadError::MalformedVarint);
        }
        encoded |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(zigzag_decode(encoded));
        }
        shift += 7;
    }
    Err(TileMapReadError::MalformedVarint)
}

/// Writes one signed varint.
pub(crate) fn write_varint(writer: &mut impl Write, value: i64) -> io::Result<()> {
    let mut encoded = zigzag_encode(value);
    let mut buffer = [0_u8; MAX_VARINT_LEN];
    let mut len = 0;
    while encoded >= 0x80 {
        buffer[len] = (encoded as u8) | 0x80;
        encoded >>= 7;
        len += 1;
    }
    buffer[len] = encoded as u8;
    writer.write_all(&buffer[..=len])
}

#[inline]
fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
fn zigzag_decode(encoded: u64) -> i64 {
    ((encoded >> 1) as i64) ^ -((encoded & 1) as i64)
}

/// Errors that can occur when reading a [`TileMap`] with [`TileMap::read_from`].
#[derive(Error, Debug)]
pub enum TileMapReadError {
    /// The underlying reader failed.
    #[error("failed to read tile map")]
    Io(#[from] io::Error),
    /// The input ended in the middle of the map.
    #[error("tile map data is truncated")]
    Truncated,
    /// A varint was longer than 10 bytes or overflowed 64 bits.
    #[error("malformed varint in tile map data")]
    MalformedVarint,
    /// A header value was not a positive 32-bit number.
    #[error("invalid tile map {name}: {value}")]
    InvalidDimension {
        /// Which header field was invalid.
        name: &'static str,
        /// The value that was read.
        value: i64,
    },
    /// The map has more cells than fit into memory.
    #[error("tile map is too large: {width}x{height} cells")]
    CellOverflow {
        /// Number of columns.
        width: u32,
        /// Number of rows.
        height: u32,
    },
}

#[cfg(test)]
mod tests {
    use crate::{FixtureId, TileFlags};

    use super::*;

    fn encode(value: i64) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_varint(&mut bytes, value).unwrap();
        bytes
    }

    #[test]
    fn varint_matches_zigzag_encoding() {
        assert_eq!(encode(0), [0x00]);
        assert_eq!(encode(-1), [0x01]);
        assert_eq!(encode(1), [0x02]);
        assert_eq!(encode(63), [0x7e]);
        assert_eq!(encode(-64), [0x7f]);
        assert_eq!(encode(64), [0x80, 0x01]);
        assert_eq!(encode(i64::MIN).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn extreme_values_survive() {
        for value in [i64::MIN, i64::MAX, -300, 300] {
            let bytes = encode(value);
            assert_eq!(read_varint(&mut bytes.as_slice()).unwrap(), value);
        }
    }

    #[test]
    fn tile_map_survives_persistence() {
        let mut map = TileMap::new(3, 2, 24);
        map.set(0, 0, TileFlags::FLOOR | TileFlags::WALL_SOUTH);
        map.set(1, 2, TileFlags::FLOOR | TileFlags::DOOR_NORTH);
        map.set_fixture(1, 2, FixtureId::new(u32::MAX));

        let read = TileMap::read_from(map.to_bytes().as_slice()).unwrap();
        assert_eq!(read, map);
    }

    #[test]
    fn truncated_input_is_an_error() {
        let map = TileMap::new(4, 4, 8);
        let bytes = map.to_bytes();
        let err = TileMap::read_from(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, TileMapReadError::Truncated));
    }

    #[test]
    fn overlong_varint_is_an_error() {
        let bytes = [0xff_u8; 11];
        let err = TileMap::read_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, TileMapReadError::MalformedVarint));
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        let mut bytes = encode(0);
        bytes.extend(encode(1));
        bytes.extend(encode(1));
        let err = TileMap::read_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            TileMapReadError::InvalidDimension { name: "width", value: 0 }
        ));
    }
}
