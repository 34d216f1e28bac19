//! Calibration matrix persistence
//!
//! The matrix record is seven little-endian `i32` fields in the order
//! `(An, Bn, Cn, Dn, En, Fn, Divider)`, 28 bytes, suitable for an EEPROM or
//! flash page. Calibration files wrap one record in a small envelope:
//!
//! ```text
//! offset  size  field
//! 0       4     magic "TCAL"
//! 4       2     version (u16 LE, currently 1)
//! 6       2     reserved (0)
//! 8       28    matrix record
//! 36      4     CRC-32/ISO-HDLC over bytes 0..36 (u32 LE)
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc::{Crc, CRC_32_ISO_HDLC};
use log::debug;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::StorageError;
use crate::matrix::{Matrix, MatrixFields};

/// Size of the bare matrix record
pub const RECORD_LEN: usize = 7 * 4;

/// Size of a complete calibration file
pub const FILE_LEN: usize = 8 + RECORD_LEN + 4;

/// Calibration file magic
pub const MAGIC: [u8; 4] = *b"TCAL";

/// Current calibration file version
pub const VERSION: u16 = 1;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Write the 28-byte matrix record
pub fn write_record<W: Write>(writer: &mut W, matrix: &Matrix) -> Result<(), StorageError> {
    for field in matrix.to_array() {
        writer.write_i32::<LittleEndian>(field)?;
    }
    Ok(())
}

/// Read a 28-byte matrix record, rejecting a zero divider
pub fn read_record<R: Read>(reader: &mut R) -> Result<Matrix, StorageError> {
    let fields = read_fields(reader)?;
    matrix_from_fields(fields)
}

fn read_fields<R: Read>(reader: &mut R) -> Result<[i32; 7], StorageError> {
    let mut fields = [0i32; 7];
    reader.read_i32_into::<LittleEndian>(&mut fields)?;
    Ok(fields)
}

fn matrix_from_fields(fields: [i32; 7]) -> Result<Matrix, StorageError> {
    let [an, bn, cn, dn, en, fn_, divider] = fields;
    Matrix::from_fields(MatrixFields { an, bn, cn, dn, en, fn_, divider })
        .ok_or(StorageError::ZeroDivider)
}

/// Encode a complete calibration file
pub fn encode(matrix: &Matrix) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::with_capacity(FILE_LEN);
    bytes.write_all(&MAGIC)?;
    bytes.write_u16::<LittleEndian>(VERSION)?;
    bytes.write_u16::<LittleEndian>(0)?;
    write_record(&mut bytes, matrix)?;

    let checksum = CRC32.checksum(&bytes);
    bytes.write_u32::<LittleEndian>(checksum)?;
    Ok(bytes)
}

/// Decode a complete calibration file
pub fn decode(bytes: &[u8]) -> Result<Matrix, StorageError> {
    if bytes.len() != FILE_LEN {
        return Err(StorageError::BadLength {
            expected: FILE_LEN,
            actual: bytes.len(),
        });
    }

    let mut reader = bytes;

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(StorageError::BadMagic(magic));
    }

    let version = reader.read_u16::<LittleEndian>()?;
    if version != VERSION {
        return Err(StorageError::UnsupportedVersion(version));
    }
    let _reserved = reader.read_u16::<LittleEndian>()?;

    let fields = read_fields(&mut reader)?;
    let stored = reader.read_u32::<LittleEndian>()?;

    let computed = CRC32.checksum(&bytes[..FILE_LEN - 4]);
    if stored != computed {
        return Err(StorageError::ChecksumMismatch { stored, computed });
    }

    matrix_from_fields(fields)
}

/// Save a matrix to a calibration file
pub fn save(path: &Path, matrix: &Matrix) -> Result<(), StorageError> {
    fs::write(path, encode(matrix)?)?;
    debug!("Saved calibration matrix to {}", path.display());
    Ok(())
}

/// Load a matrix from a calibration file
pub fn load(path: &Path) -> Result<Matrix, StorageError> {
    let bytes = fs::read(path)?;
    let matrix = decode(&bytes)?;
    debug!("Loaded calibration matrix from {}: {}", path.display(), matrix);
    Ok(matrix)
}
