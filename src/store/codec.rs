//! Little-endian byte layout shared by the on-disk backends.
//!
//! A record is `u32 count`, then `count` f64 m/z values, then `count` f32
//! intensities. The embedded database stores the two value blocks in
//! separate columns and the count alongside them.

use std::io::{self, Cursor};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{StoreError, StoreHandle};
use crate::datapoints::DataPointContainer;

pub(crate) const COUNT_BYTES: usize = 4;
pub(crate) const POINT_BYTES: usize = 8 + 4;

/// Total encoded size of a record holding `count` points
pub(crate) fn record_size(count: usize) -> usize {
    COUNT_BYTES + count * POINT_BYTES
}

/// Point count as stored in the record header
pub(crate) fn record_count(len: usize) -> io::Result<u32> {
    u32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} data points do not fit in one record", len),
        )
    })
}

pub(crate) fn encode_record(data: &DataPointContainer, out: &mut Vec<u8>) -> io::Result<()> {
    let count = record_count(data.len())?;
    out.clear();
    out.reserve(record_size(data.len()));
    out.write_u32::<LittleEndian>(count)?;
    encode_mz(data.mz_buffer(), out)?;
    encode_intensity(data.intensity_buffer(), out)?;
    Ok(())
}

pub(crate) fn encode_mz(values: &[f64], out: &mut Vec<u8>) -> io::Result<()> {
    for &v in values {
        out.write_f64::<LittleEndian>(v)?;
    }
    Ok(())
}

pub(crate) fn encode_intensity(values: &[f32], out: &mut Vec<u8>) -> io::Result<()> {
    for &v in values {
        out.write_f32::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Read the point count from the head of an encoded record
pub(crate) fn decode_count(bytes: &[u8]) -> io::Result<usize> {
    Cursor::new(bytes)
        .read_u32::<LittleEndian>()
        .map(|n| n as usize)
}

pub(crate) fn decode_record(
    bytes: &[u8],
    handle: StoreHandle,
    buf: &mut DataPointContainer,
) -> Result<(), StoreError> {
    let count = decode_count(bytes)?;
    if bytes.len() != record_size(count) {
        return Err(StoreError::CorruptedRecord {
            handle,
            reason: format!(
                "expected {} bytes for {} points, found {}",
                record_size(count),
                count,
                bytes.len()
            ),
        });
    }
    let mz_end = COUNT_BYTES + count * 8;
    decode_columns(&bytes[COUNT_BYTES..mz_end], &bytes[mz_end..], count, handle, buf)
}

pub(crate) fn decode_columns(
    mz_bytes: &[u8],
    intensity_bytes: &[u8],
    count: usize,
    handle: StoreHandle,
    buf: &mut DataPointContainer,
) -> Result<(), StoreError> {
    if mz_bytes.len() != count * 8 || intensity_bytes.len() != count * 4 {
        return Err(StoreError::CorruptedRecord {
            handle,
            reason: format!(
                "column sizes {}/{} do not match {} points",
                mz_bytes.len(),
                intensity_bytes.len(),
                count
            ),
        });
    }

    buf.clear();
    buf.allocate(count);
    let mut mz = Cursor::new(mz_bytes);
    let mut intensity = Cursor::new(intensity_bytes);
    for _ in 0..count {
        buf.push(
            mz.read_f64::<LittleEndian>()?,
            intensity.read_f32::<LittleEndian>()?,
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let data = DataPointContainer::from_vecs(vec![100.5, 200.25], vec![1.0, 2.0]).unwrap();
        let mut bytes = Vec::new();
        encode_record(&data, &mut bytes).unwrap();

        assert_eq!(bytes.len(), record_size(2));
        assert_eq!(&bytes[..4], &[2, 0, 0, 0]);

        let mut decoded = DataPointContainer::new();
        decode_record(&bytes, StoreHandle(7), &mut decoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_truncated_record_is_rejected() {
        let data = DataPointContainer::from_vecs(vec![100.0], vec![1.0]).unwrap();
        let mut bytes = Vec::new();
        encode_record(&data, &mut bytes).unwrap();
        bytes.pop();

        let err = decode_record(&bytes, StoreHandle(1), &mut DataPointContainer::new()).unwrap_err();
        assert!(matches!(err, StoreError::CorruptedRecord { .. }));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_record_count_overflow() {
        assert_eq!(record_count(3).unwrap(), 3);
        assert_eq!(record_count(u32::MAX as usize).unwrap(), u32::MAX);
        let err = record_count(u32::MAX as usize + 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
