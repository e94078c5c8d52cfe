//! Creation time from ISO-BMFF / QuickTime containers (MP4, MOV, 3GP).
//!
//! Only the `moov/mvhd` box is read. Its creation time counts seconds since
//! 1904-01-01 UTC; zero means the recorder did not set it.

use crate::error::MetadataError;
use chrono::{DateTime, Datelike};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Seconds between 1904-01-01 and 1970-01-01
const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

pub(super) fn creation_year(path: &Path) -> Result<Option<i32>, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    read_creation_seconds(&mut reader)
        .map(|secs| secs.and_then(mac_seconds_to_year))
        .map_err(|e| MetadataError::Container {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn read_creation_seconds<R: Read + Seek>(reader: &mut R) -> io::Result<Option<u64>> {
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let Some((moov_start, moov_end)) = find_box(reader, end, b"moov")? else {
        return Ok(None);
    };
    reader.seek(SeekFrom::Start(moov_start))?;
    let Some((mvhd_start, _)) = find_box(reader, moov_end, b"mvhd")? else {
        return Ok(None);
    };
    reader.seek(SeekFrom::Start(mvhd_start))?;

    let mut version_flags = [0u8; 4];
    reader.read_exact(&mut version_flags)?;
    let created = if version_flags[0] == 1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        u64::from_be_bytes(buf)
    } else {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        u32::from_be_bytes(buf) as u64
    };

    Ok((created != 0).then_some(created))
}

/// Scan sibling boxes from the current position up to `end`. Returns the
/// payload range of the first box named `name`.
fn find_box<R: Read + Seek>(reader: &mut R, end: u64, name: &[u8; 4]) -> io::Result<Option<(u64, u64)>> {
    loop {
        let pos = reader.stream_position()?;
        if pos + 8 > end {
            return Ok(None);
        }

        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let (header_len, size) = match size32 {
            0 => (8, end - pos),
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large)?;
                (16, u64::from_be_bytes(large))
            }
            n => (8, n as u64),
        };

        if size < header_len || pos.checked_add(size).map_or(true, |box_end| box_end > end) {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "box size out of range"));
        }

        if &header[4..8] == name {
            return Ok(Some((pos + header_len, pos + size)));
        }
        reader.seek(SeekFrom::Start(pos + size))?;
    }
}

fn mac_seconds_to_year(secs: u64) -> Option<i32> {
    let unix = i64::try_from(secs).ok()? - MAC_EPOCH_OFFSET;
    DateTime::from_timestamp(unix, 0).map(|dt| dt.year())
}
