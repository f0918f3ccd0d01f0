use crate::Errors;
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Leading bytes of every tracker archive
pub const ARCHIVE_MAGIC: [u8; 4] = *b"MOSF";

/// Current archive layout version
pub const ARCHIVE_VERSION: u32 = 1;

const HEADER_LEN: usize = ARCHIVE_MAGIC.len() + std::mem::size_of::<u32>();

/// Magic, little-endian version, then the `bincode` encoded tracker records
///
pub fn encode<T: Serialize>(trackers: &[T]) -> Result<Vec<u8>> {
    let body = bincode::serde::encode_to_vec(trackers, bincode::config::standard())
        .map_err(|e| Errors::ArchiveEncode(e.to_string()))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(&ARCHIVE_MAGIC);
    bytes.extend_from_slice(&ARCHIVE_VERSION.to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    if bytes.len() < HEADER_LEN || bytes[..ARCHIVE_MAGIC.len()] != ARCHIVE_MAGIC {
        return Err(Errors::ArchiveMagic.into());
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[ARCHIVE_MAGIC.len()..HEADER_LEN]);
    let version = u32::from_le_bytes(version);
    if version != ARCHIVE_VERSION {
        return Err(Errors::ArchiveVersion(version).into());
    }
    let body = &bytes[HEADER_LEN..];
    let (trackers, consumed) =
        bincode::serde::decode_from_slice(body, bincode::config::standard())
            .map_err(|e| Errors::ArchiveDecode(e.to_string()))?;
    if consumed != body.len() {
        return Err(Errors::ArchiveDecode(format!(
            "{} trailing bytes after the tracker records",
            body.len() - consumed
        ))
        .into());
    }
    Ok(trackers)
}

pub fn write<T: Serialize, P: AsRef<Path>>(path: P, trackers: &[T]) -> Result<()> {
    let bytes = encode(trackers)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

pub fn read<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use crate::trackers::collection::archive::{decode, encode, ARCHIVE_MAGIC};
    use crate::Errors;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        id: u32,
        values: Vec<f32>,
    }

    fn records() -> Vec<Record> {
        vec![
            Record {
                id: 1,
                values: vec![0.5, -1.25],
            },
            Record {
                id: 2,
                values: vec![],
            },
        ]
    }

    #[test]
    fn header_layout() {
        let bytes = encode(&records()).unwrap();
        assert_eq!(bytes[..4], ARCHIVE_MAGIC);
        assert_eq!(bytes[4..8], [1, 0, 0, 0]);
        assert_eq!(decode::<Record>(&bytes).unwrap(), records());
    }

    #[test]
    fn foreign_bytes() {
        let err = decode::<Record>(b"PK\x03\x04 not an archive").unwrap_err();
        assert_eq!(err.downcast_ref::<Errors>(), Some(&Errors::ArchiveMagic));
        assert!(decode::<Record>(b"MO").is_err());
    }

    #[test]
    fn future_version() {
        let mut bytes = encode(&records()).unwrap();
        bytes[4] = 2;
        let err = decode::<Record>(&bytes).unwrap_err();
        assert_eq!(err.downcast_ref::<Errors>(), Some(&Errors::ArchiveVersion(2)));
    }

    #[test]
    fn trailing_bytes() {
        let mut bytes = encode(&records()).unwrap();
        bytes.extend_from_slice(&[0, 0]);
        let err = decode::<Record>(&bytes).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Errors>(),
            Some(Errors::ArchiveDecode(_))
        ));
    }

    #[test]
    fn truncated_body() {
        let bytes = encode(&records()).unwrap();
        let err = decode::<Record>(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Errors>(),
            Some(Errors::ArchiveDecode(_))
        ));
    }
}
