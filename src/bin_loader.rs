use std::fs::File;
use std::io::Read;
use std::path::Path;

use bincode::{deserialize, serialize};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{KeygenError, Result};

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serialize(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(deserialize(bytes)?)
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut buffer = vec![];
    let mut file = File::open(path).map_err(|err| KeygenError::io(path, err))?;
    file.read_to_end(&mut buffer)
        .map_err(|err| KeygenError::io(path, err))?;
    Ok(buffer)
}

pub fn load_from_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    decode(&read_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_truncated_bytes() {
        let bytes = encode(&(7u64, String::from("aes128"))).unwrap();
        let result: Result<(u64, String)> = decode(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(KeygenError::Serialization(_))));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let path = Path::new("/nonexistent/cipher-keygen/r1cs.aes128");
        match read_file(path) {
            Err(KeygenError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
