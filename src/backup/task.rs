use derive_more::{Display, Into};
use itertools::Itertools;
use rand::Rng;

/// Number of random bytes behind a task hash
pub const TASK_HASH_BYTES: usize = 8;

/// Correlation id tagging every log line of one backup run.
///
/// Rendered as lowercase hex, twice [`TASK_HASH_BYTES`] characters long. It only
/// has to tell adjacent runs apart in logs and file names, so it is not drawn
/// from a cryptographic source.
#[derive(Clone, Debug, Default, Display, Into, PartialEq, Eq, Hash)]
pub struct TaskHash(String);

impl TaskHash {
    pub fn generate() -> Self {
        let bytes: [u8; TASK_HASH_BYTES] = rand::thread_rng().gen();
        Self::from_bytes(&bytes)
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|b| format!("{b:02x}")).join(""))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_task_hash_shape() {
        let hash = TaskHash::generate();
        assert_eq!(hash.as_str().len(), TASK_HASH_BYTES * 2);
        assert!(hash
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_task_hash_from_bytes_pads() {
        let hash = TaskHash::from_bytes(&[0x00, 0x0f, 0xa0, 0xff, 1, 2, 3, 4]);
        assert_eq!(hash.to_string(), "000fa0ff01020304");
    }

    #[test]
    fn test_task_hash_distinct() {
        let hashes: HashSet<_> = (0..64).map(|_| TaskHash::generate()).collect();
        assert_eq!(hashes.len(), 64);
    }
}
