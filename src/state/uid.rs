//! Connection identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a connection and, once registered, of its user.
pub type Uid = String;

/// Hands out unique uids: the server id followed by a six character
/// base36 counter, e.g. `001AAAAAA`.
pub struct UidGenerator {
    sid: String,
    counter: AtomicU64,
}

impl UidGenerator {
    pub fn new(sid: String) -> Self {
        Self {
            sid,
            counter: AtomicU64::new(0),
        }
    }

    pub fn next(&self) -> Uid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.sid, base36_encode_6(n))
    }
}

fn base36_encode_6(mut n: u64) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut result = [b'A'; 6];

    for slot in result.iter_mut().rev() {
        *slot = CHARS[(n % 36) as usize];
        n /= 36;
    }

    result.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_generation() {
        let generator = UidGenerator::new("042".to_string());
        assert_eq!(generator.next(), "042AAAAAA");
        assert_eq!(generator.next(), "042AAAAAB");
    }

    #[test]
    fn test_base36_encode() {
        assert_eq!(base36_encode_6(35), "AAAAA9");
        assert_eq!(base36_encode_6(36), "AAAABA");
    }
}
