//! Prefix-to-range conversion for range-based stores.

/// Exclusive upper bound of the key range covered by `prefix`.
///
/// The last byte that is not `0xff` is incremented and everything after it
/// dropped. A prefix made only of `0xff` bytes (or an empty prefix) has no
/// upper bound; the range then ends at `\0`, which the store reads as "to the
/// end of the keyspace".
pub fn prefix_range_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xff {
            end.push(last + 1);
            return end;
        }
    }
    vec![0]
}

/// Key to send for a prefix read. The empty prefix maps to `\0` so that the
/// range `[\0, \0)` covers every key.
pub fn prefix_range_start(prefix: &[u8]) -> Vec<u8> {
    if prefix.is_empty() {
        vec![0]
    } else {
        prefix.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_prefix() {
        assert_eq!(prefix_range_end(b"cfg/"), b"cfg0");
        assert_eq!(prefix_range_end(b"a"), b"b");
    }

    #[test]
    fn trailing_ff_is_dropped() {
        assert_eq!(prefix_range_end(&[b'a', 0xff]), b"b");
        assert_eq!(prefix_range_end(&[0x01, 0xff, 0xff]), vec![0x02]);
    }

    #[test]
    fn unbounded_prefixes() {
        assert_eq!(prefix_range_end(b""), vec![0]);
        assert_eq!(prefix_range_end(&[0xff, 0xff]), vec![0]);
    }

    #[test]
    fn empty_prefix_starts_at_nul() {
        assert_eq!(prefix_range_start(b""), vec![0]);
        assert_eq!(prefix_range_start(b"x"), b"x");
    }
}
