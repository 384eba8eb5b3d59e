use crate::value::Value;
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

///
/// IdentityKey
///
/// Deterministic record identity derived from the identifying-field values
/// in declaration order. The canonical byte encoding is kept alongside the
/// hash so equal hashes never conflate distinct identities.
///

#[derive(Clone, Eq, Ord, PartialEq, PartialOrd)]
pub struct IdentityKey {
    hash: u64,
    bytes: Box<[u8]>,
}

impl IdentityKey {
    /// Derive the key from identifying values in declaration order.
    #[must_use]
    pub fn derive(values: &[Value]) -> Self {
        let mut bytes = Vec::new();
        for value in values {
            encode_value(value, &mut bytes);
        }
        let hash = xxh3_64(&bytes);

        Self {
            hash,
            bytes: bytes.into_boxed_slice(),
        }
    }

    #[must_use]
    pub const fn hash(&self) -> u64 {
        self.hash
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityKey({:016x})", self.hash)
    }
}

// Canonical encoding: one tag byte, then a fixed- or length-prefixed
// payload, so no two value sequences share an encoding.
fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::None => out.push(0x00),
        Value::Bool(b) => {
            out.push(0x01);
            out.push(u8::from(*b));
        }
        Value::Int(n) => {
            out.push(0x02);
            out.extend_from_slice(&n.to_be_bytes());
        }
        Value::Uint(n) => {
            out.push(0x03);
            out.extend_from_slice(&n.to_be_bytes());
        }
        Value::Float64(f) => {
            out.push(0x04);
            out.extend_from_slice(&f.to_be_bytes());
        }
        Value::Text(s) => {
            out.push(0x05);
            out.extend_from_slice(&(s.len() as u64).to_be_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        Value::Timestamp(ts) => {
            out.push(0x06);
            out.extend_from_slice(&ts.to_be_bytes());
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::IdentityKey;
    use crate::value::Value;

    #[test]
    fn derivation_is_deterministic() {
        let a = IdentityKey::derive(&[Value::Uint(10), Value::Text("x".into())]);
        let b = IdentityKey::derive(&[Value::Uint(10), Value::Text("x".into())]);
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn distinct_values_produce_distinct_keys() {
        let a = IdentityKey::derive(&[Value::Uint(10)]);
        let b = IdentityKey::derive(&[Value::Uint(20)]);
        let c = IdentityKey::derive(&[Value::Int(10)]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn text_length_prefix_prevents_concatenation_tricks() {
        let a = IdentityKey::derive(&[Value::Text("ab".into()), Value::Text("c".into())]);
        let b = IdentityKey::derive(&[Value::Text("a".into()), Value::Text("bc".into())]);
        assert_ne!(a, b);
    }
}
