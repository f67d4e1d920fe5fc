//! Fixed-width composite key encoding for record-oriented backends

/// Encodes a (namespace, key) pair into a fixed-width external key
///
/// Each field is truncated to its configured width or right-padded with
/// ASCII spaces, then the two fields are concatenated with no separator, so
/// the output length is always `namespace_width + key_width`.
///
/// Two lossy properties are inherent to the scheme and not corrected here:
/// padding is indistinguishable from real trailing spaces in the input, and
/// distinct inputs sharing a truncated prefix collide. De-duplication is the
/// backend's responsibility.
#[derive(Clone, Debug)]
pub struct CompositeKeyCodec {
    namespace_width: usize,
    key_width: usize,
}

impl Default for CompositeKeyCodec {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl CompositeKeyCodec {
    /// Create a codec with the given field widths
    pub fn new(namespace_width: usize, key_width: usize) -> Self {
        Self {
            namespace_width,
            key_width,
        }
    }

    /// Total length of every encoded key
    pub fn encoded_len(&self) -> usize {
        self.namespace_width + self.key_width
    }

    /// Encode a (namespace, key) pair into the external key
    pub fn encode(&self, namespace: &str, key: &str) -> String {
        let mut encoded = String::with_capacity(self.encoded_len());
        encoded.push_str(&fixed_field(namespace, self.namespace_width));
        encoded.push_str(&fixed_field(key, self.key_width));
        encoded
    }

    /// The namespace field alone, as it appears at the front of every
    /// encoded key of that namespace
    pub fn namespace_field(&self, namespace: &str) -> String {
        fixed_field(namespace, self.namespace_width)
    }
}

/// Truncate to `width` characters or right-pad with spaces up to it
fn fixed_field(value: &str, width: usize) -> String {
    let mut field: String = value.chars().take(width).collect();
    let used = field.chars().count();
    for _ in used..width {
        field.push(' ');
    }
    field
}
