//! Domain names in uncompressed wire form.
//!
//! A [`DomainName`] keeps the original letter case of every label but all
//! comparisons, hashing and ordering ignore ASCII case, so `WWW.Example.`
//! and `www.example.` are the same name.

mod canonical;

pub use canonical::CanonicalOrder;

use crate::errors::DomainError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_LABEL_LENGTH: usize = 63;

const ROOT_WIRE: [u8; 1] = [0];

#[derive(Clone)]
pub struct DomainName {
    wire: Arc<[u8]>,
}

impl DomainName {
    pub fn root() -> Self {
        Self {
            wire: Arc::from(&ROOT_WIRE[..]),
        }
    }

    /// Builds a name from its labels, leftmost first. The root label is implied.
    pub fn from_labels<I, L>(labels: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut wire = Vec::with_capacity(32);
        for label in labels {
            let label = label.as_ref();
            if label.is_empty() {
                return Err(DomainError::InvalidDomainName("empty label".into()));
            }
            if label.len() > MAX_LABEL_LENGTH {
                return Err(DomainError::InvalidDomainName(format!(
                    "label of {} octets exceeds {}",
                    label.len(),
                    MAX_LABEL_LENGTH
                )));
            }
            wire.push(label.len() as u8);
            wire.extend_from_slice(label);
        }
        wire.push(0);
        if wire.len() > MAX_NAME_LENGTH {
            return Err(DomainError::InvalidDomainName(format!(
                "name of {} octets exceeds {}",
                wire.len(),
                MAX_NAME_LENGTH
            )));
        }
        Ok(Self {
            wire: Arc::from(wire),
        })
    }

    /// Parses an uncompressed name at the start of `data`, returning the name
    /// and the number of octets it occupied.
    pub fn from_wire(data: &[u8]) -> Result<(Self, usize), DomainError> {
        let mut pos = 0;
        loop {
            let Some(&len) = data.get(pos) else {
                return Err(DomainError::InvalidDomainName("name truncated".into()));
            };
            let len = len as usize;
            if len == 0 {
                pos += 1;
                break;
            }
            if len > MAX_LABEL_LENGTH {
                return Err(DomainError::InvalidDomainName(format!(
                    "invalid label length {}",
                    len
                )));
            }
            if pos + 1 + len > data.len() {
                return Err(DomainError::InvalidDomainName("label truncated".into()));
            }
            pos += 1 + len;
            if pos + 1 > MAX_NAME_LENGTH {
                return Err(DomainError::InvalidDomainName("name too long".into()));
            }
        }
        Ok((
            Self {
                wire: Arc::from(&data[..pos]),
            },
            pos,
        ))
    }

    pub fn as_wire(&self) -> &[u8] {
        &self.wire
    }

    pub fn wire_len(&self) -> usize {
        self.wire.len()
    }

    /// Wire form with every ASCII letter lowercased, as used for DNSSEC
    /// signing and NSEC3 hashing.
    pub fn canonical_wire(&self) -> Vec<u8> {
        self.wire.to_ascii_lowercase()
    }

    pub fn to_lowercase(&self) -> Self {
        Self {
            wire: Arc::from(self.canonical_wire()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.wire.len() == 1
    }

    pub fn label_count(&self) -> usize {
        self.labels().count()
    }

    pub fn labels(&self) -> Labels<'_> {
        Labels {
            wire: &self.wire,
            pos: 0,
        }
    }

    pub fn first_label(&self) -> Option<&[u8]> {
        self.labels().next()
    }

    pub fn is_wildcard(&self) -> bool {
        self.first_label() == Some(b"*")
    }

    /// Drops `count` labels from the left. Skipping past the last label yields the root.
    pub fn skip_leading_labels(&self, count: usize) -> Self {
        let mut pos = 0;
        for _ in 0..count {
            match self.wire.get(pos) {
                Some(&len) if len != 0 => pos += 1 + len as usize,
                _ => break,
            }
        }
        match self.wire.get(pos..) {
            Some(rest) if !rest.is_empty() => Self {
                wire: Arc::from(rest),
            },
            _ => Self::root(),
        }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(self.skip_leading_labels(1))
        }
    }

    pub fn prepend_label(&self, label: &[u8]) -> Result<Self, DomainError> {
        let mut labels: Vec<&[u8]> = Vec::with_capacity(self.label_count() + 1);
        labels.push(label);
        labels.extend(self.labels());
        Self::from_labels(labels)
    }

    /// `*.<self>`, the wildcard owner that could synthesize answers below this name.
    pub fn wildcard_child(&self) -> Result<Self, DomainError> {
        self.prepend_label(b"*")
    }

    /// Case-insensitive hash of the name, stable across letter case.
    pub fn hash_value(&self) -> u32 {
        let mut sum: u32 = 0;
        for &b in self.wire.iter() {
            sum = sum
                .wrapping_mul(37)
                .wrapping_add(u32::from(b.to_ascii_lowercase()));
        }
        sum
    }
}

/// Iterator over the labels of a name, leftmost first, without the root label.
pub struct Labels<'a> {
    wire: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.wire.get(self.pos)? as usize;
        if len == 0 {
            return None;
        }
        let start = self.pos + 1;
        self.pos = start + len;
        self.wire.get(start..start + len)
    }
}

impl PartialEq for DomainName {
    fn eq(&self, other: &Self) -> bool {
        self.wire.eq_ignore_ascii_case(&other.wire)
    }
}

impl Eq for DomainName {}

impl Hash for DomainName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.wire.iter() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for DomainName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DomainName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.canonical_cmp(other)
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in self.labels() {
            for &b in label {
                match b {
                    b'.' | b'\\' => write!(f, "\\{}", b as char)?,
                    0x21..=0x7e => write!(f, "{}", b as char)?,
                    _ => write!(f, "\\{:03}", b)?,
                }
            }
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainName({})", self)
    }
}

impl FromStr for DomainName {
    type Err = DomainError;

    /// Parses presentation format. A trailing dot is optional; `\.` and
    /// `\DDD` escapes are honoured.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }
        let bytes = s.as_bytes();
        let mut labels: Vec<Vec<u8>> = Vec::new();
        let mut current = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    let escaped = &bytes[i + 1..];
                    if escaped.len() >= 3 && escaped[..3].iter().all(u8::is_ascii_digit) {
                        let value = escaped[..3]
                            .iter()
                            .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'));
                        if value > 255 {
                            return Err(DomainError::InvalidDomainName(format!(
                                "escape out of range in {}",
                                s
                            )));
                        }
                        current.push(value as u8);
                        i += 4;
                    } else if let Some(&c) = escaped.first() {
                        current.push(c);
                        i += 2;
                    } else {
                        return Err(DomainError::InvalidDomainName(format!(
                            "dangling escape in {}",
                            s
                        )));
                    }
                }
                b'.' => {
                    if current.is_empty() {
                        return Err(DomainError::InvalidDomainName(format!(
                            "empty label in {}",
                            s
                        )));
                    }
                    labels.push(std::mem::take(&mut current));
                    i += 1;
                }
                c => {
                    current.push(c);
                    i += 1;
                }
            }
        }
        if !current.is_empty() {
            labels.push(current);
        }
        Self::from_labels(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_presentation_with_and_without_trailing_dot() {
        let a: DomainName = "www.Example.com.".parse().unwrap();
        let b: DomainName = "WWW.example.COM".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.label_count(), 3);
        assert_eq!(a.to_string(), "www.Example.com.");
    }

    #[test]
    fn rejects_empty_and_oversized_labels() {
        assert!("a..b".parse::<DomainName>().is_err());
        let long = "a".repeat(64);
        assert!(long.parse::<DomainName>().is_err());
    }

    #[test]
    fn skip_leading_labels_saturates_at_root() {
        let name: DomainName = "a.b.c".parse().unwrap();
        assert_eq!(name.skip_leading_labels(1).to_string(), "b.c.");
        assert!(name.skip_leading_labels(7).is_root());
    }

    #[test]
    fn skip_leading_labels_never_indexes_past_the_name() {
        for text in [".", "a.", "a.b.c", "\\000.\\000.x", "*.example."] {
            let name: DomainName = text.parse().unwrap();
            let labels = name.label_count();
            for count in 0..=labels + 300 {
                let rest = name.skip_leading_labels(count);
                assert_eq!(
                    rest.label_count(),
                    labels.saturating_sub(count),
                    "{} minus {}",
                    text,
                    count
                );
            }
        }
    }

    #[test]
    fn escapes_round_trip_through_display() {
        let name: DomainName = "a\\.b.example".parse().unwrap();
        assert_eq!(name.label_count(), 2);
        assert_eq!(name.to_string(), "a\\.b.example.");
    }
}
