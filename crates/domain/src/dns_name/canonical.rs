use super::DomainName;
use std::cmp::Ordering;

/// Outcome of a DNSSEC canonical comparison (RFC 4034 §6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalOrder {
    pub ordering: Ordering,
    /// The left name is a strict subdomain of the right one.
    pub subdomain: bool,
}

fn compare_label(a: &[u8], b: &[u8]) -> Ordering {
    let common = a.len().min(b.len());
    for i in 0..common {
        let (x, y) = (a[i].to_ascii_lowercase(), b[i].to_ascii_lowercase());
        if x != y {
            return x.cmp(&y);
        }
    }
    a.len().cmp(&b.len())
}

impl DomainName {
    /// Compares right to left, label by label. When every shared label is
    /// equal, the name with fewer labels sorts first.
    pub fn canonical_order(&self, other: &DomainName) -> CanonicalOrder {
        let left: Vec<&[u8]> = self.labels().collect();
        let right: Vec<&[u8]> = other.labels().collect();

        for (a, b) in left.iter().rev().zip(right.iter().rev()) {
            let ordering = compare_label(a, b);
            if ordering != Ordering::Equal {
                return CanonicalOrder {
                    ordering,
                    subdomain: false,
                };
            }
        }

        let ordering = left.len().cmp(&right.len());
        CanonicalOrder {
            ordering,
            subdomain: ordering == Ordering::Greater,
        }
    }

    pub fn canonical_cmp(&self, other: &DomainName) -> Ordering {
        self.canonical_order(other).ordering
    }

    /// Number of equal labels shared by both names, counted from the right.
    pub fn count_labels_match(&self, other: &DomainName) -> usize {
        let left: Vec<&[u8]> = self.labels().collect();
        let right: Vec<&[u8]> = other.labels().collect();
        left.iter()
            .rev()
            .zip(right.iter().rev())
            .take_while(|(a, b)| a.eq_ignore_ascii_case(b))
            .count()
    }

    /// True when `self` is `ancestor` or lies below it.
    pub fn ends_with(&self, ancestor: &DomainName) -> bool {
        self.count_labels_match(ancestor) == ancestor.label_count()
    }

    /// True when `self` lies strictly below `ancestor`.
    pub fn is_subdomain_of(&self, ancestor: &DomainName) -> bool {
        self.canonical_order(ancestor).subdomain
    }
}
