use std::fmt;

/// Outcome of DNSSEC validation for an answer or a single RRset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DnssecStatus {
    Secure,
    Insecure,
    Bogus,
    /// No result yet, timed out, or the proof was abandoned.
    #[default]
    Indeterminate,
}

impl DnssecStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnssecStatus::Secure => "Secure",
            DnssecStatus::Insecure => "Insecure",
            DnssecStatus::Bogus => "Bogus",
            DnssecStatus::Indeterminate => "Indeterminate",
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, DnssecStatus::Secure)
    }
}

impl fmt::Display for DnssecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
