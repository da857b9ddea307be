use crate::dns_name::DomainName;
use crate::dns_record::{RecordType, CLASS_IN};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsQuestion {
    pub name: DomainName,
    pub qtype: RecordType,
    pub qclass: u16,
}

impl DnsQuestion {
    pub fn new(name: DomainName, qtype: RecordType) -> Self {
        Self {
            name,
            qtype,
            qclass: CLASS_IN,
        }
    }

    pub fn with_class(name: DomainName, qtype: RecordType, qclass: u16) -> Self {
        Self {
            name,
            qtype,
            qclass,
        }
    }

    /// Same question asked about another name, as when following a CNAME.
    pub fn retarget(&self, name: DomainName) -> Self {
        Self {
            name,
            qtype: self.qtype,
            qclass: self.qclass,
        }
    }
}
