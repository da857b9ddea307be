//! Ferrous DNS Proxy Domain Layer
pub mod cache_record;
pub mod config;
pub mod dns_message;
pub mod dns_name;
pub mod dns_question;
pub mod dns_record;
pub mod dnssec_status;
pub mod errors;

pub use cache_record::{CacheGroup, CachedRecord, DenialKind, RecordKind};
pub use config::{Config, ConfigError};
pub use dns_message::{MessageFlags, Opcode, Rcode, HEADER_LEN};
pub use dns_name::{CanonicalOrder, DomainName};
pub use dns_question::DnsQuestion;
pub use dns_record::{RData, RecordType, ResourceRecord, CLASS_IN};
pub use dnssec_status::DnssecStatus;
pub use errors::DomainError;
