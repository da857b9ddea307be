//! DNS message codec on top of hickory-proto (RFC 1035 §4, RFC 6891).
//!
//! Query admission reads the header and OPT record by hand; everything else
//! goes through hickory's decoder and `BinEncoder`.

mod edns;
mod header;
mod message;
mod record_map;
mod writer;

pub use edns::{parse_opt, EdnsInfo, OPT_RECORD};
pub use header::Header;
pub use message::{locate_opt, read_question, ParsedMessage};
pub use record_map::RecordMapper;
pub use writer::{EncodedMessage, MessageWriter, Section};

use ferrous_dnsproxy_domain::DomainError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("message truncated at offset {0}")]
    Truncated(usize),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Malformed(#[from] DomainError),
}
