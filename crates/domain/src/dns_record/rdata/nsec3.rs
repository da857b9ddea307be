use super::TypeBitmap;
use crate::dns_record::RecordType;

pub const NSEC3_FLAG_OPT_OUT: u8 = 0x01;
pub const NSEC3_HASH_SHA1: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nsec3Data {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
    pub next_hashed_owner: Vec<u8>,
    pub types: TypeBitmap,
}

impl Nsec3Data {
    pub fn opt_out(&self) -> bool {
        self.flags & NSEC3_FLAG_OPT_OUT != 0
    }

    pub fn has_type(&self, rtype: RecordType) -> bool {
        self.types.contains(rtype)
    }

    /// Same hash algorithm, iterations and salt. Flags are not compared.
    pub fn same_parameters(&self, other: &Nsec3Data) -> bool {
        self.hash_algorithm == other.hash_algorithm
            && self.iterations == other.iterations
            && self.salt == other.salt
    }
}
