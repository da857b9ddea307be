use super::TypeBitmap;
use crate::dns_name::DomainName;
use crate::dns_record::RecordType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsecData {
    pub next_name: DomainName,
    pub types: TypeBitmap,
}

impl NsecData {
    pub fn new(next_name: DomainName, types: &[RecordType]) -> Self {
        Self {
            next_name,
            types: TypeBitmap::from_types(types),
        }
    }

    pub fn has_type(&self, rtype: RecordType) -> bool {
        self.types.contains(rtype)
    }
}
