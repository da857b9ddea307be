use crate::dns_record::RecordType;
use std::fmt;

/// Set of types named by an NSEC or NSEC3 type bitmap, ordered by type code.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct TypeBitmap {
    types: Vec<RecordType>,
}

impl TypeBitmap {
    pub fn from_types(types: &[RecordType]) -> Self {
        let mut types = types.to_vec();
        types.sort_by_key(RecordType::to_u16);
        types.dedup_by_key(|rtype| rtype.to_u16());
        Self { types }
    }

    pub fn contains(&self, rtype: RecordType) -> bool {
        self.types
            .binary_search_by_key(&rtype.to_u16(), RecordType::to_u16)
            .is_ok()
    }

    pub fn types(&self) -> Vec<RecordType> {
        self.types.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<RecordType> for TypeBitmap {
    fn from_iter<I: IntoIterator<Item = RecordType>>(iter: I) -> Self {
        let collected: Vec<RecordType> = iter.into_iter().collect();
        Self::from_types(&collected)
    }
}

impl fmt::Debug for TypeBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.types).finish()
    }
}
