use crate::properties::tags::{BidiClass, GeneralCategory, IdentifierStatus};
use unicode_script::Script;

/// Properties of a single codepoint as seen through a [`super::PropertyStore`].
///
/// Records are copied by value into the detectors; the skeleton is borrowed
/// from the store that produced the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodepointRecord<'s> {
    pub codepoint: u32,
    pub script: Script,
    pub category: GeneralCategory,
    pub bidi_class: BidiClass,
    pub identifier_status: IdentifierStatus,
    pub skeleton: Option<&'s [u32]>,
}

impl<'s> CodepointRecord<'s> {
    /// Record returned for codepoints the dataset does not define.
    pub fn unassigned(codepoint: u32) -> Self {
        Self {
            codepoint,
            script: Script::Unknown,
            category: GeneralCategory::Unassigned,
            bidi_class: BidiClass::L,
            identifier_status: IdentifierStatus::Unassigned,
            skeleton: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.category != GeneralCategory::Unassigned
    }

    pub fn is_letter(&self) -> bool {
        self.category.is_letter()
    }

    /// Common, Inherited and Unknown never anchor a script decision.
    pub fn is_script_neutral(&self) -> bool {
        is_script_neutral(self.script)
    }

    /// The codepoint itself when no skeleton is recorded.
    pub fn skeleton_or_self(&self) -> SkeletonIter<'s> {
        match self.skeleton {
            Some(skeleton) => SkeletonIter::Mapped(skeleton.iter()),
            None => SkeletonIter::Identity(Some(self.codepoint)),
        }
    }

    pub fn as_char(&self) -> Option<char> {
        char::from_u32(self.codepoint)
    }
}

pub fn is_script_neutral(script: Script) -> bool {
    matches!(script, Script::Common | Script::Inherited | Script::Unknown)
}

pub enum SkeletonIter<'s> {
    Mapped(std::slice::Iter<'s, u32>),
    Identity(Option<u32>),
}

impl Iterator for SkeletonIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        match self {
            Self::Mapped(iter) => iter.next().copied(),
            Self::Identity(codepoint) => codepoint.take(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned_record_defaults() {
        let record = CodepointRecord::unassigned(0x10FFFF);
        assert!(!record.is_assigned());
        assert_eq!(record.script, Script::Unknown);
        assert_eq!(record.identifier_status, IdentifierStatus::Unassigned);
        assert!(record.skeleton.is_none());
        assert!(record.is_script_neutral());
    }

    #[test]
    fn test_skeleton_or_self() {
        let mapped = [0x61];
        let mut record = CodepointRecord::unassigned(0x430);
        assert_eq!(record.skeleton_or_self().collect::<Vec<_>>(), vec![0x430]);

        record.skeleton = Some(&mapped);
        assert_eq!(record.skeleton_or_self().collect::<Vec<_>>(), vec![0x61]);
    }
}
