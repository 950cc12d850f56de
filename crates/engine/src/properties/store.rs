use crate::error::DatasetError;
use crate::properties::dataset::{Dataset, DatasetEntry, DatasetMetadata};
use crate::properties::record::CodepointRecord;
use crate::properties::tags::{BidiClass, GeneralCategory, IdentifierStatus};
use crate::properties::ucd::{self, CodepointRange, ConfusableMapping, MAX_CODEPOINT};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};
use unicode_script::Script;

#[derive(Debug, Clone, Copy)]
struct PropertyRange {
    range: CodepointRange,
    script: Script,
    category: GeneralCategory,
    bidi_class: BidiClass,
    identifier_status: IdentifierStatus,
}

/// Immutable codepoint property table.
///
/// Ranges are kept sorted and disjoint so that [`PropertyStore::lookup`] is a
/// binary search. The store is built once and shared behind an `Arc`.
#[derive(Debug)]
pub struct PropertyStore {
    metadata: DatasetMetadata,
    ranges: Vec<PropertyRange>,
    skeletons: HashMap<u32, Box<[u32]>>,
    allowed_overlay: Option<Vec<CodepointRange>>,
    assigned: usize,
}

impl PropertyStore {
    pub fn builtin() -> Result<Self, DatasetError> {
        Self::from_dataset(Dataset::builtin()?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        Self::from_dataset(Dataset::from_json_file(path)?)
    }

    pub fn from_dataset(dataset: Dataset) -> Result<Self, DatasetError> {
        let Dataset {
            metadata,
            entries,
            confusables,
            allowed_ranges,
        } = dataset;

        let mut ranges = Vec::with_capacity(entries.len());
        let mut skeletons: HashMap<u32, Box<[u32]>> = HashMap::new();

        for (index, entry) in entries.iter().enumerate() {
            let location = format!("#{} ({})", index, entry.codepoints);
            let property_range = parse_entry(entry, &location)?;

            if let Some(field) = &entry.skeleton {
                if !property_range.range.is_single() {
                    return Err(DatasetError::malformed(
                        location,
                        "a skeleton may only be attached to a single codepoint",
                    ));
                }
                let skeleton = ucd::parse_hex_sequence(field, &location)?;
                if skeleton.is_empty() {
                    return Err(DatasetError::NonIdempotentSkeleton(property_range.range.start));
                }
                let codepoint = property_range.range.start;
                if skeletons.insert(codepoint, skeleton.into()).is_some() {
                    return Err(DatasetError::DuplicateCodepoint(codepoint));
                }
            }

            ranges.push(property_range);
        }

        ranges.sort_by_key(|r| r.range.start);
        for pair in ranges.windows(2) {
            if pair[1].range.start <= pair[0].range.end {
                return Err(DatasetError::DuplicateCodepoint(pair[1].range.start));
            }
        }

        let mut store = Self {
            metadata,
            assigned: ranges.iter().map(|r| r.range.len()).sum(),
            ranges,
            skeletons,
            allowed_overlay: allowed_ranges.map(ucd::normalize_ranges),
        };

        store.apply_confusables(confusables);

        store.validate_skeletons()?;

        info!(
            name = %store.metadata.name,
            unicode_version = %store.metadata.unicode_version,
            ranges = store.ranges.len(),
            assigned = store.assigned,
            skeletons = store.skeletons.len(),
            "loaded property store"
        );

        Ok(store)
    }

    /// Applies `confusables.txt` mappings on top of the dataset skeletons.
    /// The overlay is best-effort: a mapping whose source or target is not
    /// assigned in the dataset is skipped. Returns `(applied, skipped)`.
    fn apply_confusables(&mut self, mappings: Vec<ConfusableMapping>) -> (usize, usize) {
        let mut applied = 0usize;
        let mut skipped = 0usize;
        for mapping in mappings {
            let known = self.is_assigned(mapping.source)
                && mapping.target.iter().all(|&t| self.is_assigned(t));
            if !known {
                debug!(source = mapping.source, "confusable mapping references unassigned codepoints");
                skipped += 1;
                continue;
            }
            if mapping.target == [mapping.source] {
                self.skeletons.remove(&mapping.source);
            } else {
                self.skeletons
                    .insert(mapping.source, mapping.target.into_boxed_slice());
            }
            applied += 1;
        }

        if skipped > 0 {
            warn!(applied, skipped, "skipped confusable mappings outside the dataset");
        } else if applied > 0 {
            debug!(applied, "applied confusable overlay");
        }
        (applied, skipped)
    }

    fn validate_skeletons(&self) -> Result<(), DatasetError> {
        let mut sources: Vec<u32> = self.skeletons.keys().copied().collect();
        sources.sort_unstable();

        for source in sources {
            let Some(skeleton) = self.skeletons.get(&source) else {
                continue;
            };
            for &target in skeleton.iter() {
                if !self.is_assigned(target) {
                    return Err(DatasetError::SkeletonReferencesUnassigned {
                        source_codepoint: source,
                        target,
                    });
                }
                if let Some(nested) = self.skeletons.get(&target) {
                    if nested[..] != [target] {
                        return Err(DatasetError::NonIdempotentSkeleton(source));
                    }
                }
            }
        }

        Ok(())
    }

    fn find_range(&self, codepoint: u32) -> Option<&PropertyRange> {
        let index = self.ranges.partition_point(|r| r.range.end < codepoint);
        self.ranges
            .get(index)
            .filter(|r| r.range.contains(codepoint))
    }

    pub fn is_assigned(&self, codepoint: u32) -> bool {
        self.find_range(codepoint).is_some()
    }

    /// Total over `u32`: anything the dataset does not define, including
    /// surrogates and values past U+10FFFF, comes back unassigned.
    pub fn lookup(&self, codepoint: u32) -> CodepointRecord<'_> {
        if codepoint > MAX_CODEPOINT || (0xD800..=0xDFFF).contains(&codepoint) {
            return CodepointRecord::unassigned(codepoint);
        }

        let Some(range) = self.find_range(codepoint) else {
            return CodepointRecord::unassigned(codepoint);
        };

        let identifier_status = match (&self.allowed_overlay, range.identifier_status) {
            (Some(allowed), IdentifierStatus::Allowed | IdentifierStatus::Restricted) => {
                if ucd::ranges_contain(allowed, codepoint) {
                    IdentifierStatus::Allowed
                } else {
                    IdentifierStatus::Restricted
                }
            }
            (_, status) => status,
        };

        CodepointRecord {
            codepoint,
            script: range.script,
            category: range.category,
            bidi_class: range.bidi_class,
            identifier_status,
            skeleton: self.skeletons.get(&codepoint).map(|s| s.as_ref()),
        }
    }

    pub fn lookup_char(&self, c: char) -> CodepointRecord<'_> {
        self.lookup(c as u32)
    }

    pub fn skeleton(&self, codepoint: u32) -> Option<&[u32]> {
        self.skeletons.get(&codepoint).map(|s| s.as_ref())
    }

    /// Concatenated skeleton of `text`; codepoints without a mapping stand
    /// for themselves.
    pub fn skeleton_of(&self, text: &[char]) -> Vec<u32> {
        text.iter()
            .flat_map(|&c| self.lookup_char(c).skeleton_or_self())
            .collect()
    }

    pub fn skeletons(&self) -> impl Iterator<Item = (u32, &[u32])> {
        self.skeletons.iter().map(|(&k, v)| (k, v.as_ref()))
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    /// Number of assigned codepoints.
    pub fn len(&self) -> usize {
        self.assigned
    }

    pub fn is_empty(&self) -> bool {
        self.assigned == 0
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn skeleton_count(&self) -> usize {
        self.skeletons.len()
    }
}

fn parse_entry(entry: &DatasetEntry, location: &str) -> Result<PropertyRange, DatasetError> {
    let range = ucd::parse_codepoint_range(&entry.codepoints, location)?;
    let script = Script::from_full_name(&entry.script).ok_or_else(|| {
        DatasetError::malformed(location, format!("unknown script '{}'", entry.script))
    })?;
    let category = entry
        .category
        .parse::<GeneralCategory>()
        .map_err(|e| DatasetError::malformed(location, e))?;
    let bidi_class = entry
        .bidi_class
        .parse::<BidiClass>()
        .map_err(|e| DatasetError::malformed(location, e))?;
    let identifier_status = entry
        .identifier_status
        .parse::<IdentifierStatus>()
        .map_err(|e| DatasetError::malformed(location, e))?;

    Ok(PropertyRange {
        range,
        script,
        category,
        bidi_class,
        identifier_status,
    })
}
