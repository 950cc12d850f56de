//! Unicode property store
//!
//! Everything the detectors know about a codepoint comes from here: script,
//! general category, bidi class, UTS #39 identifier status, and the
//! confusable skeleton. A [`Dataset`] is the unvalidated input (bundled JSON,
//! a user-supplied JSON file, optionally overlaid with `confusables.txt` and
//! `IdentifierStatus.txt`); [`PropertyStore::from_dataset`] validates it all
//! at once and either yields an immutable store or a [`DatasetError`].
//!
//! [`DatasetError`]: crate::error::DatasetError

pub mod dataset;
pub mod record;
pub mod store;
pub mod tags;
pub mod ucd;

pub use dataset::{Dataset, DatasetEntry, DatasetMetadata};
pub use record::{is_script_neutral, CodepointRecord};
pub use store::PropertyStore;
pub use tags::{BidiClass, GeneralCategory, IdentifierStatus};
pub use ucd::{CodepointRange, ConfusableMapping};
