//! Driftnet core: pure link handling, validation, and record types.
mod blocklist;
mod link;
mod types;
mod validate;

pub use blocklist::parse_blocklist;
pub use link::{canonicalize, CanonicalLink, LinkError};
pub use types::{DeviceProfile, IngestOutcome, Item, ItemMetadata, Job};
pub use validate::{validate_link, ValidationError};
