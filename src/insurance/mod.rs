//! Insurance resolution: loss detection at raid end, retention rolling when a
//! package comes due.

pub mod detection;
pub mod packaging;
pub mod processor;
pub mod retention;
pub mod types;

pub use detection::{return_copy, LossDetector};
pub use packaging::{build_packages, return_timestamp};
pub use processor::{InsuranceProcessor, PackageReport};
pub use retention::{
    finalize_package, outcome_for_draw, ParentAttachmentsMap, RetentionRoller, RollResult,
};
pub use types::*;
