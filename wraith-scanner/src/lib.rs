pub mod classifier;
pub mod error;
pub mod fetch;
pub mod result;

pub use classifier::{BAD_PHRASES, Classifier, ProgressCallback, has_bad_phrase};
pub use error::ScanError;
pub use result::{Classified, DeadReason, FetchedPage, Verdict};
