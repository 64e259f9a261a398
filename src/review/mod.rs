pub mod bulk;
pub mod history;
pub mod session;

pub use bulk::{copy_groups, BulkError, ReviewManifest};
pub use history::{CullHistoryRecord, HistoryLog};
pub use session::{ReviewDecision, ReviewError, ReviewOutcome, ReviewSession};
