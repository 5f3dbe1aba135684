pub mod cleaning;
pub mod clock;
pub mod dates;
pub mod dedup;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod scroll;
pub mod session;

pub use cleaning::{clean_reviews, has_meaningful_text};
pub use clock::{Clock, ManualClock, TokioClock};
pub use dates::{normalize_relative_date, normalize_reviews, NormalizedDate};
pub use dedup::{review_fingerprint, DedupScope, Fingerprint, FingerprintSet, PositionFilter};
pub use enrich::{apply_enrichment, enrich_branch, enrich_branches, BranchDetails, EnrichOutcome};
pub use error::{HarvestError, SessionError, SinkError};
pub use harvest::{run_harvest, HarvestConfig, HarvestOutput, Harvester, RecordSink, SaveKind};
pub use scroll::{drive_scroll, ScrollPolicy, ScrollReport, ScrollTarget, StopReason};
pub use session::{BrowserOptions, DocumentSession, Locator, Position, WebDriverSession};
