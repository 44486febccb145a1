pub mod checker;
pub mod event_log;
pub mod scorer;

pub use checker::{CheckReport, ConformanceChecker, Constraint, TemplateKind};
pub use event_log::{Event, EventLog, Trace};
pub use scorer::{strip_cardinality, ConformanceContext, ConformanceScorer};
