pub mod analysis;
pub mod combat_log;
pub mod errors;
pub mod events;
pub mod game_data;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod report;

// Re-exports for convenience
pub use analysis::{AnalysisContext, AnalysisModule, FightMeta};
pub use errors::{AnalysisError, ModuleFault, RegistryError};
pub use events::{Event, EventKind};
pub use normalize::{NormalizeIssue, Normalizer, Timeline};
pub use pipeline::{CancelToken, Pipeline};
pub use registry::ModuleRegistry;
pub use report::{Finding, Report, ReportEntry};
