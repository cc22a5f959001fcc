//! Core data types shared by every pipeline stage.

pub mod config;
pub mod records;
pub mod stats;

pub use config::{default_category_dirs, ArchiveConfig, Config, DedupConfig, LabelingConfig};
pub use records::{
    canonical_value, Category, Destination, Difficulty, FileFormat, LabeledUnit, Labels,
    NormalizedUnit, PreprocessedItem, QualityGate, RawFile, RecordData, RouteDecision, RoutedItem,
    SanitizedItem,
};
pub use stats::{
    CleanupStats, DiscoveryStats, LabelStats, NormalizeStats, PreprocessStats, RouteStats,
    RunStats, SanitizeStats,
};
