pub mod datatypes;
pub mod document;
pub mod character;
pub mod gear;
pub mod portrait;
pub mod loader;
pub mod migrate;
pub mod saver;
pub mod localization;
pub mod export;
pub mod diff;
pub mod batch;
pub mod io;
pub mod utils;

// 重新导出主要结构
pub use document::Element;
pub use character::{CharacterRecord, SkillEntry};
pub use gear::{GearArena, GearId, GearNode};
pub use portrait::PortraitBlob;
pub use loader::LoadOutcome;
pub use saver::{DiagnosticsLevel, SaveReport};
pub use localization::LocalizationCatalog;
pub use export::{ExportDiagnostics, ExportOutcome, Exporter};
pub use diff::{compare_documents, DiffOptions, DocumentDifference};
pub use utils::{LoadWarning, SheetError};

// 常量定义
pub const SUPPORTED_EXTENSIONS: &[&str] = &["chr5"];

/// 当前文档格式版本
pub const CURRENT_SCHEMA_VERSION: u32 = 3;
