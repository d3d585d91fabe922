pub mod debug_symbols;
pub mod file_extractor;
pub mod manifest;
pub mod pipeline;
pub mod workspace;

pub use debug_symbols::{check_output_root, BatchProgress, DebugSymbolExtractor, PlannedPackage};
pub use file_extractor::{ExtractedFile, ExtractionRequest, FileExtractor};
pub use manifest::{Manifest, ManifestEntry, SkipReason, SkippedPackage};
pub use pipeline::{PipelineOutput, ProcessPipeline};
pub use workspace::TempWorkspace;
