use serde::{Deserialize, Serialize};

use crate::outline::ClassifierConfig;

pub const TEXT_BLOCK_TYPE: u8 = 0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub pages: Vec<RawPage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPage {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub blocks: Vec<RawBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBlock {
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub lines: Vec<RawLine>,
}

impl RawBlock {
    pub fn is_text(&self) -> bool {
        self.kind == TEXT_BLOCK_TYPE
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLine {
    #[serde(default)]
    pub spans: Vec<RawSpan>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSpan {
    pub text: String,
    #[serde(default)]
    pub font: String,
    pub size: f64,
    #[serde(default)]
    pub flags: u32,
    pub bbox: [f64; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOutline {
    pub title: String,
    pub outline: Vec<HeadingEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEntry {
    pub filename: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub backend: String,
    pub input_count: usize,
    pub inputs: Vec<InputEntry>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolVersions {
    pub pdftohtml: Option<String>,
    pub pdfinfo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlinePaths {
    pub input_dir: String,
    pub output_dir: String,
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OutlineCounts {
    pub input_count: usize,
    pub written_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub heading_count: usize,
    pub untitled_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlineRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub backend: String,
    pub tool_versions: ToolVersions,
    pub paths: OutlinePaths,
    pub config: ClassifierConfig,
    pub counts: OutlineCounts,
    pub source_hashes: Vec<InputEntry>,
    pub warnings: Vec<String>,
}
