use std::path::Path;
use std::process::Command;

use anyhow::Result;

use crate::cli::ExtractBackend;
use crate::model::{RawDocument, ToolVersions};

mod json_layout;
mod pdftohtml;
#[cfg(test)]
mod tests;

pub fn extract_document(
    path: &Path,
    backend: ExtractBackend,
    max_pages: Option<usize>,
) -> Result<RawDocument> {
    match backend {
        ExtractBackend::Pdftohtml => pdftohtml::extract_with_pdftohtml(path, max_pages),
        ExtractBackend::Json => json_layout::load_layout_json(path, max_pages),
    }
}

pub fn collect_tool_versions(backend: ExtractBackend) -> ToolVersions {
    match backend {
        ExtractBackend::Pdftohtml => ToolVersions {
            pdftohtml: command_version_optional("pdftohtml", &["-v"]),
            pdfinfo: command_version_optional("pdfinfo", &["-v"]),
        },
        ExtractBackend::Json => ToolVersions::default(),
    }
}

pub fn command_available(program: &str) -> bool {
    Command::new(program).arg("-v").output().is_ok()
}

fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}
