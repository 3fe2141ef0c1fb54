use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::{ExtractBackend, InventoryArgs};
use crate::model::{InputEntry, InputInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.input_dir, args.backend)?;

    if args.dry_run {
        info!(
            input_count = manifest.input_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args.manifest_path.unwrap_or_else(|| {
        args.input_dir
            .join("manifests")
            .join("input_inventory.json")
    });

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(input_count = manifest.input_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(input_dir: &Path, backend: ExtractBackend) -> Result<InputInventoryManifest> {
    let input_paths = discover_inputs(input_dir, backend.input_extension())?;
    if input_paths.is_empty() {
        bail!(
            "no .{} inputs found in {}",
            backend.input_extension(),
            input_dir.display()
        );
    }

    let inputs = input_paths
        .iter()
        .map(|path| input_entry(path))
        .collect::<Result<Vec<InputEntry>>>()?;

    Ok(InputInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: input_dir.display().to_string(),
        backend: backend.as_str().to_string(),
        input_count: inputs.len(),
        inputs,
    })
}

pub fn input_entry(path: &Path) -> Result<InputEntry> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;
    let (sha256, bytes) = sha256_file(path)?;

    Ok(InputEntry {
        filename,
        bytes,
        sha256,
    })
}

pub fn discover_inputs(input_dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);

        if matches {
            inputs.push(path);
        }
    }

    inputs.sort();
    Ok(inputs)
}
