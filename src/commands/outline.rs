use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cli::{ExtractBackend, OutlineArgs};
use crate::commands::inventory::{discover_inputs, input_entry};
use crate::extract::{collect_tool_versions, command_available, extract_document};
use crate::model::{InputEntry, OutlineCounts, OutlinePaths, OutlineRunManifest};
use crate::outline::{ClassifierConfig, DEFAULT_TITLE, OutlineClassifier};
use crate::util::{
    ensure_directory, file_stem_string, now_utc_string, utc_compact_string, write_json_pretty,
};

#[derive(Debug)]
enum DocumentStatus {
    Written { heading_count: usize, untitled: bool },
    Skipped(String),
    Failed(String),
}

#[derive(Debug)]
struct PlannedDocument {
    input: PathBuf,
    output: std::result::Result<PathBuf, String>,
}

#[derive(Debug)]
struct DocumentReport {
    path: PathBuf,
    source: Option<InputEntry>,
    status: DocumentStatus,
}

pub fn run(args: OutlineArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        args.output_dir.join("manifests").join(format!(
            "outline_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    let config = match &args.config_path {
        Some(path) => ClassifierConfig::load(path)?,
        None => ClassifierConfig::default(),
    };
    let classifier = OutlineClassifier::new(config)?;

    let inputs = discover_inputs(&args.input_dir, args.backend.input_extension())?;
    if inputs.is_empty() {
        bail!(
            "no .{} inputs found in {}",
            args.backend.input_extension(),
            args.input_dir.display()
        );
    }
    ensure_directory(&args.output_dir)?;
    if args.backend == ExtractBackend::Json && same_directory(&args.input_dir, &args.output_dir)? {
        bail!(
            "output directory {} must differ from the json input directory",
            args.output_dir.display()
        );
    }
    let planned = plan_outputs(&inputs, &args.output_dir);

    if args.backend == ExtractBackend::Pdftohtml && !command_available("pdftohtml") {
        warn!("pdftohtml not found on PATH; every document will fail extraction");
    }

    info!(
        input_dir = %args.input_dir.display(),
        output_dir = %args.output_dir.display(),
        backend = args.backend.as_str(),
        input_count = inputs.len(),
        run_id = %run_id,
        "starting outline run"
    );

    let reports = process_documents(
        &classifier,
        &planned,
        args.backend,
        args.max_pages_per_doc,
        args.jobs,
    )?;

    let mut counts = OutlineCounts {
        input_count: inputs.len(),
        ..OutlineCounts::default()
    };
    let mut warnings = Vec::new();
    let mut source_hashes = Vec::with_capacity(reports.len());

    for report in reports {
        if let Some(source) = report.source {
            source_hashes.push(source);
        }
        match report.status {
            DocumentStatus::Written {
                heading_count,
                untitled,
            } => {
                counts.written_count += 1;
                counts.heading_count += heading_count;
                if untitled {
                    counts.untitled_count += 1;
                }
            }
            DocumentStatus::Skipped(reason) => {
                counts.skipped_count += 1;
                warnings.push(format!("{}: {reason}", report.path.display()));
            }
            DocumentStatus::Failed(reason) => {
                counts.failed_count += 1;
                warnings.push(format!("{}: {reason}", report.path.display()));
            }
        }
    }

    let manifest = OutlineRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_outline_command(&args),
        backend: args.backend.as_str().to_string(),
        tool_versions: collect_tool_versions(args.backend),
        paths: OutlinePaths {
            input_dir: args.input_dir.display().to_string(),
            output_dir: args.output_dir.display().to_string(),
            config_path: args
                .config_path
                .as_ref()
                .map(|path| path.display().to_string()),
        },
        config: classifier.config().clone(),
        counts,
        source_hashes,
        warnings,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;
    info!(path = %run_manifest_path.display(), "wrote outline run manifest");
    info!(
        written = manifest.counts.written_count,
        skipped = manifest.counts.skipped_count,
        failed = manifest.counts.failed_count,
        headings = manifest.counts.heading_count,
        "outline run completed"
    );

    Ok(())
}

fn same_directory(left: &Path, right: &Path) -> Result<bool> {
    let left = fs::canonicalize(left)
        .with_context(|| format!("failed to resolve {}", left.display()))?;
    let right = fs::canonicalize(right)
        .with_context(|| format!("failed to resolve {}", right.display()))?;
    Ok(left == right)
}

fn plan_outputs(inputs: &[PathBuf], output_dir: &Path) -> Vec<PlannedDocument> {
    let mut claimed = HashSet::<String>::new();

    inputs
        .iter()
        .map(|input| {
            let output = match file_stem_string(input) {
                Ok(stem) if claimed.insert(stem.to_lowercase()) => {
                    Ok(output_dir.join(format!("{stem}.json")))
                }
                Ok(stem) => Err(format!(
                    "output name {stem}.json collides with an earlier input"
                )),
                Err(error) => Err(format!("{error:#}")),
            };
            PlannedDocument {
                input: input.clone(),
                output,
            }
        })
        .collect()
}

fn process_documents(
    classifier: &OutlineClassifier,
    planned: &[PlannedDocument],
    backend: ExtractBackend,
    max_pages: Option<usize>,
    jobs: Option<usize>,
) -> Result<Vec<DocumentReport>> {
    let process = || {
        planned
            .par_iter()
            .map(|document| process_document(classifier, document, backend, max_pages))
            .collect::<Vec<DocumentReport>>()
    };

    match jobs {
        Some(jobs) => {
            let pool = ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .context("failed to build document worker pool")?;
            Ok(pool.install(process))
        }
        None => Ok(process()),
    }
}

fn process_document(
    classifier: &OutlineClassifier,
    document: &PlannedDocument,
    backend: ExtractBackend,
    max_pages: Option<usize>,
) -> DocumentReport {
    let path = document.input.as_path();
    let source = match input_entry(path) {
        Ok(entry) => Some(entry),
        Err(error) => {
            warn!(path = %path.display(), error = %format!("{error:#}"), "failed to hash input");
            None
        }
    };

    let status = match &document.output {
        Err(reason) => {
            warn!(path = %path.display(), reason = %reason, "document skipped");
            DocumentStatus::Skipped(reason.clone())
        }
        Ok(output_path) => {
            match outline_document(classifier, path, output_path, backend, max_pages) {
                Ok(status) => status,
                Err(error) => {
                    let reason = format!("{error:#}");
                    warn!(path = %path.display(), error = %reason, "document failed");
                    DocumentStatus::Failed(reason)
                }
            }
        }
    };

    DocumentReport {
        path: path.to_path_buf(),
        source,
        status,
    }
}

fn outline_document(
    classifier: &OutlineClassifier,
    path: &Path,
    output_path: &Path,
    backend: ExtractBackend,
    max_pages: Option<usize>,
) -> Result<DocumentStatus> {
    let document = extract_document(path, backend, max_pages)?;

    let Some(outline) = classifier.classify(&document) else {
        warn!(path = %path.display(), "no text lines retained; skipping");
        return Ok(DocumentStatus::Skipped(
            "no text lines retained after normalization".to_string(),
        ));
    };

    write_json_pretty(output_path, &outline)?;

    debug!(
        path = %output_path.display(),
        title = %outline.title,
        headings = outline.outline.len(),
        "wrote outline"
    );

    Ok(DocumentStatus::Written {
        heading_count: outline.outline.len(),
        untitled: outline.title == DEFAULT_TITLE,
    })
}

fn render_outline_command(args: &OutlineArgs) -> String {
    let mut command = vec![
        "pdf-outline".to_string(),
        "outline".to_string(),
        "--input-dir".to_string(),
        args.input_dir.display().to_string(),
        "--output-dir".to_string(),
        args.output_dir.display().to_string(),
        "--backend".to_string(),
        args.backend.as_str().to_string(),
    ];

    if let Some(path) = &args.config_path {
        command.push("--config-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(max_pages) = args.max_pages_per_doc {
        command.push("--max-pages-per-doc".to_string());
        command.push(max_pages.to_string());
    }
    if let Some(jobs) = args.jobs {
        command.push("--jobs".to_string());
        command.push(jobs.to_string());
    }
    if let Some(path) = &args.run_manifest_path {
        command.push("--run-manifest-path".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::Value;

    use super::*;
    use crate::model::DocumentOutline;

    const HEADING_LAYOUT: &str = r#"{
      "metadata": { "title": "Field Guide" },
      "pages": [
        { "width": 612, "height": 792,
          "blocks": [
            { "type": 0, "lines": [ { "spans": [
              { "text": "1. Introduction", "font": "Times-Roman", "size": 20,
                "bbox": [72, 400, 272, 420] } ] } ] },
            { "type": 0, "lines": [
              { "spans": [ { "text": "Body text line one of the section", "size": 12,
                "bbox": [72, 200, 540, 212] } ] },
              { "spans": [ { "text": "Body text line two of the section", "size": 12,
                "bbox": [72, 214, 540, 226] } ] },
              { "spans": [ { "text": "Body text line three of the section", "size": 12,
                "bbox": [72, 228, 540, 240] } ] },
              { "spans": [ { "text": "Body text line four of the section", "size": 12,
                "bbox": [72, 242, 540, 254] } ] },
              { "spans": [ { "text": "Body text line five of the section", "size": 12,
                "bbox": [72, 256, 540, 268] } ] },
              { "spans": [ { "text": "Body text line six of the section", "size": 12,
                "bbox": [72, 270, 540, 282] } ] }
            ] }
          ] }
      ]
    }"#;

    const EMPTY_LAYOUT: &str = r#"{ "pages": [ { "width": 612, "height": 792, "blocks": [] } ] }"#;

    fn outline_args(input_dir: &Path, output_dir: &Path) -> OutlineArgs {
        OutlineArgs {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            backend: ExtractBackend::Json,
            config_path: None,
            max_pages_per_doc: None,
            jobs: Some(2),
            run_manifest_path: Some(output_dir.join("run.json")),
        }
    }

    #[test]
    fn batch_skips_failing_documents_and_writes_the_rest() {
        let input = tempfile::tempdir().expect("input dir should be created");
        let output = tempfile::tempdir().expect("output dir should be created");
        fs::write(input.path().join("guide.json"), HEADING_LAYOUT).expect("layout written");
        fs::write(input.path().join("broken.json"), "{ not json").expect("layout written");
        fs::write(input.path().join("empty.json"), EMPTY_LAYOUT).expect("layout written");

        run(outline_args(input.path(), output.path())).expect("run should succeed");

        let written = fs::read_to_string(output.path().join("guide.json"))
            .expect("outline should be written");
        let outline: DocumentOutline =
            serde_json::from_str(&written).expect("outline should parse");
        assert_eq!(outline.title, "Field Guide");
        assert_eq!(outline.outline.len(), 1);
        assert_eq!(outline.outline[0].text, "1. Introduction");
        assert_eq!(outline.outline[0].page, 1);

        assert!(!output.path().join("broken.json").exists());
        assert!(!output.path().join("empty.json").exists());

        let manifest: Value = serde_json::from_str(
            &fs::read_to_string(output.path().join("run.json")).expect("manifest should exist"),
        )
        .expect("manifest should parse");
        assert_eq!(manifest["counts"]["input_count"], 3);
        assert_eq!(manifest["counts"]["written_count"], 1);
        assert_eq!(manifest["counts"]["failed_count"], 1);
        assert_eq!(manifest["counts"]["skipped_count"], 1);
        assert_eq!(manifest["counts"]["heading_count"], 1);
        assert_eq!(manifest["backend"], "json");
        assert_eq!(
            manifest["source_hashes"]
                .as_array()
                .map(|hashes| hashes.len()),
            Some(3)
        );
        assert_eq!(
            manifest["warnings"].as_array().map(|warnings| warnings.len()),
            Some(2)
        );
    }

    #[test]
    fn run_fails_without_inputs() {
        let input = tempfile::tempdir().expect("input dir should be created");
        let output = tempfile::tempdir().expect("output dir should be created");

        let error = run(outline_args(input.path(), output.path()))
            .expect_err("empty input dir should fail");
        assert!(error.to_string().contains("no .json inputs found"));
    }

    #[test]
    fn invalid_config_file_is_fatal() {
        let input = tempfile::tempdir().expect("input dir should be created");
        let output = tempfile::tempdir().expect("output dir should be created");
        fs::write(input.path().join("guide.json"), HEADING_LAYOUT).expect("layout written");
        let config_path = input.path().join("config.txt");
        fs::write(&config_path, "{ \"scoring\": 7 }").expect("config written");

        let mut args = outline_args(input.path(), output.path());
        args.config_path = Some(config_path);
        assert!(run(args).is_err());
    }

    #[test]
    fn colliding_output_names_are_skipped_after_the_first() {
        let input = tempfile::tempdir().expect("input dir should be created");
        let output = tempfile::tempdir().expect("output dir should be created");
        fs::write(input.path().join("guide.json"), HEADING_LAYOUT).expect("layout written");
        fs::write(input.path().join("Guide.JSON"), HEADING_LAYOUT).expect("layout written");

        run(outline_args(input.path(), output.path())).expect("run should succeed");

        let manifest: Value = serde_json::from_str(
            &fs::read_to_string(output.path().join("run.json")).expect("manifest should exist"),
        )
        .expect("manifest should parse");
        assert_eq!(manifest["counts"]["written_count"], 1);
        assert_eq!(manifest["counts"]["skipped_count"], 1);
        let warning = manifest["warnings"][0].as_str().unwrap_or_default();
        assert!(warning.contains("guide.json"));
        assert!(warning.contains("collides with an earlier input"));
    }

    #[test]
    fn plan_outputs_claims_each_stem_once_ignoring_case() {
        let inputs = vec![
            PathBuf::from("in/Report.pdf"),
            PathBuf::from("in/report.PDF"),
            PathBuf::from("in/summary.pdf"),
        ];

        let planned = plan_outputs(&inputs, Path::new("out"));
        assert_eq!(planned[0].output, Ok(PathBuf::from("out/Report.json")));
        assert!(planned[1].output.is_err());
        assert_eq!(planned[2].output, Ok(PathBuf::from("out/summary.json")));
    }

    #[test]
    fn json_run_refuses_to_write_into_its_input_directory() {
        let input = tempfile::tempdir().expect("input dir should be created");
        fs::write(input.path().join("guide.json"), HEADING_LAYOUT).expect("layout written");

        let error = run(outline_args(input.path(), input.path()))
            .expect_err("shared directory should fail");
        assert!(error.to_string().contains("must differ from the json input directory"));
        assert_eq!(
            fs::read_to_string(input.path().join("guide.json")).expect("layout should remain"),
            HEADING_LAYOUT
        );
    }

    #[test]
    fn render_outline_command_includes_optional_flags() {
        let mut args = outline_args(Path::new("in"), Path::new("out"));
        args.max_pages_per_doc = Some(5);
        args.run_manifest_path = None;

        let command = render_outline_command(&args);
        assert!(command.starts_with("pdf-outline outline --input-dir in --output-dir out"));
        assert!(command.contains("--backend json"));
        assert!(command.contains("--max-pages-per-doc 5"));
        assert!(command.contains("--jobs 2"));
        assert!(!command.contains("--run-manifest-path"));
    }
}
