use anyhow::Result;
use tracing::info;

use crate::cli::{ExtractArgs, ExtractBackend};
use crate::extract::extract_document;
use crate::util::{file_stem_string, write_json_pretty};

pub fn run(args: ExtractArgs) -> Result<()> {
    let output_path = match args.output {
        Some(path) => path,
        None => {
            let stem = file_stem_string(&args.input)?;
            args.input.with_file_name(format!("{stem}.layout.json"))
        }
    };

    info!(input = %args.input.display(), "extracting page geometry");
    let document = extract_document(&args.input, ExtractBackend::Pdftohtml, args.max_pages)?;

    write_json_pretty(&output_path, &document)?;
    info!(
        path = %output_path.display(),
        page_count = document.pages.len(),
        "wrote layout json"
    );

    Ok(())
}
