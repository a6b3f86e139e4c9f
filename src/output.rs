//! CLI output formatting.
//!
//! Every display has a pure `format_*` function returning lines (tested
//! directly) and a thin `print_*` wrapper that writes them to stdout.
//!
//! # Output Format
//!
//! ## Probe
//!
//! ```text
//! photos/dawn.jpg
//!     Format: jpeg
//!     Dimensions: 4000x3000
//!     Size: 2345.67 kB
//!     Variants: eligible
//! ```
//!
//! ## Process
//!
//! ```text
//! Processing 2 files
//!     001 dawn.jpg
//!         Source: photos/dawn.jpg
//!         Original: 4000x3000 (1800.12 kB)
//!         thumbnail: 208x156 (9.87 kB)
//!         webp: 4000x3000 (812.4 kB)
//!         large: 1000x750 (98.1 kB)
//!     002 logo.gif
//!         Source: photos/logo.gif
//!         thumbnail: skipped
//! ```

use std::path::Path;

use crate::imaging::{Metadata, bytes_to_kbytes, is_processable_format};
use crate::process::{ProcessEvent, VariantStatus};

/// Indentation string for a nesting level (4 spaces per level).
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a kilobyte size without trailing zeros: `1.5 kB`, `12.35 kB`.
fn kb(size: f64) -> String {
    format!("{size} kB")
}

// ============================================================================
// Probe
// ============================================================================

/// Format what a probe learned about one file.
pub fn format_probe(path: &str, meta: &Metadata) -> Vec<String> {
    let mut lines = vec![path.to_string()];
    let pad = indent(1);

    lines.push(format!(
        "{pad}Format: {}",
        meta.format.as_deref().unwrap_or("unknown")
    ));
    if let Some(dims) = meta.dimensions() {
        lines.push(format!("{pad}Dimensions: {}x{}", dims.width, dims.height));
    }
    if let Some(size) = meta.size {
        lines.push(format!("{pad}Size: {}", kb(bytes_to_kbytes(size))));
    }
    let eligibility = if is_processable_format(meta.format.as_deref()) {
        "eligible"
    } else {
        "not eligible"
    };
    lines.push(format!("{pad}Variants: {eligibility}"));
    lines
}

pub fn print_probe(path: &str, meta: &Metadata) {
    for line in format_probe(path, meta) {
        println!("{}", line);
    }
}

// ============================================================================
// Process
// ============================================================================

fn file_line(index: usize, source_path: &str) -> String {
    let filename = Path::new(source_path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_path.to_string());
    format!("{:03} {}", index, filename)
}

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted { file_count } => {
            let noun = if *file_count == 1 { "file" } else { "files" };
            vec![format!("Processing {} {}", file_count, noun)]
        }
        ProcessEvent::FileProcessed {
            index,
            source_path,
            original,
            variants,
        } => {
            let mut lines = vec![
                format!("{}{}", indent(1), file_line(*index, source_path)),
                format!("{}Source: {}", indent(2), source_path),
            ];
            if let Some(info) = original {
                lines.push(format!(
                    "{}Original: {}x{} ({})",
                    indent(2),
                    info.width,
                    info.height,
                    kb(info.size)
                ));
            }
            for variant in variants {
                let status = match &variant.status {
                    VariantStatus::Created {
                        width,
                        height,
                        size,
                    } => format!("{}x{} ({})", width, height, kb(*size)),
                    VariantStatus::NotNeeded => "not needed".to_string(),
                    VariantStatus::Skipped => "skipped".to_string(),
                };
                lines.push(format!("{}{}: {}", indent(2), variant.label, status));
            }
            lines
        }
        ProcessEvent::FileFailed {
            index,
            source_path,
            error,
        } => vec![
            format!("{}{}", indent(1), file_line(*index, source_path)),
            format!("{}Error: {}", indent(2), error),
        ],
    }
}

/// Summary line after a batch run.
pub fn format_summary(processed: usize, failed: usize, output_dir: &Path) -> String {
    if failed == 0 {
        format!("Processed {} → {}", processed, output_dir.display())
    } else {
        format!(
            "Processed {}, failed {} → {}",
            processed,
            failed,
            output_dir.display()
        )
    }
}
