//! Typesetting through the system TeX toolchain

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use log::{debug, info};

use crate::export::ExportFormat;
use crate::export::errors::ExportError;
use crate::expression::Expression;

const JOB_NAME: &str = "hazy";

/// Standalone document holding `expr` in display style
pub fn document(expr: &Expression) -> String {
    format!(
        "\\documentclass[varwidth,12pt]{{standalone}}\n\
         \\usepackage{{amsmath}}\n\
         \\usepackage{{amsfonts}}\n\
         \\begin{{document}}\n\
         $\\displaystyle {}$\n\
         \\end{{document}}\n",
        expr.to_latex()
    )
}

/// Compile `expr` to `format`, which must be one of the typeset formats.
///
/// # Errors
///
/// Returns [`ExportError::Toolchain`] when a program is missing or fails.
pub fn typeset(expr: &Expression, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    let scratch = tempfile::tempdir()?;
    let dir = scratch.path();
    let tex = format!("{}.tex", JOB_NAME);
    let dvi = format!("{}.dvi", JOB_NAME);

    fs::write(dir.join(&tex), document(expr))?;
    run(
        "latex",
        &["-halt-on-error", "-interaction=nonstopmode", &tex],
        dir,
    )?;

    let output = match format {
        ExportFormat::Dvi => dvi,
        ExportFormat::Png => {
            let png = format!("{}.png", JOB_NAME);
            run(
                "dvipng",
                &["-T", "tight", "-z", "9", "--truecolor", "-o", &png, &dvi],
                dir,
            )?;
            png
        }
        ExportFormat::PostScript => {
            let ps = format!("{}.ps", JOB_NAME);
            run("dvips", &["-o", &ps, &dvi], dir)?;
            ps
        }
        ExportFormat::Pdf => {
            let pdf = format!("{}.pdf", JOB_NAME);
            run("dvipdfmx", &["-o", &pdf, &dvi], dir)?;
            pdf
        }
        other => return Err(ExportError::UnsupportedFormat(other.name().to_string())),
    };

    let bytes = fs::read(dir.join(&output))?;
    info!("Typeset {} ({} bytes)", output, bytes.len());
    Ok(bytes)
}

fn run(program: &str, args: &[&str], dir: &Path) -> Result<(), ExportError> {
    debug!("Running {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|err| ExportError::Toolchain {
            program: program.to_string(),
            message: match err.kind() {
                io::ErrorKind::NotFound => "not found on PATH".to_string(),
                _ => err.to_string(),
            },
        })?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let log = format!("{}{}", stdout, stderr);
        let tail: Vec<&str> = log.lines().rev().take(5).collect();
        return Err(ExportError::Toolchain {
            program: program.to_string(),
            message: format!(
                "{} ({})",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            ),
        });
    }

    Ok(())
}
