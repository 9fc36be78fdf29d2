//! Render expressions in other notations and save them to files

mod dot;
mod errors;
mod mathml;
mod pretty;
mod tex;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::info;

use crate::expression::Expression;

pub use dot::to_dot;
pub use errors::ExportError;
pub use mathml::to_mathml;
pub use pretty::to_pretty;
pub use tex::document as tex_document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Dvi,
    Pdf,
    PostScript,
    Latex,
    MathMl,
    Dot,
    Ascii,
    Unicode,
    Text,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 10] = [
        ExportFormat::Png,
        ExportFormat::Dvi,
        ExportFormat::Pdf,
        ExportFormat::PostScript,
        ExportFormat::Latex,
        ExportFormat::MathMl,
        ExportFormat::Dot,
        ExportFormat::Ascii,
        ExportFormat::Unicode,
        ExportFormat::Text,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Dvi => "dvi",
            ExportFormat::Pdf => "pdf",
            ExportFormat::PostScript => "postscript",
            ExportFormat::Latex => "latex",
            ExportFormat::MathMl => "mathml",
            ExportFormat::Dot => "dot",
            ExportFormat::Ascii => "ascii",
            ExportFormat::Unicode => "unicode",
            ExportFormat::Text => "text",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Dvi => "dvi",
            ExportFormat::Pdf => "pdf",
            ExportFormat::PostScript => "ps",
            ExportFormat::Latex => "tex",
            ExportFormat::MathMl => "mml",
            ExportFormat::Dot => "dot",
            ExportFormat::Ascii | ExportFormat::Unicode | ExportFormat::Text => "txt",
        }
    }

    /// Guess the format from a file extension. `txt` maps to plain text.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "dvi" => Some(ExportFormat::Dvi),
            "pdf" => Some(ExportFormat::Pdf),
            "ps" | "eps" => Some(ExportFormat::PostScript),
            "tex" | "latex" => Some(ExportFormat::Latex),
            "mml" | "mathml" => Some(ExportFormat::MathMl),
            "dot" | "gv" => Some(ExportFormat::Dot),
            "txt" => Some(ExportFormat::Text),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Formats produced by the TeX toolchain
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            ExportFormat::Png | ExportFormat::Dvi | ExportFormat::Pdf | ExportFormat::PostScript
        )
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let lowered = tag.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "ps" => Ok(ExportFormat::PostScript),
            "tex" => Ok(ExportFormat::Latex),
            "txt" | "str" => Ok(ExportFormat::Text),
            name => Self::ALL
                .into_iter()
                .find(|format| format.name() == name)
                .ok_or_else(|| ExportError::UnsupportedFormat(tag.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    Binary(Vec<u8>),
}

impl Rendered {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Rendered::Text(text) => Some(text),
            Rendered::Binary(_) => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Rendered::Text(text) => text.into_bytes(),
            Rendered::Binary(bytes) => bytes,
        }
    }
}

/// # Errors
///
/// Returns [`ExportError::Toolchain`] when a typeset format cannot be produced.
pub fn render(expr: &Expression, format: ExportFormat) -> Result<Rendered, ExportError> {
    let rendered = match format {
        ExportFormat::Latex => Rendered::Text(expr.to_latex()),
        ExportFormat::Text => Rendered::Text(expr.to_string()),
        ExportFormat::MathMl => Rendered::Text(to_mathml(expr)),
        ExportFormat::Dot => Rendered::Text(to_dot(expr)),
        ExportFormat::Ascii => Rendered::Text(to_pretty(expr, false)),
        ExportFormat::Unicode => Rendered::Text(to_pretty(expr, true)),
        ExportFormat::Png | ExportFormat::Dvi | ExportFormat::Pdf | ExportFormat::PostScript => {
            Rendered::Binary(tex::typeset(expr, format)?)
        }
    };
    Ok(rendered)
}

/// Render `expr` and write it to `path`
///
/// # Errors
///
/// Returns an error if rendering fails or the file cannot be written.
pub fn save(
    path: impl AsRef<Path>,
    expr: &Expression,
    format: ExportFormat,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    let bytes = render(expr, format)?.into_bytes();
    fs::write(path, &bytes)?;
    info!("Saved {} export to {}", format, path.display());
    Ok(())
}
