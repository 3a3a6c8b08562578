//! Export gating and engine-side exporters.
//!
//! PNG is open to everyone; SVG, PDF and JSON need a premium subscription.
//! SVG and JSON are produced here. PNG and PDF come from the host's bitmap
//! (`toDataURL`), so the engine only checks access and sizes the render.

use crate::editor::Editor;
use crate::error::{EditorError, EditorResult};
use mocko_render::render_svg;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Svg,
    Pdf,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Png, Self::Svg, Self::Pdf, Self::Json];

    pub fn requires_premium(self) -> bool {
        !matches!(self, Self::Png)
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
            Self::Pdf => "application/pdf",
            Self::Json => "application/json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::Json => "json",
        }
    }

    /// Check whether a user with the given subscription may export.
    pub fn check_access(self, is_premium: bool) -> EditorResult<()> {
        if self.requires_premium() && !is_premium {
            Err(EditorError::PremiumRequired(self))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Png => "PNG",
            Self::Svg => "SVG",
            Self::Pdf => "PDF",
            Self::Json => "JSON",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            "json" => Ok(Self::Json),
            other => Err(EditorError::UnknownExportFormat(other.to_string())),
        }
    }
}

/// Result of an export request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportPayload {
    /// A finished document.
    Document {
        format: ExportFormat,
        file_name: String,
        data: String,
    },
    /// Access granted; the host renders the canvas bitmap at this size.
    HostRender {
        format: ExportFormat,
        file_name: String,
        width: u32,
        height: u32,
    },
}

impl ExportPayload {
    pub fn format(&self) -> ExportFormat {
        match self {
            Self::Document { format, .. } | Self::HostRender { format, .. } => *format,
        }
    }
}

/// Download file name for a design: unsafe characters become `_`.
pub fn export_file_name(design_name: &str, format: ExportFormat) -> String {
    let stem: String = design_name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "design" } else { stem.as_str() };
    format!("{stem}.{}", format.extension())
}

impl Editor {
    /// Export the canvas. Access is checked before anything is produced.
    pub fn export(
        &self,
        format: ExportFormat,
        design_name: &str,
        is_premium: bool,
    ) -> EditorResult<ExportPayload> {
        format.check_access(is_premium)?;
        let file_name = export_file_name(design_name, format);
        let (width, height) = self.canvas_size();
        Ok(match format {
            ExportFormat::Svg => ExportPayload::Document {
                format,
                file_name,
                data: render_svg(&self.graph, width, height),
            },
            ExportFormat::Json => ExportPayload::Document {
                format,
                file_name,
                data: self.canvas_json()?,
            },
            ExportFormat::Png | ExportFormat::Pdf => ExportPayload::HostRender {
                format,
                file_name,
                width: width.round() as u32,
                height: height.round() as u32,
            },
        })
    }
}
