//! Multi-format dispatch with a per-format outcome report.

use crate::errors::SliceError;
use crate::io::naming::substitute_filename_pattern;
use crate::io::obj::{ObjOptions, export_obj};
use crate::io::ply::{PlyOptions, export_ply};
use crate::io::stl::{StlOptions, export_stl};
use crate::layer::Layer;
use crate::mesh::Mesh;
use std::path::{Path, PathBuf};

#[cfg(feature = "svg-io")]
use crate::io::svg::{SvgOptions, export_svg_layers};

/// Formats drawn from contours by other collaborators (raster and GIS writers).
pub const CONTOUR_ONLY_FORMATS: [&str; 4] = ["png", "geojson", "geotiff", "shapefile"];
/// Formats written from the mesh.
pub const MESH_FORMATS: [&str; 3] = ["stl", "obj", "ply"];

/// Where files go and what they are called.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalOptions {
    pub output_directory: PathBuf,
    pub base_filename: String,
    /// Filename pattern, see [`substitute_filename_pattern`].
    pub filename_pattern: Option<String>,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            base_filename: "topographic_model".to_string(),
            filename_pattern: None,
        }
    }
}

/// Outcome of one requested format.
#[derive(Debug)]
pub enum FormatResult {
    /// Files written, in write order.
    Written(Vec<PathBuf>),
    /// Nothing written, and that is not an error (e.g. contour formats on a mesh-only call).
    Skipped(String),
    Failed(SliceError),
}

impl FormatResult {
    pub const fn is_failed(&self) -> bool {
        matches!(self, FormatResult::Failed(_))
    }

    pub const fn is_skipped(&self) -> bool {
        matches!(self, FormatResult::Skipped(_))
    }
}

/// Per-format results in processing order.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub results: Vec<(String, FormatResult)>,
}

impl ExportReport {
    /// `true` unless some format failed. Skipped formats do not count as failures.
    pub fn success(&self) -> bool {
        !self.results.iter().any(|(_, r)| r.is_failed())
    }

    /// Every file written, across formats.
    pub fn files(&self) -> Vec<&Path> {
        self.results
            .iter()
            .filter_map(|(_, r)| match r {
                FormatResult::Written(paths) => Some(paths.iter().map(PathBuf::as_path)),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Result for `format`, if it was requested.
    pub fn get(&self, format: &str) -> Option<&FormatResult> {
        self.results.iter().find(|(f, _)| f == format).map(|(_, r)| r)
    }
}

/// Writes one model in several formats.
#[derive(Debug, Clone, Default)]
pub struct MultiFormatExporter {
    pub global: GlobalOptions,
    pub stl: StlOptions,
    pub obj: ObjOptions,
    pub ply: PlyOptions,
    #[cfg(feature = "svg-io")]
    pub svg: SvgOptions,
}

fn rank(format: &str) -> u8 {
    match format {
        "svg" => 0,
        f if MESH_FORMATS.contains(&f) => 1,
        _ => 2,
    }
}

impl MultiFormatExporter {
    pub fn new(global: GlobalOptions) -> Self {
        Self {
            global,
            ..Self::default()
        }
    }

    /// Writes `mesh` (and `layers`, when the caller has contours) in every
    /// requested format.
    ///
    /// Formats are lower-cased and de-duplicated, then processed SVG first,
    /// mesh formats next and everything else last, keeping request order
    /// within each group. SVG without layers and the contour-only formats are
    /// skipped; an unrecognised name fails. One format failing never stops
    /// the others.
    pub fn export_all(&self, mesh: &Mesh, layers: Option<&[Layer]>, formats: &[&str]) -> ExportReport {
        let mut ordered: Vec<String> = Vec::with_capacity(formats.len());
        for f in formats {
            let f = f.trim().to_ascii_lowercase();
            if !ordered.contains(&f) {
                ordered.push(f);
            }
        }
        ordered.sort_by_key(|f| rank(f));

        let mut report = ExportReport::default();
        let dir = &self.global.output_directory;
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot create output directory");
            for f in ordered {
                let err = SliceError::io(dir, std::io::Error::new(e.kind(), e.to_string()));
                report.results.push((f, FormatResult::Failed(err)));
            }
            return report;
        }

        for format in ordered {
            let result = self.export_one(&format, mesh, layers);
            match &result {
                FormatResult::Written(paths) => tracing::info!(format = %format, files = paths.len(), "export done"),
                FormatResult::Skipped(reason) => tracing::warn!(format = %format, reason = %reason, "export skipped"),
                FormatResult::Failed(err) => tracing::warn!(format = %format, error = %err, "export failed"),
            }
            report.results.push((format, result));
        }

        tracing::info!(
            formats = report.results.len(),
            files = report.files().len(),
            success = report.success(),
            "multi-format export finished"
        );
        report
    }

    fn export_one(&self, format: &str, mesh: &Mesh, layers: Option<&[Layer]>) -> FormatResult {
        let dir = &self.global.output_directory;
        let base = &self.global.base_filename;
        match format {
            "svg" => self.export_svg(layers),
            "stl" => {
                let stem = match &self.global.filename_pattern {
                    Some(p) => substitute_filename_pattern(p, base, 0, 0.0),
                    None => base.clone(),
                };
                let path = dir.join(format!("{stem}.stl"));
                match export_stl(mesh, &self.stl, &path) {
                    Ok(()) => FormatResult::Written(vec![path]),
                    Err(e) => FormatResult::Failed(e),
                }
            },
            "obj" => match export_obj(mesh, &self.obj, &dir.join(format!("{base}.obj"))) {
                Ok(paths) => FormatResult::Written(paths),
                Err(e) => FormatResult::Failed(e),
            },
            "ply" => {
                let path = dir.join(format!("{base}.ply"));
                match export_ply(mesh, &self.ply, &path) {
                    Ok(()) => FormatResult::Written(vec![path]),
                    Err(e) => FormatResult::Failed(e),
                }
            },
            f if CONTOUR_ONLY_FORMATS.contains(&f) => {
                FormatResult::Skipped(format!("{f} export is handled by the contour stage"))
            },
            other => FormatResult::Failed(SliceError::UnknownFormat(other.to_string())),
        }
    }

    #[cfg(feature = "svg-io")]
    fn export_svg(&self, layers: Option<&[Layer]>) -> FormatResult {
        let Some(layers) = layers else {
            return FormatResult::Skipped(
                SliceError::NotApplicable {
                    format: "svg".into(),
                    reason: "no contour layers supplied with a mesh-only export".into(),
                }
                .to_string(),
            );
        };
        match export_svg_layers(
            layers,
            &self.svg,
            &self.global.output_directory,
            &self.global.base_filename,
            self.global.filename_pattern.as_deref(),
        ) {
            Ok(paths) if paths.is_empty() => FormatResult::Skipped("no contours to draw".into()),
            Ok(paths) => FormatResult::Written(paths),
            Err(e) => FormatResult::Failed(e),
        }
    }

    #[cfg(not(feature = "svg-io"))]
    fn export_svg(&self, _layers: Option<&[Layer]>) -> FormatResult {
        FormatResult::Failed(SliceError::Unsupported { format: "svg".into() })
    }
}
