//! File export: per-format writers and the multi-format dispatcher.
//!
//! Many formats are behind cargo feature-flags. When a feature is disabled
//! a request for that format is reported as a failed format, not a panic.

use crate::errors::{SliceError, SliceResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub mod export;
pub mod naming;
pub mod obj;
pub mod ply;
pub mod scaling;
pub mod stl;

#[cfg(feature = "svg-io")]
pub mod svg;

pub use export::{ExportReport, FormatResult, GlobalOptions, MultiFormatExporter};
pub use naming::{layer_file_stem, substitute_filename_pattern};
pub use obj::{ObjOptions, export_obj};
pub use ply::{PlyOptions, export_ply};
pub use scaling::{MeshTransform, ScaleOptions, auto_scale_factor};
pub use stl::{StlOptions, export_stl};

#[cfg(feature = "svg-io")]
pub use self::svg::{SvgOptions, export_svg_layers};

/// Creates `path`, hands a buffered writer to `body` and flushes it.
/// Every failure is reported with the path attached.
pub(crate) fn write_file<F>(path: &Path, body: F) -> SliceResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file = File::create(path).map_err(|e| SliceError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    body(&mut writer)
        .and_then(|()| writer.flush())
        .map_err(|e| SliceError::io(path, e))
}
