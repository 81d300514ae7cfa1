//! Slices triangulated elevation meshes into stacked horizontal **contour layers**
//! for laser cutting and 3D printing, and exports the results as SVG cut sheets
//! or STL / OBJ / PLY meshes.
//!
//! The pipeline per elevation is [plane intersection](slice) → [loop assembly](contour::assemble)
//! → [cleanup](contour::process). Layers are independent, so they are cut in parallel
//! and collected back in elevation order.
//!
//! ```no_run
//! use topo_slicer::{GenerationControl, GenerationOptions, Mesh, generate_layers};
//!
//! let mesh = Mesh::frustum(100.0, 40.0, 60.0);
//! let layers = generate_layers(
//!     &mesh,
//!     &[10.0, 30.0, 50.0],
//!     &GenerationOptions::default(),
//!     &GenerationControl::default(),
//! )?;
//! assert_eq!(layers.len(), 3);
//! # Ok::<(), topo_slicer::SliceError>(())
//! ```
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - **parallel**: use rayon to cut layers concurrently
//! - **hashmap**: use hashbrown for endpoint snapping, vertex welding and `is_closed`
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` import and binary `.stl` export (ASCII export is always available)
//! - **svg-io**: per-layer SVG cut sheets
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod color;
pub mod contour;
pub mod errors;
pub mod extrude;
pub mod float_types;
pub mod io;
pub mod layer;
pub mod mesh;
pub mod pipeline;
pub mod slice;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use color::{ColorMapper, ColorScheme};
pub use contour::{Contour, ContourPolygon, Orientation};
pub use errors::{SliceError, SliceResult};
pub use extrude::stack_layers;
pub use float_types::Real;
pub use io::{ExportReport, FormatResult, GlobalOptions, MultiFormatExporter};
pub use layer::{Layer, LevelOptions, LevelStrategy, contour_levels};
pub use mesh::{BoundingBox, Mesh, Triangle, Vertex};
pub use pipeline::{
    CancellationToken, GenerationControl, GenerationOptions, GenerationTask, generate_layers,
};
pub use slice::{PlaneIntersector, Segment};
