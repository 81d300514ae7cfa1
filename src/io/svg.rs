//! Laser-cut SVG sheets, one per layer plus an optional stacked overview.

use crate::contour::{Contour, ContourPolygon};
use crate::errors::SliceResult;
use crate::float_types::Real;
use crate::io::naming::{layer_file_stem, substitute_filename_pattern};
use crate::io::write_file;
use crate::layer::{Layer, layers_bounding_box};
use crate::mesh::BoundingBox;
use nalgebra::Point2;
use std::path::{Path, PathBuf};
use ::svg::Document;
use ::svg::node::element::{Group, Path as SvgPath, Rectangle, Style, Text};

/// Side length of a registration cross.
pub const MARK_SIZE_MM: Real = 5.0;
/// Font size of elevation labels.
pub const LABEL_SIZE_MM: Real = 3.0;
/// Padding added to each side of a zero-extent axis.
const DEGENERATE_PAD: Real = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct SvgOptions {
    pub width_mm: Real,
    pub height_mm: Real,
    pub margin_mm: Real,
    pub stroke_width_mm: Real,
    pub alignment_stroke_width_mm: Real,
    pub cut_color: String,
    pub alignment_color: String,
    pub text_color: String,
    /// Page fill; `None` leaves the page transparent.
    pub background_color: Option<String>,
    pub registration_marks: bool,
    pub labels: bool,
    /// Dashed rectangle around the content area.
    pub cutting_guidelines: bool,
    /// Also write `<base>_combined.svg` with every layer.
    pub combined_file: bool,
    /// Write one sheet per non-empty layer.
    pub separate_layers: bool,
    /// Emit outer rings only.
    pub remove_holes: bool,
    /// Fit the content to the page width and size the page height to the content's aspect.
    /// Off, the page keeps its configured size and `scale_factor` converts units to mm.
    pub auto_fit: bool,
    pub scale_factor: Real,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            width_mm: 300.0,
            height_mm: 200.0,
            margin_mm: 10.0,
            stroke_width_mm: 0.1,
            alignment_stroke_width_mm: 0.2,
            cut_color: "#FF0000".to_string(),
            alignment_color: "#0000FF".to_string(),
            text_color: "#000000".to_string(),
            background_color: Some("#FFFFFF".to_string()),
            registration_marks: true,
            labels: true,
            cutting_guidelines: false,
            combined_file: true,
            separate_layers: true,
            remove_holes: true,
            auto_fit: true,
            scale_factor: 1.0,
        }
    }
}

/// Maps model coordinates onto a page in millimetres, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width_mm: Real,
    pub height_mm: Real,
    pub scale: Real,
    offset_x: Real,
    offset_y: Real,
    min_x: Real,
    min_y: Real,
}

impl PageLayout {
    /// Layout for content bounded by `bbox`, centred on the page.
    pub fn new(bbox: &BoundingBox, options: &SvgOptions) -> Self {
        let bbox = bbox.padded_if_degenerate(DEGENERATE_PAD);
        let (content_w, content_h) = (bbox.width(), bbox.height());
        let width_mm = options.width_mm;
        let available_w = width_mm - 2.0 * options.margin_mm;

        let (height_mm, scale) = if options.auto_fit {
            let height_mm = available_w * content_h / content_w + 2.0 * options.margin_mm;
            let available_h = height_mm - 2.0 * options.margin_mm;
            (height_mm, (available_w / content_w).min(available_h / content_h))
        } else {
            (options.height_mm, options.scale_factor)
        };

        Self {
            width_mm,
            height_mm,
            scale,
            offset_x: (width_mm - content_w * scale) / 2.0,
            offset_y: (height_mm - content_h * scale) / 2.0,
            min_x: bbox.min_x,
            min_y: bbox.min_y,
        }
    }

    #[inline]
    pub fn to_page(&self, p: &Point2<Real>) -> Point2<Real> {
        Point2::new(
            (p.x - self.min_x) * self.scale + self.offset_x,
            self.height_mm - ((p.y - self.min_y) * self.scale + self.offset_y),
        )
    }

    /// Page-space bounds of `polygons`.
    pub fn footprint(&self, polygons: &[ContourPolygon]) -> Option<BoundingBox> {
        let points: Vec<_> = polygons
            .iter()
            .flat_map(|p| p.outer.points().iter().map(|q| self.to_page(q)))
            .collect();
        BoundingBox::from_points_2d(points.iter())
    }

    /// Page-space rectangle of the content area.
    fn content_rect(&self, bbox: &BoundingBox) -> (Real, Real, Real, Real) {
        (
            self.offset_x,
            self.height_mm - self.offset_y - bbox.height() * self.scale,
            bbox.width() * self.scale,
            bbox.height() * self.scale,
        )
    }
}

/// `M x y L x y ... Z` for one closed ring, three decimals.
fn ring_path_data(contour: &Contour, layout: &PageLayout) -> String {
    let mut d = String::new();
    for (i, p) in contour.points().iter().enumerate() {
        let q = layout.to_page(p);
        let cmd = if i == 0 { "M" } else { " L" };
        d.push_str(&format!("{cmd} {:.3} {:.3}", q.x, q.y));
    }
    d.push_str(" Z");
    d
}

fn polygon_path_data(polygon: &ContourPolygon, layout: &PageLayout, remove_holes: bool) -> String {
    let mut d = ring_path_data(&polygon.outer, layout);
    if !remove_holes {
        for hole in &polygon.holes {
            d.push(' ');
            d.push_str(&ring_path_data(hole, layout));
        }
    }
    d
}

/// Group id of a layer: `layer_NN_elev_E`.
pub fn layer_id(number: usize, elevation: Real) -> String {
    format!("layer_{number:02}_elev_{}", elevation.round() as i64)
}

fn cut_group(layer: &Layer, number: usize, layout: &PageLayout, options: &SvgOptions) -> Group {
    layer
        .polygons
        .iter()
        .filter(|p| p.outer.len() >= 3)
        .fold(Group::new().set("id", layer_id(number, layer.elevation)), |group, polygon| {
            group.add(
                SvgPath::new()
                    .set("d", polygon_path_data(polygon, layout, options.remove_holes))
                    .set("class", "cut-line")
                    .set("fill", "none")
                    .set("fill-rule", "evenodd")
                    .set("stroke", options.cut_color.as_str())
                    .set("stroke-width", format!("{}", options.stroke_width_mm)),
            )
        })
}

fn registration_marks(layout: &PageLayout, options: &SvgOptions) -> Group {
    let inset = options.margin_mm / 2.0;
    let half = MARK_SIZE_MM / 2.0;
    let corners = [
        (inset, inset),
        (layout.width_mm - inset, inset),
        (layout.width_mm - inset, layout.height_mm - inset),
        (inset, layout.height_mm - inset),
    ];
    corners.iter().fold(Group::new().set("id", "alignment-marks"), |group, &(x, y)| {
        group.add(
            SvgPath::new()
                .set(
                    "d",
                    format!(
                        "M {:.3} {:.3} L {:.3} {:.3} M {:.3} {:.3} L {:.3} {:.3}",
                        x - half,
                        y,
                        x + half,
                        y,
                        x,
                        y - half,
                        x,
                        y + half
                    ),
                )
                .set("class", "alignment-mark")
                .set("stroke", options.alignment_color.as_str()),
        )
    })
}

/// Where an elevation label goes: the first page corner inside the margin whose
/// label box stays clear of `avoid`, or the top-left margin position when every
/// corner is covered.
pub fn label_position(text: &str, layout: &PageLayout, options: &SvgOptions, avoid: Option<&BoundingBox>) -> Point2<Real> {
    let m = options.margin_mm;
    let w = text.chars().count() as Real * LABEL_SIZE_MM * 0.6;
    let fallback = Point2::new(m, m + 5.0);
    let candidates = [
        fallback,
        Point2::new(layout.width_mm - m - w, m + 5.0),
        Point2::new(m, layout.height_mm - m),
        Point2::new(layout.width_mm - m - w, layout.height_mm - m),
    ];
    let Some(avoid) = avoid else {
        return fallback;
    };
    candidates
        .into_iter()
        .find(|c| {
            let label = BoundingBox::planar(c.x, c.y - LABEL_SIZE_MM, c.x + w, c.y);
            !label.intersects_xy(avoid)
        })
        .unwrap_or(fallback)
}

fn label(text: String, at: Point2<Real>, options: &SvgOptions) -> Text {
    Text::new(text)
        .set("x", format!("{:.3}", at.x))
        .set("y", format!("{:.3}", at.y))
        .set("class", "elevation-label")
        .set("fill", options.text_color.as_str())
}

fn page(layout: &PageLayout, options: &SvgOptions) -> Document {
    let css = format!(
        ".cut-line {{ stroke-width: {}mm; }} \
         .alignment-mark {{ fill: none; stroke-width: {}mm; }} \
         .elevation-label {{ font-family: Arial, sans-serif; font-size: {}mm; }}",
        options.stroke_width_mm, options.alignment_stroke_width_mm, LABEL_SIZE_MM
    );
    let mut doc = Document::new()
        .set("width", format!("{}mm", layout.width_mm))
        .set("height", format!("{}mm", layout.height_mm))
        .set("viewBox", format!("0 0 {} {}", layout.width_mm, layout.height_mm))
        .set("version", "1.1")
        .add(Style::new(css));
    if let Some(bg) = &options.background_color {
        doc = doc.add(
            Rectangle::new()
                .set("id", "background")
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", bg.as_str()),
        );
    }
    doc
}

fn decorate(mut doc: Document, layout: &PageLayout, bbox: &BoundingBox, options: &SvgOptions) -> Document {
    if options.cutting_guidelines {
        let (x, y, w, h) = layout.content_rect(bbox);
        doc = doc.add(
            Rectangle::new()
                .set("id", "cutting-guideline")
                .set("x", format!("{x:.3}"))
                .set("y", format!("{y:.3}"))
                .set("width", format!("{w:.3}"))
                .set("height", format!("{h:.3}"))
                .set("fill", "none")
                .set("stroke", options.alignment_color.as_str())
                .set("stroke-width", format!("{}", options.alignment_stroke_width_mm))
                .set("stroke-dasharray", "2,2"),
        );
    }
    if options.registration_marks {
        doc = doc.add(registration_marks(layout, options));
    }
    doc
}

fn elevation_text(elevation: Real) -> String {
    format!("{}m", elevation.round() as i64)
}

/// The sheet for `layer`, numbered `number`. `next` is the layer stacked on top of it.
pub fn layer_document(
    layer: &Layer,
    number: usize,
    next: Option<&Layer>,
    layout: &PageLayout,
    bbox: &BoundingBox,
    options: &SvgOptions,
) -> Document {
    let mut doc = page(layout, options).add(cut_group(layer, number, layout, options));
    doc = decorate(doc, layout, bbox, options);
    if options.labels {
        let text = elevation_text(layer.elevation);
        let avoid = next.and_then(|n| layout.footprint(&n.polygons));
        let at = label_position(&text, layout, options, avoid.as_ref());
        doc = doc.add(Group::new().set("id", "elevation-labels").add(label(text, at, options)));
    }
    doc
}

/// Every layer on one page, one group each, labels listed down the left margin.
pub fn combined_document(layers: &[Layer], layout: &PageLayout, bbox: &BoundingBox, options: &SvgOptions) -> Document {
    let mut doc = page(layout, options);
    for (i, layer) in layers.iter().enumerate() {
        doc = doc.add(cut_group(layer, i + 1, layout, options));
    }
    doc = decorate(doc, layout, bbox, options);
    if options.labels {
        let labels = layers.iter().enumerate().fold(Group::new().set("id", "elevation-labels"), |g, (i, layer)| {
            let at = Point2::new(options.margin_mm, options.margin_mm + 5.0 + i as Real * 5.0);
            g.add(label(elevation_text(layer.elevation), at, options))
        });
        doc = doc.add(labels);
    }
    doc
}

/// Writes layer sheets into `directory` and returns the paths in layer order,
/// the combined sheet last.
///
/// Layer files are named by `pattern` when given (layer numbers are 1-based),
/// otherwise `<base>_layer_NN_elev_Em.svg`. Empty layers get no sheet of
/// their own but keep their number.
pub fn export_svg_layers(
    layers: &[Layer],
    options: &SvgOptions,
    directory: &Path,
    basename: &str,
    pattern: Option<&str>,
) -> SliceResult<Vec<PathBuf>> {
    let Some(bbox) = layers_bounding_box(layers) else {
        tracing::warn!("no contours in any layer, nothing to draw");
        return Ok(Vec::new());
    };
    let bbox = bbox.padded_if_degenerate(DEGENERATE_PAD);
    let layout = PageLayout::new(&bbox, options);
    let mut files = Vec::new();

    if options.separate_layers {
        for (i, layer) in layers.iter().enumerate() {
            if layer.is_empty() {
                continue;
            }
            let number = i + 1;
            let stem = match pattern {
                Some(p) => substitute_filename_pattern(p, basename, number, layer.elevation),
                None => layer_file_stem(basename, number, layer.elevation),
            };
            let path = directory.join(format!("{stem}.svg"));
            let doc = layer_document(layer, number, layers.get(i + 1), &layout, &bbox, options);
            write_file(&path, |w| ::svg::write(w, &doc))?;
            tracing::debug!(path = %path.display(), contours = layer.contour_count(), "wrote SVG layer");
            files.push(path);
        }
    }

    if options.combined_file {
        let path = directory.join(format!("{basename}_combined.svg"));
        let doc = combined_document(layers, &layout, &bbox, options);
        write_file(&path, |w| ::svg::write(w, &doc))?;
        files.push(path);
    }

    tracing::info!(
        files = files.len(),
        page_width_mm = layout.width_mm,
        page_height_mm = layout.height_mm,
        scale = layout.scale,
        "wrote SVG sheets"
    );
    Ok(files)
}
