//! SVG overlay serializer.
//!
//! Renders fitted curves over the simplified edge paths they were fitted
//! to, using the [`svg`] crate for document construction, XML escaping,
//! and path data formatting. The document's coordinate space is the
//! source buffer's pixel grid, so the overlay can be stacked on the
//! original image.
//!
//! Layers, bottom to top:
//!
//! 1. `<g id="paths">` thin gray guides, one `<path>` per simplified path
//! 2. `<g id="fits">` one colored `<path>` per fitted curve
//! 3. `<g id="formulas">` one `<text>` label per fitted curve, in the
//!    curve's color
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Group, Path, Title};
use svg::node::{Node, Text, Value};

use edgefit_pipeline::{Dimensions, FittingResult, Polyline};

/// Curve colors by result index.
///
/// Index 0 (the longest path) is always red; further results cycle.
pub const FIT_COLORS: &[&str] = &[
    "#ff3333", // red
    "#3399ff", // blue
    "#33cc33", // green
    "#ff8800", // orange
    "#cc33ff", // purple
    "#00cccc", // teal
    "#ffdd00", // yellow
    "#ff66aa", // pink
];

/// Stroke color of the simplified-path guides.
pub const GUIDE_COLOR: &str = "#9e9e9e";

/// Namespace of the `<edgefit:pipeline>` metadata element.
const METADATA_NAMESPACE: &str = "urn:edgefit:pipeline:1";

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically by
/// the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized pipeline configuration, emitted inside
    /// `<metadata><edgefit:pipeline>` so exported files carry
    /// machine-readable settings.
    pub config_json: Option<&'a str>,
}

/// Palette color for the result at `index`.
#[must_use]
pub fn fit_color(index: usize) -> &'static str {
    FIT_COLORS[index % FIT_COLORS.len()]
}

/// Build an SVG path `d` attribute string from a polyline.
///
/// Uses `M` for the first point and `L` for subsequent points.
/// Returns an empty string for polylines with fewer than 2 points.
///
/// Coordinates are formatted by the [`svg`] crate using `f32` precision
/// (sufficient for pixel-space coordinates).
///
/// # Examples
///
/// ```
/// use edgefit_pipeline::{Point, Polyline};
/// use edgefit_export::build_path_data;
///
/// let polyline = Polyline::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// let d = build_path_data(&polyline);
/// assert_eq!(d, "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(polyline: &Polyline) -> String {
    let Some((first, rest)) = polyline.points().split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data))
}

/// Serialize fitted curves and their guide paths into an SVG document.
///
/// `fits` are expected in pipeline order (longest path first); each
/// fitted curve is stroked with [`fit_color`] of its index, so the
/// colors stay stable when sentinel results in between are skipped.
/// Results whose curve has fewer than 2 points (the insufficient-data
/// and singular sentinels) draw nothing. `paths` are drawn beneath as
/// [`GUIDE_COLOR`] guides.
///
/// # Examples
///
/// ```
/// use edgefit_pipeline::{Dimensions, Point, Polyline};
/// use edgefit_export::{SvgMetadata, to_overlay_svg};
///
/// let guides = vec![Polyline::new(vec![Point::new(0.0, 5.0), Point::new(9.0, 5.0)])];
/// let dims = Dimensions { width: 10, height: 10 };
/// let metadata = SvgMetadata {
///     title: Some("flat"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_overlay_svg(&[], &guides, dims, &metadata);
/// assert!(svg.contains("<title>flat</title>"));
/// assert!(svg.contains(r#"d="M0,5 L9,5""#));
/// ```
#[must_use]
pub fn to_overlay_svg(
    fits: &[FittingResult],
    paths: &[Polyline],
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut pipeline_el = Element::new("edgefit:pipeline");
        pipeline_el.assign("xmlns:edgefit", METADATA_NAMESPACE);
        pipeline_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(pipeline_el);
        doc = doc.add(metadata_el);
    }

    let mut guides = Group::new()
        .set("id", "paths")
        .set("fill", "none")
        .set("stroke", GUIDE_COLOR)
        .set("stroke-width", 1);
    let mut guide_count = 0;
    for path in paths {
        let d = build_path_data(path);
        if d.is_empty() {
            continue;
        }
        guides = guides.add(Path::new().set("d", d));
        guide_count += 1;
    }
    if guide_count > 0 {
        doc = doc.add(guides);
    }

    let mut curves = Group::new()
        .set("id", "fits")
        .set("fill", "none")
        .set("stroke-width", 2);
    let mut labels = Group::new()
        .set("id", "formulas")
        .set("font-family", "monospace")
        .set("font-size", 12);
    let mut drawn = 0;
    for (index, fit) in fits.iter().enumerate() {
        let d = build_path_data(&fit.curve);
        if d.is_empty() {
            continue;
        }
        let color = fit_color(index);

        curves = curves.add(
            Path::new()
                .set("d", d)
                .set("stroke", color)
                .set("data-index", index.to_string()),
        );

        let mut label = Element::new("text");
        label.assign("x", 8);
        label.assign("y", (20 + 16 * drawn).to_string());
        label.assign("fill", color);
        label.append(Text::new(fit.formula.as_str()));
        labels = labels.add(label);

        drawn += 1;
    }
    if drawn > 0 {
        doc = doc.add(curves).add(labels);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
