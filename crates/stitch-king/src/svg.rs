//! SVG import: extract stitchable shapes from artwork.
//!
//! Uses usvg for complete SVG resolution (CSS, shapes to paths, etc.)
//! then walks the tree to collect path data. User units are taken as
//! millimetres.
//!
//! - the first closed subpath of a path is the exterior, later closed
//!   subpaths are holes
//! - open subpaths come back separately as polylines (satin rails, running
//!   lines)
//! - `data-pattern`, `data-density`, `data-angle` and `data-color` are read
//!   in a separate quick-xml pass, since usvg drops unknown attributes, and
//!   matched back to paths by element id. Attributes on a `<g>` apply to
//!   everything inside it.
//!
//! ## Curve Flattening
//!
//! Bézier segments are flattened with lyon_geom at [`CURVE_TOLERANCE`].

use std::collections::HashMap;

use lyon_geom::{point, CubicBezierSegment, QuadraticBezierSegment};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use crate::error::SvgError;
use crate::geometry::{Point, Polygon, Polyline};

/// Tolerance for curve flattening.
/// Lower = more points, smoother curves, slower.
pub const CURVE_TOLERANCE: f32 = 0.1;

/// An open path from the artwork.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPath {
    pub id: Option<String>,
    pub line: Polyline,
    pub stroke_color: Option<String>,
}

/// Everything stitchable found in one SVG document.
#[derive(Debug, Clone, Default)]
pub struct SvgShapes {
    pub polygons: Vec<Polygon>,
    pub open_paths: Vec<OpenPath>,
}

impl SvgShapes {
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty() && self.open_paths.is_empty()
    }
}

/// Extract closed regions and open paths from an SVG document.
///
/// Fails with `NoShapes` when the document has neither.
pub fn extract_shapes_from_svg(svg_content: &str) -> Result<SvgShapes, SvgError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg_content, &options)
        .map_err(|e| SvgError::ParseError(e.to_string()))?;

    let data_attrs = collect_data_attributes(svg_content)?;

    let mut shapes = SvgShapes::default();
    extract_from_group(tree.root(), &data_attrs, &mut shapes);

    debug!(
        polygons = shapes.polygons.len(),
        open_paths = shapes.open_paths.len(),
        "svg shapes extracted"
    );

    if shapes.is_empty() {
        Err(SvgError::NoShapes)
    } else {
        Ok(shapes)
    }
}

fn extract_from_group(group: &usvg::Group, attrs: &HashMap<String, DataAttributes>, shapes: &mut SvgShapes) {
    for child in group.children() {
        match child {
            usvg::Node::Group(group) => extract_from_group(group, attrs, shapes),
            usvg::Node::Path(path) => extract_from_path(path, attrs, shapes),
            // Text and images have nothing to stitch
            _ => {}
        }
    }
}

// ============================================================================
// PATH FLATTENING
// ============================================================================

/// One flattened subpath.
struct Subpath {
    points: Vec<Point>,
    closed: bool,
}

fn extract_from_path(path: &usvg::Path, attrs: &HashMap<String, DataAttributes>, shapes: &mut SvgShapes) {
    let id = (!path.id().is_empty()).then(|| path.id().to_string());
    let fill_color = path.fill().map(|f| paint_to_string(f.paint()));
    let stroke_color = path.stroke().map(|s| paint_to_string(s.paint()));

    let subpaths = flatten_subpaths(path.data());

    let mut closed = subpaths.iter().filter(|s| s.closed && s.points.len() >= 3);
    if let Some(exterior) = closed.next() {
        let holes = closed.map(|s| s.points.clone()).collect();
        let mut polygon = Polygon::with_holes(exterior.points.clone(), holes);
        polygon.fill_color = fill_color;
        polygon.stroke_color = stroke_color.clone();

        if let Some(data) = id.as_deref().and_then(|id| attrs.get(id)) {
            polygon.data_pattern = data.pattern.clone();
            polygon.data_density = data.density;
            polygon.data_angle = data.angle;
            polygon.data_color = data.color.clone();
        }
        polygon.id = id.clone();
        shapes.polygons.push(polygon);
    }

    for sub in subpaths.into_iter().filter(|s| !s.closed && s.points.len() >= 2) {
        shapes.open_paths.push(OpenPath {
            id: id.clone(),
            line: Polyline::new(sub.points),
            stroke_color: stroke_color.clone(),
        });
    }
}

/// Split path data into subpaths, flattening curves.
fn flatten_subpaths(data: &usvg::tiny_skia_path::Path) -> Vec<Subpath> {
    use usvg::tiny_skia_path::PathSegment;

    let mut subpaths = Vec::new();
    let mut points: Vec<Point> = Vec::new();
    let mut closed = false;
    let mut last_point: Option<(f32, f32)> = None;

    for segment in data.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                finish(&mut points, &mut closed, &mut subpaths);
                points.push(Point::new(p.x as f64, p.y as f64));
                last_point = Some((p.x, p.y));
            }
            PathSegment::LineTo(p) => {
                points.push(Point::new(p.x as f64, p.y as f64));
                last_point = Some((p.x, p.y));
            }
            PathSegment::QuadTo(ctrl, p) => {
                if let Some((lx, ly)) = last_point {
                    let curve = QuadraticBezierSegment {
                        from: point(lx, ly),
                        ctrl: point(ctrl.x, ctrl.y),
                        to: point(p.x, p.y),
                    };
                    curve.for_each_flattened(CURVE_TOLERANCE, &mut |seg| {
                        points.push(Point::new(seg.to.x as f64, seg.to.y as f64));
                    });
                } else {
                    points.push(Point::new(p.x as f64, p.y as f64));
                }
                last_point = Some((p.x, p.y));
            }
            PathSegment::CubicTo(ctrl1, ctrl2, p) => {
                if let Some((lx, ly)) = last_point {
                    let curve = CubicBezierSegment {
                        from: point(lx, ly),
                        ctrl1: point(ctrl1.x, ctrl1.y),
                        ctrl2: point(ctrl2.x, ctrl2.y),
                        to: point(p.x, p.y),
                    };
                    curve.for_each_flattened(CURVE_TOLERANCE, &mut |seg| {
                        points.push(Point::new(seg.to.x as f64, seg.to.y as f64));
                    });
                } else {
                    points.push(Point::new(p.x as f64, p.y as f64));
                }
                last_point = Some((p.x, p.y));
            }
            PathSegment::Close => {
                closed = true;
            }
        }
    }
    finish(&mut points, &mut closed, &mut subpaths);

    subpaths
}

/// Close off the subpath being built, if it has any points.
fn finish(points: &mut Vec<Point>, closed: &mut bool, subpaths: &mut Vec<Subpath>) {
    let mut pts = std::mem::take(points);
    dedup_points(&mut pts);
    if !pts.is_empty() {
        subpaths.push(Subpath { points: pts, closed: *closed });
    }
    *closed = false;
}

/// Drop consecutive near-duplicates from flattening, and the repeated
/// start point of an explicitly closed ring.
fn dedup_points(points: &mut Vec<Point>) {
    points.dedup_by(|a, b| (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);
    if points.len() >= 2 {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if first.distance(*last) < 1e-6 {
                points.pop();
            }
        }
    }
}

fn paint_to_string(paint: &usvg::Paint) -> String {
    match paint {
        usvg::Paint::Color(c) => format!("#{:02X}{:02X}{:02X}", c.red, c.green, c.blue),
        usvg::Paint::LinearGradient(_) => "linear-gradient".to_string(),
        usvg::Paint::RadialGradient(_) => "radial-gradient".to_string(),
        usvg::Paint::Pattern(_) => "pattern".to_string(),
    }
}

// ============================================================================
// DATA ATTRIBUTES (quick-xml pass)
// ============================================================================

/// Stitch hints attached to an element.
#[derive(Debug, Clone, Default, PartialEq)]
struct DataAttributes {
    pattern: Option<String>,
    density: Option<f64>,
    angle: Option<f64>,
    color: Option<String>,
}

impl DataAttributes {
    /// Own values win, missing ones come from the enclosing group.
    fn over(self, parent: &DataAttributes) -> DataAttributes {
        DataAttributes {
            pattern: self.pattern.or_else(|| parent.pattern.clone()),
            density: self.density.or(parent.density),
            angle: self.angle.or(parent.angle),
            color: self.color.or_else(|| parent.color.clone()),
        }
    }

    fn is_empty(&self) -> bool {
        *self == DataAttributes::default()
    }
}

/// Read an element's `id` and `data-*` hints.
fn read_attributes(e: &BytesStart) -> (Option<String>, DataAttributes) {
    let mut id = None;
    let mut data = DataAttributes::default();

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
        let value = std::str::from_utf8(&attr.value).unwrap_or("").trim();

        match key {
            "id" if !value.is_empty() => id = Some(value.to_string()),
            "data-pattern" => data.pattern = Some(value.to_string()),
            "data-density" => data.density = value.parse().ok(),
            "data-angle" => data.angle = value.parse().ok(),
            "data-color" => data.color = Some(value.to_string()),
            _ => {}
        }
    }

    (id, data)
}

/// Map element id → effective data attributes, with group inheritance.
fn collect_data_attributes(content: &str) -> Result<HashMap<String, DataAttributes>, SvgError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut by_id = HashMap::new();
    let mut groups: Vec<DataAttributes> = vec![DataAttributes::default()];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let (id, own) = read_attributes(e);
                let parent = groups.last().cloned().unwrap_or_default();
                let effective = own.over(&parent);
                if let Some(id) = id {
                    if !effective.is_empty() {
                        by_id.insert(id, effective.clone());
                    }
                }
                // Every open element pushes, so End can always pop
                groups.push(if e.name().as_ref() == b"g" { effective } else { parent });
            }
            Ok(Event::Empty(ref e)) => {
                let (id, own) = read_attributes(e);
                let parent = groups.last().cloned().unwrap_or_default();
                let effective = own.over(&parent);
                if let Some(id) = id {
                    if !effective.is_empty() {
                        by_id.insert(id, effective);
                    }
                }
            }
            Ok(Event::End(_)) => {
                if groups.len() > 1 {
                    groups.pop();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SvgError::ParseError(format!(
                    "XML parse error at position {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(by_id)
}

// ============================================================================
// TESTS
// ============================================================================
