//! Layered rasterization of a draw list onto a canvas.
//!
//! Layers are painted strictly in [`Layer::ORDER`]; each one overdraws the
//! previous where it covers. A feature that cannot be drawn is logged,
//! counted and skipped.

use std::collections::BTreeMap;

use map_common::{Feature, Geometry, GeometryKind, MapError, Rgb};
use serde::Serialize;
use tiny_skia::Path;
use tracing::{debug, warn};

use crate::canvas::{line_stroke, Canvas, DrawError};
use crate::draw_list::{AreaItem, DrawList, Layer};

/// Outcome of one rasterization pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderStats {
    /// Features drawn, all layers
    pub drawn: usize,
    /// Features skipped because their geometry could not be drawn
    pub skipped: usize,
    pub per_layer: BTreeMap<Layer, usize>,
}

enum Brush {
    Fill(Rgb),
    Stroke(Rgb, f32),
}

/// Paint `background` then every layer of `list`, in order.
pub fn render(canvas: &mut Canvas, background: Rgb, list: &DrawList<'_>) -> RenderStats {
    canvas.fill(background);

    let mut stats = RenderStats::default();
    for layer in Layer::ORDER {
        let items: Vec<(&Feature, Brush)> = match layer {
            Layer::LandCover => areas(&list.land_cover),
            Layer::Sand => areas(&list.sand),
            Layer::Water => areas(&list.water),
            Layer::WaterLines => list
                .water_lines
                .iter()
                .map(|l| (l.feature, Brush::Stroke(l.color, l.width_px)))
                .collect(),
            Layer::Roads => list
                .roads
                .iter()
                .map(|r| (r.feature, Brush::Stroke(r.style.color, r.width_px)))
                .collect(),
        };

        let mut drawn = 0;
        for (feature, brush) in items {
            match draw_feature(canvas, feature, &brush) {
                Ok(()) => drawn += 1,
                Err(err) => {
                    let err = MapError::Draw {
                        feature_id: feature.id,
                        message: err.to_string(),
                    };
                    warn!(layer = %layer, error = %err, "Skipping feature");
                    stats.skipped += 1;
                }
            }
        }

        debug!(layer = %layer, drawn = drawn, "Rendered layer");
        stats.drawn += drawn;
        stats.per_layer.insert(layer, drawn);
    }

    stats
}

fn areas<'a>(items: &[AreaItem<'a>]) -> Vec<(&'a Feature, Brush)> {
    items
        .iter()
        .map(|a| (a.feature, Brush::Fill(a.color)))
        .collect()
}

/// Draw every part of a feature, or nothing when any part cannot be drawn.
fn draw_feature(canvas: &mut Canvas, feature: &Feature, brush: &Brush) -> Result<(), DrawError> {
    let paths = feature_paths(canvas, &feature.geometry, brush)?;
    if paths.is_empty() {
        return Err(DrawError::Degenerate {
            points: 0,
            required: 1,
        });
    }

    match brush {
        Brush::Fill(color) => {
            for path in &paths {
                canvas.fill_path(path, *color);
            }
        }
        Brush::Stroke(color, width) => {
            let stroke = line_stroke(*width)?;
            for path in &paths {
                canvas.stroke_path(path, *color, &stroke);
            }
        }
    }
    Ok(())
}

/// Pixel paths of every part of `geometry`.
fn feature_paths(
    canvas: &Canvas,
    geometry: &Geometry,
    brush: &Brush,
) -> Result<Vec<Path>, DrawError> {
    match (geometry, brush) {
        (Geometry::Polygon(p), Brush::Fill(_)) => Ok(vec![canvas.polygon_path(p)?]),
        (Geometry::MultiPolygon(ps), Brush::Fill(_)) => {
            ps.0.iter().map(|p| canvas.polygon_path(p)).collect()
        }
        (Geometry::LineString(l), Brush::Stroke(..)) => Ok(vec![canvas.line_path(l)?]),
        (Geometry::MultiLineString(ls), Brush::Stroke(..)) => {
            ls.0.iter().map(|l| canvas.line_path(l)).collect()
        }
        (Geometry::Polygon(p), Brush::Stroke(..)) => Ok(vec![canvas.line_path(p.exterior())?]),
        (Geometry::MultiPolygon(ps), Brush::Stroke(..)) => ps
            .0
            .iter()
            .map(|p| canvas.line_path(p.exterior()))
            .collect(),
        (geometry, Brush::Fill(_)) => Err(DrawError::NotAnArea(geometry.kind_name())),
        (geometry, Brush::Stroke(..)) => Err(DrawError::NotALine(geometry.kind_name())),
    }
}
