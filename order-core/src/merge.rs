//! Geometric recombination of selected parts.
//!
//! The merged footprint is the union of the parts' global bounding boxes plus
//! a fixed padding. Each part's global preview is translated into that frame
//! without moving parts relative to each other.

use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};
use tracing::debug;

use crate::error::MergeError;
use crate::model::{Bounds, Part, PartId, PreviewHandle};
use crate::preview::{PreviewDecoder, encode_png, png_data_url};

/// Padding added on every side of the merged box (mm).
pub const MERGE_PADDING_MM: f64 = 1.0;

/// Where one constituent lands on the merged canvas (mm, canvas origin).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub id: PartId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MergeLayout {
    /// Union box without padding, in the global frame.
    pub bounds: Bounds,
    /// Padded width (mm).
    pub width: f64,
    /// Padded height (mm).
    pub height: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub placements: Vec<Placement>,
}

/// Result of compositing a set of parts.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedGeometry {
    pub preview: PreviewHandle,
    pub width: f64,
    pub height: f64,
    /// Footprint of the composite, padding included.
    pub bounds: Bounds,
}

pub fn union_bounds<'a>(parts: impl IntoIterator<Item = &'a Part>) -> Option<Bounds> {
    parts
        .into_iter()
        .map(|p| p.bounds)
        .reduce(|acc, b| acc.union(&b))
}

pub fn merge_layout(parts: &[&Part]) -> Result<MergeLayout, MergeError> {
    if parts.len() < 2 {
        return Err(MergeError::TooFewParts);
    }
    let bounds = union_bounds(parts.iter().copied()).ok_or(MergeError::TooFewParts)?;
    let width = bounds.width() + MERGE_PADDING_MM * 2.0;
    let height = bounds.height() + MERGE_PADDING_MM * 2.0;

    let placements = parts
        .iter()
        .map(|p| {
            let (width, height) = drawn_extent(p);
            Placement {
                id: p.id,
                x: p.bounds.minx - bounds.minx + MERGE_PADDING_MM,
                y: p.bounds.miny - bounds.miny + MERGE_PADDING_MM,
                width,
                height,
            }
        })
        .collect();

    Ok(MergeLayout {
        bounds,
        width,
        height,
        canvas_width: canvas_edge(width),
        canvas_height: canvas_edge(height),
        placements,
    })
}

// A composite is 1 px per mm over its whole canvas, so an earlier merge is
// drawn at its canvas size rather than its rounded millimeters.
fn drawn_extent(p: &Part) -> (f64, f64) {
    if p.parts.is_empty() {
        (f64::from(p.width), f64::from(p.height))
    } else {
        (
            f64::from(canvas_edge(p.bounds.width())),
            f64::from(canvas_edge(p.bounds.height())),
        )
    }
}

fn padded(b: &Bounds) -> Bounds {
    Bounds {
        minx: b.minx - MERGE_PADDING_MM,
        miny: b.miny - MERGE_PADDING_MM,
        maxx: b.maxx + MERGE_PADDING_MM,
        maxy: b.maxy + MERGE_PADDING_MM,
    }
}

fn canvas_edge(mm: f64) -> u32 {
    if mm.is_finite() && mm > 0.0 {
        mm.ceil().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Composite the global previews of `parts` into one image.
///
/// Every part must carry a global preview; the check runs before anything is
/// decoded. A single decode failure aborts the whole merge.
pub async fn merge_parts<D: PreviewDecoder>(
    parts: &[&Part],
    decoder: &D,
) -> Result<MergedGeometry, MergeError> {
    let layout = merge_layout(parts)?;
    let mut sources = Vec::with_capacity(parts.len());
    for p in parts {
        match &p.preview_global {
            Some(h) if !h.is_blank() => sources.push(h),
            _ => return Err(MergeError::MissingPreview { id: p.id }),
        }
    }

    let mut canvas =
        Pixmap::new(layout.canvas_width, layout.canvas_height).ok_or(MergeError::Canvas {
            width: layout.canvas_width,
            height: layout.canvas_height,
        })?;
    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };

    for (place, handle) in layout.placements.iter().zip(sources) {
        let img = decoder
            .decode(handle)
            .await
            .map_err(|e| MergeError::Decode {
                id: place.id,
                reason: e.0,
            })?;
        let sx = place.width / f64::from(img.width());
        let sy = place.height / f64::from(img.height());
        let ts = Transform::from_row(
            sx as f32,
            0.0,
            0.0,
            sy as f32,
            place.x as f32,
            place.y as f32,
        );
        canvas.draw_pixmap(0, 0, img.as_ref(), &paint, ts, None);
        debug!(part = %place.id, x = place.x, y = place.y, "placed preview");
    }

    let png = encode_png(&canvas).map_err(|e| MergeError::Encode(e.to_string()))?;
    debug!(
        width = layout.width,
        height = layout.height,
        bytes = png.len(),
        "composited merge preview"
    );
    Ok(MergedGeometry {
        preview: png_data_url(&png),
        width: layout.width,
        height: layout.height,
        bounds: padded(&layout.bounds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::{DataUrlDecoder, decode_handle};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn rect_preview(w: u32, h: u32) -> PreviewHandle {
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}"><rect width="{w}" height="{h}" fill="black"/></svg>"#
        );
        PreviewHandle::new(format!(
            "data:image/svg+xml;base64,{}",
            STANDARD.encode(svg)
        ))
    }

    fn part(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Part {
        let width = (maxx - minx).round() as u32;
        let height = (maxy - miny).round() as u32;
        Part {
            id: PartId::new(),
            group_id: None,
            width,
            height,
            bounds: Bounds { minx, miny, maxx, maxy },
            price: 0,
            color: String::new(),
            name: String::new(),
            description: String::new(),
            preview: rect_preview(width, height),
            preview_global: Some(rect_preview(width, height)),
            parts: Vec::new(),
        }
    }

    #[test]
    fn layout_unions_and_pads() {
        let a = part(0.0, 0.0, 10.0, 10.0);
        let b = part(20.0, 0.0, 30.0, 10.0);
        let layout = merge_layout(&[&a, &b]).unwrap();
        assert_eq!(layout.width, 32.0);
        assert_eq!(layout.height, 12.0);
        assert_eq!((layout.canvas_width, layout.canvas_height), (32, 12));
        assert_eq!((layout.placements[0].x, layout.placements[0].y), (1.0, 1.0));
        assert_eq!((layout.placements[1].x, layout.placements[1].y), (21.0, 1.0));
    }

    #[test]
    fn layout_keeps_relative_offsets_away_from_origin() {
        let a = part(105.5, 40.0, 120.5, 50.0);
        let b = part(100.0, 60.0, 110.0, 75.25);
        let layout = merge_layout(&[&a, &b]).unwrap();
        assert_eq!(layout.width, 22.5);
        assert_eq!(layout.height, 37.25);
        assert_eq!((layout.canvas_width, layout.canvas_height), (23, 38));
        assert_eq!((layout.placements[0].x, layout.placements[0].y), (6.5, 1.0));
        assert_eq!((layout.placements[1].x, layout.placements[1].y), (1.0, 21.0));
    }

    #[test]
    fn earlier_merge_is_placed_at_canvas_size() {
        let a = part(105.5, 40.0, 120.5, 50.0);
        let b = part(100.0, 60.0, 110.0, 75.25);
        let geometry = pollster::block_on(merge_parts(&[&a, &b], &DataUrlDecoder)).unwrap();
        let mut merged = part(
            geometry.bounds.minx,
            geometry.bounds.miny,
            geometry.bounds.maxx,
            geometry.bounds.maxy,
        );
        merged.preview_global = Some(geometry.preview);
        merged.parts = vec![a, b];
        // 37.25 mm rounds to 37, the composite is 38 px tall
        assert_eq!((merged.width, merged.height), (23, 37));

        let c = part(130.0, 40.0, 140.0, 50.0);
        let layout = merge_layout(&[&merged, &c]).unwrap();
        assert_eq!((layout.placements[0].width, layout.placements[0].height), (23.0, 38.0));
        assert_eq!((layout.placements[1].width, layout.placements[1].height), (10.0, 10.0));

        let composite = pollster::block_on(merge_parts(&[&merged, &c], &DataUrlDecoder)).unwrap();
        let pm = decode_handle(&composite.preview).unwrap();
        assert_eq!((pm.width(), pm.height()), (43, 40));
        // inside b, shifted by the new padding; below it only padding
        assert_eq!(pm.pixel(5, 1 + 28).unwrap().alpha(), 255);
        assert_eq!(pm.pixel(5, 39).unwrap().alpha(), 0);
    }

    #[test]
    fn single_part_is_rejected() {
        let a = part(0.0, 0.0, 10.0, 10.0);
        assert_eq!(merge_layout(&[&a]), Err(MergeError::TooFewParts));
        assert_eq!(union_bounds(std::iter::empty()), None);
    }

    #[test]
    fn missing_global_preview_fails_fast() {
        let a = part(0.0, 0.0, 10.0, 10.0);
        let mut b = part(20.0, 0.0, 30.0, 10.0);
        b.preview_global = None;
        let err = pollster::block_on(merge_parts(&[&a, &b], &DataUrlDecoder)).unwrap_err();
        assert_eq!(err, MergeError::MissingPreview { id: b.id });
    }

    #[test]
    fn undecodable_preview_aborts() {
        let a = part(0.0, 0.0, 10.0, 10.0);
        let mut b = part(20.0, 0.0, 30.0, 10.0);
        b.preview_global = Some(PreviewHandle::new("data:image/svg+xml;utf8,not-svg"));
        let err = pollster::block_on(merge_parts(&[&a, &b], &DataUrlDecoder)).unwrap_err();
        assert!(matches!(err, MergeError::Decode { id, .. } if id == b.id));
    }

    #[test]
    fn composite_places_parts_in_shared_frame() {
        let a = part(0.0, 0.0, 10.0, 10.0);
        let b = part(20.0, 0.0, 30.0, 10.0);
        let merged = pollster::block_on(merge_parts(&[&a, &b], &DataUrlDecoder)).unwrap();
        assert_eq!((merged.width, merged.height), (32.0, 12.0));
        assert_eq!(merged.bounds, Bounds { minx: -1.0, miny: -1.0, maxx: 31.0, maxy: 11.0 });

        let pm = decode_handle(&merged.preview).unwrap();
        assert_eq!((pm.width(), pm.height()), (32, 12));
        // inside a, gap, inside b, padding
        assert_eq!(pm.pixel(5, 5).unwrap().alpha(), 255);
        assert_eq!(pm.pixel(16, 5).unwrap().alpha(), 0);
        assert_eq!(pm.pixel(26, 5).unwrap().alpha(), 255);
        assert_eq!(pm.pixel(0, 0).unwrap().alpha(), 0);
    }
}
