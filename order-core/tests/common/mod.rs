#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use order_core::{PreviewHandle, RawPart};

pub fn rect_preview(w: f64, h: f64) -> PreviewHandle {
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}"><rect width="{w}" height="{h}" fill="black"/></svg>"#
    );
    PreviewHandle::new(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)))
}

pub fn raw_at(minx: f64, miny: f64, w: f64, h: f64) -> RawPart {
    RawPart {
        width: w,
        height: h,
        minx,
        miny,
        maxx: minx + w,
        maxy: miny + h,
        preview: rect_preview(w, h),
        preview_global: Some(rect_preview(w, h)),
    }
}

/// Analyzer-shaped JSON for a row of parts laid out left to right.
pub fn analysis_body(sizes: &[(f64, f64)]) -> String {
    let mut x = 0.0;
    let items: Vec<serde_json::Value> = sizes
        .iter()
        .map(|&(w, h)| {
            let v = serde_json::json!({
                "type": "SVG",
                "minx": x,
                "miny": 0.0,
                "maxx": x + w,
                "maxy": h,
                "width": w,
                "height": h,
                "area": w * h,
                "description": "",
                "preview": rect_preview(w, h),
                "preview_global": rect_preview(w, h),
            });
            x += w + 10.0;
            v
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

pub fn settled(w: f64, h: f64, n: u32) -> u64 {
    quote_core::price(w, h, n).ceil() as u64
}
