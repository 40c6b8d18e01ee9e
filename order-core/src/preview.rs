//! Decoding and encoding of preview images.
//!
//! Previews travel as `data:` URLs. SVG payloads (base64 or percent-encoded)
//! are rasterized at their intrinsic size; PNG payloads are decoded directly.

use std::future::Future;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use thiserror::Error;
use tiny_skia::Pixmap;
use tracing::debug;

use crate::model::PreviewHandle;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// Image payload carried by a data URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Svg(Vec<u8>),
    Png(Vec<u8>),
}

/// Turns a preview handle into a drawable raster.
pub trait PreviewDecoder {
    fn decode(&self, handle: &PreviewHandle) -> impl Future<Output = Result<Pixmap, DecodeError>>;
}

/// Decodes `data:` URLs in-process.
#[derive(Clone, Copy, Debug, Default)]
pub struct DataUrlDecoder;

impl PreviewDecoder for DataUrlDecoder {
    async fn decode(&self, handle: &PreviewHandle) -> Result<Pixmap, DecodeError> {
        decode_handle(handle)
    }
}

/// Synchronous decode of a preview handle.
pub fn decode_handle(handle: &PreviewHandle) -> Result<Pixmap, DecodeError> {
    if handle.is_blank() {
        return Err(DecodeError("preview is empty".into()));
    }
    match parse_data_url(handle.as_str())? {
        Payload::Svg(bytes) => render_svg(&bytes),
        Payload::Png(bytes) => {
            Pixmap::decode_png(&bytes).map_err(|e| DecodeError(format!("PNG decode error: {e}")))
        }
    }
}

pub fn parse_data_url(url: &str) -> Result<Payload, DecodeError> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| DecodeError("not a data URL".into()))?;
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| DecodeError("data URL has no payload".into()))?;
    let mut params = meta.split(';');
    let mime = params.next().unwrap_or("").trim().to_ascii_lowercase();
    let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        STANDARD
            .decode(data.trim())
            .map_err(|e| DecodeError(format!("bad base64 payload: {e}")))?
    } else {
        percent_encoding::percent_decode_str(data).collect()
    };
    if bytes.is_empty() {
        return Err(DecodeError("data URL payload is empty".into()));
    }

    match mime.as_str() {
        "image/svg+xml" => Ok(Payload::Svg(bytes)),
        "image/png" => Ok(Payload::Png(bytes)),
        other => Err(DecodeError(format!("unsupported preview type {other:?}"))),
    }
}

fn render_svg(bytes: &[u8]) -> Result<Pixmap, DecodeError> {
    let opt = usvg::Options::default();
    let tree =
        usvg::Tree::from_data(bytes, &opt).map_err(|e| DecodeError(format!("SVG parse error: {e}")))?;
    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| DecodeError("pixmap alloc failed".into()))?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    debug!(width = size.width(), height = size.height(), "rasterized svg preview");
    Ok(pixmap)
}

// Straight-alpha RGBA -> PNG bytes (deterministic for same input)
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, png::EncodingError> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let mut buf = Vec::new();
    {
        let mut enc = Encoder::new(&mut buf, pixmap.width(), pixmap.height());
        enc.set_color(ColorType::Rgba);
        enc.set_depth(BitDepth::Eight);
        enc.set_filter(FilterType::NoFilter);
        enc.set_compression(Compression::Default);
        let mut writer = enc.write_header()?;
        writer.write_image_data(&rgba)?;
    }
    Ok(buf)
}

pub fn png_data_url(png: &[u8]) -> PreviewHandle {
    PreviewHandle::new(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}
