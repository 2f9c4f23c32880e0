//! Tile preview decoding.

pub const TILE_PREVIEW_MAX_DIMENSION: u32 = 160;

#[derive(Clone, Debug)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

/// Decodes a `preview.png` body into a tile-sized RGBA thumbnail. The format
/// is sniffed from the bytes, not taken from the route.
pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    if bytes.is_empty() {
        return Err("empty preview body".to_string());
    }
    let format = image::guess_format(bytes)
        .map_err(|_| format!("unrecognised preview format ({} bytes)", bytes.len()))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| format!("{format:?} preview: {err}"))?;
    // Previews already within the tile are never upscaled.
    let thumbnail = if decoded.width() > TILE_PREVIEW_MAX_DIMENSION
        || decoded.height() > TILE_PREVIEW_MAX_DIMENSION
    {
        decoded
            .thumbnail(TILE_PREVIEW_MAX_DIMENSION, TILE_PREVIEW_MAX_DIMENSION)
            .into_rgba8()
    } else {
        decoded.into_rgba8()
    };
    let (width, height) = thumbnail.dimensions();
    Ok(PreviewImage {
        width: width as usize,
        height: height as usize,
        rgba: thumbnail.into_raw(),
    })
}
