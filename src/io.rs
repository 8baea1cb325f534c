use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a picked image file as (file name, raw bytes).
pub fn read_image(path: &Path) -> Result<(String, Vec<u8>)> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("image.jpg")
        .to_string();
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok((file_name, bytes))
}

/// Decode raw image bytes into a texture-ready `ColorImage`.
pub fn decode_color_image(bytes: &[u8]) -> Result<egui::ColorImage> {
    let image = image::load_from_memory(bytes).context("decode image")?;
    let size = [image.width() as usize, image.height() as usize];
    let pixels = image.to_rgba8().into_raw();
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, &pixels))
}
