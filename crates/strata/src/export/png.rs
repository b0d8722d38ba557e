//! PNG rasterisation of rendered SVG documents.

use std::path::Path;

use log::{debug, info};
use resvg::{
    tiny_skia::{Pixmap, Transform},
    usvg,
};

use super::ExportError;

/// Rasterises an SVG document at `scale` times its natural size.
///
/// System fonts are loaded, plus any fonts in a local `fonts/` directory.
///
/// # Errors
///
/// Returns [`ExportError::InvalidScale`] for a non-positive or non-finite
/// scale, and the matching variant when parsing, allocation or encoding
/// fails.
pub fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>, ExportError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ExportError::InvalidScale(scale));
    }

    let mut options = usvg::Options::default();
    {
        let fontdb = options.fontdb_mut();
        fontdb.load_system_fonts();

        let local_fonts = Path::new("fonts");
        if local_fonts.is_dir() {
            fontdb.load_fonts_dir(local_fonts);
        }

        configure_font_fallbacks(fontdb);
    }

    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|err| ExportError::SvgParse(err.to_string()))?;

    let width = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;
    debug!(width, height, scale; "Rasterising SVG");

    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Pixmap { width, height })?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    let png = pixmap
        .encode_png()
        .map_err(|err| ExportError::PngEncode(err.to_string()))?;
    info!(bytes = png.len(); "PNG encoded");
    Ok(png)
}

/// Points the generic font families at installed faces so text renders even
/// when the requested family is missing.
fn configure_font_fallbacks(fontdb: &mut usvg::fontdb::Database) {
    let mut sans_family: Option<String> = None;
    let mut mono_family: Option<String> = None;
    let mut first_family: Option<String> = None;

    for face in fontdb.faces() {
        for (family, _) in &face.families {
            if first_family.is_none() {
                first_family = Some(family.clone());
            }

            let lower = family.to_ascii_lowercase();
            if sans_family.is_none() && lower.contains("sans") && !lower.contains("mono") {
                sans_family = Some(family.clone());
            }
            if mono_family.is_none() && lower.contains("mono") {
                mono_family = Some(family.clone());
            }
        }
    }

    if let Some(family) = sans_family.as_deref().or(first_family.as_deref()) {
        fontdb.set_sans_serif_family(family);
    }
    if let Some(family) = mono_family
        .as_deref()
        .or(sans_family.as_deref())
        .or(first_family.as_deref())
    {
        fontdb.set_monospace_family(family);
    }
}
