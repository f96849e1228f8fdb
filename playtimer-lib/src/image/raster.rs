//! PNG conversion of cached rings for consumers that cannot show SVG.

use std::path::Path;

use resvg::{tiny_skia, usvg};

use super::error::ImageError;
use super::svg::WIDTH;

/// Side of the square the ring is cropped to.
pub(crate) const CROP_SIZE: u32 = 96;

/// Decode `path`, draw it on a `WIDTH`-sized square canvas, crop the center
/// `CROP_SIZE` square and mirror it horizontally.
pub(crate) fn render_png(path: &Path) -> Result<Vec<u8>, ImageError> {
    let data = std::fs::read(path)
        .map_err(|err| ImageError::Rasterization(format!("read {}: {}", path.display(), err)))?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .map_err(|err| ImageError::Rasterization(format!("parse {}: {}", path.display(), err)))?;

    let mut canvas = tiny_skia::Pixmap::new(WIDTH, WIDTH)
        .ok_or_else(|| ImageError::Rasterization("allocate canvas".to_string()))?;
    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        WIDTH as f32 / size.width(),
        WIDTH as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut canvas.as_mut());

    let mirrored = crop_and_mirror(&canvas, CROP_SIZE)?;
    mirrored
        .encode_png()
        .map_err(|err| ImageError::Rasterization(format!("encode png: {}", err)))
}

fn crop_and_mirror(
    canvas: &tiny_skia::Pixmap,
    size: u32,
) -> Result<tiny_skia::Pixmap, ImageError> {
    let mut out = tiny_skia::Pixmap::new(size, size)
        .ok_or_else(|| ImageError::Rasterization("allocate crop".to_string()))?;

    let width = canvas.width() as usize;
    let size = size as usize;
    let offset = (width - size) / 2;
    let src = canvas.pixels();
    let dst = out.pixels_mut();
    for y in 0..size {
        for x in 0..size {
            dst[y * size + (size - x - 1)] = src[(y + offset) * width + x + offset];
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_cropped_and_mirrored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("half.svg");
        std::fs::write(
            &path,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="128" height="128">
  <rect x="0" y="0" width="64" height="128" fill="#ff0000" />
</svg>"##,
        )
        .expect("write svg");

        let png = render_png(&path).expect("rasterize");
        let pixmap = tiny_skia::Pixmap::decode_png(&png).expect("decode png");
        assert_eq!(pixmap.width(), CROP_SIZE);
        assert_eq!(pixmap.height(), CROP_SIZE);

        let at = |x: u32, y: u32| pixmap.pixel(x, y).expect("pixel");
        assert_eq!(at(10, 48).alpha(), 0);
        let right = at(85, 48);
        assert_eq!(right.alpha(), 255);
        assert_eq!(right.red(), 255);
    }

    #[test]
    fn invalid_svg_is_a_rasterization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.svg");
        std::fs::write(&path, "this is not svg").expect("write");

        assert!(matches!(
            render_png(&path),
            Err(ImageError::Rasterization(_))
        ));
    }
}
