//! Ball sprite loading
//!
//! The sprite is fetched from the page's directory at startup and decoded to
//! RGBA8 on the CPU. When that fails the renderer draws a flat disk instead.

use crate::error::SpriteError;

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SpriteImage {
    pub fn decode_png(bytes: &[u8]) -> Result<Self, SpriteError> {
        let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(SpriteError::Empty);
        }
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }

    /// Single opaque texel, bound while no sprite is loaded
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        }
    }

    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Fetch and decode a PNG relative to the page
#[cfg(target_arch = "wasm32")]
pub async fn fetch(path: &str) -> Result<SpriteImage, SpriteError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let fail = |reason: String| SpriteError::Fetch {
        path: path.to_string(),
        reason,
    };

    let window = web_sys::window().ok_or_else(|| fail("no window".into()))?;
    let response = JsFuture::from(window.fetch_with_str(path))
        .await
        .map_err(|e| fail(format!("{e:?}")))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| fail("not a Response".into()))?;
    if !response.ok() {
        return Err(fail(format!("HTTP {}", response.status())));
    }

    let buffer = response
        .array_buffer()
        .map_err(|e| fail(format!("{e:?}")))?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|e| fail(format!("{e:?}")))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();

    SpriteImage::decode_png(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png() {
        let mut png = Vec::new();
        let image = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        image
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let sprite = SpriteImage::decode_png(&png).unwrap();
        assert_eq!((sprite.width, sprite.height), (4, 2));
        assert_eq!(sprite.rgba.len(), 4 * 2 * 4);
        assert_eq!(&sprite.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            SpriteImage::decode_png(b"definitely not a png"),
            Err(SpriteError::Decode(_))
        ));
    }
}
