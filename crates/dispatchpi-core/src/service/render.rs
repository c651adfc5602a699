//! Display rendering seam.

use crate::Result;

/// Turns a downloaded image and its caption into what the frame displays.
pub trait Renderer {
    /// Renders `image` with `caption` into device-ready bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Render` if the image cannot be rendered.
    fn render(&self, image: &[u8], caption: &str) -> Result<Vec<u8>>;
}

/// Passes the downloaded image through unchanged.
///
/// The caption is not drawn onto the image. `dispatchpi display` prints it
/// next to the written file, and the frame does its own scaling and captioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRenderer;

impl Renderer for RawRenderer {
    fn render(&self, image: &[u8], _caption: &str) -> Result<Vec<u8>> {
        if image.is_empty() {
            return Err(crate::Error::Render("empty image".to_string()));
        }
        Ok(image.to_vec())
    }
}
