//! GPU textures with lazy upload and cached parameter state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::backend::{
    BitmapHandler, TexFilter, TexParameter, TexWrap, TextureHandler, TextureId, TextureTarget,
};
use crate::bitmap::PixelSource;
use crate::error::ResourceError;

/// The four sampling parameters of a texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TexParams {
    /// Magnification filter.
    pub mag: TexFilter,
    /// Minification filter.
    pub min: TexFilter,
    /// Horizontal wrapping.
    pub wrap_s: TexWrap,
    /// Vertical wrapping.
    pub wrap_t: TexWrap,
}

impl Default for TexParams {
    fn default() -> Self {
        Self {
            mag: TexFilter::Linear,
            min: TexFilter::Linear,
            wrap_s: TexWrap::ClampToEdge,
            wrap_t: TexWrap::ClampToEdge,
        }
    }
}

impl TexParams {
    /// Parameter calls in application order: mag, min, wrap S, wrap T.
    #[must_use]
    pub fn calls(self) -> [TexParameter; 4] {
        [
            TexParameter::MagFilter(self.mag),
            TexParameter::MinFilter(self.min),
            TexParameter::WrapS(self.wrap_s),
            TexParameter::WrapT(self.wrap_t),
        ]
    }
}

#[derive(Debug)]
struct TextureState {
    handle: Option<TextureId>,
    width: u32,
    height: u32,
    unit: u32,
    params: TexParams,
    /// Parameters last sent to the backend; `None` forces a full apply.
    applied: Option<TexParams>,
}

/// A 2D texture created from a CPU pixel source.
///
/// The texture becomes GPU-resident when prepared (eagerly through
/// [`Renderer::prepare_texture`](crate::Renderer::prepare_texture), or lazily
/// on first draw) and is reused across frames. Share it between materials by
/// wrapping it in an [`Arc`](std::sync::Arc).
#[derive(Debug)]
pub struct Texture2D {
    source: PixelSource,
    target: TextureTarget,
    state: Mutex<TextureState>,
}

impl Texture2D {
    /// Create an unprepared `GL_TEXTURE_2D` texture.
    #[must_use]
    pub fn new(source: PixelSource) -> Self {
        Self::with_target(source, TextureTarget::Texture2D)
    }

    /// Create an unprepared texture bound to `target`.
    #[must_use]
    pub fn with_target(source: PixelSource, target: TextureTarget) -> Self {
        let (width, height) = match &source {
            PixelSource::Decoded(bitmap) => (bitmap.width, bitmap.height),
            PixelSource::Encoded(_) => (0, 0),
        };
        Self {
            source,
            target,
            state: Mutex::new(TextureState {
                handle: None,
                width,
                height,
                unit: 0,
                params: TexParams::default(),
                applied: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, TextureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binding target.
    #[must_use]
    pub fn target(&self) -> TextureTarget {
        self.target
    }

    /// Backend handle, `None` until prepared.
    #[must_use]
    pub fn handle(&self) -> Option<TextureId> {
        self.state().handle
    }

    /// Whether the texture is GPU-resident.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.handle().is_some()
    }

    /// Size in pixels. Encoded sources report `(0, 0)` until prepared.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        let state = self.state();
        (state.width, state.height)
    }

    /// Texture unit this texture was last bound to.
    #[must_use]
    pub fn texture_unit(&self) -> u32 {
        self.state().unit
    }

    /// Requested sampling parameters.
    #[must_use]
    pub fn params(&self) -> TexParams {
        self.state().params
    }

    /// Request new sampling parameters; applied on the next bind.
    pub fn set_params(&self, params: TexParams) {
        self.state().params = params;
    }

    /// Forget the backend handle and parameter cache, e.g. after the GL
    /// context was lost. Deleting the old object is the caller's concern.
    pub fn invalidate(&self) {
        let mut state = self.state();
        state.handle = None;
        state.applied = None;
    }

    /// Decode the source if needed and upload it.
    ///
    /// Leaves the new texture bound to the active unit. A prepared texture
    /// is returned as-is.
    pub(crate) fn prepare(
        &self,
        textures: &mut dyn TextureHandler,
        bitmaps: &mut dyn BitmapHandler,
    ) -> Result<TextureId, ResourceError> {
        if let Some(handle) = self.handle() {
            return Ok(handle);
        }

        let decoded;
        let bitmap = match &self.source {
            PixelSource::Decoded(bitmap) => bitmap.as_ref(),
            PixelSource::Encoded(bytes) => {
                decoded = bitmaps.decode(bytes)?;
                &decoded
            }
        };

        let handle = textures.create_texture()?;
        textures.bind_texture(self.target, Some(handle));
        textures.tex_image_2d(
            self.target,
            bitmap.width,
            bitmap.height,
            Some(&bitmap.pixels),
        );

        let mut state = self.state();
        state.handle = Some(handle);
        state.width = bitmap.width;
        state.height = bitmap.height;
        state.applied = None;
        Ok(handle)
    }

    /// Activate `unit`, bind the texture to it and push the sampling
    /// parameters if any differs from what was last applied.
    pub(crate) fn bind_to(
        &self,
        unit: u32,
        textures: &mut dyn TextureHandler,
    ) -> Result<(), ResourceError> {
        let mut state = self.state();
        let handle = state
            .handle
            .ok_or_else(|| ResourceError::TexturePreparation {
                reason: "texture bound before preparation".into(),
            })?;

        textures.active_texture(unit);
        textures.bind_texture(self.target, Some(handle));
        state.unit = unit;

        if state.applied != Some(state.params) {
            for call in state.params.calls() {
                textures.tex_parameter(self.target, call);
            }
            state.applied = Some(state.params);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bitmap::{Bitmap, ImageBitmaps};
    use crate::mock::{Call, Recorder};

    fn decoded(width: u32, height: u32) -> Texture2D {
        Texture2D::new(PixelSource::Decoded(Arc::new(Bitmap::solid(
            width,
            height,
            [255, 0, 0, 255],
        ))))
    }

    #[test]
    fn decoded_source_reports_size_before_preparation() {
        let texture = decoded(4, 8);
        assert_eq!(texture.size(), (4, 8));
        assert!(!texture.is_prepared());
    }

    #[test]
    fn prepare_uploads_once() {
        let recorder = Recorder::default();
        let mut textures = recorder.textures();
        let texture = decoded(2, 2);

        let first = texture.prepare(&mut textures, &mut ImageBitmaps).unwrap();
        let second = texture.prepare(&mut textures, &mut ImageBitmaps).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            recorder.count(|c| matches!(c, Call::TexImage2D { .. })),
            1
        );
    }

    #[test]
    fn encoded_source_is_decoded_through_the_handler() {
        let recorder = Recorder::default();
        let mut textures = recorder.textures();
        let mut bitmaps = recorder.bitmaps();
        let texture = Texture2D::new(PixelSource::Encoded(Arc::from(&b"3x5"[..])));

        texture.prepare(&mut textures, &mut bitmaps).unwrap();
        assert_eq!(texture.size(), (3, 5));
    }

    #[test]
    fn bind_applies_params_only_when_changed() {
        let recorder = Recorder::default();
        let mut textures = recorder.textures();
        let texture = decoded(2, 2);
        texture.prepare(&mut textures, &mut ImageBitmaps).unwrap();

        texture.bind_to(0, &mut textures).unwrap();
        let is_param = |c: &Call| matches!(c, Call::TexParameter(_));
        assert_eq!(recorder.count(is_param), 4);

        texture.bind_to(0, &mut textures).unwrap();
        assert_eq!(recorder.count(is_param), 4);

        texture.set_params(TexParams {
            wrap_t: TexWrap::Repeat,
            ..TexParams::default()
        });
        texture.bind_to(1, &mut textures).unwrap();
        assert_eq!(recorder.count(is_param), 8);
        assert_eq!(texture.texture_unit(), 1);
    }

    #[test]
    fn bind_before_prepare_fails() {
        let recorder = Recorder::default();
        let texture = decoded(1, 1);
        let err = texture.bind_to(0, &mut recorder.textures()).unwrap_err();
        assert!(matches!(err, ResourceError::TexturePreparation { .. }));
    }

    #[test]
    fn invalidate_forces_reupload_and_reapply() {
        let recorder = Recorder::default();
        let mut textures = recorder.textures();
        let texture = decoded(1, 1);
        texture.prepare(&mut textures, &mut ImageBitmaps).unwrap();
        texture.bind_to(0, &mut textures).unwrap();

        texture.invalidate();
        assert!(!texture.is_prepared());
        texture.prepare(&mut textures, &mut ImageBitmaps).unwrap();
        texture.bind_to(0, &mut textures).unwrap();
        assert_eq!(recorder.count(|c| matches!(c, Call::TexParameter(_))), 8);
    }

    #[test]
    fn param_calls_are_ordered() {
        let calls = TexParams::default().calls();
        assert!(matches!(calls[0], TexParameter::MagFilter(_)));
        assert!(matches!(calls[1], TexParameter::MinFilter(_)));
        assert!(matches!(calls[2], TexParameter::WrapS(_)));
        assert!(matches!(calls[3], TexParameter::WrapT(_)));
    }
}
