//! Per-drawable shading parameters.

use std::sync::Arc;

use crate::backend::{BlendFactor, ProgramId};
use crate::error::{RenderError, Result};
use crate::texture::Texture2D;

/// Most textures a material may sample.
pub const MAX_TEXTURES: usize = 2;

/// Selects a drawable's program family and uniform set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShadingMode {
    /// Texture modulated by the diffuse color.
    Unlit,
    /// Flat diffuse color, no texture sampling.
    Colored,
    /// Texture lit by a directional colored light.
    Lit,
    /// Diffuse lighting with an ambient term.
    Lambert,
    /// Diffuse plus specular lighting.
    Phong,
    /// Five-tap blur of the first texture.
    Blur5,
    /// Nine-tap blur of the first texture.
    Blur9,
    /// A host-built program using the [`Colored`](Self::Colored) uniform
    /// layout, see [`Renderer::create_custom_program`].
    ///
    /// [`Renderer::create_custom_program`]: crate::Renderer::create_custom_program
    Custom(ProgramId),
}

impl ShadingMode {
    /// Number of built-in program families.
    pub const BUILT_IN: usize = 7;

    /// Built-in modes in program-collection order.
    pub const ORDER: [ShadingMode; Self::BUILT_IN] = [
        ShadingMode::Unlit,
        ShadingMode::Lambert,
        ShadingMode::Phong,
        ShadingMode::Lit,
        ShadingMode::Colored,
        ShadingMode::Blur5,
        ShadingMode::Blur9,
    ];

    /// Index of this mode's single-texture program in the blit collection.
    /// Custom programs borrow the colored slot's uniform table.
    #[must_use]
    pub fn program_base(self) -> usize {
        match self {
            Self::Unlit => 0,
            Self::Lambert => 1,
            Self::Phong => 2,
            Self::Lit => 3,
            Self::Colored | Self::Custom(_) => 4,
            Self::Blur5 => 5,
            Self::Blur9 => 6,
        }
    }

    /// Short lower-case name used in program names and shader defines.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Unlit => "unlit",
            Self::Colored => "colored",
            Self::Lit => "lit",
            Self::Lambert => "lambert",
            Self::Phong => "phong",
            Self::Blur5 => "blur5",
            Self::Blur9 => "blur9",
            Self::Custom(_) => "custom",
        }
    }

    /// Whether this is one of the blur modes.
    #[must_use]
    pub fn is_blur(self) -> bool {
        matches!(self, Self::Blur5 | Self::Blur9)
    }
}

/// Source and destination blend factors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlendMode {
    /// Source factor.
    pub src: BlendFactor,
    /// Destination factor.
    pub dst: BlendFactor,
}

impl BlendMode {
    /// Classic straight-alpha blending.
    pub const ALPHA: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };
    /// Blending for premultiplied colors.
    pub const PREMULTIPLIED: Self = Self {
        src: BlendFactor::One,
        dst: BlendFactor::OneMinusSrcAlpha,
    };
    /// Additive blending.
    pub const ADDITIVE: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::One,
    };
}

/// Inputs to the blur shader parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlurParams {
    /// Horizontal texel-step divisor.
    pub x_factor: f32,
    /// Vertical texel-step divisor.
    pub y_factor: f32,
    /// Weight of the center tap.
    pub weight: f32,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            x_factor: 1.0,
            y_factor: 1.0,
            weight: 0.4,
        }
    }
}

impl BlurParams {
    /// `[1 / (width * x_factor), 1 / (height * y_factor), weight]`.
    ///
    /// A zero extent yields a zero step rather than infinity.
    #[must_use]
    pub fn uniform(self, width: u32, height: u32) -> [f32; 3] {
        #[expect(clippy::cast_precision_loss)]
        let step = |extent: u32, factor: f32| {
            let denom = extent as f32 * factor;
            if denom == 0.0 {
                0.0
            } else {
                1.0 / denom
            }
        };
        [
            step(width, self.x_factor),
            step(height, self.y_factor),
            self.weight,
        ]
    }
}

/// Shading parameters shared by a drawable's draw calls.
#[derive(Debug, Clone)]
pub struct Material {
    /// Program family.
    pub shading: ShadingMode,
    textures: Vec<Arc<Texture2D>>,
    /// Diffuse RGBA.
    pub diffuse: [f32; 4],
    /// Ambient RGBA.
    pub ambient: [f32; 4],
    /// Specular RGBA.
    pub specular: [f32; 4],
    /// Specular exponent.
    pub power: f32,
    /// Blending, `None` draws opaque.
    pub blend: Option<BlendMode>,
    /// Blur parameters for the blur modes.
    pub blur: BlurParams,
}

impl Material {
    /// Create a material sampling one or two textures.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Argument`] if `textures` is empty or holds
    /// more than [`MAX_TEXTURES`].
    pub fn new(shading: ShadingMode, textures: Vec<Arc<Texture2D>>) -> Result<Self> {
        check_texture_count(textures.len())?;
        Ok(Self {
            shading,
            textures,
            diffuse: [1.0; 4],
            ambient: [0.2, 0.2, 0.2, 1.0],
            specular: [1.0; 4],
            power: 16.0,
            blend: None,
            blur: BlurParams::default(),
        })
    }

    /// Set the diffuse color.
    #[must_use]
    pub fn with_diffuse(mut self, diffuse: [f32; 4]) -> Self {
        self.diffuse = diffuse;
        self
    }

    /// Set the blend mode.
    #[must_use]
    pub fn with_blend(mut self, blend: Option<BlendMode>) -> Self {
        self.blend = blend;
        self
    }

    /// Textures in unit order.
    #[must_use]
    pub fn textures(&self) -> &[Arc<Texture2D>] {
        &self.textures
    }

    /// Replace the texture list.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Argument`] for an invalid texture count; the
    /// material is left unchanged.
    pub fn set_textures(&mut self, textures: Vec<Arc<Texture2D>>) -> Result<()> {
        check_texture_count(textures.len())?;
        self.textures = textures;
        Ok(())
    }

    /// Index into the blit program collection: the mode's base slot, offset
    /// into the parallel family for each extra texture.
    #[must_use]
    pub fn program_index(&self, program_count: usize) -> usize {
        let per_family = program_count / MAX_TEXTURES;
        self.shading.program_base() + (self.textures.len() - 1) * per_family
    }
}

fn check_texture_count(count: usize) -> Result<()> {
    if (1..=MAX_TEXTURES).contains(&count) {
        Ok(())
    } else {
        Err(RenderError::Argument(format!(
            "material needs 1..={MAX_TEXTURES} textures, got {count}"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::bitmap::{Bitmap, PixelSource};

    fn texture() -> Arc<Texture2D> {
        Arc::new(Texture2D::new(PixelSource::Decoded(Arc::new(
            Bitmap::solid(1, 1, [0; 4]),
        ))))
    }

    #[test]
    fn texture_count_is_validated() {
        assert!(Material::new(ShadingMode::Unlit, vec![]).is_err());
        assert!(Material::new(ShadingMode::Unlit, vec![texture()]).is_ok());
        assert!(Material::new(ShadingMode::Unlit, vec![texture(), texture()]).is_ok());
        let err = Material::new(ShadingMode::Unlit, vec![texture(); 3]).unwrap_err();
        assert!(matches!(err, RenderError::Argument(_)));
    }

    #[test]
    fn set_textures_keeps_old_list_on_error() {
        let mut material = Material::new(ShadingMode::Unlit, vec![texture()]).unwrap();
        assert!(material.set_textures(vec![]).is_err());
        assert_eq!(material.textures().len(), 1);
    }

    #[test]
    fn program_base_table() {
        let bases: Vec<usize> = ShadingMode::ORDER.iter().map(|m| m.program_base()).collect();
        assert_eq!(bases, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(ShadingMode::Custom(ProgramId(9)).program_base(), 4);
    }

    #[test]
    fn second_texture_selects_parallel_family() {
        let single = Material::new(ShadingMode::Phong, vec![texture()]).unwrap();
        let double = Material::new(ShadingMode::Phong, vec![texture(), texture()]).unwrap();
        assert_eq!(single.program_index(14), 2);
        assert_eq!(double.program_index(14), 9);
    }

    #[test]
    fn blur_uniform_inverts_scaled_extent() {
        let blur = BlurParams {
            x_factor: 2.0,
            y_factor: 0.5,
            weight: 0.3,
        };
        let [x, y, w] = blur.uniform(100, 40);
        assert!((x - 1.0 / 200.0).abs() < f32::EPSILON);
        assert!((y - 1.0 / 20.0).abs() < f32::EPSILON);
        assert!((w - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn blur_uniform_zero_extent_is_zero_step() {
        let [x, y, _] = BlurParams::default().uniform(0, 0);
        assert!(x.abs() < f32::EPSILON && y.abs() < f32::EPSILON);
    }
}
