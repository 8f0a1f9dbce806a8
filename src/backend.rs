//! The narrow handler interfaces the renderer drives.
//!
//! A platform adapter constructs one implementation of each trait and hands
//! them to [`Renderer::new`](crate::Renderer::new) bundled as [`Handlers`].
//! Per-frame calls return nothing; the renderer only probes
//! [`GraphicsHandler::get_error`] at coarse checkpoints.

use crate::error::ResourceError;
use crate::setting::{ChangeFlags, ClearFlags, RenderSetting};

macro_rules! gl_handle {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
            pub struct $name(pub u32);
        )*
    };
}

gl_handle! {
    /// A linked shader program.
    ProgramId;
    /// A compiled shader stage.
    ShaderId;
    /// A texture object.
    TextureId;
    /// A vertex or index buffer object.
    BufferId;
    /// A framebuffer object.
    FramebufferId;
    /// A renderbuffer object.
    RenderbufferId;
    /// A resolved uniform location within one program.
    UniformLocation;
}

/// Toggleable pipeline capabilities.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Capability {
    /// Color blending.
    Blend,
    /// Depth testing.
    DepthTest,
    /// Face culling.
    CullFace,
    /// Multisample rasterization (desktop only).
    Multisample,
}

/// Blend factors for `glBlendFunc`.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Depth comparison functions.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Which faces get culled.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CullFace {
    Front,
    Back,
    FrontAndBack,
}

/// Primitive assembly mode.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawMode {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Buffer binding points.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
}

/// Upload frequency hint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times.
    Static,
    /// Re-uploaded often.
    Dynamic,
    /// Uploaded every draw.
    Stream,
}

/// Texture binding targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextureTarget {
    /// `GL_TEXTURE_2D`.
    #[default]
    Texture2D,
    /// `GL_TEXTURE_RECTANGLE`, desktop only.
    Rectangle,
}

/// Texture minification and magnification filters.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TexFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

/// Texture coordinate wrapping.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TexWrap {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

/// One `glTexParameteri` call.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TexParameter {
    MagFilter(TexFilter),
    MinFilter(TexFilter),
    WrapS(TexWrap),
    WrapT(TexWrap),
}

/// Channel layout requested from [`GraphicsHandler::read_pixels`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// Red, green, blue, alpha bytes.
    #[default]
    Rgba,
    /// Blue, green, red, alpha bytes (desktop only).
    Bgra,
}

/// Shader pipeline stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

impl ShaderStage {
    /// Lower-case stage name for diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

/// A float vertex attribute within an interleaved vertex.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute index bound before linking.
    pub index: u32,
    /// Component count.
    pub size: i32,
    /// Byte offset within the vertex.
    pub offset: i32,
}

/// Interleaved vertex layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Size of one vertex in bytes.
    pub stride: i32,
    /// Attributes in index order.
    pub attributes: &'static [VertexAttribute],
}

/// Capability report queried once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendInfo {
    /// `GL_VENDOR`.
    pub vendor: String,
    /// `GL_RENDERER`.
    pub renderer: String,
    /// `GL_VERSION`.
    pub version: String,
    /// `GL_SHADING_LANGUAGE_VERSION`.
    pub shading_language_version: String,
    /// Number of combined texture image units.
    pub max_texture_units: i32,
    /// Largest supported texture dimension.
    pub max_texture_size: i32,
}

/// Global pipeline state, buffers and draw calls.
pub trait GraphicsHandler {
    /// Enable a capability.
    fn enable(&mut self, capability: Capability);
    /// Disable a capability.
    fn disable(&mut self, capability: Capability);
    /// Set the blend function.
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    /// Push every setting group flagged in `changed` in one update.
    fn apply_render_setting(&mut self, setting: &RenderSetting, changed: ChangeFlags);
    /// Clear the selected buffers of the bound framebuffer.
    fn clear(&mut self, flags: ClearFlags);
    /// Set the viewport rectangle.
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    /// Pop one pending error code, if any.
    fn get_error(&mut self) -> Option<u32>;
    /// Query vendor strings and limits.
    fn info(&mut self) -> BackendInfo;
    /// Read a block of pixels into `out` (4 bytes per pixel).
    fn read_pixels(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: PixelFormat,
        out: &mut [u8],
    );

    /// Create a buffer object.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Allocation`] if the backend refuses.
    fn create_buffer(&mut self) -> Result<BufferId, ResourceError>;
    /// Delete a buffer object.
    fn delete_buffer(&mut self, buffer: BufferId);
    /// Bind (or unbind) a buffer.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);
    /// Replace the contents of the buffer bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    /// Point the layout's attributes at the bound array buffer.
    fn set_vertex_layout(&mut self, layout: &VertexLayout);
    /// Draw `count` `u16` indices from the bound element buffer.
    fn draw_elements(&mut self, mode: DrawMode, count: usize);
    /// Draw `count` vertices from the bound array buffer.
    fn draw_arrays(&mut self, mode: DrawMode, first: usize, count: usize);
    /// Draw indexed geometry straight from client memory.
    fn draw_client_elements(
        &mut self,
        mode: DrawMode,
        layout: &VertexLayout,
        vertices: &[u8],
        indices: &[u16],
    );
    /// Draw non-indexed geometry straight from client memory.
    fn draw_client_arrays(&mut self, mode: DrawMode, layout: &VertexLayout, vertices: &[u8]);
}

/// Texture, framebuffer and renderbuffer primitives.
pub trait TextureHandler {
    /// Create a texture object.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Allocation`] if the backend refuses.
    fn create_texture(&mut self) -> Result<TextureId, ResourceError>;
    /// Delete a texture object.
    fn delete_texture(&mut self, texture: TextureId);
    /// Select the active texture unit.
    fn active_texture(&mut self, unit: u32);
    /// Bind a texture to the active unit.
    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureId>);
    /// Upload RGBA8 pixels (or allocate storage when `pixels` is `None`).
    fn tex_image_2d(&mut self, target: TextureTarget, width: u32, height: u32, pixels: Option<&[u8]>);
    /// Set one parameter on the bound texture.
    fn tex_parameter(&mut self, target: TextureTarget, parameter: TexParameter);

    /// Create a framebuffer object.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Allocation`] if the backend refuses.
    fn create_framebuffer(&mut self) -> Result<FramebufferId, ResourceError>;
    /// Delete a framebuffer object.
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);
    /// Bind a framebuffer, `None` for the default one.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    /// Attach a 2D texture as color attachment 0 of the bound framebuffer.
    fn framebuffer_texture_2d(&mut self, texture: TextureId);
    /// Create a renderbuffer object.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Allocation`] if the backend refuses.
    fn create_renderbuffer(&mut self) -> Result<RenderbufferId, ResourceError>;
    /// Delete a renderbuffer object.
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId);
    /// Bind a renderbuffer.
    fn bind_renderbuffer(&mut self, renderbuffer: Option<RenderbufferId>);
    /// Allocate 16-bit depth storage for the bound renderbuffer.
    fn renderbuffer_storage(&mut self, width: u32, height: u32);
    /// Attach a renderbuffer as the depth attachment of the bound framebuffer.
    fn framebuffer_renderbuffer(&mut self, renderbuffer: RenderbufferId);
    /// Check completeness of the bound framebuffer.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::IncompleteFramebuffer`] with the status code.
    fn check_framebuffer_status(&mut self) -> Result<(), ResourceError>;
}

/// Shader compilation, linking and uniform primitives.
pub trait ProgramHandler {
    /// Compile one stage. The error is the driver info log.
    ///
    /// # Errors
    ///
    /// Returns the info log when compilation fails.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String>;
    /// Link two stages, binding each `(index, name)` attribute first.
    ///
    /// # Errors
    ///
    /// Returns the info log when linking fails.
    fn link_program(
        &mut self,
        vertex: ShaderId,
        fragment: ShaderId,
        attributes: &[(u32, &str)],
    ) -> Result<ProgramId, String>;
    /// Delete a shader stage.
    fn delete_shader(&mut self, shader: ShaderId);
    /// Delete a program.
    fn delete_program(&mut self, program: ProgramId);
    /// Look up an active uniform.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    /// Make a program current.
    fn use_program(&mut self, program: Option<ProgramId>);
    /// Set an `int` or sampler uniform.
    fn uniform_1i(&mut self, location: UniformLocation, value: i32);
    /// Set a `float` uniform.
    fn uniform_1f(&mut self, location: UniformLocation, value: f32);
    /// Set a `vec2` uniform.
    fn uniform_2f(&mut self, location: UniformLocation, value: [f32; 2]);
    /// Set a `vec3` uniform.
    fn uniform_3f(&mut self, location: UniformLocation, value: [f32; 3]);
    /// Set a `vec4` uniform.
    fn uniform_4f(&mut self, location: UniformLocation, value: [f32; 4]);
    /// Set a column-major `mat4` uniform.
    fn uniform_matrix4(&mut self, location: UniformLocation, value: &[f32; 16]);
}

/// Decodes encoded pixel sources into RGBA8 bitmaps.
pub trait BitmapHandler {
    /// Decode an encoded image.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Bitmap`] for unreadable data.
    fn decode(&mut self, encoded: &[u8]) -> Result<crate::bitmap::Bitmap, ResourceError>;
}

/// The four handlers a platform adapter injects into the renderer.
pub struct Handlers {
    /// Pipeline state, buffers and draws.
    pub graphics: Box<dyn GraphicsHandler>,
    /// Textures and framebuffers.
    pub textures: Box<dyn TextureHandler>,
    /// Shader programs and uniforms.
    pub programs: Box<dyn ProgramHandler>,
    /// Pixel-source decoding.
    pub bitmaps: Box<dyn BitmapHandler>,
}

impl Handlers {
    /// Bundle four handler implementations.
    pub fn new(
        graphics: impl GraphicsHandler + 'static,
        textures: impl TextureHandler + 'static,
        programs: impl ProgramHandler + 'static,
        bitmaps: impl BitmapHandler + 'static,
    ) -> Self {
        Self {
            graphics: Box::new(graphics),
            textures: Box::new(textures),
            programs: Box::new(programs),
            bitmaps: Box::new(bitmaps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        assert_eq!(ShaderStage::Vertex.name(), "vertex");
        assert_eq!(ShaderStage::Fragment.name(), "fragment");
    }

    #[test]
    fn handles_compare_by_value() {
        assert_eq!(ProgramId(3), ProgramId(3));
        assert_ne!(TextureId(1), TextureId(2));
    }
}
