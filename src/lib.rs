//! A real-time GL renderer core for textured blit quads and particle batches.
//!
//! This crate provides [`Renderer`], which draws [`BlitObject`]s and
//! [`ParticleArray`]s through four narrow handler traits. A platform adapter
//! implements the traits (or uses the bundled [glow] implementations) and
//! injects them at construction; the renderer itself never touches a GL
//! binding directly.
//!
//! # Features
//!
//! - **State diffing**: global [`RenderSetting`] changes are coalesced into
//!   at most one backend update per frame; program, blend and texture
//!   parameter changes are only issued when they differ from what is bound.
//! - **Program cache**: every shading mode is compiled for one and two
//!   textures at startup, with uniform locations resolved once. A missing
//!   uniform fails startup.
//! - **Lazy texture upload**: textures are decoded and uploaded when
//!   prepared, or on first draw with a warning.
//! - **Client or VBO geometry**: blit meshes upload once; particle buffers
//!   are re-uploaded every frame.
//! - **Profiling**: per-frame vertex, index and draw-call counters in
//!   [`ProfileInfo`].
//! - **Remote control**: a [`RendererControl`] lets other threads request a
//!   destroy or edit the [`RenderSetting`]; requests land at the next frame.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
//! # fn example(gl: std::sync::Arc<glow::Context>) -> glblit::Result<()> {
//! use glblit::{Platform, Renderer, RendererConfig};
//!
//! let handlers = unsafe { glblit::glow_handlers(gl, Platform::Desktop) }?;
//! let mut renderer = Renderer::new(RendererConfig::default(), handlers);
//! renderer.init_renderer()?;
//! renderer.start_renderer()?;
//! renderer.set_viewport(0, 0, 800, 600);
//! renderer.set_orthogonal_projection();
//!
//! renderer.begin_frame()?;
//! renderer.render_blit_objects(&mut [])?;
//! renderer.end_frame()?;
//! # Ok(())
//! # }
//! ```
//!
//! [glow]: https://docs.rs/glow

mod backend;
mod bitmap;
mod config;
mod control;
mod error;
#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
mod glow_backend;
mod logging;
mod material;
mod mesh;
#[cfg(test)]
mod mock;
mod profile;
mod program;
mod render;
mod setting;
mod shaders;
mod texture;

pub use backend::{
    BackendInfo, BitmapHandler, BlendFactor, BufferId, BufferTarget, BufferUsage, Capability,
    CullFace, DepthFunc, DrawMode, FramebufferId, GraphicsHandler, Handlers, PixelFormat,
    ProgramHandler, ProgramId, RenderbufferId, ShaderId, ShaderStage, TexFilter, TexParameter,
    TexWrap, TextureHandler, TextureId, TextureTarget, UniformLocation, VertexAttribute,
    VertexLayout,
};
pub use bitmap::{Bitmap, ImageBitmaps, PixelSource};
pub use config::{Platform, RendererConfig};
pub use control::RendererControl;
pub use error::{RenderError, ResourceError, Result};
#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use glow_backend::{glow_handlers, GlowGraphics, GlowPrograms, GlowTextures};
pub use logging::{init_logging, LoggingConfig};
pub use material::{BlendMode, BlurParams, Material, ShadingMode, MAX_TEXTURES};
pub use mesh::{BlitObject, BlitVertex, Mesh, ParticleArray, ParticleType, ParticleVertex, Storage};
pub use profile::{FrameCounters, ProfileInfo};
pub use program::{LinkedProgram, ProgramCollection, ProgramDescriptor, Uniform, UniformTable};
pub use render::{swizzle_pixel, Light, RenderTarget, Renderer, RendererState, Viewport};
pub use setting::{ChangeFlags, ClearFlags, RenderSetting};
pub use texture::{TexParams, Texture2D};
