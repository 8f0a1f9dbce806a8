//! The renderer: lifecycle, per-frame state diffing and draw dispatch.
//!
//! A [`Renderer`] is driven from one render-loop thread:
//!
//! ```text
//! new -> init_renderer -> start_renderer -> (begin_frame -> render_* -> end_frame)* -> destroy
//! ```
//!
//! Every lifecycle and frame call checks the current [`RendererState`] and
//! fails with [`RenderError::State`] when called out of order.

use std::collections::HashMap;
use std::time::Instant;

use glam::{EulerRot, Mat4, Quat, Vec3};
use log::{info, warn};

use crate::backend::{
    BackendInfo, BitmapHandler, BufferTarget, BufferUsage, Capability, DrawMode, FramebufferId, GraphicsHandler,
    Handlers, PixelFormat, ProgramHandler, ProgramId, RenderbufferId, TextureHandler, TextureId,
    TextureTarget,
};
use crate::config::RendererConfig;
use crate::control::RendererControl;
use crate::error::{RenderError, ResourceError, Result};
use crate::material::{BlendMode, Material, ShadingMode};
use crate::mesh::{BlitObject, BlitVertex, Mesh, ParticleArray, ParticleType, ParticleVertex, Storage};
use crate::profile::{FrameCounters, ProfileInfo};
use crate::program::{build_program, ProgramCollection, ProgramDescriptor, Uniform, UniformTable};
use crate::setting::{ChangeFlags, RenderSetting};
use crate::shaders;
use crate::texture::{TexParams, Texture2D};

/// Lifecycle state of a [`Renderer`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RendererState {
    /// Constructed or destroyed; no programs exist.
    Created,
    /// Program collections are described but not linked.
    Initialized,
    /// Programs are linked; frames may be rendered.
    Started,
}

/// Scene light fed to the lit shading modes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    /// Direction the light travels in.
    pub direction: [f32; 3],
    /// World position, for the lambert and phong modes.
    pub position: [f32; 3],
    /// RGBA color, for the lit mode.
    pub color: [f32; 4],
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: [0.0, 0.0, -1.0],
            position: [0.0, 0.0, 10.0],
            color: [1.0; 4],
        }
    }
}

/// The area of the target surface being drawn to.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// An off-screen color texture with a depth buffer.
///
/// Created by [`Renderer::create_render_target`]; the host owns it and must
/// hand it back to [`Renderer::delete_render_target`].
#[derive(Debug)]
pub struct RenderTarget {
    framebuffer: FramebufferId,
    texture: TextureId,
    depth: RenderbufferId,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Color attachment, sampleable once the target is unbound.
    #[must_use]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// What the backend currently has bound, so redundant calls can be skipped.
#[derive(Debug, Default)]
struct Bound {
    program: Option<ProgramId>,
    blend_enabled: bool,
    blend: Option<BlendMode>,
}

impl Bound {
    fn apply_blend(&mut self, graphics: &mut dyn GraphicsHandler, blend: Option<BlendMode>) {
        match blend {
            None => {
                if self.blend_enabled {
                    graphics.disable(Capability::Blend);
                    self.blend_enabled = false;
                }
            }
            Some(mode) => {
                if !self.blend_enabled {
                    graphics.enable(Capability::Blend);
                    self.blend_enabled = true;
                }
                if self.blend != Some(mode) {
                    graphics.blend_func(mode.src, mode.dst);
                    self.blend = Some(mode);
                }
            }
        }
    }

    /// Returns whether the program changed.
    fn use_program(&mut self, programs: &mut dyn ProgramHandler, program: ProgramId) -> bool {
        if self.program == Some(program) {
            return false;
        }
        programs.use_program(Some(program));
        self.program = Some(program);
        true
    }
}

/// Uniform uploads against one program's table. Uniforms the program does
/// not declare are skipped.
struct Uniforms<'a> {
    programs: &'a mut dyn ProgramHandler,
    table: &'a UniformTable,
}

impl Uniforms<'_> {
    fn int(&mut self, uniform: Uniform, value: i32) {
        if let Some(location) = self.table.get(uniform) {
            self.programs.uniform_1i(location, value);
        }
    }

    fn float(&mut self, uniform: Uniform, value: f32) {
        if let Some(location) = self.table.get(uniform) {
            self.programs.uniform_1f(location, value);
        }
    }

    fn vec2(&mut self, uniform: Uniform, value: [f32; 2]) {
        if let Some(location) = self.table.get(uniform) {
            self.programs.uniform_2f(location, value);
        }
    }

    fn vec3(&mut self, uniform: Uniform, value: [f32; 3]) {
        if let Some(location) = self.table.get(uniform) {
            self.programs.uniform_3f(location, value);
        }
    }

    fn vec4(&mut self, uniform: Uniform, value: [f32; 4]) {
        if let Some(location) = self.table.get(uniform) {
            self.programs.uniform_4f(location, value);
        }
    }

    fn mat4(&mut self, uniform: Uniform, value: &[f32; 16]) {
        if let Some(location) = self.table.get(uniform) {
            self.programs.uniform_matrix4(location, value);
        }
    }

    fn light(&mut self, light: &Light) {
        self.vec3(Uniform::LightDirection, light.direction);
        self.vec3(Uniform::LightPosition, light.position);
        self.vec4(Uniform::LightColor, light.color);
    }

    fn samplers(&mut self) {
        self.int(Uniform::Texture0, 0);
        self.int(Uniform::Texture1, 1);
    }
}

/// Bind each texture of `material` to the unit matching its position.
fn bind_material_textures(textures: &mut dyn TextureHandler, material: &Material) -> Result<()> {
    for (unit, texture) in (0u32..).zip(material.textures()) {
        texture.bind_to(unit, textures)?;
    }
    Ok(())
}

/// Make sure every texture of `material` is resident, preparing it on the
/// spot if the host did not.
fn ensure_prepared(
    textures: &mut dyn TextureHandler,
    bitmaps: &mut dyn BitmapHandler,
    material: &Material,
) -> Result<()> {
    for texture in material.textures() {
        if !texture.is_prepared() {
            warn!("texture was not prepared before rendering; uploading it now");
            prepare_or_fail(texture, textures, bitmaps)?;
        }
    }
    Ok(())
}

fn prepare_or_fail(
    texture: &Texture2D,
    textures: &mut dyn TextureHandler,
    bitmaps: &mut dyn BitmapHandler,
) -> Result<TextureId> {
    texture
        .prepare(textures, bitmaps)
        .map_err(|e| {
            ResourceError::TexturePreparation {
                reason: e.to_string(),
            }
            .into()
        })
}

fn draw_mesh(
    graphics: &mut dyn GraphicsHandler,
    mesh: &mut Mesh,
    counters: &mut FrameCounters,
) -> Result<()> {
    match mesh.storage() {
        Storage::Vbo => {
            let vertex = match mesh.vbo.vertex {
                Some(buffer) => buffer,
                None => *mesh.vbo.vertex.insert(graphics.create_buffer()?),
            };
            let index = match mesh.vbo.index {
                Some(buffer) => buffer,
                None => *mesh.vbo.index.insert(graphics.create_buffer()?),
            };
            graphics.bind_buffer(BufferTarget::Array, Some(vertex));
            graphics.bind_buffer(BufferTarget::ElementArray, Some(index));
            if !mesh.vbo.uploaded {
                graphics.buffer_data(
                    BufferTarget::Array,
                    bytemuck::cast_slice(mesh.vertices()),
                    BufferUsage::Static,
                );
                graphics.buffer_data(
                    BufferTarget::ElementArray,
                    bytemuck::cast_slice(mesh.indices()),
                    BufferUsage::Static,
                );
                mesh.vbo.uploaded = true;
            }
            graphics.set_vertex_layout(&BlitVertex::LAYOUT);
            graphics.draw_elements(mesh.mode(), mesh.indices().len());
            counters.vbo_vertex_count += mesh.vertices().len();
            counters.vbo_index_count += mesh.indices().len();
        }
        Storage::Client => {
            graphics.draw_client_elements(
                mesh.mode(),
                &BlitVertex::LAYOUT,
                bytemuck::cast_slice(mesh.vertices()),
                mesh.indices(),
            );
            counters.vertex_count += mesh.vertices().len();
            counters.index_count += mesh.indices().len();
        }
    }
    counters.draw_calls += 1;
    Ok(())
}

fn draw_particles(
    graphics: &mut dyn GraphicsHandler,
    array: &mut ParticleArray,
    counters: &mut FrameCounters,
) -> Result<()> {
    if array.particles.is_empty() {
        return Ok(());
    }
    let bytes: &[u8] = bytemuck::cast_slice(&array.particles);
    match array.storage() {
        Storage::Vbo => {
            let buffer = match array.vbo {
                Some(buffer) => buffer,
                None => *array.vbo.insert(graphics.create_buffer()?),
            };
            graphics.bind_buffer(BufferTarget::Array, Some(buffer));
            graphics.buffer_data(BufferTarget::Array, bytes, BufferUsage::Stream);
            graphics.set_vertex_layout(&ParticleVertex::LAYOUT);
            graphics.draw_arrays(DrawMode::Points, 0, array.particles.len());
            counters.vbo_vertex_count += array.particles.len();
        }
        Storage::Client => {
            graphics.draw_client_arrays(DrawMode::Points, &ParticleVertex::LAYOUT, bytes);
            counters.vertex_count += array.particles.len();
        }
    }
    counters.draw_calls += 1;
    Ok(())
}

/// Swap the red and blue byte positions of a native-order pixel word.
#[must_use]
pub fn swizzle_pixel(word: u32) -> u32 {
    (word & 0xFF00_FF00) | ((word >> 16) & 0xFF) | ((word & 0xFF) << 16)
}

/// Renders blit objects and particle arrays through injected handlers.
pub struct Renderer {
    config: RendererConfig,
    state: RendererState,
    handlers: Handlers,
    blit_programs: Option<ProgramCollection>,
    particle_programs: Option<ProgramCollection>,
    custom_programs: HashMap<ProgramId, UniformTable>,
    setting: RenderSetting,
    profile: ProfileInfo,
    counters: FrameCounters,
    frame_start: Option<Instant>,
    viewport: Viewport,
    projection: Mat4,
    scene_rotation: Mat4,
    // Matrices are rewritten in place; references handed out by accessors
    // are only valid until the next transform call.
    perspective: [f32; 16],
    perspective_dirty: bool,
    model_view: [f32; 16],
    light: Light,
    light_dirty: bool,
    // Size of the bound render target, `None` for the default framebuffer.
    target_size: Option<(u32, u32)>,
    bound: Bound,
    info: Option<BackendInfo>,
    control: RendererControl,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("viewport", &self.viewport)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// A renderer in [`RendererState::Created`] using the given handlers.
    #[must_use]
    pub fn new(config: RendererConfig, handlers: Handlers) -> Self {
        Self {
            config,
            state: RendererState::Created,
            handlers,
            blit_programs: None,
            particle_programs: None,
            custom_programs: HashMap::new(),
            setting: RenderSetting::default(),
            profile: ProfileInfo::default(),
            counters: FrameCounters::default(),
            frame_start: None,
            viewport: Viewport::default(),
            projection: Mat4::IDENTITY,
            scene_rotation: Mat4::IDENTITY,
            perspective: Mat4::IDENTITY.to_cols_array(),
            perspective_dirty: true,
            model_view: Mat4::IDENTITY.to_cols_array(),
            light: Light::default(),
            light_dirty: true,
            target_size: None,
            bound: Bound::default(),
            info: None,
            control: RendererControl::default(),
        }
    }

    fn expect_state(&self, operation: &'static str, expected: RendererState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RenderError::State {
                operation,
                expected,
                actual: self.state,
            })
        }
    }

    fn check_backend(&mut self, checkpoint: &'static str) -> Result<()> {
        if !self.config.check_backend_errors {
            return Ok(());
        }
        match self.handlers.graphics.get_error() {
            Some(code) => Err(RenderError::Backend { code, checkpoint }),
            None => Ok(()),
        }
    }

    /// Describe both program collections. Valid only when created.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] outside [`RendererState::Created`].
    pub fn init_renderer(&mut self) -> Result<()> {
        self.expect_state("init_renderer", RendererState::Created)?;
        let platform = self.config.platform;
        self.blit_programs = Some(ProgramCollection::blit(platform));
        self.particle_programs = Some(ProgramCollection::particle(platform));
        self.state = RendererState::Initialized;
        info!("renderer initialized for {platform:?}");
        Ok(())
    }

    /// Link every program, push the initial render setting and query the
    /// backend. Valid only when initialized.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] outside [`RendererState::Initialized`],
    /// the first compile, link or uniform failure, or a backend error seen at
    /// a checkpoint.
    pub fn start_renderer(&mut self) -> Result<()> {
        self.expect_state("start_renderer", RendererState::Initialized)?;

        let programs = &mut *self.handlers.programs;
        if let Some(collection) = &mut self.blit_programs {
            collection.load(programs)?;
        }
        self.check_backend("blit program load")?;
        let programs = &mut *self.handlers.programs;
        if let Some(collection) = &mut self.particle_programs {
            collection.load(programs)?;
        }
        self.check_backend("particle program load")?;

        self.setting.take_changes();
        self.handlers
            .graphics
            .apply_render_setting(&self.setting, ChangeFlags::all());
        self.bound = Bound::default();
        self.handlers.graphics.disable(Capability::Blend);
        if self.viewport.width > 0 && self.viewport.height > 0 {
            let Viewport {
                x,
                y,
                width,
                height,
            } = self.viewport;
            self.handlers.graphics.viewport(x, y, width, height);
        }
        self.perspective_dirty = true;
        self.light_dirty = true;
        self.target_size = None;

        let info = self.handlers.graphics.info();
        info!(
            "renderer started: {} {} (GL {}, GLSL {}), {} texture units, max texture {}",
            info.vendor,
            info.renderer,
            info.version,
            info.shading_language_version,
            info.max_texture_units,
            info.max_texture_size
        );
        self.info = Some(info);
        self.check_backend("startup")?;

        self.state = RendererState::Started;
        Ok(())
    }

    /// Return to [`RendererState::Created`] from any state.
    ///
    /// Linked programs are forgotten, not deleted; the host disposes of GPU
    /// resources together with the context.
    pub fn destroy(&mut self) {
        self.blit_programs = None;
        self.particle_programs = None;
        self.custom_programs.clear();
        self.bound = Bound::default();
        self.counters = FrameCounters::default();
        self.frame_start = None;
        self.perspective_dirty = true;
        self.light_dirty = true;
        self.target_size = None;
        self.setting.mark_all_changed();
        self.info = None;
        if self.state != RendererState::Created {
            info!("renderer destroyed from {:?}", self.state);
        }
        self.state = RendererState::Created;
    }

    /// Start a frame: zero the counters, push changed settings and clear.
    ///
    /// Requests queued on a [`RendererControl`] are handled first. A pending
    /// destroy tears the renderer down and the call fails.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] unless started.
    pub fn begin_frame(&mut self) -> Result<()> {
        if self.control.take_destroy_request() {
            self.destroy();
        }
        self.expect_state("begin_frame", RendererState::Started)?;
        self.control.apply_edits(&mut self.setting);
        self.counters = FrameCounters::default();
        self.frame_start = Some(Instant::now());

        let changes = self.setting.take_changes();
        if !changes.is_empty() {
            self.handlers
                .graphics
                .apply_render_setting(&self.setting, changes);
        }
        let clear = self.setting.clear_flags();
        if !clear.is_empty() {
            self.handlers.graphics.clear(clear);
        }
        Ok(())
    }

    /// Finish a frame and publish its counters to [`Self::profile_info`].
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] unless started, or when no frame is
    /// open.
    pub fn end_frame(&mut self) -> Result<()> {
        self.expect_state("end_frame", RendererState::Started)?;
        let Some(start) = self.frame_start.take() else {
            return Err(RenderError::State {
                operation: "end_frame without begin_frame",
                expected: RendererState::Started,
                actual: self.state,
            });
        };
        self.profile.record(self.counters, start.elapsed());
        Ok(())
    }

    /// Draw `objects` in order. Objects with `render == false` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] unless started, or a
    /// [`ResourceError::TexturePreparation`] if a lazily prepared texture
    /// fails to upload.
    pub fn render_blit_objects(&mut self, objects: &mut [BlitObject]) -> Result<()> {
        self.expect_state("render_blit_objects", RendererState::Started)?;
        let Some(collection) = &self.blit_programs else {
            return Ok(());
        };
        let Handlers {
            graphics,
            textures,
            programs,
            bitmaps,
        } = &mut self.handlers;

        for object in objects.iter_mut().filter(|o| o.render) {
            let material = &object.material;
            let linked = collection.get(material.program_index(collection.len()))?;
            let (program, table) = match material.shading {
                ShadingMode::Custom(custom) => (
                    custom,
                    self.custom_programs.get(&custom).unwrap_or(&linked.uniforms),
                ),
                _ => (linked.program, &linked.uniforms),
            };

            ensure_prepared(&mut **textures, &mut **bitmaps, material)?;

            let switched = self.bound.use_program(&mut **programs, program);
            let mut uniforms = Uniforms {
                programs: &mut **programs,
                table,
            };
            if switched || self.perspective_dirty {
                uniforms.mat4(Uniform::Perspective, &self.perspective);
                self.perspective_dirty = false;
            }
            if switched || self.light_dirty {
                uniforms.light(&self.light);
                self.light_dirty = false;
            }

            uniforms.samplers();
            uniforms.vec3(Uniform::Translate, object.position);
            uniforms.vec3(Uniform::Scale, object.scale);
            uniforms.vec3(Uniform::Rotate, object.rotation);
            uniforms.vec4(Uniform::Diffuse, material.diffuse);
            match material.shading {
                ShadingMode::Lambert | ShadingMode::Phong => {
                    uniforms.vec4(Uniform::Ambient, material.ambient);
                    uniforms.vec4(Uniform::Specular, material.specular);
                    uniforms.float(Uniform::Shine, material.power);
                    uniforms.vec3(Uniform::LightDirection, self.light.direction);
                    uniforms.vec3(Uniform::LightPosition, self.light.position);
                }
                ShadingMode::Lit => {
                    uniforms.vec3(Uniform::LightDirection, self.light.direction);
                    uniforms.vec4(Uniform::LightColor, self.light.color);
                }
                ShadingMode::Blur5 | ShadingMode::Blur9 => {
                    let (width, height) = material.textures()[0].size();
                    uniforms.vec3(Uniform::Blur, material.blur.uniform(width, height));
                }
                ShadingMode::Unlit | ShadingMode::Colored | ShadingMode::Custom(_) => {}
            }

            self.bound.apply_blend(&mut **graphics, material.blend);
            bind_material_textures(&mut **textures, material)?;
            draw_mesh(&mut **graphics, &mut object.mesh, &mut self.counters)?;
        }
        Ok(())
    }

    /// Draw `arrays` in order. Arrays with `render == false` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] unless started,
    /// [`RenderError::Argument`] for an image array without a material, or a
    /// texture preparation failure.
    pub fn render_particle_arrays(&mut self, arrays: &mut [ParticleArray]) -> Result<()> {
        self.expect_state("render_particle_arrays", RendererState::Started)?;
        let Some(collection) = &self.particle_programs else {
            return Ok(());
        };
        let Handlers {
            graphics,
            textures,
            programs,
            bitmaps,
        } = &mut self.handlers;

        #[expect(clippy::cast_precision_loss)]
        let inverse = |extent: i32| {
            if extent > 0 {
                1.0 / extent as f32
            } else {
                0.0
            }
        };
        let (width, height) = match self.target_size {
            Some((w, h)) => (
                i32::try_from(w).unwrap_or(i32::MAX),
                i32::try_from(h).unwrap_or(i32::MAX),
            ),
            None => (self.viewport.width, self.viewport.height),
        };
        let inverse_viewport = [inverse(width), inverse(height)];

        for array in arrays.iter_mut().filter(|a| a.render) {
            let linked = collection.get(array.particle_type.program_index())?;
            let material = match (array.particle_type, &array.material) {
                (ParticleType::Image, None) => {
                    return Err(RenderError::Argument(
                        "image particles need a material with a texture".into(),
                    ))
                }
                (_, material) => material.as_ref(),
            };
            if array.particle_type == ParticleType::Image {
                if let Some(material) = material {
                    ensure_prepared(&mut **textures, &mut **bitmaps, material)?;
                }
            }

            self.bound.use_program(&mut **programs, linked.program);
            self.model_view = Mat4::from_scale_rotation_translation(
                Vec3::from(array.scale),
                Quat::from_euler(
                    EulerRot::XYZ,
                    array.rotation[0],
                    array.rotation[1],
                    array.rotation[2],
                ),
                Vec3::from(array.position),
            )
            .to_cols_array();

            let mut uniforms = Uniforms {
                programs: &mut **programs,
                table: &linked.uniforms,
            };
            uniforms.mat4(Uniform::ModelView, &self.model_view);
            uniforms.mat4(Uniform::Perspective, &self.perspective);
            uniforms.vec4(Uniform::ParticleData, array.params);
            if array.particle_type == ParticleType::Image {
                uniforms.samplers();
                uniforms.vec2(Uniform::InverseViewport, inverse_viewport);
            }

            self.bound
                .apply_blend(&mut **graphics, material.and_then(|m| m.blend));
            if array.particle_type == ParticleType::Image {
                if let Some(material) = material {
                    bind_material_textures(&mut **textures, material)?;
                }
            }
            draw_particles(&mut **graphics, array, &mut self.counters)?;
        }
        Ok(())
    }

    /// Set the drawing area. Applied immediately when started, otherwise
    /// at start.
    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.viewport = Viewport {
            x,
            y,
            width,
            height,
        };
        if self.state == RendererState::Started {
            self.handlers.graphics.viewport(x, y, width, height);
        }
    }

    /// Current drawing area.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn refresh_perspective(&mut self) {
        self.perspective = (self.projection * self.scene_rotation).to_cols_array();
        self.perspective_dirty = true;
    }

    /// Replace the projection matrix.
    pub fn set_perspective_matrix(&mut self, projection: Mat4) {
        self.projection = projection;
        self.refresh_perspective();
    }

    /// A right-handed perspective projection over the current viewport's
    /// aspect ratio.
    #[expect(clippy::cast_precision_loss)]
    pub fn set_perspective(&mut self, fov_y_radians: f32, near: f32, far: f32) {
        let aspect = if self.viewport.height > 0 {
            self.viewport.width as f32 / self.viewport.height as f32
        } else {
            1.0
        };
        self.set_perspective_matrix(Mat4::perspective_rh_gl(fov_y_radians, aspect, near, far));
    }

    /// A pixel-space orthographic projection with the origin at the
    /// viewport's bottom-left corner.
    #[expect(clippy::cast_precision_loss)]
    pub fn set_orthogonal_projection(&mut self) {
        let width = self.viewport.width as f32;
        let height = self.viewport.height as f32;
        let depth = width.max(height).max(1.0);
        self.set_perspective_matrix(Mat4::orthographic_rh_gl(
            0.0, width, 0.0, height, -depth, depth,
        ));
    }

    /// Rotate the whole scene by Euler angles in radians, on top of any
    /// earlier scene rotation.
    pub fn rotate_scene(&mut self, x: f32, y: f32, z: f32) {
        self.scene_rotation *= Mat4::from_euler(EulerRot::XYZ, x, y, z);
        self.refresh_perspective();
    }

    /// Drop any accumulated scene rotation.
    pub fn reset_scene_rotation(&mut self) {
        self.scene_rotation = Mat4::IDENTITY;
        self.refresh_perspective();
    }

    /// The combined projection and scene rotation uploaded as
    /// `uPerspective`.
    #[must_use]
    pub fn perspective(&self) -> &[f32; 16] {
        &self.perspective
    }

    /// Read back `width` x `height` pixels starting at (`x`, `y`), with the
    /// red and blue bytes of every word swapped from the backend's native
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] unless started, or
    /// [`RenderError::Argument`] for a negative size.
    pub fn read_pixels(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: PixelFormat,
    ) -> Result<Vec<u32>> {
        self.expect_state("read_pixels", RendererState::Started)?;
        let (Ok(w), Ok(h)) = (usize::try_from(width), usize::try_from(height)) else {
            return Err(RenderError::Argument(format!(
                "negative read size {width}x{height}"
            )));
        };
        let mut pixels = vec![0u32; w * h];
        self.handlers.graphics.read_pixels(
            x,
            y,
            width,
            height,
            format,
            bytemuck::cast_slice_mut(&mut pixels),
        );
        for pixel in &mut pixels {
            *pixel = swizzle_pixel(*pixel);
        }
        Ok(pixels)
    }

    /// Scene light used by the lit shading modes.
    #[must_use]
    pub fn light(&self) -> Light {
        self.light
    }

    /// Replace the scene light. It is uploaded with the next blit draw.
    pub fn set_light(&mut self, light: Light) {
        self.light = light;
        self.light_dirty = true;
    }

    /// Upload `texture` now instead of on its first draw.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] unless started, or
    /// [`ResourceError::TexturePreparation`].
    pub fn prepare_texture(&mut self, texture: &Texture2D) -> Result<TextureId> {
        self.expect_state("prepare_texture", RendererState::Started)?;
        prepare_or_fail(
            texture,
            &mut *self.handlers.textures,
            &mut *self.handlers.bitmaps,
        )
    }

    /// Link a program from GLSL bodies written against the blit vertex
    /// layout, for use with [`ShadingMode::Custom`]. The platform prelude
    /// is prepended to each stage.
    ///
    /// The program receives the colored mode's uniforms, looked up by name
    /// in the new program.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] unless started, or the compile or link
    /// failure.
    pub fn create_custom_program(
        &mut self,
        name: &str,
        vertex_body: &str,
        fragment_body: &str,
    ) -> Result<ProgramId> {
        self.expect_state("create_custom_program", RendererState::Started)?;
        let platform = self.config.platform;
        let descriptor = ProgramDescriptor {
            name: format!("custom/{name}"),
            vertex_source: shaders::assemble(platform, false, &[], vertex_body),
            fragment_source: shaders::assemble(platform, true, &[], fragment_body),
            attributes: shaders::BLIT_ATTRIBUTES,
            required: Vec::new(),
        };
        let linked = build_program(&mut *self.handlers.programs, &descriptor)?;
        self.check_backend("custom program load")?;
        info!("{} linked as {:?}", descriptor.name, linked.program);
        self.custom_programs.insert(linked.program, linked.uniforms);
        Ok(linked.program)
    }

    /// Create an off-screen target with a color texture and depth buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] unless started,
    /// [`RenderError::Argument`] for a zero size, or the allocation or
    /// completeness failure.
    pub fn create_render_target(&mut self, width: u32, height: u32) -> Result<RenderTarget> {
        self.expect_state("create_render_target", RendererState::Started)?;
        if width == 0 || height == 0 {
            return Err(RenderError::Argument(format!(
                "empty render target {width}x{height}"
            )));
        }
        let textures = &mut *self.handlers.textures;

        let texture = textures.create_texture()?;
        textures.bind_texture(TextureTarget::Texture2D, Some(texture));
        textures.tex_image_2d(TextureTarget::Texture2D, width, height, None);
        for call in TexParams::default().calls() {
            textures.tex_parameter(TextureTarget::Texture2D, call);
        }

        let framebuffer = match textures.create_framebuffer() {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                textures.delete_texture(texture);
                return Err(e.into());
            }
        };
        textures.bind_framebuffer(Some(framebuffer));
        textures.framebuffer_texture_2d(texture);

        let depth = match textures.create_renderbuffer() {
            Ok(depth) => depth,
            Err(e) => {
                textures.bind_framebuffer(None);
                textures.delete_framebuffer(framebuffer);
                textures.delete_texture(texture);
                return Err(e.into());
            }
        };
        textures.bind_renderbuffer(Some(depth));
        textures.renderbuffer_storage(width, height);
        textures.framebuffer_renderbuffer(depth);
        textures.bind_renderbuffer(None);

        let status = textures.check_framebuffer_status();
        textures.bind_framebuffer(None);
        let target = RenderTarget {
            framebuffer,
            texture,
            depth,
            width,
            height,
        };
        if let Err(e) = status {
            self.delete_render_target(target);
            return Err(e.into());
        }
        Ok(target)
    }

    /// Redirect drawing to `target`, or back to the default framebuffer
    /// and the stored viewport with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::State`] unless started.
    #[expect(clippy::cast_possible_wrap)]
    pub fn bind_render_target(&mut self, target: Option<&RenderTarget>) -> Result<()> {
        self.expect_state("bind_render_target", RendererState::Started)?;
        match target {
            Some(target) => {
                self.handlers
                    .textures
                    .bind_framebuffer(Some(target.framebuffer));
                self.handlers
                    .graphics
                    .viewport(0, 0, target.width as i32, target.height as i32);
                self.target_size = Some(target.size());
            }
            None => {
                self.handlers.textures.bind_framebuffer(None);
                self.target_size = None;
                let Viewport {
                    x,
                    y,
                    width,
                    height,
                } = self.viewport;
                self.handlers.graphics.viewport(x, y, width, height);
            }
        }
        Ok(())
    }

    /// Release the GPU objects of `target`.
    pub fn delete_render_target(&mut self, target: RenderTarget) {
        let textures = &mut *self.handlers.textures;
        textures.delete_framebuffer(target.framebuffer);
        textures.delete_renderbuffer(target.depth);
        textures.delete_texture(target.texture);
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Configuration the renderer was built with.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Global pipeline setting.
    #[must_use]
    pub fn setting(&self) -> &RenderSetting {
        &self.setting
    }

    /// Mutable access to the global pipeline setting. Changes are pushed at
    /// the next [`Self::begin_frame`].
    pub fn setting_mut(&mut self) -> &mut RenderSetting {
        &mut self.setting
    }

    /// Statistics of the last completed frame.
    #[must_use]
    pub fn profile_info(&self) -> &ProfileInfo {
        &self.profile
    }

    /// Backend capabilities queried at start.
    #[must_use]
    pub fn backend_info(&self) -> Option<&BackendInfo> {
        self.info.as_ref()
    }

    /// Blit program collection, present once initialized.
    #[must_use]
    pub fn blit_programs(&self) -> Option<&ProgramCollection> {
        self.blit_programs.as_ref()
    }

    /// Particle program collection, present once initialized.
    #[must_use]
    pub fn particle_programs(&self) -> Option<&ProgramCollection> {
        self.particle_programs.as_ref()
    }

    /// The injected handlers.
    #[must_use]
    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    /// Mutable access to the injected handlers, for host-side resource
    /// management. Direct backend calls bypass the renderer's bind cache;
    /// a host that binds programs or changes blending itself must restore
    /// them before the next draw.
    pub fn handlers_mut(&mut self) -> &mut Handlers {
        &mut self.handlers
    }

    /// A `Send + Sync` handle for requesting a destroy or editing the render
    /// setting from another thread.
    #[must_use]
    pub fn control(&self) -> RendererControl {
        self.control.clone()
    }
}
