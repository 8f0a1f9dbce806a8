//! Handler implementations over a [`glow::Context`].
//!
//! Every handler shares one `Arc<glow::Context>`. Handles cross the trait
//! boundary as raw GL names and are rewrapped into glow's native types on
//! each call.
//!
//! # Safety
//!
//! The constructors are `unsafe`: the context must be current on the calling
//! thread for as long as the handlers are used, and every handler must be
//! driven from that thread.

use std::num::NonZeroU32;
use std::sync::Arc;

use glow::{HasContext, PixelPackData, PixelUnpackData};

use crate::backend::{
    BackendInfo, BlendFactor, BufferId, BufferTarget, BufferUsage, Capability, CullFace,
    DepthFunc, DrawMode, FramebufferId, GraphicsHandler, Handlers, PixelFormat, ProgramHandler,
    ProgramId, RenderbufferId, ShaderId, ShaderStage, TexFilter, TexParameter, TexWrap,
    TextureHandler, TextureId, TextureTarget, UniformLocation, VertexLayout,
};
use crate::bitmap::ImageBitmaps;
use crate::config::Platform;
use crate::error::ResourceError;
use crate::setting::{ChangeFlags, ClearFlags, RenderSetting};

/// Clamp a host count into the `GLsizei` range.
fn gl_count(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn gl_size(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// GL enum values all fit in i32; glTexParameteri and glTexImage2D take them
// signed.
#[expect(clippy::cast_possible_wrap)]
fn gl_enum(value: u32) -> i32 {
    value as i32
}

fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::Blend => glow::BLEND,
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::CullFace => glow::CULL_FACE,
        Capability::Multisample => glow::MULTISAMPLE,
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
    }
}

fn depth_func(func: DepthFunc) -> u32 {
    match func {
        DepthFunc::Never => glow::NEVER,
        DepthFunc::Less => glow::LESS,
        DepthFunc::Equal => glow::EQUAL,
        DepthFunc::LessOrEqual => glow::LEQUAL,
        DepthFunc::Greater => glow::GREATER,
        DepthFunc::NotEqual => glow::NOTEQUAL,
        DepthFunc::GreaterOrEqual => glow::GEQUAL,
        DepthFunc::Always => glow::ALWAYS,
    }
}

fn cull_face(face: CullFace) -> u32 {
    match face {
        CullFace::Front => glow::FRONT,
        CullFace::Back => glow::BACK,
        CullFace::FrontAndBack => glow::FRONT_AND_BACK,
    }
}

fn draw_mode(mode: DrawMode) -> u32 {
    match mode {
        DrawMode::Points => glow::POINTS,
        DrawMode::Lines => glow::LINES,
        DrawMode::LineStrip => glow::LINE_STRIP,
        DrawMode::Triangles => glow::TRIANGLES,
        DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
        DrawMode::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn buffer_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
        BufferUsage::Stream => glow::STREAM_DRAW,
    }
}

fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::Rectangle => glow::TEXTURE_RECTANGLE,
    }
}

fn tex_filter(filter: TexFilter) -> u32 {
    match filter {
        TexFilter::Nearest => glow::NEAREST,
        TexFilter::Linear => glow::LINEAR,
        TexFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        TexFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        TexFilter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        TexFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }
}

fn tex_wrap(wrap: TexWrap) -> u32 {
    match wrap {
        TexWrap::Repeat => glow::REPEAT,
        TexWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        TexWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
    }
}

/// `(pname, value)` of one `glTexParameteri` call.
fn tex_parameter(parameter: TexParameter) -> (u32, i32) {
    match parameter {
        TexParameter::MagFilter(f) => (glow::TEXTURE_MAG_FILTER, gl_enum(tex_filter(f))),
        TexParameter::MinFilter(f) => (glow::TEXTURE_MIN_FILTER, gl_enum(tex_filter(f))),
        TexParameter::WrapS(w) => (glow::TEXTURE_WRAP_S, gl_enum(tex_wrap(w))),
        TexParameter::WrapT(w) => (glow::TEXTURE_WRAP_T, gl_enum(tex_wrap(w))),
    }
}

fn pixel_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Rgba => glow::RGBA,
        PixelFormat::Bgra => glow::BGRA,
    }
}

fn shader_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn clear_mask(flags: ClearFlags) -> u32 {
    let mut mask = 0;
    if flags.contains(ClearFlags::COLOR) {
        mask |= glow::COLOR_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::DEPTH) {
        mask |= glow::DEPTH_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::STENCIL) {
        mask |= glow::STENCIL_BUFFER_BIT;
    }
    mask
}

fn native_program(id: ProgramId) -> Option<glow::Program> {
    NonZeroU32::new(id.0).map(glow::NativeProgram)
}

fn native_shader(id: ShaderId) -> Option<glow::Shader> {
    NonZeroU32::new(id.0).map(glow::NativeShader)
}

fn native_texture(id: TextureId) -> Option<glow::Texture> {
    NonZeroU32::new(id.0).map(glow::NativeTexture)
}

fn native_buffer(id: BufferId) -> Option<glow::Buffer> {
    NonZeroU32::new(id.0).map(glow::NativeBuffer)
}

fn native_framebuffer(id: FramebufferId) -> Option<glow::Framebuffer> {
    NonZeroU32::new(id.0).map(glow::NativeFramebuffer)
}

fn native_renderbuffer(id: RenderbufferId) -> Option<glow::Renderbuffer> {
    NonZeroU32::new(id.0).map(glow::NativeRenderbuffer)
}

/// Pipeline state, buffers and draws.
///
/// Client-memory draws are streamed through a pair of scratch buffers owned
/// by the handler. On desktop a vertex array object is created and left
/// bound, and point sizes are taken from the vertex stage.
pub struct GlowGraphics {
    gl: Arc<glow::Context>,
    platform: Platform,
    scratch_vbo: glow::Buffer,
    scratch_ebo: glow::Buffer,
    enabled_attributes: u32,
}

impl GlowGraphics {
    /// Set up the scratch buffers and desktop vertex array.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Allocation`] if a GL object cannot be
    /// created.
    pub unsafe fn new(gl: Arc<glow::Context>, platform: Platform) -> Result<Self, ResourceError> {
        let (scratch_vbo, scratch_ebo) = unsafe {
            if platform == Platform::Desktop {
                let vao = gl.create_vertex_array().map_err(ResourceError::Allocation)?;
                gl.bind_vertex_array(Some(vao));
                gl.enable(glow::PROGRAM_POINT_SIZE);
            }
            let vbo = gl.create_buffer().map_err(ResourceError::Allocation)?;
            let ebo = gl.create_buffer().map_err(ResourceError::Allocation)?;
            (vbo, ebo)
        };
        Ok(Self {
            gl,
            platform,
            scratch_vbo,
            scratch_ebo,
            enabled_attributes: 0,
        })
    }
}

impl GraphicsHandler for GlowGraphics {
    fn enable(&mut self, capability: Capability) {
        unsafe { self.gl.enable(self::capability(capability)) };
    }

    fn disable(&mut self, capability: Capability) {
        unsafe { self.gl.disable(self::capability(capability)) };
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(blend_factor(src), blend_factor(dst)) };
    }

    fn apply_render_setting(&mut self, setting: &RenderSetting, changed: ChangeFlags) {
        let gl = &self.gl;
        let desktop = self.platform == Platform::Desktop;
        unsafe {
            if changed.contains(ChangeFlags::CLEAR_COLOR) {
                let [r, g, b, a] = setting.clear_color();
                gl.clear_color(r, g, b, a);
            }
            if changed.contains(ChangeFlags::DEPTH) {
                match setting.depth_func() {
                    Some(func) => {
                        gl.enable(glow::DEPTH_TEST);
                        gl.depth_func(depth_func(func));
                    }
                    None => gl.disable(glow::DEPTH_TEST),
                }
                let [near, far] = setting.depth_range();
                if desktop {
                    gl.depth_range_f64(f64::from(near), f64::from(far));
                    gl.clear_depth_f64(f64::from(setting.clear_depth()));
                } else {
                    gl.depth_range_f32(near, far);
                    gl.clear_depth_f32(setting.clear_depth());
                }
            }
            if changed.contains(ChangeFlags::CULL_FACE) {
                match setting.cull_face() {
                    Some(face) => {
                        gl.enable(glow::CULL_FACE);
                        gl.cull_face(cull_face(face));
                    }
                    None => gl.disable(glow::CULL_FACE),
                }
            }
            if changed.contains(ChangeFlags::MULTISAMPLE) && desktop {
                if setting.multisampling() {
                    gl.enable(glow::MULTISAMPLE);
                } else {
                    gl.disable(glow::MULTISAMPLE);
                }
            }
        }
    }

    fn clear(&mut self, flags: ClearFlags) {
        unsafe { self.gl.clear(clear_mask(flags)) };
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn get_error(&mut self) -> Option<u32> {
        match unsafe { self.gl.get_error() } {
            glow::NO_ERROR => None,
            code => Some(code),
        }
    }

    fn info(&mut self) -> BackendInfo {
        let gl = &self.gl;
        unsafe {
            BackendInfo {
                vendor: gl.get_parameter_string(glow::VENDOR),
                renderer: gl.get_parameter_string(glow::RENDERER),
                version: gl.get_parameter_string(glow::VERSION),
                shading_language_version: gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION),
                max_texture_units: gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS),
                max_texture_size: gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE),
            }
        }
    }

    fn read_pixels(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: PixelFormat,
        out: &mut [u8],
    ) {
        unsafe {
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, 4);
            self.gl.read_pixels(
                x,
                y,
                width,
                height,
                pixel_format(format),
                glow::UNSIGNED_BYTE,
                PixelPackData::Slice(Some(out)),
            );
        }
    }

    fn create_buffer(&mut self) -> Result<BufferId, ResourceError> {
        let buffer = unsafe { self.gl.create_buffer() }.map_err(ResourceError::Allocation)?;
        Ok(BufferId(buffer.0.get()))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(buffer) = native_buffer(buffer) {
            unsafe { self.gl.delete_buffer(buffer) };
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        let buffer = buffer.and_then(native_buffer);
        unsafe { self.gl.bind_buffer(buffer_target(target), buffer) };
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(buffer_target(target), data, buffer_usage(usage));
        }
    }

    fn set_vertex_layout(&mut self, layout: &VertexLayout) {
        let gl = &self.gl;
        let count = u32::try_from(layout.attributes.len()).unwrap_or(u32::MAX);
        unsafe {
            for attribute in layout.attributes {
                gl.enable_vertex_attrib_array(attribute.index);
                gl.vertex_attrib_pointer_f32(
                    attribute.index,
                    attribute.size,
                    glow::FLOAT,
                    false,
                    layout.stride,
                    attribute.offset,
                );
            }
            for stale in count..self.enabled_attributes {
                gl.disable_vertex_attrib_array(stale);
            }
        }
        self.enabled_attributes = count;
    }

    fn draw_elements(&mut self, mode: DrawMode, count: usize) {
        unsafe {
            self.gl
                .draw_elements(draw_mode(mode), gl_count(count), glow::UNSIGNED_SHORT, 0);
        }
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: usize, count: usize) {
        unsafe {
            self.gl
                .draw_arrays(draw_mode(mode), gl_count(first), gl_count(count));
        }
    }

    fn draw_client_elements(
        &mut self,
        mode: DrawMode,
        layout: &VertexLayout,
        vertices: &[u8],
        indices: &[u16],
    ) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.scratch_vbo));
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, vertices, glow::STREAM_DRAW);
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.scratch_ebo));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STREAM_DRAW,
            );
        }
        self.set_vertex_layout(layout);
        self.draw_elements(mode, indices.len());
    }

    fn draw_client_arrays(&mut self, mode: DrawMode, layout: &VertexLayout, vertices: &[u8]) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.scratch_vbo));
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, vertices, glow::STREAM_DRAW);
        }
        self.set_vertex_layout(layout);
        let stride = usize::try_from(layout.stride).unwrap_or(1).max(1);
        self.draw_arrays(mode, 0, vertices.len() / stride);
    }
}

/// Textures, framebuffers and renderbuffers.
pub struct GlowTextures {
    gl: Arc<glow::Context>,
    platform: Platform,
}

impl GlowTextures {
    /// Wrap a context.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    #[must_use]
    pub unsafe fn new(gl: Arc<glow::Context>, platform: Platform) -> Self {
        Self { gl, platform }
    }
}

impl TextureHandler for GlowTextures {
    fn create_texture(&mut self) -> Result<TextureId, ResourceError> {
        let texture = unsafe { self.gl.create_texture() }.map_err(ResourceError::Allocation)?;
        Ok(TextureId(texture.0.get()))
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(texture) = native_texture(texture) {
            unsafe { self.gl.delete_texture(texture) };
        }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureId>) {
        let texture = texture.and_then(native_texture);
        unsafe { self.gl.bind_texture(texture_target(target), texture) };
    }

    fn tex_image_2d(&mut self, target: TextureTarget, width: u32, height: u32, pixels: Option<&[u8]>) {
        // GLES 2 requires the internal format to match the upload format.
        let internal = match self.platform {
            Platform::Embedded => gl_enum(glow::RGBA),
            Platform::Desktop => gl_enum(glow::RGBA8),
        };
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                texture_target(target),
                0,
                internal,
                gl_size(width),
                gl_size(height),
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(pixels),
            );
        }
    }

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TexParameter) {
        let (name, value) = tex_parameter(parameter);
        unsafe { self.gl.tex_parameter_i32(texture_target(target), name, value) };
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId, ResourceError> {
        let framebuffer =
            unsafe { self.gl.create_framebuffer() }.map_err(ResourceError::Allocation)?;
        Ok(FramebufferId(framebuffer.0.get()))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(framebuffer) = native_framebuffer(framebuffer) {
            unsafe { self.gl.delete_framebuffer(framebuffer) };
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        let framebuffer = framebuffer.and_then(native_framebuffer);
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) };
    }

    fn framebuffer_texture_2d(&mut self, texture: TextureId) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                native_texture(texture),
                0,
            );
        }
    }

    fn create_renderbuffer(&mut self) -> Result<RenderbufferId, ResourceError> {
        let renderbuffer =
            unsafe { self.gl.create_renderbuffer() }.map_err(ResourceError::Allocation)?;
        Ok(RenderbufferId(renderbuffer.0.get()))
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        if let Some(renderbuffer) = native_renderbuffer(renderbuffer) {
            unsafe { self.gl.delete_renderbuffer(renderbuffer) };
        }
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<RenderbufferId>) {
        let renderbuffer = renderbuffer.and_then(native_renderbuffer);
        unsafe { self.gl.bind_renderbuffer(glow::RENDERBUFFER, renderbuffer) };
    }

    fn renderbuffer_storage(&mut self, width: u32, height: u32) {
        unsafe {
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH_COMPONENT16,
                gl_size(width),
                gl_size(height),
            );
        }
    }

    fn framebuffer_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                native_renderbuffer(renderbuffer),
            );
        }
    }

    fn check_framebuffer_status(&mut self) -> Result<(), ResourceError> {
        match unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) } {
            glow::FRAMEBUFFER_COMPLETE => Ok(()),
            status => Err(ResourceError::IncompleteFramebuffer(status)),
        }
    }
}

/// Shader compilation, linking and uniforms.
pub struct GlowPrograms {
    gl: Arc<glow::Context>,
}

impl GlowPrograms {
    /// Wrap a context.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    #[must_use]
    pub unsafe fn new(gl: Arc<glow::Context>) -> Self {
        Self { gl }
    }

    fn location(location: UniformLocation) -> glow::UniformLocation {
        glow::NativeUniformLocation(location.0)
    }
}

impl ProgramHandler for GlowPrograms {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let gl = &self.gl;
        unsafe {
            let shader = gl.create_shader(shader_stage(stage))?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(log);
            }
            Ok(ShaderId(shader.0.get()))
        }
    }

    fn link_program(
        &mut self,
        vertex: ShaderId,
        fragment: ShaderId,
        attributes: &[(u32, &str)],
    ) -> Result<ProgramId, String> {
        let gl = &self.gl;
        let (Some(vs), Some(fs)) = (native_shader(vertex), native_shader(fragment)) else {
            return Err("null shader handle".into());
        };
        unsafe {
            let program = gl.create_program()?;
            gl.attach_shader(program, vs);
            gl.attach_shader(program, fs);
            for &(index, name) in attributes {
                gl.bind_attrib_location(program, index, name);
            }
            gl.link_program(program);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(log);
            }

            gl.detach_shader(program, vs);
            gl.detach_shader(program, fs);
            Ok(ProgramId(program.0.get()))
        }
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if let Some(shader) = native_shader(shader) {
            unsafe { self.gl.delete_shader(shader) };
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(program) = native_program(program) {
            unsafe { self.gl.delete_program(program) };
        }
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let program = native_program(program)?;
        unsafe { self.gl.get_uniform_location(program, name) }.map(|l| UniformLocation(l.0))
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        let program = program.and_then(native_program);
        unsafe { self.gl.use_program(program) };
    }

    fn uniform_1i(&mut self, location: UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(&Self::location(location)), value) };
    }

    fn uniform_1f(&mut self, location: UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(&Self::location(location)), value) };
    }

    fn uniform_2f(&mut self, location: UniformLocation, [x, y]: [f32; 2]) {
        unsafe { self.gl.uniform_2_f32(Some(&Self::location(location)), x, y) };
    }

    fn uniform_3f(&mut self, location: UniformLocation, [x, y, z]: [f32; 3]) {
        unsafe { self.gl.uniform_3_f32(Some(&Self::location(location)), x, y, z) };
    }

    fn uniform_4f(&mut self, location: UniformLocation, [x, y, z, w]: [f32; 4]) {
        unsafe {
            self.gl
                .uniform_4_f32(Some(&Self::location(location)), x, y, z, w);
        }
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&Self::location(location)), false, value);
        }
    }
}

/// All four handlers over one context, with [`ImageBitmaps`] decoding.
///
/// # Safety
///
/// Requires a valid, current OpenGL context for as long as the handlers are
/// used.
///
/// # Errors
///
/// Returns [`ResourceError::Allocation`] if the graphics handler's scratch
/// objects cannot be created.
pub unsafe fn glow_handlers(
    gl: Arc<glow::Context>,
    platform: Platform,
) -> Result<Handlers, ResourceError> {
    let graphics = unsafe { GlowGraphics::new(Arc::clone(&gl), platform) }?;
    let textures = unsafe { GlowTextures::new(Arc::clone(&gl), platform) };
    let programs = unsafe { GlowPrograms::new(gl) };
    Ok(Handlers::new(graphics, textures, programs, ImageBitmaps))
}
