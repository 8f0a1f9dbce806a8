//! Recording handlers for unit tests.
//!
//! Every handler call is appended to a shared log so tests can assert exact
//! call sequences without a GL context.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::backend::{
    BackendInfo, BitmapHandler, BlendFactor, BufferId, BufferTarget, BufferUsage, Capability,
    DrawMode, FramebufferId, GraphicsHandler, Handlers, PixelFormat, ProgramHandler, ProgramId,
    RenderbufferId, ShaderId, ShaderStage, TexParameter, TextureHandler, TextureId, TextureTarget,
    UniformLocation, VertexLayout,
};
use crate::bitmap::Bitmap;
use crate::error::ResourceError;
use crate::setting::{ChangeFlags, ClearFlags, RenderSetting};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Enable(Capability),
    Disable(Capability),
    BlendFunc(BlendFactor, BlendFactor),
    ApplySetting(RenderSetting, ChangeFlags),
    Clear(ClearFlags),
    Viewport(i32, i32, i32, i32),
    ReadPixels(i32, i32, PixelFormat),
    CreateBuffer(BufferId),
    DeleteBuffer(BufferId),
    BindBuffer(BufferTarget, Option<BufferId>),
    BufferData(BufferTarget, usize, BufferUsage),
    VertexLayout(i32),
    DrawElements(DrawMode, usize),
    DrawArrays(DrawMode, usize, usize),
    DrawClientElements(DrawMode, usize, usize),
    DrawClientArrays(DrawMode, usize),
    CreateTexture(TextureId),
    DeleteTexture(TextureId),
    ActiveTexture(u32),
    BindTexture(Option<TextureId>),
    TexImage2D { width: u32, height: u32 },
    TexParameter(TexParameter),
    CreateFramebuffer(FramebufferId),
    DeleteFramebuffer(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    FramebufferTexture(TextureId),
    CreateRenderbuffer(RenderbufferId),
    DeleteRenderbuffer(RenderbufferId),
    BindRenderbuffer(Option<RenderbufferId>),
    RenderbufferStorage(u32, u32),
    FramebufferRenderbuffer(RenderbufferId),
    CompileShader(ShaderStage),
    LinkProgram(ProgramId),
    DeleteShader(ShaderId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    Uniform(String, UniformValue),
    Decode(usize),
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<Call>,
    next_id: u32,
    locations: HashMap<u32, String>,
    hidden_uniforms: HashSet<String>,
    fail_compile: Option<String>,
    fail_link: bool,
    fail_texture: bool,
    fail_renderbuffer: bool,
    errors: Vec<u32>,
    pixel_word: u32,
}

impl MockState {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared call log handed out to every mock handler.
#[derive(Debug, Clone, Default)]
pub(crate) struct Recorder {
    state: Rc<RefCell<MockState>>,
}

impl Recorder {
    fn push(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    pub(crate) fn clear(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Names of uniforms set since the last clear, in call order.
    pub(crate) fn uniform_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Uniform(name, _) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn hide_uniform(&self, name: &str) {
        self.state.borrow_mut().hidden_uniforms.insert(name.into());
    }

    pub(crate) fn fail_compile_containing(&self, marker: &str) {
        self.state.borrow_mut().fail_compile = Some(marker.into());
    }

    pub(crate) fn fail_link(&self) {
        self.state.borrow_mut().fail_link = true;
    }

    pub(crate) fn fail_texture_creation(&self) {
        self.state.borrow_mut().fail_texture = true;
    }

    pub(crate) fn fail_renderbuffer_creation(&self) {
        self.state.borrow_mut().fail_renderbuffer = true;
    }

    pub(crate) fn push_error(&self, code: u32) {
        self.state.borrow_mut().errors.push(code);
    }

    pub(crate) fn set_pixel_word(&self, word: u32) {
        self.state.borrow_mut().pixel_word = word;
    }

    pub(crate) fn graphics(&self) -> MockGraphics {
        MockGraphics(self.clone())
    }

    pub(crate) fn textures(&self) -> MockTextures {
        MockTextures(self.clone())
    }

    pub(crate) fn programs(&self) -> MockPrograms {
        MockPrograms(self.clone())
    }

    pub(crate) fn bitmaps(&self) -> MockBitmaps {
        MockBitmaps(self.clone())
    }

    pub(crate) fn handlers(&self) -> Handlers {
        Handlers::new(self.graphics(), self.textures(), self.programs(), self.bitmaps())
    }
}

pub(crate) struct MockGraphics(Recorder);
pub(crate) struct MockTextures(Recorder);
pub(crate) struct MockPrograms(Recorder);
pub(crate) struct MockBitmaps(Recorder);

impl GraphicsHandler for MockGraphics {
    fn enable(&mut self, capability: Capability) {
        self.0.push(Call::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.0.push(Call::Disable(capability));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.0.push(Call::BlendFunc(src, dst));
    }

    fn apply_render_setting(&mut self, setting: &RenderSetting, changed: ChangeFlags) {
        self.0.push(Call::ApplySetting(setting.clone(), changed));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.0.push(Call::Clear(flags));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.0.push(Call::Viewport(x, y, width, height));
    }

    fn get_error(&mut self) -> Option<u32> {
        self.0.state.borrow_mut().errors.pop()
    }

    fn info(&mut self) -> BackendInfo {
        BackendInfo {
            vendor: "mock".into(),
            renderer: "recorder".into(),
            version: "0.0".into(),
            shading_language_version: "1.00".into(),
            max_texture_units: 8,
            max_texture_size: 4096,
        }
    }

    fn read_pixels(
        &mut self,
        _x: i32,
        _y: i32,
        width: i32,
        height: i32,
        format: PixelFormat,
        out: &mut [u8],
    ) {
        self.0.push(Call::ReadPixels(width, height, format));
        let word = self.0.state.borrow().pixel_word.to_ne_bytes();
        for chunk in out.chunks_exact_mut(4) {
            chunk.copy_from_slice(&word);
        }
    }

    fn create_buffer(&mut self) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.0.state.borrow_mut().next());
        self.0.push(Call::CreateBuffer(id));
        Ok(id)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.0.push(Call::DeleteBuffer(buffer));
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        self.0.push(Call::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.0.push(Call::BufferData(target, data.len(), usage));
    }

    fn set_vertex_layout(&mut self, layout: &VertexLayout) {
        self.0.push(Call::VertexLayout(layout.stride));
    }

    fn draw_elements(&mut self, mode: DrawMode, count: usize) {
        self.0.push(Call::DrawElements(mode, count));
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: usize, count: usize) {
        self.0.push(Call::DrawArrays(mode, first, count));
    }

    fn draw_client_elements(
        &mut self,
        mode: DrawMode,
        _layout: &VertexLayout,
        vertices: &[u8],
        indices: &[u16],
    ) {
        self.0
            .push(Call::DrawClientElements(mode, vertices.len(), indices.len()));
    }

    fn draw_client_arrays(&mut self, mode: DrawMode, _layout: &VertexLayout, vertices: &[u8]) {
        self.0.push(Call::DrawClientArrays(mode, vertices.len()));
    }
}

impl TextureHandler for MockTextures {
    fn create_texture(&mut self) -> Result<TextureId, ResourceError> {
        if self.0.state.borrow().fail_texture {
            return Err(ResourceError::Allocation("texture".into()));
        }
        let id = TextureId(self.0.state.borrow_mut().next());
        self.0.push(Call::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.0.push(Call::DeleteTexture(texture));
    }

    fn active_texture(&mut self, unit: u32) {
        self.0.push(Call::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, _target: TextureTarget, texture: Option<TextureId>) {
        self.0.push(Call::BindTexture(texture));
    }

    fn tex_image_2d(
        &mut self,
        _target: TextureTarget,
        width: u32,
        height: u32,
        _pixels: Option<&[u8]>,
    ) {
        self.0.push(Call::TexImage2D { width, height });
    }

    fn tex_parameter(&mut self, _target: TextureTarget, parameter: TexParameter) {
        self.0.push(Call::TexParameter(parameter));
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId, ResourceError> {
        let id = FramebufferId(self.0.state.borrow_mut().next());
        self.0.push(Call::CreateFramebuffer(id));
        Ok(id)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.0.push(Call::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.0.push(Call::BindFramebuffer(framebuffer));
    }

    fn framebuffer_texture_2d(&mut self, texture: TextureId) {
        self.0.push(Call::FramebufferTexture(texture));
    }

    fn create_renderbuffer(&mut self) -> Result<RenderbufferId, ResourceError> {
        if self.0.state.borrow().fail_renderbuffer {
            return Err(ResourceError::Allocation("renderbuffer".into()));
        }
        let id = RenderbufferId(self.0.state.borrow_mut().next());
        self.0.push(Call::CreateRenderbuffer(id));
        Ok(id)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        self.0.push(Call::DeleteRenderbuffer(renderbuffer));
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<RenderbufferId>) {
        self.0.push(Call::BindRenderbuffer(renderbuffer));
    }

    fn renderbuffer_storage(&mut self, width: u32, height: u32) {
        self.0.push(Call::RenderbufferStorage(width, height));
    }

    fn framebuffer_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        self.0.push(Call::FramebufferRenderbuffer(renderbuffer));
    }

    fn check_framebuffer_status(&mut self) -> Result<(), ResourceError> {
        Ok(())
    }
}

impl ProgramHandler for MockPrograms {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        self.0.push(Call::CompileShader(stage));
        let mut state = self.0.state.borrow_mut();
        if let Some(marker) = &state.fail_compile {
            if source.contains(marker.as_str()) {
                return Err(format!("ERROR: 0:1: rejected {marker}"));
            }
        }
        Ok(ShaderId(state.next()))
    }

    fn link_program(
        &mut self,
        _vertex: ShaderId,
        _fragment: ShaderId,
        _attributes: &[(u32, &str)],
    ) -> Result<ProgramId, String> {
        if self.0.state.borrow().fail_link {
            return Err("link failed".into());
        }
        let id = ProgramId(self.0.state.borrow_mut().next());
        self.0.push(Call::LinkProgram(id));
        Ok(id)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.0.push(Call::DeleteShader(shader));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.0.push(Call::DeleteProgram(program));
    }

    fn uniform_location(&mut self, _program: ProgramId, name: &str) -> Option<UniformLocation> {
        let mut state = self.0.state.borrow_mut();
        if state.hidden_uniforms.contains(name) {
            return None;
        }
        let id = state.next();
        state.locations.insert(id, name.to_string());
        Some(UniformLocation(id))
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.0.push(Call::UseProgram(program));
    }

    fn uniform_1i(&mut self, location: UniformLocation, value: i32) {
        self.uniform(location, UniformValue::Int(value));
    }

    fn uniform_1f(&mut self, location: UniformLocation, value: f32) {
        self.uniform(location, UniformValue::Float(value));
    }

    fn uniform_2f(&mut self, location: UniformLocation, value: [f32; 2]) {
        self.uniform(location, UniformValue::Vec2(value));
    }

    fn uniform_3f(&mut self, location: UniformLocation, value: [f32; 3]) {
        self.uniform(location, UniformValue::Vec3(value));
    }

    fn uniform_4f(&mut self, location: UniformLocation, value: [f32; 4]) {
        self.uniform(location, UniformValue::Vec4(value));
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &[f32; 16]) {
        self.uniform(location, UniformValue::Mat4(*value));
    }
}

impl MockPrograms {
    fn uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let name = self
            .0
            .state
            .borrow()
            .locations
            .get(&location.0)
            .cloned()
            .unwrap_or_default();
        self.0.push(Call::Uniform(name, value));
    }
}

impl BitmapHandler for MockBitmaps {
    /// Accepts `b"WxH"` and produces an opaque white bitmap of that size.
    fn decode(&mut self, encoded: &[u8]) -> Result<Bitmap, ResourceError> {
        self.0.push(Call::Decode(encoded.len()));
        let text = std::str::from_utf8(encoded).map_err(|e| ResourceError::Bitmap(e.to_string()))?;
        let (w, h) = text
            .split_once('x')
            .ok_or_else(|| ResourceError::Bitmap(format!("bad size {text:?}")))?;
        let parse = |s: &str| {
            s.parse::<u32>()
                .map_err(|e| ResourceError::Bitmap(e.to_string()))
        };
        Ok(Bitmap::solid(parse(w)?, parse(h)?, [255; 4]))
    }
}
