//! Program compilation and the `(family, index) -> (program, uniforms)`
//! cache.
//!
//! Collections are built when the renderer is initialized and linked, in
//! index order, when it is started. Uniform locations are resolved once at
//! link time into fixed-position tables; a required uniform that the linker
//! did not keep fails startup instead of surfacing mid-frame.

use log::debug;

use crate::backend::{ProgramHandler, ProgramId, ShaderId, ShaderStage, UniformLocation};
use crate::config::Platform;
use crate::error::{format_shader_error, RenderError, ResourceError, Result};
use crate::material::{ShadingMode, MAX_TEXTURES};
use crate::mesh::ParticleType;
use crate::shaders;

/// Every uniform any built-in program uses, in table order.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Uniform {
    Perspective,
    ModelView,
    Translate,
    Scale,
    Rotate,
    Texture0,
    Texture1,
    Diffuse,
    Ambient,
    Specular,
    Shine,
    LightDirection,
    LightPosition,
    LightColor,
    Blur,
    ParticleData,
    InverseViewport,
}

impl Uniform {
    /// Number of table slots.
    pub const COUNT: usize = 17;

    /// All uniforms in table order.
    pub const ALL: [Uniform; Self::COUNT] = [
        Uniform::Perspective,
        Uniform::ModelView,
        Uniform::Translate,
        Uniform::Scale,
        Uniform::Rotate,
        Uniform::Texture0,
        Uniform::Texture1,
        Uniform::Diffuse,
        Uniform::Ambient,
        Uniform::Specular,
        Uniform::Shine,
        Uniform::LightDirection,
        Uniform::LightPosition,
        Uniform::LightColor,
        Uniform::Blur,
        Uniform::ParticleData,
        Uniform::InverseViewport,
    ];

    /// GLSL identifier.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Perspective => "uPerspective",
            Self::ModelView => "uModelView",
            Self::Translate => "uTranslate",
            Self::Scale => "uScale",
            Self::Rotate => "uRotate",
            Self::Texture0 => "uTexture0",
            Self::Texture1 => "uTexture1",
            Self::Diffuse => "uDiffuse",
            Self::Ambient => "uAmbient",
            Self::Specular => "uSpecular",
            Self::Shine => "uShine",
            Self::LightDirection => "uLightDirection",
            Self::LightPosition => "uLightPosition",
            Self::LightColor => "uLightColor",
            Self::Blur => "uBlur",
            Self::ParticleData => "uParticleData",
            Self::InverseViewport => "uInverseViewport",
        }
    }
}

/// Resolved uniform locations of one program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformTable {
    locations: [Option<UniformLocation>; Uniform::COUNT],
}

impl UniformTable {
    /// Location of `uniform`, `None` if the program does not use it.
    #[must_use]
    pub fn get(&self, uniform: Uniform) -> Option<UniformLocation> {
        self.locations[uniform as usize]
    }

    fn set(&mut self, uniform: Uniform, location: Option<UniformLocation>) {
        self.locations[uniform as usize] = location;
    }
}

/// Everything needed to build one program.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    /// Diagnostic name, e.g. `blit/phong/2`.
    pub name: String,
    /// Complete vertex stage source.
    pub vertex_source: String,
    /// Complete fragment stage source.
    pub fragment_source: String,
    /// Attribute bindings applied before linking.
    pub attributes: &'static [(u32, &'static str)],
    /// Uniforms that must survive linking.
    pub required: Vec<Uniform>,
}

/// A linked program and its uniform table.
#[derive(Debug, Clone)]
pub struct LinkedProgram {
    /// Backend handle.
    pub program: ProgramId,
    /// Resolved locations.
    pub uniforms: UniformTable,
}

fn compile_stage(
    programs: &mut dyn ProgramHandler,
    descriptor: &ProgramDescriptor,
    stage: ShaderStage,
) -> Result<ShaderId, ResourceError> {
    let source = match stage {
        ShaderStage::Vertex => &descriptor.vertex_source,
        ShaderStage::Fragment => &descriptor.fragment_source,
    };
    programs
        .compile_shader(stage, source)
        .map_err(|log| ResourceError::ShaderCompile {
            program: descriptor.name.clone(),
            stage: stage.name(),
            log: format_shader_error(source, &log),
        })
}

/// Compile, link and resolve the uniforms of one program.
///
/// Shader stages are deleted once the program is linked (or failed to).
pub(crate) fn build_program(
    programs: &mut dyn ProgramHandler,
    descriptor: &ProgramDescriptor,
) -> Result<LinkedProgram, ResourceError> {
    let vertex = compile_stage(programs, descriptor, ShaderStage::Vertex)?;
    let fragment = match compile_stage(programs, descriptor, ShaderStage::Fragment) {
        Ok(fragment) => fragment,
        Err(e) => {
            programs.delete_shader(vertex);
            return Err(e);
        }
    };

    let linked = programs.link_program(vertex, fragment, descriptor.attributes);
    programs.delete_shader(vertex);
    programs.delete_shader(fragment);
    let program = linked.map_err(|log| ResourceError::ShaderLink {
        program: descriptor.name.clone(),
        log,
    })?;

    let mut uniforms = UniformTable::default();
    for uniform in Uniform::ALL {
        uniforms.set(uniform, programs.uniform_location(program, uniform.name()));
    }
    if let Some(missing) = descriptor
        .required
        .iter()
        .find(|&&u| uniforms.get(u).is_none())
    {
        programs.delete_program(program);
        return Err(ResourceError::MissingUniform {
            program: descriptor.name.clone(),
            uniform: missing.name(),
        });
    }

    Ok(LinkedProgram { program, uniforms })
}

/// An ordered family of programs.
#[derive(Debug)]
pub struct ProgramCollection {
    family: &'static str,
    descriptors: Vec<ProgramDescriptor>,
    linked: Vec<LinkedProgram>,
}

impl ProgramCollection {
    /// Blit programs: every built-in shading mode for one texture, then the
    /// same modes again for two textures.
    #[must_use]
    pub fn blit(platform: Platform) -> Self {
        let descriptors = (1..=MAX_TEXTURES)
            .flat_map(|count| {
                ShadingMode::ORDER
                    .iter()
                    .map(move |&mode| shaders::blit_program(platform, mode, count))
            })
            .collect();
        Self::from_descriptors("blit", descriptors)
    }

    /// Particle programs, indexed by [`ParticleType::program_index`].
    #[must_use]
    pub fn particle(platform: Platform) -> Self {
        let descriptors = ParticleType::ORDER
            .iter()
            .map(|&t| shaders::particle_program(platform, t))
            .collect();
        Self::from_descriptors("particle", descriptors)
    }

    /// A collection over arbitrary descriptors; index order is list order.
    #[must_use]
    pub fn from_descriptors(family: &'static str, descriptors: Vec<ProgramDescriptor>) -> Self {
        Self {
            family,
            descriptors,
            linked: Vec::new(),
        }
    }

    /// Number of programs in the family.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the family has no programs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Whether every program has been linked.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !self.descriptors.is_empty() && self.linked.len() == self.descriptors.len()
    }

    /// Descriptors in index order.
    #[must_use]
    pub fn descriptors(&self) -> &[ProgramDescriptor] {
        &self.descriptors
    }

    /// Build every program in index order. Any failure is returned as-is;
    /// nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns the first compile, link or missing-uniform failure.
    pub fn load(&mut self, programs: &mut dyn ProgramHandler) -> Result<(), ResourceError> {
        self.linked.clear();
        for (index, descriptor) in self.descriptors.iter().enumerate() {
            let linked = build_program(programs, descriptor)?;
            debug!(
                "{} program {index} ({}) linked as {:?}",
                self.family, descriptor.name, linked.program
            );
            self.linked.push(linked);
        }
        Ok(())
    }

    /// Program and uniform table at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Argument`] for an index outside the family or
    /// a collection that has not been loaded.
    pub fn get(&self, index: usize) -> Result<&LinkedProgram> {
        self.linked.get(index).ok_or_else(|| {
            RenderError::Argument(format!(
                "{} program index {index} unavailable ({} linked)",
                self.family,
                self.linked.len()
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{Call, Recorder};

    #[test]
    fn uniform_table_order_matches_enum() {
        for (i, u) in Uniform::ALL.iter().enumerate() {
            assert_eq!(*u as usize, i);
        }
    }

    #[test]
    fn blit_collection_has_two_parallel_families() {
        let collection = ProgramCollection::blit(Platform::Desktop);
        assert_eq!(collection.len(), ShadingMode::BUILT_IN * MAX_TEXTURES);
        let names: Vec<&str> = collection
            .descriptors()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names[0], "blit/unlit/1");
        assert_eq!(names[4], "blit/colored/1");
        assert_eq!(names[7], "blit/unlit/2");
        assert_eq!(names[13], "blit/blur9/2");
    }

    #[test]
    fn load_links_in_index_order() {
        let recorder = Recorder::default();
        let mut programs = recorder.programs();
        let mut collection = ProgramCollection::particle(Platform::Embedded);
        assert!(!collection.is_loaded());

        collection.load(&mut programs).unwrap();
        assert!(collection.is_loaded());

        let linked: Vec<ProgramId> = recorder
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::LinkProgram(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(linked.len(), 2);
        assert_eq!(collection.get(0).unwrap().program, linked[0]);
        assert_eq!(collection.get(1).unwrap().program, linked[1]);
    }

    #[test]
    fn shaders_are_deleted_after_linking() {
        let recorder = Recorder::default();
        let mut collection = ProgramCollection::particle(Platform::Desktop);
        collection.load(&mut recorder.programs()).unwrap();
        assert_eq!(recorder.count(|c| matches!(c, Call::CompileShader(_))), 4);
        assert_eq!(recorder.count(|c| matches!(c, Call::DeleteShader(_))), 4);
    }

    #[test]
    fn missing_required_uniform_fails_load() {
        let recorder = Recorder::default();
        recorder.hide_uniform("uParticleData");
        let mut collection = ProgramCollection::particle(Platform::Desktop);
        let err = collection.load(&mut recorder.programs()).unwrap_err();
        match err {
            ResourceError::MissingUniform { program, uniform } => {
                assert_eq!(program, "particle/point");
                assert_eq!(uniform, "uParticleData");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!collection.is_loaded());
    }

    #[test]
    fn compile_failure_carries_numbered_source() {
        let recorder = Recorder::default();
        recorder.fail_compile_containing("PARTICLE_IMAGE");
        let mut collection = ProgramCollection::particle(Platform::Desktop);
        let err = collection.load(&mut recorder.programs()).unwrap_err();
        match err {
            ResourceError::ShaderCompile { program, stage, log } => {
                assert_eq!(program, "particle/image");
                assert_eq!(stage, "vertex");
                assert!(log.contains("1: #version 140"), "got: {log}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn link_failure_is_reported() {
        let recorder = Recorder::default();
        recorder.fail_link();
        let mut collection = ProgramCollection::particle(Platform::Desktop);
        let err = collection.load(&mut recorder.programs()).unwrap_err();
        assert!(matches!(err, ResourceError::ShaderLink { .. }));
        assert_eq!(recorder.count(|c| matches!(c, Call::DeleteShader(_))), 2);
    }

    #[test]
    fn get_out_of_range_is_argument_error() {
        let collection = ProgramCollection::particle(Platform::Desktop);
        assert!(matches!(collection.get(0), Err(RenderError::Argument(_))));
    }
}
