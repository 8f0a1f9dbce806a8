//! GLSL sources for the built-in program families.
//!
//! Bodies are written once in GLSL ES 1.00 style and specialized with
//! `#define`s per shading mode, texture count and particle type. The
//! platform prelude from [`Platform::shader_prelude`] is prepended to every
//! stage.

use crate::config::Platform;
use crate::material::ShadingMode;
use crate::mesh::ParticleType;
use crate::program::{ProgramDescriptor, Uniform};

/// Attribute bindings for blit programs, matching [`BlitVertex::LAYOUT`].
///
/// [`BlitVertex::LAYOUT`]: crate::BlitVertex::LAYOUT
pub const BLIT_ATTRIBUTES: &[(u32, &str)] = &[(0, "aPosition"), (1, "aTexCoord")];

/// Attribute bindings for particle programs, matching
/// [`ParticleVertex::LAYOUT`].
///
/// [`ParticleVertex::LAYOUT`]: crate::ParticleVertex::LAYOUT
pub const PARTICLE_ATTRIBUTES: &[(u32, &str)] = &[(0, "aPosition"), (1, "aColor"), (2, "aSize")];

/// Vertex stage shared by every blit program.
///
/// | Uniform        | Type   | Description                         |
/// |----------------|--------|-------------------------------------|
/// | `uPerspective` | `mat4` | Projection times scene rotation     |
/// | `uTranslate`   | `vec3` | Object translation                  |
/// | `uScale`       | `vec3` | Object scale                        |
/// | `uRotate`      | `vec3` | Euler angles in radians (X, Y, Z)   |
pub const BLIT_VERTEX_SRC: &str = r"
attribute vec3 aPosition;
attribute vec2 aTexCoord;

uniform mat4 uPerspective;
uniform vec3 uTranslate;
uniform vec3 uScale;
uniform vec3 uRotate;

varying vec2 vTexCoord;
varying vec3 vNormal;
varying vec3 vWorld;

mat3 rotation(vec3 angles) {
    vec3 c = cos(angles);
    vec3 s = sin(angles);
    mat3 rx = mat3(1.0, 0.0, 0.0, 0.0, c.x, s.x, 0.0, -s.x, c.x);
    mat3 ry = mat3(c.y, 0.0, -s.y, 0.0, 1.0, 0.0, s.y, 0.0, c.y);
    mat3 rz = mat3(c.z, s.z, 0.0, -s.z, c.z, 0.0, 0.0, 0.0, 1.0);
    return rz * ry * rx;
}

void main() {
    mat3 r = rotation(uRotate);
    vec3 world = r * (aPosition * uScale) + uTranslate;
    vTexCoord = aTexCoord;
    vNormal = r * vec3(0.0, 0.0, 1.0);
    vWorld = world;
    gl_Position = uPerspective * vec4(world, 1.0);
}
";

/// Fragment stage for blit programs, specialized by `MODE_*`, `TEXTURED`,
/// `TEXTURE_COUNT` and `BLUR_TAPS`.
pub const BLIT_FRAGMENT_SRC: &str = r"
uniform vec4 uDiffuse;

#ifdef TEXTURED
uniform sampler2D uTexture0;
#if TEXTURE_COUNT > 1
uniform sampler2D uTexture1;
#endif
#endif

#if defined(MODE_LAMBERT) || defined(MODE_PHONG)
uniform vec4 uAmbient;
uniform vec3 uLightPosition;
#endif
#if defined(MODE_LAMBERT) || defined(MODE_PHONG) || defined(MODE_LIT)
uniform vec3 uLightDirection;
#endif
#ifdef MODE_LIT
uniform vec4 uLightColor;
#endif
#ifdef MODE_PHONG
uniform vec4 uSpecular;
uniform float uShine;
#endif
#ifdef MODE_BLUR
uniform vec3 uBlur;
#endif

varying vec2 vTexCoord;
varying vec3 vNormal;
varying vec3 vWorld;

#ifdef TEXTURED
vec4 sampleTexture(vec2 uv) {
    vec4 color = texture2D(uTexture0, uv);
#if TEXTURE_COUNT > 1
    color *= texture2D(uTexture1, uv);
#endif
    return color;
}
#endif

void main() {
#if defined(MODE_COLORED)
    gl_FragColor = uDiffuse;
#elif defined(MODE_BLUR)
    vec2 dx = vec2(uBlur.x, 0.0);
    vec2 dy = vec2(0.0, uBlur.y);
    float side = (1.0 - uBlur.z) / float(BLUR_TAPS - 1);
    vec4 sum = sampleTexture(vTexCoord) * uBlur.z;
    sum += (sampleTexture(vTexCoord - dx) + sampleTexture(vTexCoord + dx)
          + sampleTexture(vTexCoord - dy) + sampleTexture(vTexCoord + dy)) * side;
#if BLUR_TAPS > 5
    sum += (sampleTexture(vTexCoord - dx - dy) + sampleTexture(vTexCoord + dx - dy)
          + sampleTexture(vTexCoord - dx + dy) + sampleTexture(vTexCoord + dx + dy)) * side;
#endif
    gl_FragColor = sum * uDiffuse;
#else
    vec4 base = sampleTexture(vTexCoord) * uDiffuse;
#if defined(MODE_UNLIT)
    gl_FragColor = base;
#elif defined(MODE_LIT)
    float intensity = max(dot(normalize(vNormal), -normalize(uLightDirection)), 0.0);
    gl_FragColor = vec4(base.rgb * uLightColor.rgb * intensity, base.a);
#else
    vec3 normal = normalize(vNormal);
    vec3 toLight = normalize(normalize(uLightPosition - vWorld) - normalize(uLightDirection));
    float lambert = max(dot(normal, toLight), 0.0);
    vec3 color = base.rgb * (uAmbient.rgb + lambert);
#if defined(MODE_PHONG)
    vec3 halfway = normalize(toLight + normalize(-vWorld));
    color += uSpecular.rgb * pow(max(dot(normal, halfway), 0.0), uShine);
#endif
    gl_FragColor = vec4(color, base.a);
#endif
#endif
}
";

/// Vertex stage for particle programs.
///
/// `uParticleData` is `[size scale, elapsed seconds, fade rate, user]`.
/// Image particles size themselves as a fraction of the viewport height.
pub const PARTICLE_VERTEX_SRC: &str = r"
attribute vec3 aPosition;
attribute vec4 aColor;
attribute float aSize;

uniform mat4 uPerspective;
uniform mat4 uModelView;
uniform vec4 uParticleData;
#ifdef PARTICLE_IMAGE
uniform vec2 uInverseViewport;
#endif

varying vec4 vColor;

void main() {
    gl_Position = uPerspective * (uModelView * vec4(aPosition, 1.0));
    float fade = clamp(1.0 - uParticleData.y * uParticleData.z, 0.0, 1.0);
    vColor = vec4(aColor.rgb, aColor.a * fade);
#ifdef PARTICLE_IMAGE
    gl_PointSize = aSize * uParticleData.x / uInverseViewport.y;
#else
    gl_PointSize = aSize * uParticleData.x;
#endif
}
";

/// Fragment stage for particle programs.
pub const PARTICLE_FRAGMENT_SRC: &str = r"
#ifdef PARTICLE_IMAGE
uniform sampler2D uTexture0;
#endif

varying vec4 vColor;

void main() {
#ifdef PARTICLE_IMAGE
    gl_FragColor = texture2D(uTexture0, gl_PointCoord) * vColor;
#else
    gl_FragColor = vColor;
#endif
}
";

/// Join prelude, defines and body into one stage source.
pub(crate) fn assemble(platform: Platform, fragment: bool, defines: &[String], body: &str) -> String {
    let mut source = String::from(platform.shader_prelude(fragment));
    for define in defines {
        source.push_str("#define ");
        source.push_str(define);
        source.push('\n');
    }
    source.push_str(body);
    source
}

/// Descriptor for the blit program of `mode` sampling `texture_count`
/// textures.
pub(crate) fn blit_program(
    platform: Platform,
    mode: ShadingMode,
    texture_count: usize,
) -> ProgramDescriptor {
    let mut defines = vec![
        format!("MODE_{}", mode.name().to_uppercase()),
        format!("TEXTURE_COUNT {texture_count}"),
    ];
    let mut required = vec![
        Uniform::Perspective,
        Uniform::Translate,
        Uniform::Scale,
        Uniform::Rotate,
        Uniform::Diffuse,
    ];

    if mode != ShadingMode::Colored {
        defines.push("TEXTURED".into());
        required.push(Uniform::Texture0);
        if texture_count > 1 {
            required.push(Uniform::Texture1);
        }
    }

    match mode {
        ShadingMode::Lambert => {
            required.extend([Uniform::Ambient, Uniform::LightDirection, Uniform::LightPosition]);
        }
        ShadingMode::Phong => required.extend([
            Uniform::Ambient,
            Uniform::Specular,
            Uniform::Shine,
            Uniform::LightDirection,
            Uniform::LightPosition,
        ]),
        ShadingMode::Lit => required.extend([Uniform::LightDirection, Uniform::LightColor]),
        ShadingMode::Blur5 | ShadingMode::Blur9 => {
            let taps = if mode == ShadingMode::Blur5 { 5 } else { 9 };
            defines.push("MODE_BLUR".into());
            defines.push(format!("BLUR_TAPS {taps}"));
            required.push(Uniform::Blur);
        }
        ShadingMode::Unlit | ShadingMode::Colored | ShadingMode::Custom(_) => {}
    }

    ProgramDescriptor {
        name: format!("blit/{}/{texture_count}", mode.name()),
        vertex_source: assemble(platform, false, &defines, BLIT_VERTEX_SRC),
        fragment_source: assemble(platform, true, &defines, BLIT_FRAGMENT_SRC),
        attributes: BLIT_ATTRIBUTES,
        required,
    }
}

/// Descriptor for the particle program of `particle_type`.
pub(crate) fn particle_program(platform: Platform, particle_type: ParticleType) -> ProgramDescriptor {
    let mut defines = Vec::new();
    let mut required = vec![Uniform::Perspective, Uniform::ModelView, Uniform::ParticleData];
    if particle_type == ParticleType::Image {
        defines.push("PARTICLE_IMAGE".to_string());
        required.extend([Uniform::Texture0, Uniform::InverseViewport]);
    }

    ProgramDescriptor {
        name: format!("particle/{}", particle_type.name()),
        vertex_source: assemble(platform, false, &defines, PARTICLE_VERTEX_SRC),
        fragment_source: assemble(platform, true, &defines, PARTICLE_FRAGMENT_SRC),
        attributes: PARTICLE_ATTRIBUTES,
        required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blit_sources_start_with_platform_version() {
        let desc = blit_program(Platform::Embedded, ShadingMode::Unlit, 1);
        assert!(desc.vertex_source.starts_with("#version 100"));
        assert!(desc.fragment_source.starts_with("#version 100"));

        let desc = blit_program(Platform::Desktop, ShadingMode::Unlit, 1);
        assert!(desc.vertex_source.starts_with("#version 140"));
    }

    #[test]
    fn blit_defines_select_mode_and_texture_count() {
        let desc = blit_program(Platform::Desktop, ShadingMode::Phong, 2);
        assert!(desc.fragment_source.contains("#define MODE_PHONG\n"));
        assert!(desc.fragment_source.contains("#define TEXTURE_COUNT 2\n"));
        assert!(desc.fragment_source.contains("#define TEXTURED\n"));
        assert_eq!(desc.name, "blit/phong/2");
    }

    #[test]
    fn colored_programs_do_not_sample() {
        let desc = blit_program(Platform::Desktop, ShadingMode::Colored, 1);
        assert!(!desc.fragment_source.contains("#define TEXTURED"));
        assert!(!desc.required.contains(&Uniform::Texture0));
    }

    #[test]
    fn second_sampler_required_only_for_two_textures() {
        let one = blit_program(Platform::Desktop, ShadingMode::Unlit, 1);
        let two = blit_program(Platform::Desktop, ShadingMode::Unlit, 2);
        assert!(!one.required.contains(&Uniform::Texture1));
        assert!(two.required.contains(&Uniform::Texture1));
    }

    #[test]
    fn mode_specific_requirements() {
        let phong = blit_program(Platform::Desktop, ShadingMode::Phong, 1).required;
        for u in [Uniform::Ambient, Uniform::Specular, Uniform::Shine, Uniform::LightPosition] {
            assert!(phong.contains(&u), "phong missing {u:?}");
        }
        let lit = blit_program(Platform::Desktop, ShadingMode::Lit, 1).required;
        assert!(lit.contains(&Uniform::LightColor));
        let blur9 = blit_program(Platform::Desktop, ShadingMode::Blur9, 1);
        assert!(blur9.required.contains(&Uniform::Blur));
        assert!(blur9.fragment_source.contains("#define BLUR_TAPS 9\n"));
    }

    #[test]
    fn image_particles_need_viewport_and_sampler() {
        let point = particle_program(Platform::Desktop, ParticleType::Point);
        let image = particle_program(Platform::Desktop, ParticleType::Image);
        assert!(!point.required.contains(&Uniform::InverseViewport));
        assert!(image.required.contains(&Uniform::InverseViewport));
        assert!(image.required.contains(&Uniform::Texture0));
        assert!(image.vertex_source.contains("#define PARTICLE_IMAGE\n"));
    }

    #[test]
    fn every_required_uniform_is_declared_in_the_sources() {
        let mut descriptors: Vec<ProgramDescriptor> = ShadingMode::ORDER
            .iter()
            .flat_map(|&mode| {
                [1, 2].map(|count| blit_program(Platform::Embedded, mode, count))
            })
            .collect();
        descriptors.extend(
            ParticleType::ORDER
                .iter()
                .map(|&t| particle_program(Platform::Embedded, t)),
        );

        for desc in &descriptors {
            for uniform in &desc.required {
                let name = uniform.name();
                assert!(
                    desc.vertex_source.contains(name) || desc.fragment_source.contains(name),
                    "{} requires {name} but never declares it",
                    desc.name
                );
            }
        }
    }
}
