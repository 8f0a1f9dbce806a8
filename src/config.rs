//! Renderer configuration, decided once at process start.

/// The GL flavor the renderer targets.
///
/// Chosen by the platform adapter and passed to [`Renderer::new`]; nothing in
/// the crate probes the environment to pick one.
///
/// [`Renderer::new`]: crate::Renderer::new
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Platform {
    /// OpenGL ES 2.0 class devices, GLSL ES 1.00.
    Embedded,
    /// Desktop OpenGL 3.1+, GLSL 1.40.
    #[default]
    Desktop,
}

impl Platform {
    /// Lines prepended to every shader stage for this platform.
    ///
    /// Shader bodies are written in GLSL ES 1.00 style (`attribute`,
    /// `varying`, `texture2D`, `gl_FragColor`); on desktop those keywords
    /// are mapped onto their 1.40 equivalents.
    pub(crate) fn shader_prelude(self, fragment: bool) -> &'static str {
        match (self, fragment) {
            (Self::Embedded, false) => "#version 100\nprecision highp float;\n",
            (Self::Embedded, true) => "#version 100\nprecision mediump float;\n",
            (Self::Desktop, false) => {
                "#version 140\n#define attribute in\n#define varying out\n"
            }
            (Self::Desktop, true) => {
                "#version 140\n#define varying in\n#define texture2D texture\n\
                 out vec4 fragColor;\n#define gl_FragColor fragColor\n"
            }
        }
    }
}

/// Configuration threaded through the renderer.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Target GL flavor.
    pub platform: Platform,
    /// Probe the backend error flag after program loads and at startup.
    pub check_backend_errors: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            check_backend_errors: true,
        }
    }
}

impl RendererConfig {
    /// Configuration for the given platform with default checks.
    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_prelude_declares_precision() {
        let prelude = Platform::Embedded.shader_prelude(true);
        assert!(prelude.starts_with("#version 100"));
        assert!(prelude.contains("precision mediump float"));
    }

    #[test]
    fn desktop_fragment_prelude_maps_frag_color() {
        let prelude = Platform::Desktop.shader_prelude(true);
        assert!(prelude.starts_with("#version 140"));
        assert!(prelude.contains("#define gl_FragColor fragColor"));
        assert!(prelude.contains("#define varying in"));
    }

    #[test]
    fn desktop_vertex_prelude_maps_attribute() {
        let prelude = Platform::Desktop.shader_prelude(false);
        assert!(prelude.contains("#define attribute in"));
        assert!(prelude.contains("#define varying out"));
    }

    #[test]
    fn default_config_checks_errors() {
        let config = RendererConfig::default();
        assert!(config.check_backend_errors);
        assert_eq!(config.platform, Platform::Desktop);
        assert_eq!(
            RendererConfig::for_platform(Platform::Embedded).platform,
            Platform::Embedded
        );
    }
}
