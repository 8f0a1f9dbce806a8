//! Error taxonomy for the renderer.
//!
//! None of these errors are retried internally. A host that receives one is
//! expected to tear down the renderer and create a new one.

use thiserror::Error;

use crate::render::RendererState;

/// Convenience alias used throughout the crate.
pub type Result<T, E = RenderError> = std::result::Result<T, E>;

/// Top-level renderer error.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A lifecycle or frame call was made in the wrong renderer state.
    #[error("{operation} requires state {expected:?}, renderer is {actual:?}")]
    State {
        /// The offending call.
        operation: &'static str,
        /// The state the call requires.
        expected: RendererState,
        /// The state the renderer was actually in.
        actual: RendererState,
    },

    /// A GPU resource could not be created or prepared.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// An invalid enum value, index or missing reference was passed in.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The backend reported an error code at a coarse checkpoint.
    #[error("graphics backend reported error 0x{code:04X} at {checkpoint}")]
    Backend {
        /// Raw error code returned by the backend.
        code: u32,
        /// Where the probe was made.
        checkpoint: &'static str,
    },
}

/// Failures creating or preparing GPU resources.
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    /// A shader stage failed to compile.
    #[error("shader compile error in {program} ({stage}):\n{log}")]
    ShaderCompile {
        /// Name of the program being built.
        program: String,
        /// The failing stage (`"vertex"` or `"fragment"`).
        stage: &'static str,
        /// Driver info log, preceded by the line-numbered source.
        log: String,
    },

    /// A program failed to link.
    #[error("program link error in {program}:\n{log}")]
    ShaderLink {
        /// Name of the program being linked.
        program: String,
        /// Driver info log.
        log: String,
    },

    /// A uniform the program family requires was not found after linking.
    #[error("uniform {uniform} missing from program {program}")]
    MissingUniform {
        /// Name of the linked program.
        program: String,
        /// GLSL name of the uniform.
        uniform: &'static str,
    },

    /// A texture could not be made GPU-resident.
    #[error("texture preparation failed: {reason}")]
    TexturePreparation {
        /// What went wrong.
        reason: String,
    },

    /// A pixel source could not be decoded.
    #[error("bitmap decode failed: {0}")]
    Bitmap(String),

    /// The backend refused to allocate an object.
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// A framebuffer was not complete after its attachments were set.
    #[error("framebuffer incomplete (status 0x{0:04X})")]
    IncompleteFramebuffer(u32),
}

/// Prefix each line of `source` with its line number and append the driver
/// log, so compile errors can be matched against the GLSL.
pub(crate) fn format_shader_error(source: &str, log: &str) -> String {
    let line_count = source.lines().count();
    let width = line_count.max(1).to_string().len();

    let numbered = source
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    match (numbered.is_empty(), log.is_empty()) {
        (true, _) => log.to_string(),
        (false, true) => numbered,
        (false, false) => format!("{numbered}\n\n{log}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_error_names_operation_and_states() {
        let err = RenderError::State {
            operation: "begin_frame",
            expected: RendererState::Started,
            actual: RendererState::Created,
        };
        let msg = err.to_string();
        assert!(msg.contains("begin_frame"), "missing operation in: {msg}");
        assert!(msg.contains("Started"), "missing expected state in: {msg}");
        assert!(msg.contains("Created"), "missing actual state in: {msg}");
    }

    #[test]
    fn backend_error_formats_code_as_hex() {
        let err = RenderError::Backend {
            code: 0x0502,
            checkpoint: "startup",
        };
        assert_eq!(
            err.to_string(),
            "graphics backend reported error 0x0502 at startup"
        );
    }

    #[test]
    fn resource_error_converts_transparently() {
        let err: RenderError = ResourceError::MissingUniform {
            program: "blit/phong/1".into(),
            uniform: "uShine",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "uniform uShine missing from program blit/phong/1"
        );
    }

    #[test]
    fn shader_error_numbers_source_lines() {
        let formatted = format_shader_error("a\nb", "ERROR: 0:2");
        assert_eq!(formatted, "1: a\n2: b\n\nERROR: 0:2");
    }

    #[test]
    fn shader_error_pads_line_numbers() {
        let source = (0..10).map(|_| "x").collect::<Vec<_>>().join("\n");
        let formatted = format_shader_error(&source, "");
        assert!(formatted.starts_with(" 1: x"), "got: {formatted}");
        assert!(formatted.ends_with("10: x"), "got: {formatted}");
    }

    #[test]
    fn shader_error_empty_source_keeps_log() {
        assert_eq!(format_shader_error("", "log"), "log");
        assert_eq!(format_shader_error("", ""), "");
    }

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RenderError>();
    }
}
