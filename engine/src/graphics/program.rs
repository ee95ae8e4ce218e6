//! GPU program construction
//!
//! Links a vertex and a fragment stage into one program. Two flavours are
//! provided:
//!
//! - [`build_program`] is permissive: a link failure is logged as a warning
//!   and the (unusable) program is still returned together with its
//!   diagnostic, so a broken shader shows up in the log without taking the
//!   application down.
//! - [`build_program_strict`] turns a link failure into
//!   [`ProgramError::Link`] and deletes the broken program.
//!
//! In both cases the two stage handles are consumed and released before the
//! function returns, whatever the outcome.

use crate::graphics::backend::{GraphicsContext, GraphicsError};
use crate::graphics::diagnostics::format_link_log;
use crate::graphics::handles::{GpuProgramHandle, ShaderStageHandle, ShaderStageKind};
use tracing::{debug, info, warn};

/// Errors that can occur while building a GPU program
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("failed to allocate GPU program: {0}")]
    Allocation(#[from] GraphicsError),

    #[error("expected a {expected} stage, got a {actual} stage")]
    StageKind {
        expected: ShaderStageKind,
        actual: ShaderStageKind,
    },

    #[error("GPU program {program:?} failed to link\n{diagnostic}")]
    Link {
        program: GpuProgramHandle,
        diagnostic: String,
    },
}

/// Result of a permissive program build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramBuild {
    /// Allocated program; only usable when [`ProgramBuild::is_linked`]
    pub program: GpuProgramHandle,
    /// Formatted link diagnostic, present when linking failed
    pub link_log: Option<String>,
}

impl ProgramBuild {
    pub fn is_linked(&self) -> bool {
        self.link_log.is_none()
    }

    /// Convert a link failure into [`ProgramError::Link`]
    ///
    /// The program is not deleted; use [`build_program_strict`] for that.
    pub fn into_strict(self) -> Result<GpuProgramHandle, ProgramError> {
        match self.link_log {
            None => Ok(self.program),
            Some(diagnostic) => Err(ProgramError::Link {
                program: self.program,
                diagnostic,
            }),
        }
    }
}

/// Both stages of a program, owned until [`StagePair::release`]
struct StagePair {
    vertex: ShaderStageHandle,
    fragment: ShaderStageHandle,
}

impl StagePair {
    fn check_kinds(&self) -> Result<(), ProgramError> {
        for (stage, expected) in [
            (&self.vertex, ShaderStageKind::Vertex),
            (&self.fragment, ShaderStageKind::Fragment),
        ] {
            if stage.kind() != expected {
                return Err(ProgramError::StageKind {
                    expected,
                    actual: stage.kind(),
                });
            }
        }
        Ok(())
    }

    fn link<C>(&self, ctx: &mut C) -> Result<ProgramBuild, ProgramError>
    where
        C: GraphicsContext + ?Sized,
    {
        self.check_kinds()?;

        let program = ctx.create_program()?;
        ctx.attach_stage(program, &self.vertex);
        ctx.attach_stage(program, &self.fragment);
        ctx.link_program(program);

        if ctx.link_status(program) {
            info!(program = program.id().get(), "GPU program linked");
            return Ok(ProgramBuild {
                program,
                link_log: None,
            });
        }

        let diagnostic = format_link_log(ctx, program);
        warn!(program = program.id().get(), "{}", diagnostic);
        Ok(ProgramBuild {
            program,
            link_log: Some(diagnostic),
        })
    }

    fn release<C>(self, ctx: &mut C)
    where
        C: GraphicsContext + ?Sized,
    {
        debug!(
            vertex = self.vertex.id().get(),
            fragment = self.fragment.id().get(),
            "Releasing shader stages"
        );
        ctx.delete_stage(self.vertex);
        ctx.delete_stage(self.fragment);
    }
}

/// Link `vertex` and `fragment` into a new program, tolerating link failure
///
/// The returned handle is always a fresh allocation from `ctx`, but it is
/// only executable when [`ProgramBuild::is_linked`] holds. Errors are limited
/// to allocation failure and stages passed in the wrong slot. Both stages are
/// released on every path.
pub fn build_program<C>(
    ctx: &mut C,
    vertex: ShaderStageHandle,
    fragment: ShaderStageHandle,
) -> Result<ProgramBuild, ProgramError>
where
    C: GraphicsContext + ?Sized,
{
    let stages = StagePair { vertex, fragment };
    let outcome = stages.link(ctx);
    stages.release(ctx);
    outcome
}

/// Link `vertex` and `fragment`, failing with [`ProgramError::Link`] when the
/// program does not link
///
/// A program that fails to link is deleted before the error is returned.
pub fn build_program_strict<C>(
    ctx: &mut C,
    vertex: ShaderStageHandle,
    fragment: ShaderStageHandle,
) -> Result<GpuProgramHandle, ProgramError>
where
    C: GraphicsContext + ?Sized,
{
    let build = build_program(ctx, vertex, fragment)?;
    let program = build.program;
    build.into_strict().inspect_err(|_| ctx.delete_program(program))
}
