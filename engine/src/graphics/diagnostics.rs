//! Link diagnostics for GPU programs

use crate::graphics::backend::GraphicsContext;
use crate::graphics::handles::GpuProgramHandle;

/// First line of every link diagnostic block
pub const LINK_FAILED_HEADER: &str = "ERROR: linking of GPU program failed.";
/// Marker preceding the linker's own log
pub const LINK_LOG_START: &str = "== Start of link log";
/// Marker following the linker's own log
pub const LINK_LOG_END: &str = "== End of link log";

/// Format the link log of `program` for embedding in larger log output
///
/// Returns an empty string when the program linked successfully. Otherwise
/// the linker's log is wrapped between [`LINK_LOG_START`] and
/// [`LINK_LOG_END`]. Only queries the context; nothing is mutated.
pub fn format_link_log<C>(ctx: &C, program: GpuProgramHandle) -> String
where
    C: GraphicsContext + ?Sized,
{
    if ctx.link_status(program) {
        return String::new();
    }

    let log_length = ctx.info_log_length(program);
    let log = ctx.program_info_log(program, log_length);

    let mut output = String::with_capacity(log.len() + 96);
    output.push_str(LINK_FAILED_HEADER);
    output.push('\n');
    output.push_str(LINK_LOG_START);
    output.push('\n');
    output.push_str(log.trim_end_matches('\0'));
    output.push('\n');
    output.push_str(LINK_LOG_END);
    output.push('\n');
    output
}
