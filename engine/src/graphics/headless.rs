//! CPU-only graphics context
//!
//! Stands in for the GPU where no adapter is available (tests, CI). Stages
//! are described by the names of their interface variables; linking checks
//! that every fragment input is written by the vertex stage, which is the
//! same interface matching a real linker performs.

use crate::graphics::backend::{
    select_stages, truncate_log, GraphicsContext, GraphicsError, ViewportRect,
};
use crate::graphics::handles::{
    GpuProgramHandle, HandleAllocator, ShaderStageHandle, ShaderStageKind,
};
use std::collections::HashMap;
use std::num::NonZeroU32;
use tracing::debug;

#[derive(Debug, Clone)]
struct StageInterface {
    kind: ShaderStageKind,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    // Snapshot taken at attach time so that deleting a stage does not
    // invalidate a program it was attached to
    attached: Vec<StageInterface>,
    linked: bool,
    info_log: String,
}

/// Graphics context that keeps all state in memory
#[derive(Debug, Default)]
pub struct HeadlessContext {
    ids: HandleAllocator,
    stages: HashMap<NonZeroU32, StageInterface>,
    programs: HashMap<NonZeroU32, ProgramRecord>,
    viewport: Option<ViewportRect>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a "compiled" stage with the given interface variables
    pub fn create_stage(
        &mut self,
        kind: ShaderStageKind,
        inputs: &[&str],
        outputs: &[&str],
    ) -> Result<ShaderStageHandle, GraphicsError> {
        let id = self.ids.allocate().ok_or(GraphicsError::OutOfHandles)?;
        self.stages.insert(
            id,
            StageInterface {
                kind,
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                outputs: outputs.iter().map(|s| s.to_string()).collect(),
            },
        );
        debug!(stage = id.get(), kind = %kind, "Created headless stage");
        Ok(ShaderStageHandle::from_raw(id, kind))
    }

    /// Whether the stage with raw identifier `id` has not been released
    pub fn is_stage_live(&self, id: NonZeroU32) -> bool {
        self.stages.contains_key(&id)
    }

    /// Number of stages not yet released
    pub fn live_stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Whether `program` has been allocated and not deleted
    pub fn is_program_live(&self, program: GpuProgramHandle) -> bool {
        self.programs.contains_key(&program.id())
    }

    /// The last rectangle passed to [`GraphicsContext::set_viewport`]
    pub fn viewport(&self) -> Option<ViewportRect> {
        self.viewport
    }

    fn link(attached: &[StageInterface]) -> Result<(), String> {
        let (vertex, fragment) = select_stages(attached, |stage| stage.kind)?;

        let missing: Vec<String> = fragment
            .inputs
            .iter()
            .filter(|input| !vertex.outputs.contains(*input))
            .map(|input| format!("fragment input `{input}` is not written by the vertex stage"))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing.join("\n"))
        }
    }
}

impl GraphicsContext for HeadlessContext {
    fn create_program(&mut self) -> Result<GpuProgramHandle, GraphicsError> {
        let id = self.ids.allocate().ok_or(GraphicsError::OutOfHandles)?;
        self.programs.insert(id, ProgramRecord::default());
        Ok(GpuProgramHandle::from_raw(id))
    }

    fn attach_stage(&mut self, program: GpuProgramHandle, stage: &ShaderStageHandle) {
        let Some(interface) = self.stages.get(&stage.id()) else {
            debug!(stage = stage.id().get(), "Attach of released stage ignored");
            return;
        };
        if let Some(record) = self.programs.get_mut(&program.id()) {
            record.attached.push(interface.clone());
        }
    }

    fn link_program(&mut self, program: GpuProgramHandle) {
        let Some(record) = self.programs.get_mut(&program.id()) else {
            return;
        };
        match Self::link(&record.attached) {
            Ok(()) => {
                record.linked = true;
                record.info_log.clear();
            }
            Err(log) => {
                record.linked = false;
                record.info_log = log;
            }
        }
    }

    fn link_status(&self, program: GpuProgramHandle) -> bool {
        self.programs
            .get(&program.id())
            .is_some_and(|record| record.linked)
    }

    fn info_log_length(&self, program: GpuProgramHandle) -> usize {
        self.programs
            .get(&program.id())
            .map_or(0, |record| record.info_log.len())
    }

    fn program_info_log(&self, program: GpuProgramHandle, max_len: usize) -> String {
        self.programs
            .get(&program.id())
            .map(|record| truncate_log(&record.info_log, max_len))
            .unwrap_or_default()
    }

    fn delete_stage(&mut self, stage: ShaderStageHandle) {
        self.stages.remove(&stage.id());
    }

    fn delete_program(&mut self, program: GpuProgramHandle) {
        self.programs.remove(&program.id());
    }

    fn set_viewport(&mut self, rect: ViewportRect) {
        self.viewport = Some(rect);
    }
}
