//! WebGPU render context management
//!
//! Provides the main rendering context that manages the WebGPU device,
//! queue, and adapter for rendering operations, and implements
//! [`GraphicsContext`] on top of them. Surfaces are owned by the window
//! they belong to.
//!
//! wgpu has no separate link step, so "linking" a program builds a render
//! pipeline from its attached vertex and fragment modules. Validation errors
//! raised while doing so are captured with an error scope and become the
//! program's info log.

use crate::graphics::backend::{
    select_stages, truncate_log, GraphicsContext, GraphicsError, ViewportRect,
};
use crate::graphics::handles::{
    GpuProgramHandle, HandleAllocator, ShaderStageHandle, ShaderStageKind,
};
use crate::graphics::mesh::Vertex;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info};

/// Depth buffer format every program is linked against
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Errors that can occur while compiling a shader stage
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to compile {kind} stage '{label}':\n{message}")]
    Compile {
        label: String,
        kind: ShaderStageKind,
        message: String,
    },

    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

#[derive(Debug, Clone)]
struct CompiledStage {
    kind: ShaderStageKind,
    label: String,
    module: Arc<wgpu::ShaderModule>,
    entry_point: String,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    attached: Vec<CompiledStage>,
    pipeline: Option<wgpu::RenderPipeline>,
    info_log: String,
}

/// Main rendering context for the engine
///
/// This struct owns the WebGPU resources needed for rendering:
/// - Device and queue for GPU operations
/// - Adapter for capabilities queries
/// - Compiled shader stages and linked programs, addressed by handle
pub struct RenderContext {
    /// WebGPU instance
    pub instance: wgpu::Instance,
    /// WebGPU device for creating GPU resources
    pub device: Arc<wgpu::Device>,
    /// Command queue for submitting GPU work
    pub queue: Arc<wgpu::Queue>,
    /// WebGPU adapter for capability queries
    adapter: wgpu::Adapter,
    /// Adapter information for debugging
    pub adapter_info: wgpu::AdapterInfo,
    /// Color format programs render into
    target_format: wgpu::TextureFormat,
    ids: HandleAllocator,
    stages: HashMap<NonZeroU32, CompiledStage>,
    programs: HashMap<NonZeroU32, ProgramRecord>,
    viewport: Option<ViewportRect>,
}

impl RenderContext {
    /// Create a new render context
    ///
    /// This will request a device from the provided instance.
    /// Surface creation and configuration is handled separately.
    pub async fn new(
        instance: wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await?;

        let adapter_info = adapter.get_info();
        info!(
            gpu_name = %adapter_info.name,
            backend = ?adapter_info.backend,
            driver = %adapter_info.driver,
            driver_info = %adapter_info.driver_info,
            "GPU adapter selected"
        );

        // Request device and queue
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: Some("Render Device"),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self {
            instance,
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter,
            adapter_info,
            target_format: wgpu::TextureFormat::Bgra8UnormSrgb,
            ids: HandleAllocator::new(),
            stages: HashMap::new(),
            programs: HashMap::new(),
            viewport: None,
        })
    }

    /// Create initial surface configuration for a given surface
    pub fn create_surface_configuration(
        &self,
        surface: &wgpu::Surface,
        width: u32,
        height: u32,
    ) -> wgpu::SurfaceConfiguration {
        let surface_caps = surface.get_capabilities(&self.adapter);

        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.get_preferred_format(surface),
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    /// Get the preferred surface format for a given surface
    pub fn get_preferred_format(&self, surface: &wgpu::Surface) -> wgpu::TextureFormat {
        let surface_caps = surface.get_capabilities(&self.adapter);
        surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0])
    }

    /// Set the color format programs linked from now on render into
    pub fn set_target_format(&mut self, format: wgpu::TextureFormat) {
        self.target_format = format;
    }

    /// Create a command encoder for recording GPU commands
    pub fn create_command_encoder(&self, label: Option<&str>) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label })
    }

    /// Submit command buffers to the GPU queue
    pub fn submit<I: IntoIterator<Item = wgpu::CommandBuffer>>(&self, command_buffers: I) {
        self.queue.submit(command_buffers);
    }

    /// The last rectangle passed to [`GraphicsContext::set_viewport`]
    pub fn viewport(&self) -> Option<ViewportRect> {
        self.viewport
    }

    /// Render pipeline of a successfully linked program
    pub fn pipeline(&self, program: GpuProgramHandle) -> Option<&wgpu::RenderPipeline> {
        self.programs
            .get(&program.id())
            .and_then(|record| record.pipeline.as_ref())
    }

    /// Compile one WGSL shader stage
    ///
    /// Compilation errors are captured through a validation error scope and
    /// returned instead of reaching the device's uncaptured error handler.
    pub fn compile_stage(
        &mut self,
        kind: ShaderStageKind,
        label: &str,
        source: &str,
        entry_point: &str,
    ) -> Result<ShaderStageHandle, ShaderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ShaderError::Compile {
                label: label.to_string(),
                kind,
                message: error.to_string(),
            });
        }

        let id = self.ids.allocate().ok_or(GraphicsError::OutOfHandles)?;
        self.stages.insert(
            id,
            CompiledStage {
                kind,
                label: label.to_string(),
                module: Arc::new(module),
                entry_point: entry_point.to_string(),
            },
        );
        debug!(stage = id.get(), kind = %kind, label = label, "Compiled shader stage");
        Ok(ShaderStageHandle::from_raw(id, kind))
    }

    fn create_pipeline(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        attached: &[CompiledStage],
    ) -> Result<wgpu::RenderPipeline, String> {
        let (vertex, fragment) = select_stages(attached, |stage| stage.kind)?;
        let label = format!("{} + {}", vertex.label, fragment.label);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label.as_str()),
            // Derived from the shaders' own bindings
            layout: None,
            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some(vertex.entry_point.as_str()),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment.module,
                entry_point: Some(fragment.entry_point.as_str()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(pipeline),
        }
    }
}

impl GraphicsContext for RenderContext {
    fn create_program(&mut self) -> Result<GpuProgramHandle, GraphicsError> {
        let id = self.ids.allocate().ok_or(GraphicsError::OutOfHandles)?;
        self.programs.insert(id, ProgramRecord::default());
        Ok(GpuProgramHandle::from_raw(id))
    }

    fn attach_stage(&mut self, program: GpuProgramHandle, stage: &ShaderStageHandle) {
        let Some(compiled) = self.stages.get(&stage.id()) else {
            debug!(stage = stage.id().get(), "Attach of released stage ignored");
            return;
        };
        if let Some(record) = self.programs.get_mut(&program.id()) {
            record.attached.push(compiled.clone());
        }
    }

    fn link_program(&mut self, program: GpuProgramHandle) {
        let Some(record) = self.programs.get_mut(&program.id()) else {
            return;
        };
        match Self::create_pipeline(&self.device, self.target_format, &record.attached) {
            Ok(pipeline) => {
                record.pipeline = Some(pipeline);
                record.info_log.clear();
            }
            Err(log) => {
                record.pipeline = None;
                record.info_log = log;
            }
        }
    }

    fn link_status(&self, program: GpuProgramHandle) -> bool {
        self.pipeline(program).is_some()
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
        if let Some(compiled) = self.stages.remove(&stage.id()) {
            debug!(stage = stage.id().get(), label = %compiled.label, "Released shader stage");
        }
    }

    fn delete_program(&mut self, program: GpuProgramHandle) {
        self.programs.remove(&program.id());
    }

    fn set_viewport(&mut self, rect: ViewportRect) {
        self.viewport = Some(rect);
    }
}
