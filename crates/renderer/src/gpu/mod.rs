//! wgpu implementation of the renderer's graphics seam.
//!
//! - `context` owns the instance, device, and swapchain for one window.
//! - `pipeline` compiles the GLSL stages and links them into a render pipeline.
//! - `uniforms` mirrors the shader's uniform block on the CPU.
//!
//! [`WgpuContext`] glues these together behind [`GraphicsContext`] so the
//! surface manager can drive it exactly like a GL context.

mod context;
mod pipeline;
mod uniforms;

use wgpu::util::DeviceExt;

use crate::backend::{GraphicsContext, GraphicsError};
use crate::types::{ShaderStage, Size, Uniform, UniformValue};

pub(crate) use context::GpuContext;
use pipeline::{CompiledShader, WaveProgram};
use uniforms::WaveUniforms;

pub(crate) struct WgpuContext {
    gpu: GpuContext,
    current: Option<WaveProgram>,
    quad: Option<(wgpu::Buffer, u32)>,
    uniforms: WaveUniforms,
}

impl WgpuContext {
    pub(crate) fn new(gpu: GpuContext) -> Self {
        let uniforms = WaveUniforms::new(gpu.size.width, gpu.size.height);
        Self {
            gpu,
            current: None,
            quad: None,
            uniforms,
        }
    }

    fn render(&mut self) -> Result<(), GraphicsError> {
        let (Some(program), Some((quad, vertex_count))) = (self.current.as_ref(), self.quad.as_ref())
        else {
            return Err(GraphicsError::Draw("no program or geometry bound".into()));
        };

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface stale; reconfiguring and skipping frame");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!("surface timeout; skipping frame");
                return Ok(());
            }
            Err(err) => return Err(GraphicsError::Draw(err.to_string())),
        };

        self.gpu.queue.write_buffer(
            &program.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("wave encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("wave pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&program.pipeline);
            render_pass.set_bind_group(0, &program.bind_group, &[]);
            render_pass.set_vertex_buffer(0, quad.slice(..));
            render_pass.draw(0..*vertex_count, 0..1);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        tracing::trace!(
            width = self.gpu.size.width,
            height = self.gpu.size.height,
            "presented wave frame"
        );
        Ok(())
    }
}

impl GraphicsContext for WgpuContext {
    type Shader = CompiledShader;
    type Program = WaveProgram;
    type Location = Uniform;

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Self::Shader, GraphicsError> {
        pipeline::compile_shader(&self.gpu.device, stage, source)
    }

    fn link_program(
        &mut self,
        vertex: Self::Shader,
        fragment: Self::Shader,
    ) -> Result<Self::Program, GraphicsError> {
        pipeline::link_program(&self.gpu.device, self.gpu.format(), &vertex, &fragment)
    }

    fn use_program(&mut self, program: &Self::Program) {
        self.current = Some(program.clone());
    }

    fn upload_quad(&mut self, _program: &Self::Program, vertices: &[f32]) {
        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("wave quad"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.quad = Some((buffer, (vertices.len() / 2) as u32));
    }

    /// Every uniform lives in one std140 block, so the "location" is the
    /// uniform itself. Names the program's sources never declare stay inactive.
    fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<Self::Location> {
        Uniform::from_name(name).filter(|uniform| program.active.contains(uniform))
    }

    fn set_viewport(&mut self, size: Size) {
        self.gpu.resize(size);
    }

    fn set_uniform(&mut self, location: Self::Location, value: UniformValue) {
        self.uniforms.apply(location, value);
    }

    fn draw_quad(&mut self) -> Result<(), GraphicsError> {
        if self.gpu.is_lost() {
            return Err(GraphicsError::ContextLost);
        }
        self.render()
    }

    fn delete_program(&mut self, program: Self::Program) {
        program.uniform_buffer.destroy();
        self.current = None;
        if let Some((quad, _)) = self.quad.take() {
            quad.destroy();
        }
    }
}
