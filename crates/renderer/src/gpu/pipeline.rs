use std::borrow::Cow;

use crate::backend::GraphicsError;
use crate::shader::{declared_uniforms, wrap_for_vulkan};
use crate::types::{ShaderStage, Uniform};

use super::uniforms::WaveUniforms;

/// A compiled GLSL stage ready to be linked.
#[derive(Debug)]
pub(crate) struct CompiledShader {
    pub stage: ShaderStage,
    pub module: wgpu::ShaderModule,
    /// Uniforms the stage's source declares.
    pub uniforms: Vec<Uniform>,
}

/// Linked pipeline plus the uniform buffer it reads from.
#[derive(Debug, Clone)]
pub(crate) struct WaveProgram {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    /// Uniforms declared by either stage; the rest have no location.
    pub active: Vec<Uniform>,
}

pub(crate) fn compile_shader(
    device: &wgpu::Device,
    stage: ShaderStage,
    source: &str,
) -> Result<CompiledShader, GraphicsError> {
    let wrapped = wrap_for_vulkan(stage, source);
    let naga_stage = match stage {
        ShaderStage::Vertex => wgpu::naga::ShaderStage::Vertex,
        ShaderStage::Fragment => wgpu::naga::ShaderStage::Fragment,
    };

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(match stage {
            ShaderStage::Vertex => "wave vertex",
            ShaderStage::Fragment => "wave fragment",
        }),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped),
            stage: naga_stage,
            defines: &[],
        },
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(GraphicsError::Compile {
            stage,
            log: err.to_string(),
        });
    }
    Ok(CompiledShader {
        stage,
        module,
        uniforms: declared_uniforms(source),
    })
}

pub(crate) fn link_program(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    vertex: &CompiledShader,
    fragment: &CompiledShader,
) -> Result<WaveProgram, GraphicsError> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err(GraphicsError::Link {
            log: format!(
                "expected vertex and fragment stages, got {} and {}",
                vertex.stage, fragment.stage
            ),
        });
    }

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("wave uniform layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });
    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("wave uniforms"),
        size: std::mem::size_of::<WaveUniforms>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("wave uniform bind group"),
        layout: &uniform_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("wave pipeline layout"),
        bind_group_layouts: &[&uniform_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("wave pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vertex.module,
            entry_point: Some("main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: (2 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x2],
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &fragment.module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    });

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(GraphicsError::Link {
            log: err.to_string(),
        });
    }

    let mut active = vertex.uniforms.clone();
    for uniform in &fragment.uniforms {
        if !active.contains(uniform) {
            active.push(*uniform);
        }
    }

    Ok(WaveProgram {
        pipeline,
        uniform_buffer,
        bind_group,
        active,
    })
}
