use bytemuck::{Pod, Zeroable};

use crate::types::{Uniform, UniformValue};

/// CPU mirror of the `WaveParams` std140 block declared by the shader prologue.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct WaveUniforms {
    pub resolution: [f32; 2],
    pub mouse: [f32; 2],
    pub time: f32,
    pub mouse_influence: f32,
    pub _padding: [f32; 2],
}

impl WaveUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            mouse: [width as f32 / 2.0, height as f32 / 2.0],
            time: 0.0,
            mouse_influence: 1.0,
            _padding: [0.0; 2],
        }
    }

    /// Stores `value` in the slot for `uniform`; mismatched shapes are ignored.
    pub fn apply(&mut self, uniform: Uniform, value: UniformValue) -> bool {
        match (uniform, value) {
            (Uniform::Resolution, UniformValue::Vec2(x, y)) => self.resolution = [x, y],
            (Uniform::Mouse, UniformValue::Vec2(x, y)) => self.mouse = [x, y],
            (Uniform::Time, UniformValue::Float(value)) => self.time = value,
            (Uniform::MouseInfluence, UniformValue::Float(value)) => self.mouse_influence = value,
            _ => {
                tracing::warn!(uniform = uniform.name(), ?value, "uniform type mismatch");
                return false;
            }
        }
        true
    }
}
