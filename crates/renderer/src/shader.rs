use crate::types::{ShaderStage, Uniform};

/// Full-viewport quad vertex shader (WebGL 1 dialect).
pub const WAVE_VERTEX_SHADER: &str = include_str!("../shaders/wave.vert");

/// Animated ocean/sunset fragment shader (WebGL 1 dialect).
pub const WAVE_FRAGMENT_SHADER: &str = include_str!("../shaders/wave.frag");

/// Two triangles as a strip covering clip space.
pub const QUAD_VERTICES: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

/// Translates WebGL 1 style GLSL into Vulkan GLSL that naga accepts.
///
/// Vertex sources get explicit `in` locations for their `attribute`s. Fragment
/// sources lose their `GL_ES` precision guard and loose uniform declarations;
/// [`FRAGMENT_HEADER`] re-declares the uniforms inside a std140 block and
/// remaps `gl_FragCoord`/`gl_FragColor` to the bottom-left convention WebGL uses.
pub(crate) fn wrap_for_vulkan(stage: ShaderStage, source: &str) -> String {
    match stage {
        ShaderStage::Vertex => wrap_vertex(source),
        ShaderStage::Fragment => wrap_fragment(source),
    }
}

fn wrap_vertex(source: &str) -> String {
    let mut wrapped = String::from("#version 450\n");
    let mut location = 0;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#version") || trimmed.starts_with("precision ") {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("attribute ") {
            wrapped.push_str(&format!("layout(location = {location}) in {rest}\n"));
            location += 1;
            continue;
        }
        wrapped.push_str(line);
        wrapped.push('\n');
    }
    wrapped
}

fn wrap_fragment(source: &str) -> String {
    let mut sanitized = String::new();
    let mut in_es_guard = false;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#version") {
            continue;
        }
        if trimmed.starts_with("#ifdef GL_ES") {
            in_es_guard = true;
            continue;
        }
        if in_es_guard {
            if trimmed.starts_with("#endif") {
                in_es_guard = false;
            }
            continue;
        }
        if trimmed.starts_with("precision ") {
            continue;
        }
        let declares_known_uniform = trimmed.starts_with("uniform ")
            && Uniform::ALL
                .iter()
                .any(|uniform| declared_name(trimmed) == Some(uniform.name()));
        if declares_known_uniform {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    format!("{FRAGMENT_HEADER}\n{sanitized}")
}

/// Known uniforms a WebGL source declares, in declaration order.
///
/// Mirrors GL's notion of an active uniform: anything the source never
/// declares has no location, even though the std140 block always carries it.
pub(crate) fn declared_uniforms(source: &str) -> Vec<Uniform> {
    source
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("uniform "))
        .filter_map(|line| declared_name(line).and_then(Uniform::from_name))
        .fold(Vec::new(), |mut found, uniform| {
            if !found.contains(&uniform) {
                found.push(uniform);
            }
            found
        })
}

fn declared_name(declaration: &str) -> Option<&str> {
    declaration
        .trim_end()
        .trim_end_matches(';')
        .split_whitespace()
        .last()
}

/// Prologue injected ahead of the wave fragment shader.
///
/// The block layout must match `WaveUniforms` in `gpu/uniforms.rs`.
const FRAGMENT_HEADER: &str = r"#version 450
layout(location = 0) out vec4 wave_frag_color;

layout(std140, set = 0, binding = 0) uniform WaveParams {
    vec2 _u_resolution;
    vec2 _u_mouse;
    float _u_time;
    float _u_mouseInfluence;
} ubo;

#define u_resolution ubo._u_resolution
#define u_mouse ubo._u_mouse
#define u_time ubo._u_time
#define u_mouseInfluence ubo._u_mouseInfluence

// wgpu rasterizes with a top-left origin; WebGL shaders expect bottom-left.
vec4 wave_frag_coord() {
    return vec4(gl_FragCoord.x, ubo._u_resolution.y - gl_FragCoord.y, gl_FragCoord.z, gl_FragCoord.w);
}

#define gl_FragCoord wave_frag_coord()
#define gl_FragColor wave_frag_color
";
