/// Lit, shadowed and fogged scene geometry.
pub const SCENE_SHADER: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    // xyz: direction toward the light, w: intensity
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
    // rgb premultiplied by intensity
    ambient: vec4<f32>,
    // w: 1 when fog is on
    fog_color: vec4<f32>,
    fog_range: vec4<f32>,
    camera_pos: vec4<f32>,
    // x: enabled, y: kernel radius, zw: texel size
    shadow: vec4<f32>,
    background: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: SceneUniforms;
@group(0) @binding(1)
var shadow_map: texture_depth_2d;
@group(0) @binding(2)
var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
    // xy: texture repeat, z: receives shadow, w: patterned
    @location(8) params: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
    @location(4) params: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = u.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.uv = vertex.uv;
    out.color = instance.color;
    out.params = instance.params;
    return out;
}

fn hash(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(127.1, 311.7))) * 43758.5453);
}

// Stand-in for the grass texture: tinted tiles with per-tile variation.
fn ground_pattern(uv: vec2<f32>) -> vec3<f32> {
    let cell = floor(uv);
    let local = fract(uv);
    let n = hash(cell) * 0.5 + hash(floor(local * 8.0) + cell * 8.0) * 0.5;
    let dark = vec3<f32>(0.22, 0.38, 0.14);
    let light = vec3<f32>(0.36, 0.55, 0.22);
    return mix(dark, light, n);
}

fn shadow_factor(world_pos: vec3<f32>) -> f32 {
    let p = u.light_view_proj * vec4<f32>(world_pos, 1.0);
    let ndc = p.xyz / p.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, -ndc.y * 0.5 + 0.5);
    if (uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0 || ndc.z > 1.0) {
        return 1.0;
    }
    let depth = ndc.z - 0.002;
    let r = i32(u.shadow.y);
    var sum = 0.0;
    var count = 0.0;
    for (var x: i32 = -r; x <= r; x++) {
        for (var y: i32 = -r; y <= r; y++) {
            let offset = vec2<f32>(f32(x), f32(y)) * u.shadow.zw;
            sum += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, depth);
            count += 1.0;
        }
    }
    return sum / count;
}

const PI: f32 = 3.14159265;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var base = in.color.rgb;
    if (in.params.w > 0.5) {
        base = base * ground_pattern(in.uv * in.params.xy);
    }

    var visibility = 1.0;
    if (u.shadow.x > 0.5 && in.params.z > 0.5) {
        visibility = shadow_factor(in.world_pos);
    }

    let n = normalize(in.world_normal);
    let l = normalize(u.light_dir.xyz);
    let diffuse = max(dot(n, l), 0.0) * u.light_dir.w * visibility;
    let irradiance = u.ambient.rgb + u.light_color.rgb * diffuse;
    var color = base * irradiance / PI;

    if (u.fog_color.w > 0.5) {
        let d = distance(u.camera_pos.xyz, in.world_pos);
        let f = clamp((d - u.fog_range.x) / max(u.fog_range.y - u.fog_range.x, 0.0001), 0.0, 1.0);
        color = mix(color, u.fog_color.rgb, f);
    }
    return vec4<f32>(min(color, vec3<f32>(1.0)), 1.0);
}
"#;

/// Depth-only pass from the directional light.
pub const SHADOW_SHADER: &str = r#"
struct ShadowUniforms {
    light_view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> s: ShadowUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
    @location(8) params: vec4<f32>,
};

@vertex
fn vs_shadow(vertex: VertexInput, instance: InstanceInput) -> @builtin(position) vec4<f32> {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    return s.light_view_proj * model * vec4<f32>(vertex.position, 1.0);
}
"#;

/// Full-screen copy of the offscreen target with a luminance bloom boost.
pub const BLIT_SHADER: &str = r#"
struct BlitUniforms {
    // x: intensity, y: threshold, z: smoothing, w: enabled
    bloom: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> b: BlitUniforms;
@group(0) @binding(1)
var source: texture_2d<f32>;
@group(0) @binding(2)
var source_sampler: sampler;

struct BlitOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> BlitOutput {
    let corner = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: BlitOutput;
    out.clip_position = vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, 1.0 - corner.y);
    return out;
}

@fragment
fn fs_blit(in: BlitOutput) -> @location(0) vec4<f32> {
    var color = textureSample(source, source_sampler, in.uv).rgb;
    if (b.bloom.w > 0.5) {
        let luma = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
        let weight = smoothstep(b.bloom.y, b.bloom.y + max(b.bloom.z, 0.0001), luma);
        color = color + color * weight * b.bloom.x;
    }
    return vec4<f32>(min(color, vec3<f32>(1.0)), 1.0);
}
"#;
