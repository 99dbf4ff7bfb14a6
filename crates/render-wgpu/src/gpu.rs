use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use mirrorworld_common::{Rgb, Transform};
use mirrorworld_render::{
    BloomSettings, Camera, Frame, Geometry, NodeKind, Pass, Scene, ShadowFilter, ShadowMapMode,
};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub(crate) const MAX_INSTANCES: usize = 1024;

/// Extent of an unscaled character stand-in, feet at the origin.
const CHARACTER_EXTENT: Vec3 = Vec3::new(16.0, 48.0, 16.0);
const CHARACTER_COLOR: Rgb = Rgb(0x8a6d4b);

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct SceneUniforms {
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    ambient: [f32; 4],
    fog_color: [f32; 4],
    fog_range: [f32; 4],
    camera_pos: [f32; 4],
    shadow: [f32; 4],
    background: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct ShadowUniforms {
    pub light_view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct BlitUniforms {
    bloom: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

fn rgba(color: Rgb) -> [f32; 4] {
    let [r, g, b] = color.to_array();
    [r, g, b, 1.0]
}

/// Unit cube (24 vertices) followed by a unit XY quad (4 vertices).
pub(crate) fn geometry_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0],  [[-p, -p,  p], [ p, -p,  p], [ p,  p,  p], [-p,  p,  p]]),
        ([0.0, 0.0, -1.0], [[ p, -p, -p], [-p, -p, -p], [-p,  p, -p], [ p,  p, -p]]),
        ([1.0, 0.0, 0.0],  [[ p, -p,  p], [ p, -p, -p], [ p,  p, -p], [ p,  p,  p]]),
        ([-1.0, 0.0, 0.0], [[-p, -p, -p], [-p, -p,  p], [-p,  p,  p], [-p,  p, -p]]),
        ([0.0, 1.0, 0.0],  [[-p,  p,  p], [ p,  p,  p], [ p,  p, -p], [-p,  p, -p]]),
        ([0.0, -1.0, 0.0], [[-p, -p, -p], [ p, -p, -p], [ p, -p,  p], [-p, -p,  p]]),
    ];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut vertices = Vec::with_capacity(28);
    let mut indices = Vec::with_capacity(42);
    for (normal, corners) in faces {
        let base = vertices.len() as u16;
        for (position, uv) in corners.into_iter().zip(uvs) {
            vertices.push(Vertex {
                position,
                normal,
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    // Plane lives in its own index range with base vertex 0.
    for (position, uv) in [[-p, -p, 0.0], [p, -p, 0.0], [p, p, 0.0], [-p, p, 0.0]]
        .into_iter()
        .zip(uvs)
    {
        vertices.push(Vertex {
            position,
            normal: [0.0, 0.0, 1.0],
            uv,
        });
    }
    indices.extend_from_slice(&[0, 1, 2, 2, 3, 0]);
    (vertices, indices)
}

pub(crate) const CUBE_INDICES: std::ops::Range<u32> = 0..36;
pub(crate) const PLANE_INDICES: std::ops::Range<u32> = 36..42;
pub(crate) const PLANE_BASE_VERTEX: i32 = 24;

/// Per-frame instance list, boxes first then planes.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Instances {
    pub data: Vec<InstanceData>,
    pub boxes: u32,
    pub planes: u32,
    /// Instances (all boxes) that cast shadows, packed at the front.
    pub casters: u32,
}

fn instance(transform: &Transform, local: Mat4, color: Rgb, params: [f32; 4]) -> InstanceData {
    let world = Mat4::from_scale_rotation_translation(transform.scale, transform.rotation, transform.position);
    let cols = (world * local).to_cols_array_2d();
    InstanceData {
        model_0: cols[0],
        model_1: cols[1],
        model_2: cols[2],
        model_3: cols[3],
        color: rgba(color),
        params,
    }
}

pub(crate) fn collect_instances(scene: &Scene) -> Instances {
    let mut casters = Vec::new();
    let mut boxes = Vec::new();
    let mut planes = Vec::new();

    for node in scene.nodes() {
        let receive = if node.receive_shadow { 1.0 } else { 0.0 };
        match &node.kind {
            NodeKind::Mesh(mesh) => {
                let (repeat, patterned) = match &mesh.material.map {
                    Some(tex) => ([tex.repeat.x, tex.repeat.y], 1.0),
                    None => ([1.0, 1.0], 0.0),
                };
                let params = [repeat[0], repeat[1], receive, patterned];
                match mesh.geometry {
                    Geometry::Plane { width, height } => planes.push(instance(
                        &node.transform,
                        Mat4::from_scale(Vec3::new(width, height, 1.0)),
                        mesh.material.color,
                        params,
                    )),
                    Geometry::Box { size } => {
                        let data = instance(&node.transform, Mat4::from_scale(size), mesh.material.color, params);
                        if node.cast_shadow {
                            casters.push(data);
                        } else {
                            boxes.push(data);
                        }
                    }
                }
            }
            NodeKind::Character(_) => {
                let local = Mat4::from_translation(Vec3::new(0.0, CHARACTER_EXTENT.y * 0.5, 0.0))
                    * Mat4::from_scale(CHARACTER_EXTENT);
                let data = instance(&node.transform, local, CHARACTER_COLOR, [1.0, 1.0, receive, 0.0]);
                if node.cast_shadow {
                    casters.push(data);
                } else {
                    boxes.push(data);
                }
            }
            NodeKind::AmbientLight(_) | NodeKind::DirectionalLight(_) => {}
        }
    }

    let caster_count = casters.len() as u32;
    let box_count = (casters.len() + boxes.len()) as u32;
    let plane_count = planes.len() as u32;
    let mut data = casters;
    data.extend(boxes);
    data.extend(planes);
    if data.len() > MAX_INSTANCES {
        tracing::warn!(count = data.len(), max = MAX_INSTANCES, "instance list truncated");
        data.truncate(MAX_INSTANCES);
    }
    let boxes = box_count.min(MAX_INSTANCES as u32);
    Instances {
        planes: plane_count.min(MAX_INSTANCES as u32 - boxes),
        boxes,
        casters: caster_count.min(MAX_INSTANCES as u32),
        data,
    }
}

/// Light matrix for the first shadow-casting directional light, if any.
pub(crate) fn light_view_proj(scene: &Scene) -> Option<(Mat4, u32, u32)> {
    scene.nodes().iter().find_map(|node| {
        let NodeKind::DirectionalLight(light) = &node.kind else {
            return None;
        };
        let shadow = light.shadow?;
        let eye = node.transform.position;
        let up = if eye.normalize_or_zero().cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, up);
        let c = shadow.camera;
        let proj = Mat4::orthographic_rh(c.left, c.right, c.bottom, c.top, c.near, c.far);
        Some((proj * view, shadow.map_width.max(1), shadow.map_height.max(1)))
    })
}

pub(crate) fn scene_uniforms(scene: &Scene, camera: &Camera, shadow_mode: ShadowMapMode) -> SceneUniforms {
    let mut ambient = [0.0; 4];
    let mut light_dir = [0.0, 1.0, 0.0, 0.0];
    let mut light_color = [0.0; 4];
    for node in scene.nodes() {
        match &node.kind {
            NodeKind::AmbientLight(a) => {
                let [r, g, b] = a.color.to_array();
                ambient = [
                    ambient[0] + r * a.intensity,
                    ambient[1] + g * a.intensity,
                    ambient[2] + b * a.intensity,
                    1.0,
                ];
            }
            NodeKind::DirectionalLight(d) => {
                let dir = node.transform.position.normalize_or_zero();
                light_dir = [dir.x, dir.y, dir.z, d.intensity];
                light_color = rgba(d.color);
            }
            _ => {}
        }
    }

    let (light_matrix, shadow) = match light_view_proj(scene) {
        Some((m, w, h)) if shadow_mode.enabled => {
            let radius = match shadow_mode.filter {
                ShadowFilter::PcfSoft => 1.0,
                ShadowFilter::Basic | ShadowFilter::Pcf => 0.0,
            };
            (m, [1.0, radius, 1.0 / w as f32, 1.0 / h as f32])
        }
        _ => (Mat4::IDENTITY, [0.0; 4]),
    };

    let (fog_color, fog_range) = match scene.fog {
        Some(fog) => {
            let [r, g, b] = fog.color.to_array();
            ([r, g, b, 1.0], [fog.near, fog.far, 0.0, 0.0])
        }
        None => ([0.0; 4], [0.0; 4]),
    };
    let eye = camera.position();

    SceneUniforms {
        view_proj: camera.view_projection().to_cols_array_2d(),
        light_view_proj: light_matrix.to_cols_array_2d(),
        light_dir,
        light_color,
        ambient,
        fog_color,
        fog_range,
        camera_pos: [eye.x, eye.y, eye.z, 1.0],
        shadow,
        background: rgba(scene.background),
    }
}

pub(crate) fn blit_uniforms(bloom: Option<BloomSettings>) -> BlitUniforms {
    BlitUniforms {
        bloom: match bloom {
            Some(b) => [b.intensity, b.luminance_threshold, b.luminance_smoothing, 1.0],
            None => [0.0; 4],
        },
    }
}

/// Pixel block size requested by the chain, at least 1.
pub(crate) fn pixel_granularity(passes: &[Pass]) -> u32 {
    passes
        .iter()
        .find_map(|p| match p {
            Pass::Pixelation { granularity } => Some(*granularity),
            _ => None,
        })
        .unwrap_or(1)
        .max(1)
}

pub(crate) fn bloom_settings(passes: &[Pass]) -> Option<BloomSettings> {
    passes.iter().find_map(|p| match p {
        Pass::Bloom(b) => Some(*b),
        _ => None,
    })
}

pub(crate) fn clear_color(frame: &Frame<'_>) -> wgpu::Color {
    let [r, g, b] = frame.scene.background.to_array();
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
];

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
    7 => Float32x4,
    8 => Float32x4,
];

fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRIBUTES,
        },
    ]
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Pipelines and layouts, created once per surface.
pub(crate) struct Pipelines {
    pub scene: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
    pub blit: wgpu::RenderPipeline,
    pub scene_layout: wgpu::BindGroupLayout,
    pub shadow_layout: wgpu::BindGroupLayout,
    pub blit_layout: wgpu::BindGroupLayout,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, samples: u32) -> Self {
        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_bind_group_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });
        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layouts = vertex_layouts();

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let scene_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&scene_layout],
            push_constant_ranges: &[],
        });
        let scene = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&scene_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &scene_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &layouts,
            },
            fragment: Some(wgpu::FragmentState {
                module: &scene_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: samples,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        });

        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHADOW_SHADER.into()),
        });
        let shadow_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow_pipeline_layout"),
            bind_group_layouts: &[&shadow_layout],
            push_constant_ranges: &[],
        });
        let shadow = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&shadow_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_shadow"),
                compilation_options: Default::default(),
                buffers: &layouts,
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BLIT_SHADER.into()),
        });
        let blit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit_pipeline_layout"),
            bind_group_layouts: &[&blit_layout],
            push_constant_ranges: &[],
        });
        let blit = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blit_pipeline"),
            layout: Some(&blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &blit_shader,
                entry_point: Some("vs_blit"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &blit_shader,
                entry_point: Some("fs_blit"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: output_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: Default::default(),
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Self {
            scene,
            shadow,
            blit,
            scene_layout,
            shadow_layout,
            blit_layout,
        }
    }
}

pub(crate) fn create_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    samples: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: samples,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}
