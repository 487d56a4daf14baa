//! wgpu Device
//!
//! An offscreen [`GpuDevice`] on top of wgpu. Every call is applied through
//! the queue in program order: buffer and texture writes are staged on the
//! queue, and each render pass is encoded and submitted on its own so a
//! repack of the uniform arena between passes is observed by the next pass
//! only.
//!
//! # Shader interface
//!
//! Program sources are WGSL with `vs_main` / `fs_main` entry points and a
//! fixed binding scheme derived from [`ProgramInterface`]:
//!
//! - `@group(0) @binding(b)`: uniform block `b`, bound from its offset to
//!   the end of the arena so shaders may declare arrays at full length
//! - `@group(1) @binding(2 * unit)`: texture on `unit`, `@binding(2 * unit + 1)` its sampler
//! - `@group(2) @binding(0)`: loose parameters as one struct, every member
//!   `@align(16)`, in declaration order
//!
//! User clip distances are left to the shaders (fragment discard against the
//! clip-plane block), so [`PipelineState::clip_distance`] carries no state here.
//! A block the draw does not bind reads as zeros, which a clip plane treats
//! as "keep everything".
//!
//! The `Screen` target is an offscreen RGBA8 color texture with its own
//! depth buffer, sized at creation.

use std::borrow::Cow;
use std::num::NonZeroU64;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::buffer::align;
use super::device::{
    Attachment, BlendMode, BufferKind, ClearFlags, CompareFunction, DeviceInfo, DeviceLimits, DrawCall, FilterMode,
    FramebufferDesc, FramebufferId, FramebufferStatus, GpuBufferId, GpuDevice, ParamValue, PipelineState,
    ProgramBuild, ProgramId, ProgramInterface, ProgramSource, RenderPass, RenderTarget, SamplerDesc, SamplerKind,
    TextureDesc, TextureDimension, TextureFormat, TextureId, VertexArrayDesc, VertexArrayId, WrapMode,
    check_framebuffer,
};
use crate::errors::{Result, TidalError};

const BLIT_SHADER: &str = r"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0), 0.0, 1.0);
    out.uv = uv;
    return out;
}

@group(0) @binding(0) var source: texture_2d<f32>;
@group(0) @binding(1) var source_sampler: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(source, source_sampler, in.uv);
}
";

/// Size of one loose-parameter slot; matrices take four.
const PARAM_SLOT: u32 = 16;

/// Zeroed block bound where a draw leaves a program's uniform block unset.
const FALLBACK_UNIFORM_SIZE: u64 = 8192;

// ============================================================================
// Resource records
// ============================================================================

struct WgpuBuffer {
    buffer: wgpu::Buffer,
}

struct WgpuTexture {
    desc: TextureDesc,
    texture: wgpu::Texture,
    /// Every level and layer, as shaders sample it.
    sample_view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

struct WgpuFramebuffer {
    desc: FramebufferDesc,
    status: FramebufferStatus,
}

struct WgpuProgram {
    name: String,
    module: wgpu::ShaderModule,
    interface: ProgramInterface,
    layouts: [wgpu::BindGroupLayout; 3],
    pipeline_layout: wgpu::PipelineLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VertexLayoutKey {
    stride: u32,
    /// (location, components, offset from the first attribute)
    attributes: SmallVec<[(u32, u8, u32); 4]>,
}

impl VertexLayoutKey {
    /// Splits absolute attribute offsets into a buffer base and relative
    /// offsets.
    fn from_desc(desc: &VertexArrayDesc) -> (Self, u64) {
        let base = desc.attributes.iter().map(|a| a.offset).min().unwrap_or(0);
        let stride = desc.attributes.first().map_or(0, |a| a.stride);
        let attributes = desc
            .attributes
            .iter()
            .map(|a| (a.location, a.components, a.offset - base))
            .collect();
        (Self { stride, attributes }, u64::from(base))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    vertex: VertexLayoutKey,
    colors: SmallVec<[wgpu::TextureFormat; 4]>,
    depth: Option<wgpu::TextureFormat>,
    state: PipelineState,
}

/// A draw with its pipeline and bind groups resolved, ready to encode.
struct PreparedDraw {
    pipeline: wgpu::RenderPipeline,
    groups: [wgpu::BindGroup; 3],
    vertex_array: VertexArrayId,
    vertex_base: u64,
    first_index: u32,
    index_count: u32,
}

/// Attachment views and formats resolved for one pass.
struct PassTarget {
    colors: SmallVec<[wgpu::TextureView; 4]>,
    color_formats: SmallVec<[wgpu::TextureFormat; 4]>,
    depth: Option<(wgpu::TextureView, wgpu::TextureFormat)>,
}

// ============================================================================
// Device
// ============================================================================

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    info: DeviceInfo,
    limits: DeviceLimits,

    buffers: Vec<WgpuBuffer>,
    textures: Vec<WgpuTexture>,
    framebuffers: Vec<WgpuFramebuffer>,
    programs: Vec<WgpuProgram>,
    vertex_arrays: Vec<VertexArrayDesc>,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,

    screen_color: wgpu::Texture,
    screen_depth: wgpu::Texture,
    /// Bound on units a draw leaves empty, one per sampler kind.
    fallback_color: TextureId,
    fallback_depth: TextureId,
    fallback_cube: TextureId,
    fallback_uniform: wgpu::Buffer,

    mipmaps: MipmapGenerator,
}

impl WgpuDevice {
    /// Requests an adapter and device and creates a `width` x `height`
    /// offscreen screen target.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        pollster::block_on(Self::new_async(width, height))
    }

    pub async fn new_async(width: u32, height: u32) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| TidalError::AdapterRequestFailed(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Tidal Device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        let adapter_info = adapter.get_info();
        let info = DeviceInfo {
            name: adapter_info.name.clone(),
            vendor: format!("{:#06x}", adapter_info.vendor),
            api_version: adapter_info.driver_info.clone(),
            backend: format!("{:?}", adapter_info.backend),
            extensions: vec![format!("{:?}", device.features())],
        };
        let device_limits = device.limits();
        let limits = DeviceLimits {
            max_uniform_block_size: u32::try_from(device_limits.max_uniform_buffer_binding_size).unwrap_or(u32::MAX),
            uniform_offset_alignment: device_limits.min_uniform_buffer_offset_alignment,
        };

        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let screen_color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Screen Color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let screen_depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Screen Depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let fallback_uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Fallback Uniform Block"),
            size: FALLBACK_UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM,
            mapped_at_creation: false,
        });
        let mipmaps = MipmapGenerator::new(&device);

        let mut this = Self {
            device,
            queue,
            info,
            limits,
            buffers: Vec::new(),
            textures: Vec::new(),
            framebuffers: Vec::new(),
            programs: Vec::new(),
            vertex_arrays: Vec::new(),
            pipelines: FxHashMap::default(),
            screen_color,
            screen_depth,
            fallback_color: TextureId(0),
            fallback_depth: TextureId(0),
            fallback_cube: TextureId(0),
            fallback_uniform,
            mipmaps,
        };
        this.create_fallbacks();
        Ok(this)
    }

    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The texture `Screen` passes draw into.
    #[must_use]
    pub fn screen_texture(&self) -> &wgpu::Texture {
        &self.screen_color
    }

    /// The wgpu texture behind `texture`.
    #[must_use]
    pub fn texture(&self, texture: TextureId) -> Option<&wgpu::Texture> {
        self.textures.get(texture.index()).map(|t| &t.texture)
    }

    fn create_fallbacks(&mut self) {
        let white = TextureDesc::new_2d("Fallback Color", TextureFormat::Rgba8Unorm, 1, 1, SamplerDesc::NEAREST);
        self.fallback_color = self.create_texture(&white);
        self.write_texture(self.fallback_color, 0, 0, &[255; 4]);

        let depth = TextureDesc::new_2d("Fallback Depth", TextureFormat::Depth32Float, 1, 1, SamplerDesc::NEAREST);
        self.fallback_depth = self.create_texture(&depth);

        let mut cube = TextureDesc::new_2d("Fallback Cube", TextureFormat::Rgba8Unorm, 1, 1, SamplerDesc::TARGET);
        cube.dimension = TextureDimension::Cube;
        self.fallback_cube = self.create_texture(&cube);
        for face in 0..6 {
            self.write_texture(self.fallback_cube, face, 0, &[0, 0, 0, 255]);
        }
    }

    fn create_sampler(&self, desc: &TextureDesc) -> wgpu::Sampler {
        let sampler = desc.sampler;
        // depth is read unfiltered
        let filter = match (desc.format.is_depth(), sampler.filter) {
            (true, _) | (false, FilterMode::Nearest) => wgpu::FilterMode::Nearest,
            (false, FilterMode::Linear) => wgpu::FilterMode::Linear,
        };
        let mipmap_filter = if sampler.mipmaps && !desc.format.is_depth() {
            wgpu::MipmapFilterMode::Linear
        } else {
            wgpu::MipmapFilterMode::Nearest
        };
        let address = match sampler.wrap {
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
            WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        };
        self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(desc.label.as_ref()),
            address_mode_u: address,
            address_mode_v: address,
            address_mode_w: address,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter,
            ..Default::default()
        })
    }

    fn attachment_view(&self, attachment: Attachment) -> Option<(wgpu::TextureView, wgpu::TextureFormat)> {
        let tex = self.textures.get(attachment.texture.index())?;
        let view = tex.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Attachment"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_mip_level: attachment.mip_level,
            mip_level_count: Some(1),
            base_array_layer: 0,
            array_layer_count: Some(1),
            ..Default::default()
        });
        Some((view, texture_format(tex.desc.format)))
    }

    fn resolve_target(&self, target: &RenderTarget) -> Option<PassTarget> {
        match target {
            RenderTarget::Screen => {
                let mut colors = SmallVec::new();
                colors.push(self.screen_color.create_view(&wgpu::TextureViewDescriptor::default()));
                Some(PassTarget {
                    colors,
                    color_formats: SmallVec::from_slice(&[wgpu::TextureFormat::Rgba8Unorm]),
                    depth: Some((
                        self.screen_depth.create_view(&wgpu::TextureViewDescriptor::default()),
                        wgpu::TextureFormat::Depth32Float,
                    )),
                })
            }
            RenderTarget::Framebuffer { id, draw_buffers } => {
                let fb = self.framebuffers.get(id.index())?;
                if !fb.status.is_complete() {
                    log::warn!("Skipping pass into incomplete framebuffer '{}': {}", fb.desc.label, fb.status);
                    return None;
                }
                let mut colors = SmallVec::new();
                let mut color_formats = SmallVec::new();
                for &slot in draw_buffers {
                    let (view, format) = self.attachment_view(*fb.desc.colors.get(slot as usize)?)?;
                    colors.push(view);
                    color_formats.push(format);
                }
                let depth = match fb.desc.depth {
                    Some(attachment) => Some(self.attachment_view(attachment)?),
                    None => None,
                };
                Some(PassTarget {
                    colors,
                    color_formats,
                    depth,
                })
            }
        }
    }

    fn pipeline_for(&mut self, key: &PipelineKey) -> Option<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.pipelines.get(key) {
            return Some(pipeline.clone());
        }
        let program = self.programs.get(key.program.index())?;

        let attributes: SmallVec<[wgpu::VertexAttribute; 4]> = key
            .vertex
            .attributes
            .iter()
            .map(|&(location, components, offset)| wgpu::VertexAttribute {
                format: vertex_format(components),
                offset: u64::from(offset),
                shader_location: location,
            })
            .collect();
        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: u64::from(key.vertex.stride),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        let blend = blend_state(key.state.blend);
        let targets: SmallVec<[Option<wgpu::ColorTargetState>; 4]> = key
            .colors
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let depth_stencil = key.depth.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: key.state.depth_write,
            depth_compare: key.state.depth_test.map_or(wgpu::CompareFunction::Always, compare_function),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let label = format!("{} Pipeline", program.name);
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&program.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &program.module,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.module,
                entry_point: Some("fs_main"),
                targets: &targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipelines.insert(key.clone(), pipeline.clone());
        Some(pipeline)
    }

    /// Packs a draw's loose parameters in the program's declaration order.
    fn pack_params(interface: &ProgramInterface, draw: &DrawCall, out: &mut Vec<u8>) {
        for name in &interface.params {
            let start = out.len();
            match draw.param_value(name) {
                Some(ParamValue::Int(v)) => out.extend_from_slice(bytemuck::bytes_of(&v)),
                Some(ParamValue::Float(v)) => out.extend_from_slice(bytemuck::bytes_of(&v)),
                Some(ParamValue::Vec2(v)) => out.extend_from_slice(bytemuck::bytes_of(&v)),
                Some(ParamValue::Vec3(v)) => out.extend_from_slice(bytemuck::bytes_of(&v)),
                Some(ParamValue::Vec4(v)) => out.extend_from_slice(bytemuck::bytes_of(&v)),
                Some(ParamValue::Mat4(m)) => out.extend_from_slice(bytemuck::bytes_of(&m)),
                None => log::warn!("Draw leaves parameter '{name}' unset"),
            }
            let written = (out.len() - start) as u32;
            let padded = align(written.max(1), PARAM_SLOT);
            out.resize(start + padded as usize, 0);
        }
    }

    fn bind_groups(&self, program: &WgpuProgram, draw: &DrawCall, params: Option<(&wgpu::Buffer, u64, u64)>) -> Option<[wgpu::BindGroup; 3]> {
        let mut uniform_entries = Vec::with_capacity(program.interface.uniform_blocks.len());
        for &binding in &program.interface.uniform_blocks {
            let (buffer, offset, size) = match draw.uniform_blocks.iter().find(|b| b.binding == binding) {
                Some(block) => {
                    let buffer = &self.buffers.get(block.buffer.index())?.buffer;
                    let offset = u64::from(block.range.offset);
                    let size = buffer.size().saturating_sub(offset).max(u64::from(block.range.size));
                    (buffer, offset, size)
                }
                None => (&self.fallback_uniform, 0, FALLBACK_UNIFORM_SIZE),
            };
            uniform_entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset,
                    size: NonZeroU64::new(size),
                }),
            });
        }

        let mut texture_entries = Vec::with_capacity(program.interface.samplers.len() * 2);
        for slot in &program.interface.samplers {
            let fallback = match slot.kind {
                SamplerKind::Color2d => self.fallback_color,
                SamplerKind::Depth2d => self.fallback_depth,
                SamplerKind::Cube => self.fallback_cube,
            };
            let id = draw.texture_at(slot.unit).unwrap_or(fallback);
            let tex = self.textures.get(id.index())?;
            texture_entries.push(wgpu::BindGroupEntry {
                binding: slot.unit * 2,
                resource: wgpu::BindingResource::TextureView(&tex.sample_view),
            });
            texture_entries.push(wgpu::BindGroupEntry {
                binding: slot.unit * 2 + 1,
                resource: wgpu::BindingResource::Sampler(&tex.sampler),
            });
        }

        let mut param_entries = Vec::with_capacity(1);
        if let Some((buffer, offset, size)) = params {
            param_entries.push(wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset,
                    size: NonZeroU64::new(size),
                }),
            });
        }

        let create = |layout: &wgpu::BindGroupLayout, entries: &[wgpu::BindGroupEntry<'_>]| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: None,
                layout,
                entries,
            })
        };
        Some([
            create(&program.layouts[0], &uniform_entries),
            create(&program.layouts[1], &texture_entries),
            create(&program.layouts[2], &param_entries),
        ])
    }
}

// ============================================================================
// GpuDevice
// ============================================================================

impl GpuDevice for WgpuDevice {
    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }

    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn create_buffer(&mut self, label: &str, size: u32, kind: BufferKind) -> GpuBufferId {
        let usage = match kind {
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: u64::from(align(size.max(4), 4)),
            usage,
            mapped_at_creation: false,
        });
        self.buffers.push(WgpuBuffer { buffer });
        GpuBufferId(self.buffers.len() as u32 - 1)
    }

    fn write_buffer(&mut self, buffer: GpuBufferId, offset: u32, data: &[u8]) {
        let Some(target) = self.buffers.get(buffer.index()) else {
            log::error!("write_buffer: unknown buffer {buffer:?}");
            return;
        };
        if data.is_empty() {
            return;
        }
        // queue writes go in 4-byte units
        let padded_len = align(data.len() as u32, 4) as usize;
        if padded_len == data.len() {
            self.queue.write_buffer(&target.buffer, u64::from(offset), data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(padded_len, 0);
            self.queue.write_buffer(&target.buffer, u64::from(offset), &padded);
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> TextureId {
        let format = texture_format(desc.format);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label.as_ref()),
            size: wgpu::Extent3d {
                width: desc.width.max(1),
                height: desc.height.max(1),
                depth_or_array_layers: desc.layers(),
            },
            mip_level_count: desc.mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view_dimension = match desc.dimension {
            TextureDimension::D2 => wgpu::TextureViewDimension::D2,
            TextureDimension::Cube => wgpu::TextureViewDimension::Cube,
        };
        let sample_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(desc.label.as_ref()),
            dimension: Some(view_dimension),
            ..Default::default()
        });
        let sampler = self.create_sampler(desc);
        self.textures.push(WgpuTexture {
            desc: desc.clone(),
            texture,
            sample_view,
            sampler,
        });
        TextureId(self.textures.len() as u32 - 1)
    }

    fn write_texture(&mut self, texture: TextureId, layer: u32, mip_level: u32, pixels: &[u8]) {
        let Some(tex) = self.textures.get(texture.index()) else {
            log::error!("write_texture: unknown texture {texture:?}");
            return;
        };
        let (width, height) = tex.desc.mip_size(mip_level);
        let bytes_per_row = width * tex.desc.format.bytes_per_pixel();
        if pixels.len() < (bytes_per_row * height) as usize {
            log::error!(
                "write_texture: {} bytes is short of a {width}x{height} level of '{}'",
                pixels.len(),
                tex.desc.label
            );
            return;
        }
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level,
                origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn generate_mipmaps(&mut self, texture: TextureId) {
        let Some(tex) = self.textures.get(texture.index()) else {
            log::error!("generate_mipmaps: unknown texture {texture:?}");
            return;
        };
        if tex.desc.format.is_depth() {
            return;
        }
        let format = texture_format(tex.desc.format);
        self.mipmaps.ensure_pipeline(&self.device, format);
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Mipmaps"),
        });
        self.mipmaps.generate(&self.device, &mut encoder, &tex.texture);
        self.queue.submit(Some(encoder.finish()));
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> FramebufferId {
        let mut status = check_framebuffer(desc, |id| self.textures.get(id.index()).map(|t| &t.desc));
        if status.is_complete() && !attachments_share_size(desc, &self.textures) {
            status = FramebufferStatus::Unsupported;
        }
        self.framebuffers.push(WgpuFramebuffer {
            desc: desc.clone(),
            status,
        });
        FramebufferId(self.framebuffers.len() as u32 - 1)
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        self.framebuffers
            .get(framebuffer.index())
            .map_or(FramebufferStatus::Undefined, |fb| fb.status)
    }

    fn create_program(&mut self, source: &ProgramSource) -> ProgramBuild {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&source.name),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source.source.as_str())),
        });
        let error = pollster::block_on(scope.pop());
        let diagnostics = error.map(|e| e.to_string());

        let layouts = bind_group_layouts(&self.device, &source.name, &source.interface);
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&source.name),
            bind_group_layouts: &[&layouts[0], &layouts[1], &layouts[2]],
            immediate_size: 0,
        });

        self.programs.push(WgpuProgram {
            name: source.name.clone(),
            module,
            interface: source.interface.clone(),
            layouts,
            pipeline_layout,
        });
        let id = ProgramId(self.programs.len() as u32 - 1);

        ProgramBuild {
            id,
            attributes: source.interface.attributes.clone(),
            diagnostics,
        }
    }

    fn create_vertex_array(&mut self, desc: &VertexArrayDesc) -> VertexArrayId {
        self.vertex_arrays.push(desc.clone());
        VertexArrayId(self.vertex_arrays.len() as u32 - 1)
    }

    fn execute_pass(&mut self, pass: &RenderPass) {
        let Some(target) = self.resolve_target(&pass.target) else {
            return;
        };

        // Params for every draw live in one buffer, each at an aligned offset.
        let alignment = self.limits.uniform_offset_alignment.max(PARAM_SLOT);
        let mut param_bytes = Vec::new();
        let mut param_ranges = Vec::with_capacity(pass.draws.len());
        for draw in &pass.draws {
            let interface = self.programs.get(draw.program.index()).map(|p| &p.interface);
            match interface {
                Some(interface) if !interface.params.is_empty() => {
                    let start = align(param_bytes.len() as u32, alignment) as usize;
                    param_bytes.resize(start, 0);
                    Self::pack_params(interface, draw, &mut param_bytes);
                    param_ranges.push(Some((start as u64, (param_bytes.len() - start) as u64)));
                }
                _ => param_ranges.push(None),
            }
        }
        let param_buffer = (!param_bytes.is_empty()).then(|| {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Pass Params"),
                size: u64::from(align(param_bytes.len() as u32, 4)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            param_bytes.resize(align(param_bytes.len() as u32, 4) as usize, 0);
            self.queue.write_buffer(&buffer, 0, &param_bytes);
            buffer
        });

        let mut prepared = Vec::with_capacity(pass.draws.len());
        for (draw, params) in pass.draws.iter().zip(&param_ranges) {
            let Some(desc) = self.vertex_arrays.get(draw.vertex_array.index()) else {
                log::warn!("Pass '{}': unknown vertex array {:?}", pass.label, draw.vertex_array);
                continue;
            };
            let (vertex, vertex_base) = VertexLayoutKey::from_desc(desc);
            let key = PipelineKey {
                program: draw.program,
                vertex,
                colors: target.color_formats.clone(),
                depth: target.depth.as_ref().map(|(_, format)| *format),
                state: pass.state,
            };
            let Some(pipeline) = self.pipeline_for(&key) else {
                log::warn!("Pass '{}': unknown program {:?}", pass.label, draw.program);
                continue;
            };
            let Some(program) = self.programs.get(draw.program.index()) else {
                continue;
            };
            let params = param_buffer
                .as_ref()
                .zip(*params)
                .map(|(buffer, (offset, size))| (buffer, offset, size));
            let Some(groups) = self.bind_groups(program, draw, params) else {
                continue;
            };
            prepared.push(PreparedDraw {
                pipeline,
                groups,
                vertex_array: draw.vertex_array,
                vertex_base,
                first_index: draw.index_byte_offset / 4,
                index_count: draw.index_count,
            });
        }

        let clear = pass.clear;
        let color_load = match clear {
            Some(op) if op.flags.contains(ClearFlags::COLOR) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(op.color[0]),
                g: f64::from(op.color[1]),
                b: f64::from(op.color[2]),
                a: f64::from(op.color[3]),
            }),
            _ => wgpu::LoadOp::Load,
        };
        let depth_load = match clear {
            Some(op) if op.flags.contains(ClearFlags::DEPTH) => wgpu::LoadOp::Clear(op.depth),
            _ => wgpu::LoadOp::Load,
        };

        let color_attachments: SmallVec<[Option<wgpu::RenderPassColorAttachment<'_>>; 4]> = target
            .colors
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(pass.label.as_ref()),
        });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.label.as_ref()),
                color_attachments: &color_attachments,
                depth_stencil_attachment: target.depth.as_ref().map(|(view, _)| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let vp = pass.viewport;
            rpass.set_viewport(vp.x as f32, vp.y as f32, vp.width as f32, vp.height as f32, 0.0, 1.0);

            for draw in &prepared {
                let Some(desc) = self.vertex_arrays.get(draw.vertex_array.index()) else {
                    continue;
                };
                let (Some(vertex), Some(index)) = (
                    self.buffers.get(desc.vertex_buffer.index()),
                    self.buffers.get(desc.index_buffer.index()),
                ) else {
                    continue;
                };
                rpass.set_pipeline(&draw.pipeline);
                for (slot, group) in draw.groups.iter().enumerate() {
                    rpass.set_bind_group(slot as u32, group, &[]);
                }
                rpass.set_vertex_buffer(0, vertex.buffer.slice(draw.vertex_base..));
                rpass.set_index_buffer(index.buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(draw.first_index..draw.first_index + draw.index_count, 0, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));
    }

    fn blit_depth(&mut self, src: FramebufferId, dst: FramebufferId, width: u32, height: u32) {
        let depth_of = |fb: FramebufferId| {
            self.framebuffers
                .get(fb.index())
                .and_then(|f| f.desc.depth)
                .and_then(|a| self.textures.get(a.texture.index()).map(|t| (a, t)))
        };
        let (Some((src_att, src_tex)), Some((dst_att, dst_tex))) = (depth_of(src), depth_of(dst)) else {
            log::error!("blit_depth: framebuffers {src:?} -> {dst:?} lack depth attachments");
            return;
        };
        if src_tex.desc.format != dst_tex.desc.format {
            log::error!("blit_depth: depth formats differ between '{}' and '{}'", src_tex.desc.label, dst_tex.desc.label);
            return;
        }
        let (sw, sh) = src_tex.desc.mip_size(src_att.mip_level);
        let (dw, dh) = dst_tex.desc.mip_size(dst_att.mip_level);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Blit Depth"),
        });
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &src_tex.texture,
                mip_level: src_att.mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &dst_tex.texture,
                mip_level: dst_att.mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: width.min(sw).min(dw),
                height: height.min(sh).min(dh),
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
    }
}

fn vertex_format(components: u8) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn compare_function(compare: CompareFunction) -> wgpu::CompareFunction {
    match compare {
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

fn blend_state(blend: BlendMode) -> Option<wgpu::BlendState> {
    match blend {
        BlendMode::Disabled => None,
        BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        BlendMode::Additive => {
            let add = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            };
            Some(wgpu::BlendState { color: add, alpha: add })
        }
    }
}

/// wgpu requires every attachment of a pass to have the same extent.
fn attachments_share_size(desc: &FramebufferDesc, textures: &[WgpuTexture]) -> bool {
    let mut sizes = desc
        .colors
        .iter()
        .chain(desc.depth.iter())
        .filter_map(|a| textures.get(a.texture.index()).map(|t| t.desc.mip_size(a.mip_level)));
    let Some(first) = sizes.next() else {
        return true;
    };
    sizes.all(|size| size == first)
}

fn bind_group_layouts(device: &wgpu::Device, name: &str, interface: &ProgramInterface) -> [wgpu::BindGroupLayout; 3] {
    let uniforms: Vec<wgpu::BindGroupLayoutEntry> = interface
        .uniform_blocks
        .iter()
        .map(|&binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect();

    let mut textures = Vec::with_capacity(interface.samplers.len() * 2);
    for slot in &interface.samplers {
        let (sample_type, view_dimension, sampler) = match slot.kind {
            SamplerKind::Color2d => (
                wgpu::TextureSampleType::Float { filterable: true },
                wgpu::TextureViewDimension::D2,
                wgpu::SamplerBindingType::Filtering,
            ),
            SamplerKind::Depth2d => (
                wgpu::TextureSampleType::Depth,
                wgpu::TextureViewDimension::D2,
                wgpu::SamplerBindingType::NonFiltering,
            ),
            SamplerKind::Cube => (
                wgpu::TextureSampleType::Float { filterable: true },
                wgpu::TextureViewDimension::Cube,
                wgpu::SamplerBindingType::Filtering,
            ),
        };
        textures.push(wgpu::BindGroupLayoutEntry {
            binding: slot.unit * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type,
                view_dimension,
                multisampled: false,
            },
            count: None,
        });
        textures.push(wgpu::BindGroupLayoutEntry {
            binding: slot.unit * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(sampler),
            count: None,
        });
    }

    let params: Vec<wgpu::BindGroupLayoutEntry> = if interface.params.is_empty() {
        Vec::new()
    } else {
        vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }]
    };

    let create = |suffix: &str, entries: &[wgpu::BindGroupLayoutEntry]| {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{name} {suffix}")),
            entries,
        })
    };
    [
        create("Uniform Blocks", &uniforms),
        create("Textures", &textures),
        create("Params", &params),
    ]
}

// ============================================================================
// Mipmap Generator
// ============================================================================

struct MipmapGenerator {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    shader: wgpu::ShaderModule,
    pipelines: FxHashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl MipmapGenerator {
    fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mipmap Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(BLIT_SHADER)),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mipmap Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Mipmap Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        Self {
            layout,
            sampler,
            shader,
            pipelines: FxHashMap::default(),
        }
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.pipelines.contains_key(&format) {
            return;
        }
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mipmap Pipeline Layout"),
            bind_group_layouts: &[&self.layout],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("Mipmap Pipeline {format:?}")),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        self.pipelines.insert(format, pipeline);
    }

    /// Downsamples level `i` into `i + 1` for every layer.
    fn generate(&self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder, texture: &wgpu::Texture) {
        let mip_count = texture.mip_level_count();
        let Some(pipeline) = self.pipelines.get(&texture.format()) else {
            log::warn!("No mipmap pipeline for {:?}", texture.format());
            return;
        };

        for layer in 0..texture.depth_or_array_layers() {
            for level in 0..mip_count.saturating_sub(1) {
                let view = |mip: u32, usage: wgpu::TextureUsages| {
                    texture.create_view(&wgpu::TextureViewDescriptor {
                        label: Some("Mipmap Level"),
                        dimension: Some(wgpu::TextureViewDimension::D2),
                        base_mip_level: mip,
                        mip_level_count: Some(1),
                        base_array_layer: layer,
                        array_layer_count: Some(1),
                        usage: Some(usage),
                        ..Default::default()
                    })
                };
                let src_view = view(level, wgpu::TextureUsages::TEXTURE_BINDING);
                let dst_view = view(level + 1, wgpu::TextureUsages::RENDER_ATTACHMENT);

                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Mipmap BG"),
                    layout: &self.layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&src_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                });

                let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Mipmap Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &dst_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &bind_group, &[]);
                rpass.draw(0..3, 0..1);
            }
        }
    }
}
