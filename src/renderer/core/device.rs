//! Abstract GPU interface.
//!
//! The renderer talks to the GPU through [`GpuDevice`], a small immediate
//! mode surface modelled on classic bind-and-draw APIs: buffers, textures,
//! framebuffers with a completeness status, vertex arrays, programs and
//! fully described render passes. Every call is issued from the render
//! thread in program order and takes effect before the next call observes
//! it.

use std::borrow::Cow;
use std::fmt;

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3, Vec4};
use smallvec::SmallVec;

// ============================================================================
// Ids
// ============================================================================

macro_rules! gpu_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

gpu_id!(
    /// GPU buffer object.
    GpuBufferId
);
gpu_id!(
    /// GPU texture object (2D, mip chain or cube map).
    TextureId
);
gpu_id!(
    /// Framebuffer object grouping texture attachments.
    FramebufferId
);
gpu_id!(
    /// Linked shader program.
    ProgramId
);
gpu_id!(
    /// Vertex array object: attribute wiring over a vertex and index buffer.
    VertexArrayId
);

// ============================================================================
// Device description
// ============================================================================

/// Limits the renderer depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Largest range that can be bound as one uniform block.
    pub max_uniform_block_size: u32,
    /// Required alignment of uniform block offsets.
    pub uniform_offset_alignment: u32,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_uniform_block_size: 65536,
            uniform_offset_alignment: 256,
        }
    }
}

/// Human readable adapter description, logged at startup.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub name: String,
    pub vendor: String,
    pub api_version: String,
    pub backend: String,
    pub extensions: Vec<String>,
}

// ============================================================================
// Buffers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Uniform,
    Vertex,
    Index,
}

// ============================================================================
// Textures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba16Float,
    Depth32Float,
}

impl TextureFormat {
    #[must_use]
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::Depth32Float)
    }

    #[must_use]
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgba8Unorm | Self::Depth32Float => 4,
            Self::Rgba16Float => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D2,
    Cube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerDesc {
    pub filter: FilterMode,
    /// Sample between mip levels.
    pub mipmaps: bool,
    pub wrap: WrapMode,
}

impl SamplerDesc {
    /// Linear, mipmapped, repeating. Used for material textures.
    pub const MATERIAL: Self = Self {
        filter: FilterMode::Linear,
        mipmaps: true,
        wrap: WrapMode::Repeat,
    };

    /// Linear, clamped. Used for textures sourced from render targets.
    pub const TARGET: Self = Self {
        filter: FilterMode::Linear,
        mipmaps: false,
        wrap: WrapMode::ClampToEdge,
    };

    /// Linear, mipmapped, clamped. Used for render-target mip chains.
    pub const TARGET_MIPMAPPED: Self = Self {
        filter: FilterMode::Linear,
        mipmaps: true,
        wrap: WrapMode::ClampToEdge,
    };

    /// Nearest, clamped.
    pub const NEAREST: Self = Self {
        filter: FilterMode::Nearest,
        mipmaps: false,
        wrap: WrapMode::ClampToEdge,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub label: Cow<'static, str>,
    pub dimension: TextureDimension,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub sampler: SamplerDesc,
}

impl TextureDesc {
    #[must_use]
    pub fn new_2d(
        label: impl Into<Cow<'static, str>>,
        format: TextureFormat,
        width: u32,
        height: u32,
        sampler: SamplerDesc,
    ) -> Self {
        Self {
            label: label.into(),
            dimension: TextureDimension::D2,
            format,
            width,
            height,
            mip_levels: 1,
            sampler,
        }
    }

    #[must_use]
    pub fn with_mip_levels(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels.max(1);
        self
    }

    /// Number of levels a full chain down to 1x1 would have.
    #[must_use]
    pub fn full_mip_chain(width: u32, height: u32) -> u32 {
        32 - width.max(height).max(1).leading_zeros()
    }

    #[must_use]
    pub fn mip_size(&self, level: u32) -> (u32, u32) {
        ((self.width >> level).max(1), (self.height >> level).max(1))
    }

    #[must_use]
    pub fn layers(&self) -> u32 {
        match self.dimension {
            TextureDimension::D2 => 1,
            TextureDimension::Cube => 6,
        }
    }
}

// ============================================================================
// Framebuffers
// ============================================================================

/// One texture level attached to a framebuffer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attachment {
    pub texture: TextureId,
    pub mip_level: u32,
}

impl Attachment {
    #[must_use]
    pub const fn base(texture: TextureId) -> Self {
        Self {
            texture,
            mip_level: 0,
        }
    }

    #[must_use]
    pub const fn level(texture: TextureId, mip_level: u32) -> Self {
        Self { texture, mip_level }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferDesc {
    pub label: Cow<'static, str>,
    /// Color attachment slots, indexed by attachment number.
    pub colors: SmallVec<[Attachment; 4]>,
    pub depth: Option<Attachment>,
    /// Attachments written by default when a pass does not select any.
    pub draw_buffers: SmallVec<[u32; 4]>,
}

impl FramebufferDesc {
    #[must_use]
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            colors: SmallVec::new(),
            depth: None,
            draw_buffers: SmallVec::new(),
        }
    }

    /// Appends a color attachment and enables it as a draw buffer.
    #[must_use]
    pub fn color(mut self, attachment: Attachment) -> Self {
        self.draw_buffers.push(self.colors.len() as u32);
        self.colors.push(attachment);
        self
    }

    #[must_use]
    pub fn depth(mut self, attachment: Attachment) -> Self {
        self.depth = Some(attachment);
        self
    }

    #[must_use]
    pub fn draw_buffers(mut self, buffers: &[u32]) -> Self {
        self.draw_buffers = SmallVec::from_slice(buffers);
        self
    }
}

/// Result of a framebuffer completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    Complete,
    Undefined,
    IncompleteAttachment,
    MissingAttachment,
    IncompleteDrawBuffer,
    IncompleteReadBuffer,
    Unsupported,
    IncompleteMultisample,
    IncompleteLayerTargets,
    Unknown,
}

impl FramebufferStatus {
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }

    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Undefined => {
                "the specified framebuffer is the default read or draw framebuffer, but the default framebuffer does not exist"
            }
            Self::IncompleteAttachment => "one or more framebuffer attachment points are incomplete",
            Self::MissingAttachment => "the framebuffer does not have at least one image attached",
            Self::IncompleteDrawBuffer => "a draw buffer names an attachment point with no image attached",
            Self::IncompleteReadBuffer => "the read buffer names an attachment point with no image attached",
            Self::Unsupported => "the combination of internal formats of the attached images is not supported",
            Self::IncompleteMultisample => "the attached images do not share a sample count",
            Self::IncompleteLayerTargets => "a layered attachment is mixed with non-layered attachments",
            Self::Unknown => "unknown framebuffer status",
        }
    }
}

impl fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Structural completeness rules shared by every backend.
///
/// `texture` resolves an attachment to its description, or `None` when the
/// id does not name a texture.
pub fn check_framebuffer<'a>(
    desc: &FramebufferDesc,
    texture: impl Fn(TextureId) -> Option<&'a TextureDesc>,
) -> FramebufferStatus {
    if desc.colors.is_empty() && desc.depth.is_none() {
        return FramebufferStatus::MissingAttachment;
    }

    for attachment in &desc.colors {
        let Some(tex) = texture(attachment.texture) else {
            return FramebufferStatus::IncompleteAttachment;
        };
        if tex.format.is_depth() || attachment.mip_level >= tex.mip_levels {
            return FramebufferStatus::IncompleteAttachment;
        }
        if tex.dimension == TextureDimension::Cube {
            return FramebufferStatus::IncompleteLayerTargets;
        }
    }

    if let Some(attachment) = desc.depth {
        let Some(tex) = texture(attachment.texture) else {
            return FramebufferStatus::IncompleteAttachment;
        };
        if !tex.format.is_depth() || attachment.mip_level >= tex.mip_levels {
            return FramebufferStatus::IncompleteAttachment;
        }
    }

    if desc
        .draw_buffers
        .iter()
        .any(|&slot| slot as usize >= desc.colors.len())
    {
        return FramebufferStatus::IncompleteDrawBuffer;
    }

    FramebufferStatus::Complete
}

// ============================================================================
// Programs & vertex arrays
// ============================================================================

/// An input attribute a vertex shader declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexShaderAttribute {
    pub location: u32,
    pub components: u8,
}

/// How a program samples a texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerKind {
    Color2d,
    Depth2d,
    Cube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerSlot {
    pub unit: u32,
    pub kind: SamplerKind,
}

/// Resource interface of a program: the contract between draw calls and
/// shader text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInterface {
    pub attributes: Vec<VertexShaderAttribute>,
    /// Uniform block binding points.
    pub uniform_blocks: Vec<u32>,
    pub samplers: Vec<SamplerSlot>,
    /// Loose uniforms in declaration order.
    pub params: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct ProgramSource {
    pub name: String,
    pub path: String,
    pub source: String,
    pub interface: ProgramInterface,
}

/// Outcome of compiling and linking a program.
///
/// A failed build still yields an id; drawing with it produces undefined
/// output but never aborts the frame.
#[derive(Debug, Clone)]
pub struct ProgramBuild {
    pub id: ProgramId,
    /// Active vertex attributes reported after linking.
    pub attributes: Vec<VertexShaderAttribute>,
    /// Compiler or linker log when the build failed.
    pub diagnostics: Option<String>,
}

/// One float attribute read from the vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribPointer {
    pub location: u32,
    pub components: u8,
    /// Absolute byte offset of the first element in the vertex buffer.
    pub offset: u32,
    pub stride: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexArrayDesc {
    pub vertex_buffer: GpuBufferId,
    pub index_buffer: GpuBufferId,
    pub attributes: SmallVec<[VertexAttribPointer; 4]>,
}

// ============================================================================
// Render passes
// ============================================================================

/// Where a pass draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderTarget {
    /// The presentation surface.
    Screen,
    Framebuffer {
        id: FramebufferId,
        /// Color attachment slots written by this pass.
        draw_buffers: SmallVec<[u32; 4]>,
    },
}

impl RenderTarget {
    /// Draws into every default draw buffer of `id`.
    #[must_use]
    pub fn framebuffer(id: FramebufferId, draw_buffers: &[u32]) -> Self {
        Self::Framebuffer {
            id,
            draw_buffers: SmallVec::from_slice(draw_buffers),
        }
    }

    #[must_use]
    pub fn framebuffer_id(&self) -> Option<FramebufferId> {
        match self {
            Self::Screen => None,
            Self::Framebuffer { id, .. } => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearOp {
    pub flags: ClearFlags,
    pub color: [f32; 4],
    pub depth: f32,
}

impl ClearOp {
    #[must_use]
    pub const fn all(color: [f32; 4]) -> Self {
        Self {
            flags: ClearFlags::COLOR.union(ClearFlags::DEPTH),
            color,
            depth: 1.0,
        }
    }

    #[must_use]
    pub const fn color(color: [f32; 4]) -> Self {
        Self {
            flags: ClearFlags::COLOR,
            color,
            depth: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Less,
    LessEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Disabled,
    /// `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`
    Alpha,
    /// `ONE, ONE`
    Additive,
}

/// Fixed-function state for every draw of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    /// `None` disables the depth test.
    pub depth_test: Option<CompareFunction>,
    pub depth_write: bool,
    pub blend: BlendMode,
    /// Enables user clip distance 0.
    pub clip_distance: bool,
}

impl PipelineState {
    /// Depth-tested opaque geometry.
    pub const OPAQUE: Self = Self {
        depth_test: Some(CompareFunction::Less),
        depth_write: true,
        blend: BlendMode::Disabled,
        clip_distance: false,
    };

    /// Full-screen passes: no depth, no blending.
    pub const FULLSCREEN: Self = Self {
        depth_test: None,
        depth_write: false,
        blend: BlendMode::Disabled,
        clip_distance: false,
    };

    #[must_use]
    pub const fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    #[must_use]
    pub const fn with_clip_distance(mut self, enabled: bool) -> Self {
        self.clip_distance = enabled;
        self
    }
}

/// Byte range of a uniform block inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferRange {
    pub offset: u32,
    pub size: u32,
}

impl BufferRange {
    #[must_use]
    pub const fn end(self) -> u32 {
        self.offset + self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBlockBinding {
    pub binding: u32,
    pub buffer: GpuBufferId,
    pub range: BufferRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub unit: u32,
    pub texture: TextureId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParam {
    pub name: &'static str,
    pub value: ParamValue,
}

/// One indexed triangle-list draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub vertex_array: VertexArrayId,
    /// Indices are 32-bit.
    pub index_count: u32,
    pub index_byte_offset: u32,
    pub uniform_blocks: SmallVec<[UniformBlockBinding; 3]>,
    pub textures: SmallVec<[TextureBinding; 6]>,
    pub params: SmallVec<[ShaderParam; 6]>,
}

impl DrawCall {
    #[must_use]
    pub fn indexed(
        program: ProgramId,
        vertex_array: VertexArrayId,
        index_count: u32,
        index_byte_offset: u32,
    ) -> Self {
        Self {
            program,
            vertex_array,
            index_count,
            index_byte_offset,
            uniform_blocks: SmallVec::new(),
            textures: SmallVec::new(),
            params: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn uniform_block(mut self, binding: u32, buffer: GpuBufferId, range: BufferRange) -> Self {
        self.uniform_blocks.push(UniformBlockBinding {
            binding,
            buffer,
            range,
        });
        self
    }

    #[must_use]
    pub fn texture(mut self, unit: u32, texture: TextureId) -> Self {
        self.textures.push(TextureBinding { unit, texture });
        self
    }

    #[must_use]
    pub fn param(mut self, name: &'static str, value: ParamValue) -> Self {
        self.params.push(ShaderParam { name, value });
        self
    }

    #[must_use]
    pub fn texture_at(&self, unit: u32) -> Option<TextureId> {
        self.textures
            .iter()
            .find(|binding| binding.unit == unit)
            .map(|binding| binding.texture)
    }

    #[must_use]
    pub fn param_value(&self, name: &str) -> Option<ParamValue> {
        self.params
            .iter()
            .find(|param| param.name == name)
            .map(|param| param.value)
    }

    #[must_use]
    pub fn uniform_range(&self, binding: u32) -> Option<BufferRange> {
        self.uniform_blocks
            .iter()
            .find(|block| block.binding == binding)
            .map(|block| block.range)
    }
}

/// A fully described render pass: target, fixed-function state, clear and
/// the draws issued into it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPass {
    pub label: Cow<'static, str>,
    pub target: RenderTarget,
    pub viewport: Viewport,
    pub clear: Option<ClearOp>,
    pub state: PipelineState,
    pub draws: Vec<DrawCall>,
}

impl RenderPass {
    #[must_use]
    pub fn new(label: impl Into<Cow<'static, str>>, target: RenderTarget, viewport: Viewport) -> Self {
        Self {
            label: label.into(),
            target,
            viewport,
            clear: None,
            state: PipelineState::OPAQUE,
            draws: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_clear(mut self, clear: ClearOp) -> Self {
        self.clear = Some(clear);
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: PipelineState) -> Self {
        self.state = state;
        self
    }

    pub fn draw(&mut self, draw: DrawCall) {
        self.draws.push(draw);
    }
}

// ============================================================================
// Device trait
// ============================================================================

/// The GPU operations the renderer issues.
pub trait GpuDevice {
    fn info(&self) -> DeviceInfo;

    fn limits(&self) -> DeviceLimits;

    /// Allocates exactly `size` zero-initialized bytes.
    fn create_buffer(&mut self, label: &str, size: u32, kind: BufferKind) -> GpuBufferId;

    fn write_buffer(&mut self, buffer: GpuBufferId, offset: u32, data: &[u8]);

    fn create_texture(&mut self, desc: &TextureDesc) -> TextureId;

    /// Uploads tightly packed pixels for one layer (cube face) of one level.
    fn write_texture(&mut self, texture: TextureId, layer: u32, mip_level: u32, pixels: &[u8]);

    /// Fills levels 1.. of `texture` from level 0.
    fn generate_mipmaps(&mut self, texture: TextureId);

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> FramebufferId;

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus;

    fn create_program(&mut self, source: &ProgramSource) -> ProgramBuild;

    fn create_vertex_array(&mut self, desc: &VertexArrayDesc) -> VertexArrayId;

    /// Binds the pass target, applies clear and state, issues every draw.
    fn execute_pass(&mut self, pass: &RenderPass);

    /// Copies the depth attachment of `src` into the depth attachment of
    /// `dst` over a `width` x `height` region with nearest filtering.
    fn blit_depth(&mut self, src: FramebufferId, dst: FramebufferId, width: u32, height: u32);
}
