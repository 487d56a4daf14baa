//! Headless Device
//!
//! A CPU reference implementation of [`GpuDevice`]. It keeps buffer bytes
//! and texture descriptions, evaluates framebuffer completeness with the
//! shared rules, and records every state-changing call in a command log.
//! Nothing is rasterized; the log is what tests and tooling inspect.

use rustc_hash::FxHashMap;

use super::device::{
    BufferKind, FramebufferDesc, FramebufferId, FramebufferStatus, GpuBufferId, GpuDevice,
    DeviceInfo, DeviceLimits, ProgramBuild, ProgramId, ProgramSource, RenderPass, TextureDesc,
    TextureId, VertexArrayDesc, VertexArrayId, check_framebuffer,
};

/// One entry of the headless command log.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    WriteBuffer {
        buffer: GpuBufferId,
        offset: u32,
        len: u32,
    },
    WriteTexture {
        texture: TextureId,
        layer: u32,
        mip_level: u32,
    },
    GenerateMipmaps(TextureId),
    Pass(RenderPass),
    BlitDepth {
        src: FramebufferId,
        dst: FramebufferId,
        width: u32,
        height: u32,
    },
}

#[derive(Debug)]
struct HeadlessBuffer {
    label: String,
    kind: BufferKind,
    data: Vec<u8>,
}

#[derive(Debug)]
struct HeadlessFramebuffer {
    desc: FramebufferDesc,
    status: FramebufferStatus,
}

#[derive(Debug)]
struct HeadlessProgram {
    name: String,
    valid: bool,
}

pub struct HeadlessDevice {
    limits: DeviceLimits,
    buffers: Vec<HeadlessBuffer>,
    textures: Vec<TextureDesc>,
    framebuffers: Vec<HeadlessFramebuffer>,
    programs: Vec<HeadlessProgram>,
    vertex_arrays: Vec<VertexArrayDesc>,
    commands: Vec<DeviceCommand>,
    /// Problems a real driver would report as API errors.
    validation_errors: Vec<String>,
    program_names: FxHashMap<ProgramId, String>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new(DeviceLimits::default())
    }
}

impl HeadlessDevice {
    #[must_use]
    pub fn new(limits: DeviceLimits) -> Self {
        Self {
            limits,
            buffers: Vec::new(),
            textures: Vec::new(),
            framebuffers: Vec::new(),
            programs: Vec::new(),
            vertex_arrays: Vec::new(),
            commands: Vec::new(),
            validation_errors: Vec::new(),
            program_names: FxHashMap::default(),
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[must_use]
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Executed passes in submission order.
    pub fn passes(&self) -> impl Iterator<Item = &RenderPass> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DeviceCommand::Pass(pass) => Some(pass),
            _ => None,
        })
    }

    #[must_use]
    pub fn pass_labels(&self) -> Vec<String> {
        self.passes().map(|pass| pass.label.to_string()).collect()
    }

    #[must_use]
    pub fn find_pass(&self, label: &str) -> Option<&RenderPass> {
        self.passes().find(|pass| pass.label == label)
    }

    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.passes().map(|pass| pass.draws.len()).sum()
    }

    #[must_use]
    pub fn buffer_contents(&self, buffer: GpuBufferId) -> Option<&[u8]> {
        self.buffers.get(buffer.index()).map(|b| b.data.as_slice())
    }

    #[must_use]
    pub fn buffer_kind(&self, buffer: GpuBufferId) -> Option<BufferKind> {
        self.buffers.get(buffer.index()).map(|b| b.kind)
    }

    #[must_use]
    pub fn texture_desc(&self, texture: TextureId) -> Option<&TextureDesc> {
        self.textures.get(texture.index())
    }

    #[must_use]
    pub fn framebuffer_desc(&self, framebuffer: FramebufferId) -> Option<&FramebufferDesc> {
        self.framebuffers.get(framebuffer.index()).map(|fb| &fb.desc)
    }

    #[must_use]
    pub fn vertex_array_desc(&self, vertex_array: VertexArrayId) -> Option<&VertexArrayDesc> {
        self.vertex_arrays.get(vertex_array.index())
    }

    #[must_use]
    pub fn vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }

    #[must_use]
    pub fn program_name(&self, program: ProgramId) -> Option<&str> {
        self.program_names.get(&program).map(String::as_str)
    }

    #[must_use]
    pub fn validation_errors(&self) -> &[String] {
        &self.validation_errors
    }

    // ========================================================================
    // Validation
    // ========================================================================

    fn validate_pass(&mut self, pass: &RenderPass) {
        let mut errors = Vec::new();

        if let Some(id) = pass.target.framebuffer_id() {
            match self.framebuffers.get(id.index()) {
                None => errors.push(format!("pass '{}': unknown framebuffer {id:?}", pass.label)),
                Some(fb) if !fb.status.is_complete() => errors.push(format!(
                    "pass '{}': framebuffer '{}' is incomplete",
                    pass.label, fb.desc.label
                )),
                Some(_) => {}
            }
        }

        for (i, draw) in pass.draws.iter().enumerate() {
            if draw.program.index() >= self.programs.len() {
                errors.push(format!("pass '{}' draw {i}: unknown program", pass.label));
            }
            if draw.vertex_array.index() >= self.vertex_arrays.len() {
                errors.push(format!("pass '{}' draw {i}: unknown vertex array", pass.label));
            }
            for block in &draw.uniform_blocks {
                let size = self.buffers.get(block.buffer.index()).map_or(0, |b| b.data.len());
                if block.range.end() as usize > size {
                    errors.push(format!(
                        "pass '{}' draw {i}: uniform block {} range {}..{} exceeds buffer size {size}",
                        pass.label,
                        block.binding,
                        block.range.offset,
                        block.range.end()
                    ));
                }
                if block.range.offset % self.limits.uniform_offset_alignment != 0 {
                    errors.push(format!(
                        "pass '{}' draw {i}: uniform block {} offset {} is not aligned to {}",
                        pass.label, block.binding, block.range.offset, self.limits.uniform_offset_alignment
                    ));
                }
            }
            for binding in &draw.textures {
                if binding.texture.index() >= self.textures.len() {
                    errors.push(format!(
                        "pass '{}' draw {i}: unit {} binds unknown texture",
                        pass.label, binding.unit
                    ));
                }
            }
        }

        for error in errors {
            log::warn!("headless: {error}");
            self.validation_errors.push(error);
        }
    }
}

impl GpuDevice for HeadlessDevice {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Headless Reference Device".to_string(),
            vendor: "tidal".to_string(),
            api_version: "1.0".to_string(),
            backend: "headless".to_string(),
            extensions: Vec::new(),
        }
    }

    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn create_buffer(&mut self, label: &str, size: u32, kind: BufferKind) -> GpuBufferId {
        let id = GpuBufferId(self.buffers.len() as u32);
        self.buffers.push(HeadlessBuffer {
            label: label.to_string(),
            kind,
            data: vec![0; size as usize],
        });
        id
    }

    fn write_buffer(&mut self, buffer: GpuBufferId, offset: u32, data: &[u8]) {
        let Some(target) = self.buffers.get_mut(buffer.index()) else {
            self.validation_errors
                .push(format!("write to unknown buffer {buffer:?}"));
            return;
        };
        let start = offset as usize;
        let end = start + data.len();
        if end > target.data.len() {
            self.validation_errors.push(format!(
                "write of {} bytes at {offset} overflows buffer '{}' ({} bytes)",
                data.len(),
                target.label,
                target.data.len()
            ));
            return;
        }
        target.data[start..end].copy_from_slice(data);
        self.commands.push(DeviceCommand::WriteBuffer {
            buffer,
            offset,
            len: data.len() as u32,
        });
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(desc.clone());
        id
    }

    fn write_texture(&mut self, texture: TextureId, layer: u32, mip_level: u32, pixels: &[u8]) {
        let Some(desc) = self.textures.get(texture.index()) else {
            self.validation_errors
                .push(format!("upload to unknown texture {texture:?}"));
            return;
        };
        let (width, height) = desc.mip_size(mip_level);
        let expected = (width * height * desc.format.bytes_per_pixel()) as usize;
        if pixels.len() != expected || layer >= desc.layers() || mip_level >= desc.mip_levels {
            self.validation_errors.push(format!(
                "upload to '{}' layer {layer} level {mip_level}: got {} bytes, expected {expected}",
                desc.label,
                pixels.len()
            ));
            return;
        }
        self.commands.push(DeviceCommand::WriteTexture {
            texture,
            layer,
            mip_level,
        });
    }

    fn generate_mipmaps(&mut self, texture: TextureId) {
        self.commands.push(DeviceCommand::GenerateMipmaps(texture));
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> FramebufferId {
        let status = check_framebuffer(desc, |id| self.textures.get(id.index()));
        let id = FramebufferId(self.framebuffers.len() as u32);
        self.framebuffers.push(HeadlessFramebuffer {
            desc: desc.clone(),
            status,
        });
        id
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        self.framebuffers
            .get(framebuffer.index())
            .map_or(FramebufferStatus::Undefined, |fb| fb.status)
    }

    fn create_program(&mut self, source: &ProgramSource) -> ProgramBuild {
        let id = ProgramId(self.programs.len() as u32);
        let diagnostics = source
            .source
            .trim()
            .is_empty()
            .then(|| format!("{}: empty shader source", source.path));
        self.programs.push(HeadlessProgram {
            name: source.name.clone(),
            valid: diagnostics.is_none(),
        });
        self.program_names.insert(id, source.name.clone());
        ProgramBuild {
            id,
            attributes: source.interface.attributes.clone(),
            diagnostics,
        }
    }

    fn create_vertex_array(&mut self, desc: &VertexArrayDesc) -> VertexArrayId {
        let id = VertexArrayId(self.vertex_arrays.len() as u32);
        self.vertex_arrays.push(desc.clone());
        id
    }

    fn execute_pass(&mut self, pass: &RenderPass) {
        self.validate_pass(pass);
        for draw in &pass.draws {
            if let Some(program) = self.programs.get(draw.program.index())
                && !program.valid
            {
                log::trace!("headless: pass '{}' draws with invalid program '{}'", pass.label, program.name);
            }
        }
        self.commands.push(DeviceCommand::Pass(pass.clone()));
    }

    fn blit_depth(&mut self, src: FramebufferId, dst: FramebufferId, width: u32, height: u32) {
        let has_depth = |id: FramebufferId| {
            self.framebuffers
                .get(id.index())
                .is_some_and(|fb| fb.desc.depth.is_some())
        };
        if !has_depth(src) || !has_depth(dst) {
            self.validation_errors
                .push(format!("depth blit {src:?} -> {dst:?} without depth attachments"));
        }
        self.commands.push(DeviceCommand::BlitDepth {
            src,
            dst,
            width,
            height,
        });
    }
}
