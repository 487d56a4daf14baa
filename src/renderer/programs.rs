//! Built-in programs.
//!
//! Each entry names the shader file, the program inside it and the resource
//! interface draws are recorded against. Texture units and uniform block
//! bindings are fixed per program:
//!
//! | program          | blocks  | units                            |
//! |------------------|---------|----------------------------------|
//! | textured quad    |         | 0 texture                        |
//! | forward geometry | 0, 1    | 0 albedo                         |
//! | geometry         | 0, 1, 2 | 0 albedo                         |
//! | water            |         | 0-3 reflection/refraction, 4-5 maps |
//! | lighting         | 0       | 6 albedo, 7 position, 8 normal   |
//! | skybox           |         | 9 cube map                       |
//! | bright pixels    |         | 0 source                         |
//! | blur             |         | 0 source                         |
//! | bloom            |         | 0 main, 1 blurred chain          |
//! | debug lights     |         |                                  |

use crate::assets::ShaderLoader;
use crate::renderer::core::{
    GpuDevice, ProgramInterface, ProgramSource, SamplerKind, SamplerSlot, VertexShaderAttribute,
};
use crate::resources::{Handle, Program, ResourceRegistry};

/// Uniform block binding points.
pub mod block {
    pub const GLOBAL: u32 = 0;
    pub const LOCAL: u32 = 1;
    pub const CLIP_PLANE: u32 = 2;
}

/// Texture units.
pub mod unit {
    pub const ALBEDO: u32 = 0;
    pub const REFLECTION: u32 = 0;
    pub const REFLECTION_DEPTH: u32 = 1;
    pub const REFRACTION: u32 = 2;
    pub const REFRACTION_DEPTH: u32 = 3;
    pub const WATER_NORMAL: u32 = 4;
    pub const WATER_DUDV: u32 = 5;
    pub const GBUFFER_ALBEDO: u32 = 6;
    pub const GBUFFER_POSITION: u32 = 7;
    pub const GBUFFER_NORMAL: u32 = 8;
    pub const SKYBOX: u32 = 9;
    pub const BLOOM_MAIN: u32 = 0;
    pub const BLOOM_CHAIN: u32 = 1;
}

/// Loose uniform names.
pub mod param {
    pub const NEAR: &str = "uNear";
    pub const FAR: &str = "uFar";

    pub const WATER_PROJECTION: &str = "uProjection";
    pub const WATER_VIEW: &str = "uView";
    pub const WATER_VIEWPORT_SIZE: &str = "uViewportSize";
    pub const WATER_VIEW_INVERSE: &str = "uViewInverse";
    pub const WATER_PROJECTION_INVERSE: &str = "uProjectionInverse";
    pub const WATER_MOVE_FACTOR: &str = "moveFactor";

    pub const SKYBOX_VIEW: &str = "view";
    pub const SKYBOX_PROJECTION: &str = "projection";

    pub const THRESHOLD: &str = "threshold";
    pub const BLUR_DIRECTION: &str = "uDir";
    pub const BLUR_INPUT_LOD: &str = "uInputLod";
    pub const BLUR_KERNEL_RADIUS: &str = "kernelRadius";
    pub const BLUR_LOD_INTENSITY: &str = "uLodIntensity";
    pub const BLOOM_MAX_LOD: &str = "uMaxLod";

    pub const LIGHT_MVP: &str = "uProjectionMatrix";
    pub const LIGHT_COLOR: &str = "uLightColor";
}

const POSITION: VertexShaderAttribute = VertexShaderAttribute {
    location: 0,
    components: 3,
};
const NORMAL: VertexShaderAttribute = VertexShaderAttribute {
    location: 1,
    components: 3,
};
const UV: VertexShaderAttribute = VertexShaderAttribute {
    location: 2,
    components: 2,
};
/// The full-screen quad carries its uv at location 1.
const QUAD_UV: VertexShaderAttribute = VertexShaderAttribute {
    location: 1,
    components: 2,
};

const fn color(unit: u32) -> SamplerSlot {
    SamplerSlot {
        unit,
        kind: SamplerKind::Color2d,
    }
}

const fn depth(unit: u32) -> SamplerSlot {
    SamplerSlot {
        unit,
        kind: SamplerKind::Depth2d,
    }
}

/// Identifies a built-in program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinProgram {
    TexturedQuad,
    ForwardGeometry,
    Geometry,
    Water,
    Lighting,
    Skybox,
    BrightPixels,
    Blur,
    Bloom,
    DebugLights,
}

impl BuiltinProgram {
    pub const ALL: [Self; 10] = [
        Self::TexturedQuad,
        Self::ForwardGeometry,
        Self::Geometry,
        Self::Water,
        Self::Lighting,
        Self::Skybox,
        Self::BrightPixels,
        Self::Blur,
        Self::Bloom,
        Self::DebugLights,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TexturedQuad => "TEXTURED_QUAD",
            Self::ForwardGeometry => "RENDER_GEOMETRY",
            Self::Geometry => "GEOMETRY_RENDER",
            Self::Water => "WATER_EFFECT",
            Self::Lighting => "LIGHTING_RENDER",
            Self::Skybox => "CUBEMAP",
            Self::BrightPixels => "BLIT_BRIGHTEST",
            Self::Blur => "BLUR",
            Self::Bloom => "BLOOM",
            Self::DebugLights => "SHOW_LIGHTS",
        }
    }

    /// Shader file, relative to the shader root.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::TexturedQuad => "shaders/textured_quad.wgsl",
            Self::ForwardGeometry => "shaders/forward_geometry.wgsl",
            Self::Geometry => "shaders/geometry.wgsl",
            Self::Water => "shaders/water.wgsl",
            Self::Lighting => "shaders/lighting.wgsl",
            Self::Skybox => "shaders/skybox.wgsl",
            Self::BrightPixels => "shaders/bright_pixels.wgsl",
            Self::Blur => "shaders/blur.wgsl",
            Self::Bloom => "shaders/bloom.wgsl",
            Self::DebugLights => "shaders/debug_lights.wgsl",
        }
    }

    #[must_use]
    pub fn interface(self) -> ProgramInterface {
        match self {
            Self::TexturedQuad => ProgramInterface {
                attributes: vec![POSITION, QUAD_UV],
                uniform_blocks: vec![],
                samplers: vec![color(unit::ALBEDO)],
                params: vec![],
            },
            Self::ForwardGeometry => ProgramInterface {
                attributes: vec![POSITION, NORMAL, UV],
                uniform_blocks: vec![block::GLOBAL, block::LOCAL],
                samplers: vec![color(unit::ALBEDO)],
                params: vec![],
            },
            Self::Geometry => ProgramInterface {
                attributes: vec![POSITION, NORMAL, UV],
                uniform_blocks: vec![block::GLOBAL, block::LOCAL, block::CLIP_PLANE],
                samplers: vec![color(unit::ALBEDO)],
                params: vec![param::NEAR, param::FAR],
            },
            Self::Water => ProgramInterface {
                attributes: vec![POSITION, UV],
                uniform_blocks: vec![],
                samplers: vec![
                    color(unit::REFLECTION),
                    depth(unit::REFLECTION_DEPTH),
                    color(unit::REFRACTION),
                    depth(unit::REFRACTION_DEPTH),
                    color(unit::WATER_NORMAL),
                    color(unit::WATER_DUDV),
                ],
                params: vec![
                    param::WATER_PROJECTION,
                    param::WATER_VIEW,
                    param::WATER_VIEWPORT_SIZE,
                    param::WATER_VIEW_INVERSE,
                    param::WATER_PROJECTION_INVERSE,
                    param::WATER_MOVE_FACTOR,
                ],
            },
            Self::Lighting => ProgramInterface {
                attributes: vec![POSITION, QUAD_UV],
                uniform_blocks: vec![block::GLOBAL],
                samplers: vec![
                    color(unit::GBUFFER_ALBEDO),
                    color(unit::GBUFFER_POSITION),
                    color(unit::GBUFFER_NORMAL),
                ],
                params: vec![],
            },
            Self::Skybox => ProgramInterface {
                attributes: vec![POSITION],
                uniform_blocks: vec![],
                samplers: vec![SamplerSlot {
                    unit: unit::SKYBOX,
                    kind: SamplerKind::Cube,
                }],
                params: vec![param::SKYBOX_VIEW, param::SKYBOX_PROJECTION],
            },
            Self::BrightPixels => ProgramInterface {
                attributes: vec![POSITION, QUAD_UV],
                uniform_blocks: vec![],
                samplers: vec![color(0)],
                params: vec![param::THRESHOLD],
            },
            Self::Blur => ProgramInterface {
                attributes: vec![POSITION, QUAD_UV],
                uniform_blocks: vec![],
                samplers: vec![color(0)],
                params: vec![
                    param::BLUR_DIRECTION,
                    param::BLUR_INPUT_LOD,
                    param::BLUR_KERNEL_RADIUS,
                    param::BLUR_LOD_INTENSITY,
                ],
            },
            Self::Bloom => ProgramInterface {
                attributes: vec![POSITION, QUAD_UV],
                uniform_blocks: vec![],
                samplers: vec![color(unit::BLOOM_MAIN), color(unit::BLOOM_CHAIN)],
                params: vec![param::BLOOM_MAX_LOD],
            },
            Self::DebugLights => ProgramInterface {
                attributes: vec![POSITION],
                uniform_blocks: vec![],
                samplers: vec![],
                params: vec![param::LIGHT_MVP, param::LIGHT_COLOR],
            },
        }
    }
}

/// Handles to every built-in program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramLibrary {
    pub textured_quad: Handle<Program>,
    pub forward_geometry: Handle<Program>,
    pub geometry: Handle<Program>,
    pub water: Handle<Program>,
    pub lighting: Handle<Program>,
    pub skybox: Handle<Program>,
    pub bright_pixels: Handle<Program>,
    pub blur: Handle<Program>,
    pub bloom: Handle<Program>,
    pub debug_lights: Handle<Program>,
}

impl ProgramLibrary {
    /// Builds every built-in program.
    ///
    /// A program whose source is missing or fails to build is still
    /// registered, marked invalid, so the frame keeps running.
    pub fn load(device: &mut dyn GpuDevice, registry: &mut ResourceRegistry, loader: &mut dyn ShaderLoader) -> Self {
        Self {
            textured_quad: load_program(device, registry, loader, BuiltinProgram::TexturedQuad),
            forward_geometry: load_program(device, registry, loader, BuiltinProgram::ForwardGeometry),
            geometry: load_program(device, registry, loader, BuiltinProgram::Geometry),
            water: load_program(device, registry, loader, BuiltinProgram::Water),
            lighting: load_program(device, registry, loader, BuiltinProgram::Lighting),
            skybox: load_program(device, registry, loader, BuiltinProgram::Skybox),
            bright_pixels: load_program(device, registry, loader, BuiltinProgram::BrightPixels),
            blur: load_program(device, registry, loader, BuiltinProgram::Blur),
            bloom: load_program(device, registry, loader, BuiltinProgram::Bloom),
            debug_lights: load_program(device, registry, loader, BuiltinProgram::DebugLights),
        }
    }

    #[must_use]
    pub fn get(&self, program: BuiltinProgram) -> Handle<Program> {
        match program {
            BuiltinProgram::TexturedQuad => self.textured_quad,
            BuiltinProgram::ForwardGeometry => self.forward_geometry,
            BuiltinProgram::Geometry => self.geometry,
            BuiltinProgram::Water => self.water,
            BuiltinProgram::Lighting => self.lighting,
            BuiltinProgram::Skybox => self.skybox,
            BuiltinProgram::BrightPixels => self.bright_pixels,
            BuiltinProgram::Blur => self.blur,
            BuiltinProgram::Bloom => self.bloom,
            BuiltinProgram::DebugLights => self.debug_lights,
        }
    }
}

/// Loads, builds and registers one built-in program.
pub fn load_program(
    device: &mut dyn GpuDevice,
    registry: &mut ResourceRegistry,
    loader: &mut dyn ShaderLoader,
    program: BuiltinProgram,
) -> Handle<Program> {
    let (name, path) = (program.name(), program.path());
    let source = loader.load_source(path, name).unwrap_or_else(|err| {
        log::error!("Could not load program '{name}' from {path}: {err}");
        String::new()
    });

    let build = device.create_program(&ProgramSource {
        name: name.to_string(),
        path: path.to_string(),
        source,
        interface: program.interface(),
    });
    if let Some(diagnostics) = &build.diagnostics {
        log::error!("Program '{name}' failed to build:\n{diagnostics}");
    } else {
        log::debug!("Program '{name}' built with {} attributes", build.attributes.len());
    }

    registry.add_program(Program {
        gpu: build.id,
        name: name.to_string(),
        path: path.to_string(),
        attributes: build.attributes,
        valid: build.diagnostics.is_none(),
    })
}
