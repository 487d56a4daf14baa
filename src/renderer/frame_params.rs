//! Frame Parameter Packer
//!
//! Serializes camera, lights, entity transforms and an optional clip plane
//! into the shared uniform arena and records where each block landed.
//!
//! Global block layout (std140):
//!
//! | offset | field                                     |
//! |--------|-------------------------------------------|
//! | 0      | camera position (vec3)                    |
//! | 12     | light count (u32)                         |
//! | 16+64i | light type (u32)                          |
//! | 32+64i | color x intensity (vec3)                  |
//! | 48+64i | direction (vec3)                          |
//! | 64+64i | position (vec3)                           |
//!
//! Each entity block starts on the device's uniform offset alignment and
//! holds the world matrix followed by projection x view x world.

use glam::Vec4;

use crate::errors::Result;
use crate::renderer::core::{Buffer, BufferRange, GpuDevice, VEC4_ALIGNMENT};
use crate::scene::{Camera, Entity, Light};

/// Byte ranges written by one [`pack_frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameParams {
    pub global: BufferRange,
    pub clip_plane: Option<BufferRange>,
}

/// Size of one entity block: two 4x4 float matrices.
pub const ENTITY_BLOCK_SIZE: u32 = 128;

/// Repacks the whole arena for `camera`.
///
/// Entity ranges are stored on the entities themselves. Running out of
/// arena space is an error: the scene does not fit the device's uniform
/// capacity.
pub fn pack_frame(
    buffer: &mut Buffer,
    device: &mut dyn GpuDevice,
    camera: &Camera,
    entities: &mut [Entity],
    lights: &[Light],
    clip_plane: Option<Vec4>,
    block_alignment: u32,
) -> Result<FrameParams> {
    let mut map = buffer.map_for_write(device);
    map.reset();

    // Global block
    let global_offset = map.head();
    map.push_vec3(camera.position)?;
    map.push_u32(lights.len() as u32)?;
    for light in lights {
        map.align(VEC4_ALIGNMENT)?;
        map.push_u32(light.kind.gpu_tag())?;
        map.push_vec3(light.radiance())?;
        map.push_vec3(light.direction)?;
        map.push_vec3(light.position)?;
    }
    let global = BufferRange {
        offset: global_offset,
        size: map.head() - global_offset,
    };

    // Local blocks
    let view_projection = camera.view_projection();
    for entity in entities.iter_mut() {
        let offset = map.align(block_alignment)?;
        let world = entity.world_matrix();
        map.push_mat4(world)?;
        map.push_mat4(view_projection * world)?;
        entity.local_params = BufferRange {
            offset,
            size: map.head() - offset,
        };
    }

    // Clip plane
    let clip_plane = match clip_plane {
        Some(plane) => {
            let offset = map.align(block_alignment)?;
            map.push_vec4(plane)?;
            Some(BufferRange {
                offset,
                size: map.head() - offset,
            })
        }
        None => None,
    };

    log::trace!(
        "Packed frame: {} lights, {} entities, {} bytes",
        lights.len(),
        entities.len(),
        map.head()
    );
    map.unmap();

    Ok(FrameParams { global, clip_plane })
}
