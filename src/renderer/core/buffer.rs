//! Uniform Arena
//!
//! A [`Buffer`] is a fixed-capacity byte arena mirrored into one GPU buffer.
//! Writers map it, push aligned values at a moving write head and unmap; the
//! bytes written during the mapping are uploaded on unmap so the next draw
//! observes them.
//!
//! Typed pushes follow the std140 base-alignment rules: vectors and matrices
//! start on 16-byte boundaries, `u32` on 4.

use glam::{Mat3, Mat4, Vec3, Vec4};

use super::device::{BufferKind, GpuBufferId, GpuDevice};
use crate::errors::{Result, TidalError};

/// Size of a 4-component float vector, the std140 base alignment of every
/// vector and matrix column.
pub const VEC4_ALIGNMENT: u32 = 16;

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a non-zero power of two.
#[inline]
#[must_use]
pub const fn align(value: u32, alignment: u32) -> u32 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// CPU shadow plus GPU storage with a write cursor.
#[derive(Debug)]
pub struct Buffer {
    label: String,
    kind: BufferKind,
    handle: GpuBufferId,
    data: Vec<u8>,
    head: u32,
}

impl Buffer {
    /// Allocates exactly `size` zero-initialized bytes on the device.
    pub fn create(device: &mut dyn GpuDevice, label: &str, size: u32, kind: BufferKind) -> Self {
        let handle = device.create_buffer(label, size, kind);
        log::debug!("Created {kind:?} buffer '{label}' ({size} bytes)");
        Self {
            label: label.to_string(),
            kind,
            handle,
            data: vec![0; size as usize],
            head: 0,
        }
    }

    /// Maps the full extent for writing.
    ///
    /// The returned guard borrows the buffer exclusively, so a second mapping
    /// cannot be taken until the first is released.
    pub fn map_for_write<'a>(&'a mut self, device: &'a mut dyn GpuDevice) -> BufferMapping<'a> {
        BufferMapping {
            dirty_end: 0,
            buffer: self,
            device,
        }
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.data.len() as u32
    }

    #[inline]
    #[must_use]
    pub fn head(&self) -> u32 {
        self.head
    }

    #[inline]
    #[must_use]
    pub fn handle(&self) -> GpuBufferId {
        self.handle
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Host copy of the arena contents as of the last write.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data
    }
}

/// Write access to a mapped [`Buffer`]. Dropping the guard unmaps it.
pub struct BufferMapping<'a> {
    buffer: &'a mut Buffer,
    device: &'a mut dyn GpuDevice,
    dirty_end: u32,
}

impl BufferMapping<'_> {
    /// Moves the write head back to the start of the arena.
    pub fn reset(&mut self) {
        self.buffer.head = 0;
    }

    #[inline]
    #[must_use]
    pub fn head(&self) -> u32 {
        self.buffer.head
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.buffer.capacity()
    }

    /// Advances the head to the next multiple of `alignment` without writing.
    pub fn align(&mut self, alignment: u32) -> Result<u32> {
        if !alignment.is_power_of_two() {
            return Err(TidalError::InvalidAlignment(alignment));
        }
        let aligned = align(self.buffer.head, alignment);
        if aligned > self.capacity() {
            return Err(self.overflow(aligned, 0));
        }
        self.buffer.head = aligned;
        Ok(aligned)
    }

    /// Aligns, copies `bytes` at the head and advances past them.
    ///
    /// Returns the offset the bytes were written at.
    pub fn push(&mut self, bytes: &[u8], alignment: u32) -> Result<u32> {
        if !alignment.is_power_of_two() {
            return Err(TidalError::InvalidAlignment(alignment));
        }
        let offset = align(self.buffer.head, alignment);
        let size = bytes.len() as u32;
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= self.capacity())
            .ok_or_else(|| self.overflow(offset, size))?;

        self.buffer.data[offset as usize..end as usize].copy_from_slice(bytes);
        self.buffer.head = end;
        self.dirty_end = self.dirty_end.max(end);
        Ok(offset)
    }

    pub fn push_u32(&mut self, value: u32) -> Result<u32> {
        self.push(&value.to_ne_bytes(), 4)
    }

    pub fn push_vec3(&mut self, value: Vec3) -> Result<u32> {
        self.push(bytemuck::bytes_of(&value), VEC4_ALIGNMENT)
    }

    pub fn push_vec4(&mut self, value: Vec4) -> Result<u32> {
        self.push(bytemuck::bytes_of(&value), VEC4_ALIGNMENT)
    }

    /// Three columns, each padded to a vec4 slot.
    pub fn push_mat3(&mut self, value: Mat3) -> Result<u32> {
        let cols = [
            value.x_axis.extend(0.0),
            value.y_axis.extend(0.0),
            value.z_axis.extend(0.0),
        ];
        self.push(bytemuck::cast_slice(&cols), VEC4_ALIGNMENT)
    }

    pub fn push_mat4(&mut self, value: Mat4) -> Result<u32> {
        self.push(bytemuck::bytes_of(&value), VEC4_ALIGNMENT)
    }

    /// Bytes written so far in `offset..offset + len`.
    #[must_use]
    pub fn bytes(&self, offset: u32, len: u32) -> &[u8] {
        &self.buffer.data[offset as usize..(offset + len) as usize]
    }

    /// Uploads the written region and releases the mapping.
    pub fn unmap(self) {}

    fn overflow(&self, offset: u32, requested: u32) -> TidalError {
        TidalError::UniformBufferOverflow {
            offset,
            requested,
            capacity: self.capacity(),
        }
    }
}

impl Drop for BufferMapping<'_> {
    fn drop(&mut self) {
        if self.dirty_end == 0 {
            return;
        }
        let len = self.dirty_end as usize;
        self.device
            .write_buffer(self.buffer.handle, 0, &self.buffer.data[..len]);
        log::trace!("Unmapped '{}' ({len} bytes uploaded)", self.buffer.label);
    }
}
