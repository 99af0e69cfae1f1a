//! Headless graphics backend
//!
//! A [`GraphicsDevice`] with no GPU behind it. Objects live in a slot map,
//! the native rules a driver would enforce are checked (kind/target
//! agreement, uploads need a bound object, deleted names cannot be bound,
//! programs must link before use) and every call is appended to a command
//! log that tests and tools can inspect. The log is cleared at the start of
//! every frame, so it only ever holds the calls of the frame in flight (plus
//! set-up calls issued before the first frame).

use std::any::Any;
use std::collections::HashMap;

use slotmap::SlotMap;

use super::backend::{
    Attachment, BackendResult, BindTarget, BufferUsage, ClearFlags, FramebufferStatus,
    GraphicsDevice, NativeHandle, ObjectKind, PixelFormat, RenderSurface, ShaderStage,
    TextureDesc, TextureParameter, Topology, UniformValue, VertexAttribute,
};
use crate::core::error::EngineError;
use crate::foundation::color::Color;

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Object created
    Create {
        /// Kind requested
        kind: ObjectKind,
        /// Name issued
        handle: NativeHandle,
    },
    /// Object deleted
    Delete {
        /// Name released
        handle: NativeHandle,
    },
    /// Binding changed
    Bind {
        /// Binding point
        target: BindTarget,
        /// New binding
        handle: Option<NativeHandle>,
    },
    /// Buffer storage written
    BufferData {
        /// Buffer written
        handle: NativeHandle,
        /// First byte written
        offset: usize,
        /// Bytes written
        len: usize,
    },
    /// Uniform buffer attached to a slot
    BindBufferBase {
        /// Uniform block slot
        slot: u32,
        /// Buffer attached
        handle: Option<NativeHandle>,
    },
    /// Texture storage allocated
    TextureImage {
        /// Texture written
        handle: NativeHandle,
        /// Width in texels
        width: u32,
        /// Height in texels
        height: u32,
    },
    /// Renderbuffer storage allocated
    RenderbufferStorage {
        /// Renderbuffer written
        handle: NativeHandle,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Program linked
    LinkProgram {
        /// Program linked
        handle: NativeHandle,
    },
    /// Uniform set on the bound program
    SetUniform {
        /// Program modified
        program: NativeHandle,
        /// Uniform name
        name: String,
    },
    /// Primitives drawn
    Draw {
        /// Program in use
        program: NativeHandle,
        /// Vertex array drawn
        vertex_array: NativeHandle,
        /// Render target, `None` for the default framebuffer
        framebuffer: Option<NativeHandle>,
        /// Buffer attached to uniform slot 0
        uniform_slot0: Option<NativeHandle>,
        /// Vertices or indices consumed
        count: usize,
        /// Whether an element buffer was used
        indexed: bool,
    },
    /// Viewport changed
    Viewport {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Clear color changed
    ClearColor(Color),
    /// Buffers cleared
    Clear {
        /// Framebuffer cleared, `None` for the default one
        framebuffer: Option<NativeHandle>,
        /// Buffers cleared
        flags: ClearFlags,
    },
    /// Framebuffer copied
    Blit {
        /// Source framebuffer
        source: NativeHandle,
        /// Destination, `None` for the default framebuffer
        destination: Option<NativeHandle>,
    },
}

#[derive(Debug)]
enum ObjectData {
    Buffer {
        bytes: Vec<u8>,
    },
    Texture {
        desc: Option<TextureDesc>,
        parameters: Vec<TextureParameter>,
    },
    Shader {
        stage: Option<ShaderStage>,
    },
    Program {
        linked: bool,
        uniforms: HashMap<String, UniformValue>,
        blocks: HashMap<String, u32>,
    },
    FrameBuffer {
        attachments: HashMap<Attachment, NativeHandle>,
        draw_buffers: Vec<u32>,
    },
    RenderBuffer {
        storage: Option<(PixelFormat, u32, u32)>,
    },
    VertexArray {
        attributes: Vec<VertexAttribute>,
        element_buffer: Option<NativeHandle>,
    },
}

impl ObjectData {
    fn new(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Buffer => Self::Buffer { bytes: Vec::new() },
            ObjectKind::Texture => Self::Texture {
                desc: None,
                parameters: Vec::new(),
            },
            ObjectKind::Shader => Self::Shader { stage: None },
            ObjectKind::Program => Self::Program {
                linked: false,
                uniforms: HashMap::new(),
                blocks: HashMap::new(),
            },
            ObjectKind::FrameBuffer => Self::FrameBuffer {
                attachments: HashMap::new(),
                draw_buffers: vec![0],
            },
            ObjectKind::RenderBuffer => Self::RenderBuffer { storage: None },
            ObjectKind::VertexArray => Self::VertexArray {
                attributes: Vec::new(),
                element_buffer: None,
            },
        }
    }
}

#[derive(Debug)]
struct NativeObject {
    kind: ObjectKind,
    data: ObjectData,
}

/// In-memory graphics device that records every call
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    objects: SlotMap<NativeHandle, NativeObject>,
    bindings: HashMap<BindTarget, NativeHandle>,
    uniform_slots: HashMap<u32, NativeHandle>,
    texture_units: HashMap<u32, NativeHandle>,
    viewport: (i32, i32, u32, u32),
    clear_color: Color,
    commands: Vec<DeviceCommand>,
    frames: u64,
    total_draws: u64,
}

impl HeadlessDevice {
    /// Empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded since the current frame began
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Frames begun on this device
    pub const fn frames_begun(&self) -> u64 {
        self.frames
    }

    /// Draw calls issued over the device's lifetime, across frames
    pub const fn total_draws(&self) -> u64 {
        self.total_draws
    }

    fn record_draw(&mut self, command: DeviceCommand) {
        self.total_draws += 1;
        self.commands.push(command);
    }

    /// Draw calls of the current frame, in order
    pub fn draw_calls(&self) -> impl Iterator<Item = &DeviceCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DeviceCommand::Draw { .. }))
    }

    /// Number of live native objects
    pub fn live_objects(&self) -> usize {
        self.objects.len()
    }

    /// Number of live native objects of one kind
    pub fn live_objects_of(&self, kind: ObjectKind) -> usize {
        self.objects.values().filter(|o| o.kind == kind).count()
    }

    /// Whether `handle` names a live object
    pub fn is_live(&self, handle: NativeHandle) -> bool {
        self.objects.contains_key(handle)
    }

    /// Contents of a buffer
    pub fn buffer_contents(&self, handle: NativeHandle) -> Option<&[u8]> {
        match &self.objects.get(handle)?.data {
            ObjectData::Buffer { bytes } => Some(bytes),
            _ => None,
        }
    }

    /// Storage description of a texture
    pub fn texture_desc(&self, handle: NativeHandle) -> Option<TextureDesc> {
        match &self.objects.get(handle)?.data {
            ObjectData::Texture { desc, .. } => *desc,
            _ => None,
        }
    }

    /// Parameters set on a texture, in call order
    pub fn texture_parameters(&self, handle: NativeHandle) -> Option<&[TextureParameter]> {
        match &self.objects.get(handle)?.data {
            ObjectData::Texture { parameters, .. } => Some(parameters),
            _ => None,
        }
    }

    /// Storage of a renderbuffer
    pub fn renderbuffer_storage_of(&self, handle: NativeHandle) -> Option<(PixelFormat, u32, u32)> {
        match &self.objects.get(handle)?.data {
            ObjectData::RenderBuffer { storage } => *storage,
            _ => None,
        }
    }

    /// Last value set for a program uniform
    pub fn uniform(&self, program: NativeHandle, name: &str) -> Option<UniformValue> {
        match &self.objects.get(program)?.data {
            ObjectData::Program { uniforms, .. } => uniforms.get(name).copied(),
            _ => None,
        }
    }

    /// Attributes described on a vertex array
    pub fn vertex_attributes(&self, vertex_array: NativeHandle) -> Option<&[VertexAttribute]> {
        match &self.objects.get(vertex_array)?.data {
            ObjectData::VertexArray { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// Current viewport `(x, y, width, height)`
    pub fn current_viewport(&self) -> (i32, i32, u32, u32) {
        self.viewport
    }

    /// Current clear color
    pub fn current_clear_color(&self) -> Color {
        self.clear_color
    }

    fn object(&self, handle: NativeHandle) -> BackendResult<&NativeObject> {
        self.objects
            .get(handle)
            .ok_or_else(|| EngineError::backend(format!("{handle:?} is not a live object")))
    }

    fn bound_handle(&self, target: BindTarget) -> BackendResult<NativeHandle> {
        self.bindings
            .get(&target)
            .copied()
            .ok_or_else(|| EngineError::backend(format!("nothing bound to {target:?}")))
    }

    fn bound_data(&mut self, target: BindTarget) -> BackendResult<(NativeHandle, &mut ObjectData)> {
        let handle = self.bound_handle(target)?;
        let object = self
            .objects
            .get_mut(handle)
            .ok_or_else(|| EngineError::backend(format!("{handle:?} is not a live object")))?;
        Ok((handle, &mut object.data))
    }

    fn expect_kind(&self, handle: NativeHandle, kind: ObjectKind) -> BackendResult<()> {
        let object = self.object(handle)?;
        if object.kind == kind {
            Ok(())
        } else {
            Err(EngineError::backend(format!(
                "{handle:?} is a {:?}, expected {kind:?}",
                object.kind
            )))
        }
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn name(&self) -> &str {
        "headless"
    }

    fn begin_frame(&mut self) {
        self.frames += 1;
        self.commands.clear();
    }

    fn create_object(&mut self, kind: ObjectKind) -> BackendResult<NativeHandle> {
        let handle = self.objects.insert(NativeObject {
            kind,
            data: ObjectData::new(kind),
        });
        log::trace!("headless: created {:?} {:?}", kind, handle);
        self.commands.push(DeviceCommand::Create { kind, handle });
        Ok(handle)
    }

    fn delete_object(&mut self, handle: NativeHandle) -> BackendResult<()> {
        if self.objects.remove(handle).is_none() {
            return Err(EngineError::backend(format!("double delete of {handle:?}")));
        }
        self.bindings.retain(|_, bound| *bound != handle);
        self.uniform_slots.retain(|_, bound| *bound != handle);
        self.texture_units.retain(|_, bound| *bound != handle);
        log::trace!("headless: deleted {:?}", handle);
        self.commands.push(DeviceCommand::Delete { handle });
        Ok(())
    }

    fn bind(&mut self, target: BindTarget, handle: Option<NativeHandle>) -> BackendResult<()> {
        match handle {
            Some(handle) => {
                self.expect_kind(handle, target.object_kind())?;
                if target == BindTarget::Program {
                    if let ObjectData::Program { linked: false, .. } = self.object(handle)?.data {
                        return Err(EngineError::backend(format!(
                            "program {handle:?} used before linking"
                        )));
                    }
                }
                self.bindings.insert(target, handle);
                if target == BindTarget::ElementArrayBuffer {
                    if let Some(vao) = self.bindings.get(&BindTarget::VertexArray).copied() {
                        if let Some(NativeObject {
                            data: ObjectData::VertexArray { element_buffer, .. },
                            ..
                        }) = self.objects.get_mut(vao)
                        {
                            *element_buffer = Some(handle);
                        }
                    }
                }
            }
            None => {
                self.bindings.remove(&target);
            }
        }
        self.commands.push(DeviceCommand::Bind { target, handle });
        Ok(())
    }

    fn bound(&self, target: BindTarget) -> Option<NativeHandle> {
        self.bindings.get(&target).copied()
    }

    fn buffer_data(&mut self, target: BindTarget, data: &[u8], _usage: BufferUsage) -> BackendResult<()> {
        let (handle, object) = self.bound_data(target)?;
        if let ObjectData::Buffer { bytes } = object {
            *bytes = data.to_vec();
        }
        self.commands.push(DeviceCommand::BufferData {
            handle,
            offset: 0,
            len: data.len(),
        });
        Ok(())
    }

    fn buffer_sub_data(&mut self, target: BindTarget, offset: usize, data: &[u8]) -> BackendResult<()> {
        let (handle, object) = self.bound_data(target)?;
        if let ObjectData::Buffer { bytes } = object {
            let end = offset + data.len();
            if end > bytes.len() {
                return Err(EngineError::backend(format!(
                    "sub-data range {offset}..{end} exceeds buffer of {} bytes",
                    bytes.len()
                )));
            }
            bytes[offset..end].copy_from_slice(data);
        }
        self.commands.push(DeviceCommand::BufferData {
            handle,
            offset,
            len: data.len(),
        });
        Ok(())
    }

    fn bind_buffer_base(&mut self, slot: u32, handle: Option<NativeHandle>) -> BackendResult<()> {
        match handle {
            Some(handle) => {
                self.expect_kind(handle, ObjectKind::Buffer)?;
                self.uniform_slots.insert(slot, handle);
            }
            None => {
                self.uniform_slots.remove(&slot);
            }
        }
        self.commands.push(DeviceCommand::BindBufferBase { slot, handle });
        Ok(())
    }

    fn texture_image(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> BackendResult<()> {
        if let Some(pixels) = pixels {
            if pixels.len() != desc.byte_len() {
                return Err(EngineError::backend(format!(
                    "texture upload of {} bytes, {}x{} {:?} needs {}",
                    pixels.len(),
                    desc.width,
                    desc.height,
                    desc.format,
                    desc.byte_len()
                )));
            }
        }
        let (handle, object) = self.bound_data(BindTarget::Texture2D)?;
        if let ObjectData::Texture { desc: stored, .. } = object {
            *stored = Some(*desc);
        }
        self.commands.push(DeviceCommand::TextureImage {
            handle,
            width: desc.width,
            height: desc.height,
        });
        Ok(())
    }

    fn texture_parameter(&mut self, parameter: TextureParameter) -> BackendResult<()> {
        let (_, object) = self.bound_data(BindTarget::Texture2D)?;
        if let ObjectData::Texture { parameters, .. } = object {
            parameters.push(parameter);
        }
        Ok(())
    }

    fn bind_texture_unit(&mut self, unit: u32, handle: Option<NativeHandle>) -> BackendResult<()> {
        match handle {
            Some(handle) => {
                self.expect_kind(handle, ObjectKind::Texture)?;
                self.texture_units.insert(unit, handle);
            }
            None => {
                self.texture_units.remove(&unit);
            }
        }
        Ok(())
    }

    fn renderbuffer_storage(&mut self, format: PixelFormat, width: u32, height: u32) -> BackendResult<()> {
        let (handle, object) = self.bound_data(BindTarget::RenderBuffer)?;
        if let ObjectData::RenderBuffer { storage } = object {
            *storage = Some((format, width, height));
        }
        self.commands.push(DeviceCommand::RenderbufferStorage {
            handle,
            width,
            height,
        });
        Ok(())
    }

    fn framebuffer_texture(&mut self, attachment: Attachment, texture: NativeHandle) -> BackendResult<()> {
        self.expect_kind(texture, ObjectKind::Texture)?;
        let (_, object) = self.bound_data(BindTarget::FrameBuffer)?;
        if let ObjectData::FrameBuffer { attachments, .. } = object {
            attachments.insert(attachment, texture);
        }
        Ok(())
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: NativeHandle) -> BackendResult<()> {
        self.expect_kind(renderbuffer, ObjectKind::RenderBuffer)?;
        let (_, object) = self.bound_data(BindTarget::FrameBuffer)?;
        if let ObjectData::FrameBuffer { attachments, .. } = object {
            attachments.insert(attachment, renderbuffer);
        }
        Ok(())
    }

    fn framebuffer_status(&self) -> BackendResult<FramebufferStatus> {
        let handle = self.bound_handle(BindTarget::FrameBuffer)?;
        let ObjectData::FrameBuffer { attachments, .. } = &self.object(handle)?.data else {
            return Err(EngineError::backend("bound framebuffer has no framebuffer data"));
        };
        if attachments.is_empty() {
            return Ok(FramebufferStatus::MissingAttachment);
        }
        let mut size = None;
        for attached in attachments.values() {
            let extent = match self.objects.get(*attached).map(|o| &o.data) {
                Some(ObjectData::Texture { desc: Some(d), .. }) => (d.width, d.height),
                Some(ObjectData::RenderBuffer { storage: Some((_, w, h)) }) => (*w, *h),
                _ => return Ok(FramebufferStatus::IncompleteAttachment),
            };
            match size {
                None => size = Some(extent),
                Some(s) if s != extent => return Ok(FramebufferStatus::IncompleteAttachment),
                Some(_) => {}
            }
        }
        Ok(FramebufferStatus::Complete)
    }

    fn draw_buffers(&mut self, color_attachments: &[u32]) -> BackendResult<()> {
        let (_, object) = self.bound_data(BindTarget::FrameBuffer)?;
        if let ObjectData::FrameBuffer { draw_buffers, .. } = object {
            *draw_buffers = color_attachments.to_vec();
        }
        Ok(())
    }

    fn compile_shader(&mut self, shader: NativeHandle, stage: ShaderStage, source: &str) -> BackendResult<()> {
        self.expect_kind(shader, ObjectKind::Shader)?;
        if source.trim().is_empty() {
            return Err(EngineError::backend(format!("{stage:?} shader source is empty")));
        }
        if let Some(NativeObject {
            data: ObjectData::Shader { stage: stored },
            ..
        }) = self.objects.get_mut(shader)
        {
            *stored = Some(stage);
        }
        Ok(())
    }

    fn link_program(&mut self, program: NativeHandle, shaders: &[NativeHandle]) -> BackendResult<()> {
        self.expect_kind(program, ObjectKind::Program)?;
        let mut stages = Vec::with_capacity(shaders.len());
        for shader in shaders {
            match &self.object(*shader)?.data {
                ObjectData::Shader { stage: Some(stage) } => stages.push(*stage),
                _ => {
                    return Err(EngineError::backend(format!(
                        "shader {shader:?} is not compiled"
                    )))
                }
            }
        }
        if !stages.contains(&ShaderStage::Vertex) || !stages.contains(&ShaderStage::Fragment) {
            return Err(EngineError::backend(
                "program needs a vertex and a fragment stage",
            ));
        }
        if let Some(NativeObject {
            data: ObjectData::Program { linked, .. },
            ..
        }) = self.objects.get_mut(program)
        {
            *linked = true;
        }
        self.commands.push(DeviceCommand::LinkProgram { handle: program });
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> BackendResult<()> {
        let (program, object) = self.bound_data(BindTarget::Program)?;
        if let ObjectData::Program { uniforms, .. } = object {
            uniforms.insert(name.to_string(), value);
        }
        self.commands.push(DeviceCommand::SetUniform {
            program,
            name: name.to_string(),
        });
        Ok(())
    }

    fn uniform_block_binding(&mut self, block: &str, slot: u32) -> BackendResult<()> {
        let (_, object) = self.bound_data(BindTarget::Program)?;
        if let ObjectData::Program { blocks, .. } = object {
            blocks.insert(block.to_string(), slot);
        }
        Ok(())
    }

    fn vertex_attribute(&mut self, attribute: &VertexAttribute) -> BackendResult<()> {
        if !(1..=4).contains(&attribute.components) {
            return Err(EngineError::backend(format!(
                "attribute {} has {} components",
                attribute.location, attribute.components
            )));
        }
        self.bound_handle(BindTarget::ArrayBuffer)?;
        let (_, object) = self.bound_data(BindTarget::VertexArray)?;
        if let ObjectData::VertexArray { attributes, .. } = object {
            attributes.retain(|a| a.location != attribute.location);
            attributes.push(*attribute);
        }
        Ok(())
    }

    fn draw_arrays(&mut self, _topology: Topology, _first: usize, count: usize) -> BackendResult<()> {
        let program = self.bound_handle(BindTarget::Program)?;
        let vertex_array = self.bound_handle(BindTarget::VertexArray)?;
        let framebuffer = self.bound(BindTarget::FrameBuffer);
        let uniform_slot0 = self.uniform_slots.get(&0).copied();
        self.record_draw(DeviceCommand::Draw {
            program,
            vertex_array,
            framebuffer,
            uniform_slot0,
            count,
            indexed: false,
        });
        Ok(())
    }

    fn draw_elements(&mut self, _topology: Topology, count: usize) -> BackendResult<()> {
        let program = self.bound_handle(BindTarget::Program)?;
        let vertex_array = self.bound_handle(BindTarget::VertexArray)?;
        let has_elements = matches!(
            self.object(vertex_array)?.data,
            ObjectData::VertexArray {
                element_buffer: Some(_),
                ..
            }
        );
        if !has_elements {
            return Err(EngineError::backend(format!(
                "indexed draw from {vertex_array:?} without an element buffer"
            )));
        }
        let framebuffer = self.bound(BindTarget::FrameBuffer);
        let uniform_slot0 = self.uniform_slots.get(&0).copied();
        self.record_draw(DeviceCommand::Draw {
            program,
            vertex_array,
            framebuffer,
            uniform_slot0,
            count,
            indexed: true,
        });
        Ok(())
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
        self.commands.push(DeviceCommand::Viewport { width, height });
    }

    fn clear_color(&mut self, color: Color) {
        self.clear_color = color;
        self.commands.push(DeviceCommand::ClearColor(color));
    }

    fn clear(&mut self, flags: ClearFlags) -> BackendResult<()> {
        let framebuffer = self.bound(BindTarget::FrameBuffer);
        if framebuffer.is_some() {
            let status = self.framebuffer_status()?;
            if status != FramebufferStatus::Complete {
                return Err(EngineError::backend(format!("clear of an incomplete framebuffer: {status:?}")));
            }
        }
        self.commands.push(DeviceCommand::Clear { framebuffer, flags });
        Ok(())
    }

    fn blit_framebuffer(
        &mut self,
        source: NativeHandle,
        _source_size: (u32, u32),
        destination: Option<NativeHandle>,
        _destination_size: (u32, u32),
    ) -> BackendResult<()> {
        self.expect_kind(source, ObjectKind::FrameBuffer)?;
        if let Some(destination) = destination {
            self.expect_kind(destination, ObjectKind::FrameBuffer)?;
        }
        self.commands.push(DeviceCommand::Blit {
            source,
            destination,
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Surface that counts presents and reports a fixed size
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    size: (u32, u32),
    presented: u64,
}

impl HeadlessSurface {
    /// Surface of the given size
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            presented: 0,
        }
    }

    /// Simulate a window resize
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    /// Number of `swap_buffers` calls
    pub const fn presented_frames(&self) -> u64 {
        self.presented
    }
}

impl RenderSurface for HeadlessSurface {
    fn swap_buffers(&mut self) -> BackendResult<()> {
        self.presented += 1;
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_requires_matching_kind() {
        let mut device = HeadlessDevice::new();
        let texture = device.create_object(ObjectKind::Texture).unwrap();
        assert!(device.bind(BindTarget::ArrayBuffer, Some(texture)).is_err());
        assert!(device.bind(BindTarget::Texture2D, Some(texture)).is_ok());
        assert_eq!(device.bound(BindTarget::Texture2D), Some(texture));
    }

    #[test]
    fn test_upload_needs_binding() {
        let mut device = HeadlessDevice::new();
        let buffer = device.create_object(ObjectKind::Buffer).unwrap();
        assert!(device
            .buffer_data(BindTarget::ArrayBuffer, &[1, 2, 3], BufferUsage::StaticDraw)
            .is_err());
        device.bind(BindTarget::ArrayBuffer, Some(buffer)).unwrap();
        device
            .buffer_data(BindTarget::ArrayBuffer, &[1, 2, 3], BufferUsage::StaticDraw)
            .unwrap();
        device.buffer_sub_data(BindTarget::ArrayBuffer, 1, &[9]).unwrap();
        assert_eq!(device.buffer_contents(buffer), Some(&[1, 9, 3][..]));
        assert!(device.buffer_sub_data(BindTarget::ArrayBuffer, 2, &[0, 0]).is_err());
    }

    #[test]
    fn test_delete_clears_bindings() {
        let mut device = HeadlessDevice::new();
        let buffer = device.create_object(ObjectKind::Buffer).unwrap();
        device.bind(BindTarget::UniformBuffer, Some(buffer)).unwrap();
        device.delete_object(buffer).unwrap();
        assert_eq!(device.bound(BindTarget::UniformBuffer), None);
        assert!(device.bind(BindTarget::UniformBuffer, Some(buffer)).is_err());
        assert!(device.delete_object(buffer).is_err());
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_program_must_link_before_use() {
        let mut device = HeadlessDevice::new();
        let program = device.create_object(ObjectKind::Program).unwrap();
        assert!(device.bind(BindTarget::Program, Some(program)).is_err());

        let vs = device.create_object(ObjectKind::Shader).unwrap();
        let fs = device.create_object(ObjectKind::Shader).unwrap();
        device.compile_shader(vs, ShaderStage::Vertex, "void main() {}").unwrap();
        assert!(device.link_program(program, &[vs, fs]).is_err());
        device.compile_shader(fs, ShaderStage::Fragment, "void main() {}").unwrap();
        device.link_program(program, &[vs, fs]).unwrap();
        device.bind(BindTarget::Program, Some(program)).unwrap();
        device.set_uniform("u_opacity", UniformValue::Float(0.5)).unwrap();
        assert_eq!(device.uniform(program, "u_opacity"), Some(UniformValue::Float(0.5)));
    }

    #[test]
    fn test_framebuffer_completeness() {
        let mut device = HeadlessDevice::new();
        let fbo = device.create_object(ObjectKind::FrameBuffer).unwrap();
        let tex = device.create_object(ObjectKind::Texture).unwrap();
        let rbo = device.create_object(ObjectKind::RenderBuffer).unwrap();
        device.bind(BindTarget::FrameBuffer, Some(fbo)).unwrap();
        assert_eq!(device.framebuffer_status().unwrap(), FramebufferStatus::MissingAttachment);

        device.framebuffer_texture(Attachment::Color(0), tex).unwrap();
        assert_eq!(device.framebuffer_status().unwrap(), FramebufferStatus::IncompleteAttachment);

        device.bind(BindTarget::Texture2D, Some(tex)).unwrap();
        device.texture_image(&TextureDesc::rgba8(4, 4), None).unwrap();
        device.bind(BindTarget::RenderBuffer, Some(rbo)).unwrap();
        device.renderbuffer_storage(PixelFormat::Depth24Stencil8, 4, 4).unwrap();
        device.framebuffer_renderbuffer(Attachment::DepthStencil, rbo).unwrap();
        assert_eq!(device.framebuffer_status().unwrap(), FramebufferStatus::Complete);
    }

    #[test]
    fn test_texture_upload_size_checked() {
        let mut device = HeadlessDevice::new();
        let tex = device.create_object(ObjectKind::Texture).unwrap();
        device.bind(BindTarget::Texture2D, Some(tex)).unwrap();
        assert!(device.texture_image(&TextureDesc::rgba8(2, 2), Some(&[0; 15])).is_err());
        device.texture_image(&TextureDesc::rgba8(2, 2), Some(&[0; 16])).unwrap();
        assert_eq!(device.texture_desc(tex).map(|d| d.width), Some(2));
    }

    #[test]
    fn test_begin_frame_clears_the_log() {
        let mut device = HeadlessDevice::new();
        device.clear_color(Color::RED);
        device.clear(ClearFlags::COLOR).unwrap();
        assert_eq!(device.commands().len(), 2);

        device.begin_frame();
        assert!(device.commands().is_empty());
        assert_eq!(device.frames_begun(), 1);
        assert_eq!(device.current_clear_color(), Color::RED);
    }

    #[test]
    fn test_surface_counts_presents() {
        let mut surface = HeadlessSurface::new(800, 600);
        surface.swap_buffers().unwrap();
        surface.swap_buffers().unwrap();
        assert_eq!(surface.presented_frames(), 2);
        assert_eq!(surface.size(), (800, 600));
    }
}
