//! Backend abstraction traits for the rendering system
//!
//! [`GraphicsDevice`] is the pluggable graphics API: a native GL-style
//! backend supplied by the windowing layer, or the [`HeadlessDevice`] used
//! for tests and offline runs. [`RenderSurface`] is the windowing
//! collaborator's present primitive.
//!
//! Calls that operate on "the bound object" read the binding for the given
//! [`BindTarget`], so the resource objects in [`crate::render::resources`]
//! bind before they touch data.
//!
//! [`HeadlessDevice`]: crate::render::headless::HeadlessDevice

use std::any::Any;

use bitflags::bitflags;

use crate::core::error::EngineResult;
use crate::foundation::color::Color;

slotmap::new_key_type! {
    /// Backend-issued name for a native object
    pub struct NativeHandle;
}

/// Result type for backend operations
pub type BackendResult<T> = EngineResult<T>;

/// Native object kinds a device can create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Vertex, index or uniform storage
    Buffer,
    /// 2D image
    Texture,
    /// Single shader stage
    Shader,
    /// Linked shader program
    Program,
    /// Render target
    FrameBuffer,
    /// Non-sampled render target storage
    RenderBuffer,
    /// Vertex attribute layout plus bound element buffer
    VertexArray,
}

/// Binding points; one object may be current per target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindTarget {
    /// Vertex data
    ArrayBuffer,
    /// Index data
    ElementArrayBuffer,
    /// Uniform block data
    UniformBuffer,
    /// 2D texture
    Texture2D,
    /// Draw framebuffer
    FrameBuffer,
    /// Renderbuffer
    RenderBuffer,
    /// Vertex array
    VertexArray,
    /// Current program
    Program,
}

impl BindTarget {
    /// Object kind that may be bound to this target
    pub const fn object_kind(self) -> ObjectKind {
        match self {
            Self::ArrayBuffer | Self::ElementArrayBuffer | Self::UniformBuffer => ObjectKind::Buffer,
            Self::Texture2D => ObjectKind::Texture,
            Self::FrameBuffer => ObjectKind::FrameBuffer,
            Self::RenderBuffer => ObjectKind::RenderBuffer,
            Self::VertexArray => ObjectKind::VertexArray,
            Self::Program => ObjectKind::Program,
        }
    }
}

/// Buffer usage hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    /// Written once, drawn many times
    #[default]
    StaticDraw,
    /// Rewritten occasionally
    DynamicDraw,
    /// Rewritten every frame
    StreamDraw,
}

/// Pixel layout of texture and renderbuffer storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA
    Rgba8,
    /// 8-bit RGB
    Rgb8,
    /// Packed depth/stencil
    Depth24Stencil8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 | Self::Depth24Stencil8 => 4,
            Self::Rgb8 => 3,
        }
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Nearest texel
    Nearest,
    /// Bilinear
    #[default]
    Linear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    /// Clamp to the edge texel
    #[default]
    ClampToEdge,
    /// Tile
    Repeat,
    /// Tile mirrored
    MirroredRepeat,
}

/// Texture storage description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Pixel layout
    pub format: PixelFormat,
    /// Minification and magnification filter
    pub filter: Filter,
    /// Wrapping on both axes
    pub wrap: Wrap,
}

impl TextureDesc {
    /// RGBA8 texture with default sampling
    pub const fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            filter: Filter::Linear,
            wrap: Wrap::ClampToEdge,
        }
    }

    /// Bytes a full upload must contain
    pub const fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Texture parameter changes on the bound texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureParameter {
    /// Minification filter
    MinFilter(Filter),
    /// Magnification filter
    MagFilter(Filter),
    /// Horizontal wrap
    WrapS(Wrap),
    /// Vertical wrap
    WrapT(Wrap),
}

/// Framebuffer attachment points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Color attachment by index
    Color(u32),
    /// Depth
    Depth,
    /// Combined depth/stencil
    DepthStencil,
}

/// Result of a framebuffer completeness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// Ready to render into
    Complete,
    /// No attachments at all
    MissingAttachment,
    /// An attachment has no storage or mismatched size
    IncompleteAttachment,
}

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

/// Value for a loose program uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Integer, also used for sampler units
    Int(i32),
    /// Scalar
    Float(f32),
    /// 4-component vector
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix
    Mat4([f32; 16]),
}

/// Layout of one float vertex attribute in the bound array buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Float components (1 to 4)
    pub components: u8,
    /// Byte offset inside a vertex
    pub offset: usize,
    /// Byte distance between vertices
    pub stride: usize,
}

/// Primitive assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Independent triangles
    #[default]
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Independent lines
    Lines,
    /// Points
    Points,
}

bitflags! {
    /// Buffers cleared by [`GraphicsDevice::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        /// Color buffer
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

/// Graphics API abstraction
///
/// All methods are issued from the single frame-loop thread. Methods that
/// mention "bound" act on the object currently bound to the relevant target
/// and fail with [`EngineError::Backend`] when nothing suitable is bound.
///
/// [`EngineError::Backend`]: crate::core::error::EngineError::Backend
pub trait GraphicsDevice {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Called by the renderer before the first command of every frame
    fn begin_frame(&mut self) {}

    /// Create a native object
    fn create_object(&mut self, kind: ObjectKind) -> BackendResult<NativeHandle>;

    /// Delete a native object; bindings that reference it are cleared
    fn delete_object(&mut self, handle: NativeHandle) -> BackendResult<()>;

    /// Make `handle` current for `target`, or clear the target with `None`
    fn bind(&mut self, target: BindTarget, handle: Option<NativeHandle>) -> BackendResult<()>;

    /// Object currently bound to `target`
    fn bound(&self, target: BindTarget) -> Option<NativeHandle>;

    /// Replace the storage of the buffer bound to `target`
    fn buffer_data(&mut self, target: BindTarget, data: &[u8], usage: BufferUsage) -> BackendResult<()>;

    /// Overwrite part of the buffer bound to `target`
    fn buffer_sub_data(&mut self, target: BindTarget, offset: usize, data: &[u8]) -> BackendResult<()>;

    /// Attach a uniform buffer to an indexed uniform block slot
    fn bind_buffer_base(&mut self, slot: u32, handle: Option<NativeHandle>) -> BackendResult<()>;

    /// Allocate (and optionally fill) the bound texture
    fn texture_image(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> BackendResult<()>;

    /// Change a sampling parameter of the bound texture
    fn texture_parameter(&mut self, parameter: TextureParameter) -> BackendResult<()>;

    /// Bind a texture to a sampler unit for drawing
    fn bind_texture_unit(&mut self, unit: u32, handle: Option<NativeHandle>) -> BackendResult<()>;

    /// Allocate storage for the bound renderbuffer
    fn renderbuffer_storage(&mut self, format: PixelFormat, width: u32, height: u32) -> BackendResult<()>;

    /// Attach a texture to the bound framebuffer
    fn framebuffer_texture(&mut self, attachment: Attachment, texture: NativeHandle) -> BackendResult<()>;

    /// Attach a renderbuffer to the bound framebuffer
    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: NativeHandle) -> BackendResult<()>;

    /// Completeness of the bound framebuffer
    fn framebuffer_status(&self) -> BackendResult<FramebufferStatus>;

    /// Select the color attachments written by fragment output
    fn draw_buffers(&mut self, color_attachments: &[u32]) -> BackendResult<()>;

    /// Compile source into a shader object
    fn compile_shader(&mut self, shader: NativeHandle, stage: ShaderStage, source: &str) -> BackendResult<()>;

    /// Link compiled shaders into a program
    fn link_program(&mut self, program: NativeHandle, shaders: &[NativeHandle]) -> BackendResult<()>;

    /// Set a loose uniform on the bound program
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> BackendResult<()>;

    /// Point a named uniform block of the bound program at a buffer slot
    fn uniform_block_binding(&mut self, block: &str, slot: u32) -> BackendResult<()>;

    /// Describe an attribute of the bound vertex array, sourced from the bound array buffer
    fn vertex_attribute(&mut self, attribute: &VertexAttribute) -> BackendResult<()>;

    /// Draw non-indexed primitives from the bound vertex array
    fn draw_arrays(&mut self, topology: Topology, first: usize, count: usize) -> BackendResult<()>;

    /// Draw indexed primitives from the bound vertex array
    fn draw_elements(&mut self, topology: Topology, count: usize) -> BackendResult<()>;

    /// Set the viewport
    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Set the color used by color clears
    fn clear_color(&mut self, color: Color);

    /// Clear buffers of the bound framebuffer (or the default one)
    fn clear(&mut self, flags: ClearFlags) -> BackendResult<()>;

    /// Copy `source` to `destination` (`None` is the default framebuffer), scaling as needed
    fn blit_framebuffer(
        &mut self,
        source: NativeHandle,
        source_size: (u32, u32),
        destination: Option<NativeHandle>,
        destination_size: (u32, u32),
    ) -> BackendResult<()>;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Presentation surface owned by the windowing collaborator
pub trait RenderSurface {
    /// Present the default framebuffer
    fn swap_buffers(&mut self) -> BackendResult<()>;

    /// Current drawable size in pixels
    fn size(&self) -> (u32, u32);

    /// Downcast support
    fn as_any(&self) -> &dyn Any;
}
