//! # Rendering System
//!
//! Backend-agnostic rendering for the scene graph.
//!
//! ## Architecture
//!
//! ```text
//! Renderer (frame orchestration, offscreen target)
//!      ↓  RenderItem per drawable entity, ordered by depth
//! ProtocolRegistry (kind → RenderProtocol)
//!      ↓  bind / upload / draw
//! GpuResource objects (Buffer, Texture, ShaderProgram, ...)
//!      ↓
//! GraphicsDevice (native backend, or HeadlessDevice)
//! ```
//!
//! - **Renderer**: clears, walks the scene, dispatches and presents
//! - **Protocols**: one draw strategy per entity kind
//! - **Resources**: move-only wrappers owning exactly one native object
//! - **Backend**: the trait a windowing/graphics collaborator implements

pub mod backend;
pub mod headless;
pub mod protocol;
pub mod protocols;
pub mod queue;
pub mod renderer;
pub mod resources;

pub use backend::{
    Attachment, BackendResult, BindTarget, BufferUsage, ClearFlags, Filter, FramebufferStatus, GraphicsDevice,
    NativeHandle, ObjectKind, PixelFormat, RenderSurface, ShaderStage, TextureDesc, TextureParameter, Topology,
    UniformValue, VertexAttribute, Wrap,
};
pub use headless::{DeviceCommand, HeadlessDevice, HeadlessSurface};
pub use protocol::{ProtocolRegistry, RenderProtocol};
pub use protocols::{EntityUniforms, QuadProtocol, QuadVertex};
pub use queue::{RenderItem, RenderQueue};
pub use renderer::{Renderer, StandardRenderer};
pub use resources::{
    Bindable, Buffer, FrameBuffer, GpuObject, GpuResource, RenderBuffer, Shader, ShaderProgram, Texture,
    VertexArray,
};
