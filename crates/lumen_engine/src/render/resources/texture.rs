//! 2D textures

use std::path::Path;

use super::{Bindable, GpuObject, GpuResource};
use crate::core::error::EngineResult;
use crate::foundation::color::Color;
use crate::render::backend::{
    BindTarget, GraphicsDevice, NativeHandle, ObjectKind, TextureDesc, TextureParameter,
};

/// 2D texture object
#[derive(Debug)]
pub struct Texture {
    pub(super) object: GpuObject,
    desc: Option<TextureDesc>,
}

impl Default for Texture {
    fn default() -> Self {
        Self::new()
    }
}

impl Texture {
    /// Uninitialized texture
    pub const fn new() -> Self {
        Self {
            object: GpuObject::new("Texture", ObjectKind::Texture, BindTarget::Texture2D),
            desc: None,
        }
    }

    /// Initialized 1x1 texture filled with `color`, left unbound
    pub fn solid_color(device: &mut dyn GraphicsDevice, color: Color) -> EngineResult<Self> {
        let mut texture = Self::new();
        texture.init(device)?;
        texture.bind(device)?;
        texture.set_data(device, &TextureDesc::rgba8(1, 1), Some(&color.to_rgba8()[..]))?;
        texture.unbind(device)?;
        Ok(texture)
    }

    /// Storage description, once allocated
    pub const fn desc(&self) -> Option<TextureDesc> {
        self.desc
    }

    /// Width in texels, 0 before storage is allocated
    pub fn width(&self) -> u32 {
        self.desc.map_or(0, |d| d.width)
    }

    /// Height in texels, 0 before storage is allocated
    pub fn height(&self) -> u32 {
        self.desc.map_or(0, |d| d.height)
    }

    /// Native handle while live
    pub const fn handle(&self) -> Option<NativeHandle> {
        self.object.handle()
    }

    /// Allocate storage and optionally upload pixels; applies the desc's
    /// filter and wrap. The texture must be bound.
    pub fn set_data(
        &mut self,
        device: &mut dyn GraphicsDevice,
        desc: &TextureDesc,
        pixels: Option<&[u8]>,
    ) -> EngineResult<()> {
        self.object.bound_handle(device, "set_data")?;
        device.texture_image(desc, pixels)?;
        device.texture_parameter(TextureParameter::MinFilter(desc.filter))?;
        device.texture_parameter(TextureParameter::MagFilter(desc.filter))?;
        device.texture_parameter(TextureParameter::WrapS(desc.wrap))?;
        device.texture_parameter(TextureParameter::WrapT(desc.wrap))?;
        self.desc = Some(*desc);
        Ok(())
    }

    /// Change one sampling parameter. The texture must be bound.
    pub fn set_parameter(&mut self, device: &mut dyn GraphicsDevice, parameter: TextureParameter) -> EngineResult<()> {
        self.object.bound_handle(device, "set_parameter")?;
        device.texture_parameter(parameter)
    }

    /// Decode an image file to RGBA8 and upload it. The texture must be bound.
    pub fn load_file(&mut self, device: &mut dyn GraphicsDevice, path: impl AsRef<Path>) -> EngineResult<()> {
        self.object.bound_handle(device, "load_file")?;
        let image = image::open(path.as_ref())?.to_rgba8();
        let (width, height) = image.dimensions();
        log::debug!("Loaded {} ({}x{})", path.as_ref().display(), width, height);
        self.set_data(device, &TextureDesc::rgba8(width, height), Some(image.as_raw()))
    }

    /// Bind to a sampler unit for drawing
    pub fn bind_to_unit(&self, device: &mut dyn GraphicsDevice, unit: u32) -> EngineResult<()> {
        let handle = self.object.live_handle("bind_to_unit")?;
        device.bind_texture_unit(unit, Some(handle))
    }

    /// Move the native texture out, leaving `self` inert
    pub fn transfer(&mut self) -> Self {
        Self {
            object: self.object.transfer(),
            desc: self.desc.take(),
        }
    }
}

impl GpuResource for Texture {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.create(device)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.release(device)
    }

    fn is_created(&self) -> bool {
        self.object.is_created()
    }
}

impl Bindable for Texture {
    fn bind(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.bind(device)
    }

    fn unbind(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.unbind(device)
    }

    fn is_bound(&self, device: &dyn GraphicsDevice) -> bool {
        self.object.is_bound(device)
    }
}
