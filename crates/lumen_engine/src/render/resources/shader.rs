//! Shader stages and linked programs

use super::{Bindable, GpuObject, GpuResource};
use crate::core::error::{EngineError, EngineResult};
use crate::render::backend::{
    BindTarget, GraphicsDevice, NativeHandle, ObjectKind, ShaderStage, UniformValue,
};

/// One compiled shader stage
#[derive(Debug)]
pub struct Shader {
    object: GpuObject,
    stage: ShaderStage,
    compiled: bool,
}

impl Shader {
    /// Uninitialized shader for `stage`
    pub const fn new(stage: ShaderStage) -> Self {
        Self {
            // Shaders are never bound; the program target is only nominal.
            object: GpuObject::new("Shader", ObjectKind::Shader, BindTarget::Program),
            stage,
            compiled: false,
        }
    }

    /// Pipeline stage
    pub const fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Whether [`Shader::compile`] succeeded
    pub const fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Compile `source`
    pub fn compile(&mut self, device: &mut dyn GraphicsDevice, source: &str) -> EngineResult<()> {
        let handle = self.object.live_handle("compile")?;
        device.compile_shader(handle, self.stage, source)?;
        self.compiled = true;
        Ok(())
    }

    fn handle(&self) -> Option<NativeHandle> {
        self.object.handle()
    }
}

impl GpuResource for Shader {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.create(device)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.release(device)?;
        self.compiled = false;
        Ok(())
    }

    fn is_created(&self) -> bool {
        self.object.is_created()
    }
}

/// Program linked from attached shader stages; owns its stages
#[derive(Debug)]
pub struct ShaderProgram {
    object: GpuObject,
    shaders: Vec<Shader>,
    linked: bool,
}

impl Default for ShaderProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderProgram {
    /// Uninitialized program with no stages
    pub const fn new() -> Self {
        Self {
            object: GpuObject::new("ShaderProgram", ObjectKind::Program, BindTarget::Program),
            shaders: Vec::new(),
            linked: false,
        }
    }

    /// Initialize, compile both stages and link
    pub fn from_sources(device: &mut dyn GraphicsDevice, vertex: &str, fragment: &str) -> EngineResult<Self> {
        let mut program = Self::new();
        program.init(device)?;
        for (stage, source) in [(ShaderStage::Vertex, vertex), (ShaderStage::Fragment, fragment)] {
            let mut shader = Shader::new(stage);
            shader.init(device)?;
            shader.compile(device, source)?;
            program.attach(shader)?;
        }
        program.link(device)?;
        Ok(program)
    }

    /// Take ownership of a compiled stage
    pub fn attach(&mut self, shader: Shader) -> EngineResult<()> {
        self.object.live_handle("attach")?;
        if !shader.is_compiled() {
            return Err(EngineError::lifecycle(format!(
                "{:?} shader attached before compile",
                shader.stage()
            )));
        }
        self.shaders.push(shader);
        Ok(())
    }

    /// Whether [`ShaderProgram::link`] succeeded
    pub const fn is_linked(&self) -> bool {
        self.linked
    }

    /// Native handle while live
    pub const fn handle(&self) -> Option<NativeHandle> {
        self.object.handle()
    }

    /// Link the attached stages
    pub fn link(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        let handle = self.object.live_handle("link")?;
        let stages: Vec<NativeHandle> = self.shaders.iter().filter_map(Shader::handle).collect();
        device.link_program(handle, &stages)?;
        self.linked = true;
        Ok(())
    }

    /// Set a loose uniform. The program must be bound.
    pub fn set_uniform(&mut self, device: &mut dyn GraphicsDevice, name: &str, value: UniformValue) -> EngineResult<()> {
        self.object.bound_handle(device, "set_uniform")?;
        device.set_uniform(name, value)
    }

    /// Point a uniform block at a buffer slot. The program must be bound.
    pub fn bind_uniform_block(&mut self, device: &mut dyn GraphicsDevice, block: &str, slot: u32) -> EngineResult<()> {
        self.object.bound_handle(device, "bind_uniform_block")?;
        device.uniform_block_binding(block, slot)
    }
}

impl GpuResource for ShaderProgram {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.create(device)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.release(device)?;
        for mut shader in self.shaders.drain(..) {
            shader.destroy(device)?;
        }
        self.linked = false;
        Ok(())
    }

    fn is_created(&self) -> bool {
        self.object.is_created()
    }
}

impl Bindable for ShaderProgram {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessDevice;

    #[test]
    fn test_from_sources_links() {
        let mut device = HeadlessDevice::new();
        let mut program = ShaderProgram::from_sources(&mut device, "vs", "fs").unwrap();
        assert!(program.is_linked());
        program.bind(&mut device).unwrap();
        program
            .set_uniform(&mut device, "u_opacity", UniformValue::Float(1.0))
            .unwrap();
        program.destroy(&mut device).unwrap();
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_uncompiled_shader_rejected() {
        let mut device = HeadlessDevice::new();
        let mut program = ShaderProgram::new();
        program.init(&mut device).unwrap();
        let mut shader = Shader::new(ShaderStage::Vertex);
        shader.init(&mut device).unwrap();
        let err = program.attach(shader).unwrap_err();
        assert!(matches!(err, EngineError::Lifecycle(_)));
        program.destroy(&mut device).unwrap();
    }

    #[test]
    fn test_empty_source_fails_compile() {
        let mut device = HeadlessDevice::new();
        assert!(matches!(
            ShaderProgram::from_sources(&mut device, "vs", "   "),
            Err(EngineError::Backend(_))
        ));
    }
}
