//! Graphics Backend Seam
//!
//! The compiler talks to the graphics API only through [`GraphicsBackend`].
//! Every call must happen on the thread that owns the context; the manager
//! keeps the backend behind an `Rc`, so the compiler cannot leave that thread.
//!
//! The completion queries map onto `KHR_parallel_shader_compile`: when the
//! driver compiles in the background they return `false` until the work is
//! done. They are only issued under `CompletionPolling::Paced`. Backends
//! without that capability report `true` immediately.

use std::fmt::Debug;

use vantage_core::ShaderStage;

/// Context-level operations needed to build and introspect programs.
pub trait GraphicsBackend {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type UniformLocation: Clone + Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);

    /// `false` while the driver is still compiling `shader` in the background.
    fn shader_completion_status(&self, _shader: Self::Shader) -> bool {
        true
    }

    /// `false` while the driver is still linking `program` in the background.
    fn program_completion_status(&self, _program: Self::Program) -> bool {
        true
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;
    fn uniform_block_index(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_block_binding(&self, program: Self::Program, index: u32, binding: u32);
}

#[cfg(feature = "glow")]
mod gl {
    use glow::HasContext;
    use vantage_core::ShaderStage;

    use super::GraphicsBackend;

    const PARALLEL_COMPILE_EXTENSIONS: [&str; 2] = [
        "GL_KHR_parallel_shader_compile",
        "KHR_parallel_shader_compile",
    ];

    fn supports_parallel_compile(gl: &glow::Context) -> bool {
        let extensions = gl.supported_extensions();
        PARALLEL_COMPILE_EXTENSIONS
            .iter()
            .any(|ext| extensions.contains(*ext))
    }

    // SAFETY (all methods): callers hold the context on its owning thread and
    // only pass objects created by this same context.
    impl GraphicsBackend for glow::Context {
        type Shader = glow::Shader;
        type Program = glow::Program;
        type UniformLocation = glow::UniformLocation;

        fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
            let kind = match stage {
                ShaderStage::Vertex => glow::VERTEX_SHADER,
                ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            };
            unsafe { HasContext::create_shader(self, kind) }
        }

        fn shader_source(&self, shader: Self::Shader, source: &str) {
            unsafe { HasContext::shader_source(self, shader, source) }
        }

        fn compile_shader(&self, shader: Self::Shader) {
            unsafe { HasContext::compile_shader(self, shader) }
        }

        fn shader_compile_status(&self, shader: Self::Shader) -> bool {
            unsafe { self.get_shader_compile_status(shader) }
        }

        fn shader_info_log(&self, shader: Self::Shader) -> String {
            unsafe { self.get_shader_info_log(shader) }
        }

        fn delete_shader(&self, shader: Self::Shader) {
            unsafe { HasContext::delete_shader(self, shader) }
        }

        fn create_program(&self) -> Result<Self::Program, String> {
            unsafe { HasContext::create_program(self) }
        }

        fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
            unsafe { HasContext::attach_shader(self, program, shader) }
        }

        fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
            unsafe { HasContext::detach_shader(self, program, shader) }
        }

        fn link_program(&self, program: Self::Program) {
            unsafe { HasContext::link_program(self, program) }
        }

        fn program_link_status(&self, program: Self::Program) -> bool {
            unsafe { self.get_program_link_status(program) }
        }

        fn program_info_log(&self, program: Self::Program) -> String {
            unsafe { self.get_program_info_log(program) }
        }

        fn delete_program(&self, program: Self::Program) {
            unsafe { HasContext::delete_program(self, program) }
        }

        fn shader_completion_status(&self, shader: Self::Shader) -> bool {
            !supports_parallel_compile(self)
                || unsafe { self.get_shader_completion_status(shader) }
        }

        fn program_completion_status(&self, program: Self::Program) -> bool {
            !supports_parallel_compile(self)
                || unsafe { self.get_program_completion_status(program) }
        }

        fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
            unsafe { self.get_attrib_location(program, name) }
        }

        fn uniform_location(
            &self,
            program: Self::Program,
            name: &str,
        ) -> Option<Self::UniformLocation> {
            unsafe { self.get_uniform_location(program, name) }
        }

        fn uniform_block_index(&self, program: Self::Program, name: &str) -> Option<u32> {
            unsafe { self.get_uniform_block_index(program, name) }
        }

        fn uniform_block_binding(&self, program: Self::Program, index: u32, binding: u32) {
            unsafe { HasContext::uniform_block_binding(self, program, index, binding) }
        }
    }
}
