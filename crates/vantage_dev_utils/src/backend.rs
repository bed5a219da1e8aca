//! Recording backend
//!
//! An in-memory stand-in for a GL context. "Compiling" a shader evaluates
//! its conditional-compilation directives and collects the `in`, `uniform`
//! and uniform-block declarations that survive; linking merges both stages.
//! Failures and background-compile latency can be injected per test.

use std::cell::RefCell;

use rustc_hash::{FxHashMap, FxHashSet};
use vantage_core::ShaderStage;
use vantage_render::GraphicsBackend;

/// Declarations that survive preprocessing.
#[derive(Debug, Clone, Default)]
struct Declarations {
    inputs: Vec<String>,
    uniforms: Vec<String>,
    blocks: Vec<String>,
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: Option<Result<Declarations, String>>,
    pending_polls: u32,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: Option<Result<LinkedProgram, String>>,
    pending_polls: u32,
    block_bindings: FxHashMap<u32, u32>,
}

#[derive(Debug, Default)]
struct LinkedProgram {
    attributes: Vec<String>,
    uniforms: Vec<String>,
    blocks: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    shaders: FxHashMap<u32, ShaderObject>,
    programs: FxHashMap<u32, ProgramObject>,
    compile_failures: Vec<String>,
    link_failures: Vec<String>,
    completion_delay: u32,
    compiles: u32,
    links: u32,
    completion_queries: u32,
    max_pending_programs: usize,
}

/// Fake graphics context that records what the compiler does with it.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    state: RefCell<State>,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Any shader whose full source contains `needle` fails to compile.
    #[must_use]
    pub fn fail_compile_containing(self, needle: &str) -> Self {
        self.state
            .borrow_mut()
            .compile_failures
            .push(needle.to_owned());
        self
    }

    /// Any program with a stage containing `needle` fails to link.
    #[must_use]
    pub fn fail_link_containing(self, needle: &str) -> Self {
        self.state.borrow_mut().link_failures.push(needle.to_owned());
        self
    }

    /// Completion queries answer `false` this many times per object.
    #[must_use]
    pub fn with_completion_delay(self, polls: u32) -> Self {
        self.state.borrow_mut().completion_delay = polls;
        self
    }

    /// Drops every injected compile and link failure.
    pub fn clear_failures(&self) {
        let mut state = self.state.borrow_mut();
        state.compile_failures.clear();
        state.link_failures.clear();
    }

    /// Shader objects not yet deleted.
    #[must_use]
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Program objects not yet deleted.
    #[must_use]
    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    #[must_use]
    pub fn compile_count(&self) -> u32 {
        self.state.borrow().compiles
    }

    #[must_use]
    pub fn link_count(&self) -> u32 {
        self.state.borrow().links
    }

    /// Shader and program completion queries answered so far.
    #[must_use]
    pub fn completion_queries(&self) -> u32 {
        self.state.borrow().completion_queries
    }

    /// Highest number of programs that were linking at the same time.
    #[must_use]
    pub fn max_pending_programs(&self) -> usize {
        self.state.borrow().max_pending_programs
    }

    /// Binding point assigned to uniform block `index` of `program`.
    #[must_use]
    pub fn block_binding(&self, program: u32, index: u32) -> Option<u32> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.block_bindings.get(&index).copied())
    }
}

impl GraphicsBackend for RecordingBackend {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = u32;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: None,
                pending_polls: 0,
            },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(object) = self.state.borrow_mut().shaders.get_mut(&shader) {
            object.source = source.to_owned();
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.compiles += 1;
        let delay = state.completion_delay;
        let failures = state.compile_failures.clone();
        if let Some(object) = state.shaders.get_mut(&shader) {
            object.pending_polls = delay;
            object.compiled = Some(
                match failures.iter().find(|needle| object.source.contains(needle.as_str())) {
                    Some(needle) => Err(format!("0:1: injected failure on '{needle}'")),
                    None => preprocess(&object.source, object.stage),
                },
            );
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|s| matches!(s.compiled, Some(Ok(_))))
    }

    fn shader_info_log(&self, shader: u32) -> String {
        match self.state.borrow().shaders.get(&shader).map(|s| &s.compiled) {
            Some(Some(Err(log))) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state.programs.insert(id, ProgramObject::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.attached.retain(|&s| s != shader);
        }
    }

    fn link_program(&self, program: u32) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.links += 1;
        let Some(object) = state.programs.get(&program) else {
            return;
        };

        let mut linked = LinkedProgram::default();
        let mut result = Ok(());
        for shader in &object.attached {
            let Some(shader) = state.shaders.get(shader) else {
                result = Err("attached shader was deleted".to_owned());
                break;
            };
            if let Some(needle) = state
                .link_failures
                .iter()
                .find(|needle| shader.source.contains(needle.as_str()))
            {
                result = Err(format!("injected link failure on '{needle}'"));
                break;
            }
            match &shader.compiled {
                Some(Ok(decls)) => {
                    if shader.stage == ShaderStage::Vertex {
                        linked.attributes.extend(decls.inputs.iter().cloned());
                    }
                    linked.uniforms.extend(decls.uniforms.iter().cloned());
                    linked.blocks.extend(decls.blocks.iter().cloned());
                }
                _ => {
                    result = Err("attached shader is not compiled".to_owned());
                    break;
                }
            }
        }

        let delay = state.completion_delay;
        if let Some(object) = state.programs.get_mut(&program) {
            object.pending_polls = delay;
            object.linked = Some(result.map(|()| linked));
        }
        let pending = state
            .programs
            .values()
            .filter(|p| p.linked.is_some() && p.pending_polls > 0)
            .count();
        state.max_pending_programs = state.max_pending_programs.max(pending);
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| matches!(p.linked, Some(Ok(_))))
    }

    fn program_info_log(&self, program: u32) -> String {
        match self.state.borrow().programs.get(&program).map(|p| &p.linked) {
            Some(Some(Err(log))) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_program(&self, program: u32) {
        self.state.borrow_mut().programs.remove(&program);
    }

    fn shader_completion_status(&self, shader: u32) -> bool {
        let mut state = self.state.borrow_mut();
        state.completion_queries += 1;
        match state.shaders.get_mut(&shader) {
            Some(object) if object.pending_polls > 0 => {
                object.pending_polls -= 1;
                false
            }
            _ => true,
        }
    }

    fn program_completion_status(&self, program: u32) -> bool {
        let mut state = self.state.borrow_mut();
        state.completion_queries += 1;
        match state.programs.get_mut(&program) {
            Some(object) if object.pending_polls > 0 => {
                object.pending_polls -= 1;
                false
            }
            _ => true,
        }
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let Some(Ok(linked)) = state.programs.get(&program).map(|p| p.linked.as_ref())? else {
            return None;
        };
        linked
            .attributes
            .iter()
            .position(|a| a == name)
            .map(|i| i as u32)
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let Some(Ok(linked)) = state.programs.get(&program).map(|p| p.linked.as_ref())? else {
            return None;
        };
        linked
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| i as u32)
    }

    fn uniform_block_index(&self, program: u32, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let Some(Ok(linked)) = state.programs.get(&program).map(|p| p.linked.as_ref())? else {
            return None;
        };
        linked
            .blocks
            .iter()
            .position(|b| b == name)
            .map(|i| i as u32)
    }

    fn uniform_block_binding(&self, program: u32, index: u32, binding: u32) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.block_bindings.insert(index, binding);
        }
    }
}

/// Evaluates `#define`, `#ifdef`, `#ifndef`, `#else` and `#endif` and
/// collects the declarations of the active lines.
fn preprocess(source: &str, stage: ShaderStage) -> Result<Declarations, String> {
    let mut defined = FxHashSet::default();
    // (enclosing block active, this branch taken)
    let mut stack: Vec<(bool, bool)> = Vec::new();
    let mut decls = Declarations::default();
    let mut saw_version = false;

    for (line_no, raw) in source.lines().enumerate() {
        let line = raw.trim();
        let active = stack.iter().all(|&(_, taken)| taken);
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            continue;
        };

        match first {
            "#version" => {
                if line_no != 0 {
                    return Err(format!("{line_no}: #version must be the first line"));
                }
                saw_version = true;
            }
            "#define" if active => {
                if let Some(name) = words.next() {
                    defined.insert(name.to_owned());
                }
            }
            "#ifdef" | "#ifndef" => {
                let name = words
                    .next()
                    .ok_or_else(|| format!("{line_no}: {first} without a name"))?;
                let is_defined = defined.contains(name);
                stack.push((active, active && (is_defined == (first == "#ifdef"))));
            }
            "#else" => {
                let (outer, taken) = stack
                    .pop()
                    .ok_or_else(|| format!("{line_no}: #else without #if"))?;
                stack.push((outer, outer && !taken));
            }
            "#endif" => {
                stack
                    .pop()
                    .ok_or_else(|| format!("{line_no}: #endif without #if"))?;
            }
            "in" if active && stage == ShaderStage::Vertex => {
                if let Some(name) = declared_name(line) {
                    decls.inputs.push(name);
                }
            }
            "uniform" if active => {
                if line.ends_with('{') {
                    if let Some(name) = words.next() {
                        decls.blocks.push(name.to_owned());
                    }
                } else if let Some(name) = declared_name(line) {
                    decls.uniforms.push(name);
                }
            }
            _ => {}
        }
    }

    if !saw_version {
        return Err("0: missing #version directive".to_owned());
    }
    if !stack.is_empty() {
        return Err("unterminated #ifdef".to_owned());
    }
    Ok(decls)
}

/// Last identifier of a `qualifier type name[N];` declaration.
fn declared_name(line: &str) -> Option<String> {
    let body = line.split(';').next()?.trim();
    let last = body.split_whitespace().last()?;
    let name = last.split('[').next()?;
    (!name.is_empty()).then(|| name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_honors_nested_conditionals() {
        let source = "#version 300 es\n#define A\n#ifdef A\n#ifndef B\nuniform mat4 kept;\n#else\nuniform mat4 dropped;\n#endif\n#else\nuniform mat4 alsoDropped;\n#endif\nin vec3 position;\n";
        let decls = preprocess(source, ShaderStage::Vertex).unwrap();
        assert_eq!(decls.uniforms, vec!["kept".to_owned()]);
        assert_eq!(decls.inputs, vec!["position".to_owned()]);
    }

    #[test]
    fn preprocess_reads_blocks_and_arrays() {
        let source = "#version 300 es\nuniform LightData {\n  vec3 dir;\n};\nuniform uint ids[256];\n";
        let decls = preprocess(source, ShaderStage::Fragment).unwrap();
        assert_eq!(decls.blocks, vec!["LightData".to_owned()]);
        assert_eq!(decls.uniforms, vec!["ids".to_owned()]);
    }

    #[test]
    fn preprocess_requires_version_first() {
        assert!(preprocess("in vec3 a;\n", ShaderStage::Vertex).is_err());
        assert!(preprocess("#version 300 es\n#ifdef A\n", ShaderStage::Vertex).is_err());
    }
}
