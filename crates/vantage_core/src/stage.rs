//! Shader pipeline stages.

use std::fmt;

/// A programmable stage of a vertex/fragment program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Vertex => "vertex shader",
            Self::Fragment => "fragment shader",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
