//! GLSL fixtures
//!
//! A trimmed-down uber-shader pair that declares exactly the bindings each
//! feature macro needs, so tests can compile every variant of the matrix.

use vantage_render::{ProgramSources, SourcePair};

pub const VERTEX_SOURCE: &str = r"precision highp int;
precision highp float;

#ifdef WITH_QUANTIZEVERTICES
in ivec3 vertexPosition;
uniform mat4 vertexQuantizationMatrix;
#else
in vec3 vertexPosition;
#endif

uniform mat4 projectionMatrix;
uniform mat4 viewMatrix;
uniform vec3 postProcessingTranslation;

#ifdef WITH_LINEPRIMITIVES
in vec3 nextVertexPosition;
in float direction;
uniform mat4 matrix;
uniform vec4 inputColor;
uniform float aspect;
uniform float thickness;
#else
uniform vec4 sectionPlane;

#ifdef WITH_INSTANCING
in mat4 instanceMatrices;
uniform uint numContainedInstances;
uniform uint containedInstances[256];
uniform bool containedMeansHidden;
#endif

#ifdef WITH_PICKING
#ifdef WITH_INSTANCING
in vec4 instancePickColors;
#else
in vec4 vertexPickColor;
#endif
#else
#ifdef WITH_QUANTIZENORMALS
in ivec2 vertexNormal;
#else
in vec3 vertexNormal;
#endif
uniform mat3 viewNormalMatrix;
#ifdef WITH_INSTANCING
in mat3 instanceNormalMatrices;
#endif
#ifdef WITH_USEOBJECTCOLORS
uniform vec4 objectColor;
#else
#ifdef WITH_QUANTIZECOLORS
in uvec4 vertexColor;
#else
in vec4 vertexColor;
#endif
#endif
#endif
#endif

out vec4 color;

void main() {
    color = vec4(1.0);
    gl_Position = projectionMatrix * viewMatrix * vec4(0.0, 0.0, 0.0, 1.0);
}
";

pub const FRAGMENT_SOURCE: &str = r"precision highp int;
precision highp float;

in vec4 color;
out vec4 fragColor;

#ifndef WITH_PICKING
#ifndef WITH_LINEPRIMITIVES
uniform LightData {
    vec4 lightDir;
    vec4 lightColor;
    vec4 ambientColor;
    float intensity;
};
#endif
#endif

void main() {
    fragColor = color;
}
";

/// The fixture pair shared by every family.
#[must_use]
pub fn npr_sources() -> ProgramSources {
    ProgramSources::shared(SourcePair::new(VERTEX_SOURCE, FRAGMENT_SOURCE))
}
