//! Render nodes, one module per stage.

pub mod bloom;
pub mod debug_lights;
pub mod forward;
pub mod lighting;
pub mod post_process;
pub mod scene;
pub mod skybox;
pub mod textured_quad;
pub mod water;

pub use bloom::BloomNode;
pub use debug_lights::{DebugLightsNode, light_gizmo_matrix};
pub use forward::ForwardNode;
pub use lighting::LightingNode;
pub use post_process::{PostTarget, blit_bright_pixels, bloom_composite, blur};
pub use scene::{GeometryNode, SceneDrawOptions, record_scene_draws};
pub use skybox::{SkyboxNode, draw_skybox};
pub use textured_quad::TexturedQuadNode;
pub use water::{ReflectionNode, RefractionNode, WaterSurfaceNode};
