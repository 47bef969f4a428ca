/*!
# Galaxy 3D Cull

Bounding volumes and frustum culling for the Galaxy 3D scene graph.

The crate answers one question per frame and per viewpoint: which leaves
of the scene are potentially visible, and under which lights, clip planes
and fog. It does not draw anything; the `RenderList` it produces is
consumed by a renderer downstream.

## Architecture

- **bounds**: box / sphere / void volumes, intersection tests, aggregation
- **camera**: viewpoint projection and the six-plane frustum
- **scene**: node model, the `SceneGraph` with lazy bounds, and the
  read-only `Cullable` view
- **cull**: the cull stage traversal and its render list, plus a rayon
  driver for several viewpoints at once
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod bounds;
pub mod camera;
pub mod scene;
pub mod cull;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging host
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod bounds {
        pub use crate::bounds::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod cull {
        pub use crate::cull::*;
    }
}

// Re-export math library at crate root
pub use glam;
