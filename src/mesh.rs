//! Drawable geometry: blit quads and particle batches.

use bytemuck::{Pod, Zeroable};
use lyon::math::{point, Box2D};
use lyon::tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};

use crate::backend::{BufferId, DrawMode, VertexAttribute, VertexLayout};
use crate::error::{RenderError, Result};
use crate::material::Material;

/// A vertex of a blit mesh.
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BlitVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Texture coordinate, `v = 0` at the top row.
    pub uv: [f32; 2],
}

impl BlitVertex {
    /// Attribute layout bound to `aPosition` (0) and `aTexCoord` (1).
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: 20,
        attributes: &[
            VertexAttribute {
                index: 0,
                size: 3,
                offset: 0,
            },
            VertexAttribute {
                index: 1,
                size: 2,
                offset: 12,
            },
        ],
    };
}

/// One simulated particle.
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ParticleVertex {
    /// Particle-local position, relative to the array's transform.
    pub position: [f32; 3],
    /// RGBA tint.
    pub color: [f32; 4],
    /// Point size before scaling.
    pub size: f32,
}

impl ParticleVertex {
    /// Attribute layout bound to `aPosition` (0), `aColor` (1), `aSize` (2).
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: 32,
        attributes: &[
            VertexAttribute {
                index: 0,
                size: 3,
                offset: 0,
            },
            VertexAttribute {
                index: 1,
                size: 4,
                offset: 12,
            },
            VertexAttribute {
                index: 2,
                size: 1,
                offset: 28,
            },
        ],
    };
}

/// Where geometry lives when drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Storage {
    /// Streamed from client memory on every draw.
    #[default]
    Client,
    /// Held in buffer objects.
    Vbo,
}

/// Buffer objects backing a VBO mesh.
#[derive(Debug, Default)]
pub(crate) struct VboState {
    pub(crate) vertex: Option<BufferId>,
    pub(crate) index: Option<BufferId>,
    pub(crate) uploaded: bool,
}

/// Indexed blit geometry.
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<BlitVertex>,
    indices: Vec<u16>,
    mode: DrawMode,
    storage: Storage,
    pub(crate) vbo: VboState,
}

impl Mesh {
    /// Wrap existing geometry.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Argument`] if an index points past the vertex
    /// list.
    pub fn new(vertices: Vec<BlitVertex>, indices: Vec<u16>, mode: DrawMode) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| usize::from(i) >= vertices.len()) {
            return Err(RenderError::Argument(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }
        Ok(Self {
            vertices,
            indices,
            mode,
            storage: Storage::Client,
            vbo: VboState::default(),
        })
    }

    /// A `width` x `height` quad centered on the origin, tessellated with
    /// lyon.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Argument`] if the rectangle is degenerate.
    pub fn quad(width: f32, height: f32) -> Result<Self> {
        if !(width > 0.0 && height > 0.0) {
            return Err(RenderError::Argument(format!(
                "degenerate quad {width}x{height}"
            )));
        }
        let (hw, hh) = (width * 0.5, height * 0.5);
        let rect = Box2D::new(point(-hw, -hh), point(hw, hh));

        let mut geometry: VertexBuffers<BlitVertex, u16> = VertexBuffers::new();
        let result = FillTessellator::new().tessellate_rectangle(
            &rect,
            &FillOptions::default(),
            &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
                let p = vertex.position();
                BlitVertex {
                    position: [p.x, p.y, 0.0],
                    uv: [(p.x + hw) / width, (hh - p.y) / height],
                }
            }),
        );

        match result {
            Ok(()) if !geometry.indices.is_empty() => {
                Self::new(geometry.vertices, geometry.indices, DrawMode::Triangles)
            }
            Ok(()) => Err(RenderError::Argument(format!(
                "quad {width}x{height} produced no triangles"
            ))),
            Err(e) => Err(RenderError::Argument(format!("quad tessellation failed: {e:?}"))),
        }
    }

    /// A quad subdivided into `columns` x `rows` cells, for vertex effects.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Argument`] for zero cells or when the vertex
    /// count would overflow `u16` indices.
    #[expect(clippy::cast_possible_truncation)]
    pub fn grid(width: f32, height: f32, columns: u16, rows: u16) -> Result<Self> {
        let vertex_count = (usize::from(columns) + 1) * (usize::from(rows) + 1);
        if columns == 0 || rows == 0 || vertex_count > usize::from(u16::MAX) + 1 {
            return Err(RenderError::Argument(format!(
                "unsupported grid {columns}x{rows}"
            )));
        }

        let mut vertices = Vec::with_capacity(vertex_count);
        for row in 0..=rows {
            let v = f32::from(row) / f32::from(rows);
            for column in 0..=columns {
                let u = f32::from(column) / f32::from(columns);
                vertices.push(BlitVertex {
                    position: [(u - 0.5) * width, (0.5 - v) * height, 0.0],
                    uv: [u, v],
                });
            }
        }

        let stride = usize::from(columns) + 1;
        let mut indices = Vec::with_capacity(usize::from(columns) * usize::from(rows) * 6);
        for row in 0..usize::from(rows) {
            for column in 0..usize::from(columns) {
                let top_left = (row * stride + column) as u16;
                let bottom_left = ((row + 1) * stride + column) as u16;
                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_left + 1,
                    top_left + 1,
                    bottom_left,
                    bottom_left + 1,
                ]);
            }
        }

        Self::new(vertices, indices, DrawMode::Triangles)
    }

    /// Switch between client and VBO storage. Takes effect on the next draw.
    #[must_use]
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    /// Current storage.
    #[must_use]
    pub fn storage(&self) -> Storage {
        self.storage
    }

    /// Primitive mode.
    #[must_use]
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// Vertex data.
    #[must_use]
    pub fn vertices(&self) -> &[BlitVertex] {
        &self.vertices
    }

    /// Index data.
    #[must_use]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Edit the vertices in place. A VBO mesh re-uploads on its next draw.
    pub fn vertices_mut(&mut self) -> &mut [BlitVertex] {
        self.mark_dirty();
        &mut self.vertices
    }

    /// Force a VBO re-upload on the next draw.
    pub fn mark_dirty(&mut self) {
        self.vbo.uploaded = false;
    }

    /// Buffer objects created for this mesh, for the host to delete on
    /// teardown.
    #[must_use]
    pub fn buffers(&self) -> [Option<BufferId>; 2] {
        [self.vbo.vertex, self.vbo.index]
    }
}

/// A flat textured quad (or grid) placed in the scene.
#[derive(Debug)]
pub struct BlitObject {
    /// World translation.
    pub position: [f32; 3],
    /// Per-axis scale.
    pub scale: [f32; 3],
    /// Euler rotation in radians, applied X then Y then Z.
    pub rotation: [f32; 3],
    /// Shading parameters.
    pub material: Material,
    /// Skipped by the renderer when `false`.
    pub render: bool,
    /// Geometry.
    pub mesh: Mesh,
}

impl BlitObject {
    /// An untransformed, visible object.
    #[must_use]
    pub fn new(mesh: Mesh, material: Material) -> Self {
        Self {
            position: [0.0; 3],
            scale: [1.0; 3],
            rotation: [0.0; 3],
            material,
            render: true,
            mesh,
        }
    }
}

/// Particle program family, which is also its collection index.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParticleType {
    /// Colored points.
    Point,
    /// Textured point sprites sized in screen space.
    Image,
}

impl ParticleType {
    /// Types in program-collection order.
    pub const ORDER: [ParticleType; 2] = [ParticleType::Point, ParticleType::Image];

    /// Index into the particle program collection.
    #[must_use]
    pub fn program_index(self) -> usize {
        match self {
            Self::Point => 0,
            Self::Image => 1,
        }
    }

    /// Short lower-case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Image => "image",
        }
    }
}

/// A batch of CPU-simulated particles drawn in one pass.
///
/// Particles are treated as always-dynamic: a VBO-backed array is
/// re-uploaded on every frame.
#[derive(Debug)]
pub struct ParticleArray {
    /// World translation, applied before particle-local movement.
    pub position: [f32; 3],
    /// Euler rotation in radians.
    pub rotation: [f32; 3],
    /// Per-axis scale.
    pub scale: [f32; 3],
    /// Program family.
    pub particle_type: ParticleType,
    /// Blend state and, for image particles, textures.
    pub material: Option<Material>,
    /// Packed simulation parameters handed to the shader untouched:
    /// `[size scale, elapsed seconds, fade rate, user]`.
    pub params: [f32; 4],
    /// Skipped by the renderer when `false`.
    pub render: bool,
    /// Particle state, rewritten by the simulation each frame.
    pub particles: Vec<ParticleVertex>,
    storage: Storage,
    pub(crate) vbo: Option<BufferId>,
}

impl ParticleArray {
    /// An empty, visible batch.
    #[must_use]
    pub fn new(particle_type: ParticleType, material: Option<Material>) -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            particle_type,
            material,
            params: [1.0, 0.0, 0.0, 0.0],
            render: true,
            particles: Vec::new(),
            storage: Storage::Client,
            vbo: None,
        }
    }

    /// Switch between client and VBO storage.
    #[must_use]
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    /// Current storage.
    #[must_use]
    pub fn storage(&self) -> Storage {
        self.storage
    }

    /// Buffer object created for this array, for the host to delete.
    #[must_use]
    pub fn buffer(&self) -> Option<BufferId> {
        self.vbo
    }
}
