#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

/// A mesh cell. `nodes` holds the node references exactly as written in the
/// file, negative values included; `index` is the display label from the
/// record's first field.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub nodes: [i64; 3],
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub nodes: [i64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Everything read from one mesh file
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshData {
    pub nodes: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub edges: Vec<Edge>,
}

impl MeshData {
    /// Node triples of every triangle, in file order
    pub fn triangle_nodes(&self) -> Vec<[i64; 3]> {
        self.triangles.iter().map(|t| t.nodes).collect()
    }

    /// Display labels of every triangle, parallel to `triangle_nodes`
    pub fn tri_index(&self) -> Vec<i64> {
        self.triangles.iter().map(|t| t.index).collect()
    }

    /// Axis-aligned bounds over all nodes, or `None` for an empty mesh
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.nodes.first()?;

        let mut bounds = Bounds {
            x_min: first.x,
            x_max: first.x,
            y_min: first.y,
            y_max: first.y,
        };
        for node in &self.nodes[1..] {
            bounds.x_min = bounds.x_min.min(node.x);
            bounds.x_max = bounds.x_max.max(node.x);
            bounds.y_min = bounds.y_min.min(node.y);
            bounds.y_max = bounds.y_max.max(node.y);
        }

        Some(bounds)
    }
}
