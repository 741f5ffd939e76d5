use serde::{Deserialize, Serialize};

/// A point (or displacement) in world space. +Y is up, +X is forward.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[must_use]
    pub fn offset(&self, by: Point3) -> Self {
        Self::new(self.x + by.x, self.y + by.y, self.z + by.z)
    }

    /// Moves `self` a fraction `t` of the way toward `target`.
    #[must_use]
    pub fn lerp(&self, target: Point3, t: f32) -> Self {
        Self::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
            self.z + (target.z - self.z) * t,
        )
    }

    #[must_use]
    pub fn distance(&self, other: Point3) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl From<[f32; 3]> for Point3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// One muscle: a spring between two nodes whose rest length oscillates.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpringGene {
    /// Index of the first endpoint in `Genome::node_positions`.
    pub a: usize,
    /// Index of the second endpoint.
    pub b: usize,
    /// Baseline spring length.
    pub rest_length: f32,
    /// Oscillation amplitude applied to the rest length.
    pub amplitude: f32,
    /// Oscillation angular rate.
    pub frequency: f32,
    /// Oscillation phase offset in `[0, 2π)`.
    pub phase: f32,
    /// Spring constant.
    pub stiffness: f32,
}

impl SpringGene {
    /// Whether `other` connects the same pair of nodes in the same order.
    #[must_use]
    pub fn same_endpoints(&self, other: &SpringGene) -> bool {
        self.a == other.a && self.b == other.b
    }
}

/// Complete heritable body plan of a creature.
///
/// A genome is fully determined by its node positions and spring genes.
/// The genetic operators in `kinesis_core::genetics` never modify a genome in
/// place; they always return a new value.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Genome {
    /// Rest position of every node at spawn.
    pub node_positions: Vec<Point3>,
    /// One gene per unordered node pair.
    pub springs: Vec<SpringGene>,
}

impl Genome {
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_positions.len()
    }

    #[must_use]
    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    /// Number of springs in a complete graph over `nodes` nodes.
    #[must_use]
    pub const fn complete_graph_size(nodes: usize) -> usize {
        if nodes < 2 {
            0
        } else {
            nodes * (nodes - 1) / 2
        }
    }

    /// Endpoint pairs of every spring, in gene order.
    pub fn topology(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.springs.iter().map(|s| (s.a, s.b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_genome() -> Genome {
        Genome {
            node_positions: vec![Point3::new(0.0, 1.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
            springs: vec![SpringGene {
                a: 0,
                b: 1,
                rest_length: 1.0,
                amplitude: 0.5,
                frequency: 3.0,
                phase: 0.0,
                stiffness: 200.0,
            }],
        }
    }

    #[test]
    fn test_complete_graph_size() {
        assert_eq!(Genome::complete_graph_size(0), 0);
        assert_eq!(Genome::complete_graph_size(1), 0);
        assert_eq!(Genome::complete_graph_size(5), 10);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = two_node_genome();
        let mut copy = original.clone();
        copy.springs[0].amplitude = 9.0;
        copy.node_positions[0].y = 4.0;
        assert_eq!(original.springs[0].amplitude, 0.5);
        assert_eq!(original.node_positions[0].y, 1.0);
    }

    #[test]
    fn test_json_roundtrip_preserves_value() {
        let genome = two_node_genome();
        let json = serde_json::to_string(&genome).unwrap();
        let decoded: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(genome, decoded);
    }

    #[test]
    fn test_point_lerp() {
        let p = Point3::new(0.0, 0.0, 0.0).lerp(Point3::new(10.0, -2.0, 4.0), 0.5);
        assert_eq!(p, Point3::new(5.0, -1.0, 2.0));
    }
}
