#[derive(Debug, Clone)]
pub struct Config {
    /// Total node slots. Leaves and interior nodes share the arena, so a
    /// tree of N leaves needs up to 2N - 1 slots.
    pub capacity: usize,
    /// Fat-AABB margin added to every side of a stored leaf. Larger values
    /// absorb more motion before a re-insert but loosen query pruning.
    pub growth: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            capacity: 4096,
            growth: 16.0,
        }
    }
}
