#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTier {
    pub label: &'static str,
    /// Argument handed to the load generator.
    pub argument: u64,
}

/// Heaviest first. Every position past the end gets the last tier.
pub const LOAD_TIERS: [LoadTier; 6] = [
    LoadTier { label: "100%", argument: 2_000_000 },
    LoadTier { label: "80%", argument: 1_500_000 },
    LoadTier { label: "60%", argument: 750_000 },
    LoadTier { label: "40%", argument: 300_000 },
    LoadTier { label: "20%", argument: 150_000 },
    LoadTier { label: "10%", argument: 10_000 },
];

impl LoadTier {
    pub fn for_position(position: usize) -> Self {
        LOAD_TIERS[position.min(LOAD_TIERS.len() - 1)]
    }
}
