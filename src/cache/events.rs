/// Notifications published by [`TextureCache`](super::TextureCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A new atlas was installed and every handle rebound.
    AtlasReloaded { generation: u64, regions: usize },
    /// Human-readable status line ("textures reloaded").
    Status(String),
    /// A superseded atlas was freed after its grace period.
    AtlasReleased { generation: u64 },
    /// A rebuild produced no atlas. Handles keep their previous binding.
    RebuildFailed { reason: String },
}
