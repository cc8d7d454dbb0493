use crate::atlas::Atlas;

/// The currently installed atlas and its generation counter.
///
/// [`swap`](Self::swap) is the only way an atlas becomes current.
#[derive(Debug, Default)]
pub struct AtlasCache {
    current: Option<Atlas>,
    generation: u64,
}

impl AtlasCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Atlas> {
        self.current.as_ref()
    }

    /// Generation of the current atlas, 0 before the first swap.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Install `atlas` as the next generation and return the one it replaces.
    pub fn swap(&mut self, mut atlas: Atlas) -> Option<Atlas> {
        self.generation += 1;
        atlas.set_generation(self.generation);
        crate::debug!("cache"; "swap -> generation {}", self.generation);
        self.current.replace(atlas)
    }

    /// Remove the current atlas. The generation counter is kept.
    pub fn take(&mut self) -> Option<Atlas> {
        self.current.take()
    }
}
