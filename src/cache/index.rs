//! Stable per-asset lookup handles.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::atlas::{Atlas, AtlasRegion};
use crate::core::AssetPath;

/// What a handle currently points at.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// No atlas has been installed yet.
    Loading,
    /// The installed atlas has no region for this asset.
    Missing,
    Region { generation: u64, region: AtlasRegion },
}

impl Binding {
    fn resolve(name: &str, atlas: Option<&Atlas>) -> Self {
        let Some(atlas) = atlas else {
            return Self::Loading;
        };
        match atlas.find_region(name) {
            Some(region) => Self::Region {
                generation: atlas.generation(),
                region: region.clone(),
            },
            None => Self::Missing,
        }
    }

    pub fn region(&self) -> Option<&AtlasRegion> {
        match self {
            Self::Region { region, .. } => Some(region),
            _ => None,
        }
    }

    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Region { generation, .. } => Some(*generation),
            _ => None,
        }
    }
}

/// Shared handle to an asset's current binding.
///
/// Cloning shares the same cell. The cache rebinds the cell in place on
/// every swap, so holders see new regions without asking again.
#[derive(Debug, Clone)]
pub struct RegionHandle(Rc<RefCell<Binding>>);

impl RegionHandle {
    fn new(binding: Binding) -> Self {
        Self(Rc::new(RefCell::new(binding)))
    }

    /// Snapshot of the current binding. No borrow outlives the call, so a
    /// held snapshot never blocks a rebind.
    pub fn binding(&self) -> Binding {
        self.0.borrow().clone()
    }

    pub fn region(&self) -> Option<AtlasRegion> {
        self.0.borrow().region().cloned()
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.0.borrow(), Binding::Loading)
    }

    pub fn is_missing(&self) -> bool {
        matches!(*self.0.borrow(), Binding::Missing)
    }

    /// Both handles share the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn rebind(&self, binding: Binding) {
        *self.0.borrow_mut() = binding;
    }
}

struct Entry {
    region_name: String,
    handle: RegionHandle,
}

/// AssetPath → RegionHandle, created lazily and kept until teardown.
pub struct RegionIndex {
    prefix: String,
    entries: FxHashMap<AssetPath, Entry>,
}

impl RegionIndex {
    /// `prefix` is stripped from asset paths to form region names.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: FxHashMap::default(),
        }
    }

    /// Existing handle for `path`, or a new one bound against `current`.
    pub fn get(&mut self, path: &AssetPath, current: Option<&Atlas>) -> RegionHandle {
        if let Some(entry) = self.entries.get(path) {
            return entry.handle.clone();
        }

        let region_name = path.region_name(&self.prefix).to_string();
        let handle = RegionHandle::new(Binding::resolve(&region_name, current));
        crate::debug!("cache"; "new handle {} -> {}", path, region_name);

        self.entries.insert(
            path.clone(),
            Entry {
                region_name,
                handle: handle.clone(),
            },
        );
        handle
    }

    /// Rebind every handle against a freshly installed atlas.
    pub fn rebind_all(&self, atlas: &Atlas) {
        let mut missing = 0usize;
        for entry in self.entries.values() {
            let binding = Binding::resolve(&entry.region_name, Some(atlas));
            if binding == Binding::Missing {
                missing += 1;
            }
            entry.handle.rebind(binding);
        }
        if missing > 0 {
            crate::debug!("cache"; "{} handle(s) missing in generation {}", missing, atlas.generation());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
