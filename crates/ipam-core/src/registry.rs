//! Process-wide owner of the address space.
//!
//! [`Registry`] puts the whole tree behind one `RwLock`. Readers share it,
//! mutations hold it exclusively for the duration of the in-memory change,
//! and a reload swaps in a tree that was built elsewhere, so no reader ever
//! sees a half-built tree.

use std::sync::{PoisonError, RwLock};

use tracing::info;

use crate::error::IpamResult;
use crate::policy::MaskPolicy;
use crate::space::{AddressSpace, SpaceStats};

#[derive(Debug, Default)]
pub struct Registry {
    space: RwLock<AddressSpace>,
}

impl Registry {
    pub fn new(space: AddressSpace) -> Self {
        Self {
            space: RwLock::new(space),
        }
    }

    /// Create a registry holding an empty space.
    pub fn empty(policy: MaskPolicy) -> Self {
        Self::new(AddressSpace::new(policy))
    }

    /// Run `f` with shared access to the tree.
    pub fn read<R>(&self, f: impl FnOnce(&AddressSpace) -> R) -> R {
        let guard = self.space.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run `f` with exclusive access to the tree.
    ///
    /// Every core operation validates before it mutates, so a failing `f`
    /// leaves the tree as it was.
    pub fn write<R>(&self, f: impl FnOnce(&mut AddressSpace) -> R) -> R {
        let mut guard = self.space.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Swap in a fully built tree, returning the previous one.
    pub fn replace(&self, space: AddressSpace) -> AddressSpace {
        let stats = space.stats();
        let old = self.write(|current| std::mem::replace(current, space));
        info!(
            prefixes = stats.prefixes,
            subnets = stats.subnets,
            hosts = stats.hosts,
            "address space replaced"
        );
        old
    }

    /// Cascade-delete the whole tree in place.
    pub fn reset(&self) -> IpamResult<()> {
        self.write(AddressSpace::reset)
    }

    pub fn policy(&self) -> MaskPolicy {
        self.read(AddressSpace::policy)
    }

    pub fn stats(&self) -> SpaceStats {
        self.read(AddressSpace::stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn write_then_read() {
        let registry = Registry::empty(MaskPolicy::default());
        registry
            .write(|s| s.create_prefix("p1", "10.0.0.0/16", "").map(|_| ()))
            .unwrap();
        assert_eq!(registry.read(|s| s.prefix_count()), 1);
    }

    #[test]
    fn replace_swaps_whole_tree() {
        let registry = Registry::empty(MaskPolicy::default());
        registry
            .write(|s| s.create_prefix("old", "10.0.0.0/16", "").map(|_| ()))
            .unwrap();

        let mut fresh = AddressSpace::default();
        fresh.create_prefix("new", "192.168.0.0/16", "").unwrap();
        let old = registry.replace(fresh);

        assert!(old.prefix("old").is_some());
        assert!(registry.read(|s| s.prefix("new").is_some()));
        assert!(registry.read(|s| s.prefix("old").is_none()));
    }

    #[test]
    fn reset_twice_on_empty() {
        let registry = Registry::empty(MaskPolicy::default());
        registry.reset().unwrap();
        registry.reset().unwrap();
        assert_eq!(registry.stats(), SpaceStats::default());
    }

    #[test]
    fn concurrent_writers_never_duplicate() {
        let registry = Arc::new(Registry::empty(MaskPolicy::default()));
        registry
            .write(|s| {
                s.create_prefix("p1", "10.0.0.0/16", "")?;
                s.create_subnet("p1", "s1", "10.0.1.0/24", "").map(|_| ())
            })
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry.write(|s| {
                        s.create_host("p1", "s1", &format!("h{i}"), "10.0.1.10", "")
                            .map(|_| ())
                    })
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(Result::is_ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(registry.stats().hosts, 1);
    }
}
