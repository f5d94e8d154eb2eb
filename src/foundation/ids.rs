use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one [`EffectContainer`](crate::EffectContainer) arena.
///
/// Every effect and variable id carries the id of the arena that owns it, which makes
/// references into a different graph detectable instead of silently aliasing an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphId(u64);

impl GraphId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            graph: GraphId,
            index: u32,
        }

        impl $name {
            pub(crate) fn new(graph: GraphId, index: usize) -> Self {
                Self {
                    graph,
                    index: u32::try_from(index).unwrap_or(u32::MAX),
                }
            }

            /// Graph arena that owns this item.
            pub fn graph(self) -> GraphId {
                self.graph
            }

            /// Slot index inside the owning arena.
            pub fn index(self) -> usize {
                self.index as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}@{}"), self.index, self.graph)
            }
        }
    };
}

arena_id!(
    /// Identifies an effect inside its container arena.
    EffectId,
    "effect"
);
arena_id!(
    /// Identifies an input variable (a binding sink).
    InputId,
    "in"
);
arena_id!(
    /// Identifies an output variable (a value source).
    OutputId,
    "out"
);

/// Handle returned by graph subscriptions and engine listener registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
