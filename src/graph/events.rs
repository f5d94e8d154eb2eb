use std::fmt;
use std::sync::Arc;

use crate::foundation::ids::{EffectId, InputId, SubscriptionId};

/// Change notification emitted by an [`EffectContainer`](crate::EffectContainer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    EffectAdded(EffectId),
    EffectRemoved(EffectId),
    EffectMoved(EffectId),
    /// A binding or constant changed; `effect` is `None` for container-level variables.
    VariableChanged {
        effect: Option<EffectId>,
        input: InputId,
    },
    ChannelsChanged,
    /// Container inputs or outputs were added or removed.
    SurfaceChanged,
    /// The nested container of a composite effect was edited.
    NestedChanged(EffectId),
}

type Callback = Arc<dyn Fn(&GraphEvent) + Send + Sync>;

/// Subscriber list of one container. Graph edits require `&mut`, so delivery is synchronous
/// and ordered.
#[derive(Default)]
pub(crate) struct Subscribers {
    next: u64,
    entries: Vec<(SubscriptionId, Callback)>,
}

impl Subscribers {
    pub(crate) fn add(&mut self, callback: Callback) -> SubscriptionId {
        self.next += 1;
        let id = SubscriptionId(self.next);
        self.entries.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(sid, _)| *sid != id);
        before != self.entries.len()
    }

    pub(crate) fn emit(&self, event: GraphEvent) {
        for (_, callback) in &self.entries {
            callback(&event);
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.entries.len())
            .finish()
    }
}
