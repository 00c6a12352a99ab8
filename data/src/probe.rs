use crate::viewport::{Dimensions, ViewportState};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeId(Uuid);

impl ProbeId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A vertical cursor pinned to a domain time.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    id: ProbeId,
    time: f64,
}

impl Probe {
    pub fn id(&self) -> ProbeId {
        self.id
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeEvent {
    Added { id: ProbeId, index: usize },
    Updated { id: ProbeId, index: usize },
    Removed { id: ProbeId, index: usize },
}

pub fn label(index: usize) -> String {
    format!("Probe {index}")
}

/// Probes in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Probes {
    entries: Vec<Probe>,
}

impl Probes {
    pub fn push(&mut self, time: f64) -> ProbeEvent {
        let id = ProbeId::new();
        self.entries.push(Probe { id, time });

        ProbeEvent::Added {
            id,
            index: self.entries.len() - 1,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<ProbeEvent> {
        if index >= self.entries.len() {
            return None;
        }
        let probe = self.entries.remove(index);

        Some(ProbeEvent::Removed {
            id: probe.id,
            index,
        })
    }

    pub fn remove_id(&mut self, id: ProbeId) -> Option<ProbeEvent> {
        self.index_of(id).and_then(|index| self.remove(index))
    }

    pub fn set_time(&mut self, id: ProbeId, time: f64) -> Option<ProbeEvent> {
        let index = self.index_of(id)?;
        self.entries[index].time = time;

        Some(ProbeEvent::Updated { id, index })
    }

    pub fn get(&self, index: usize) -> Option<&Probe> {
        self.entries.get(index)
    }

    pub fn index_of(&self, id: ProbeId) -> Option<usize> {
        self.entries.iter().position(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Probe> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// First probe, in storage order, under a mouse offset of `mouse_x`
    /// logical pixels from the widget's left edge.
    pub fn hit_test(&self, viewport: &ViewportState, size: Dimensions, mouse_x: f64) -> Option<ProbeId> {
        let mouse_x_pos = viewport.window(size).left + mouse_x;

        self.entries
            .iter()
            .find(|p| viewport.hits_time(p.time, mouse_x_pos))
            .map(|p| p.id)
    }
}
