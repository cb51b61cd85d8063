use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 20;

/// Fixed-capacity record of recent wrist x positions, oldest evicted first.
///
/// The classifier only ever receives `&WristHistory`; appending is left to the
/// frame loop that owns it.
#[derive(Clone, Debug)]
pub struct WristHistory {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl WristHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, x: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(x);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[allow(dead_code)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Spread (max - min) of the recorded positions; zero when empty.
    pub fn amplitude(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let (min, max) = self
            .samples
            .iter()
            .fold((f32::MAX, f32::MIN), |(min, max), &x| (min.min(x), max.max(x)));
        max - min
    }

    #[allow(dead_code)]
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }
}

impl Default for WristHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
