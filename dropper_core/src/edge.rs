//! Rising-edge detection on a sampled binary signal.

/// Calls a registered action once per low-to-high transition.
///
/// `observe` must be called with every available sample, often enough that
/// each transition is seen at least once. No debouncing is done here.
pub struct EdgeTrigger<F: FnMut()> {
    last: bool,
    action: F,
}

impl<F: FnMut()> EdgeTrigger<F> {
    /// The signal is assumed low before the first sample.
    pub fn new(action: F) -> Self {
        Self {
            last: false,
            action,
        }
    }

    /// Feed one sample; returns whether it was a rising edge.
    pub fn observe(&mut self, signal: bool) -> bool {
        let rising = signal && !self.last;
        self.last = signal;
        if rising {
            (self.action)();
        }
        rising
    }

    /// Set the last level without firing, e.g. from the first real sample.
    pub fn seed(&mut self, level: bool) {
        self.last = level;
    }

    /// The last observed sample.
    pub fn level(&self) -> bool {
        self.last
    }
}

impl<F: FnMut()> core::fmt::Debug for EdgeTrigger<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EdgeTrigger").field("last", &self.last).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_rising_edges() {
        let hits = std::cell::Cell::new(0u32);
        let mut edge = EdgeTrigger::new(|| hits.set(hits.get() + 1));
        let rising: Vec<bool> = [false, true, true, false, true]
            .into_iter()
            .map(|s| edge.observe(s))
            .collect();
        assert_eq!(rising, vec![false, true, false, false, true]);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn falling_edges_and_repeats_are_silent() {
        let hits = std::cell::Cell::new(0u32);
        let mut edge = EdgeTrigger::new(|| hits.set(hits.get() + 1));
        for s in [false, false, true, false, false] {
            edge.observe(s);
        }
        assert_eq!(hits.get(), 1);
        assert!(!edge.level());
    }
}
