use std::collections::VecDeque;

use crate::PhaseId;

/// Most synthetic messages kept at once; older ones fall off the end.
pub const TICKER_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerMessage {
    pub id: u64,
    pub text: String,
}

/// Deterministic half of the ticker: which phase it is filling in for, the
/// round-robin cursor, and the bounded newest-first message list.
///
/// The timer itself lives in the engine. Each `start`/`stop` bumps the
/// generation so ticks from a replaced timer can be recognised and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerState {
    phase: Option<PhaseId>,
    source: Vec<String>,
    cursor: usize,
    messages: VecDeque<TickerMessage>,
    next_id: u64,
    generation: u64,
    active: bool,
}

impl Default for TickerState {
    fn default() -> Self {
        Self {
            phase: None,
            source: Vec::new(),
            cursor: 0,
            messages: VecDeque::with_capacity(TICKER_CAPACITY),
            next_id: 1,
            generation: 0,
            active: false,
        }
    }
}

impl TickerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was running with a fresh window for `phase`.
    ///
    /// Emits the first message immediately and returns `true` when a timer is
    /// needed. An empty catalog leaves the ticker idle.
    pub fn start(&mut self, phase: &str, catalog: &[String]) -> bool {
        self.generation += 1;
        self.messages.clear();
        self.cursor = 0;
        self.phase = Some(phase.to_string());
        self.source = catalog.to_vec();
        self.active = !self.source.is_empty();
        if self.active {
            self.emit_next();
        }
        self.active
    }

    /// Halts production. Already generated messages stay visible.
    /// Returns whether a timer was running.
    pub fn stop(&mut self) -> bool {
        let was_active = self.active;
        self.generation += 1;
        self.active = false;
        was_active
    }

    /// Stops and forgets everything except the id counter.
    pub fn reset(&mut self) -> bool {
        let was_active = self.stop();
        self.messages.clear();
        self.source.clear();
        self.cursor = 0;
        self.phase = None;
        was_active
    }

    /// Handles one timer tick. Ticks from a stale generation do nothing.
    pub fn tick(&mut self, generation: u64) -> bool {
        if !self.active || generation != self.generation {
            return false;
        }
        self.emit_next();
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> Option<&str> {
        self.phase.as_deref()
    }

    /// Newest first.
    pub fn messages(&self) -> impl Iterator<Item = &TickerMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn emit_next(&mut self) {
        let text = self.source[self.cursor % self.source.len()].clone();
        self.cursor = (self.cursor + 1) % self.source.len();
        let id = self.next_id;
        self.next_id += 1;

        self.messages.push_front(TickerMessage { id, text });
        self.messages.truncate(TICKER_CAPACITY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_catalog_is_a_noop() {
        let mut ticker = TickerState::new();
        assert!(!ticker.start("extracting", &[]));
        assert!(!ticker.is_active());
        assert!(ticker.is_empty());
        assert!(!ticker.tick(ticker.generation()));
    }

    #[test]
    fn ids_keep_increasing_across_restarts() {
        let mut ticker = TickerState::new();
        ticker.start("a", &catalog(&["one", "two"]));
        ticker.tick(ticker.generation());
        ticker.start("b", &catalog(&["three"]));

        let ids: Vec<u64> = ticker.messages().map(|m| m.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn reset_keeps_id_counter() {
        let mut ticker = TickerState::new();
        ticker.start("a", &catalog(&["one"]));
        assert!(ticker.reset());
        assert!(ticker.is_empty());
        assert_eq!(ticker.phase(), None);

        ticker.start("a", &catalog(&["one"]));
        assert_eq!(ticker.messages().next().map(|m| m.id), Some(2));
    }
}
