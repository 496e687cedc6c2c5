use std::time::Instant;
use tracing::info;

/// Step counter that reports through `tracing` every `every` steps.
#[derive(Clone, Debug)]
pub struct Progress {
    enabled: bool,
    stage: String,
    done: usize,
    total: usize,
    every: usize,
    t0: Instant,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stage: String::new(),
            done: 0,
            total: 0,
            every: 100,
            t0: Instant::now(),
        }
    }
    pub fn every(mut self, n: usize) -> Self {
        self.every = n.max(1);
        self
    }
    pub fn set_stage(&mut self, s: &str) {
        self.stage = s.to_string();
    }
    pub fn set_total(&mut self, n: usize) {
        self.total = n;
        self.done = 0;
        self.t0 = Instant::now();
    }
    pub fn done(&self) -> usize {
        self.done
    }

    pub fn inc(&mut self) {
        self.done += 1;
        if self.enabled && (self.done % self.every == 0 || self.done == self.total) {
            let pct = if self.total > 0 {
                (self.done as f64 / self.total as f64) * 100.0
            } else {
                0.0
            };
            info!(
                "[{:>4}s] {} | {}/{} ({}%)",
                self.t0.elapsed().as_secs(),
                self.stage,
                self.done,
                self.total,
                pct as i32
            );
        }
    }
}
