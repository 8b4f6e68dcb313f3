/// Running count of admitted messages in one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnCounter {
    count: u32,
}

impl SpawnCounter {
    /// Count one admitted message. Returns `true` exactly when `threshold` is
    /// reached, at which point the counter is already back at zero.
    pub fn tick(&mut self, threshold: u32) -> bool {
        self.count += 1;
        if self.count >= threshold {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_zero(&self) -> bool {
        self.count == 0
    }
}
