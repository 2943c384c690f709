#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub scanned: u64,
    pub discovered: u64,
    pub bytes: u64,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.discovered == 0 {
            0.0
        } else {
            (self.scanned as f32 / self.discovered as f32).clamp(0.0, 1.0)
        }
    }
}
