/// Layout scheduler
///
/// Debounces layout invalidations to the next animation frame. Any number of
/// requests before a frame fires collapse into a single pass; a newer request
/// supersedes the pending ticket rather than queueing another frame.
#[derive(Debug, Default)]
pub struct LayoutScheduler {
    pending: Option<u64>,
    next_ticket: u64,
    passes: usize,
}

impl LayoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a layout pass on the next frame
    pub fn request(&mut self) {
        self.next_ticket += 1;
        if let Some(previous) = self.pending.replace(self.next_ticket) {
            log::trace!("layout ticket {} superseded by {}", previous, self.next_ticket);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Called on each frame tick; true when a layout pass should run now
    pub fn take_frame(&mut self) -> bool {
        if self.pending.take().is_some() {
            self.passes += 1;
            true
        } else {
            false
        }
    }

    /// Number of layout passes granted so far
    pub fn passes(&self) -> usize {
        self.passes
    }
}
