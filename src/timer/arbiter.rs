/// Which segments to stop and start to honour a start request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handoff {
    pub stop: Option<String>,
    pub start: Option<String>,
}

/// Owns the id of the one running segment.
///
/// The engine never changes which segment is active except by asking the
/// arbiter and then applying the returned [`Handoff`].
#[derive(Debug, Clone, Default)]
pub struct ExclusivityArbiter {
    active: Option<String>,
}

impl ExclusivityArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.as_deref() == Some(id)
    }

    /// Re-requesting the active segment yields an empty handoff.
    pub fn request_start(&mut self, id: &str) -> Handoff {
        if self.is_active(id) {
            return Handoff::default();
        }
        let previous = self.active.replace(id.to_string());
        Handoff {
            stop: previous,
            start: Some(id.to_string()),
        }
    }

    pub fn request_stop(&mut self) -> Option<String> {
        self.active.take()
    }

    /// Releases `id` if it is the active segment.
    pub fn release(&mut self, id: &str) -> bool {
        if self.is_active(id) {
            self.active = None;
            true
        } else {
            false
        }
    }
}
