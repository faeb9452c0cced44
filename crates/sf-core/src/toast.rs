//! Auto-dismiss timer for a single toast.

/// Generation-stamped timer: hovering invalidates the running window, leaving
/// starts a fresh one.
#[derive(Clone, Debug, Default)]
pub struct ToastTimer {
    generation: u64,
    hovered: bool,
    closed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window(u64);

impl ToastTimer {
    /// Timer for a freshly shown toast; schedule the returned window.
    pub fn start() -> (Self, Window) {
        let timer = Self {
            generation: 1,
            hovered: false,
            closed: false,
        };
        (timer, Window(1))
    }

    pub fn pointer_enter(&mut self) {
        self.hovered = true;
        self.generation += 1;
    }

    /// Returns the fresh window to schedule, unless the toast is already closed.
    pub fn pointer_leave(&mut self) -> Option<Window> {
        self.hovered = false;
        if self.closed {
            return None;
        }
        self.generation += 1;
        Some(Window(self.generation))
    }

    /// A scheduled window elapsed. `true` means close now.
    pub fn elapsed(&mut self, window: Window) -> bool {
        if self.closed || self.hovered || window.0 != self.generation {
            return false;
        }
        self.closed = true;
        true
    }

    /// Close button. `true` the first time only.
    pub fn dismiss(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.generation += 1;
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closes_when_untouched() {
        let (mut timer, window) = ToastTimer::start();
        assert!(timer.elapsed(window));
        assert!(timer.is_closed());
    }

    #[test]
    fn hover_suspends_the_timer() {
        let (mut timer, window) = ToastTimer::start();
        timer.pointer_enter();
        assert!(!timer.elapsed(window));
        assert!(!timer.is_closed());
    }

    #[test]
    fn leaving_starts_a_fresh_window() {
        let (mut timer, first) = ToastTimer::start();
        timer.pointer_enter();
        let second = timer.pointer_leave().unwrap();
        assert!(!timer.elapsed(first));
        assert!(timer.elapsed(second));
    }

    #[test]
    fn close_button_wins_once() {
        let (mut timer, window) = ToastTimer::start();
        assert!(timer.dismiss());
        assert!(!timer.dismiss());
        assert!(!timer.elapsed(window));
        assert_eq!(timer.pointer_leave(), None);
    }
}
