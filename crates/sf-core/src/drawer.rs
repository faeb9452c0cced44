//! Swipe-to-dismiss gesture recognizer for popup drawers.

use sf_api_types::SwipeDirection;

pub const DEFAULT_THRESHOLD_PX: f64 = 5.0;
pub const DEFAULT_DISTANCE_PX: f64 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawerConfig {
    pub direction: SwipeDirection,
    /// Minimum movement before a drag counts at all.
    pub threshold: f64,
    /// Displacement past which releasing closes the drawer.
    pub distance: f64,
}

impl DrawerConfig {
    pub fn new(direction: SwipeDirection) -> Self {
        Self {
            direction,
            threshold: DEFAULT_THRESHOLD_PX,
            distance: DEFAULT_DISTANCE_PX,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Scroll geometry of the drawer container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,
    pub offset_width: f64,
    pub offset_height: f64,
}

impl ScrollMetrics {
    /// A swipe may only start once content is scrolled to the edge it moves away from.
    pub fn at_edge(&self, direction: SwipeDirection) -> bool {
        match direction {
            SwipeDirection::Left => self.scroll_left >= self.scroll_width - self.offset_width,
            SwipeDirection::Right => self.scroll_left == 0.0,
            SwipeDirection::Up => self.scroll_top >= self.scroll_height - self.offset_height,
            SwipeDirection::Down => self.scroll_top == 0.0,
        }
    }
}

pub fn dominant_direction(dx: f64, dy: f64) -> SwipeDirection {
    if dx.abs() > dy.abs() {
        if dx > 0.0 { SwipeDirection::Right } else { SwipeDirection::Left }
    } else if dy > 0.0 {
        SwipeDirection::Down
    } else {
        SwipeDirection::Up
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveFeedback {
    /// Gesture aborted; clear translation and `touching`/`may-close`.
    Reset,
    /// First sample recorded as the anchor.
    Anchored,
    Drag {
        /// `Some((x, y))` while pulling in the configured direction.
        translate: Option<(f64, f64)>,
        may_close: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The drawer is already closing.
    Ignored,
    SpringBack,
    Close,
}

#[derive(Clone, Debug)]
pub struct DrawerGesture {
    config: DrawerConfig,
    start: Option<Point>,
    pulling: bool,
    may_close: bool,
}

impl DrawerGesture {
    /// Drawers only exist on touch devices and on visible containers.
    pub fn attach(config: DrawerConfig, touch_device: bool, hidden: bool) -> Option<Self> {
        if !touch_device || hidden {
            return None;
        }
        Some(Self {
            config,
            start: None,
            pulling: false,
            may_close: false,
        })
    }

    pub fn config(&self) -> &DrawerConfig {
        &self.config
    }

    /// Returns whether the container should get the `touching` class.
    pub fn touch_start(&self, closing: bool) -> bool {
        !closing
    }

    pub fn touch_move(&mut self, touch: Option<Point>, at_edge: bool, closing: bool) -> MoveFeedback {
        let touch = match touch {
            Some(p) if !closing && at_edge => p,
            _ => {
                self.reset();
                return MoveFeedback::Reset;
            }
        };

        let Some(start) = self.start else {
            self.start = Some(touch);
            return MoveFeedback::Anchored;
        };

        let dx = touch.x - start.x;
        let dy = touch.y - start.y;
        let (ax, ay) = (dx.abs(), dy.abs());
        let direction = dominant_direction(dx, dy);
        let horizontal = direction.is_horizontal();

        self.pulling = direction == self.config.direction && ax.max(ay) >= self.config.threshold;
        self.may_close = self.pulling
            && if horizontal {
                ax > self.config.distance
            } else {
                ay > self.config.distance
            };

        let translate = self
            .pulling
            .then(|| if horizontal { (dx, 0.0) } else { (0.0, dy) });
        MoveFeedback::Drag {
            translate,
            may_close: self.may_close,
        }
    }

    pub fn touch_end(&mut self, closing: bool) -> ReleaseOutcome {
        if closing {
            return ReleaseOutcome::Ignored;
        }
        let close = self.pulling && self.may_close;
        self.reset();
        if close {
            ReleaseOutcome::Close
        } else {
            ReleaseOutcome::SpringBack
        }
    }

    fn reset(&mut self) {
        self.start = None;
        self.pulling = false;
        self.may_close = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_drawer() -> DrawerGesture {
        DrawerGesture::attach(DrawerConfig::new(SwipeDirection::Down), true, false).unwrap()
    }

    fn p(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    #[test]
    fn not_attached_on_mouse_devices_or_hidden_containers() {
        let config = DrawerConfig::new(SwipeDirection::Down);
        assert!(DrawerGesture::attach(config, false, false).is_none());
        assert!(DrawerGesture::attach(config, true, true).is_none());
    }

    #[test]
    fn long_swipe_in_direction_closes() {
        let mut drawer = down_drawer();
        assert!(drawer.touch_start(false));
        assert_eq!(drawer.touch_move(Some(p(10.0, 10.0)), true, false), MoveFeedback::Anchored);
        assert_eq!(
            drawer.touch_move(Some(p(12.0, 50.0)), true, false),
            MoveFeedback::Drag {
                translate: Some((0.0, 40.0)),
                may_close: false
            }
        );
        assert_eq!(
            drawer.touch_move(Some(p(12.0, 100.0)), true, false),
            MoveFeedback::Drag {
                translate: Some((0.0, 90.0)),
                may_close: true
            }
        );
        assert_eq!(drawer.touch_end(false), ReleaseOutcome::Close);
    }

    #[test]
    fn short_swipe_springs_back() {
        let mut drawer = down_drawer();
        drawer.touch_move(Some(p(0.0, 0.0)), true, false);
        drawer.touch_move(Some(p(0.0, 60.0)), true, false);
        assert_eq!(drawer.touch_end(false), ReleaseOutcome::SpringBack);
    }

    #[test]
    fn wrong_direction_springs_back() {
        let mut drawer = down_drawer();
        drawer.touch_move(Some(p(0.0, 200.0)), true, false);
        let feedback = drawer.touch_move(Some(p(0.0, 50.0)), true, false);
        assert_eq!(
            feedback,
            MoveFeedback::Drag {
                translate: None,
                may_close: false
            }
        );
        assert_eq!(drawer.touch_end(false), ReleaseOutcome::SpringBack);
    }

    #[test]
    fn sub_threshold_movement_is_ignored() {
        let mut drawer = down_drawer();
        drawer.touch_move(Some(p(0.0, 0.0)), true, false);
        let feedback = drawer.touch_move(Some(p(0.0, 4.0)), true, false);
        assert_eq!(
            feedback,
            MoveFeedback::Drag {
                translate: None,
                may_close: false
            }
        );
    }

    #[test]
    fn leaving_the_scroll_edge_resets_the_gesture() {
        let mut drawer = down_drawer();
        drawer.touch_move(Some(p(0.0, 0.0)), true, false);
        drawer.touch_move(Some(p(0.0, 120.0)), true, false);
        assert_eq!(drawer.touch_move(Some(p(0.0, 130.0)), false, false), MoveFeedback::Reset);
        assert_eq!(drawer.touch_end(false), ReleaseOutcome::SpringBack);
    }

    #[test]
    fn releasing_while_closing_is_ignored() {
        let mut drawer = down_drawer();
        assert!(!drawer.touch_start(true));
        assert_eq!(drawer.touch_end(true), ReleaseOutcome::Ignored);
    }

    #[test]
    fn horizontal_drawer_uses_x_distance() {
        let mut drawer =
            DrawerGesture::attach(DrawerConfig::new(SwipeDirection::Right), true, false).unwrap();
        drawer.touch_move(Some(p(0.0, 0.0)), true, false);
        assert_eq!(
            drawer.touch_move(Some(p(81.0, 3.0)), true, false),
            MoveFeedback::Drag {
                translate: Some((81.0, 0.0)),
                may_close: true
            }
        );
        assert_eq!(drawer.touch_end(false), ReleaseOutcome::Close);
    }

    #[test]
    fn scroll_edges() {
        let top = ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 900.0,
            offset_height: 600.0,
            ..Default::default()
        };
        assert!(top.at_edge(SwipeDirection::Down));
        assert!(!top.at_edge(SwipeDirection::Up));

        let bottom = ScrollMetrics {
            scroll_top: 300.0,
            ..top
        };
        assert!(bottom.at_edge(SwipeDirection::Up));
        assert!(!bottom.at_edge(SwipeDirection::Down));
    }

    #[test]
    fn dominant_axis_wins() {
        assert_eq!(dominant_direction(10.0, 3.0), SwipeDirection::Right);
        assert_eq!(dominant_direction(-10.0, 3.0), SwipeDirection::Left);
        assert_eq!(dominant_direction(3.0, -10.0), SwipeDirection::Up);
        assert_eq!(dominant_direction(0.0, 0.0), SwipeDirection::Up);
    }
}
