// ABOUTME: Explicit popover visibility states and the fade-out animation descriptor
// ABOUTME: The controller derives all behavior from PopoverState instead of querying the toolkit

use std::fmt;
use std::time::Duration;

/// Fixed dismissal fade duration.
pub const FADE_OUT_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopoverState {
    #[default]
    Hidden,
    /// Frame computed and window ordered front, waiting for key focus.
    Positioning,
    Shown,
    /// Fade-out in flight; the window is still on screen.
    Dismissing,
}

impl PopoverState {
    /// Logical shown/hidden view: a popover that is fading out already counts as hidden.
    pub fn is_open(self) -> bool {
        matches!(self, PopoverState::Positioning | PopoverState::Shown)
    }
}

impl fmt::Display for PopoverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PopoverState::Hidden => "hidden",
            PopoverState::Positioning => "positioning",
            PopoverState::Shown => "shown",
            PopoverState::Dismissing => "dismissing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingCurve {
    Linear,
    EaseInEaseOut,
}

/// Identifies one fade-out so completions of superseded fades can be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeOut {
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub curve: TimingCurve,
}

impl FadeOut {
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            from: 1.0,
            to: 0.0,
            duration,
            curve: TimingCurve::EaseInEaseOut,
        }
    }
}

impl Default for FadeOut {
    fn default() -> Self {
        Self::with_duration(FADE_OUT_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_hidden() {
        assert_eq!(PopoverState::default(), PopoverState::Hidden);
    }

    #[test]
    fn test_dismissing_counts_as_closed() {
        assert!(!PopoverState::Hidden.is_open());
        assert!(PopoverState::Positioning.is_open());
        assert!(PopoverState::Shown.is_open());
        assert!(!PopoverState::Dismissing.is_open());
    }

    #[test]
    fn test_default_fade_out() {
        let fade = FadeOut::default();

        assert_eq!(fade.from, 1.0);
        assert_eq!(fade.to, 0.0);
        assert_eq!(fade.duration, Duration::from_millis(300));
        assert_eq!(fade.curve, TimingCurve::EaseInEaseOut);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PopoverState::Dismissing.to_string(), "dismissing");
    }
}
