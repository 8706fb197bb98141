// ABOUTME: Popover placement relative to the status icon, with screen-edge handling
// ABOUTME: Pure functions so the placement rules can be tested without a window server

use crate::geometry::{Point, Rect, ScreenGeometry, Size};

/// Inset between the icon edge and the popover edge, in points.
pub const WINDOW_BORDER_OFFSET: f64 = 2.0;

/// Used when the window server reports no screen at all.
pub const FALLBACK_SCREEN: Rect = Rect::new(0.0, 0.0, 1440.0, 900.0);

/// Everything the placement rules need, gathered from the backend at show time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRequest {
    pub icon_frame: Option<Rect>,
    pub icon_screen: Option<ScreenGeometry>,
    pub main_screen: Option<ScreenGeometry>,
    pub popover_size: Size,
    pub border_offset: f64,
}

/// How the popover ended up anchored. Mostly useful for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    LeftAligned,
    RightAligned,
    Centered,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub frame: Rect,
    pub anchor: Anchor,
}

pub fn place_popover(request: &PlacementRequest) -> Placement {
    let size = request.popover_size;

    let (icon_frame, screen) = match (request.icon_frame, request.icon_screen) {
        (Some(icon_frame), Some(screen)) => (icon_frame, screen),
        _ => {
            let area = request
                .main_screen
                .map(|screen| screen.visible_frame)
                .unwrap_or(FALLBACK_SCREEN);
            return Placement {
                frame: center_in(area, size),
                anchor: Anchor::Centered,
            };
        }
    };

    let top = icon_frame.min_y();
    let left_x = icon_frame.min_x() + request.border_offset;

    if left_x + size.width > screen.visible_frame.max_x() {
        let right_x = icon_frame.max_x() - request.border_offset - size.width;
        Placement {
            frame: Rect::from_top_left(Point::new(right_x, top), size),
            anchor: Anchor::RightAligned,
        }
    } else {
        Placement {
            frame: Rect::from_top_left(Point::new(left_x, top), size),
            anchor: Anchor::LeftAligned,
        }
    }
}

pub fn center_in(area: Rect, size: Size) -> Rect {
    Rect::new(
        area.mid_x() - size.width / 2.0,
        area.mid_y() - size.height / 2.0,
        size.width,
        size.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laptop_screen() -> ScreenGeometry {
        ScreenGeometry::new(
            Rect::new(0.0, 0.0, 1512.0, 982.0),
            Rect::new(0.0, 0.0, 1512.0, 945.0),
        )
    }

    fn request(icon_x: f64, popover_width: f64) -> PlacementRequest {
        PlacementRequest {
            icon_frame: Some(Rect::new(icon_x, 945.0, 30.0, 37.0)),
            icon_screen: Some(laptop_screen()),
            main_screen: Some(laptop_screen()),
            popover_size: Size::new(popover_width, 400.0),
            border_offset: WINDOW_BORDER_OFFSET,
        }
    }

    #[test]
    fn test_left_aligned_when_space_remains() {
        let placement = place_popover(&request(600.0, 300.0));

        assert_eq!(placement.anchor, Anchor::LeftAligned);
        assert_eq!(placement.frame.origin.x, 600.0 + WINDOW_BORDER_OFFSET);
    }

    #[test]
    fn test_popover_hangs_below_icon() {
        let placement = place_popover(&request(600.0, 300.0));

        assert_eq!(placement.frame.max_y(), 945.0);
        assert_eq!(placement.frame.origin.y, 545.0);
        assert_eq!(placement.frame.size, Size::new(300.0, 400.0));
    }

    #[test]
    fn test_right_aligned_when_overflowing() {
        let placement = place_popover(&request(1400.0, 300.0));

        assert_eq!(placement.anchor, Anchor::RightAligned);
        assert_eq!(
            placement.frame.origin.x,
            1400.0 + 30.0 - WINDOW_BORDER_OFFSET - 300.0
        );
        assert!(placement.frame.max_x() <= laptop_screen().visible_frame.max_x());
    }

    #[test]
    fn test_exact_fit_stays_left_aligned() {
        // 1210 + 2 + 300 == 1512
        let placement = place_popover(&request(1210.0, 300.0));

        assert_eq!(placement.anchor, Anchor::LeftAligned);
        assert_eq!(placement.frame.max_x(), 1512.0);
    }

    #[test]
    fn test_secondary_screen_uses_its_own_edge() {
        let secondary = ScreenGeometry::new(
            Rect::new(1512.0, 0.0, 1920.0, 1080.0),
            Rect::new(1512.0, 0.0, 1920.0, 1050.0),
        );
        let mut req = request(2000.0, 400.0);
        req.icon_screen = Some(secondary);

        let placement = place_popover(&req);

        assert_eq!(placement.anchor, Anchor::LeftAligned);
        assert_eq!(placement.frame.origin.x, 2002.0);
    }

    #[test]
    fn test_unknown_icon_frame_centers_on_main_screen() {
        let mut req = request(600.0, 300.0);
        req.icon_frame = None;

        let placement = place_popover(&req);

        assert_eq!(placement.anchor, Anchor::Centered);
        assert_eq!(placement.frame.mid_x(), 756.0);
        assert_eq!(placement.frame.mid_y(), 472.5);
    }

    #[test]
    fn test_missing_icon_screen_centers() {
        let mut req = request(600.0, 300.0);
        req.icon_screen = None;

        assert_eq!(place_popover(&req).anchor, Anchor::Centered);
    }

    #[test]
    fn test_no_screens_centers_on_fallback() {
        let req = PlacementRequest {
            icon_frame: None,
            icon_screen: None,
            main_screen: None,
            popover_size: Size::new(240.0, 100.0),
            border_offset: WINDOW_BORDER_OFFSET,
        };

        let placement = place_popover(&req);

        assert_eq!(placement.frame, Rect::new(600.0, 400.0, 240.0, 100.0));
    }

    #[test]
    fn test_custom_border_offset() {
        let mut req = request(600.0, 300.0);
        req.border_offset = 6.0;

        assert_eq!(place_popover(&req).frame.origin.x, 606.0);
    }
}
