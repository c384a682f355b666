// SPDX-License-Identifier: MPL-2.0
#![doc = r#"
# Design Tokens

Colours, spacing and sizes shared by every widget of the test client.

## Organization

- **Palette**: Base and semantic colours
- **Gaze**: Trajectory plot and score tier colours
- **Opacity**: Standardized opacity levels
- **Spacing**: Spacing scale (8px grid)
- **Sizing**: Component sizes
- **Typography**: Font size scale
- **Radius**: Border radii
- **Shadow**: Shadow definitions

## Examples

```
use iced_gaze::ui::design_tokens::{gaze, spacing};

let padding = spacing::MD; // 16px
assert!(gaze::INSIDE.g > gaze::INSIDE.r);
```
"#]

use iced::Color;

// ============================================================================
// Color Palette
// ============================================================================

pub mod palette {
    use super::Color;

    // Grayscale
    pub const BLACK: Color = Color::BLACK;
    pub const WHITE: Color = Color::WHITE;
    pub const GRAY_900: Color = Color::from_rgb(0.1, 0.1, 0.1);
    pub const GRAY_700: Color = Color::from_rgb(0.3, 0.3, 0.3);
    pub const GRAY_400: Color = Color::from_rgb(0.4, 0.4, 0.4);
    pub const GRAY_200: Color = Color::from_rgb(0.75, 0.75, 0.75);
    pub const GRAY_100: Color = Color::from_rgb(0.85, 0.85, 0.85);

    // Brand colors (blue scale)
    pub const PRIMARY_400: Color = Color::from_rgb(0.4, 0.7, 1.0);
    pub const PRIMARY_500: Color = Color::from_rgb(0.3, 0.6, 0.9);
    pub const PRIMARY_600: Color = Color::from_rgb(0.2, 0.5, 0.8);

    // Semantic colors
    pub const ERROR_500: Color = Color::from_rgb(0.898, 0.224, 0.208);
    pub const WARNING_500: Color = Color::from_rgb(0.945, 0.651, 0.125);
    pub const SUCCESS_500: Color = Color::from_rgb(0.263, 0.702, 0.404);
    pub const INFO_500: Color = Color::from_rgb(0.392, 0.588, 1.0);
}

// ============================================================================
// Gaze Colors
// ============================================================================

pub mod gaze {
    use super::Color;

    /// Gaze point inside the allowed range.
    pub const INSIDE: Color = Color::from_rgb(0.204, 0.78, 0.349);
    /// Gaze point outside the allowed range.
    pub const OUTSIDE: Color = Color::from_rgb(0.937, 0.267, 0.267);
    pub const START_MARKER: Color = Color::from_rgb(0.231, 0.51, 0.965);
    pub const END_MARKER: Color = Color::from_rgb(0.659, 0.333, 0.969);
    /// Allowed range outline; the fill uses the same colour, faded.
    pub const ALLOWED_RANGE: Color = Color::from_rgb(0.204, 0.78, 0.349);
    pub const TRAJECTORY_LINE: Color = Color::from_rgb(0.55, 0.55, 0.6);

    pub const TIER_EXCELLENT: Color = Color::from_rgb(0.133, 0.773, 0.369);
    pub const TIER_GOOD: Color = Color::from_rgb(0.231, 0.51, 0.965);
    pub const TIER_FAIR: Color = Color::from_rgb(0.918, 0.702, 0.031);
    pub const TIER_NEEDS_WORK: Color = Color::from_rgb(0.937, 0.267, 0.267);
}

// ============================================================================
// Opacity Scale
// ============================================================================

pub mod opacity {
    pub const TRANSPARENT: f32 = 0.0;
    pub const OVERLAY_SUBTLE: f32 = 0.2;
    pub const OVERLAY_MEDIUM: f32 = 0.5;
    pub const OVERLAY_STRONG: f32 = 0.7;
    pub const OPAQUE: f32 = 1.0;

    /// Surface background - Semi-transparent panels and containers
    pub const SURFACE: f32 = 0.95;

    /// Allowed range fill on the trajectory plot
    pub const RANGE_FILL: f32 = 0.12;
}

// ============================================================================
// Spacing Scale (8px baseline grid)
// ============================================================================

pub mod spacing {
    pub const XXS: f32 = 4.0; // 0.5 unit
    pub const XS: f32 = 8.0; // 1 unit
    pub const SM: f32 = 12.0; // 1.5 units
    pub const MD: f32 = 16.0; // 2 units
    pub const LG: f32 = 24.0; // 3 units
    pub const XL: f32 = 32.0; // 4 units
}

// ============================================================================
// Sizing Scale
// ============================================================================

pub mod sizing {
    pub const ICON_MD: f32 = 24.0;
    pub const ICON_LG: f32 = 32.0;
    pub const ICON_XL: f32 = 48.0;

    pub const BUTTON_HEIGHT: f32 = 36.0;

    /// Modal dialog width
    pub const MODAL_WIDTH: f32 = 720.0;

    /// Camera preview box inside the modal
    pub const PREVIEW_WIDTH: f32 = 480.0;
    pub const PREVIEW_HEIGHT: f32 = 360.0;

    /// Calibration target dot
    pub const CALIBRATION_TARGET: f32 = 28.0;

    pub const PROGRESS_BAR_HEIGHT: f32 = 10.0;

    /// Radius of a plotted gaze point
    pub const GAZE_POINT_RADIUS: f32 = 3.0;
    pub const GAZE_MARKER_RADIUS: f32 = 6.0;
}

// ============================================================================
// Typography Scale
// ============================================================================

pub mod typography {
    /// Score display on the result panel
    pub const DISPLAY: f32 = 48.0;

    /// Large title - Modal and home headings
    pub const TITLE_LG: f32 = 30.0;

    /// Medium title - Step headings
    pub const TITLE_MD: f32 = 20.0;

    /// Standard body - Most UI text, labels, descriptions
    pub const BODY: f32 = 14.0;

    /// Small body - Hints, secondary labels
    pub const BODY_SM: f32 = 13.0;

    /// Caption - Badges, timestamps, small info
    pub const CAPTION: f32 = 12.0;
}

// ============================================================================
// Border Radius Scale
// ============================================================================

pub mod radius {
    pub const SM: f32 = 4.0;
    pub const MD: f32 = 8.0;
    pub const LG: f32 = 12.0;
    pub const FULL: f32 = 9999.0; // Pill shape
}

// ============================================================================
// Shadow Definitions
// ============================================================================

pub mod shadow {
    use super::palette;
    use iced::{Shadow, Vector};

    pub const NONE: Shadow = Shadow {
        color: palette::BLACK,
        offset: Vector::ZERO,
        blur_radius: 0.0,
    };

    pub const SM: Shadow = Shadow {
        color: palette::BLACK,
        offset: Vector { x: 0.0, y: 2.0 },
        blur_radius: 4.0,
    };

    pub const MD: Shadow = Shadow {
        color: palette::BLACK,
        offset: Vector { x: 0.0, y: 4.0 },
        blur_radius: 8.0,
    };

    pub const LG: Shadow = Shadow {
        color: palette::BLACK,
        offset: Vector { x: 0.0, y: 8.0 },
        blur_radius: 16.0,
    };
}

// ============================================================================
// Compile-time Validation
// ============================================================================

const _: () = {
    assert!(spacing::XS > 0.0);
    assert!(spacing::SM > spacing::XS);
    assert!(spacing::MD > spacing::SM);
    assert!(spacing::LG > spacing::MD);

    assert!(opacity::TRANSPARENT == 0.0);
    assert!(opacity::OPAQUE == 1.0);
    assert!(opacity::RANGE_FILL > 0.0 && opacity::RANGE_FILL < opacity::OVERLAY_SUBTLE);
    assert!(opacity::SURFACE > 0.0 && opacity::SURFACE < 1.0);

    assert!(sizing::ICON_XL > sizing::ICON_LG);
    assert!(sizing::GAZE_MARKER_RADIUS > sizing::GAZE_POINT_RADIUS);
    assert!(sizing::PREVIEW_WIDTH < sizing::MODAL_WIDTH);

    assert!(typography::DISPLAY > typography::TITLE_LG);
    assert!(typography::TITLE_LG > typography::TITLE_MD);
    assert!(typography::BODY > typography::BODY_SM);
    assert!(typography::BODY_SM > typography::CAPTION);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_scale_is_consistent() {
        assert_eq!(spacing::MD, spacing::XS * 2.0);
        assert_eq!(spacing::LG, spacing::MD * 1.5);
    }

    #[test]
    fn inside_and_outside_points_are_distinguishable() {
        assert!(gaze::INSIDE.g > gaze::INSIDE.r);
        assert!(gaze::OUTSIDE.r > gaze::OUTSIDE.g);
        assert_ne!(gaze::START_MARKER, gaze::END_MARKER);
    }
}
