use ansi_term::Colour;

use super::daily::DayTotals;

/// How far back the activity heatmap reaches, roughly ten months.
pub const HEATMAP_DAYS: u32 = 300;

/// Intensity band for one heatmap cell. The scale runs red to yellow, a
/// day that reached the goal gets the distinct top band regardless of how
/// the rest of its hours split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    Empty,
    Scant,
    Low,
    Medium,
    Good,
    Optimal,
}

impl Shade {
    pub fn for_day(day: &DayTotals) -> Shade {
        if day.goal_reached() {
            Shade::Optimal
        } else if day.total == 0. {
            Shade::Empty
        } else if day.total < 2. {
            Shade::Scant
        } else if day.total < 3. {
            Shade::Low
        } else if day.total < 4.5 {
            Shade::Medium
        } else {
            Shade::Good
        }
    }

    /// Terminal colour for the band. Dark mode uses the saturated palette,
    /// light mode a softer one.
    pub fn colour(&self, dark_mode: bool) -> Colour {
        if dark_mode {
            match self {
                Shade::Empty => Colour::Fixed(236),
                Shade::Scant => Colour::Fixed(88),
                Shade::Low => Colour::Fixed(160),
                Shade::Medium => Colour::Fixed(208),
                Shade::Good => Colour::Fixed(214),
                Shade::Optimal => Colour::Fixed(227),
            }
        } else {
            match self {
                Shade::Empty => Colour::Fixed(254),
                Shade::Scant => Colour::Fixed(210),
                Shade::Low => Colour::Fixed(203),
                Shade::Medium => Colour::Fixed(215),
                Shade::Good => Colour::Fixed(220),
                Shade::Optimal => Colour::Fixed(229),
            }
        }
    }
}
