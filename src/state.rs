extern crate chrono;

const MINUTE_MILLIS: i64 = 60 * 1000;

/// Device colour in the Hue bridge's colour space: hue wraps at 65535,
/// saturation and brightness top out at 254.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HueColor {
    pub hue: u16,
    pub sat: u8,
    pub bri: u8,
}

// Degrees on the colour wheel scaled to the bridge's 16-bit hue.
const fn hue_degrees(degrees: u32) -> HueColor {
    return HueColor {
        hue: (degrees * 65535 / 360) as u16,
        sat: 254,
        bri: 254,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Off,
    Yellow,
    Gold,
    Goldenrod,
    DarkOrange,
    Orange,
    OrangeRed,
    Red,
}

// Largest threshold first; anything under the last one is Red.
const LADDER: [(i64, DisplayState); 7] = [
    (15 * MINUTE_MILLIS, DisplayState::Off),
    (10 * MINUTE_MILLIS, DisplayState::Yellow),
    (9 * MINUTE_MILLIS, DisplayState::Gold),
    (7 * MINUTE_MILLIS, DisplayState::Goldenrod),
    (5 * MINUTE_MILLIS, DisplayState::DarkOrange),
    (4 * MINUTE_MILLIS, DisplayState::Orange),
    (3 * MINUTE_MILLIS, DisplayState::OrangeRed),
];

impl DisplayState {
    pub fn is_on(&self) -> bool {
        return *self != DisplayState::Off;
    }

    pub fn color(&self) -> Option<HueColor> {
        match *self {
            DisplayState::Off => None,
            DisplayState::Yellow => Some(hue_degrees(60)),
            DisplayState::Gold => Some(hue_degrees(51)),
            DisplayState::Goldenrod => Some(hue_degrees(43)),
            DisplayState::DarkOrange => Some(hue_degrees(33)),
            DisplayState::Orange => Some(hue_degrees(39)),
            DisplayState::OrangeRed => Some(hue_degrees(16)),
            DisplayState::Red => Some(hue_degrees(0)),
        }
    }

    pub fn next_check_delay(&self) -> chrono::Duration {
        match *self {
            DisplayState::Off => chrono::Duration::minutes(5),
            _ => chrono::Duration::seconds(60),
        }
    }

    pub fn describe(&self) -> &'static str {
        match *self {
            DisplayState::Off => "Light off! No bus for at least 15 minutes",
            DisplayState::Yellow => "Yellow (next bus in 10-15 minutes)",
            DisplayState::Gold => "Gold (next bus in 9-10 minutes)",
            DisplayState::Goldenrod => "Goldenrod (next bus in 7-9 minutes)",
            DisplayState::DarkOrange => "Dark orange (next bus in 5-7 minutes)",
            DisplayState::Orange => "Orange (next bus in 4-5 minutes)",
            DisplayState::OrangeRed => "Orange red (next bus in 3-4 minutes)",
            DisplayState::Red => "Red (next bus in less than 3 minutes)",
        }
    }
}

impl std::fmt::Display for DisplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        return write!(f, "{}", self.describe());
    }
}

/// Maps millis-until-arrival onto a light state and the delay before the
/// next check.
pub fn map_remaining_to_state(remaining_millis: i64) -> (DisplayState, chrono::Duration) {
    let state = LADDER.iter()
        .find(|&&(threshold, _)| remaining_millis >= threshold)
        .map(|&(_, state)| state)
        .unwrap_or(DisplayState::Red);
    return (state, state.next_check_delay());
}
