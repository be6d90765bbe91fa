use std::fmt;

use serde::{Deserialize, Serialize};

/// Shift codes as they appear on printed rosters and in exchange payloads.
/// The string forms (`S`, `1F`, `2F`, `3F`, `SC`, `M`, `/`) are fixed for
/// interoperability and must not change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShiftCode {
    #[serde(rename = "S")]
    DayShift,
    #[serde(rename = "1F")]
    FirstHalf,
    #[serde(rename = "2F")]
    SecondHalf,
    #[serde(rename = "3F")]
    FullDay,
    #[serde(rename = "SC")]
    ShiftChange,
    #[serde(rename = "M")]
    Meeting,
    #[serde(rename = "/")]
    DayOff,
}

/// One row of the shift catalog. Times are wall-clock `HH:MM` strings used
/// for reporting only; the coverage flags are the ground truth for peak,
/// opening and closing semantics and are never recomputed from the times.
#[derive(Debug, Clone, Copy)]
pub struct ShiftTemplate {
    pub code: ShiftCode,
    pub name: &'static str,
    pub start: Option<&'static str>,
    pub end: Option<&'static str>,
    pub hours: f64,
    pub is_opening: bool,
    pub is_closing: bool,
    pub covers_lunch_peak: bool,
    pub covers_dinner_peak: bool,
}

/// Process-wide immutable shift table, indexed by [`ShiftCode`] declaration order.
pub const SHIFT_CATALOG: [ShiftTemplate; 7] = [
    ShiftTemplate {
        code: ShiftCode::DayShift,
        name: "Day Shift",
        start: Some("06:30"),
        end: Some("15:00"),
        hours: 8.5,
        is_opening: true,
        is_closing: false,
        covers_lunch_peak: true,
        covers_dinner_peak: false,
    },
    ShiftTemplate {
        code: ShiftCode::FirstHalf,
        name: "First Half",
        start: Some("06:30"),
        end: Some("15:30"),
        hours: 9.0,
        is_opening: true,
        is_closing: false,
        covers_lunch_peak: true,
        covers_dinner_peak: false,
    },
    ShiftTemplate {
        code: ShiftCode::SecondHalf,
        name: "Second Half",
        start: Some("14:00"),
        end: Some("23:00"),
        hours: 9.0,
        is_opening: false,
        is_closing: true,
        covers_lunch_peak: false,
        covers_dinner_peak: true,
    },
    ShiftTemplate {
        code: ShiftCode::FullDay,
        name: "Full Day",
        start: Some("08:00"),
        end: Some("20:00"),
        hours: 12.0,
        is_opening: false,
        is_closing: false,
        covers_lunch_peak: true,
        covers_dinner_peak: true,
    },
    ShiftTemplate {
        code: ShiftCode::ShiftChange,
        name: "Shift Change",
        start: Some("11:00"),
        end: Some("20:00"),
        hours: 9.0,
        is_opening: false,
        is_closing: false,
        covers_lunch_peak: true,
        covers_dinner_peak: true,
    },
    ShiftTemplate {
        code: ShiftCode::Meeting,
        name: "Meeting",
        start: Some("09:00"),
        end: Some("17:00"),
        hours: 8.0,
        is_opening: false,
        is_closing: false,
        covers_lunch_peak: true,
        covers_dinner_peak: false,
    },
    ShiftTemplate {
        code: ShiftCode::DayOff,
        name: "Day Off",
        start: None,
        end: None,
        hours: 0.0,
        is_opening: false,
        is_closing: false,
        covers_lunch_peak: false,
        covers_dinner_peak: false,
    },
];

impl ShiftCode {
    /// Every code that represents actual work, in catalog order.
    pub const ACTIVE: [ShiftCode; 6] = [
        ShiftCode::DayShift,
        ShiftCode::FirstHalf,
        ShiftCode::SecondHalf,
        ShiftCode::FullDay,
        ShiftCode::ShiftChange,
        ShiftCode::Meeting,
    ];

    pub fn template(self) -> &'static ShiftTemplate {
        &SHIFT_CATALOG[self as usize]
    }

    /// The surface string form, e.g. `"1F"`.
    pub fn code(self) -> &'static str {
        match self {
            ShiftCode::DayShift => "S",
            ShiftCode::FirstHalf => "1F",
            ShiftCode::SecondHalf => "2F",
            ShiftCode::FullDay => "3F",
            ShiftCode::ShiftChange => "SC",
            ShiftCode::Meeting => "M",
            ShiftCode::DayOff => "/",
        }
    }

    pub fn shift_name(self) -> &'static str {
        self.template().name
    }

    pub fn hours(self) -> f64 {
        self.template().hours
    }

    pub fn is_day_off(self) -> bool {
        self == ShiftCode::DayOff
    }

    pub fn is_opening(self) -> bool {
        self.template().is_opening
    }

    pub fn is_closing(self) -> bool {
        self.template().is_closing
    }

    pub fn covers_lunch_peak(self) -> bool {
        self.template().covers_lunch_peak
    }

    pub fn covers_dinner_peak(self) -> bool {
        self.template().covers_dinner_peak
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
