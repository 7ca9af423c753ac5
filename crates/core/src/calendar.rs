//! Date-dimension attributes for the analytics schemas.

use chrono::{Datelike, NaiveDate, Weekday};

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Attributes stored for each calendar date in the date dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateAttributes {
    pub date: NaiveDate,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub quarter: i32,
    pub month_name: &'static str,
    pub day_name: &'static str,
    pub is_weekend: bool,
}

impl DateAttributes {
    /// Derive every attribute from the date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        let month0 = date.month0();
        Self {
            date,
            year: date.year(),
            month: month_i32(date.month()),
            day: month_i32(date.day()),
            quarter: month_i32(month0 / 3 + 1),
            month_name: MONTH_NAMES
                .get(month0 as usize)
                .copied()
                .unwrap_or_default(),
            day_name: day_name(date.weekday()),
            is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        }
    }
}

// Month, day and quarter numbers are all below 32.
fn month_i32(n: u32) -> i32 {
    i32::try_from(n).unwrap_or_default()
}

const fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Lunes",
        Weekday::Tue => "Martes",
        Weekday::Wed => "Miércoles",
        Weekday::Thu => "Jueves",
        Weekday::Fri => "Viernes",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}
