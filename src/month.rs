//! Calendar month filters for the `month` query parameter.

use time::{Date, Month, OffsetDateTime, macros::time};

use crate::{Error, timestamp::Timestamp};

const YEAR_MONTH_FORMAT: &str = "YYYY-MM";
const MONTH_OR_YEAR_MONTH_FORMAT: &str = "MM or YYYY-MM";

/// A calendar month in a specific year, e.g. March 2022.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleMonth {
    first_day: Date,
    last_day: Date,
}

/// An inclusive range of points in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    /// The first instant of the month.
    pub start: Timestamp,
    /// The last millisecond of the month, 23:59:59.999 on its last day.
    pub end: Timestamp,
}

impl SaleMonth {
    /// The month `month` of `year`.
    ///
    /// # Errors
    /// Returns an error if `year` is outside the range supported by [Date].
    pub fn new(year: i32, month: Month) -> Result<Self, time::error::ComponentRange> {
        Ok(Self {
            first_day: Date::from_calendar_date(year, month, 1)?,
            last_day: Date::from_calendar_date(year, month, last_day_of_month(year, month))?,
        })
    }

    /// Parse a month in the form `YYYY-MM`, e.g. `2022-03`.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonthFormat] if `text` is not exactly four
    /// digits, a dash and two digits, or if the month is not in 01-12.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let invalid = || invalid_month(text, YEAR_MONTH_FORMAT);

        let (year, month) = text.split_once('-').ok_or_else(invalid)?;
        let year = parse_digits(year, 4).ok_or_else(invalid)?;
        let month = parse_month_number(month).ok_or_else(invalid)?;

        Self::new(year as i32, month).map_err(|_| invalid())
    }

    /// Parse a month in the form `MM` or `YYYY-MM`, placing it in `year`.
    ///
    /// Any year in `text` is validated but ignored: the month always lands in
    /// `year`. The price histogram relies on this to filter by month of the
    /// current year.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonthFormat] if `text` is in neither form.
    pub fn parse_in_year(text: &str, year: i32) -> Result<Self, Error> {
        let invalid = || invalid_month(text, MONTH_OR_YEAR_MONTH_FORMAT);

        let month = match text.split_once('-') {
            Some((given_year, month)) => {
                parse_digits(given_year, 4).ok_or_else(invalid)?;
                month
            }
            None => text,
        };
        let month = parse_month_number(month).ok_or_else(invalid)?;

        Self::new(year, month).map_err(|_| invalid())
    }

    /// The inclusive range from the first instant of the month to
    /// 23:59:59.999 on its last day, in UTC.
    pub fn range(self) -> MonthRange {
        MonthRange {
            start: Timestamp::new(self.first_day.midnight().assume_utc()),
            end: Timestamp::new(self.last_day.with_time(time!(23:59:59.999)).assume_utc()),
        }
    }
}

/// The current year in UTC.
pub fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}

fn invalid_month(text: &str, expected: &'static str) -> Error {
    Error::InvalidMonthFormat {
        input: text.to_owned(),
        expected,
    }
}

/// Parse exactly `width` ASCII digits.
fn parse_digits(text: &str, width: usize) -> Option<u32> {
    if text.len() != width || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    text.parse().ok()
}

fn parse_month_number(text: &str) -> Option<Month> {
    parse_digits(text, 2).and_then(|number| Month::try_from(number as u8).ok())
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use time::{Date, Duration, Month, macros::datetime};

    use crate::{Error, timestamp::Timestamp};

    use super::SaleMonth;

    #[test]
    fn parses_year_month() {
        assert_eq!(
            SaleMonth::parse("2022-03"),
            Ok(SaleMonth::new(2022, Month::March).unwrap())
        );
    }

    #[test]
    fn rejects_invalid_year_month() {
        for input in ["2024-13", "2024-00", "abc", "2024-1", "24-01", "2024-01-01", "", "２０２４-01"] {
            let got = SaleMonth::parse(input);

            assert_eq!(
                got,
                Err(Error::InvalidMonthFormat {
                    input: input.to_owned(),
                    expected: "YYYY-MM",
                }),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn range_is_inclusive_first_to_last_millisecond() {
        let range = SaleMonth::new(2021, Month::November).unwrap().range();

        assert_eq!(range.start, Timestamp::new(datetime!(2021-11-01 00:00 UTC)));
        assert_eq!(
            range.end,
            Timestamp::new(datetime!(2021-11-30 23:59:59.999 UTC))
        );
    }

    #[test]
    fn range_covers_every_day_and_excludes_next_month() {
        for year in [2021, 2023, 2024, 2100] {
            for month_number in 1..=12u8 {
                let month = Month::try_from(month_number).unwrap();
                let range = SaleMonth::new(year, month).unwrap().range();

                let mut day = Date::from_calendar_date(year, month, 1).unwrap();
                while day.month() == month {
                    let noon = Timestamp::new(day.midnight().assume_utc() + Duration::hours(12));
                    assert!(range.start <= noon && noon <= range.end, "{day} not in range");
                    day = day.next_day().unwrap();
                }

                let next_month_start = Timestamp::new(day.midnight().assume_utc());
                assert!(
                    next_month_start > range.end,
                    "{day} should not be in {year}-{month_number:02}"
                );
            }
        }
    }

    #[test]
    fn february_has_leap_days() {
        let leap = SaleMonth::new(2024, Month::February).unwrap().range();
        let common = SaleMonth::new(2023, Month::February).unwrap().range();

        assert_eq!(leap.end.as_offset_date_time().day(), 29);
        assert_eq!(common.end.as_offset_date_time().day(), 28);
    }

    #[test]
    fn parse_in_year_accepts_bare_month() {
        assert_eq!(
            SaleMonth::parse_in_year("07", 2026),
            Ok(SaleMonth::new(2026, Month::July).unwrap())
        );
    }

    #[test]
    fn parse_in_year_ignores_given_year() {
        assert_eq!(
            SaleMonth::parse_in_year("2021-07", 2026),
            Ok(SaleMonth::new(2026, Month::July).unwrap())
        );
    }

    #[test]
    fn parse_in_year_rejects_invalid_month() {
        for input in ["13", "7", "July", "2021-7", "21-07"] {
            assert_eq!(
                SaleMonth::parse_in_year(input, 2026),
                Err(Error::InvalidMonthFormat {
                    input: input.to_owned(),
                    expected: "MM or YYYY-MM",
                }),
                "input {input:?}"
            );
        }
    }
}
