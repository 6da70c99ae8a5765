use chrono::{Datelike, NaiveDate};

/// Calendar month with its fixed three-letter label. The enum order is the
/// calendar order, so sorting by `Month` is a compile-time guarantee rather
/// than a runtime categorical convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    pub fn abbrev(self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }

    pub fn from_abbrev(s: &str) -> Option<Month> {
        Month::ALL.iter().copied().find(|m| m.abbrev() == s)
    }

    /// 1-based calendar month number, as returned by `Datelike::month`.
    pub fn from_number(n: u32) -> Option<Month> {
        Month::ALL.get(n.checked_sub(1)? as usize).copied()
    }

    pub fn from_date(date: NaiveDate) -> Month {
        // month() is always 1..=12
        Month::from_number(date.month()).unwrap_or(Month::Jan)
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbrev())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_is_calendar_ordered() {
        let mut sorted = Month::ALL;
        sorted.sort();
        assert_eq!(sorted, Month::ALL);
        assert!(Month::Jan < Month::Dec);
    }

    #[test]
    fn abbrev_round_trips() {
        for m in Month::ALL {
            assert_eq!(Month::from_abbrev(m.abbrev()), Some(m));
        }
        assert_eq!(Month::from_abbrev("Janx"), None);
    }

    #[test]
    fn from_date_uses_calendar_month() {
        let d = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
        assert_eq!(Month::from_date(d), Month::Jun);
    }
}
