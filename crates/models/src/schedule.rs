use chrono::{NaiveTime, Weekday};
use serde::Serialize;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    ops::{BitAnd, BitOr, BitOrAssign},
    str::FromStr,
};

/// Represents the days of the week a class meets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[repr(transparent)]
pub struct DaySet(u8);

impl DaySet {
    pub const MONDAY: Self = DaySet(1 << 0);
    pub const TUESDAY: Self = DaySet(1 << 1);
    pub const WEDNESDAY: Self = DaySet(1 << 2);
    pub const THURSDAY: Self = DaySet(1 << 3);
    pub const FRIDAY: Self = DaySet(1 << 4);
    pub const SATURDAY: Self = DaySet(1 << 5);
    pub const SUNDAY: Self = DaySet(1 << 6);

    pub const WEEKDAYS: Self = DaySet(0b0011111);
    pub const NONE: Self = DaySet(0);

    /// Day, short name and full name, in week order
    const DAY_NAMES: [(Self, Weekday, &'static str, &'static str); 7] = [
        (Self::MONDAY, Weekday::Mon, "Mon", "Monday"),
        (Self::TUESDAY, Weekday::Tue, "Tue", "Tuesday"),
        (Self::WEDNESDAY, Weekday::Wed, "Wed", "Wednesday"),
        (Self::THURSDAY, Weekday::Thu, "Thu", "Thursday"),
        (Self::FRIDAY, Weekday::Fri, "Fri", "Friday"),
        (Self::SATURDAY, Weekday::Sat, "Sat", "Saturday"),
        (Self::SUNDAY, Weekday::Sun, "Sun", "Sunday"),
    ];

    pub fn contains(self, day: Self) -> bool {
        (self & day) == day
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn add(&mut self, day: Self) {
        *self |= day;
    }

    /// Parses a single day token such as `Mon`, `tues` or `Wednesday`
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim().trim_end_matches(['.', ',']);
        if token.len() < 3 {
            return None;
        }
        Self::DAY_NAMES
            .iter()
            .find(|(_, _, short, full)| {
                token.eq_ignore_ascii_case(short)
                    || (full.len() >= token.len()
                        && full[..token.len()].eq_ignore_ascii_case(token))
            })
            .map(|&(day, ..)| day)
    }

    /// Iterates over the contained days in week order
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        Self::DAY_NAMES
            .into_iter()
            .filter(move |&(day, ..)| self.contains(day))
            .map(|(_, weekday, ..)| weekday)
    }

    pub fn full_name(weekday: Weekday) -> &'static str {
        Self::DAY_NAMES[weekday.num_days_from_monday() as usize].3
    }
}

impl FromStr for DaySet {
    type Err = ();

    /// Accepts comma or space separated day names; unknown tokens are skipped
    fn from_str(days: &str) -> Result<Self, Self::Err> {
        let mut result = Self::NONE;

        for token in days.split([',', ' ', '/']).filter(|t| !t.is_empty()) {
            if let Some(day) = Self::from_token(token) {
                result |= day;
            }
        }

        Ok(result)
    }
}

impl Display for DaySet {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let names: Vec<&str> = Self::DAY_NAMES
            .iter()
            .filter(|(day, ..)| self.contains(*day))
            .map(|(_, _, short, _)| *short)
            .collect();

        write!(f, "{}", names.join(", "))
    }
}

impl BitOr for DaySet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        DaySet(self.0 | rhs.0)
    }
}

impl BitAnd for DaySet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        DaySet(self.0 & rhs.0)
    }
}

impl BitOrAssign for DaySet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A span of the day during which a class meets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub begin: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Creates a new `TimeRange` if `begin` is before `end`
    pub fn new(begin: NaiveTime, end: NaiveTime) -> Option<Self> {
        (begin < end).then_some(Self { begin, end })
    }

    /// Parses `09:00-10:30` (24-hour) or `9:00AM-10:30AM`
    pub fn parse(range: &str) -> Option<Self> {
        let (begin, end) = range.split_once('-')?;
        let begin = parse_time(begin.trim())?;
        let end = parse_time(end.trim())?;

        Self::new(begin, end)
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}-{}", self.begin.format("%H:%M"), self.end.format("%H:%M"))
    }
}

fn parse_time(time: &str) -> Option<NaiveTime> {
    ["%H:%M", "%I:%M%p", "%I:%M %p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())
}

/// A class schedule string such as `Mon, Wed 09:00-10:30`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassSchedule {
    pub days: DaySet,
    pub time: Option<TimeRange>,
}

impl ClassSchedule {
    /// One entry per meeting day, in week order
    pub fn slots(&self) -> impl Iterator<Item = ScheduleSlot> + '_ {
        self.days.iter().map(|weekday| ScheduleSlot {
            day: DaySet::full_name(weekday),
            time: self.time,
        })
    }
}

impl FromStr for ClassSchedule {
    type Err = ();

    /// The time range is the last whitespace separated token containing a `-`
    fn from_str(schedule: &str) -> Result<Self, Self::Err> {
        let schedule = schedule.trim();
        let (days, time) = match schedule.rsplit_once(char::is_whitespace) {
            Some((days, last)) if last.contains('-') => (days, TimeRange::parse(last)),
            _ => (schedule, None),
        };

        Ok(Self {
            days: DaySet::from_str(days)?,
            time,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub day: &'static str,
    pub time: Option<TimeRange>,
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_day_set_from_str() {
        let days = DaySet::from_str("Mon, Wed, Fri").unwrap();
        assert!(days.contains(DaySet::MONDAY));
        assert!(!days.contains(DaySet::TUESDAY));
        assert!(days.contains(DaySet::WEDNESDAY));
        assert!(!days.contains(DaySet::THURSDAY));
        assert!(days.contains(DaySet::FRIDAY));
        assert!(!days.contains(DaySet::SATURDAY));
        assert!(!days.contains(DaySet::SUNDAY));
    }

    #[test]
    fn test_day_tokens() {
        assert_eq!(DaySet::from_token("tues"), Some(DaySet::TUESDAY));
        assert_eq!(DaySet::from_token("Thursday"), Some(DaySet::THURSDAY));
        assert_eq!(DaySet::from_token("Thu,"), Some(DaySet::THURSDAY));
        assert_eq!(DaySet::from_token("M"), None);
        assert_eq!(DaySet::from_token("Moonday"), None);
    }

    #[test]
    fn test_day_set_display() {
        let mut days = DaySet::default();
        days.add(DaySet::FRIDAY);
        days.add(DaySet::MONDAY);

        assert_eq!(days.to_string(), "Mon, Fri");
        assert_eq!(DaySet::WEEKDAYS.iter().count(), 5);
    }

    #[test]
    fn test_timerange_parse() {
        let range = TimeRange::parse("09:00-10:30").unwrap();
        assert_eq!(range.begin.hour(), 9);
        assert_eq!(range.end.minute(), 30);
        assert_eq!(range.to_string(), "09:00-10:30");

        let range = TimeRange::parse("1:15PM-2:05PM").unwrap();
        assert_eq!(range.begin.hour(), 13);

        assert!(TimeRange::parse("10:30-09:00").is_none());
        assert!(TimeRange::parse("noon-one").is_none());
    }

    #[test]
    fn test_class_schedule_slots() {
        let schedule = ClassSchedule::from_str("Mon, Wed 09:00-10:30").unwrap();
        let slots: Vec<_> = schedule.slots().collect();

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].day, "Monday");
        assert_eq!(slots[1].day, "Wednesday");
        assert_eq!(slots[1].time.unwrap().to_string(), "09:00-10:30");
    }

    #[test]
    fn test_class_schedule_without_time() {
        let schedule = ClassSchedule::from_str("Tue Thu").unwrap();
        assert!(schedule.time.is_none());
        assert_eq!(schedule.days, DaySet::TUESDAY | DaySet::THURSDAY);

        let empty = ClassSchedule::from_str("").unwrap();
        assert!(empty.days.is_empty());
    }
}
