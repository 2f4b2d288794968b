//! MS-DOS date/time fields used by ZIP headers.
//!
//! Time is packed as `hour << 11 | minute << 5 | second / 2` and date as
//! `(year - 1980) << 9 | month << 5 | day`, so only even seconds and the
//! years 1980 through 2107 are representable.

use time::{OffsetDateTime, PrimitiveDateTime};

const MIN_YEAR: i32 = 1980;
const MAX_YEAR: i32 = 2107;

/// A packed DOS timestamp as stored in local and central headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable moment.
    pub const MIN: Self = Self {
        time: 0,
        date: (1 << 5) | 1,
    };

    /// 2107-12-31 23:59:58, the latest representable moment.
    pub const MAX: Self = Self {
        time: (23 << 11) | (59 << 5) | 29,
        date: (((MAX_YEAR - MIN_YEAR) as u16) << 9) | (12 << 5) | 31,
    };

    /// Wrap raw header fields.
    pub const fn from_raw(time: u16, date: u16) -> Self {
        Self { time, date }
    }

    /// Encode a calendar moment, clamping to [`MIN`](Self::MIN)..=[`MAX`](Self::MAX).
    pub fn from_datetime(dt: PrimitiveDateTime) -> Self {
        if dt.year() < MIN_YEAR {
            return Self::MIN;
        }
        if dt.year() > MAX_YEAR {
            return Self::MAX;
        }

        let time =
            ((dt.hour() as u16) << 11) | ((dt.minute() as u16) << 5) | (dt.second() as u16 / 2);
        let date = (((dt.year() - MIN_YEAR) as u16) << 9)
            | ((u8::from(dt.month()) as u16) << 5)
            | dt.day() as u16;

        Self { time, date }
    }

    /// The current wall-clock time in the local zone, or UTC when the local
    /// offset cannot be determined.
    pub fn now() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::from_datetime(PrimitiveDateTime::new(now.date(), now.time()))
    }

    pub fn year(&self) -> u16 {
        ((self.date >> 9) & 0x7F) + MIN_YEAR as u16
    }

    pub fn month(&self) -> u8 {
        ((self.date >> 5) & 0x0F) as u8
    }

    pub fn day(&self) -> u8 {
        (self.date & 0x1F) as u8
    }

    pub fn hour(&self) -> u8 {
        ((self.time >> 11) & 0x1F) as u8
    }

    pub fn minute(&self) -> u8 {
        ((self.time >> 5) & 0x3F) as u8
    }

    /// Seconds, always even.
    pub fn second(&self) -> u8 {
        ((self.time & 0x1F) * 2) as u8
    }
}

impl Default for DosDateTime {
    fn default() -> Self {
        Self::MIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month};

    fn at(year: i32, month: Month, day: u8, h: u8, m: u8, s: u8) -> PrimitiveDateTime {
        Date::from_calendar_date(year, month, day)
            .unwrap()
            .with_hms(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_encode() {
        let dos = DosDateTime::from_datetime(at(2024, Month::March, 15, 13, 45, 31));
        assert_eq!(dos.time, (13 << 11) | (45 << 5) | 15);
        assert_eq!(dos.date, (44 << 9) | (3 << 5) | 15);
    }

    #[test]
    fn test_decode_drops_odd_second() {
        let dos = DosDateTime::from_datetime(at(2001, Month::December, 31, 23, 59, 59));
        assert_eq!((dos.year(), dos.month(), dos.day()), (2001, 12, 31));
        assert_eq!((dos.hour(), dos.minute(), dos.second()), (23, 59, 58));
    }

    #[test]
    fn test_epoch() {
        let dos = DosDateTime::from_datetime(at(1980, Month::January, 1, 0, 0, 0));
        assert_eq!(dos, DosDateTime::MIN);
        assert_eq!(dos.date, 0x0021);
        assert_eq!(dos.time, 0);
    }

    #[test]
    fn test_clamps_out_of_range() {
        let early = DosDateTime::from_datetime(at(1970, Month::June, 1, 12, 0, 0));
        assert_eq!(early, DosDateTime::MIN);

        let late = DosDateTime::from_datetime(at(2200, Month::June, 1, 12, 0, 0));
        assert_eq!(late, DosDateTime::MAX);
        assert_eq!((late.year(), late.month(), late.day()), (2107, 12, 31));
        assert_eq!((late.hour(), late.minute(), late.second()), (23, 59, 58));
    }

    #[test]
    fn test_now_is_in_range() {
        let now = DosDateTime::now();
        assert!(now.year() >= 2020);
        assert!((1..=12).contains(&now.month()));
        assert!((1..=31).contains(&now.day()));
    }
}
