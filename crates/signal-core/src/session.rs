use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::SessionState;

const OPEN_MINUTE: u32 = 9 * 60 + 15;
const CLOSE_MINUTE: u32 = 15 * 60 + 30;
/// BTST entries only make sense in the last two trading hours.
const CLOSING_WINDOW_MINUTE: u32 = 13 * 60 + 30;

/// Exchange session calendar: fixed 09:15-15:30 window, Mon-Fri, in a
/// named timezone (NSE / Asia::Kolkata by default). Pure function of time.
#[derive(Debug, Clone)]
pub struct SessionClock {
    tz: Tz,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            tz: chrono_tz::Asia::Kolkata,
        }
    }

    pub fn with_timezone(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn state(&self) -> SessionState {
        self.state_at(Utc::now())
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        let local = now.with_timezone(&self.tz);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return SessionState::Weekend;
        }
        let minute = local.hour() * 60 + local.minute();
        if minute < OPEN_MINUTE {
            SessionState::PreMarket
        } else if minute <= CLOSE_MINUTE {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// True inside the last two trading hours of an open session.
    pub fn in_closing_window(&self) -> bool {
        self.in_closing_window_at(Utc::now())
    }

    pub fn in_closing_window_at(&self, now: DateTime<Utc>) -> bool {
        if self.state_at(now) != SessionState::Open {
            return false;
        }
        let local = now.with_timezone(&self.tz);
        local.hour() * 60 + local.minute() >= CLOSING_WINDOW_MINUTE
    }

    /// Local wall-clock hour, used by the probability timing factor.
    pub fn local_hour(&self) -> u32 {
        self.local_hour_at(Utc::now())
    }

    pub fn local_hour_at(&self, now: DateTime<Utc>) -> u32 {
        now.with_timezone(&self.tz).hour()
    }

    /// Today's date in the exchange timezone.
    pub fn local_date(&self) -> NaiveDate {
        self.local_date_at(Utc::now())
    }

    pub fn local_date_at(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Weekly option expiry: the next Thursday strictly after `from`. A Thursday
/// rolls forward to the following Thursday.
pub fn next_expiry_thursday(from: NaiveDate) -> NaiveDate {
    let mut days_ahead = 3 - from.weekday().num_days_from_monday() as i64;
    if days_ahead <= 0 {
        days_ahead += 7;
    }
    from + Duration::days(days_ahead)
}
