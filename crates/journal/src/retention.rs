//! Retention policies
//!
//! A [`BackupPolicy`] is an ordered list of rules. Each rule looks back
//! `max_age` from "now" and either keeps everything in that window (`*`) or
//! keeps at most `count` snapshots per `period` (`count/period`). Rules are
//! applied in order and a snapshot kept by an earlier rule is no longer a
//! candidate for later ones, but still counts toward their per-period quota.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};
use vault_core::Snapshot;

/// Largest value accepted for a single span component
const MAX_COMPONENT: u32 = 100_000;

/// Errors from parsing policy values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("invalid span {0:?}: expected e.g. 2W, 1M, 1Y6M")]
    InvalidSpan(String),

    #[error("invalid keep value {0:?}: expected '*' or <count>/<period>")]
    InvalidKeep(String),

    #[error("keep period in {0:?} must be longer than zero")]
    ZeroPeriod(String),
}

/// Calendar span made of years, months, weeks and days (`1Y6M`, `2W`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
}

impl Span {
    pub fn days(days: u32) -> Self {
        Self { days, ..Self::default() }
    }

    pub fn weeks(weeks: u32) -> Self {
        Self { weeks, ..Self::default() }
    }

    pub fn months(months: u32) -> Self {
        Self { months, ..Self::default() }
    }

    pub fn years(years: u32) -> Self {
        Self { years, ..Self::default() }
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.weeks == 0 && self.days == 0
    }

    fn month_count(&self) -> i64 {
        i64::from(self.years) * 12 + i64::from(self.months)
    }

    fn day_count(&self) -> i64 {
        i64::from(self.weeks) * 7 + i64::from(self.days)
    }

    /// `ts` moved back by this span, `None` when out of range
    pub fn before(&self, ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
        shift(ts, -self.month_count(), -self.day_count())
    }

    /// `ts` moved forward by this span, `None` when out of range
    pub fn after(&self, ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
        shift(ts, self.month_count(), self.day_count())
    }
}

/// Move `ts` by whole months and days without clamping the day of month
///
/// A day past the end of the target month rolls over into the next one, so
/// 2024-03-31 minus one month is 2024-03-02 and 2023-01-31 plus one month is
/// 2023-03-03, matching the boundaries of histories already pruned.
fn shift(ts: DateTime<Utc>, months: i64, days: i64) -> Option<DateTime<Utc>> {
    let total = i64::from(ts.year()) * 12 + i64::from(ts.month0()) + months;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = Duration::try_days(i64::from(ts.day0()) + days)?;
    let date = first.checked_add_signed(offset)?;
    Some(date.and_time(ts.time()).and_utc())
}

impl FromStr for Span {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PolicyError::InvalidSpan(s.to_string());
        let mut span = Span::default();
        let mut digits = String::new();
        let mut seen_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            let value: u32 = digits.parse().map_err(|_| invalid())?;
            let slot = match c {
                'Y' => &mut span.years,
                'M' => &mut span.months,
                'W' => &mut span.weeks,
                'D' => &mut span.days,
                _ => return Err(invalid()),
            };
            *slot = slot.checked_add(value).ok_or_else(invalid)?;
            if *slot > MAX_COMPONENT {
                return Err(invalid());
            }
            digits.clear();
            seen_unit = true;
        }

        if !digits.is_empty() || !seen_unit {
            return Err(invalid());
        }
        Ok(span)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0D");
        }
        for (value, unit) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value > 0 {
                write!(f, "{value}{unit}")?;
            }
        }
        Ok(())
    }
}

/// How many snapshots a rule keeps inside its window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepSpec {
    /// Every snapshot in the window
    All,
    /// At most `count` per consecutive `period`
    Limited { count: usize, period: Span },
}

impl KeepSpec {
    /// Parse a keep value, treating anything unparseable as [`KeepSpec::All`]
    ///
    /// Logs a warning on fallback so a typo never deletes more than intended.
    pub fn lenient(value: &str) -> Self {
        match value.parse() {
            Ok(spec) => spec,
            Err(e) => {
                warn!(keep = value, error = %e, "Invalid keep value in backup rule, keeping all snapshots");
                KeepSpec::All
            }
        }
    }
}

impl FromStr for KeepSpec {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(KeepSpec::All);
        }
        let (count, period) = s
            .split_once('/')
            .ok_or_else(|| PolicyError::InvalidKeep(s.to_string()))?;
        if count.is_empty() || !count.chars().all(|c| c.is_ascii_digit()) {
            return Err(PolicyError::InvalidKeep(s.to_string()));
        }
        let count: usize = count
            .parse()
            .map_err(|_| PolicyError::InvalidKeep(s.to_string()))?;
        let period: Span = period
            .parse()
            .map_err(|_| PolicyError::InvalidKeep(s.to_string()))?;
        if period.is_zero() {
            return Err(PolicyError::ZeroPeriod(s.to_string()));
        }
        Ok(KeepSpec::Limited { count, period })
    }
}

impl fmt::Display for KeepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeepSpec::All => f.write_str("*"),
            KeepSpec::Limited { count, period } => write!(f, "{count}/{period}"),
        }
    }
}

/// One `(max_age, keep)` rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRule {
    /// How far back from now the rule reaches
    pub max_age: Span,
    /// `*` or `<count>/<period>`; parsed when the rule is applied
    pub keep: String,
}

impl BackupRule {
    pub fn new(max_age: Span, keep: impl Into<String>) -> Self {
        Self {
            max_age,
            keep: keep.into(),
        }
    }
}

/// Snapshots split into those the policy retains and those it drops
#[derive(Debug, Clone)]
pub struct RetentionPlan<'a> {
    /// Retained snapshots, in input order
    pub keep: Vec<&'a Snapshot>,
    /// Snapshots to delete, in input order
    pub remove: Vec<&'a Snapshot>,
}

/// Ordered list of retention rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPolicy {
    rules: Vec<BackupRule>,
}

impl BackupPolicy {
    pub fn new(rules: Vec<BackupRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[BackupRule] {
        &self.rules
    }

    /// Partition `snapshots` into kept and removed as of `now`
    pub fn plan<'a>(&self, snapshots: &'a [Snapshot], now: DateTime<Utc>) -> RetentionPlan<'a> {
        let retained = self.retained(snapshots, now);
        let mut plan = RetentionPlan {
            keep: Vec::new(),
            remove: Vec::new(),
        };
        for (snapshot, keep) in snapshots.iter().zip(retained) {
            if keep {
                plan.keep.push(snapshot);
            } else {
                plan.remove.push(snapshot);
            }
        }
        plan
    }

    /// One flag per input snapshot, `true` when retained
    pub fn retained(&self, snapshots: &[Snapshot], now: DateTime<Utc>) -> Vec<bool> {
        let mut kept = vec![false; snapshots.len()];
        if snapshots.is_empty() {
            return kept;
        }

        // Oldest first; equal timestamps keep their listing order
        let mut order: Vec<usize> = (0..snapshots.len()).collect();
        order.sort_by_key(|&i| (snapshots[i].timestamp(), i));
        let times: Vec<DateTime<Utc>> = order.iter().map(|&i| snapshots[i].timestamp()).collect();

        for (index, rule) in self.rules.iter().enumerate() {
            let end = rule.max_age.before(now).unwrap_or(DateTime::<Utc>::MIN_UTC);
            let before = kept.iter().filter(|k| **k).count();

            match KeepSpec::lenient(&rule.keep) {
                KeepSpec::All => {
                    let first = times.partition_point(|t| *t < end);
                    for &i in &order[first..] {
                        kept[i] = true;
                    }
                }
                KeepSpec::Limited { count, period } => {
                    keep_per_period(&order, &times, &mut kept, end, now, count, period);
                }
            }

            debug!(
                rule = index,
                max_age = %rule.max_age,
                keep = %rule.keep,
                window_start = %end,
                added = kept.iter().filter(|k| **k).count() - before,
                "Applied backup rule"
            );
        }

        kept
    }
}

impl Default for BackupPolicy {
    /// Everything for two weeks, one per week for two months, two per month
    /// for a year, nothing older
    fn default() -> Self {
        Self::new(vec![
            BackupRule::new(Span::weeks(2), "*"),
            BackupRule::new(Span::months(2), "1/1W"),
            BackupRule::new(Span::years(1), "2/1M"),
        ])
    }
}

/// Walk `[end, now)` in steps of `period`, topping each sub-period up to
/// `count` kept snapshots
fn keep_per_period(
    order: &[usize],
    times: &[DateTime<Utc>],
    kept: &mut [bool],
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    count: usize,
    period: Span,
) {
    let mut start = end;
    while start < now {
        let lo = times.partition_point(|t| *t < start);
        if lo == times.len() || times[lo] >= now {
            break;
        }

        let next = period.after(start).unwrap_or(now);
        let stop = next.min(now);
        let hi = times.partition_point(|t| *t < stop);
        let bucket = &order[lo..hi];

        let already = bucket.iter().filter(|&&i| kept[i]).count();
        if already < count {
            let matches: Vec<usize> = bucket.iter().copied().filter(|&i| !kept[i]).collect();
            for i in pick_by_position(&matches, count - already) {
                kept[i] = true;
            }
        }

        if next <= start {
            break;
        }
        start = next;
    }
}

/// Up to `need` of `matches` (oldest first), spread by position: split into
/// chunks of `ceil(len / need)` and take the first of each chunk
fn pick_by_position(matches: &[usize], need: usize) -> Vec<usize> {
    if matches.len() <= need {
        return matches.to_vec();
    }
    let chunk = matches.len().div_ceil(need);
    matches.chunks(chunk).map(|c| c[0]).collect()
}
