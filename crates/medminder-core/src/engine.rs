//! Schedule expansion: recurrence rules to concrete dose timestamps.
//!
//! [`expand`] is the pure core. [`ScheduleEngine`] layers storage-backed
//! queries on top of it: next dose, a single day's plan, and overdue doses.

use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::error::{Result, ValidationError};
use crate::model::{now_local, Medication, Schedule};
use crate::storage::Database;

/// Expand a schedule into every concrete dose timestamp it describes.
///
/// The schedule is validated first; a malformed schedule never yields a
/// timestamp. Open-ended schedules (`end_date = None`) expand to nothing,
/// since an unbounded recurrence has no finite timeline. Otherwise the result
/// is the full grid: one timestamp per (day in `start..=end`, time of day),
/// sorted ascending. The weekday restriction is deliberately not applied
/// here; it gates reminder firing, not the timeline.
pub fn expand(schedule: &Schedule) -> Result<Vec<NaiveDateTime>, ValidationError> {
    schedule.validate()?;

    let Some(end) = schedule.end_date else {
        return Ok(Vec::new());
    };

    let mut times = schedule.times.clone();
    times.sort();

    let mut out = Vec::new();
    let mut day = schedule.start_date;
    while day <= end {
        for &t in &times {
            out.push(day.and_time(t));
        }
        // validate() guarantees start <= end, so this cannot wrap.
        day = day + Days::new(1);
    }
    Ok(out)
}

fn within_window(schedule: &Schedule, date: NaiveDate) -> bool {
    date >= schedule.start_date && schedule.end_date.map_or(true, |end| date <= end)
}

/// Earliest dose of `schedule` strictly after `now`, if any.
///
/// Works for open-ended schedules too: it walks the calendar instead of
/// materializing the timeline.
fn next_dose_for_schedule(schedule: &Schedule, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let mut times = schedule.times.clone();
    times.sort();
    let first = *times.first()?;

    let day = schedule.start_date.max(now.date());
    if !within_window(schedule, day) {
        return None;
    }
    if day > now.date() {
        return Some(day.and_time(first));
    }

    for &t in &times {
        let candidate = day.and_time(t);
        if candidate > now {
            return Some(candidate);
        }
    }

    let tomorrow = day + Days::new(1);
    within_window(schedule, tomorrow).then(|| tomorrow.and_time(first))
}

/// Storage-backed scheduling queries.
pub struct ScheduleEngine<'a> {
    db: &'a Database,
}

impl<'a> ScheduleEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Earliest strictly-future dose across the medication's active
    /// schedules, or `None` when nothing lies ahead.
    pub fn next_dose(&self, medication_id: &str) -> Result<Option<NaiveDateTime>> {
        self.next_dose_at(medication_id, now_local())
    }

    pub fn next_dose_at(
        &self,
        medication_id: &str,
        now: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>> {
        let schedules = self.db.schedules_for_medication(medication_id)?;
        Ok(schedules
            .iter()
            .filter(|s| s.is_active)
            .filter_map(|s| next_dose_for_schedule(s, now))
            .min())
    }

    /// All doses planned for one calendar day, paired with the owning
    /// medication, sorted by time. Inactive medications and schedules are
    /// excluded; open-ended schedules count for every day past their start.
    pub fn doses_on(&self, date: NaiveDate) -> Result<Vec<(Medication, NaiveDateTime)>> {
        let mut out = Vec::new();
        for med in self.db.list_medications()? {
            if !med.is_active {
                continue;
            }
            for schedule in self.db.schedules_for_medication(&med.id)? {
                if !schedule.is_active || !within_window(&schedule, date) {
                    continue;
                }
                for &t in &schedule.times {
                    out.push((med.clone(), date.and_time(t)));
                }
            }
        }
        out.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.name.cmp(&b.0.name)));
        Ok(out)
    }

    /// Doses of one medication that are strictly in the past and have no
    /// matching intake log. Matching is exact equality on `scheduled_time`.
    pub fn overdue_doses(&self, medication_id: &str) -> Result<Vec<NaiveDateTime>> {
        self.overdue_doses_at(medication_id, now_local())
    }

    pub fn overdue_doses_at(
        &self,
        medication_id: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveDateTime>> {
        let logs = self.db.intake_logs_for_medication(medication_id)?;
        let taken: std::collections::HashSet<NaiveDateTime> =
            logs.iter().filter_map(|l| l.scheduled_time).collect();

        let mut out = Vec::new();
        for schedule in self.db.schedules_for_medication(medication_id)? {
            if !schedule.is_active {
                continue;
            }
            // Cap open-ended schedules at today; nothing later can be overdue.
            let mut bounded = schedule.clone();
            let cap = now.date();
            bounded.end_date = Some(match schedule.end_date {
                Some(end) => end.min(cap),
                None => cap,
            });
            if bounded.start_date > bounded.end_date.unwrap_or(cap) {
                continue;
            }
            for ts in expand(&bounded)? {
                if ts < now && !taken.contains(&ts) {
                    out.push(ts);
                }
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_hhmm, IntakeLog};
    use chrono::{Duration, NaiveTime};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule(times: &[&str], start: NaiveDate, end: Option<NaiveDate>) -> Schedule {
        let mut s = Schedule::new(
            "med-1",
            times.iter().map(|t| parse_hhmm(t).unwrap()).collect(),
            start,
        );
        s.end_date = end;
        s
    }

    #[test]
    fn expands_full_grid() {
        let s = schedule(
            &["08:00", "20:00"],
            date(2025, 1, 1),
            Some(date(2025, 1, 3)),
        );
        let doses = expand(&s).unwrap();
        assert_eq!(doses.len(), 6);
        assert_eq!(doses[0], date(2025, 1, 1).and_time(parse_hhmm("08:00").unwrap()));
        assert_eq!(doses[1], date(2025, 1, 1).and_time(parse_hhmm("20:00").unwrap()));
        assert_eq!(doses[5], date(2025, 1, 3).and_time(parse_hhmm("20:00").unwrap()));
    }

    #[test]
    fn open_ended_schedule_expands_to_nothing() {
        let s = schedule(&["08:00"], date(2025, 1, 1), None);
        assert!(expand(&s).unwrap().is_empty());
    }

    #[test]
    fn single_day_range_is_one_day() {
        let s = schedule(&["09:30"], date(2025, 1, 1), Some(date(2025, 1, 1)));
        let doses = expand(&s).unwrap();
        assert_eq!(doses, vec![date(2025, 1, 1).and_time(parse_hhmm("09:30").unwrap())]);
    }

    #[test]
    fn malformed_schedule_never_expands() {
        let mut s = schedule(&["08:00"], date(2025, 1, 2), Some(date(2025, 1, 1)));
        assert!(expand(&s).is_err());
        s.end_date = Some(date(2025, 1, 3));
        s.times.clear();
        assert!(expand(&s).is_err());
    }

    #[test]
    fn unsorted_times_still_expand_sorted() {
        let s = schedule(
            &["20:00", "08:00", "12:00"],
            date(2025, 1, 1),
            Some(date(2025, 1, 2)),
        );
        let doses = expand(&s).unwrap();
        assert!(doses.windows(2).all(|w| w[0] < w[1]));
    }

    proptest! {
        #[test]
        fn expansion_is_complete_and_sorted(
            day_count in 0u64..30,
            hours in proptest::collection::hash_set(0u32..24, 1..6),
        ) {
            let start = date(2025, 3, 1);
            let times: Vec<NaiveTime> = hours
                .iter()
                .map(|&h| NaiveTime::from_hms_opt(h, 0, 0).unwrap())
                .collect();
            let mut s = Schedule::new("med-1", times, start);
            s.end_date = Some(start + Days::new(day_count));

            let doses = expand(&s).unwrap();
            prop_assert_eq!(doses.len() as u64, (day_count + 1) * hours.len() as u64);
            prop_assert!(doses.windows(2).all(|w| w[0] < w[1]));
            for offset in 0..=day_count {
                let day = start + Days::new(offset);
                for t in &s.times {
                    prop_assert!(doses.contains(&day.and_time(*t)));
                }
            }
        }
    }

    fn engine_fixture() -> (Database, Medication) {
        let db = Database::open_memory().unwrap();
        let med = Medication::new("Aspirin", "100mg");
        db.create_medication(&med).unwrap();
        (db, med)
    }

    #[test]
    fn next_dose_finds_earliest_future() {
        let (db, med) = engine_fixture();
        let mut s = schedule(&["08:00", "20:00"], date(2025, 1, 1), Some(date(2025, 1, 10)));
        s.medication_id = med.id.clone();
        db.create_schedule(&s).unwrap();

        let engine = ScheduleEngine::new(&db);
        let now = date(2025, 1, 2).and_time(parse_hhmm("09:00").unwrap());
        assert_eq!(
            engine.next_dose_at(&med.id, now).unwrap(),
            Some(date(2025, 1, 2).and_time(parse_hhmm("20:00").unwrap()))
        );

        // After the last dose in the window there is nothing ahead.
        let past_end = date(2025, 1, 10).and_time(parse_hhmm("21:00").unwrap());
        assert_eq!(engine.next_dose_at(&med.id, past_end).unwrap(), None);
    }

    #[test]
    fn next_dose_before_start_is_first_dose() {
        let (db, med) = engine_fixture();
        let mut s = schedule(&["08:00"], date(2025, 6, 1), None);
        s.medication_id = med.id.clone();
        db.create_schedule(&s).unwrap();

        let engine = ScheduleEngine::new(&db);
        let now = date(2025, 5, 20).and_time(parse_hhmm("12:00").unwrap());
        assert_eq!(
            engine.next_dose_at(&med.id, now).unwrap(),
            Some(date(2025, 6, 1).and_time(parse_hhmm("08:00").unwrap()))
        );
    }

    #[test]
    fn next_dose_ignores_inactive_schedules() {
        let (db, med) = engine_fixture();
        let mut s = schedule(&["08:00"], date(2025, 1, 1), None);
        s.medication_id = med.id.clone();
        s.is_active = false;
        db.create_schedule(&s).unwrap();

        let engine = ScheduleEngine::new(&db);
        let now = date(2025, 1, 2).and_time(parse_hhmm("00:00").unwrap());
        assert_eq!(engine.next_dose_at(&med.id, now).unwrap(), None);
    }

    #[test]
    fn doses_on_lists_the_days_plan_sorted() {
        let (db, med) = engine_fixture();
        let other = Medication::new("Ibuprofen", "200mg");
        db.create_medication(&other).unwrap();

        let mut s1 = schedule(&["20:00", "08:00"], date(2025, 1, 1), None);
        s1.medication_id = med.id.clone();
        db.create_schedule(&s1).unwrap();
        let mut s2 = schedule(&["12:00"], date(2025, 1, 1), Some(date(2025, 1, 31)));
        s2.medication_id = other.id.clone();
        db.create_schedule(&s2).unwrap();

        let engine = ScheduleEngine::new(&db);
        let plan = engine.doses_on(date(2025, 1, 15)).unwrap();
        let times: Vec<String> = plan
            .iter()
            .map(|(m, ts)| format!("{} {}", m.name, ts.time().format("%H:%M")))
            .collect();
        assert_eq!(times, vec!["Aspirin 08:00", "Ibuprofen 12:00", "Aspirin 20:00"]);

        // Outside the second schedule's window only the open-ended one shows.
        let plan = engine.doses_on(date(2025, 2, 1)).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn overdue_excludes_taken_and_future() {
        let (db, med) = engine_fixture();
        let mut s = schedule(&["08:00"], date(2025, 1, 1), Some(date(2025, 1, 3)));
        s.medication_id = med.id.clone();
        db.create_schedule(&s).unwrap();

        let taken_at = date(2025, 1, 1).and_time(parse_hhmm("08:00").unwrap());
        let mut log = IntakeLog::new(&med.id, 1.0);
        log.scheduled_time = Some(taken_at);
        log.taken_time = taken_at + Duration::minutes(3);
        db.create_intake_log(&log).unwrap();

        let engine = ScheduleEngine::new(&db);
        let now = date(2025, 1, 2).and_time(parse_hhmm("12:00").unwrap());
        assert_eq!(
            engine.overdue_doses_at(&med.id, now).unwrap(),
            vec![date(2025, 1, 2).and_time(parse_hhmm("08:00").unwrap())]
        );
    }

    #[test]
    fn overdue_caps_open_ended_schedules_at_now() {
        let (db, med) = engine_fixture();
        let mut s = schedule(&["08:00"], date(2025, 1, 1), None);
        s.medication_id = med.id.clone();
        db.create_schedule(&s).unwrap();

        let engine = ScheduleEngine::new(&db);
        let now = date(2025, 1, 3).and_time(parse_hhmm("09:00").unwrap());
        let overdue = engine.overdue_doses_at(&med.id, now).unwrap();
        assert_eq!(overdue.len(), 3);
        assert!(overdue.iter().all(|ts| *ts < now));
    }
}
