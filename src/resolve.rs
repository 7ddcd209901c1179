extern crate chrono;

use crate::arrivals::ArrivalRecord;
use crate::result;
use crate::result::BusLightError;

/// Earliest of the scheduled and estimated times, whichever are present.
pub fn resolve_soonest(record: &ArrivalRecord) -> result::BusLightResult<i64> {
    match (record.scheduled, record.estimated) {
        (Some(scheduled), Some(estimated)) => return Ok(std::cmp::min(scheduled, estimated)),
        (Some(scheduled), None) => return Ok(scheduled),
        (None, Some(estimated)) => return Ok(estimated),
        (None, None) => return Err(BusLightError::NoTimeAvailable),
    }
}

/// Millis from `now` until `soonest`. An arrival already in the past is stale
/// data, not a bus arriving right now.
pub fn remaining_until(soonest: i64, now: &chrono::DateTime<chrono::Utc>) -> result::BusLightResult<i64> {
    let remaining = soonest.checked_sub(now.timestamp_millis()).ok_or_else(|| {
        BusLightError::MalformedResponse(format!("arrival time {} is out of range", soonest))
    })?;
    if remaining < 0 {
        return Err(BusLightError::StaleArrival { remaining_millis: remaining });
    }
    return Ok(remaining);
}

#[cfg(test)]
mod tests {
    extern crate chrono;

    use super::{remaining_until, resolve_soonest};
    use crate::arrivals::ArrivalRecord;
    use crate::result::BusLightError;

    fn record(scheduled: Option<i64>, estimated: Option<i64>) -> ArrivalRecord {
        return ArrivalRecord {
            scheduled: scheduled,
            estimated: estimated,
            ..ArrivalRecord::default()
        };
    }

    #[test]
    fn single_time() {
        assert_eq!(1000, resolve_soonest(&record(Some(1000), None)).unwrap());
        assert_eq!(2000, resolve_soonest(&record(None, Some(2000))).unwrap());
    }

    #[test]
    fn both_times_takes_earlier() {
        assert_eq!(1000, resolve_soonest(&record(Some(1000), Some(2000))).unwrap());
        assert_eq!(900, resolve_soonest(&record(Some(1000), Some(900))).unwrap());
        assert_eq!(1000, resolve_soonest(&record(Some(1000), Some(1000))).unwrap());
    }

    #[test]
    fn no_time_is_an_error() {
        match resolve_soonest(&record(None, None)) {
            Err(BusLightError::NoTimeAvailable) => {},
            other => panic!("expected NoTimeAvailable, got {:?}", other),
        }
    }

    #[test]
    fn remaining_time() {
        use chrono::TimeZone;
        let now = chrono::Utc.timestamp_millis_opt(1700000000000).unwrap();

        assert_eq!(0, remaining_until(1700000000000, &now).unwrap());
        assert_eq!(480000, remaining_until(1700000480000, &now).unwrap());

        match remaining_until(1699999995000, &now) {
            Err(BusLightError::StaleArrival { remaining_millis }) => assert_eq!(-5000, remaining_millis),
            other => panic!("expected StaleArrival, got {:?}", other),
        }
    }

    #[test]
    fn extreme_times_do_not_overflow() {
        use chrono::TimeZone;
        let now = chrono::Utc.timestamp_millis_opt(1700000000000).unwrap();

        match remaining_until(i64::min_value(), &now) {
            Err(BusLightError::MalformedResponse(msg)) => assert!(msg.contains("out of range")),
            other => panic!("expected MalformedResponse, got {:?}", other),
        }
        assert_eq!(i64::max_value() - 1700000000000, remaining_until(i64::max_value(), &now).unwrap());
    }
}
