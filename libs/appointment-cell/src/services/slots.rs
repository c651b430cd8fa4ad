use chrono::{Days, NaiveDate};

use hospital_cell::models::SlotState;

/// Outcome of booking one appointment against a hospital's daily counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAllocation {
    pub appointment_date: NaiveDate,
    pub next: SlotState,
}

/// Book the next free slot.
///
/// The appointment lands on `free_slot_date`, or on `today` if that date has
/// already passed (in which case the counter restarts). When the booking fills
/// the day, `free_slot_date` moves to the following day and the counter
/// resets, so `booked_count` always stays below `daily_capacity`.
///
/// Returns `None` for a hospital with no capacity.
pub fn allocate_slot(current: SlotState, daily_capacity: u32, today: NaiveDate) -> Option<SlotAllocation> {
    if daily_capacity == 0 {
        return None;
    }

    let (date, counter) = if current.free_slot_date < today {
        (today, 0)
    } else {
        (current.free_slot_date, current.booked_count)
    };

    let booked = counter.saturating_add(1);

    let next = if booked >= daily_capacity {
        SlotState {
            booked_count: 0,
            free_slot_date: date.checked_add_days(Days::new(1))?,
        }
    } else {
        SlotState {
            booked_count: booked,
            free_slot_date: date,
        }
    };

    Some(SlotAllocation {
        appointment_date: date,
        next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn state(booked_count: u32, free_slot_date: NaiveDate) -> SlotState {
        SlotState { booked_count, free_slot_date }
    }

    #[test]
    fn increments_below_capacity() {
        let alloc = allocate_slot(state(2, day(10)), 5, day(10)).unwrap();
        assert_eq!(alloc.appointment_date, day(10));
        assert_eq!(alloc.next, state(3, day(10)));
    }

    #[test]
    fn advances_date_when_day_fills() {
        let alloc = allocate_slot(state(4, day(10)), 5, day(10)).unwrap();
        assert_eq!(alloc.appointment_date, day(10));
        assert_eq!(alloc.next, state(0, day(11)));
    }

    #[test]
    fn future_free_date_is_kept() {
        let alloc = allocate_slot(state(1, day(15)), 5, day(10)).unwrap();
        assert_eq!(alloc.appointment_date, day(15));
        assert_eq!(alloc.next, state(2, day(15)));
    }

    #[test]
    fn stale_free_date_is_lifted_to_today() {
        let alloc = allocate_slot(state(3, day(2)), 5, day(10)).unwrap();
        assert_eq!(alloc.appointment_date, day(10));
        assert_eq!(alloc.next, state(1, day(10)));
    }

    #[test]
    fn capacity_of_one_advances_every_booking() {
        let mut current = state(0, day(10));
        for expected in 10..14 {
            let alloc = allocate_slot(current, 1, day(10)).unwrap();
            assert_eq!(alloc.appointment_date, day(expected));
            assert_eq!(alloc.next.booked_count, 0);
            current = alloc.next;
        }
    }

    #[test]
    fn counter_never_reaches_capacity() {
        let capacity = 3;
        let mut current = state(0, day(1));
        for _ in 0..20 {
            let alloc = allocate_slot(current, capacity, day(1)).unwrap();
            assert!(alloc.next.booked_count < capacity);
            assert!(alloc.next.free_slot_date >= current.free_slot_date);
            current = alloc.next;
        }
        assert_eq!(current.free_slot_date, day(7));
    }

    #[test]
    fn zero_capacity_has_no_slot() {
        assert!(allocate_slot(state(0, day(1)), 0, day(1)).is_none());
    }
}
