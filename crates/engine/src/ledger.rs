//! Balance arithmetic shared by the entry list and the reports.

use serde::Serialize;

use crate::{CashEntry, EngineError, EntryKind, MoneyCents, ResultEngine};

/// Entries per page of the entry list.
pub const PAGE_SIZE: u64 = 10;

/// Cash in, cash out and their difference over a set of entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub cash_in: MoneyCents,
    pub cash_out: MoneyCents,
    pub net: MoneyCents,
}

fn out_of_range() -> EngineError {
    EngineError::Validation("balance out of range".to_string())
}

impl Totals {
    pub fn new(cash_in: MoneyCents, cash_out: MoneyCents) -> ResultEngine<Self> {
        Ok(Self {
            cash_in,
            cash_out,
            net: cash_in.checked_sub(cash_out).ok_or_else(out_of_range)?,
        })
    }

    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a CashEntry>,
    ) -> ResultEngine<Self> {
        let mut cash_in = MoneyCents::ZERO;
        let mut cash_out = MoneyCents::ZERO;
        for entry in entries {
            let total = match entry.kind {
                EntryKind::In => &mut cash_in,
                EntryKind::Out => &mut cash_out,
            };
            *total = total.checked_add(entry.amount).ok_or_else(out_of_range)?;
        }
        Self::new(cash_in, cash_out)
    }
}

/// Running balance after each entry, seeded at zero, in the given order.
pub fn running_balances<'a>(
    entries: impl IntoIterator<Item = &'a CashEntry>,
) -> ResultEngine<Vec<MoneyCents>> {
    let mut balance = MoneyCents::ZERO;
    entries
        .into_iter()
        .map(|entry| {
            balance = balance
                .checked_add(entry.signed_amount())
                .ok_or_else(out_of_range)?;
            Ok(balance)
        })
        .collect()
}

/// Number of pages for `total` rows; an empty set still has one page.
pub fn page_count(total: u64) -> u64 {
    total.div_ceil(PAGE_SIZE).max(1)
}

/// Missing or zero pages map to the first page, pages past the end to the
/// last one.
pub fn clamp_page(requested: Option<u64>, total_pages: u64) -> u64 {
    requested.unwrap_or(1).clamp(1, total_pages.max(1))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    use super::*;

    fn entry(kind: EntryKind, cents: i64) -> CashEntry {
        CashEntry::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::MIN,
            kind,
            MoneyCents::new(cents),
            None,
            String::new(),
        )
        .unwrap()
    }

    #[test]
    fn running_balance_in_given_order() {
        let entries = [
            entry(EntryKind::In, 100),
            entry(EntryKind::Out, 30),
            entry(EntryKind::In, 20),
        ];
        let balances = running_balances(&entries).unwrap();
        assert_eq!(
            balances,
            vec![MoneyCents::new(100), MoneyCents::new(70), MoneyCents::new(90)]
        );
    }

    #[test]
    fn totals_net_is_in_minus_out() {
        let entries = [entry(EntryKind::In, 500), entry(EntryKind::Out, 200)];
        let totals = Totals::from_entries(&entries).unwrap();
        assert_eq!(totals.cash_in, MoneyCents::new(500));
        assert_eq!(totals.cash_out, MoneyCents::new(200));
        assert_eq!(totals.net, MoneyCents::new(300));

        let empty = Totals::from_entries(&Vec::<CashEntry>::new()).unwrap();
        assert_eq!(empty, Totals::default());
    }

    #[test]
    fn overflowing_balances_are_errors() {
        // Stored rows bypass the per-entry cap, so the sums stay checked.
        let mut big = entry(EntryKind::In, 0);
        big.amount = MoneyCents::new(i64::MAX);
        let entries = [big.clone(), big];

        assert!(matches!(
            Totals::from_entries(&entries),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            running_balances(&entries),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn paging() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
        assert_eq!(clamp_page(None, 2), 1);
        assert_eq!(clamp_page(Some(0), 2), 1);
        assert_eq!(clamp_page(Some(7), 2), 2);
    }
}
