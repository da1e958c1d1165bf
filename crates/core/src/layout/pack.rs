use std::collections::HashMap;

use tracing::trace;

use crate::model::{LayoutConfig, TimelineItem, ViewContext};

use super::effective::effective_range;
use super::overlap::YearRange;

/// Row assignment produced by a packing pass: item id to packed row.
pub type RowAssignment = HashMap<String, u32>;

/// Intervals already placed in each row of a lane.
#[derive(Debug, Default, Clone)]
pub(crate) struct RowOccupancy {
    rows: Vec<Vec<YearRange>>,
}

impl RowOccupancy {
    pub(crate) fn fits(&self, row: usize, range: &YearRange) -> bool {
        self.rows
            .get(row)
            .is_none_or(|placed| placed.iter().all(|p| !p.overlaps(range)))
    }

    /// Lowest row at or above `floor` where `range` overlaps nothing.
    /// Rows past the current top are always free.
    pub(crate) fn first_fit(&self, range: &YearRange, floor: usize) -> usize {
        (floor..self.rows.len())
            .find(|&row| self.fits(row, range))
            .unwrap_or_else(|| self.rows.len().max(floor))
    }

    pub(crate) fn place(&mut self, row: usize, range: YearRange) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        self.rows[row].push(range);
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Greedy first-fit packing of one lane's items into rows.
///
/// Hidden items are ignored. The rest are visited in ascending start year
/// (stable, so equal starts keep input order); manually placed items are
/// skipped and keep whatever row they have. Every other item goes to the
/// lowest row whose placed items it does not overlap, label padding
/// included, opening a new row when none fits.
///
/// This is first-fit interval coloring, not a minimum row count: it keeps
/// rows stable across re-renders as long as input order is stable.
///
/// The input is not modified; use [`apply_rows`] to write the result back.
pub fn pack(items: &[TimelineItem], view: &ViewContext, config: &LayoutConfig) -> RowAssignment {
    let mut order: Vec<&TimelineItem> = items.iter().filter(|i| !i.hidden).collect();
    order.sort_by_key(|i| i.kind.start());

    let mut occupancy = RowOccupancy::default();
    let mut assignment = RowAssignment::with_capacity(order.len());

    for item in order {
        if item.manually_placed {
            continue;
        }
        let range = effective_range(item, view, config);
        let row = occupancy.first_fit(&range, 0);
        occupancy.place(row, range);
        assignment.insert(item.id.clone(), row as u32);
    }

    trace!(
        items = items.len(),
        packed = assignment.len(),
        rows = occupancy.len(),
        "packed lane"
    );
    assignment
}

/// Write a packing result back onto the items it covers.
pub fn apply_rows(items: &mut [TimelineItem], assignment: &RowAssignment) {
    for item in items {
        if let Some(&row) = assignment.get(&item.id) {
            item.row = Some(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewContext {
        ViewContext::unscaled(2024)
    }

    fn packed(items: &[TimelineItem]) -> RowAssignment {
        pack(items, &view(), &LayoutConfig::default())
    }

    #[test]
    fn overlapping_people_take_separate_rows() {
        let items = vec![
            TimelineItem::person("a", 1800, Some(1850)),
            TimelineItem::person("b", 1820, Some(1860)),
        ];
        let rows = packed(&items);
        assert_eq!(rows["a"], 0);
        assert_eq!(rows["b"], 1);
    }

    #[test]
    fn disjoint_people_share_a_row() {
        let items = vec![
            TimelineItem::person("a", 1800, Some(1850)),
            TimelineItem::person("c", 1860, Some(1900)),
        ];
        let rows = packed(&items);
        assert_eq!(rows["a"], 0);
        assert_eq!(rows["c"], 0);
    }

    #[test]
    fn sorted_by_start_not_input_order() {
        let items = vec![
            TimelineItem::person("late", 1820, Some(1860)),
            TimelineItem::person("early", 1800, Some(1850)),
        ];
        let rows = packed(&items);
        assert_eq!(rows["early"], 0);
        assert_eq!(rows["late"], 1);
    }

    #[test]
    fn equal_starts_keep_input_order() {
        let items = vec![
            TimelineItem::event("x", 1900, Some(1910)),
            TimelineItem::event("y", 1900, Some(1905)),
            TimelineItem::event("z", 1900, None),
        ];
        let rows = packed(&items);
        assert_eq!((rows["x"], rows["y"], rows["z"]), (0, 1, 2));
    }

    #[test]
    fn reuses_lowest_free_row() {
        let items = vec![
            TimelineItem::person("a", 1800, Some(1850)),
            TimelineItem::person("b", 1810, Some(1830)),
            TimelineItem::person("c", 1840, Some(1870)),
        ];
        let rows = packed(&items);
        // c overlaps a (row 0) but not b (row 1).
        assert_eq!(rows["c"], 1);
    }

    #[test]
    fn manual_and_hidden_items_are_skipped() {
        let items = vec![
            TimelineItem::person("manual", 1800, Some(1850)).placed_at(4),
            TimelineItem::person("hidden", 1800, Some(1850)).hidden(),
            TimelineItem::person("auto", 1800, Some(1850)),
        ];
        let rows = packed(&items);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows["auto"], 0);
    }

    #[test]
    fn living_person_overlaps_later_items() {
        let items = vec![
            TimelineItem::person("alive", 1950, None),
            TimelineItem::event("recent", 2020, None),
        ];
        let rows = packed(&items);
        assert_eq!(rows["recent"], 1);
    }

    #[test]
    fn inverted_interval_is_packed_as_given() {
        let items = vec![
            TimelineItem::person("a", 1800, Some(1850)),
            TimelineItem::person("bad", 1850, Some(1800)),
            TimelineItem::person("late", 1900, Some(1860)),
        ];
        let rows = packed(&items);
        // bad is treated as 1850..1800 and still touches a's last year.
        assert_eq!(rows["a"], 0);
        assert_eq!(rows["bad"], 1);
        // late ends before it starts, so it clears a.
        assert_eq!(rows["late"], 0);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(packed(&[]).is_empty());
    }

    #[test]
    fn apply_rows_writes_back_packed_items_only() {
        let mut items = vec![
            TimelineItem::person("manual", 1800, Some(1850)).placed_at(4),
            TimelineItem::person("auto", 1800, Some(1850)),
        ];
        let rows = packed(&items);
        apply_rows(&mut items, &rows);
        assert_eq!(items[0].row, Some(4));
        assert_eq!(items[1].row, Some(0));
    }

    #[test]
    fn first_fit_respects_floor() {
        let mut occupancy = RowOccupancy::default();
        occupancy.place(0, YearRange::new(0.0, 10.0));
        let free = YearRange::new(20.0, 30.0);
        assert_eq!(occupancy.first_fit(&free, 0), 0);
        assert_eq!(occupancy.first_fit(&free, 3), 3);
    }
}
