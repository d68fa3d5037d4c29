//! Row partitioning.
//!
//! A [`PartitionPlan`] assigns contiguous row ranges to participants. The
//! first `M mod P` participants receive one extra row, so counts never differ
//! by more than one and offsets follow worker-index order.
//!
//! Element layouts for the transport are derived from the plan by scaling with
//! a row width. A's rows are K wide and C's rows are N wide, so the two layouts
//! are distinct types ([`ElementLayout<ARows>`] and [`ElementLayout<CRows>`]).

use crate::error::{MatmulError, Result};
use std::marker::PhantomData;

/// One participant's share of the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub rows: usize,
    pub offset: usize,
}

impl RowSpan {
    pub fn end(&self) -> usize {
        self.offset + self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Row assignment for every participant, in rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    total_rows: usize,
    spans: Vec<RowSpan>,
}

/// Compute the row partition of `total_rows` across `participants`.
pub fn plan(total_rows: usize, participants: usize) -> Result<PartitionPlan> {
    if participants == 0 {
        return Err(MatmulError::Config(
            "participant count must be at least 1".to_string(),
        ));
    }

    let base = total_rows / participants;
    let remainder = total_rows % participants;

    let mut spans = Vec::with_capacity(participants);
    let mut offset = 0;
    for rank in 0..participants {
        let rows = if rank < remainder { base + 1 } else { base };
        spans.push(RowSpan { rows, offset });
        offset += rows;
    }

    Ok(PartitionPlan { total_rows, spans })
}

impl PartitionPlan {
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn participants(&self) -> usize {
        self.spans.len()
    }

    pub fn spans(&self) -> &[RowSpan] {
        &self.spans
    }

    /// Span owned by `rank`
    pub fn span(&self, rank: usize) -> Result<RowSpan> {
        self.spans.get(rank).copied().ok_or_else(|| {
            MatmulError::Config(format!(
                "rank {} outside a plan of {} participants",
                rank,
                self.spans.len()
            ))
        })
    }

    /// Scale the plan by a row width into element counts and displacements.
    pub fn layout<W: RowWidth>(&self, width: usize) -> ElementLayout<W> {
        let counts = self.spans.iter().map(|s| s.rows * width).collect();
        let displs = self.spans.iter().map(|s| s.offset * width).collect();
        ElementLayout {
            width,
            counts,
            displs,
            _width: PhantomData,
        }
    }
}

/// Marker for the width a layout was scaled by.
pub trait RowWidth {}

/// Rows of A (width K), used to scatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ARows {}

/// Rows of C (width N), used to gather.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CRows {}

impl RowWidth for ARows {}

impl RowWidth for CRows {}

/// Per-participant element counts and displacements into a flattened matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementLayout<W> {
    width: usize,
    counts: Vec<usize>,
    displs: Vec<usize>,
    _width: PhantomData<W>,
}

impl<W: RowWidth> ElementLayout<W> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn displs(&self) -> &[usize] {
        &self.displs
    }

    pub fn count(&self, rank: usize) -> usize {
        self.counts.get(rank).copied().unwrap_or(0)
    }

    /// Total element count covered by the layout
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Untyped view handed to the transport
    pub fn as_varcount(&self) -> VarCount<'_> {
        VarCount {
            counts: &self.counts,
            displs: &self.displs,
        }
    }
}

/// Counts and displacements as the transport sees them.
#[derive(Debug, Clone, Copy)]
pub struct VarCount<'a> {
    pub counts: &'a [usize],
    pub displs: &'a [usize],
}

impl VarCount<'_> {
    /// Element range of `rank` inside the flattened buffer
    pub fn range(&self, rank: usize) -> std::ops::Range<usize> {
        let start = self.displs[rank];
        start..start + self.counts[rank]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(plan: &PartitionPlan) -> Vec<usize> {
        plan.spans().iter().map(|s| s.rows).collect()
    }

    #[test]
    fn test_uneven_split() {
        let p = plan(5, 2).unwrap();
        assert_eq!(
            p.spans(),
            &[RowSpan { rows: 3, offset: 0 }, RowSpan { rows: 2, offset: 3 }]
        );
    }

    #[test]
    fn test_counts_sum_and_balance() {
        for m in 0..40 {
            for p in 1..12 {
                let partition = plan(m, p).unwrap();
                let counts = rows(&partition);
                assert_eq!(counts.iter().sum::<usize>(), m, "M={} P={}", m, p);
                for (i, &c) in counts.iter().enumerate() {
                    let expected = if i < m % p { m.div_ceil(p) } else { m / p };
                    assert_eq!(c, expected, "M={} P={} rank={}", m, p, i);
                }
                let mut offset = 0;
                for span in partition.spans() {
                    assert_eq!(span.offset, offset);
                    offset += span.rows;
                }
            }
        }
    }

    #[test]
    fn test_more_participants_than_rows() {
        let p = plan(3, 5).unwrap();
        assert_eq!(rows(&p), vec![1, 1, 1, 0, 0]);
        assert_eq!(p.span(3).unwrap(), RowSpan { rows: 0, offset: 3 });
        assert!(p.span(4).unwrap().is_empty());
    }

    #[test]
    fn test_single_participant_owns_everything() {
        let p = plan(7, 1).unwrap();
        assert_eq!(p.spans(), &[RowSpan { rows: 7, offset: 0 }]);
    }

    #[test]
    fn test_zero_participants_rejected() {
        assert!(matches!(plan(4, 0), Err(MatmulError::Config(_))));
    }

    #[test]
    fn test_layouts_scale_by_their_own_width() {
        let p = plan(5, 2).unwrap();
        let a = p.layout::<ARows>(3);
        let c = p.layout::<CRows>(2);
        assert_eq!(a.counts(), &[9, 6]);
        assert_eq!(a.displs(), &[0, 9]);
        assert_eq!(c.counts(), &[6, 4]);
        assert_eq!(c.displs(), &[0, 6]);
        assert_eq!(a.total(), 15);
        assert_eq!(c.as_varcount().range(1), 6..10);
    }

    #[test]
    fn test_span_out_of_range() {
        let p = plan(4, 2).unwrap();
        assert!(p.span(2).is_err());
    }
}
