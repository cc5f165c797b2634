use super::silence_locator::SilenceInterval;
use crate::shared::constants::CUT_POSITION_IN_GAP;

/// Where an asset gets cut, and how that position was chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitPoint {
    pub cut_ms: f64,
    /// The silence gap the cut sits in; `None` for caller-supplied cuts.
    pub gap: Option<SilenceInterval>,
}

impl SplitPoint {
    /// A caller-supplied cut that bypasses boundary estimation.
    pub fn manual(cut_ms: f64) -> Self {
        Self { cut_ms, gap: None }
    }

    pub fn cut_seconds(&self) -> f64 {
        self.cut_ms / 1000.0
    }
}

pub struct SplitPointSelector;

impl SplitPointSelector {
    /// Picks the gap whose start is nearest to `target_ms` (first one wins a
    /// tie) and cuts 5/6 of the way into it, so trailing source-language audio
    /// is not clipped. Returns `None` when there are no gaps.
    pub fn select(gaps: &[SilenceInterval], target_ms: f64) -> Option<SplitPoint> {
        let mut best: Option<(f64, SilenceInterval)> = None;

        for gap in gaps {
            let diff = (gap.start_ms as f64 - target_ms).abs();
            match best {
                Some((smallest, _)) if diff >= smallest => {}
                _ => best = Some((diff, *gap)),
            }
        }

        best.map(|(_, gap)| SplitPoint {
            cut_ms: cut_within(&gap),
            gap: Some(gap),
        })
    }
}

fn cut_within(gap: &SilenceInterval) -> f64 {
    let start = gap.start_ms as f64;
    let end = gap.end_ms as f64;
    start + (end - start) * CUT_POSITION_IN_GAP
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn gap(start: u64, end: u64) -> SilenceInterval {
        SilenceInterval::new(start, end)
    }

    #[test]
    fn test_empty_gaps_yields_none() {
        assert!(SplitPointSelector::select(&[], 5000.0).is_none());
    }

    #[test]
    fn test_cut_is_five_sixths_into_gap() {
        let point = SplitPointSelector::select(&[gap(1200, 1800)], 0.0).unwrap();
        assert_relative_eq!(point.cut_ms, 1700.0);
        assert_eq!(point.gap, Some(gap(1200, 1800)));
    }

    #[rstest]
    #[case::nearest_before(4100.0, 1)]
    #[case::nearest_after(6900.0, 2)]
    #[case::far_left(0.0, 0)]
    #[case::far_right(100_000.0, 3)]
    fn test_selects_gap_with_nearest_start(#[case] target_ms: f64, #[case] expected: usize) {
        let gaps = vec![gap(500, 700), gap(4000, 4300), gap(7000, 7600), gap(9000, 9100)];
        let point = SplitPointSelector::select(&gaps, target_ms).unwrap();
        assert_eq!(point.gap, Some(gaps[expected]));
    }

    #[test]
    fn test_tie_resolves_to_first_gap() {
        // Both starts are 500ms from the target.
        let gaps = vec![gap(2500, 2600), gap(3500, 4100)];
        let point = SplitPointSelector::select(&gaps, 3000.0).unwrap();
        assert_eq!(point.gap, Some(gap(2500, 2600)));
    }

    #[test]
    fn test_cut_lies_inside_selected_gap() {
        let gaps = vec![gap(10, 70), gap(300, 360), gap(900, 2000)];
        for target in [0.0, 320.0, 1500.0] {
            let point = SplitPointSelector::select(&gaps, target).unwrap();
            let g = point.gap.unwrap();
            assert!(point.cut_ms >= g.start_ms as f64 && point.cut_ms <= g.end_ms as f64);
        }
    }

    #[test]
    fn test_manual_point_has_no_gap() {
        let point = SplitPoint::manual(2500.0);
        assert!(point.gap.is_none());
        assert_relative_eq!(point.cut_seconds(), 2.5);
    }
}
