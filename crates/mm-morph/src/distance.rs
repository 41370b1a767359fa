use mm_core::{Connectivity, Error, ImageView, ImageViewMut, neighbor};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceConfig {
    pub connectivity: Connectivity,
    /// Stop after this many dilation rounds even if the target was not
    /// reached. `None` runs until contact or saturation.
    pub max_rounds: Option<usize>,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::C8,
            max_rounds: None,
        }
    }
}

/// Why a measurement stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The seed already overlapped or neighbored the target. No round ran.
    AlreadyTouching,
    /// The last counted round reached a target cell.
    Touched,
    /// A round produced no growth: the growing mask filled everything it
    /// can reach without touching the target.
    Stalled,
    /// [`DistanceConfig::max_rounds`] was hit.
    RoundLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceReport {
    /// Number of counted dilation rounds.
    pub distance: usize,
    pub termination: Termination,
    /// Cells added to the growing mask over all rounds.
    pub total_grown: usize,
    /// Cells added by the last counted round.
    pub last_round_growth: usize,
}

impl DistanceReport {
    pub fn touched(&self) -> bool {
        matches!(
            self.termination,
            Termination::AlreadyTouching | Termination::Touched
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RoundOutcome {
    grown: usize,
    touched: bool,
}

/// Reusable dilation-distance engine.
///
/// Each round grows every foreground cell of the growing mask by one ring of
/// neighbors. Growth into cells the raster scan has not reached yet is staged
/// in a pending buffer and committed after the scan, so one round never
/// advances the front by more than one ring. The engine owns only that
/// buffer; separate engines can measure separate mask pairs on separate
/// threads.
#[derive(Debug, Default, Clone)]
pub struct DilationDistance {
    pending: Vec<u8>,
    width: usize,
}

impl DilationDistance {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            width: 0,
        }
    }

    /// Dilates `growing` round by round until it touches `target` and
    /// returns the number of rounds.
    ///
    /// `growing` is left holding the dilated mask. Grown cells copy the label
    /// of the cell that grew into them. `target` is only read.
    ///
    /// Masks that already overlap or neighbor each other report distance 0
    /// and are left unchanged. A round that touches the target is counted. A
    /// round without growth is not counted and ends the measurement, so an
    /// unreachable target reports the expansion radius with
    /// [`Termination::Stalled`].
    pub fn measure(
        &mut self,
        growing: &mut ImageViewMut<'_, u8>,
        target: &ImageView<'_, u8>,
        cfg: &DistanceConfig,
    ) -> Result<DistanceReport, Error> {
        let (width, height) = check_grids(growing.dims(), target.dims())?;
        self.ensure(width, height);

        if seed_touches(&growing.as_view(), target, cfg.connectivity) {
            debug!(width, height, "masks already touch");
            return Ok(DistanceReport {
                distance: 0,
                termination: Termination::AlreadyTouching,
                total_grown: 0,
                last_round_growth: 0,
            });
        }

        let mut distance = 0usize;
        let mut total_grown = 0usize;
        let mut last_round_growth = 0usize;

        let termination = loop {
            if cfg.max_rounds.is_some_and(|limit| distance >= limit) {
                break Termination::RoundLimit;
            }

            let outcome = self.grow_round(growing, target, cfg.connectivity);
            self.commit(growing);
            trace!(
                round = distance + 1,
                grown = outcome.grown,
                touched = outcome.touched,
                "dilation round"
            );

            if !outcome.touched && outcome.grown == 0 {
                break Termination::Stalled;
            }

            distance += 1;
            total_grown += outcome.grown;
            last_round_growth = outcome.grown;

            if outcome.touched {
                break Termination::Touched;
            }
        };

        debug!(
            distance,
            ?termination,
            total_grown,
            width,
            height,
            "dilation distance measured"
        );

        Ok(DistanceReport {
            distance,
            termination,
            total_grown,
            last_round_growth,
        })
    }

    fn ensure(&mut self, width: usize, height: usize) {
        let len = width * height;
        if self.pending.len() != len {
            self.pending.clear();
            self.pending.resize(len, 0);
        }
        self.width = width;
    }

    /// Scans the growing mask once in raster order and applies the growth
    /// rule to each foreground cell.
    fn grow_round(
        &mut self,
        growing: &mut ImageViewMut<'_, u8>,
        target: &ImageView<'_, u8>,
        connectivity: Connectivity,
    ) -> RoundOutcome {
        let mut outcome = RoundOutcome::default();
        for y in 0..growing.height() {
            for x in 0..growing.width() {
                let label = growing.row(y)[x];
                if label == 0 {
                    continue;
                }
                self.grow_cell(growing, target, connectivity, (x, y), label, &mut outcome);
            }
        }
        outcome
    }

    fn grow_cell(
        &mut self,
        growing: &mut ImageViewMut<'_, u8>,
        target: &ImageView<'_, u8>,
        connectivity: Connectivity,
        cell: (usize, usize),
        label: u8,
        outcome: &mut RoundOutcome,
    ) {
        let (width, height) = growing.dims();
        let (x, y) = cell;

        for &(dx, dy) in connectivity.offsets() {
            let Some((nx, ny)) = neighbor(x, y, dx, dy, width, height) else {
                continue;
            };

            if target.row(ny)[nx] != 0 {
                outcome.touched = true;
                continue;
            }

            let slot = ny * self.width + nx;
            if growing.row(ny)[nx] != 0 || self.pending[slot] != 0 {
                continue;
            }

            // Cells behind the scan position are never revisited this round,
            // so they can take the label immediately.
            if scan_visited((nx, ny), cell) {
                growing.row_mut(ny)[nx] = label;
            } else {
                self.pending[slot] = label;
            }
            outcome.grown += 1;
        }
    }

    /// Moves staged labels into the growing mask and clears the buffer.
    fn commit(&mut self, growing: &mut ImageViewMut<'_, u8>) {
        for (y, staged) in self.pending.chunks_exact_mut(self.width).enumerate() {
            let row = growing.row_mut(y);
            for (dst, src) in row.iter_mut().zip(staged.iter_mut()) {
                if *src != 0 {
                    *dst = *src;
                    *src = 0;
                }
            }
        }
    }
}

/// Measures the dilation distance between two contiguous `width x height`
/// masks with 8-connectivity. `growing` is dilated in place.
pub fn distance_by_dilation(
    growing: &mut [u8],
    target: &[u8],
    width: usize,
    height: usize,
) -> Result<usize, Error> {
    check_mask_len(growing.len(), width, height)?;
    check_mask_len(target.len(), width, height)?;

    let mut growing = ImageViewMut::from_slice_mut(width, height, width, growing)?;
    let target = ImageView::from_slice(width, height, width, target)?;

    let report = DilationDistance::new().measure(
        &mut growing,
        &target,
        &DistanceConfig::default(),
    )?;
    Ok(report.distance)
}

/// Raster order visits rows top to bottom and each row left to right.
fn scan_visited(cell: (usize, usize), current: (usize, usize)) -> bool {
    (cell.1, cell.0) < (current.1, current.0)
}

fn seed_touches(
    growing: &ImageView<'_, u8>,
    target: &ImageView<'_, u8>,
    connectivity: Connectivity,
) -> bool {
    let (width, height) = growing.dims();
    for y in 0..height {
        for x in 0..width {
            if growing.row(y)[x] == 0 {
                continue;
            }
            if target.row(y)[x] != 0 {
                return true;
            }

            let touches = connectivity.offsets().iter().any(|&(dx, dy)| {
                neighbor(x, y, dx, dy, width, height)
                    .is_some_and(|(nx, ny)| target.row(ny)[nx] != 0)
            });
            if touches {
                return true;
            }
        }
    }
    false
}

fn check_grids(growing: (usize, usize), target: (usize, usize)) -> Result<(usize, usize), Error> {
    if growing.0 == 0 || growing.1 == 0 {
        return Err(Error::EmptyDimensions);
    }
    if growing != target {
        return Err(Error::DimensionMismatch {
            expected: growing,
            actual: target,
        });
    }
    Ok(growing)
}

fn check_mask_len(len: usize, width: usize, height: usize) -> Result<(), Error> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyDimensions);
    }
    let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
        expected: usize::MAX,
        actual: len,
    })?;
    if len != expected {
        return Err(Error::SizeMismatch {
            expected,
            actual: len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use mm_core::{Connectivity, Error, Image, ImageView, ImageViewMut};

    use super::{DilationDistance, DistanceConfig, Termination, distance_by_dilation};
    use crate::dilate_binary_u8;

    fn single(width: usize, height: usize, x: usize, y: usize, label: u8) -> Image<u8> {
        let mut img = Image::new_fill(width, height, 0u8);
        img.data_mut()[y * width + x] = label;
        img
    }

    fn measure(
        growing: &mut Image<u8>,
        target: &Image<u8>,
        cfg: &DistanceConfig,
    ) -> super::DistanceReport {
        DilationDistance::new()
            .measure(&mut growing.as_view_mut(), &target.as_view(), cfg)
            .expect("valid masks")
    }

    #[test]
    fn corner_to_center_of_5x5_takes_two_rounds() {
        let mut growing = single(5, 5, 0, 0, 1);
        let target = single(5, 5, 2, 2, 1);
        let target_before = target.clone();

        let report = measure(&mut growing, &target, &DistanceConfig::default());

        assert_eq!(report.distance, 2);
        assert_eq!(report.termination, Termination::Touched);
        assert_eq!(report.total_grown, 7);
        assert_eq!(report.last_round_growth, 4);
        assert_eq!(target, target_before);

        // Never grows into the target itself.
        assert_eq!(growing.data()[2 * 5 + 2], 0);
        for y in 0..3 {
            for x in 0..3 {
                if (x, y) != (2, 2) {
                    assert_eq!(growing.data()[y * 5 + x], 1, "cell ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn adjacent_pixels_report_zero() {
        let mut growing = vec![1u8, 0, 0];
        let target = vec![0u8, 1, 0];

        let d = distance_by_dilation(&mut growing, &target, 3, 1).expect("valid masks");

        assert_eq!(d, 0);
        assert_eq!(growing, vec![1, 0, 0]);
    }

    #[test]
    fn diagonal_neighbor_and_overlap_report_zero() {
        let mut growing = single(4, 4, 1, 1, 5);
        let target = single(4, 4, 2, 2, 9);
        let report = measure(&mut growing, &target, &DistanceConfig::default());
        assert_eq!(report.distance, 0);
        assert_eq!(report.termination, Termination::AlreadyTouching);

        let mut growing = single(4, 4, 3, 0, 5);
        let target = single(4, 4, 3, 0, 9);
        let report = measure(&mut growing, &target, &DistanceConfig::default());
        assert_eq!(report.distance, 0);
        assert!(report.touched());
    }

    #[test]
    fn single_pixels_report_chebyshev_distance() {
        let cases = [(8, 6), (6, 8), (2, 2), (12, 6), (6, 0), (11, 9), (0, 12)];
        for (tx, ty) in cases {
            let mut growing = single(13, 13, 6, 6, 1);
            let target = single(13, 13, tx, ty, 1);
            let expected = (tx as isize - 6).abs().max((ty as isize - 6).abs()) as usize;

            let report = measure(&mut growing, &target, &DistanceConfig::default());

            assert_eq!(report.distance, expected, "target ({tx}, {ty})");
            assert_eq!(report.termination, Termination::Touched);
        }
    }

    #[test]
    fn c4_reports_city_block_distance() {
        let mut growing = single(5, 5, 0, 0, 1);
        let target = single(5, 5, 2, 2, 1);
        let cfg = DistanceConfig {
            connectivity: Connectivity::C4,
            ..DistanceConfig::default()
        };

        let report = measure(&mut growing, &target, &cfg);

        assert_eq!(report.distance, 4);
        assert_eq!(report.termination, Termination::Touched);
    }

    #[test]
    fn empty_growing_mask_reports_zero() {
        let mut growing = Image::new_fill(4, 3, 0u8);
        let target = single(4, 3, 3, 2, 1);

        let report = measure(&mut growing, &target, &DistanceConfig::default());

        assert_eq!(report.distance, 0);
        assert_eq!(report.termination, Termination::Stalled);
        assert!(growing.data().iter().all(|&v| v == 0));
        assert_eq!(target.as_view().count_nonzero(), 1);
    }

    #[test]
    fn unreachable_target_stops_when_grid_is_full() {
        let mut growing = single(5, 5, 0, 0, 3);
        let target = Image::new_fill(5, 5, 0u8);

        let report = measure(&mut growing, &target, &DistanceConfig::default());

        assert_eq!(report.distance, 4);
        assert_eq!(report.termination, Termination::Stalled);
        assert_eq!(report.total_grown, 24);
        assert!(growing.data().iter().all(|&v| v == 3));
    }

    #[test]
    fn parallel_bars_report_column_gap() {
        let mut growing = Image::new_fill(8, 4, 0u8);
        let mut target = Image::new_fill(8, 4, 0u8);
        for y in 0..4 {
            growing.data_mut()[y * 8] = 4;
            target.data_mut()[y * 8 + 5] = 1;
        }

        let report = measure(&mut growing, &target, &DistanceConfig::default());

        assert_eq!(report.distance, 5);
        assert_eq!(report.termination, Termination::Touched);
        for y in 0..4 {
            assert_eq!(&growing.data()[y * 8..y * 8 + 6], &[4, 4, 4, 4, 4, 0]);
        }
    }

    #[test]
    fn round_limit_caps_work() {
        let mut growing = single(20, 1, 0, 0, 1);
        let target = single(20, 1, 19, 0, 1);
        let cfg = DistanceConfig {
            max_rounds: Some(5),
            ..DistanceConfig::default()
        };

        let report = measure(&mut growing, &target, &cfg);

        assert_eq!(report.distance, 5);
        assert_eq!(report.termination, Termination::RoundLimit);
        assert_eq!(growing.as_view().count_nonzero(), 6);
    }

    #[test]
    fn each_round_adds_exactly_one_ring() {
        let seed = {
            let mut img = Image::new_fill(15, 11, 0u8);
            for &(x, y) in &[(7, 5), (8, 5), (6, 6), (10, 2), (3, 8), (14, 10)] {
                img.data_mut()[y * 15 + x] = 1;
            }
            img
        };
        let target = Image::new_fill(15, 11, 0u8);

        for connectivity in [Connectivity::C4, Connectivity::C8] {
            let mut expected = seed.clone();
            for k in 1..=4 {
                expected = dilate_binary_u8(&expected.as_view(), connectivity);

                let mut growing = seed.clone();
                let cfg = DistanceConfig {
                    connectivity,
                    max_rounds: Some(k),
                };
                let report = measure(&mut growing, &target, &cfg);
                assert_eq!(report.distance, k);

                let support: Vec<u8> = growing
                    .data()
                    .iter()
                    .map(|&v| if v != 0 { 255 } else { 0 })
                    .collect();
                assert_eq!(support, expected.data(), "{connectivity:?} round {k}");
            }
        }
    }

    #[test]
    fn growth_is_monotonic_and_keeps_labels() {
        let mut seed = Image::new_fill(16, 9, 0u8);
        seed.data_mut()[2 * 16 + 2] = 3;
        seed.data_mut()[6 * 16 + 13] = 7;
        let target = single(16, 9, 8, 8, 1);

        let mut previous = seed.clone();
        for k in 1..=3 {
            let mut growing = seed.clone();
            let cfg = DistanceConfig {
                max_rounds: Some(k),
                ..DistanceConfig::default()
            };
            measure(&mut growing, &target, &cfg);

            for (i, (&before, &after)) in previous.data().iter().zip(growing.data()).enumerate() {
                if before != 0 {
                    assert_eq!(after, before, "cell {i} changed in round {k}");
                }
            }

            for (i, &v) in growing.data().iter().enumerate() {
                let (x, y) = (i % 16, i / 16);
                match v {
                    0 => {}
                    3 => assert!(x <= 2 + k && y <= 2 + k, "label 3 at ({x}, {y})"),
                    7 => assert!(x + k >= 13 && y + k >= 6, "label 7 at ({x}, {y})"),
                    other => panic!("unexpected label {other} at ({x}, {y})"),
                }
            }
            previous = growing;
        }
    }

    #[test]
    fn growth_behind_scan_does_not_cascade() {
        // Bottom-right seed: every neighbor lies behind the scan and is
        // written directly into the live mask.
        let mut growing = single(9, 9, 8, 8, 2);
        let target = Image::new_fill(9, 9, 0u8);
        let cfg = DistanceConfig {
            max_rounds: Some(1),
            ..DistanceConfig::default()
        };

        let report = measure(&mut growing, &target, &cfg);

        assert_eq!(report.total_grown, 3);
        assert_eq!(growing.as_view().count_nonzero(), 4);
        assert_eq!(growing.data()[7 * 9 + 7], 2);
        assert_eq!(growing.data()[6 * 9 + 6], 0);
    }

    #[test]
    fn strided_views_leave_padding_alone() {
        let mut growing = vec![
            1u8, 0, 0, 0, 99, // row 0
            0, 0, 0, 0, 99, // row 1
            0, 0, 0, 0, 99, // row 2
        ];
        let target = vec![
            0u8, 0, 0, 1, 42, // row 0
            0, 0, 0, 0, 42, // row 1
            0, 0, 0, 0, 42, // row 2
        ];
        let mut growing_view = ImageViewMut::from_slice_mut(4, 3, 5, &mut growing).expect("view");
        let target_view = ImageView::from_slice(4, 3, 5, &target).expect("view");

        let report = DilationDistance::new()
            .measure(&mut growing_view, &target_view, &DistanceConfig::default())
            .expect("valid masks");

        assert_eq!(report.distance, 3);
        assert_eq!(growing[4], 99);
        assert_eq!(growing[9], 99);
        assert_eq!(growing[14], 99);
    }

    #[test]
    fn engine_is_reusable_across_sizes() {
        let mut engine = DilationDistance::new();
        let cfg = DistanceConfig::default();

        let cases = [
            (5, 5, 0, 3, 4),
            (3, 1, 0, 2, 2),
            (7, 4, 6, 0, 6),
            (5, 5, 0, 4, 4),
        ];
        for (w, h, gx, tx, expected) in cases {
            let mut growing = single(w, h, gx, 0, 1);
            let target = single(w, h, tx, h - 1, 1);
            let report = engine
                .measure(&mut growing.as_view_mut(), &target.as_view(), &cfg)
                .expect("valid masks");
            assert_eq!(report.distance, expected, "{w}x{h}");
            assert!(engine.pending.iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn concurrent_measurements_match_sequential() {
        let offsets = [2usize, 3, 5, 7, 9, 11];
        let expected: Vec<usize> = offsets
            .iter()
            .map(|&d| {
                let mut growing = single(24, 24, 1, 1, 1);
                let target = single(24, 24, 1 + d, 1, 1);
                measure(&mut growing, &target, &DistanceConfig::default()).distance
            })
            .collect();

        let got: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = offsets
                .iter()
                .map(|&d| {
                    s.spawn(move || {
                        let mut growing = single(24, 24, 1, 1, 1);
                        let target = single(24, 24, 1 + d, 1, 1);
                        measure(&mut growing, &target, &DistanceConfig::default()).distance
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("measurement thread"))
                .collect()
        });

        assert_eq!(got, expected);
        assert_eq!(got, offsets.to_vec());
    }

    #[test]
    fn preconditions_fail_fast() {
        let mut growing = vec![0u8; 6];
        assert_eq!(
            distance_by_dilation(&mut growing, &[0u8; 5], 3, 2).unwrap_err(),
            Error::SizeMismatch {
                expected: 6,
                actual: 5
            }
        );
        assert_eq!(
            distance_by_dilation(&mut growing, &[0u8; 6], 0, 6).unwrap_err(),
            Error::EmptyDimensions
        );

        let mut a = Image::new_fill(3, 2, 0u8);
        let b = Image::new_fill(2, 3, 0u8);
        let err = DilationDistance::new()
            .measure(&mut a.as_view_mut(), &b.as_view(), &DistanceConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: (3, 2),
                actual: (2, 3)
            }
        );
    }
}
