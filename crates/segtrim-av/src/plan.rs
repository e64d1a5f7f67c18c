//! Segment planning.
//!
//! Nominal segments are laid on the source timeline at a fixed stride of
//! `segment_length`. The last `removal_interval` seconds of each nominal
//! segment are dropped, and the removed time is not given back: the next
//! nominal segment still starts at the next stride boundary. A nominal
//! segment no longer than the removal interval produces no window at all.

use crate::probe::MediaDuration;
use crate::{Error, Result};
use serde::Serialize;

/// Validated integer segment parameters, as entered by users.
///
/// Guarantees `segment_length > 0` and `removal_interval < segment_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentParams {
    segment_length: u32,
    removal_interval: u32,
}

impl SegmentParams {
    /// Validate a segment length / removal interval pair (both in seconds).
    ///
    /// ```
    /// use segtrim_av::SegmentParams;
    ///
    /// assert!(SegmentParams::new(5, 4).is_ok());
    /// assert!(SegmentParams::new(5, 5).is_err());
    /// assert!(SegmentParams::new(0, 0).is_err());
    /// ```
    pub fn new(segment_length: u32, removal_interval: u32) -> Result<Self> {
        if segment_length == 0 {
            return Err(Error::invalid_parameters(
                "segment length must be greater than zero",
            ));
        }
        if removal_interval >= segment_length {
            return Err(Error::invalid_parameters(format!(
                "removal interval ({removal_interval}s) must be less than the segment length ({segment_length}s)"
            )));
        }
        Ok(Self {
            segment_length,
            removal_interval,
        })
    }

    /// Segment length in seconds.
    pub fn segment_length(&self) -> u32 {
        self.segment_length
    }

    /// Removal interval in seconds.
    pub fn removal_interval(&self) -> u32 {
        self.removal_interval
    }

    /// Number of segments `total` splits into, before any are dropped.
    ///
    /// This is an upper bound on the plan length and costs nothing to compute,
    /// so callers can bound untrusted input before planning.
    ///
    /// ```
    /// use segtrim_av::{MediaDuration, SegmentParams};
    ///
    /// let params = SegmentParams::new(30, 5)?;
    /// assert_eq!(params.segment_count(MediaDuration::from_secs(95.0)?), 4);
    /// # Ok::<(), segtrim_av::Error>(())
    /// ```
    pub fn segment_count(&self, total: MediaDuration) -> u64 {
        (total.as_secs() / f64::from(self.segment_length)).ceil() as u64
    }
}

/// One window that survives removal and will be cut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanWindow {
    /// Position of this window in the plan (0-based, no gaps).
    pub index: usize,
    /// Start offset on the source timeline, in seconds.
    pub start: f64,
    /// Length to cut starting at `start`, in seconds. Always positive.
    pub cut_length: f64,
}

/// Ordered list of windows to cut.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentPlan {
    windows: Vec<PlanWindow>,
}

impl SegmentPlan {
    /// Build the plan for validated integer parameters.
    pub fn build(total: MediaDuration, params: &SegmentParams) -> Result<Self> {
        plan(
            total,
            f64::from(params.segment_length()),
            f64::from(params.removal_interval()),
        )
    }

    /// The windows, in cut order.
    pub fn windows(&self) -> &[PlanWindow] {
        &self.windows
    }

    /// Number of windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether every nominal segment was too short to survive removal.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Sum of all window lengths, i.e. the expected output duration.
    pub fn total_cut_length(&self) -> f64 {
        self.windows.iter().map(|w| w.cut_length).sum()
    }
}

/// Compute the windows to cut from a source of length `total`.
///
/// # Errors
///
/// Returns [`Error::InvalidParameters`] unless
/// `segment_length > 0` and `0 <= removal_interval < segment_length`.
///
/// # Example
///
/// ```
/// use segtrim_av::{plan, MediaDuration};
///
/// let plan = plan(MediaDuration::from_secs(95.0)?, 30.0, 5.0)?;
/// let starts: Vec<f64> = plan.windows().iter().map(|w| w.start).collect();
/// assert_eq!(starts, vec![0.0, 30.0, 60.0]);
/// # Ok::<(), segtrim_av::Error>(())
/// ```
pub fn plan(total: MediaDuration, segment_length: f64, removal_interval: f64) -> Result<SegmentPlan> {
    if !segment_length.is_finite() || segment_length <= 0.0 {
        return Err(Error::invalid_parameters(format!(
            "segment length must be a positive number of seconds, got {segment_length}"
        )));
    }
    if !removal_interval.is_finite() || removal_interval < 0.0 {
        return Err(Error::invalid_parameters(format!(
            "removal interval must be zero or more seconds, got {removal_interval}"
        )));
    }
    if removal_interval >= segment_length {
        return Err(Error::invalid_parameters(format!(
            "removal interval ({removal_interval}s) must be less than the segment length ({segment_length}s)"
        )));
    }

    let total = total.as_secs();
    let mut windows = Vec::new();

    // Starts are k * L rather than a running sum so integer inputs stay exact.
    let mut k: u64 = 0;
    loop {
        let start = k as f64 * segment_length;
        if start >= total {
            break;
        }
        k += 1;

        let nominal_end = (start + segment_length).min(total);
        let nominal_len = nominal_end - start;

        if nominal_len <= removal_interval {
            tracing::debug!(
                "Segment at {}s is {:.3}s long, not longer than the {}s removal interval; skipping",
                start,
                nominal_len,
                removal_interval
            );
            continue;
        }

        windows.push(PlanWindow {
            index: windows.len(),
            start,
            cut_length: nominal_len - removal_interval,
        });
    }

    Ok(SegmentPlan { windows })
}
