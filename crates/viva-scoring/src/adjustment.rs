//! Score adjustment pass.

use crate::performance::{AnalyticScores, SpeakingPerformance};

/// Fills in `adjusted_score` for every record that has analytic scores.
///
/// Records without analytic scores get `None`, including any stale value
/// from a previous pass.
pub fn apply_adjusted_scores(performances: &mut [SpeakingPerformance]) {
    // TODO: replace the plain sum with the conversion table once the
    // institutional scale for it is finalized
    for perf in performances.iter_mut() {
        perf.adjusted_score = perf.analytic_scores.as_ref().map(AnalyticScores::total);
    }
}
