//! Ranking of viable candidates.
//!
//! A candidate is better than another when none of its conversion sequences
//! is worse and at least one is better. Ties are broken by preferring
//! non-template functions, then the more specialized template, then the
//! better second conversion of a user-defined conversion context.

use tracing::trace;

use super::{Candidate, Resolution};
use crate::context::CompilationContext;
use crate::conversion::{Comparison, ConversionSequence, compare};
use crate::template::more_specialized;

/// Run the tournament over the viable candidates.
///
/// The last candidate starts as champion and is challenged by the others
/// in reverse order. The survivor must then beat every remaining candidate.
pub(super) fn best_viable(ctx: &CompilationContext, mut viable: Vec<Candidate>) -> Resolution {
    if viable.is_empty() {
        return Resolution::NoMatch;
    }

    let mut champion = viable.len() - 1;
    let mut i = champion;
    while i > 0 {
        i -= 1;
        let challenger = i;
        if viable[challenger].function.func_hash == viable[champion].function.func_hash {
            viable.remove(challenger);
            champion -= 1;
            continue;
        }
        match compare_candidates(ctx, &viable[champion], &viable[challenger]) {
            Comparison::Better => {
                trace!(loser = %viable[challenger].function, "candidate eliminated");
                viable.remove(challenger);
                champion -= 1;
            }
            Comparison::Worse => {
                trace!(loser = %viable[champion].function, "champion eliminated");
                viable.remove(champion);
                champion = challenger;
            }
            Comparison::Indistinguishable => champion = challenger,
        }
    }

    // The champion has to be better than everything left over.
    let beaten: Vec<bool> = viable
        .iter()
        .enumerate()
        .map(|(i, other)| i != champion && compare_candidates(ctx, &viable[champion], other) == Comparison::Better)
        .collect();
    if beaten.iter().filter(|&&b| b).count() == viable.len() - 1 {
        return Resolution::Unique(viable.swap_remove(champion));
    }
    let mut keep = beaten.into_iter().map(|b| !b);
    viable.retain(|_| keep.next().unwrap_or(true));
    Resolution::Ambiguous(viable)
}

/// Compare two viable candidates for the same call.
///
/// # Returns
///
/// [`Comparison::Better`] if `a` is the better function.
pub fn compare_candidates(ctx: &CompilationContext, a: &Candidate, b: &Candidate) -> Comparison {
    let by_conversions = compare_conversions(ctx, a, b);
    if by_conversions != Comparison::Indistinguishable {
        return by_conversions;
    }

    // Non-template functions beat template instances.
    match (a.function.is_template_instance(), b.function.is_template_instance()) {
        (false, true) => return Comparison::Better,
        (true, false) => return Comparison::Worse,
        (true, true) => {
            let ordering = more_specialized(ctx, a.function.func_hash, b.function.func_hash);
            if ordering != Comparison::Indistinguishable {
                return ordering;
            }
        }
        (false, false) => {}
    }

    match (&a.second_conversion, &b.second_conversion) {
        (Some(sa), Some(sb)) => compare(ctx, sa, sb),
        _ => Comparison::Indistinguishable,
    }
}

/// Argument-wise comparison. The implicit object of a static member takes
/// no part in it.
fn compare_conversions(ctx: &CompilationContext, a: &Candidate, b: &Candidate) -> Comparison {
    let skip_object = a.function.is_static || b.function.is_static;
    let a_seqs = sequences(a, skip_object);
    let b_seqs = sequences(b, skip_object);

    let mut better = false;
    let mut worse = false;
    for (sa, sb) in a_seqs.iter().zip(b_seqs.iter()) {
        match compare(ctx, sa, sb) {
            Comparison::Better => better = true,
            Comparison::Worse => worse = true,
            Comparison::Indistinguishable => {}
        }
    }
    match (better, worse) {
        (true, false) => Comparison::Better,
        (false, true) => Comparison::Worse,
        _ => Comparison::Indistinguishable,
    }
}

fn sequences(candidate: &Candidate, skip_object: bool) -> &[ConversionSequence] {
    if skip_object && candidate.has_object {
        candidate.argument_conversions()
    } else {
        &candidate.conversions
    }
}
