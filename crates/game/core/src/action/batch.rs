use crate::action::AtomicAction;

/// Splits submission-ordered actions into consecutive batches whose members
/// pairwise commute.
///
/// Returns index groups into `actions`. Concatenating the groups yields the
/// original order, so applying batch by batch matches applying the whole list
/// left to right; within a batch any order gives the same world.
pub fn plan_batches<A: AtomicAction>(actions: &[A]) -> Vec<Vec<usize>> {
    let mut batches: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();

    for (index, action) in actions.iter().enumerate() {
        let commutes = current
            .iter()
            .all(|&other| action.is_commutative_with(&actions[other]));
        if !commutes {
            batches.push(std::mem::take(&mut current));
        }
        current.push(index);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
