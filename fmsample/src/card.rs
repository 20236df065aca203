//! Cardinality bounds over literal sets.
use varisat_formula::{ExtendFormula, Lit};

/// A unary counter over a set of input literals.
///
/// This is the totalizer encoding of Bailleux and Boufkhad: a balanced merge tree whose root
/// yields one output literal per possible count, with output `k` (1-based) equivalent to "at
/// least `k` inputs are true". Both implication directions are encoded, so assuming an output
/// bounds the count from below and assuming a negated output bounds it from above. One encoded
/// counter therefore serves every bound of a maximization search through assumptions alone.
///
/// The auxiliary variables are allocated from the formula the counter is built into, past the
/// variables already present.
pub struct Totalizer {
    outputs: Vec<Lit>,
}

impl Totalizer {
    /// Encodes a counter over `inputs`, adding the counter clauses to `target`.
    pub fn new(target: &mut impl ExtendFormula, inputs: &[Lit]) -> Totalizer {
        Totalizer {
            outputs: build(target, inputs),
        }
    }

    /// Number of counted input literals.
    #[inline]
    pub fn input_count(&self) -> usize {
        self.outputs.len()
    }

    /// The output literals; the literal at index `k` is true iff more than `k` inputs are true.
    #[inline]
    pub fn outputs(&self) -> &[Lit] {
        &self.outputs
    }

    /// The literal that is true iff at least `count` inputs are true.
    ///
    /// `None` when `count` is zero, which holds trivially, or exceeds the input count, which
    /// never holds.
    pub fn at_least(&self, count: usize) -> Option<Lit> {
        if count == 0 {
            None
        } else {
            self.outputs.get(count - 1).copied()
        }
    }
}

fn build(target: &mut impl ExtendFormula, inputs: &[Lit]) -> Vec<Lit> {
    if inputs.len() <= 1 {
        return inputs.to_vec();
    }
    let (left, right) = inputs.split_at(inputs.len() / 2);
    let left = build(&mut *target, left);
    let right = build(&mut *target, right);
    merge(target, &left, &right)
}

/// Merges the unary outputs of two child counters.
///
/// For child counts `i` and `j`, `i + j` true inputs force output `i + j` on; dually, `i` and `j`
/// being upper bounds for the children forces output `i + j + 1` off.
fn merge(target: &mut impl ExtendFormula, left: &[Lit], right: &[Lit]) -> Vec<Lit> {
    let outputs: Vec<Lit> = (0..left.len() + right.len())
        .map(|_| target.new_lit())
        .collect();

    for i in 0..=left.len() {
        for j in 0..=right.len() {
            if i + j > 0 {
                let mut clause = Vec::with_capacity(3);
                if i > 0 {
                    clause.push(!left[i - 1]);
                }
                if j > 0 {
                    clause.push(!right[j - 1]);
                }
                clause.push(outputs[i + j - 1]);
                target.add_clause(&clause[..]);
            }
            if i + j < outputs.len() {
                let mut clause = Vec::with_capacity(3);
                if i < left.len() {
                    clause.push(left[i]);
                }
                if j < right.len() {
                    clause.push(right[j]);
                }
                clause.push(!outputs[i + j]);
                target.add_clause(&clause[..]);
            }
        }
    }

    outputs
}
