//! Operator tiers and stacking-penalty math.
//!
//! Modifications are bucketed by operator and applied tier by tier in a fixed
//! order. The combined post-multiplicative tier is where the diminishing
//! returns live: on a non-stackable attribute, same-direction multipliers are
//! ranked by strength and each successive one contributes along a fixed decay
//! series, approaching but never reaching zero.

use fit_data::{Attribute, ModOperator};

/// Decay parameter of the stacking-penalty series: the n-th strongest
/// same-direction multiplier is scaled by exp(-(n / 2.67)^2), yielding
/// 100%, 86.9%, 57.1%, 28.3%, 10.5%, 3.2%, ...
const PENALTY_DECAY: f64 = 2.67;

fn penalty_factor(position: usize) -> f64 {
    (-((position as f64) / PENALTY_DECAY).powi(2)).exp()
}

/// Modifications targeting one attribute, bucketed by operator.
///
/// Buckets preserve registration order; for the assignment operators only
/// the last registration wins.
#[derive(Debug, Default)]
pub(crate) struct ModificationSet {
    pre_assign: Vec<f64>,
    pre_mul: Vec<f64>,
    pre_div: Vec<f64>,
    mod_add: Vec<f64>,
    mod_sub: Vec<f64>,
    post_mul: Vec<f64>,
    post_div: Vec<f64>,
    post_percent: Vec<f64>,
    post_assign: Vec<f64>,
}

impl ModificationSet {
    pub fn push(&mut self, operator: ModOperator, value: f64) {
        match operator {
            ModOperator::PreAssign => self.pre_assign.push(value),
            ModOperator::PreMul => self.pre_mul.push(value),
            ModOperator::PreDiv => self.pre_div.push(value),
            ModOperator::ModAdd => self.mod_add.push(value),
            ModOperator::ModSub => self.mod_sub.push(value),
            ModOperator::PostMul => self.post_mul.push(value),
            ModOperator::PostDiv => self.post_div.push(value),
            ModOperator::PostPercent => self.post_percent.push(value),
            ModOperator::PostAssign => self.post_assign.push(value),
        }
    }

    /// Whether any assigning modification is present; such a set can resolve
    /// an attribute that has no base value at all.
    pub fn has_assignment(&self) -> bool {
        !self.pre_assign.is_empty() || !self.post_assign.is_empty()
    }

    /// Applies all tiers onto the base value.
    pub fn apply(&self, base: f64, attr: &Attribute) -> f64 {
        let mut value = *self.pre_assign.last().unwrap_or(&base);
        for v in &self.pre_mul {
            value *= v;
        }
        for v in &self.pre_div {
            value /= v;
        }
        // The additive tier is a flat delta against the pre-tier value and
        // is never penalized.
        value += self.mod_add.iter().sum::<f64>();
        value -= self.mod_sub.iter().sum::<f64>();

        // One combined multiplicative tier: straight multiplications,
        // divisions and percentage bonuses all normalize to multipliers.
        let multipliers: Vec<f64> = self
            .post_mul
            .iter()
            .copied()
            .chain(self.post_div.iter().map(|v| 1.0 / v))
            .chain(self.post_percent.iter().map(|v| 1.0 + v / 100.0))
            .collect();
        if attr.stackable {
            for m in &multipliers {
                value *= m;
            }
        } else {
            value *= penalized_product(&multipliers);
        }

        if let Some(v) = self.post_assign.last() {
            value = *v;
        }
        value
    }
}

/// Combined multiplier of a penalized tier.
///
/// Bonuses (multiplier above 1) and penalties (below 1) decay independently:
/// mixing directions does not dilute either chain.
fn penalized_product(multipliers: &[f64]) -> f64 {
    let mut bonuses: Vec<f64> = Vec::new();
    let mut penalties: Vec<f64> = Vec::new();
    for m in multipliers {
        if *m > 1.0 {
            bonuses.push(*m);
        } else if *m < 1.0 {
            penalties.push(*m);
        }
        // A multiplier of exactly 1 is a no-op either way.
    }

    let chain = |mut values: Vec<f64>| -> f64 {
        values.sort_by(|a, b| {
            (b - 1.0)
                .abs()
                .partial_cmp(&(a - 1.0).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        values
            .iter()
            .enumerate()
            .fold(1.0, |acc, (i, m)| acc * (1.0 + (m - 1.0) * penalty_factor(i)))
    };

    chain(bonuses) * chain(penalties)
}
