use crate::simulation::features::FeatureField;

/// One row of the remediation table: when `applies` holds for the field's current value,
/// suggest moving it to `target`.
#[derive(Debug, Clone, Copy)]
pub struct CounterfactualRule {
    pub field: FeatureField,
    pub applies: fn(f64) -> bool,
    pub target: f64,
    pub label: &'static str,
    pub action: &'static str,
}

impl CounterfactualRule {
    /// Target clamped so a suggestion never pushes a field upward.
    pub(crate) fn target_for(&self, current: f64) -> f64 {
        self.target.min(current)
    }
}

fn debt_ratio_above_limit(value: f64) -> bool {
    value > 0.40
}

fn any_events(value: f64) -> bool {
    value > 0.0
}

fn utilization_above_limit(value: f64) -> bool {
    value > 0.30
}

/// Standard rubric, evaluated in this order.
pub(crate) const STANDARD_RULES: [CounterfactualRule; 4] = [
    CounterfactualRule {
        field: FeatureField::DebtRatio,
        applies: debt_ratio_above_limit,
        target: 0.35,
        label: "Reduce Debt Ratio",
        action: "Pay down existing debts to lower ratio below 40%",
    },
    CounterfactualRule {
        field: FeatureField::Late90Days,
        applies: any_events,
        target: 0.0,
        label: "Avoid Late Payments",
        action: "Ensure no new late payments for 6 months",
    },
    CounterfactualRule {
        field: FeatureField::Late30To59Days,
        applies: any_events,
        target: 0.0,
        label: "Improve Payment History",
        action: "Clear recent 30-day delinquencies",
    },
    CounterfactualRule {
        field: FeatureField::RevolvingUtilization,
        applies: utilization_above_limit,
        target: 0.25,
        label: "Lower Credit Utilization",
        action: "Pay down credit cards below 30% limit",
    },
];
