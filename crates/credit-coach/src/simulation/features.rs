use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// The ten applicant attributes understood by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureField {
    #[serde(rename = "RevolvingUtilizationOfUnsecuredLines")]
    RevolvingUtilization,
    #[serde(rename = "age")]
    Age,
    #[serde(rename = "NumberOfTime3059DaysPastDueNotWorse")]
    Late30To59Days,
    #[serde(rename = "DebtRatio")]
    DebtRatio,
    #[serde(rename = "MonthlyIncome")]
    MonthlyIncome,
    #[serde(rename = "NumberOfOpenCreditLinesAndLoans")]
    OpenCreditLines,
    #[serde(rename = "NumberOfTimes90DaysLate")]
    Late90Days,
    #[serde(rename = "NumberRealEstateLoansOrLines")]
    RealEstateLoans,
    #[serde(rename = "NumberOfTime6089DaysPastDueNotWorse")]
    Late60To89Days,
    #[serde(rename = "NumberOfDependents")]
    Dependents,
}

impl FeatureField {
    /// Wire order expected by the scoring model.
    pub const ALL: [FeatureField; 10] = [
        FeatureField::RevolvingUtilization,
        FeatureField::Age,
        FeatureField::Late30To59Days,
        FeatureField::DebtRatio,
        FeatureField::MonthlyIncome,
        FeatureField::OpenCreditLines,
        FeatureField::Late90Days,
        FeatureField::RealEstateLoans,
        FeatureField::Late60To89Days,
        FeatureField::Dependents,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            FeatureField::RevolvingUtilization => "RevolvingUtilizationOfUnsecuredLines",
            FeatureField::Age => "age",
            FeatureField::Late30To59Days => "NumberOfTime3059DaysPastDueNotWorse",
            FeatureField::DebtRatio => "DebtRatio",
            FeatureField::MonthlyIncome => "MonthlyIncome",
            FeatureField::OpenCreditLines => "NumberOfOpenCreditLinesAndLoans",
            FeatureField::Late90Days => "NumberOfTimes90DaysLate",
            FeatureField::RealEstateLoans => "NumberRealEstateLoansOrLines",
            FeatureField::Late60To89Days => "NumberOfTime6089DaysPastDueNotWorse",
            FeatureField::Dependents => "NumberOfDependents",
        }
    }

    /// Column name used by the training dataset, where it differs from the wire name.
    pub fn dataset_alias(self) -> Option<&'static str> {
        match self {
            FeatureField::Late30To59Days => Some("NumberOfTime30-59DaysPastDueNotWorse"),
            FeatureField::Late60To89Days => Some("NumberOfTime60-89DaysPastDueNotWorse"),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeatureField::RevolvingUtilization => "Credit Utilization (0-1)",
            FeatureField::Age => "Age",
            FeatureField::Late30To59Days => "Late Payments (30-59 days)",
            FeatureField::DebtRatio => "Debt Ratio (Monthly Debt/Income)",
            FeatureField::MonthlyIncome => "Monthly Income ($)",
            FeatureField::OpenCreditLines => "Open Credit Lines",
            FeatureField::Late90Days => "Late Payments (90+ days)",
            FeatureField::RealEstateLoans => "Real Estate Loans",
            FeatureField::Late60To89Days => "Late Payments (60-89 days)",
            FeatureField::Dependents => "Dependents",
        }
    }

    /// Resolve a wire name or dataset alias. Matching is exact apart from surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.wire_name() == name || field.dataset_alias() == Some(name))
    }
}

impl fmt::Display for FeatureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Canonical applicant attribute set.
///
/// Values are plain `f64`s so out-of-range inputs survive untouched; edits go through
/// [`FeatureVector::with`] and produce a fresh vector rather than mutating a shared one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FeatureVector {
    #[serde(rename = "RevolvingUtilizationOfUnsecuredLines")]
    pub revolving_utilization: f64,
    #[serde(rename = "age")]
    pub age: f64,
    #[serde(rename = "NumberOfTime3059DaysPastDueNotWorse")]
    pub late_30_59_days: f64,
    #[serde(rename = "DebtRatio")]
    pub debt_ratio: f64,
    #[serde(rename = "MonthlyIncome")]
    pub monthly_income: f64,
    #[serde(rename = "NumberOfOpenCreditLinesAndLoans")]
    pub open_credit_lines: f64,
    #[serde(rename = "NumberOfTimes90DaysLate")]
    pub late_90_days: f64,
    #[serde(rename = "NumberRealEstateLoansOrLines")]
    pub real_estate_loans: f64,
    #[serde(rename = "NumberOfTime6089DaysPastDueNotWorse")]
    pub late_60_89_days: f64,
    #[serde(rename = "NumberOfDependents")]
    pub dependents: f64,
}

impl FeatureVector {
    /// Starting point of the intake form.
    pub fn intake_default() -> Self {
        Self {
            revolving_utilization: 0.05,
            age: 35.0,
            late_30_59_days: 0.0,
            debt_ratio: 0.2,
            monthly_income: 5000.0,
            open_credit_lines: 5.0,
            late_90_days: 0.0,
            real_estate_loans: 1.0,
            late_60_89_days: 0.0,
            dependents: 1.0,
        }
    }

    /// Starting point of the live what-if simulator.
    pub fn simulator_default() -> Self {
        Self {
            revolving_utilization: 0.3,
            age: 40.0,
            late_30_59_days: 0.0,
            debt_ratio: 0.4,
            monthly_income: 5000.0,
            open_credit_lines: 8.0,
            late_90_days: 0.0,
            real_estate_loans: 1.0,
            late_60_89_days: 0.0,
            dependents: 1.0,
        }
    }

    pub fn get(&self, field: FeatureField) -> f64 {
        match field {
            FeatureField::RevolvingUtilization => self.revolving_utilization,
            FeatureField::Age => self.age,
            FeatureField::Late30To59Days => self.late_30_59_days,
            FeatureField::DebtRatio => self.debt_ratio,
            FeatureField::MonthlyIncome => self.monthly_income,
            FeatureField::OpenCreditLines => self.open_credit_lines,
            FeatureField::Late90Days => self.late_90_days,
            FeatureField::RealEstateLoans => self.real_estate_loans,
            FeatureField::Late60To89Days => self.late_60_89_days,
            FeatureField::Dependents => self.dependents,
        }
    }

    /// Copy of this vector with one field replaced. NaN and infinities become zero.
    pub fn with(&self, field: FeatureField, value: f64) -> Self {
        let mut next = *self;
        *next.slot(field) = if value.is_finite() { value } else { 0.0 };
        next
    }

    /// Copy of this vector with one field replaced from raw user input.
    ///
    /// Unparseable or non-finite input becomes zero, the same as the intake form.
    pub fn with_input(&self, field: FeatureField, raw: &str) -> Self {
        self.with(field, coerce_input(raw))
    }

    /// Build a vector from a loose name/value map. Missing or non-numeric entries are zero.
    pub fn from_values(values: &HashMap<String, Value>) -> Self {
        let mut vector = Self::default();
        for field in FeatureField::ALL {
            let raw = values.get(field.wire_name()).or_else(|| {
                field
                    .dataset_alias()
                    .and_then(|alias| values.get(alias))
            });
            *vector.slot(field) = raw.map(coerce_value).unwrap_or(0.0);
        }
        vector
    }

    pub fn fields(&self) -> impl Iterator<Item = (FeatureField, f64)> + '_ {
        FeatureField::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }

    fn slot(&mut self, field: FeatureField) -> &mut f64 {
        match field {
            FeatureField::RevolvingUtilization => &mut self.revolving_utilization,
            FeatureField::Age => &mut self.age,
            FeatureField::Late30To59Days => &mut self.late_30_59_days,
            FeatureField::DebtRatio => &mut self.debt_ratio,
            FeatureField::MonthlyIncome => &mut self.monthly_income,
            FeatureField::OpenCreditLines => &mut self.open_credit_lines,
            FeatureField::Late90Days => &mut self.late_90_days,
            FeatureField::RealEstateLoans => &mut self.real_estate_loans,
            FeatureField::Late60To89Days => &mut self.late_60_89_days,
            FeatureField::Dependents => &mut self.dependents,
        }
    }
}

impl<'de> Deserialize<'de> for FeatureVector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = HashMap::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_values(&values))
    }
}

/// Parse free-form numeric input, falling back to zero.
pub fn coerce_input(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            debug!(input = raw, "coercing unparseable feature input to zero");
            0.0
        }
    }
}

fn coerce_value(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number
            .as_f64()
            .filter(|value| value.is_finite())
            .unwrap_or(0.0),
        Value::String(raw) => coerce_input(raw),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_wire_payload() {
        let vector: FeatureVector = serde_json::from_value(json!({
            "RevolvingUtilizationOfUnsecuredLines": 0.35,
            "age": 52,
            "NumberOfTime3059DaysPastDueNotWorse": 1,
            "DebtRatio": 0.5,
            "MonthlyIncome": 7200,
            "NumberOfOpenCreditLinesAndLoans": 9,
            "NumberOfTimes90DaysLate": 2,
            "NumberRealEstateLoansOrLines": 1,
            "NumberOfTime6089DaysPastDueNotWorse": 0,
            "NumberOfDependents": 3
        }))
        .expect("payload parses");

        assert_eq!(vector.revolving_utilization, 0.35);
        assert_eq!(vector.age, 52.0);
        assert_eq!(vector.late_90_days, 2.0);
        assert_eq!(vector.dependents, 3.0);
    }

    #[test]
    fn missing_and_malformed_fields_become_zero() {
        let vector: FeatureVector = serde_json::from_value(json!({
            "DebtRatio": "0.42",
            "age": "forty",
            "MonthlyIncome": null,
            "NumberOfTime30-59DaysPastDueNotWorse": 2,
            "NumberOfTimes90DaysLate": true,
            "NumberOfDependents": false
        }))
        .expect("payload parses");

        assert_eq!(vector.debt_ratio, 0.42);
        assert_eq!(vector.age, 0.0);
        assert_eq!(vector.monthly_income, 0.0);
        assert_eq!(vector.late_30_59_days, 2.0);
        assert_eq!(vector.revolving_utilization, 0.0);
        assert_eq!(vector.late_90_days, 0.0);
        assert_eq!(vector.dependents, 0.0);
    }

    #[test]
    fn serializes_every_field_by_wire_name() {
        let value = serde_json::to_value(FeatureVector::intake_default()).expect("serializes");
        let object = value.as_object().expect("object payload");
        assert_eq!(object.len(), 10);
        for field in FeatureField::ALL {
            assert!(object.contains_key(field.wire_name()), "missing {field}");
        }
    }

    #[test]
    fn edits_produce_new_vectors() {
        let base = FeatureVector::simulator_default();
        let edited = base.with(FeatureField::DebtRatio, 0.9);

        assert_eq!(base.debt_ratio, 0.4);
        assert_eq!(edited.debt_ratio, 0.9);
        assert_eq!(edited.with_input(FeatureField::Age, "abc").age, 0.0);
        assert_eq!(edited.with_input(FeatureField::Age, " 61 ").age, 61.0);
        assert_eq!(edited.with_input(FeatureField::Age, "inf").age, 0.0);
        assert_eq!(edited.with(FeatureField::DebtRatio, f64::NAN).debt_ratio, 0.0);
        assert_eq!(
            edited.with(FeatureField::MonthlyIncome, f64::INFINITY).monthly_income,
            0.0
        );
    }

    #[test]
    fn resolves_dataset_aliases() {
        assert_eq!(
            FeatureField::from_name("NumberOfTime60-89DaysPastDueNotWorse"),
            Some(FeatureField::Late60To89Days)
        );
        assert_eq!(FeatureField::from_name("age"), Some(FeatureField::Age));
        assert_eq!(FeatureField::from_name("SeriousDlqin2yrs"), None);
    }
}
