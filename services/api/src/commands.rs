use crate::infra::{
    apply_assignments, format_percent, parse_assignment, scoring_client, FeatureAssignment,
};
use clap::{Args, ValueEnum};
use credit_coach::config::AppConfig;
use credit_coach::error::AppError;
use credit_coach::simulation::{
    ApplicantCsvReader, ApplicantRow, Assessment, CoachingPlan, CreditCoach, FeatureField,
    FeatureVector, Projection, SchedulerSettings, ScoringResult, SessionSnapshot, SessionUpdate,
    SimulationSession,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct CoachArgs {
    /// JSON file with one applicant's features keyed by wire name
    #[arg(long, conflicts_with = "csv")]
    pub(crate) input: Option<PathBuf>,
    /// CSV batch using the dataset column names; every row is assessed
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Override a feature, e.g. --set DebtRatio=0.55 (repeatable)
    #[arg(long = "set", value_parser = parse_assignment)]
    pub(crate) set: Vec<FeatureAssignment>,
    /// Print assessments as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
    /// Override the prediction service base URL
    #[arg(long)]
    pub(crate) scoring_url: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct SimulateArgs {
    /// Starting vector
    #[arg(long, value_enum, default_value_t = Preset::Simulator)]
    pub(crate) preset: Preset,
    /// Edit to replay, e.g. --set MonthlyIncome=6500 (repeatable, applied in order)
    #[arg(long = "set", value_parser = parse_assignment)]
    pub(crate) set: Vec<FeatureAssignment>,
    /// Pause between edits. Edits closer together than the debounce window collapse into one request.
    #[arg(long)]
    pub(crate) pause_ms: Option<u64>,
    /// Reset to the starting vector once the edits have been scored
    #[arg(long)]
    pub(crate) reset: bool,
    /// Override the configured debounce window
    #[arg(long)]
    pub(crate) debounce_ms: Option<u64>,
    /// Override the prediction service base URL
    #[arg(long)]
    pub(crate) scoring_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchAssessment<'a> {
    id: &'a str,
    assessment: &'a Assessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Preset {
    /// Intake form defaults
    Intake,
    /// What-if simulator defaults
    Simulator,
}

impl Preset {
    fn vector(self) -> FeatureVector {
        match self {
            Preset::Intake => FeatureVector::intake_default(),
            Preset::Simulator => FeatureVector::simulator_default(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Preset::Intake => "intake",
            Preset::Simulator => "simulator",
        }
    }
}

pub(crate) async fn run_coach(args: CoachArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let client = scoring_client(&config.scoring, args.scoring_url.clone())?;
    let coach = CreditCoach::new(client);

    let batch = args.csv.is_some();
    let applicants = load_applicants(&args)?;
    let total = applicants.len();
    let mut failures = 0usize;

    for applicant in applicants {
        match coach.assess(applicant.features).await {
            Ok(assessment) if args.json => {
                let rendered = if batch {
                    serde_json::to_string_pretty(&BatchAssessment {
                        id: &applicant.id,
                        assessment: &assessment,
                    })?
                } else {
                    serde_json::to_string_pretty(&assessment)?
                };
                println!("{rendered}");
            }
            Ok(assessment) => render_assessment(&applicant.id, &assessment),
            Err(err) if batch => {
                failures += 1;
                println!("Applicant {}: {} ({err})", applicant.id, err.banner());
            }
            Err(err) => return Err(err.into()),
        }
    }

    if batch && !args.json {
        println!("\nAssessed {total} applicants ({failures} failed)");
    }

    Ok(())
}

pub(crate) async fn run_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let client = scoring_client(&config.scoring, args.scoring_url.clone())?;

    let mut settings = SchedulerSettings::from_config(&config.simulation);
    if let Some(debounce_ms) = args.debounce_ms.filter(|value| *value > 0) {
        settings.debounce = Duration::from_millis(debounce_ms);
    }
    let wait = settings.debounce + config.scoring.timeout();

    println!(
        "What-if simulation from the {} preset (debounce {} ms)",
        args.preset.name(),
        settings.debounce.as_millis()
    );
    let mut session = SimulationSession::start(client, args.preset.vector(), settings);
    settle(&mut session, wait).await;

    for assignment in &args.set {
        let vector = session.edit_input(assignment.field, &assignment.raw);
        println!(
            "  edit {} -> {}",
            assignment.field.label(),
            vector.get(assignment.field)
        );
        if let Some(pause_ms) = args.pause_ms {
            tokio::time::sleep(Duration::from_millis(pause_ms)).await;
            for update in session.drain() {
                render_update(&update);
            }
        }
    }
    settle(&mut session, wait).await;

    if args.reset {
        session.reset();
        println!("  reset to the {} preset", args.preset.name());
        settle(&mut session, wait).await;
    }

    render_snapshot(&session.snapshot());
    session.stop();
    Ok(())
}

fn load_applicants(args: &CoachArgs) -> Result<Vec<ApplicantRow>, AppError> {
    let rows = if let Some(path) = &args.csv {
        ApplicantCsvReader::from_path(path)?
    } else if let Some(path) = &args.input {
        let raw = std::fs::read_to_string(path)?;
        let features: FeatureVector = serde_json::from_str(&raw)?;
        vec![ApplicantRow {
            id: applicant_id(path),
            features,
        }]
    } else {
        vec![ApplicantRow {
            id: "intake-default".to_string(),
            features: FeatureVector::intake_default(),
        }]
    };

    Ok(rows
        .into_iter()
        .map(|row| ApplicantRow {
            features: apply_assignments(row.features, &args.set),
            ..row
        })
        .collect())
}

fn applicant_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("applicant")
        .to_string()
}

async fn settle(session: &mut SimulationSession, wait: Duration) {
    while !session.is_settled() {
        match tokio::time::timeout(wait, session.next_update()).await {
            Ok(Some(update)) => render_update(&update),
            Ok(None) => break,
            Err(_) => {
                println!("  no response within {} ms", wait.as_millis());
                break;
            }
        }
    }
}

fn render_update(update: &SessionUpdate) {
    match update {
        SessionUpdate::Scored {
            sequence,
            probability,
        } => println!("  #{sequence} scored {}", format_percent(*probability)),
        SessionUpdate::Failed { sequence, message } => println!("  #{sequence} {message}"),
    }
}

fn render_result(result: &ScoringResult) {
    println!(
        "  Decision: {} ({} risk, {} default probability, risk index {:.0})",
        result.decision.label(),
        result.risk_category.label(),
        format_percent(result.default_probability),
        result.risk_index
    );
    if !result.top_risk_factors.is_empty() {
        println!("  Top risk factors:");
        for factor in &result.top_risk_factors {
            let name = FeatureField::from_name(&factor.feature)
                .map(FeatureField::label)
                .unwrap_or(factor.feature.as_str());
            println!("    - {name} ({:+.3})", factor.impact);
        }
    }
    if !result.explanation.is_empty() {
        println!("  {}", result.explanation);
    }
}

fn render_plan(plan: &CoachingPlan) {
    if plan.suggestions.is_empty() {
        println!("  No counterfactual adjustments apply to this profile.");
        return;
    }

    println!("  Path to approval:");
    for (position, suggestion) in plan.suggestions.iter().enumerate() {
        println!(
            "    {}. {}: {} ({} {} -> {})",
            position + 1,
            suggestion.label,
            suggestion.action,
            suggestion.field.label(),
            suggestion.current,
            suggestion.target
        );
    }

    match &plan.projection {
        Projection::Available { improvement, .. } => {
            let label = improvement
                .label
                .map(|label| format!(" [{}]", label.label()))
                .unwrap_or_default();
            println!(
                "  Projected: {} -> {} ({}){label}",
                format_percent(improvement.baseline_probability),
                format_percent(improvement.adjusted_probability),
                improvement.adjusted_decision.label()
            );
        }
        Projection::Unavailable { reason } => {
            println!("  Projection unavailable: {reason}");
        }
        Projection::NotNeeded => {}
    }
}

fn render_assessment(id: &str, assessment: &Assessment) {
    println!("Applicant {id}");
    render_result(&assessment.baseline);
    if let Some(plan) = &assessment.coaching {
        render_plan(plan);
    }
    println!();
}

fn render_snapshot(snapshot: &SessionSnapshot) {
    println!("\nFinal features:");
    for (field, value) in snapshot.features.fields() {
        println!("  {:<34} {value}", field.label());
    }

    if let Some(result) = &snapshot.result {
        match snapshot.updated_at {
            Some(updated_at) => println!(
                "Latest result (updated {}):",
                updated_at.format("%H:%M:%S UTC")
            ),
            None => println!("Latest result:"),
        }
        render_result(result);
    }
    if let Some(error) = &snapshot.error {
        println!("  {error}");
    }

    println!("Trend ({} samples):", snapshot.history.len());
    for sample in &snapshot.history {
        println!("  {:>2}. {}", sample.index, format_percent(sample.probability));
    }
    if let Some(trend) = snapshot.trend {
        let direction = if trend < 0.0 {
            "improving"
        } else if trend > 0.0 {
            "worsening"
        } else {
            "flat"
        };
        println!("  change {:+.1} pts ({direction})", trend * 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applicant_id_uses_file_stem() {
        assert_eq!(applicant_id(Path::new("/tmp/jane-doe.json")), "jane-doe");
    }

    #[test]
    fn presets_map_to_named_vectors() {
        assert_eq!(Preset::Intake.vector(), FeatureVector::intake_default());
        assert_eq!(Preset::Simulator.vector(), FeatureVector::simulator_default());
    }

    #[test]
    fn overrides_apply_to_the_default_applicant() {
        let args = CoachArgs {
            input: None,
            csv: None,
            set: vec![parse_assignment("DebtRatio=0.61").unwrap()],
            json: false,
            scoring_url: None,
        };

        let applicants = load_applicants(&args).expect("applicants load");

        assert_eq!(applicants.len(), 1);
        assert_eq!(applicants[0].id, "intake-default");
        assert_eq!(applicants[0].features.debt_ratio, 0.61);
    }

    #[test]
    fn missing_csv_is_reported_as_intake_error() {
        let args = CoachArgs {
            input: None,
            csv: Some(PathBuf::from("/nonexistent/applicants.csv")),
            set: Vec::new(),
            json: false,
            scoring_url: None,
        };

        let error = load_applicants(&args).expect_err("file is missing");
        assert!(matches!(error, AppError::Intake(_)));
    }
}
