//! Pulse CLI - Command-line interface for coursepulse
//!
//! Commands:
//! - window: Compute the sliding window indicator
//! - cohort: Compute per-student active-action lists
//! - scores: Compute signed participation scores
//! - grades: Compute grades on gradable active activities
//! - validate: Validate statement input and report its shape

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use coursepulse::config::{
    DEFAULT_ACTIVE_ACTIONS_MIN, DEFAULT_DYNAMIC_COHORT_MIN, DEFAULT_SLIDING_WINDOW_MIN,
};
use coursepulse::statement::{parse_ndjson, parse_statements, RawStatement, SCHEMA_VERSION};
use coursepulse::{
    EngineConfig, IndicatorError, IndicatorProcessor, StaticCourseIndex, StaticEventStore,
    PRODUCER_NAME, PULSE_VERSION,
};

/// Course id assumed when the input is not tied to an indexed course
const DEFAULT_COURSE_ID: &str = "course:input";

/// Pulse - Compute engagement indicators from course activity statements
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version = PULSE_VERSION)]
#[command(about = "Compute engagement indicators from course activity statements", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the sliding window indicator
    Window {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        course: CourseArgs,
    },

    /// Compute per-student active-action lists
    Cohort {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        course: CourseArgs,

        /// Restrict the output to one student
        #[arg(long)]
        student: Option<String>,
    },

    /// Compute signed participation scores on active actions
    Scores {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        course: CourseArgs,

        /// Restrict the output to one student
        #[arg(long)]
        student: Option<String>,

        /// Compute per-action score totals (cohort requests only)
        #[arg(long)]
        totals: bool,

        /// Compute per-action score averages (cohort requests only)
        #[arg(long)]
        average: bool,
    },

    /// Compute grades on gradable active activities
    Grades {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        course: CourseArgs,

        /// Restrict the output to one student
        #[arg(long)]
        student: Option<String>,

        /// Compute per-activity grade averages (cohort requests only)
        #[arg(long)]
        average: bool,
    },

    /// Validate statement input and report its shape
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input statements file (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "ndjson")]
    input_format: InputFormat,
}

#[derive(Args)]
struct CourseArgs {
    /// Course identifier; without it the input is treated as one course
    /// spanning every action it contains
    #[arg(long)]
    course: Option<String>,

    /// Cutoff date (YYYY-MM-DD, default: today)
    #[arg(long)]
    until: Option<NaiveDate>,

    /// Minimum window width in days
    #[arg(long, default_value_t = DEFAULT_SLIDING_WINDOW_MIN)]
    window_min: u32,

    /// Minimum number of active actions
    #[arg(long, default_value_t = DEFAULT_ACTIVE_ACTIONS_MIN)]
    actions_min: usize,

    /// Minimum dynamic cohort size
    #[arg(long, default_value_t = DEFAULT_DYNAMIC_COHORT_MIN)]
    cohort_min: usize,

    /// Preferred display-name language tag
    #[arg(long)]
    language: Option<String>,

    /// Pretty-print output (default when stdout is a TTY)
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one statement per line)
    Ndjson,
    /// JSON array of statements
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Window { input, course } => {
            let statements = load_statements(&input)?;
            let (mut processor, course_id) = build_processor(statements, &course);
            let result = processor.window(&course_id, course.until)?;
            emit("window", &course_id, &result, pretty(&course))
        }

        Commands::Cohort {
            input,
            course,
            student,
        } => {
            let statements = load_statements(&input)?;
            let (mut processor, course_id) = build_processor(statements, &course);
            let result = processor.cohort(&course_id, course.until, student.as_deref())?;
            emit("cohort", &course_id, &result, pretty(&course))
        }

        Commands::Scores {
            input,
            course,
            student,
            totals,
            average,
        } => {
            let statements = load_statements(&input)?;
            let (mut processor, course_id) = build_processor(statements, &course);
            let result = processor.scores(
                &course_id,
                course.until,
                student.as_deref(),
                totals,
                average,
            )?;
            emit("scores", &course_id, &result, pretty(&course))
        }

        Commands::Grades {
            input,
            course,
            student,
            average,
        } => {
            let statements = load_statements(&input)?;
            let (mut processor, course_id) = build_processor(statements, &course);
            let result =
                processor.grades(&course_id, course.until, student.as_deref(), average)?;
            emit("grades", &course_id, &result, pretty(&course))
        }

        Commands::Validate { input, json } => cmd_validate(&input, json),
    }
}

/// Read the raw input, honoring `-` for stdin
fn read_input(input: &PathBuf) -> Result<String, PulseCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_statements(input: &InputArgs) -> Result<Vec<RawStatement>, PulseCliError> {
    let data = read_input(&input.input)?;
    let statements = match input.input_format {
        InputFormat::Ndjson => parse_ndjson(&data)?,
        InputFormat::Json => parse_statements(&data)?,
    };
    Ok(statements)
}

fn build_processor(
    statements: Vec<RawStatement>,
    args: &CourseArgs,
) -> (
    IndicatorProcessor<StaticEventStore, StaticCourseIndex>,
    String,
) {
    let store = StaticEventStore::new(statements);
    let course_id = args
        .course
        .clone()
        .unwrap_or_else(|| DEFAULT_COURSE_ID.to_string());
    let index = StaticCourseIndex::single_course(course_id.clone(), store.action_iris());

    let mut config =
        EngineConfig::with_thresholds(args.window_min, args.actions_min, args.cohort_min);
    if let Some(language) = &args.language {
        config = config.with_preferred_language(language.clone());
    }

    (
        IndicatorProcessor::with_config(store, index, config),
        course_id,
    )
}

fn pretty(args: &CourseArgs) -> bool {
    args.pretty || atty::is(atty::Stream::Stdout)
}

/// Print the indicator wrapped in a producer envelope
fn emit<T: serde::Serialize>(
    indicator: &'static str,
    course_id: &str,
    result: &T,
    pretty: bool,
) -> Result<(), PulseCliError> {
    let envelope = Envelope {
        producer: Producer::current(),
        indicator,
        course_id,
        result,
    };
    let output = if pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    println!("{}", output);
    Ok(())
}

fn cmd_validate(input: &InputArgs, json: bool) -> Result<(), PulseCliError> {
    let statements = load_statements(input)?;

    let actions: BTreeSet<&str> = statements.iter().map(|s| s.object.id.as_str()).collect();
    let students: BTreeSet<&str> = statements
        .iter()
        .map(|s| s.actor.account.name.as_str())
        .collect();
    let graded = statements.iter().filter(|s| s.score().is_some()).count();

    let report = ValidationReport {
        schema: SCHEMA_VERSION,
        total_statements: statements.len(),
        distinct_actions: actions.len(),
        distinct_students: students.len(),
        graded_statements: graded,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Schema:              {}", report.schema);
        println!("Total statements:    {}", report.total_statements);
        println!("Distinct actions:    {}", report.distinct_actions);
        println!("Distinct students:   {}", report.distinct_students);
        println!("Graded statements:   {}", report.graded_statements);
    }

    if report.total_statements == 0 {
        return Err(PulseCliError::NoStatements);
    }
    Ok(())
}

// Envelope types

#[derive(serde::Serialize)]
struct Producer {
    name: &'static str,
    version: &'static str,
    instance_id: String,
}

impl Producer {
    fn current() -> Self {
        Self {
            name: PRODUCER_NAME,
            version: PULSE_VERSION,
            instance_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[derive(serde::Serialize)]
struct Envelope<'a, T: serde::Serialize> {
    producer: Producer,
    indicator: &'static str,
    course_id: &'a str,
    result: &'a T,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    schema: &'static str,
    total_statements: usize,
    distinct_actions: usize,
    distinct_students: usize,
    graded_statements: usize,
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Indicator(IndicatorError),
    Json(serde_json::Error),
    NoStatements,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<IndicatorError> for PulseCliError {
    fn from(e: IndicatorError) -> Self {
        PulseCliError::Indicator(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::NoStatements => CliError {
                code: "NO_STATEMENTS".to_string(),
                message: "No statements found in input".to_string(),
                hint: Some("Ensure the input file is not empty".to_string()),
            },
            PulseCliError::Indicator(e) => {
                let code = match &e {
                    IndicatorError::NoStatements(_) => "NO_STATEMENTS",
                    IndicatorError::InsufficientTimeSpread { .. } => "INSUFFICIENT_TIME_SPREAD",
                    IndicatorError::InsufficientActionDiversity { .. } => {
                        "INSUFFICIENT_ACTION_DIVERSITY"
                    }
                    IndicatorError::InsufficientCohortSize { .. } => "INSUFFICIENT_COHORT_SIZE",
                    IndicatorError::AmbiguousGrade { .. } => "AMBIGUOUS_GRADE",
                    IndicatorError::EventSourceUnavailable(_) => "EVENT_SOURCE_UNAVAILABLE",
                    IndicatorError::UnknownCourse(_) => "UNKNOWN_COURSE",
                    IndicatorError::NoCourseContent(_) => "NO_COURSE_CONTENT",
                    IndicatorError::ParseError(_) => "PARSE_ERROR",
                    IndicatorError::JsonError(_) => "JSON_ERROR",
                };
                let hint = match &e {
                    IndicatorError::InsufficientTimeSpread { .. } => {
                        Some("Wait for statements to spread over more days".to_string())
                    }
                    IndicatorError::InsufficientActionDiversity { .. } => {
                        Some("Broaden the course content".to_string())
                    }
                    IndicatorError::InsufficientCohortSize { .. } => {
                        Some("Wait for more students to participate".to_string())
                    }
                    IndicatorError::AmbiguousGrade { .. } => {
                        Some("Deduplicate graded statements upstream".to_string())
                    }
                    _ => None,
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint,
                }
            }
        }
    }
}
