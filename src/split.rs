pub mod config_reader;
pub mod export;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;

use log::{debug, info, warn};

use review_assignment::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::split::config_reader::*;

#[derive(Debug, Snafu)]
pub enum SplitError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("The workbook {path} does not contain any worksheet"))]
    MissingWorksheet { path: String },
    #[snafu(display("The workbook {path} does not contain a worksheet named {name:?}"))]
    UnknownWorksheet { path: String, name: String },
    #[snafu(display("The sheet is empty, a header row is expected"))]
    EmptyExcel {},
    #[snafu(display("Line {lineno}: could not understand the content of cell {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Column {column:?} not found in the header row"))]
    MissingColumn { column: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a line of the CSV file"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a number, got {content}"))]
    ParsingJsonNumber { content: String },
    #[snafu(display("No input file: pass --input or set inputFile in the configuration"))]
    MissingInput {},
    #[snafu(display("Assignment failed: {source}"))]
    Assignment { source: AssignmentError },
    #[snafu(display("Error writing file {path}"))]
    WritingExcel {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SplitResult<T> = Result<T, SplitError>;
pub type BSplitResult<T> = Result<T, Box<SplitError>>;

fn result_to_json(res: &ProcessingResult) -> JSValue {
    let assignments: Vec<JSValue> = res
        .assignments
        .iter()
        .map(|a| json!({"reviewer": a.reviewer, "itemIds": a.item_ids}))
        .collect();
    json!({
        "totalItems": res.total_items,
        "uniqueItems": res.unique_items,
        "targetItems": res.target_items,
        "assignedItems": res.assigned_items(),
        "shortfall": res.shortfall(),
        "assignments": assignments
    })
}

fn build_summary_js(
    config: &SplitConfig,
    rules: &AssignmentRules,
    res: &ProcessingResult,
) -> JSValue {
    let c = OutputConfig {
        input: config
            .input_file
            .as_deref()
            .map(io_common::simplify_file_name),
        percentage: rules.percentage,
        reviewer_suffix: rules.reviewer_suffix.clone(),
        policy: policy_name(rules.policy).to_string(),
        random_seed: config.random_seed().ok().flatten(),
    };
    json!({
        "config": c,
        "results": result_to_json(res) })
}

fn read_review_data(path: &str, config: &SplitConfig) -> BSplitResult<Vec<ReviewRow>> {
    info!("Attempting to read review file {:?}", path);
    let rows = match config.provider()? {
        InputProvider::Excel => io_excel::read_excel_reviews(path, config)?,
        InputProvider::Csv => io_csv::read_csv_reviews(path)?,
    };
    info!("Read {} review rows from {:?}", rows.len(), path);
    Ok(rows)
}

fn check_reference(summary_p: &str, pretty_js_stats: &str) -> BSplitResult<()> {
    let summary_ref = read_summary(summary_p)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    let same = pretty_js_summary_ref == pretty_js_stats;
    if !same {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
    }
    ensure!(same, ReferenceMismatchSnafu {});
    info!("The summary matches the reference {:?}", summary_p);
    Ok(())
}

fn write_summary(summary_out: Option<&str>, pretty_js_stats: &str) -> BSplitResult<()> {
    match summary_out {
        None | Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(path, pretty_js_stats).context(WritingFileSnafu { path })?;
        }
    }
    Ok(())
}

/// Reads the reviews, runs the assignment and writes out the results.
///
/// When a reference summary is given, the computed summary must match it
/// exactly, otherwise nothing is exported.
pub fn run_assignment(
    config: &SplitConfig,
    check_summary_path: Option<&str>,
) -> BSplitResult<ProcessingResult> {
    info!("config: {:?}", config);
    let input_path = config.input_file.clone().context(MissingInputSnafu {})?;

    let rules = validate_rules(config)?;
    let rows = read_review_data(&input_path, config)?;

    let mut rng = match config.random_seed()? {
        Some(seed) => {
            debug!("Using random seed {}", seed);
            ChaCha8Rng::seed_from_u64(seed)
        }
        None => ChaCha8Rng::from_entropy(),
    };
    let result = assign_with_rules(&rows, &rules, &mut rng).context(AssignmentSnafu {})?;

    for a in result.assignments.iter() {
        info!("{}: {} items", a.reviewer, a.item_ids.len());
    }
    info!(
        "Assigned {} of {} unique items ({} rows)",
        result.assigned_items(),
        result.unique_items,
        result.total_items
    );

    let summary_js = build_summary_js(config, &rules, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    write_summary(config.summary_file.as_deref(), &pretty_js_stats)?;

    if let Some(summary_p) = check_summary_path {
        check_reference(summary_p, &pretty_js_stats)?;
    }

    // Always written, so that no export of a previous run is left behind.
    let output_path = config.output_file();
    if result.assigned_items() == 0 {
        warn!("No item assigned, {:?} only has the header", output_path);
    }
    export::write_assignments(&output_path, &result.assignments)?;

    Ok(result)
}

/// Builds the run configuration from the configuration file, if any, and the
/// command line flags. Flags take precedence.
pub fn run_with_args(args: &Args) -> BSplitResult<ProcessingResult> {
    let mut config = match args.config.as_deref() {
        Some(p) => read_config(p)?,
        None => SplitConfig::default(),
    };
    if args.input.is_some() {
        config.input_file = args.input.clone();
    }
    if args.input_type.is_some() {
        config.provider = args.input_type.clone();
    }
    if args.excel_worksheet_name.is_some() {
        config.excel_worksheet_name = args.excel_worksheet_name.clone();
    }
    if args.percentage.is_some() {
        config.percentage = args.percentage;
    }
    if args.reviewer_suffix.is_some() {
        config.reviewer_suffix = args.reviewer_suffix.clone();
    }
    if args.policy.is_some() {
        config.policy = args.policy.clone();
    }
    if let Some(seed) = args.seed {
        config.random_seed = Some(json!(seed));
    }
    if args.out.is_some() {
        config.output_file = args.out.clone();
    }
    if args.summary.is_some() {
        config.summary_file = args.summary.clone();
    }
    run_assignment(&config, args.reference.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    const REVIEWS_CSV: &str = "\
Review ID,Item ID,Reviewer,Review Updated At
r1,101,alice@snowcorp.com,2024-01-02
r2,102,alice@snowcorp.com,2024-01-03
r3,103,Bob@SnowCorp.com,2024-01-04
r4,101,bob@snowcorp.com,2024-01-05
r5,104,carol@example.com,2024-01-06
r6,105,bob@snowcorp.com,2024-01-07
r7,106,,2024-01-08
";

    fn setup(dir: &Path) -> PathBuf {
        let _ = env_logger::builder().is_test(true).try_init();
        let p = dir.join("reviews.csv");
        fs::write(&p, REVIEWS_CSV).unwrap();
        p
    }

    fn config_for(dir: &Path, input: &Path, seed: u64) -> SplitConfig {
        SplitConfig {
            input_file: Some(input.display().to_string()),
            percentage: Some(100),
            random_seed: Some(json!(seed)),
            output_file: Some(dir.join("round2.xlsx").display().to_string()),
            summary_file: Some(dir.join("summary.json").display().to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn runs_end_to_end_on_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = setup(dir.path());
        let config = config_for(dir.path(), &input, 3);

        let res = run_assignment(&config, None).unwrap();
        assert_eq!(res.total_items, 7);
        assert_eq!(res.unique_items, 6);
        assert_eq!(
            res.eligible_reviewers(),
            vec!["alice@snowcorp.com", "Bob@SnowCorp.com", "bob@snowcorp.com"]
        );
        // 6 unique items over 3 reviewers.
        assert!(res.assignments.iter().all(|a| a.item_ids.len() == 2));

        let summary: JSValue =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap())
                .unwrap();
        assert_eq!(summary["results"]["uniqueItems"], json!(6));
        assert_eq!(summary["results"]["shortfall"], json!(0));
        assert_eq!(summary["config"]["input"], json!("reviews.csv"));
        assert_eq!(summary["config"]["policy"], json!("uniqueItems"));
        assert!(dir.path().join("round2.xlsx").exists());
    }

    #[test]
    fn reference_summary_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let input = setup(dir.path());
        let config = config_for(dir.path(), &input, 11);
        run_assignment(&config, None).unwrap();
        let reference = dir.path().join("reference.json");
        fs::rename(dir.path().join("summary.json"), &reference).unwrap();
        let reference = reference.display().to_string();

        // Same seed, same summary.
        assert!(run_assignment(&config, Some(&reference)).is_ok());

        let other = SplitConfig {
            percentage: Some(50),
            ..config
        };
        let err = run_assignment(&other, Some(&reference)).unwrap_err();
        assert!(matches!(*err, SplitError::ReferenceMismatch {}));
    }

    #[test]
    fn no_eligible_reviewer_writes_only_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = setup(dir.path());
        let out = dir.path().join("round2.csv");
        let config = SplitConfig {
            reviewer_suffix: Some("nowhere.org".to_string()),
            output_file: Some(out.display().to_string()),
            ..config_for(dir.path(), &input, 0)
        };
        let res = run_assignment(&config, None).unwrap();
        assert!(res.assignments.is_empty());
        assert_eq!(res.total_items, 7);
        assert_eq!(fs::read_to_string(&out).unwrap(), "Reviewer,Item ID\n");
    }

    #[test]
    fn empty_slices_replace_the_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("reviews.csv");
        fs::write(
            &input,
            "Item ID,Reviewer\n\
             1,a@snowcorp.com\n\
             2,b@snowcorp.com\n\
             3,c@snowcorp.com\n\
             4,a@snowcorp.com\n\
             5,b@snowcorp.com\n",
        )
        .unwrap();
        let out = dir.path().join("round2.csv");
        let config = SplitConfig {
            output_file: Some(out.display().to_string()),
            ..config_for(dir.path(), &input, 4)
        };
        let res = run_assignment(&config, None).unwrap();
        assert_eq!(res.assigned_items(), 3);
        assert_eq!(fs::read_to_string(&out).unwrap().lines().count(), 4);

        // 2 selected items for 3 reviewers: every slice is empty.
        let config = SplitConfig {
            percentage: Some(50),
            ..config
        };
        let res = run_assignment(&config, None).unwrap();
        assert_eq!(res.eligible_reviewers().len(), 3);
        assert_eq!(res.assigned_items(), 0);
        assert_eq!(res.shortfall(), 2);
        assert_eq!(fs::read_to_string(&out).unwrap(), "Reviewer,Item ID\n");
    }

    #[test]
    fn missing_input_is_reported() {
        let err = run_assignment(&SplitConfig::default(), None).unwrap_err();
        assert!(matches!(*err, SplitError::MissingInput {}));
    }

    #[test]
    fn engine_errors_are_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("reviews.csv");
        fs::write(&input, "Item ID,Reviewer\n1,a@snowcorp.com\n,a@snowcorp.com\n").unwrap();
        let config = config_for(dir.path(), &input, 0);
        let err = run_assignment(&config, None).unwrap_err();
        match *err {
            SplitError::Assignment { source } => {
                assert_eq!(source, AssignmentError::MissingItemId { row: 2 })
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn flags_override_the_configuration_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = setup(dir.path());
        let config_path = dir.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"inputFile": "reviews.csv", "percentage": 100, "outputFile": "out.csv",
                "policy": "perReviewerPercentage", "randomSeed": "5"}"#,
        )
        .unwrap();
        let args = Args {
            config: Some(config_path.display().to_string()),
            input: None,
            input_type: None,
            excel_worksheet_name: None,
            percentage: Some(50),
            reviewer_suffix: None,
            policy: None,
            seed: None,
            out: None,
            summary: Some(dir.path().join("s.json").display().to_string()),
            reference: None,
            verbose: false,
        };
        let res = run_with_args(&args).unwrap();
        assert_eq!(input.file_name(), Some(std::ffi::OsStr::new("reviews.csv")));
        // alice: 2 rows, Bob: 1 row, bob: 2 rows, halved.
        let sizes: Vec<usize> = res.assignments.iter().map(|a| a.item_ids.len()).collect();
        assert_eq!(sizes, vec![1, 0, 1]);
        assert!(dir.path().join("out.csv").exists());
    }
}
