use crate::split::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_FILE: &str = "round2.xlsx";
pub const DEFAULT_PERCENTAGE: u32 = 10;

/// The configuration of a run, as read from a JSON file.
///
/// Every field is optional: the command line flags may provide or override
/// any of them.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(rename = "inputFile")]
    pub input_file: Option<String>,
    pub provider: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub percentage: Option<u32>,
    #[serde(rename = "reviewerSuffix")]
    pub reviewer_suffix: Option<String>,
    pub policy: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<JSValue>,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
    #[serde(rename = "summaryFile")]
    pub summary_file: Option<String>,
}

/// The configuration section of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub input: Option<String>,
    pub percentage: u32,
    #[serde(rename = "reviewerSuffix")]
    pub reviewer_suffix: String,
    pub policy: String,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<u64>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputProvider {
    Excel,
    Csv,
}

impl SplitConfig {
    /// The provider named in the configuration, or the one matching the
    /// extension of the input file.
    pub fn provider(&self) -> SplitResult<InputProvider> {
        match self.provider.as_deref() {
            Some("excel") | Some("xlsx") | Some("xls") | Some("ods") => Ok(InputProvider::Excel),
            Some("csv") => Ok(InputProvider::Csv),
            Some(x) => whatever!("Provider not implemented {:?}", x),
            None => {
                let is_csv = self
                    .input_file
                    .as_deref()
                    .and_then(|p| Path::new(p).extension())
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false);
                if is_csv {
                    Ok(InputProvider::Csv)
                } else {
                    Ok(InputProvider::Excel)
                }
            }
        }
    }

    pub fn random_seed(&self) -> SplitResult<Option<u64>> {
        match &self.random_seed {
            None | Some(JSValue::Null) => Ok(None),
            x => read_js_int(x).map(Some),
        }
    }

    pub fn output_file(&self) -> String {
        self.output_file
            .clone()
            .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string())
    }

    // Paths in a configuration file are relative to that file.
    fn resolve_paths(self, root: &Path) -> SplitConfig {
        let resolve = |p: Option<String>| {
            p.map(|s| {
                if s == "stdout" || Path::new(&s).is_absolute() {
                    s
                } else {
                    let full: PathBuf = [root, Path::new(&s)].iter().collect();
                    full.display().to_string()
                }
            })
        };
        SplitConfig {
            input_file: resolve(self.input_file),
            output_file: resolve(self.output_file),
            summary_file: resolve(self.summary_file),
            ..self
        }
    }
}

pub fn policy_name(policy: SelectionPolicy) -> &'static str {
    match policy {
        SelectionPolicy::UniqueItems => "uniqueItems",
        SelectionPolicy::PerReviewerPercentage => "perReviewerPercentage",
        SelectionPolicy::NewestRecordWins => "newestRecordWins",
    }
}

pub fn validate_rules(config: &SplitConfig) -> SplitResult<AssignmentRules> {
    let policy = match config.policy.as_deref() {
        None | Some("uniqueItems") => SelectionPolicy::UniqueItems,
        Some("perReviewerPercentage") => SelectionPolicy::PerReviewerPercentage,
        Some("newestRecordWins") => SelectionPolicy::NewestRecordWins,
        Some(x) => {
            whatever!(
                "Cannot use selection policy {:?}: expected uniqueItems, perReviewerPercentage or newestRecordWins",
                x
            )
        }
    };
    let rules = AssignmentRules {
        percentage: config.percentage.unwrap_or(DEFAULT_PERCENTAGE),
        reviewer_suffix: config
            .reviewer_suffix
            .clone()
            .unwrap_or_else(|| DEFAULT_REVIEWER_SUFFIX.to_string()),
        policy,
    };
    rules.validate().context(AssignmentSnafu {})?;
    Ok(rules)
}

pub fn read_config(path: &str) -> BSplitResult<SplitConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SplitConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    let root = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
    Ok(config.resolve_paths(root))
}

pub fn read_summary(path: &str) -> BSplitResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> SplitResult<u64> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().context(ParsingJsonNumberSnafu {
            content: n.to_string(),
        }),
        Some(JSValue::String(s)) => s.trim().parse::<u64>().ok().context(ParsingJsonNumberSnafu {
            content: s.clone(),
        }),
        x => None.context(ParsingJsonNumberSnafu {
            content: format!("{:?}", x),
        }),
    }
}
