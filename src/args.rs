use clap::Parser;

/// This program selects a percentage of the reviewed items in a spreadsheet and splits them
/// between the reviewers of the organization.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the run. Paths inside it are relative to
    /// its location. All the other options override what it contains.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The spreadsheet (.xlsx, .xls, .ods) or CSV file with the review records.
    /// It must have the columns 'Item ID' and 'Reviewer'.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (excel or csv, default inferred from the file extension) The type of the input.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (1 to 100, default 10) The percentage of the unique items to select.
    #[clap(short, long, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub percentage: Option<u32>,

    /// (default snowcorp.com) Only the reviewers ending with this suffix receive items.
    #[clap(long, value_parser)]
    pub reviewer_suffix: Option<String>,

    /// (uniqueItems, perReviewerPercentage or newestRecordWins, default uniqueItems) How the
    /// items are selected. The last two reproduce the behaviour of older exports.
    #[clap(long, value_parser)]
    pub policy: Option<String>,

    /// (integer, optional) Seed of the random generator. Runs with the same seed and the same
    /// input give the same assignments.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (file path, default round2.xlsx) Where to write the assignments. A .csv extension
    /// writes a CSV file, anything else an Excel workbook.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the summary of the run in JSON format.
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, reviewsplit will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
