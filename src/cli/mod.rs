pub mod columns;
pub mod export;
pub mod load;
pub mod recent;
pub mod status;
pub mod template;
pub mod view;

use std::path::Path;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::error::{Result, SheetlensError};
use crate::loader::{load_file, parse_date};
use crate::models::{ChartType, Dataset, SortDirection, ViewSettings};
use crate::pipeline::ViewSpec;
use crate::settings::Settings;
use crate::store::{DatasetStore, SqliteStore};

#[derive(Parser)]
#[command(
    name = "sheetlens",
    version,
    about = "Filter, aggregate and summarize spreadsheet data."
)]
pub struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a CSV or workbook sheet and store it for later commands.
    Load {
        /// Path to a .csv, .tsv, .xlsx, .xls or .ods file
        file: String,
        /// Sheet to read (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,
        /// Name to store the dataset under (default: file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// List the sheets in a file.
    Sheets {
        file: String,
    },
    /// List a dataset's columns with their inferred kind.
    Columns {
        /// Stored dataset name or path to a file
        dataset: String,
    },
    /// Show filtered, sorted records a page at a time.
    View {
        /// Stored dataset name or path to a file
        dataset: String,
        #[command(flatten)]
        view: ViewArgs,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Records per page (default from settings)
        #[arg(long = "per-page")]
        per_page: Option<usize>,
    },
    /// Aggregate the value column by category.
    Chart {
        /// Stored dataset name or path to a file
        dataset: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Top category, extremes, a narrative summary and a chart suggestion.
    Insights {
        /// Stored dataset name or path to a file
        dataset: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Export the filtered records or a summary.
    Export {
        /// Stored dataset name or path to a file
        dataset: String,
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Output path (default: <data_dir>/exports/<name>-YYYY-MM-DD.<ext>)
        #[arg(long)]
        output: Option<String>,
    },
    /// Files written by `export`, oldest first.
    History,
    /// Recently loaded files.
    Recent {
        #[command(subcommand)]
        command: RecentCommands,
    },
    /// Saved view templates.
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Forget recent files, templates and export history.
    Reset,
    /// Show data directory and store statistics.
    Status,
    /// Show settings, or change and save them.
    Config {
        /// Directory holding the database and exports
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Categories charted when --top is not given (0 = all)
        #[arg(long = "top-n")]
        top_n: Option<usize>,
        /// Unpinned recent files kept
        #[arg(long = "recent-limit")]
        recent_limit: Option<usize>,
        /// Records per page in `view`
        #[arg(long = "rows-per-page")]
        rows_per_page: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum RecentCommands {
    /// List recent files, pinned first.
    List {
        /// Only names containing this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Pin a recent file so it is never evicted.
    Pin { name: String },
    /// Unpin a recent file.
    Unpin { name: String },
    /// Remove a recent file and its stored data.
    Remove { name: String },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Save the given view settings under a name.
    Save {
        name: String,
        #[command(flatten)]
        view: ViewArgs,
        /// bar, line or pie
        #[arg(long = "chart-type")]
        chart_type: Option<ChartType>,
        /// Chart title
        #[arg(long)]
        title: Option<String>,
    },
    /// List saved templates.
    List,
    /// Print a template as JSON.
    Show { name: String },
    /// Delete a template.
    Remove { name: String },
    /// Write a template's settings to a JSON file.
    Export {
        name: String,
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Pdf,
    SummaryPdf,
}

impl ExportFormat {
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Pdf => "PDF",
            ExportFormat::SummaryPdf => "Summary PDF",
        }
    }
}

/// Axis, filter, sort and Top-N options shared by the analysis commands.
#[derive(Args, Debug, Default, Clone)]
pub struct ViewArgs {
    /// Category (X axis) column
    #[arg(short = 'x', long)]
    pub category: Option<String>,
    /// Value (Y axis) column
    #[arg(short = 'y', long)]
    pub value: Option<String>,
    /// Case-insensitive text that must appear in some cell
    #[arg(long)]
    pub search: Option<String>,
    /// Lowest value kept
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<f64>,
    /// Highest value kept
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<f64>,
    /// Earliest Date kept (both --from and --to are needed)
    #[arg(long)]
    pub from: Option<String>,
    /// Latest Date kept
    #[arg(long)]
    pub to: Option<String>,
    /// Column to sort records by
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    /// Show only the first N categories (0 = all)
    #[arg(long)]
    pub top: Option<usize>,
    /// Order categories by value before taking the top N
    #[arg(long)]
    pub rank: bool,
    /// Start from a saved template; other flags override it
    #[arg(long)]
    pub template: Option<String>,
}

fn parse_date_arg(raw: &str) -> Result<chrono::NaiveDate> {
    parse_date(raw).ok_or_else(|| SheetlensError::Other(format!("Invalid date: {raw}")))
}

impl ViewArgs {
    /// Lay the explicit flags over `base`.
    pub fn apply(&self, mut base: ViewSettings) -> Result<ViewSettings> {
        if let Some(c) = &self.category {
            base.axes.category = Some(c.clone());
        }
        if let Some(v) = &self.value {
            base.axes.value = Some(v.clone());
        }
        if let Some(s) = &self.search {
            base.filters.search = s.clone();
        }
        if self.min.is_some() {
            base.filters.min_value = self.min;
        }
        if self.max.is_some() {
            base.filters.max_value = self.max;
        }
        if let Some(d) = &self.from {
            base.filters.date_start = Some(parse_date_arg(d)?);
        }
        if let Some(d) = &self.to {
            base.filters.date_end = Some(parse_date_arg(d)?);
        }
        if let Some(key) = &self.sort {
            base.sort.key = Some(key.clone());
            base.sort.direction = SortDirection::Asc;
        }
        if self.desc {
            base.sort.direction = SortDirection::Desc;
        }
        if self.top.is_some() {
            base.top_n = self.top;
        }
        if self.rank {
            base.rank = true;
        }
        Ok(base)
    }

    /// Template settings (if named) overlaid with the explicit flags.
    pub fn resolve(&self, store: &dyn DatasetStore) -> Result<ViewSettings> {
        let base = match &self.template {
            Some(name) => {
                store
                    .template(name)?
                    .ok_or_else(|| SheetlensError::UnknownTemplate(name.clone()))?
                    .settings
            }
            None => ViewSettings::default(),
        };
        self.apply(base)
    }
}

// ---------------------------------------------------------------------------
// Shared command plumbing
// ---------------------------------------------------------------------------

pub(crate) fn open_store(settings: &Settings) -> Result<SqliteStore> {
    SqliteStore::open(&settings.db_path())
}

/// A path to an existing file is loaded directly; anything else names a
/// stored dataset. Returns the display name with the dataset.
pub(crate) fn resolve_dataset(store: &dyn DatasetStore, arg: &str) -> Result<(String, Dataset)> {
    let path = Path::new(arg);
    if path.is_file() {
        let loaded = load_file(path, None)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| arg.to_string());
        return Ok((name, loaded.dataset));
    }
    match store.load(arg)? {
        Some(dataset) => Ok((arg.to_string(), dataset)),
        None => Err(SheetlensError::UnknownDataset(arg.to_string())),
    }
}

/// Every column named by the view must exist in the dataset.
pub(crate) fn validate_columns(dataset: &Dataset, view: &ViewSettings) -> Result<()> {
    let named = [
        view.axes.category(),
        view.axes.value(),
        view.sort.key.as_deref().filter(|k| !k.is_empty()),
    ];
    for column in named.into_iter().flatten() {
        if !dataset.has_column(column) {
            return Err(SheetlensError::UnknownColumn(column.to_string()));
        }
    }
    Ok(())
}

/// Resolve dataset and view together for the analysis commands.
pub(crate) fn prepare(
    store: &dyn DatasetStore,
    dataset: &str,
    args: &ViewArgs,
) -> Result<(String, Dataset, ViewSettings, ViewSpec)> {
    let (name, dataset) = resolve_dataset(store, dataset)?;
    let settings = args.resolve(store)?;
    validate_columns(&dataset, &settings)?;
    let spec = ViewSpec::from(&settings);
    Ok((name, dataset, settings, spec))
}

/// Terminal rendering of `**bold**` spans.
pub(crate) fn render_emphasis(text: &str) -> String {
    text.split("**")
        .enumerate()
        .map(|(i, part)| {
            if i % 2 == 1 {
                part.bold().to_string()
            } else {
                part.to_string()
            }
        })
        .collect()
}
