use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use docsort_core::{DocumentType, UnresolvedPolicy};

#[derive(Parser, Debug)]
#[command(name = "docsort")]
#[command(about = "Rename scanned documents from their own text and package them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Name documents after a line of their text
    Pattern {
        /// Document layout: generic, carta_calculo (cartas) or epi (epis)
        #[arg(long = "type", short = 't', default_value = "generic", value_parser = parse_document_type)]
        document_type: DocumentType,
        /// Regex or plain text; required for generic documents
        #[arg(long, short)]
        pattern: Option<String>,
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Name documents after the matching row of a CSV spreadsheet
    Sheet {
        /// CSV file with a header row
        #[arg(long)]
        sheet: PathBuf,
        /// Column whose values are searched for in each document
        #[arg(long)]
        find: String,
        /// Column holding the new name
        #[arg(long)]
        name: String,
        /// Columns appended to the name, joined with '-'
        #[arg(long, value_delimiter = ',')]
        extra: Vec<String>,
        #[command(flatten)]
        batch: BatchArgs,
    },
}

impl Command {
    pub fn batch(&self) -> &BatchArgs {
        match self {
            Self::Pattern { batch, .. } | Self::Sheet { batch, .. } => batch,
        }
    }
}

/// Options shared by every batch command
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Documents, or directories of documents
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Where to write the zip archive
    #[arg(long, short)]
    pub archive: PathBuf,
    /// Where to place renamed files (default: under the work dir, kept after the run)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Copy documents instead of moving them
    #[arg(long)]
    pub copy: bool,
    /// What to do with documents that could not be renamed
    #[arg(long, value_enum, env = "DOCSORT_UNRESOLVED")]
    pub unresolved: Option<PolicyArg>,
    /// Also store every extracted line as text.csv
    #[arg(long)]
    pub text_dump: bool,
    /// Leave log.csv out of the archive
    #[arg(long)]
    pub no_log: bool,
    /// Directory for per-job working files
    #[arg(long, env = "DOCSORT_WORK_DIR")]
    pub work_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    Skip,
    KeepOriginal,
}

impl From<PolicyArg> for UnresolvedPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Skip => Self::Skip,
            PolicyArg::KeepOriginal => Self::KeepOriginal,
        }
    }
}

fn parse_document_type(value: &str) -> Result<DocumentType, String> {
    value.parse().map_err(|e: docsort_core::RenameError| e.to_string())
}
