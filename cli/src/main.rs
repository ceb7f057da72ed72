use clap::Parser;
use docsort_lib::cli::Cli;

fn main() {
    let cli = Cli::parse();
    std::process::exit(docsort_lib::run(cli));
}
