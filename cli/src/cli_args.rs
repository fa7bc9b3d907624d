use clap::Parser;
use std::path::PathBuf;

pub fn parse_size(s: &str) -> Result<u64, String> {
    byte_unit::Byte::parse_str(s, true)
        .map(|b| b.as_u64())
        .map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Dump a rule-filtered snapshot of a project as one text stream for AI models.",
    long_about = "ctxcat walks one or more targets inside a project, filters every file through \
layered gitignore-style rules (.contextfiles, .gitignore, built-in defaults or overrides), \
drops binaries, and concatenates the survivors into a single context stream.",
    after_help = "EXAMPLES:\n  ctxcat\n  ctxcat src tests/test_api.py\n  ctxcat -l -S\n  ctxcat --overrides rules.txt -o context.md"
)]
pub struct Cli {
    #[arg(
        value_name = "TARGET",
        help = "Files or directories to gather (default: the whole project root)."
    )]
    pub targets: Vec<PathBuf>,

    #[arg(
        short = 'r',
        long,
        value_name = "DIR",
        help = "Project root for output-relative paths (default: current dir).",
        help_heading = "Project Setup"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Rule file replacing all .contextfiles, .gitignore and built-in defaults.",
        help_heading = "Filtering"
    )]
    pub overrides: Option<PathBuf>,

    #[arg(
        short = 's',
        long,
        value_name = "SIZE",
        value_parser = parse_size,
        help = "Aggregate size budget, e.g. '50MB' (default: 100 MiB, or CTXCAT_MAX_SIZE_MB).",
        help_heading = "Filtering"
    )]
    pub size_limit: Option<u64>,

    #[arg(
        short = 'l',
        long,
        help = "List matching file paths instead of emitting contents.",
        help_heading = "Output"
    )]
    pub list_only: bool,

    #[arg(
        short = 'S',
        long = "size",
        requires = "list_only",
        help = "Prefix each listed path with its size in bytes.",
        help_heading = "Output"
    )]
    pub show_sizes: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to a file instead of stdout.",
        help_heading = "Output"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'd',
        long,
        help = "Explain every inclusion/exclusion decision (implies debug logging)."
    )]
    pub debug_explain: bool,

    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase message verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(short, long, help = "Silence informational messages and warnings.")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn size_parser_accepts_units() {
        assert_eq!(parse_size("1000").unwrap(), 1000);
        assert_eq!(parse_size("1KiB").unwrap(), 1024);
        assert!(parse_size("lots").is_err());
    }
}
