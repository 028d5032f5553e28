use clap::Parser;

/// This program builds the data files of an election results map out of county exports.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the elections and their result sets.
    /// See the manual of the precinct_tally crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, optional) The source directory, with one directory per election and one
    /// sub-directory per result set. Setting this option overrides the elections of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (directory, default 'data') Where the data files are written. Setting this option overrides
    /// the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (directory, optional) A directory of previously published data files. If provided, tallymap
    /// will check that the generated files match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// Name the contest files with the percent-encoding scheme of older viewers.
    #[clap(long, takes_value = false)]
    pub legacy_keys: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
