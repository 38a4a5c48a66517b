mod check;
mod edit;
mod view;

use clap::{Parser, Subcommand};
use civtext::ReadOptions;
use tracing_subscriber::EnvFilter;

use civtext_cli::validation::parse_language_order;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Treat input without a Civ4GameText root as a list of TEXT entries
    #[arg(long, global = true)]
    wrap: bool,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a file and report duplicates and language scheme problems.
    Check {
        /// The game text file to check
        #[arg(short, long)]
        input: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a file in the canonical one-tag-per-line layout.
    Format {
        /// The input file to process
        #[arg(short, long)]
        input: String,
        /// The output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Add a new entry, filling every language with text derived from the key.
    Create {
        /// The input file to process
        #[arg(short, long)]
        input: String,
        /// The TXT_KEY of the new entry
        #[arg(short, long)]
        key: String,
        /// The output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Add a language to every entry as a copy of an existing one.
    AddLanguage {
        /// The input file to process
        #[arg(short, long)]
        input: String,
        /// The language to add
        #[arg(short, long)]
        language: String,
        /// The language to copy values from
        #[arg(short, long, default_value = "English")]
        base: String,
        /// The output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Give every entry exactly the listed languages, in that order.
    Unify {
        /// The input file to process
        #[arg(short, long)]
        input: String,
        /// Comma-separated target order, e.g. "English,Russian"
        #[arg(long)]
        order: String,
        /// The output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Copy translations for shared keys from another file.
    Import {
        /// The file receiving the translations
        #[arg(short, long)]
        input: String,
        /// The file providing the translations
        #[arg(long)]
        from: String,
        /// The output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List entries containing a text in any language.
    Search {
        /// The input file to search
        #[arg(short, long)]
        input: String,
        /// Text to look for (case-insensitive)
        #[arg(short, long)]
        query: String,
    },

    /// List entries whose two languages hold identical text.
    Untranslated {
        /// The input file to inspect
        #[arg(short, long)]
        input: String,
        /// Source language
        #[arg(short = 'a', long, default_value = "English")]
        first: String,
        /// Language expected to be translated
        #[arg(short = 'b', long)]
        second: String,
    },

    /// Dump all entries as JSON with decoded text.
    Dump {
        /// The input file to dump
        #[arg(short, long)]
        input: String,
        /// The output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("civtext={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let read_options = ReadOptions::new().with_wrap_fragments(args.wrap);

    let result = match args.commands {
        Commands::Check { input, json } => check::run_check_command(&input, json, &read_options),
        Commands::Format { input, output } => {
            edit::run_format_command(&input, &output, &read_options)
        }
        Commands::Create { input, key, output } => {
            edit::run_create_command(&input, &key, &output, &read_options)
        }
        Commands::AddLanguage {
            input,
            language,
            base,
            output,
        } => edit::run_add_language_command(&input, &language, &base, &output, &read_options),
        Commands::Unify {
            input,
            order,
            output,
        } => parse_language_order(&order).and_then(|order| {
            edit::run_unify_command(&input, &order, &output, &read_options)
        }),
        Commands::Import {
            input,
            from,
            output,
        } => edit::run_import_command(&input, &from, &output, &read_options),
        Commands::Search { input, query } => view::run_search_command(&input, &query, &read_options),
        Commands::Untranslated {
            input,
            first,
            second,
        } => view::run_untranslated_command(&input, &first, &second, &read_options),
        Commands::Dump { input, output } => view::run_dump_command(&input, &output, &read_options),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
