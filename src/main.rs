use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use file_converter::{
    convert_batch, detect_delimiter, detect_file_format, Converter, CsvToJson, Dialect, FileFormat,
    JsonToCsv, DEFAULT_DELIMITER, DEFAULT_ESCAPE,
};

#[derive(clap::Parser, Debug)]
#[command(
    name = "file-converter",
    about = "Converts tabular data between CSV and JSON with type inference"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Convert CSV to a JSON array of objects, inferring numbers
    CsvToJson {
        #[command(flatten)]
        args: ConvertArgs,

        /// Guess the delimiter from the input instead of using --delimiter
        #[arg(long, conflicts_with_all = ["delimiter", "batch"])]
        detect_delimiter: bool,

        /// Keep all values as strings (disable type conversion)
        #[arg(long)]
        no_type_conversion: bool,

        /// Field names to keep as strings (comma-separated, e.g., "zipcode,phone")
        #[arg(long, value_delimiter = ',')]
        string_fields: Vec<String>,
    },

    /// Convert a JSON object or array of objects to CSV
    JsonToCsv {
        #[command(flatten)]
        args: ConvertArgs,

        /// Write \r\n line endings
        #[arg(long)]
        crlf: bool,
    },

    /// Convert in whichever direction the input's format calls for
    Convert {
        #[command(flatten)]
        args: ConvertArgs,
    },
}

#[derive(clap::Args, Debug)]
struct ConvertArgs {
    /// Input file path
    #[arg(required_unless_present = "batch")]
    input: Option<PathBuf>,

    /// Output file path (overwritten if it exists)
    #[arg(required_unless_present = "batch")]
    output: Option<PathBuf>,

    /// Convert several files, directories or glob patterns (`**` recurses) into --output-dir
    #[arg(long, num_args = 1.., conflicts_with_all = ["input", "output"], requires = "output_dir")]
    batch: Vec<PathBuf>,

    /// Output directory for --batch
    #[arg(long, requires = "batch")]
    output_dir: Option<PathBuf>,

    /// Field delimiter, e.g. ',', ';', '\t' or '|' (default: ',')
    #[arg(short, long, value_parser = parse_char)]
    delimiter: Option<char>,

    /// Escape character for delimiter, tab and newline (csv-to-json default: '\')
    #[arg(short, long, value_parser = parse_char)]
    escape: Option<char>,

    /// Disable the escape character and rely on quoting only
    #[arg(long, conflicts_with = "escape")]
    no_escape: bool,
}

impl ConvertArgs {
    fn dialect(&self, delimiter: Option<char>, default_escape: Option<char>) -> Result<Dialect> {
        let escape = if self.no_escape {
            None
        } else {
            self.escape.or(default_escape)
        };
        let delimiter = delimiter.or(self.delimiter).unwrap_or(DEFAULT_DELIMITER);
        Ok(Dialect::new(delimiter, escape)?)
    }
}

/// Accepts a single character, or `\t` / `tab` for a tab.
fn parse_char(s: &str) -> std::result::Result<char, String> {
    if matches!(s, "\\t" | "tab") {
        return Ok('\t');
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("expected a single character, got {:?}", s)),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::CsvToJson {
            args,
            detect_delimiter: detect,
            no_type_conversion,
            string_fields,
        } => {
            let delimiter = match (&args.input, detect) {
                (Some(input), true) => {
                    let detected = detect_delimiter(input)? as char;
                    info!("Detected delimiter: {:?}", detected);
                    Some(detected)
                }
                _ => None,
            };
            let mut converter = CsvToJson::new(args.dialect(delimiter, Some(DEFAULT_ESCAPE))?)
                .with_string_fields(string_fields);
            if no_type_conversion {
                converter = converter.without_type_conversion();
            }
            execute(&converter, &args)
        }
        Command::JsonToCsv { args, crlf } => {
            let converter = JsonToCsv::new(args.dialect(None, None)?.with_crlf(crlf));
            execute(&converter, &args)
        }
        Command::Convert { args } => {
            let sample = args
                .input
                .as_ref()
                .or_else(|| args.batch.first())
                .context("No input given")?;
            match detect_file_format(sample)? {
                FileFormat::Csv => {
                    info!("Detected format: CSV");
                    let converter = CsvToJson::new(args.dialect(None, Some(DEFAULT_ESCAPE))?);
                    execute(&converter, &args)
                }
                FileFormat::Json => {
                    info!("Detected format: JSON");
                    let converter = JsonToCsv::new(args.dialect(None, None)?);
                    execute(&converter, &args)
                }
            }
        }
    }
}

fn execute(converter: &dyn Converter, args: &ConvertArgs) -> Result<()> {
    if !args.batch.is_empty() {
        let output_dir = args
            .output_dir
            .as_deref()
            .context("--batch requires --output-dir")?;
        let report = convert_batch(converter, &args.batch, output_dir)?;
        for (input, err) in &report.failed {
            eprintln!("Error processing {}: {}", input.display(), err);
        }
        if !report.is_success() {
            bail!(
                "{} of {} files failed to convert",
                report.failed.len(),
                report.total()
            );
        }
        println!("Bulk conversion complete. Processed {} files.", report.total());
        return Ok(());
    }

    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        bail!("Both an input and an output path are required");
    };

    converter
        .convert(input, output)
        .with_context(|| format!("Failed to convert {}", input.display()))?;
    println!(
        "Successfully converted {} to {}",
        input.display(),
        output.display()
    );
    Ok(())
}
