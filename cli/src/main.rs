use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use jsonschema_ts_core::{normalize, parse, CompileOptions};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "jsonschema-ts")]
#[command(about = "Normalize JSON Schemas and compile them into a type-declaration AST")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized schema
    Normalize(CommandArgs),

    /// Normalize and parse a schema, printing the type AST
    Parse(CommandArgs),
}

#[derive(Args)]
struct CommandArgs {
    /// Input JSON Schema file
    input: PathBuf,

    /// Output file (defaults to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// File name used to derive the root type name (defaults to the input's file name)
    #[arg(long)]
    file_name: Option<String>,

    /// Options file (kebab-case JSON); flags below override it
    #[arg(long)]
    options: Option<PathBuf>,

    /// Drop minItems/maxItems instead of materializing tuples
    #[arg(long)]
    ignore_min_and_max_items: bool,

    /// Add `undefined` to synthesized index signatures
    #[arg(long)]
    strict_index_signatures: bool,

    /// Untyped schemas become `any` instead of `unknown`
    #[arg(long)]
    any: bool,

    /// Do not mark enums as constant enums
    #[arg(long)]
    no_const_enums: bool,

    /// Fail on unrecognized schema shapes instead of falling back
    #[arg(long)]
    no_fallback: bool,

    /// Max nesting depth for the parser
    #[arg(long)]
    max_depth: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

impl CommandArgs {
    fn compile_options(&self) -> Result<CompileOptions> {
        let mut options: CompileOptions = match &self.options {
            Some(path) => read_json(path, "options")?,
            None => CompileOptions::default(),
        };

        if self.ignore_min_and_max_items {
            options.ignore_min_and_max_items = true;
        }
        if self.strict_index_signatures {
            options.strict_index_signatures = true;
        }
        if self.any {
            options.unknown_any = false;
        }
        if self.no_const_enums {
            options.enable_const_enums = false;
        }
        if self.no_fallback {
            options.fallback_to_any = false;
        }
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        Ok(options)
    }

    fn file_name(&self) -> String {
        self.file_name.clone().unwrap_or_else(|| {
            self.input
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Normalize(args) => {
            let options = args.compile_options()?;
            let schema: serde_json::Value = read_json(&args.input, "schema")?;

            let normalized = normalize(&schema, &args.file_name(), &options);
            write_json(&normalized, args.output.as_ref(), args.format)?;
        }
        Commands::Parse(args) => {
            let options = args.compile_options()?;
            let schema: serde_json::Value = read_json(&args.input, "schema")?;

            let normalized = normalize(&schema, &args.file_name(), &options);
            let ast = parse(&normalized, &options)
                .map_err(|e| anyhow::Error::from(e).context("Parsing failed"))?;
            write_json(&ast, args.output.as_ref(), args.format)?;
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", what, path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {} from: {}", what, path.display()))
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    // Ensure trailing newline
    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
