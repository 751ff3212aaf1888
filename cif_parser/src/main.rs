use cif_parser::config::runtime::{LogLevel, RuntimeConfig};
use cif_parser::pipeline::{self, PipelineError, PipelineOptions, PipelineOutput, PipelineResult};
use cif_parser::logging;
use std::env;
use std::path::PathBuf;

/// Command line choices that are not pipeline options
#[derive(Debug, Default)]
struct CliOptions {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    pipeline: PipelineOptions,
    json: bool,
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("cif_parser");

    if args.len() < 2 {
        eprintln!("Usage: {} <file> [options]", program);
        eprintln!("       {} --help", program);
        std::process::exit(1);
    }

    if args[1] == "--help" {
        print_help(program);
        return Ok(());
    }

    let cli = match parse_options(&args[1..]) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
    };
    let Some(input) = cli.input.clone() else {
        eprintln!("Error: no input file given");
        std::process::exit(1);
    };

    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    if cli.quiet {
        config.logging.enable_console_logging = false;
    }
    if cli.pipeline.verbose {
        config.logging.min_log_level = LogLevel::Debug;
    }

    logging::config::init_runtime_preferences(config.logging.clone())?;
    logging::init_global_logging()?;
    pipeline::validate_pipeline()?;

    match pipeline::process_file_with_options(&input, &config, &cli.pipeline) {
        Ok(result) => {
            if cli.json {
                println!("{}", PipelineOutput::new(&result).to_json()?);
            } else {
                print_summary(&result, cli.quiet);
            }
            std::process::exit(result.exit_code());
        }
        Err(error) => {
            eprintln!("FAILED: {}", error);
            print_detailed_error(&error);
            std::process::exit(1);
        }
    }
}

fn print_help(program_name: &str) {
    println!("CIF Parser v{}", env!("CARGO_PKG_VERSION"));
    println!("Parse CIF data files and DDL dictionaries into block/table form");
    println!();
    println!("USAGE:");
    println!("    {} <file> [options]", program_name);
    println!();
    println!("ARGUMENTS:");
    println!("    <file>    CIF data file, or a dictionary when --dictionary is given");
    println!();
    println!("OPTIONS:");
    println!("    --help                  Show this help message");
    println!("    --dictionary <ddl>      Parse <file> as a dictionary checked against <ddl>");
    println!("    --category <name>       Only store this category (repeatable)");
    println!("    --case-insensitive      Compare category and column names ignoring case");
    println!("    --config <toml>         Load runtime preferences from a TOML file");
    println!("    --verbose               Trace every parser callback");
    println!("    --json                  Print the summary as JSON");
    println!("    --quiet                 Only print diagnostics, no log output");
    println!();
    println!("EXIT STATUS:");
    println!("    0    Parse completed (diagnostics may still have been reported)");
    println!("    1    Fatal error, or the input ended inside a text field");
    println!();
    println!("EXAMPLES:");
    println!("    {} 1abc.cif", program_name);
    println!("    {} 1abc.cif --category atom_site --category cell", program_name);
    println!("    {} mmcif_pdbx.dic --dictionary mmcif_ddl.dic --json", program_name);
    println!();
    println!("BUILD:");
    println!("    {}", cif_parser::config::build_info::source_info());
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut cli = CliOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--dictionary" => {
                let value = option_value(args, i, "--dictionary")?;
                cli.pipeline.ddl = Some(PathBuf::from(value));
                i += 1;
            }
            "--category" => {
                let value = option_value(args, i, "--category")?;
                cli.pipeline.categories.push(value.to_string());
                i += 1;
            }
            "--config" => {
                let value = option_value(args, i, "--config")?;
                cli.config = Some(PathBuf::from(value));
                i += 1;
            }
            "--case-insensitive" => {
                cli.pipeline.case_insensitive = true;
            }
            "--verbose" => {
                cli.pipeline.verbose = true;
            }
            "--json" => {
                cli.json = true;
            }
            "--quiet" => {
                cli.quiet = true;
            }
            other if other.starts_with("--") => {
                eprintln!("Warning: Unknown option '{}'", other);
            }
            other => {
                if cli.input.is_some() {
                    return Err(format!("unexpected extra argument '{}'", other));
                }
                cli.input = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }

    Ok(cli)
}

fn option_value<'a>(args: &'a [String], i: usize, name: &str) -> Result<&'a str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", name))
}

fn print_summary(result: &PipelineResult, quiet: bool) {
    if !quiet {
        println!("Processed {} ({})", result.path.display(), result.input.kind());
        println!("  Status: {}", result.status().as_str());
        println!(
            "  Time: {:.2}ms",
            result.processing_duration.as_secs_f64() * 1000.0
        );

        for block in result.input.file().blocks() {
            println!("  Block {}: {} tables", block.name(), block.table_count());
            for table in block.tables() {
                println!(
                    "    {:<32} {:>4} columns {:>8} rows",
                    table.name(),
                    table.column_count(),
                    table.row_count()
                );
            }
        }

        if let pipeline::ParsedInput::Dictionary(dic) = &result.input {
            println!("  Format entries: {}", dic.format().len());
        }
    }

    if let Some(ddl_report) = &result.ddl_report {
        if !ddl_report.diagnostics.is_empty() {
            println!("\nDDL diagnostics:");
            println!("{}", ddl_report.diagnostics_text());
        }
    }

    if !result.report.diagnostics.is_empty() {
        println!("\nDiagnostics:");
        println!("{}", result.report.diagnostics_text());
    }
}

fn print_detailed_error(error: &PipelineError) {
    eprintln!("{} stage failed:", error.stage());
    match error {
        PipelineError::Parsing(parse_err) => {
            eprintln!("  [{}] {}", parse_err.error_code(), parse_err);
        }
        PipelineError::DdlLoading { path, source } => {
            eprintln!("  DDL: {}", path);
            eprintln!("  [{}] {}", source.error_code(), source);
        }
        PipelineError::Configuration(config_err) => {
            eprintln!("  {}", config_err);
        }
        PipelineError::Pipeline { message } => {
            eprintln!("  {}", message);
        }
    }
    eprintln!("  Severity: {}", error.severity());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let cli = parse_options(&args(&[
            "mmcif_pdbx.dic",
            "--dictionary",
            "ddl.dic",
            "--category",
            "atom_site",
            "--category",
            "cell",
            "--case-insensitive",
            "--json",
        ]))
        .unwrap();

        assert_eq!(cli.input, Some(PathBuf::from("mmcif_pdbx.dic")));
        assert_eq!(cli.pipeline.ddl, Some(PathBuf::from("ddl.dic")));
        assert_eq!(cli.pipeline.categories, vec!["atom_site", "cell"]);
        assert!(cli.pipeline.case_insensitive);
        assert!(cli.json);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_parse_options_invalid() {
        assert!(parse_options(&args(&["a.cif", "--category"])).is_err());
        assert!(parse_options(&args(&["a.cif", "b.cif"])).is_err());

        let cli = parse_options(&args(&["a.cif", "--unknown-option"])).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("a.cif")));
    }
}
