use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use hazy::{
    DEFAULT_MAX_ITERATIONS, ExportFormat, Expression, InputSpec, QuantityRow, Session,
    SimplifyConfig, Target, save, split_symbols, validate_symbols,
};
use log::info;

/// Log level for the application
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_log_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Which expression to export
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
    Expression,
    Uncertainty,
}

impl From<ExportTarget> for Target {
    fn from(target: ExportTarget) -> Self {
        match target {
            ExportTarget::Expression => Target::Expression,
            ExportTarget::Uncertainty => Target::Uncertainty,
        }
    }
}

/// Hazy - Propagate measurement uncertainty through a symbolic expression
#[derive(Parser, Debug)]
#[command(name = "hazy")]
#[command(
    about = "Build sqrt(sum((df/dx)^2 * u_x^2)) for an expression and evaluate it against measurements"
)]
#[command(version)]
pub struct CliArgs {
    /// Expression to propagate uncertainty through
    pub expression: String,

    /// Comma separated symbols to differentiate by
    #[arg(short, long)]
    pub symbols: String,

    /// Input format: text or latex
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Measured quantity, repeatable: SYMBOL=VALUE or SYMBOL=VALUE+-ERROR
    #[arg(short, long = "measure", value_name = "SYMBOL=VALUE[+-ERROR]")]
    pub measurements: Vec<String>,

    /// Simplify both expressions before printing
    #[arg(long)]
    pub simplify: bool,

    /// Maximum number of simplification passes
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub simplify_iterations: usize,

    /// Print expressions as LaTeX
    #[arg(long)]
    pub latex: bool,

    /// Export file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export format (default: taken from the output file extension)
    #[arg(long)]
    pub export_format: Option<String>,

    /// Expression to export
    #[arg(long, value_enum, default_value = "uncertainty")]
    pub export: ExportTarget,

    /// Log level (default: warn)
    #[arg(short, long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

/// Where and how to export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub target: Target,
}

/// Configuration for the CLI application
pub struct CliConfig {
    pub spec: InputSpec,
    pub symbols: Vec<String>,
    pub measurements: Vec<QuantityRow>,
    pub simplify: Option<SimplifyConfig>,
    pub latex: bool,
    pub export: Option<ExportRequest>,
    pub log_level: LogLevel,
}

/// Parse `SYMBOL=VALUE` or `SYMBOL=VALUE+-ERROR` (`±` also accepted)
pub fn parse_measurement(text: &str) -> Result<QuantityRow> {
    let Some((symbol, rest)) = text.split_once('=') else {
        bail!("Expected SYMBOL=VALUE[+-ERROR], got '{}'", text);
    };

    let symbol = symbol.trim();
    if symbol.is_empty() {
        bail!("Missing symbol in '{}'", text);
    }

    let (value, error) = match rest.split_once("+-").or_else(|| rest.split_once('±')) {
        Some((value, error)) => (value.trim(), Some(error.trim())),
        None => (rest.trim(), None),
    };
    if value.is_empty() || error.is_some_and(str::is_empty) {
        bail!("Missing value in '{}'", text);
    }

    Ok(QuantityRow {
        symbol: symbol.to_string(),
        value: Some(value.to_string()),
        error: error.map(String::from),
    })
}

/// Validate parsed arguments into a configuration
pub fn config_from_args(args: CliArgs) -> Result<CliConfig> {
    let spec = InputSpec::new(&args.format, args.expression).context("Invalid input format")?;

    let symbols = split_symbols(&args.symbols);
    validate_symbols(&symbols).context("Invalid symbol list")?;

    let measurements = args
        .measurements
        .iter()
        .map(|text| parse_measurement(text))
        .collect::<Result<Vec<_>>>()
        .context("Invalid measurement")?;

    let export = match (args.output, args.export_format) {
        (Some(path), Some(tag)) => Some(ExportRequest {
            format: tag.parse().context("Invalid export format")?,
            path,
            target: args.export.into(),
        }),
        (Some(path), None) => Some(ExportRequest {
            format: ExportFormat::from_path(&path).with_context(|| {
                format!(
                    "Cannot tell the export format of '{}', pass --export-format",
                    path.display()
                )
            })?,
            path,
            target: args.export.into(),
        }),
        (None, Some(_)) => bail!("--export-format needs --output"),
        (None, None) => None,
    };

    Ok(CliConfig {
        spec,
        symbols,
        measurements,
        simplify: args
            .simplify
            .then(|| SimplifyConfig::new().with_max_iterations(args.simplify_iterations)),
        latex: args.latex,
        export,
        log_level: args.log_level,
    })
}

/// Parse command line arguments and return configuration
pub fn parse_args() -> Result<CliConfig> {
    config_from_args(CliArgs::parse())
}

/// Initialize logging based on the provided log level
pub fn init_logging(log_level: &LogLevel) -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log_level.to_log_level_filter())
        .init();
    Ok(())
}

fn show(expr: &Expression, latex: bool) -> String {
    if latex {
        expr.to_latex()
    } else {
        expr.to_string()
    }
}

/// Run the main application logic
pub fn run() -> Result<()> {
    let config = parse_args()?;

    // Initialize logging
    init_logging(&config.log_level)?;

    let mut session = Session::new();
    if let Some(simplify) = config.simplify {
        session = session.with_simplify_config(simplify);
    }
    for row in config.measurements {
        session.add_row(row);
    }

    info!(
        "Propagating uncertainty of '{}' over [{}]",
        config.spec.value,
        config.symbols.join(", ")
    );
    session
        .compute(&config.spec, &config.symbols)
        .context("Cannot compute")?;

    if config.simplify.is_some() {
        for target in [Target::Expression, Target::Uncertainty] {
            session.simplify(target)?;
            if let Some(outcome) = session.wait_simplify() {
                outcome.with_context(|| format!("Cannot simplify the {}", target))?;
            }
        }
    }

    let propagation = session.propagation().context("No expression computed")?;
    println!("Expression:  {}", show(propagation.expression(), config.latex));
    println!("Uncertainty: {}", show(propagation.uncertainty(), config.latex));

    if !session.rows().is_empty() {
        let measurement = session.evaluate().context("Cannot evaluate")?;
        println!("Result:      {}", measurement);
    }

    if let Some(export) = &config.export {
        let expr = match export.target {
            Target::Expression => propagation.expression(),
            Target::Uncertainty => propagation.uncertainty(),
        };
        save(&export.path, expr, export.format)
            .with_context(|| format!("Cannot export to '{}'", export.path.display()))?;
        info!("Exported the {} to {}", export.target, export.path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> CliArgs {
        match CliArgs::try_parse_from(argv) {
            Ok(args) => args,
            Err(err) => panic!("{}", err),
        }
    }

    #[test]
    fn test_parse_measurement() {
        let result = parse_measurement("x=2+-0.1");
        assert!(result.is_ok());
        if let Ok(row) = result {
            assert_eq!(row, QuantityRow::new("x", "2").with_error("0.1"));
        }

        let result = parse_measurement(" m = 1/3 ± 1e-3 ");
        assert!(result.is_ok());
        if let Ok(row) = result {
            assert_eq!(row, QuantityRow::new("m", "1/3").with_error("1e-3"));
        }

        let result = parse_measurement("g=9.81");
        assert!(result.is_ok());
        if let Ok(row) = result {
            assert_eq!(row, QuantityRow::new("g", "9.81"));
        }
    }

    #[test]
    fn test_parse_measurement_rejects_malformed() {
        assert!(parse_measurement("x").is_err());
        assert!(parse_measurement("=2").is_err());
        assert!(parse_measurement("x=").is_err());
        assert!(parse_measurement("x=2+-").is_err());
    }

    #[test]
    fn test_cli_args_parsing() {
        let args = args(&[
            "hazy", "x*y", "-s", "x, y", "-m", "x=2+-0.1", "-m", "y=3+-0.2", "--simplify",
        ]);

        assert_eq!(args.expression, "x*y");
        assert_eq!(args.symbols, "x, y");
        assert_eq!(args.format, "text");
        assert_eq!(args.measurements, vec!["x=2+-0.1", "y=3+-0.2"]);
        assert!(args.simplify);
        assert_eq!(args.simplify_iterations, DEFAULT_MAX_ITERATIONS);
        assert!(matches!(args.log_level, LogLevel::Warn));
        assert_eq!(args.export, ExportTarget::Uncertainty);
    }

    #[test]
    fn test_config_from_args() {
        let config = config_from_args(args(&[
            "hazy",
            "\\frac{m}{V}",
            "-f",
            "LaTeX",
            "-s",
            "m,V",
            "-m",
            "m=10+-0.3",
            "-o",
            "rho.tex",
            "--export",
            "expression",
        ]));
        assert!(config.is_ok());
        if let Ok(config) = config {
            assert_eq!(config.spec, InputSpec::latex("\\frac{m}{V}"));
            assert_eq!(config.symbols, vec!["m", "V"]);
            assert_eq!(config.measurements.len(), 1);
            assert!(config.simplify.is_none());
            assert_eq!(
                config.export,
                Some(ExportRequest {
                    path: PathBuf::from("rho.tex"),
                    format: ExportFormat::Latex,
                    target: Target::Expression,
                })
            );
        }
    }

    #[test]
    fn test_config_rejects_bad_input() {
        assert!(config_from_args(args(&["hazy", "x", "-s", "x", "-f", "mathml"])).is_err());
        assert!(config_from_args(args(&["hazy", "x", "-s", "u_x"])).is_err());
        assert!(config_from_args(args(&["hazy", "x", "-s", " , "])).is_err());
        assert!(config_from_args(args(&["hazy", "x", "-s", "x", "-m", "x"])).is_err());
        assert!(config_from_args(args(&["hazy", "x", "-s", "x", "-o", "out"])).is_err());
        assert!(
            config_from_args(args(&["hazy", "x", "-s", "x", "--export-format", "png"])).is_err()
        );
        assert!(
            config_from_args(args(&[
                "hazy", "x", "-s", "x", "-o", "out", "--export-format", "svg"
            ]))
            .is_err()
        );
    }

    #[test]
    fn test_simplify_config_from_args() {
        let config = config_from_args(args(&[
            "hazy",
            "x + x",
            "-s",
            "x",
            "--simplify",
            "--simplify-iterations",
            "5",
        ]));
        assert!(config.is_ok());
        if let Ok(config) = config {
            assert_eq!(
                config.simplify,
                Some(SimplifyConfig::new().with_max_iterations(5))
            );
        }
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            LogLevel::Error.to_log_level_filter(),
            log::LevelFilter::Error
        );
        assert_eq!(LogLevel::Warn.to_log_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Info.to_log_level_filter(), log::LevelFilter::Info);
        assert_eq!(
            LogLevel::Debug.to_log_level_filter(),
            log::LevelFilter::Debug
        );
        assert_eq!(
            LogLevel::Trace.to_log_level_filter(),
            log::LevelFilter::Trace
        );
    }
}
