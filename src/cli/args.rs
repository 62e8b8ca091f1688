//! Command-line argument parsing

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Usage examples shown after the option list in `--help`.
const EXAMPLES: &str = "\
Examples:
  # List every image in a chart's values
  image-relocator inspect -f values.yaml

  # Strict scan limited to Docker Hub and Quay
  image-relocator inspect -f values.yaml --source-registry docker.io,quay.io --strict

  # Relocate everything to a private registry
  image-relocator override -f values.yaml -t harbor.example.com -o overrides.yaml

  # Flat repository names, emitted as --set flags
  image-relocator override -f values.yaml -t harbor.example.com --strategy flat --format helm-set

  # Per-registry targets and a success threshold
  image-relocator override -f values.yaml -t harbor.example.com --mapping-file mappings.yaml --threshold 90";

#[derive(Parser, Debug)]
#[command(name = "image-relocator")]
#[command(about = "Find container image references in deployment values and generate registry overrides")]
#[command(version, author)]
#[command(after_help = EXAMPLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file path
    #[arg(
        long = "config",
        short = 'c',
        global = true,
        help = "Path to a YAML relocation config file"
    )]
    pub config: Option<String>,

    /// Verbose output
    #[arg(
        long = "verbose",
        short = 'v',
        global = true,
        help = "Enable verbose output"
    )]
    pub verbose: bool,

    /// Quiet mode
    #[arg(
        long = "quiet",
        short = 'q',
        global = true,
        help = "Only print errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the image references found in a values file
    Inspect(InspectArgs),
    /// Write an override document pointing every image at a new registry
    Override(OverrideArgs),
}

/// Detection settings shared by both subcommands
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct DetectionArgs {
    #[arg(
        long = "file",
        short = 'f',
        help = "Values file to scan (YAML or JSON), '-' for stdin"
    )]
    pub file: String,

    #[arg(
        long = "source-registry",
        value_delimiter = ',',
        help = "Only consider images from these registries (repeatable or comma-separated)"
    )]
    pub source_registries: Vec<String>,

    #[arg(
        long = "exclude-registry",
        value_delimiter = ',',
        help = "Ignore images from these registries (repeatable or comma-separated)"
    )]
    pub exclude_registries: Vec<String>,

    #[arg(
        long = "strict",
        help = "Report malformed or filtered image candidates instead of skipping them"
    )]
    pub strict: bool,

    #[arg(
        long = "fallback-tag",
        help = "Tag used for images that specify neither tag nor digest (default: latest)"
    )]
    pub fallback_tag: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub detection: DetectionArgs,

    #[arg(
        long = "output",
        short = 'o',
        default_value = "text",
        help = "Output format: text, yaml, json"
    )]
    pub output: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct OverrideArgs {
    #[command(flatten)]
    pub detection: DetectionArgs,

    #[arg(
        long = "target-registry",
        short = 't',
        help = "Registry that images are relocated to"
    )]
    pub target_registry: Option<String>,

    #[arg(
        long = "strategy",
        help = "Repository naming strategy: prefix-source-registry, flat"
    )]
    pub strategy: Option<String>,

    #[arg(
        long = "mapping-file",
        short = 'm',
        help = "YAML file with source-to-target registry mappings"
    )]
    pub mapping_file: Option<String>,

    #[arg(
        long = "threshold",
        value_parser = clap::value_parser!(u8).range(0..=100),
        help = "Fail unless at least this percentage of images is relocated"
    )]
    pub threshold: Option<u8>,

    #[arg(
        long = "format",
        default_value = "yaml",
        help = "Output format: yaml, json, helm-set"
    )]
    pub format: String,

    #[arg(
        long = "output-file",
        short = 'o',
        help = "Write the override document here instead of stdout"
    )]
    pub output_file: Option<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        let detection = match &self.command {
            Command::Inspect(inspect) => {
                match inspect.output.as_str() {
                    "text" | "json" | "yaml" => {}
                    _ => return Err("Output format must be one of: text, json, yaml".to_string()),
                }
                &inspect.detection
            }
            Command::Override(args) => {
                match args.format.as_str() {
                    "yaml" | "json" | "helm-set" => {}
                    _ => return Err("Format must be one of: yaml, json, helm-set".to_string()),
                }
                if let Some(target) = &args.target_registry {
                    if target.trim().is_empty() {
                        return Err("Target registry cannot be empty".to_string());
                    }
                }
                &args.detection
            }
        };

        if detection.file.trim().is_empty() {
            return Err("Values file must be given with --file".to_string());
        }
        if detection.file != "-" && !std::path::Path::new(&detection.file).exists() {
            return Err(format!("File does not exist: {}", detection.file));
        }
        if let Some(config) = &self.config {
            if !std::path::Path::new(config).exists() {
                return Err(format!("Config file does not exist: {}", config));
            }
        }
        Ok(())
    }
}
