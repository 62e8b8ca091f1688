//! Runs the parsed command line against the library

use crate::cli::args::{Args, Command, DetectionArgs, InspectArgs, OverrideArgs};
use crate::config::RelocationConfig;
use crate::detect::{DetectionOutcome, Detector, PathClassifier};
use crate::error::{RelocatorError, Result};
use crate::logging::Logger;
use crate::overrides::{OutputFormat, OverrideFile, OverrideGenerator, render, strategy_from_name};
use crate::registry::RegistryMappings;
use crate::tree::Node;
use std::io::Read;
use std::path::Path;

pub struct Runner {
    args: Args,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        let output = Logger::from_flags(args.verbose, args.quiet);
        Self { args, output }
    }

    pub fn logger(&self) -> &Logger {
        &self.output
    }

    pub fn run(&self) -> Result<()> {
        self.args.validate().map_err(RelocatorError::Config)?;

        match &self.args.command {
            Command::Inspect(inspect) => self.inspect(inspect),
            Command::Override(args) => self.generate_overrides(args),
        }
    }

    fn inspect(&self, args: &InspectArgs) -> Result<()> {
        self.output.section("Image Inspection");
        let config = self.load_config(&args.detection)?;
        let values = self.read_values(&args.detection.file)?;
        let outcome = self.detect(&config, &values)?;

        let report = match args.output.as_str() {
            "json" => format!("{}\n", serde_json::to_string_pretty(&outcome)?),
            "yaml" => serde_yaml::to_string(&outcome)?,
            _ => text_report(&outcome),
        };
        print!("{}", report);

        if config.strict && !outcome.rejected.is_empty() {
            return Err(RelocatorError::StrictViolation {
                count: outcome.rejected.len(),
                paths: outcome.rejected_paths(),
            });
        }
        self.output.success(&format!(
            "Found {} image(s) in {}",
            outcome.detected.len(),
            self.output.format_duration(self.output.elapsed())
        ));
        Ok(())
    }

    fn generate_overrides(&self, args: &OverrideArgs) -> Result<()> {
        self.output.section("Override Generation");
        let mut config = self.load_config(&args.detection)?;
        if let Some(target) = &args.target_registry {
            config.target_registry = Some(target.trim().to_string());
        }
        if let Some(strategy) = &args.strategy {
            config.strategy = strategy.clone();
        }
        if let Some(threshold) = args.threshold {
            config.threshold = threshold;
        }
        if let Some(path) = &args.mapping_file {
            config.mappings.merge(RegistryMappings::load(Path::new(path))?);
        }
        config.validate()?;

        if config.target_registry.is_none() && config.mappings.is_empty() {
            return Err(RelocatorError::Config(
                "a target registry (--target-registry) or registry mappings are required".to_string(),
            ));
        }
        let format: OutputFormat = args.format.parse()?;

        let values = self.read_values(&args.detection.file)?;
        let outcome = self.detect(&config, &values)?;

        let generator = OverrideGenerator::new(
            config.target_registry.clone().unwrap_or_default(),
            strategy_from_name(&config.strategy)?,
        )
        .with_mappings(config.mappings.clone())
        .with_strict(config.strict)
        .with_threshold(config.threshold);

        self.output.summary_kv(
            "Settings",
            &[
                ("Target registry", config.target_registry.clone().unwrap_or_else(|| "(mappings only)".to_string())),
                ("Strategy", generator.strategy_name().to_string()),
                ("Mappings", config.mappings.len().to_string()),
                ("Threshold", format!("{}%", config.threshold)),
            ],
        );

        let file = generator.generate(&values, &outcome)?;
        self.report_overrides(&file);

        let document = render(&file.values, format)?;
        match &args.output_file {
            Some(path) => {
                std::fs::write(path, document)?;
                self.output.success(&format!("Overrides written to {}", path));
            }
            None => print!("{}", document),
        }
        Ok(())
    }

    fn load_config(&self, detection: &DetectionArgs) -> Result<RelocationConfig> {
        let mut config = match &self.args.config {
            Some(path) => {
                self.output.info(&format!("Loading config from {}", path));
                RelocationConfig::load(Path::new(path))?
            }
            None => RelocationConfig::default(),
        };

        if !detection.source_registries.is_empty() {
            config.source_registries = detection.source_registries.clone();
        }
        if !detection.exclude_registries.is_empty() {
            config.exclude_registries = detection.exclude_registries.clone();
        }
        config.strict |= detection.strict;
        if detection.fallback_tag.is_some() {
            config.fallback_tag = detection.fallback_tag.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// YAML is a superset of JSON, so one parser handles both.
    fn read_values(&self, file: &str) -> Result<Node> {
        let text = if file == "-" {
            self.output.info("Reading values from stdin");
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        } else {
            self.output.info(&format!("Reading values from {}", file));
            std::fs::read_to_string(file)?
        };
        Node::from_yaml_str(&text)
    }

    fn detect(&self, config: &RelocationConfig, values: &Node) -> Result<DetectionOutcome> {
        let classifier = PathClassifier::new(&config.path_patterns())?;
        let detector = Detector::new(config.detection_config(), classifier);
        let outcome = detector.detect(values);

        if let Some(registry) = &outcome.global_registry {
            self.output.info(&format!("Global registry override: {}", registry));
        }
        for rejected in &outcome.rejected {
            self.output.detail(&format!("{}: {} ({})", rejected.path, rejected.reason, rejected.detail));
        }
        Ok(outcome)
    }

    fn report_overrides(&self, file: &OverrideFile) {
        let moved: Vec<String> = file
            .relocations
            .iter()
            .map(|r| format!("{}: {} -> {}", r.path, r.from, r.to))
            .collect();
        self.output.summary("Relocated images", &moved);

        if !file.failures.is_empty() {
            let failed: Vec<String> = file
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.path, f.error))
                .collect();
            self.output.list("Failed overrides", &failed);
        }
        self.output.info(&format!(
            "{} of {} image(s) relocated ({}%)",
            file.processed,
            file.eligible,
            file.success_rate()
        ));
    }
}

fn text_report(outcome: &DetectionOutcome) -> String {
    let mut out = format!("Detected images ({}):\n", outcome.detected.len());
    for image in &outcome.detected {
        let shape = match image.shape {
            crate::detect::Shape::Map => "map",
            crate::detect::Shape::String => "string",
        };
        out.push_str(&format!("  {}\t[{}]\t{}\n", image.path, shape, image.reference));
    }
    if !outcome.rejected.is_empty() {
        out.push_str(&format!("Rejected candidates ({}):\n", outcome.rejected.len()));
        for rejected in &outcome.rejected {
            out.push_str(&format!(
                "  {}\t{}\t{}\n",
                rejected.path, rejected.reason, rejected.detail
            ));
        }
    }
    out
}
