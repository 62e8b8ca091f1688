use super::{
    DetectedImage, DetectionConfig, DetectionOutcome, PathClass, PathClassifier, RejectReason,
    RejectedCandidate, Shape,
};
use crate::image::grammar::{contains_template, is_valid_registry, looks_like_image_literal};
use crate::image::{
    ImageRecord, NormalizeOptions, ParseMode, ParsedReference, RecordShape, classify_record,
    parse_reference,
};
use crate::tree::{Node, Path, Record, Segment};
use log::{debug, trace, warn};

/// Top-level section holding chart-wide settings.
pub const GLOBAL_SECTION: &str = "global";
/// Keys inside [`GLOBAL_SECTION`] naming a registry, in lookup order.
pub const GLOBAL_REGISTRY_KEYS: &[&str] = &["imageRegistry", "registry"];

/// Recursive image detector.
///
/// The detector itself is immutable; each call to [`Detector::detect`] works
/// on a fresh copy of its configuration, so passes never share state.
#[derive(Debug, Clone)]
pub struct Detector {
    config: DetectionConfig,
    classifier: PathClassifier,
}

impl Detector {
    pub fn new(config: DetectionConfig, classifier: PathClassifier) -> Self {
        Self { config, classifier }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn detect(&self, tree: &Node) -> DetectionOutcome {
        let mut config = self.config.clone();
        let global_registry = discover_global_registry(tree);
        if let Some(registry) = &global_registry {
            debug!("Using global registry override '{}'", registry);
        }
        config.set_global_registry_override(global_registry.clone());

        let mut pass = Pass {
            config: &config,
            classifier: &self.classifier,
            path: Path::root(),
            outcome: DetectionOutcome {
                global_registry,
                ..Default::default()
            },
        };
        pass.visit(tree);

        debug!(
            "Detection finished: {} image(s), {} rejected",
            pass.outcome.detected.len(),
            pass.outcome.rejected.len()
        );
        pass.outcome
    }
}

/// `global.imageRegistry`, else `global.registry`, when it is a valid registry string.
pub fn discover_global_registry(tree: &Node) -> Option<String> {
    let global = tree.field(GLOBAL_SECTION)?;
    GLOBAL_REGISTRY_KEYS
        .iter()
        .filter_map(|key| global.field(key).and_then(Node::as_str))
        .map(str::trim)
        .find(|registry| !registry.is_empty() && is_valid_registry(registry))
        .map(str::to_string)
}

/// State of one walk. `path` is a working path mutated on the way down;
/// results capture owned copies of it.
struct Pass<'a> {
    config: &'a DetectionConfig,
    classifier: &'a PathClassifier,
    path: Path,
    outcome: DetectionOutcome,
}

impl Pass<'_> {
    fn visit(&mut self, node: &Node) {
        trace!("Visiting {} ({})", self.path, node.kind_name());
        match node {
            Node::Record(record) => self.visit_record(node, record),
            Node::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.path.push(Segment::Index(index));
                    self.visit(item);
                    self.path.pop();
                }
            }
            Node::Str(value) => self.visit_string(node, value),
            Node::Empty | Node::Bool(_) | Node::Num(_) => {}
        }
    }

    fn visit_record(&mut self, node: &Node, record: &Record) {
        match classify_record(record) {
            RecordShape::ImageAttempt(image) => self.visit_image_record(node, image),
            RecordShape::Container => {
                for (key, value) in record {
                    self.path.push(Segment::Field(key.clone()));
                    self.visit(value);
                    self.path.pop();
                }
            }
        }
    }

    fn visit_image_record(&mut self, node: &Node, image: ImageRecord<'_>) {
        if let Err(err) = image.check_field_types() {
            self.type_mismatch(err.to_string());
            return;
        }
        if image.has_template() {
            self.reject(
                RejectReason::TemplatePlaceholder,
                format!("image record contains template syntax: {}", node.to_compact_string()),
            );
            return;
        }

        match image.parse() {
            Ok(parsed) => self.accept(parsed, Shape::Map, node),
            Err(err) if err.is_type_mismatch() => self.type_mismatch(err.to_string()),
            Err(err) => self.reject(RejectReason::InvalidField, err.to_string()),
        }
    }

    fn visit_string(&mut self, node: &Node, value: &str) {
        let class = self.classifier.classify(&self.path);
        let candidate = match class {
            PathClass::Image => true,
            PathClass::NonImage | PathClass::Unknown => looks_like_image_literal(value),
        };
        if !candidate {
            return;
        }

        // Deny-listed paths are tried for literals but never reported.
        if contains_template(value) {
            if class == PathClass::NonImage {
                debug!("Ignoring templated value at {}", self.path);
                return;
            }
            self.reject(
                RejectReason::TemplatePlaceholder,
                format!("value contains template syntax: {}", value),
            );
            return;
        }

        match parse_reference(value, self.parse_mode()) {
            Ok(parsed) => self.accept(parsed, Shape::String, node),
            Err(err) if class == PathClass::Image => {
                self.reject(RejectReason::AmbiguousFormat, format!("'{}': {}", value, err));
            }
            Err(err) => debug!("Ignoring '{}' at {}: {}", value, self.path, err),
        }
    }

    fn accept(&mut self, parsed: ParsedReference, shape: Shape, node: &Node) {
        let reference = parsed.normalize(&NormalizeOptions {
            global_registry: self.config.global_registry_override(),
            fallback_tag: self.config.fallback_tag(),
        });

        if let Some(reason) = self.config.filter(&reference.registry) {
            self.reject(reason, format!("{} is from registry '{}'", reference, reference.registry));
            return;
        }

        debug!("Detected {} at {}", reference, self.path);
        self.outcome.detected.push(DetectedImage {
            reference,
            path: self.path.clone(),
            shape,
            source: node.clone(),
        });
    }

    fn parse_mode(&self) -> ParseMode {
        if self.config.is_strict() {
            ParseMode::Strict
        } else {
            ParseMode::Permissive
        }
    }

    /// Reported in strict mode, dropped otherwise.
    fn reject(&mut self, reason: RejectReason, detail: String) {
        if self.config.is_strict() {
            self.record_rejection(reason, detail);
        } else {
            debug!("Skipping {} ({}): {}", self.path, reason, detail);
        }
    }

    /// Always reported, whatever the mode.
    fn type_mismatch(&mut self, detail: String) {
        warn!("Malformed image record at {}: {}", self.path, detail);
        self.record_rejection(RejectReason::TypeMismatch, detail);
    }

    fn record_rejection(&mut self, reason: RejectReason, detail: String) {
        debug!("Rejected {} ({}): {}", self.path, reason, detail);
        self.outcome.rejected.push(RejectedCandidate {
            path: self.path.clone(),
            reason,
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn detect(yaml: &str, config: DetectionConfig) -> DetectionOutcome {
        let tree = Node::from_yaml_str(yaml).unwrap();
        Detector::new(config, PathClassifier::with_defaults().unwrap()).detect(&tree)
    }

    fn strict() -> DetectionConfig {
        DetectionConfig::new().with_strict(true)
    }

    fn paths(outcome: &DetectionOutcome) -> Vec<String> {
        outcome.detected.iter().map(|d| d.path.to_string()).collect()
    }

    #[test]
    fn test_detects_strings_and_records_in_order() {
        let outcome = detect(
            r#"
image:
  repository: bitnami/redis
  tag: "7.0"
sidecar:
  image: quay.io/prometheus/node-exporter:v1.3.1
spec:
  containers:
    - name: app
      image: nginx:1.23
"#,
            DetectionConfig::new(),
        );

        assert_eq!(
            paths(&outcome),
            vec!["image", "sidecar.image", "spec.containers[0].image"]
        );
        assert_eq!(outcome.detected[0].shape, Shape::Map);
        assert_eq!(outcome.detected[0].reference.to_string(), "docker.io/bitnami/redis:7.0");
        assert_eq!(outcome.detected[1].shape, Shape::String);
        assert_eq!(outcome.detected[1].reference.repository, "prometheus/node-exporter");
        assert_eq!(outcome.detected[2].reference.repository, "library/nginx");
        assert_eq!(outcome.detected[2].source, Node::from("nginx:1.23"));
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_image_record_is_not_recursed_into() {
        let outcome = detect(
            "image:\n  repository: app\n  tag: '-bad'\n  nested:\n    image: nginx\n",
            DetectionConfig::new(),
        );
        assert!(outcome.detected.is_empty());
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_null_repository_is_a_container() {
        let outcome = detect("image:\n  repository: ~\n  inner:\n    image: nginx\n", DetectionConfig::new());
        assert_eq!(paths(&outcome), vec!["image.inner.image"]);
    }

    #[test]
    fn test_global_registry_override() {
        let outcome = detect(
            r#"
global:
  imageRegistry: mirror.example.com
web:
  image: nginx:1.23
app:
  image:
    registry: local.example.com
    repository: app
    tag: v1.0
"#,
            DetectionConfig::new(),
        );

        assert_eq!(outcome.global_registry.as_deref(), Some("mirror.example.com"));
        assert_eq!(outcome.detected[0].reference.to_string(), "mirror.example.com/nginx:1.23");
        assert_eq!(outcome.detected[1].reference.registry, "local.example.com");
    }

    #[test]
    fn test_global_registry_must_be_valid() {
        let tree = Node::from_yaml_str("global:\n  imageRegistry: ''\n  registry: not a registry\n").unwrap();
        assert_eq!(discover_global_registry(&tree), None);

        let tree = Node::from_yaml_str("global:\n  registry: registry.local:5000\n").unwrap();
        assert_eq!(discover_global_registry(&tree).as_deref(), Some("registry.local:5000"));
    }

    #[test]
    fn test_type_mismatch_reported_in_both_modes() {
        let yaml = "image:\n  repository: 123\n";
        for config in [DetectionConfig::new(), strict()] {
            let outcome = detect(yaml, config);
            assert!(outcome.detected.is_empty());
            assert_eq!(outcome.rejected.len(), 1);
            assert_eq!(outcome.rejected[0].reason, RejectReason::TypeMismatch);
            assert_eq!(outcome.rejected[0].path.to_string(), "image");
        }
    }

    #[test]
    fn test_unparseable_string_at_image_path() {
        let yaml = "image: not:a:valid:image\n";

        let outcome = detect(yaml, strict());
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reason, RejectReason::AmbiguousFormat);

        let outcome = detect(yaml, DetectionConfig::new());
        assert!(outcome.rejected.is_empty());
        assert!(outcome.detected.is_empty());
    }

    #[test]
    fn test_unparseable_string_elsewhere_is_ignored() {
        let outcome = detect("config:\n  endpoint: http://example.com:8080/x\n", strict());
        assert!(outcome.detected.is_empty());
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_literal_at_unclassified_path() {
        let outcome = detect("extra:\n  proxy: quay.io/app/proxy:2.1\n  note: plain\n", DetectionConfig::new());
        assert_eq!(paths(&outcome), vec!["extra.proxy"]);
    }

    #[test]
    fn test_literals_at_non_image_paths_are_detected() {
        let outcome = detect(
            "args:\n  - registry.local/app:1\n  - --verbose\nenv:\n  - name: MIRROR\n    value: quay.io/app:1\n",
            DetectionConfig::new(),
        );
        assert_eq!(paths(&outcome), vec!["args[0]", "env[0].value"]);
        assert_eq!(outcome.detected[1].reference.to_string(), "quay.io/app:1");
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_failures_at_non_image_paths_are_never_reported() {
        let outcome = detect(
            "metadata:\n  annotations:\n    checksum: 'a:b:c'\n    rendered: '{{ .Values.image }}:1'\nargs:\n  - --listen=0.0.0.0:8080\n",
            strict(),
        );
        assert!(outcome.detected.is_empty());
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_type_mismatch_wins_over_template() {
        let yaml = "image:\n  repository: 123\n  tag: '{{ .Chart.AppVersion }}'\n";
        for config in [DetectionConfig::new(), strict()] {
            let outcome = detect(yaml, config);
            assert!(outcome.detected.is_empty());
            assert_eq!(outcome.rejected.len(), 1);
            assert_eq!(outcome.rejected[0].reason, RejectReason::TypeMismatch);
            assert_eq!(outcome.rejected[0].path.to_string(), "image");
        }
    }

    #[test]
    fn test_templates() {
        let yaml = "image: '{{ .Values.repo }}:{{ .Chart.AppVersion }}'\nworker:\n  image:\n    repository: app\n    tag: '{{ .Chart.AppVersion }}'\n";

        let outcome = detect(yaml, strict());
        let reasons: Vec<RejectReason> = outcome.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![RejectReason::TemplatePlaceholder, RejectReason::TemplatePlaceholder]
        );

        let outcome = detect(yaml, DetectionConfig::new());
        assert!(outcome.rejected.is_empty());
        assert!(outcome.detected.is_empty());
    }

    #[test]
    fn test_registry_filtering() {
        let yaml = "a:\n  image: quay.io/app:1\nb:\n  image: nginx:1\nc:\n  image: internal.example.com/tool:2\n";
        let config = || {
            DetectionConfig::new()
                .with_source_registries(["index.docker.io", "internal.example.com"])
                .with_exclude_registries(["internal.example.com"])
        };

        let outcome = detect(yaml, config().with_strict(true));
        assert_eq!(paths(&outcome), vec!["b.image"]);
        let reasons: Vec<RejectReason> = outcome.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![RejectReason::NonSourceRegistry, RejectReason::ExcludedRegistry]
        );

        let outcome = detect(yaml, config());
        assert_eq!(paths(&outcome), vec!["b.image"]);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_invalid_record_field_strict_only() {
        let yaml = "image:\n  repository: app\n  tag: '+bad'\n";
        let outcome = detect(yaml, strict());
        assert_eq!(outcome.rejected[0].reason, RejectReason::InvalidField);
        assert!(detect(yaml, DetectionConfig::new()).rejected.is_empty());
    }

    #[test]
    fn test_images_list_and_fallback_tag() {
        let outcome = detect(
            "images:\n  - nginx\n  - registry.k8s.io/pause:3.9\n",
            DetectionConfig::new().with_fallback_tag(Some("2.4.1".into())),
        );
        assert_eq!(paths(&outcome), vec!["images[0]", "images[1]"]);
        assert_eq!(outcome.detected[0].reference.tag.as_deref(), Some("2.4.1"));
        assert_eq!(outcome.detected[1].reference.tag.as_deref(), Some("3.9"));
    }

    #[test]
    fn test_invalid_fallback_tag_keeps_references_reparseable() {
        let outcome = detect(
            "image: nginx\n",
            DetectionConfig::new().with_fallback_tag(Some("v1+build meta".into())),
        );
        let text = outcome.detected[0].reference.to_string();
        assert_eq!(text, "docker.io/library/nginx:latest");
        assert_eq!(crate::image::ImageReference::parse(&text).unwrap().to_string(), text);
    }

    #[test]
    fn test_detector_state_does_not_leak_between_passes() {
        let detector = Detector::new(DetectionConfig::new(), PathClassifier::with_defaults().unwrap());
        let with_global = Node::from_yaml_str("global:\n  imageRegistry: mirror.io\nimage: nginx\n").unwrap();
        let without = Node::from_yaml_str("image: nginx\n").unwrap();

        assert_eq!(detector.detect(&with_global).detected[0].reference.registry, "mirror.io");
        assert_eq!(detector.detect(&without).detected[0].reference.registry, "docker.io");
        assert_eq!(detector.config().global_registry_override(), None);
    }
}
