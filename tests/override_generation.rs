use image_relocator::config::RelocationConfig;
use image_relocator::detect::{Detector, PathClassifier};
use image_relocator::error::RelocatorError;
use image_relocator::overrides::{OutputFormat, OverrideFile, OverrideGenerator, render, strategy_from_name};
use image_relocator::tree::Node;
use pretty_assertions::assert_eq;

const VALUES: &str = r#"
image:
  repository: bitnami/redis
  tag: "7.2"
sentinel:
  image:
    registry: quay.io
    repository: bitnami/redis-sentinel
    tag: "7.2"
extraContainers:
  - name: exporter
    image: ghcr.io/org/team/sub/group/exporter:v1.55.0
    ports:
      - containerPort: 9121
  - name: shell
    image: busybox
"#;

fn generate(config_yaml: &str, values: &str) -> Result<OverrideFile, RelocatorError> {
    let config = RelocationConfig::from_yaml_str(config_yaml)?;
    let source = Node::from_yaml_str(values)?;
    let detector = Detector::new(
        config.detection_config(),
        PathClassifier::new(&config.path_patterns())?,
    );
    let outcome = detector.detect(&source);
    OverrideGenerator::new(
        config.target_registry.clone().unwrap_or_default(),
        strategy_from_name(&config.strategy)?,
    )
    .with_mappings(config.mappings.clone())
    .with_strict(config.strict)
    .with_threshold(config.threshold)
    .generate(&source, &outcome)
}

#[test]
fn prefix_strategy_end_to_end() {
    let file = generate("targetRegistry: harbor.example.com\n", VALUES).unwrap();

    assert_eq!(file.eligible, 4);
    assert_eq!(file.processed, 3);
    assert_eq!(file.failures.len(), 1);
    assert_eq!(file.failures[0].path.to_string(), "extraContainers[0].image");

    let expected = Node::from_yaml_str(
        r#"
image:
  registry: harbor.example.com
  repository: dockerio/bitnami/redis
  tag: "7.2"
sentinel:
  image:
    registry: harbor.example.com
    repository: quayio/bitnami/redis-sentinel
    tag: "7.2"
extraContainers:
  - name: exporter
    image: ghcr.io/org/team/sub/group/exporter:v1.55.0
    ports:
      - containerPort: 9121
  - name: shell
    image: harbor.example.com/dockerio/library/busybox:latest
"#,
    )
    .unwrap();
    assert_eq!(file.values, expected);
}

#[test]
fn flat_strategy_with_mappings() {
    let file = generate(
        "targetRegistry: harbor.example.com\nstrategy: flat\nmappings:\n  quay.io: quay-mirror.example.com/cache\n",
        "a:\n  image: quay.io/org/app:1.0\nb:\n  image: nginx:1.25\n",
    )
    .unwrap();

    assert_eq!(
        render(&file.values, OutputFormat::HelmSet).unwrap(),
        "a.image=quay-mirror.example.com/cache/quayio-org-app:1.0\nb.image=harbor.example.com/dockerio-library-nginx:1.25\n"
    );
}

#[test]
fn json_values_and_output() {
    let file = generate(
        "targetRegistry: mirror.local\n",
        r#"{"worker": {"image": "ghcr.io/acme/worker:2.0"}}"#,
    )
    .unwrap();
    assert_eq!(
        render(&file.values, OutputFormat::Json).unwrap(),
        "{\n  \"worker\": {\n    \"image\": \"mirror.local/ghcrio/acme/worker:2.0\"\n  }\n}\n"
    );
}

#[test]
fn strict_mode_aborts_on_rejections() {
    let err = generate(
        "targetRegistry: mirror.local\nstrict: true\n",
        "image: '{{ .Values.custom }}:latest'\nother:\n  image: nginx\n",
    )
    .unwrap_err();
    assert!(matches!(err, RelocatorError::StrictViolation { count: 1, .. }));
    assert_eq!(err.exit_code(), 12);
}

#[test]
fn excluded_registries_are_left_alone() {
    let file = generate(
        "targetRegistry: mirror.local\nexcludeRegistries: [registry.internal.io]\n",
        "a:\n  image: registry.internal.io/team/app:3\nb:\n  image: nginx\n",
    )
    .unwrap();
    assert_eq!(file.eligible, 1);
    assert_eq!(
        file.values,
        Node::from_yaml_str("b:\n  image: mirror.local/dockerio/library/nginx:latest\n").unwrap()
    );
}

#[test]
fn threshold_failure_reports_rate() {
    let err = generate("targetRegistry: harbor.example.com\nthreshold: 100\n", VALUES).unwrap_err();
    match err {
        RelocatorError::Threshold {
            threshold,
            rate,
            eligible,
            processed,
        } => {
            assert_eq!((threshold, rate, eligible, processed), (100, 75, 4, 3));
        }
        other => panic!("unexpected error: {other}"),
    }
}
