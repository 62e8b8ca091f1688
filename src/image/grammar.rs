//! Validators for the individual parts of an image reference
//!
//! A deliberately pragmatic approximation of the distribution reference
//! grammar: permissive enough for real deployment values, strict enough to
//! keep ports, tags and digests from being confused with one another.

/// Maximum tag length.
pub const MAX_TAG_LEN: usize = 128;
/// Maximum repository length, namespace prefix included.
pub const MAX_REPOSITORY_LEN: usize = 255;
/// Maximum number of `/`-separated repository segments.
pub const MAX_REPOSITORY_SEGMENTS: usize = 5;
/// Dot-separated labels allowed in a registry host without a port.
pub const MIN_REGISTRY_LABELS: usize = 2;
pub const MAX_REGISTRY_LABELS: usize = 3;

pub const DIGEST_PREFIX: &str = "sha256:";
const DIGEST_HEX_LEN: usize = 64;

/// `sha256:` followed by exactly 64 hex characters, either case.
pub fn is_valid_digest(digest: &str) -> bool {
    match digest.strip_prefix(DIGEST_PREFIX) {
        Some(hex_part) => hex_part.len() == DIGEST_HEX_LEN && hex::decode(hex_part).is_ok(),
        None => false,
    }
}

/// Non-empty, at most 128 characters of `[A-Za-z0-9_.-]`, not starting with `.` or `-`.
pub fn is_valid_tag(tag: &str) -> bool {
    if tag.is_empty() || tag.len() > MAX_TAG_LEN || tag.starts_with(['.', '-']) {
        return false;
    }
    tag.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Domain-like registry host: 2-3 labels, `localhost`, or any host with a numeric port.
pub fn is_valid_registry(registry: &str) -> bool {
    if registry == "docker.io" || registry == "localhost" {
        return true;
    }

    if let Some((host, port)) = registry.rsplit_once(':') {
        if port.is_empty() || port.parse::<u16>().is_err() {
            return false;
        }
        return host == "localhost" || (!host.is_empty() && host.split('.').all(is_valid_label));
    }

    let labels: Vec<&str> = registry.split('.').collect();
    (MIN_REGISTRY_LABELS..=MAX_REGISTRY_LABELS).contains(&labels.len())
        && labels.into_iter().all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Lowercase path of 1-5 segments; each segment starts and ends with an
/// alphanumeric, may contain `.` and `-` inside, never `..` or `--`.
pub fn is_valid_repository(repository: &str) -> bool {
    if repository.is_empty() || repository.len() > MAX_REPOSITORY_LEN {
        return false;
    }
    let segments: Vec<&str> = repository.split('/').collect();
    segments.len() <= MAX_REPOSITORY_SEGMENTS && segments.into_iter().all(is_valid_repository_segment)
}

fn is_valid_repository_segment(segment: &str) -> bool {
    let is_edge = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let (Some(first), Some(last)) = (segment.chars().next(), segment.chars().last()) else {
        return false;
    };
    is_edge(first)
        && is_edge(last)
        && segment.chars().all(|c| is_edge(c) || c == '.' || c == '-')
        && !segment.contains("..")
        && !segment.contains("--")
}

/// Whether the part before the first `/` names a registry rather than a namespace.
pub fn looks_like_registry(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

/// Whether a string carries reference separators and so resembles an image literal.
pub fn looks_like_image_literal(value: &str) -> bool {
    value.contains(['/', ':', '@'])
}

/// Unresolved `{{ ... }}` templating syntax.
pub fn contains_template(value: &str) -> bool {
    match value.find("{{") {
        Some(open) => value[open + 2..].contains("}}"),
        None => false,
    }
}
