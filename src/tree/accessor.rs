//! Path-addressed reads and writes
//!
//! `set` creates missing intermediate records but never lists: a list's length
//! cannot be inferred from a path, so an index into a missing location fails.

use super::{Node, Path, Record, Segment};
use crate::error::AccessError;

/// Read the value at `path`. The empty path addresses the root.
pub fn get<'a>(tree: &'a Node, path: &Path) -> Result<&'a Node, AccessError> {
    let mut current = tree;
    for (depth, segment) in path.segments().iter().enumerate() {
        current = step(current, segment, path, depth)?;
    }
    Ok(current)
}

/// Write `value` at `path`, creating missing intermediate records.
///
/// Fails with [`AccessError::CannotOverwriteStructure`] when the target holds a
/// record or list and `value` is a scalar.
pub fn set(tree: &mut Node, path: &Path, value: Node) -> Result<(), AccessError> {
    let segments = path.segments();
    let (last, parents) = segments.split_last().ok_or(AccessError::EmptyPath)?;

    let mut current = tree;
    for (depth, segment) in parents.iter().enumerate() {
        let next_is_index = segments[depth + 1].is_index();
        current = match segment {
            Segment::Field(name) => {
                let record = promote_to_record(current, path, depth)?;
                let missing = record.get(name).is_none_or(Node::is_empty_scalar);
                if missing {
                    if next_is_index {
                        return Err(AccessError::NotFound(path.prefix(depth + 1).to_string()));
                    }
                    record.insert(name.clone(), Node::empty_record());
                }
                record
                    .get_mut(name)
                    .ok_or_else(|| AccessError::NotFound(path.prefix(depth + 1).to_string()))?
            }
            Segment::Index(_) => step_mut(current, segment, path, depth)?,
        };
    }

    let depth = parents.len();
    let slot = match last {
        Segment::Field(name) => {
            let record = promote_to_record(current, path, depth)?;
            if !record.contains_key(name) {
                record.insert(name.clone(), value);
                return Ok(());
            }
            record
                .get_mut(name)
                .ok_or_else(|| AccessError::NotFound(path.to_string()))?
        }
        Segment::Index(_) => step_mut(current, last, path, depth)?,
    };

    if slot.is_composite() && !value.is_composite() {
        return Err(AccessError::CannotOverwriteStructure(path.to_string()));
    }
    *slot = value;
    Ok(())
}

fn step<'a>(current: &'a Node, segment: &Segment, path: &Path, depth: usize) -> Result<&'a Node, AccessError> {
    let here = || path.prefix(depth).to_string();
    match (segment, current) {
        (Segment::Field(name), Node::Record(record)) => record
            .get(name)
            .ok_or_else(|| AccessError::NotFound(path.prefix(depth + 1).to_string())),
        (Segment::Field(_), _) => Err(AccessError::NotTraversable(here())),
        (Segment::Index(index), Node::List(items)) => {
            items.get(*index).ok_or(AccessError::IndexOutOfBounds {
                path: here(),
                index: *index,
                len: items.len(),
            })
        }
        (Segment::Index(_), _) => Err(AccessError::NotAList(here())),
    }
}

fn step_mut<'a>(
    current: &'a mut Node,
    segment: &Segment,
    path: &Path,
    depth: usize,
) -> Result<&'a mut Node, AccessError> {
    let here = || path.prefix(depth).to_string();
    match (segment, current) {
        (Segment::Field(name), Node::Record(record)) => record
            .get_mut(name)
            .ok_or_else(|| AccessError::NotFound(path.prefix(depth + 1).to_string())),
        (Segment::Field(_), _) => Err(AccessError::NotTraversable(here())),
        (Segment::Index(index), Node::List(items)) => {
            let len = items.len();
            items.get_mut(*index).ok_or(AccessError::IndexOutOfBounds {
                path: here(),
                index: *index,
                len,
            })
        }
        (Segment::Index(_), _) => Err(AccessError::NotAList(here())),
    }
}

/// An empty scalar location becomes a fresh record; any other scalar is a dead end.
fn promote_to_record<'a>(node: &'a mut Node, path: &Path, depth: usize) -> Result<&'a mut Record, AccessError> {
    if node.is_empty_scalar() {
        *node = Node::empty_record();
    }
    match node {
        Node::Record(record) => Ok(record),
        _ => Err(AccessError::NotTraversable(path.prefix(depth).to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Node {
        Node::from_yaml_str(
            r#"
spec:
  containers:
    - name: app
      image: nginx:1.23
    - name: sidecar
      image: busybox
replicas: 3
"#,
        )
        .unwrap()
    }

    fn p(text: &str) -> Path {
        text.parse().unwrap()
    }

    #[test]
    fn test_get() {
        let tree = sample();
        assert_eq!(get(&tree, &p("spec.containers[1].image")).unwrap(), &Node::from("busybox"));
        assert_eq!(get(&tree, &Path::root()).unwrap(), &tree);
    }

    #[test]
    fn test_get_errors() {
        let tree = sample();
        assert_eq!(
            get(&tree, &p("spec.missing")),
            Err(AccessError::NotFound("spec.missing".into()))
        );
        assert_eq!(
            get(&tree, &p("replicas.value")),
            Err(AccessError::NotTraversable("replicas".into()))
        );
        assert_eq!(
            get(&tree, &p("spec[0]")),
            Err(AccessError::NotAList("spec".into()))
        );
        assert_eq!(
            get(&tree, &p("spec.containers[5]")),
            Err(AccessError::IndexOutOfBounds {
                path: "spec.containers".into(),
                index: 5,
                len: 2
            })
        );
    }

    #[test]
    fn test_set_then_get() {
        let mut tree = sample();
        let path = p("spec.containers[0].image");
        set(&mut tree, &path, Node::from("registry.example.com/nginx:1.23")).unwrap();
        assert_eq!(
            get(&tree, &path).unwrap(),
            &Node::from("registry.example.com/nginx:1.23")
        );
        assert_eq!(get(&tree, &p("spec.containers[0].name")).unwrap(), &Node::from("app"));
    }

    #[test]
    fn test_set_creates_intermediate_records() {
        let mut tree = Node::empty_record();
        let path = p("global.image.registry");
        set(&mut tree, &path, Node::from("mirror.local")).unwrap();
        assert_eq!(tree.to_yaml_string().unwrap(), "global:\n  image:\n    registry: mirror.local\n");
    }

    #[test]
    fn test_set_promotes_empty_root_and_null_fields() {
        let mut tree = Node::Empty;
        set(&mut tree, &p("a.b"), Node::from(true)).unwrap();
        set(&mut tree, &p("a.c"), Node::Empty).unwrap();
        set(&mut tree, &p("a.c.d"), Node::from(1i64)).unwrap();
        assert_eq!(get(&tree, &p("a.c.d")).unwrap(), &Node::from(1i64));
    }

    #[test]
    fn test_set_never_creates_lists() {
        let mut tree = Node::empty_record();
        assert_eq!(
            set(&mut tree, &p("spec.containers[0].image"), Node::from("x")),
            Err(AccessError::NotFound("spec.containers".into()))
        );
    }

    #[test]
    fn test_set_refuses_to_clobber_structure() {
        let mut tree = sample();
        assert_eq!(
            set(&mut tree, &p("spec.containers"), Node::from("flat")),
            Err(AccessError::CannotOverwriteStructure("spec.containers".into()))
        );
        assert_eq!(
            set(&mut tree, &p("spec.containers[0]"), Node::from("flat")),
            Err(AccessError::CannotOverwriteStructure("spec.containers[0]".into()))
        );
        let record: Node = [("repository", Node::from("nginx"))].into_iter().collect();
        set(&mut tree, &p("spec.containers[0]"), record.clone()).unwrap();
        assert_eq!(get(&tree, &p("spec.containers[0]")).unwrap(), &record);
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut tree = sample();
        assert_eq!(
            set(&mut tree, &p("replicas.count"), Node::from(1i64)),
            Err(AccessError::NotTraversable("replicas".into()))
        );
        assert_eq!(set(&mut tree, &Path::root(), Node::from(1i64)), Err(AccessError::EmptyPath));
    }
}
