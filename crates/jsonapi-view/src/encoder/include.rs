//! Include path parsing
//!
//! `["author", "comments.author"]` becomes a tree rooted at the primary
//! resources: `author`, and `comments` with a child `author`.

use crate::error::ViewError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeTree {
    children: BTreeMap<String, IncludeTree>,
}

impl IncludeTree {
    pub fn parse<S: AsRef<str>>(paths: &[S]) -> Result<Self, ViewError> {
        let mut root = IncludeTree::default();

        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() {
                continue;
            }

            let mut node = &mut root;
            for segment in path.split('.') {
                let segment = segment.trim();
                if segment.is_empty() {
                    return Err(ViewError::serialization_untyped(format!(
                        "invalid include path `{path}`"
                    )));
                }
                node = node.children.entry(segment.to_string()).or_default();
            }
        }

        Ok(root)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &IncludeTree)> {
        self.children.iter().map(|(name, tree)| (name.as_str(), tree))
    }

    pub fn child(&self, name: &str) -> Option<&IncludeTree> {
        self.children.get(name)
    }
}
