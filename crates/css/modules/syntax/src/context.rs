//! Node contexts: everything the matcher may ask about a node.
//!
//! The tree walker that renders nodes builds one [`NodeContext`] per node.
//! Ancestors are shared as `Arc<NodeContext>` so a child can be built from
//! its parent without copying the lineage, and the derived parent lists
//! (`parent_class_list`, `parent_props_list`) are read straight from them.
//!
//! Each context lazily computes a [`NodePathKey`], a digest of its lineage
//! and of every field selectors or style functions can observe. Resolvers
//! memoize by that key, so it is computed once per context and read in
//! constant time afterwards.

use crate::{Props, Value};
use core::hash::{Hash as _, Hasher as _};
use once_cell::sync::OnceCell;
use rustc_hash::FxHasher;
use std::sync::Arc;

/// Class token every node carries implicitly.
pub const UNIVERSAL: &str = "*";

/// Per-node matching context.
///
/// Fields are public for reading. Build and change contexts through the
/// builder methods: they drop the cached [`NodePathKey`]. A field written
/// directly after the key was taken needs [`NodeContext::reset_path_key`].
#[derive(Debug, Default)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "Positional flags mirror the pseudo-classes they answer"
)]
pub struct NodeContext {
    /// 1-based position among siblings.
    pub current_index: usize,
    /// Number of siblings including this node.
    pub current_array_len: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub is_odd: bool,
    pub is_even: bool,
    /// True when the node has no children.
    pub is_empty: bool,
    pub is_only_child: bool,
    /// Class tokens of this node; always contains `*`.
    pub current_class_list: Vec<String>,
    /// Ancestor contexts, root first.
    pub ancestors: Vec<Arc<NodeContext>>,
    /// Class lists of the other children of the same parent.
    pub sibling_class_list: Vec<Vec<String>>,
    /// Props of the other children of the same parent.
    pub sibling_props_list: Vec<Props>,
    /// Direct children; each carries its own children for deeper levels.
    pub children: Vec<NodeContext>,
    /// Attributes visible to attribute selectors.
    pub props: Props,
    /// Stable identity supplied by the caller. When set it stands in for
    /// the node's own fields in the [`NodePathKey`], so it must change
    /// whenever anything a selector or style function reads changes.
    pub identity: Option<String>,
    path_key: OnceCell<NodePathKey>,
}

impl Clone for NodeContext {
    /// The clone recomputes its key, so it may be edited freely.
    fn clone(&self) -> Self {
        Self {
            current_index: self.current_index,
            current_array_len: self.current_array_len,
            is_first: self.is_first,
            is_last: self.is_last,
            is_odd: self.is_odd,
            is_even: self.is_even,
            is_empty: self.is_empty,
            is_only_child: self.is_only_child,
            current_class_list: self.current_class_list.clone(),
            ancestors: self.ancestors.iter().map(Arc::clone).collect(),
            sibling_class_list: self.sibling_class_list.clone(),
            sibling_props_list: self.sibling_props_list.clone(),
            children: self.children.clone(),
            props: self.props.clone(),
            identity: self.identity.clone(),
            path_key: OnceCell::new(),
        }
    }
}

impl NodeContext {
    /// Build a lone node (index 1 of 1, no children) with the given classes.
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut current_class_list: Vec<String> = classes.into_iter().map(Into::into).collect();
        if !current_class_list.iter().any(|class| class == UNIVERSAL) {
            current_class_list.insert(0, UNIVERSAL.to_owned());
        }
        Self {
            current_class_list,
            is_empty: true,
            ..Self::default()
        }
        .at(1, 1)
    }

    /// Place the node at a 1-based `index` among `len` siblings and refresh
    /// the positional flags.
    #[must_use]
    pub fn at(mut self, index: usize, len: usize) -> Self {
        self.current_index = index;
        self.current_array_len = len;
        self.is_first = index == 1;
        self.is_last = index == len;
        self.is_odd = index % 2 == 1;
        self.is_even = index % 2 == 0;
        self.is_only_child = len == 1;
        self.reset_path_key();
        self
    }

    /// Attach the node below `parent`, inheriting the parent's lineage.
    #[must_use]
    pub fn within(mut self, parent: &Arc<Self>) -> Self {
        let mut ancestors = Vec::with_capacity(parent.ancestors.len().saturating_add(1));
        ancestors.extend(parent.ancestors.iter().map(Arc::clone));
        ancestors.push(Arc::clone(parent));
        self.ancestors = ancestors;
        self.reset_path_key();
        self
    }

    /// Set one attribute.
    #[must_use]
    pub fn with_prop(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.props.insert(name.to_owned(), value.into());
        self.reset_path_key();
        self
    }

    /// Add several attributes; later values win.
    #[must_use]
    pub fn with_props(mut self, props: Props) -> Self {
        self.props.extend(props);
        self.reset_path_key();
        self
    }

    /// Replace the children; `is_empty` follows.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.is_empty = children.is_empty();
        self.children = children;
        self.reset_path_key();
        self
    }

    /// Record the class lists and props of the other children of the parent.
    #[must_use]
    pub fn with_siblings(mut self, siblings: &[Self]) -> Self {
        self.sibling_class_list = siblings
            .iter()
            .map(|sibling| sibling.current_class_list.clone())
            .collect();
        self.sibling_props_list = siblings.iter().map(|sibling| sibling.props.clone()).collect();
        self.reset_path_key();
        self
    }

    /// Key the node by a caller-supplied identity instead of its fields.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self.reset_path_key();
        self
    }

    /// Freeze the context so children can reference it as an ancestor.
    #[inline]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Class lists of the ancestors, root first.
    #[inline]
    pub fn parent_class_list(&self) -> impl Iterator<Item = &[String]> {
        self.ancestors
            .iter()
            .map(|ancestor| ancestor.current_class_list.as_slice())
    }

    /// Props of the ancestors, root first.
    #[inline]
    pub fn parent_props_list(&self) -> impl Iterator<Item = &Props> {
        self.ancestors.iter().map(|ancestor| &ancestor.props)
    }

    /// True if the node carries `class`.
    #[inline]
    pub fn has_class(&self, class: &str) -> bool {
        self.current_class_list.iter().any(|token| token == class)
    }

    /// Attribute lookup.
    #[inline]
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Memo key of the node, computed on first use.
    #[inline]
    pub fn path_key(&self) -> NodePathKey {
        *self.path_key.get_or_init(|| self.compute_path_key())
    }

    /// Forget the cached key after editing fields in place.
    #[inline]
    pub fn reset_path_key(&mut self) {
        self.path_key = OnceCell::new();
    }

    /// Ancestors contribute their cached keys; children do the same, so
    /// every context in a tree is hashed once.
    fn compute_path_key(&self) -> NodePathKey {
        let mut hasher = FxHasher::default();
        self.ancestors.len().hash(&mut hasher);
        for ancestor in &self.ancestors {
            ancestor.path_key().hash(&mut hasher);
        }
        if let Some(identity) = &self.identity {
            true.hash(&mut hasher);
            identity.hash(&mut hasher);
            return NodePathKey(hasher.finish());
        }
        false.hash(&mut hasher);
        self.current_index.hash(&mut hasher);
        self.current_array_len.hash(&mut hasher);
        [
            self.is_first,
            self.is_last,
            self.is_odd,
            self.is_even,
            self.is_empty,
            self.is_only_child,
        ]
        .hash(&mut hasher);
        self.current_class_list.hash(&mut hasher);
        hash_props(&self.props, &mut hasher);
        self.sibling_class_list.hash(&mut hasher);
        self.sibling_props_list.len().hash(&mut hasher);
        for props in &self.sibling_props_list {
            hash_props(props, &mut hasher);
        }
        self.children.len().hash(&mut hasher);
        for child in &self.children {
            child.path_key().hash(&mut hasher);
        }
        NodePathKey(hasher.finish())
    }
}

fn hash_props(props: &Props, hasher: &mut FxHasher) {
    props.len().hash(hasher);
    for (name, value) in props {
        name.hash(hasher);
        match value {
            Value::Str(text) => {
                0_u8.hash(hasher);
                text.hash(hasher);
            }
            Value::Number(number) => {
                1_u8.hash(hasher);
                number.to_bits().hash(hasher);
            }
        }
    }
}

/// Digest of a node's lineage and observable state, used as a memo key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodePathKey(u64);

impl NodePathKey {
    /// Raw digest.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}
