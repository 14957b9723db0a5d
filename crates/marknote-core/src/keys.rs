//! Storage key layout
//!
//! One entity kind ("article", "todo", ...) owns a family of keys:
//!
//! - `<entity>s`: the index, a JSON array of entries with content blanked
//! - `<entity>_content_<id>`: the content of one entry
//! - `<entity>_title_<id>`: the title of one entry
//! - `lastSelected<Entity>Id`: the most recently opened entry
//! - `<entity>s_sort_order`: `"asc"` or `"desc"`
//!
//! Content and title live outside the index so that typing into one entry
//! rewrites only that entry's key.

use uuid::Uuid;

/// Default entity kind
pub const DEFAULT_ENTITY: &str = "article";

/// What a storage key refers to within a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Index,
    Content(Uuid),
    Title(Uuid),
    Selection,
    SortOrder,
    /// Not one of this namespace's keys
    Other,
}

/// Key family for one entity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    entity: String,
    index_key: String,
    content_prefix: String,
    title_prefix: String,
    selection_key: String,
    sort_key: String,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::articles()
    }
}

impl Namespace {
    /// Build the key family for `entity`
    ///
    /// A blank entity name falls back to [`DEFAULT_ENTITY`].
    pub fn new(entity: &str) -> Self {
        let entity = match entity.trim() {
            "" => DEFAULT_ENTITY.to_string(),
            name => name.to_lowercase(),
        };
        let plural = format!("{}s", entity);
        Self {
            index_key: plural.clone(),
            content_prefix: format!("{}_content_", entity),
            title_prefix: format!("{}_title_", entity),
            selection_key: format!("lastSelected{}Id", capitalize(&entity)),
            sort_key: format!("{}_sort_order", plural),
            entity,
        }
    }

    pub fn articles() -> Self {
        Self::new("article")
    }

    pub fn todos() -> Self {
        Self::new("todo")
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn index_key(&self) -> &str {
        &self.index_key
    }

    pub fn selection_key(&self) -> &str {
        &self.selection_key
    }

    pub fn sort_key(&self) -> &str {
        &self.sort_key
    }

    pub fn content_key(&self, id: Uuid) -> String {
        format!("{}{}", self.content_prefix, id)
    }

    pub fn title_key(&self, id: Uuid) -> String {
        format!("{}{}", self.title_prefix, id)
    }

    /// Whether `key` is a content or title key of this namespace, whatever its id
    pub fn is_auxiliary(&self, key: &str) -> bool {
        key.starts_with(&self.content_prefix) || key.starts_with(&self.title_prefix)
    }

    /// Classify a storage key
    pub fn classify(&self, key: &str) -> KeyKind {
        if key == self.index_key {
            KeyKind::Index
        } else if key == self.selection_key {
            KeyKind::Selection
        } else if key == self.sort_key {
            KeyKind::SortOrder
        } else if let Some(id) = key.strip_prefix(&self.content_prefix) {
            Uuid::parse_str(id).map_or(KeyKind::Other, KeyKind::Content)
        } else if let Some(id) = key.strip_prefix(&self.title_prefix) {
            Uuid::parse_str(id).map_or(KeyKind::Other, KeyKind::Title)
        } else {
            KeyKind::Other
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_keys() {
        let ns = Namespace::articles();
        let id = Uuid::new_v4();
        assert_eq!(ns.index_key(), "articles");
        assert_eq!(ns.content_key(id), format!("article_content_{}", id));
        assert_eq!(ns.title_key(id), format!("article_title_{}", id));
        assert_eq!(ns.selection_key(), "lastSelectedArticleId");
        assert_eq!(ns.sort_key(), "articles_sort_order");
    }

    #[test]
    fn test_todo_keys() {
        let ns = Namespace::todos();
        assert_eq!(ns.index_key(), "todos");
        assert_eq!(ns.selection_key(), "lastSelectedTodoId");
        assert_eq!(ns.sort_key(), "todos_sort_order");
    }

    #[test]
    fn test_blank_entity_defaults() {
        assert_eq!(Namespace::new("  "), Namespace::articles());
        assert_eq!(Namespace::new("Article"), Namespace::articles());
    }

    #[test]
    fn test_classify() {
        let ns = Namespace::articles();
        let id = Uuid::new_v4();
        assert_eq!(ns.classify("articles"), KeyKind::Index);
        assert_eq!(ns.classify(&ns.content_key(id)), KeyKind::Content(id));
        assert_eq!(ns.classify(&ns.title_key(id)), KeyKind::Title(id));
        assert_eq!(ns.classify("lastSelectedArticleId"), KeyKind::Selection);
        assert_eq!(ns.classify("articles_sort_order"), KeyKind::SortOrder);
        assert_eq!(ns.classify("article_content_not-a-uuid"), KeyKind::Other);
        assert_eq!(ns.classify("todos"), KeyKind::Other);
        assert_eq!(ns.classify("theme"), KeyKind::Other);
    }

    #[test]
    fn test_is_auxiliary() {
        let ns = Namespace::articles();
        assert!(ns.is_auxiliary("article_content_anything"));
        assert!(ns.is_auxiliary("article_title_anything"));
        assert!(!ns.is_auxiliary("articles"));
        assert!(!ns.is_auxiliary("todo_content_x"));
    }
}
