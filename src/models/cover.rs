use crate::error::GenerationFailure;
use serde::Serialize;

/// Ordered title → items mapping.
///
/// Titles keep their input order and duplicates are kept as separate
/// entries, so two runs of the same title never merge their variations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleMap<T> {
    entries: Vec<TitleEntry<T>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleEntry<T> {
    pub title: String,
    pub items: Vec<T>,
}

impl<T> Default for TitleMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> TitleMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a title with no items yet and return its slot.
    pub fn insert_title(&mut self, title: impl Into<String>) -> &mut Vec<T> {
        self.entries.push(TitleEntry {
            title: title.into(),
            items: Vec::new(),
        });
        let last = self.entries.len() - 1;
        &mut self.entries[last].items
    }

    /// Items of the first entry with this title.
    pub fn get(&self, title: &str) -> Option<&[T]> {
        self.entries
            .iter()
            .find(|entry| entry.title == title)
            .map(|entry| entry.items.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.entries
            .iter()
            .map(|entry| (entry.title.as_str(), entry.items.as_slice()))
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.title.as_str())
    }

    /// Number of title entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total items across all titles.
    pub fn item_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.items.len()).sum()
    }
}

pub type DescriptionSet = TitleMap<String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverImage {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub description: String,
}

pub type ImageSet = TitleMap<CoverImage>;

/// What a batch call produced: everything that succeeded plus a warning per failed item.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    pub items: TitleMap<T>,
    pub failures: Vec<GenerationFailure>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            items: TitleMap::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> Batch<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_titles_stay_separate() {
        let mut set = DescriptionSet::new();
        set.insert_title("Dune").push("first".to_string());
        set.insert_title("Dune").push("second".to_string());
        set.insert_title("Emma");

        assert_eq!(set.len(), 3);
        assert_eq!(set.item_count(), 2);
        assert_eq!(set.get("Dune"), Some(&["first".to_string()][..]));
        assert_eq!(set.get("Emma"), Some(&[][..]));
        assert_eq!(set.titles().collect::<Vec<_>>(), vec!["Dune", "Dune", "Emma"]);
    }

    #[test]
    fn test_missing_title() {
        let set = ImageSet::new();
        assert!(set.get("Nowhere").is_none());
        assert!(set.is_empty());
    }
}
