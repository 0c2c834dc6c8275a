// Chunk: docs/chunks/sliding_window - Lexer-facing cursor over source text

//! String interning for lexeme text.
//!
//! The window hands lexeme characters to an [`Interner`] so that repeated
//! identifiers share one allocation. [`StringTable`] is the default
//! implementation; tables are pooled and come back empty.

use std::collections::HashSet;
use std::sync::Arc;

use source_text::pool::{Pool, Pooled};

static STRING_TABLES: Pool<StringTable> = Pool::new(4, StringTable::new, StringTable::clear);

/// Maps character sequences to shared strings.
pub trait Interner {
    /// Returns the shared string for `chars`, creating it on first use.
    fn intern(&mut self, chars: &[char]) -> Arc<str>;
}

/// A set of interned strings.
#[derive(Debug, Default)]
pub struct StringTable {
    strings: HashSet<Arc<str>>,
    /// Reused for lookups so a hit does not allocate.
    scratch: String,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows an empty table from the shared pool.
    pub fn pooled() -> Pooled<StringTable> {
        STRING_TABLES.acquire()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn clear(&mut self) {
        self.strings.clear();
        self.scratch.clear();
    }
}

impl Interner for StringTable {
    fn intern(&mut self, chars: &[char]) -> Arc<str> {
        self.scratch.clear();
        self.scratch.extend(chars);
        if let Some(existing) = self.strings.get(self.scratch.as_str()) {
            return Arc::clone(existing);
        }
        let interned: Arc<str> = Arc::from(self.scratch.as_str());
        self.strings.insert(Arc::clone(&interned));
        interned
    }
}

impl<T: Interner + Default> Interner for Pooled<T> {
    fn intern(&mut self, chars: &[char]) -> Arc<str> {
        (**self).intern(chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn test_same_text_shares_allocation() {
        let mut table = StringTable::new();
        let first = table.intern(&chars("ident"));
        let second = table.intern(&chars("ident"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*first, "ident");
        assert_eq!(table.len(), 1);

        let other = table.intern(&chars("other"));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_pooled_table_starts_empty() {
        {
            let mut table = StringTable::pooled();
            table.intern(&chars("leftover"));
            assert!(!table.is_empty());
        }
        let table = StringTable::pooled();
        assert!(table.is_empty());
    }
}
