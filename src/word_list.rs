//! The vocabulary available for filling a grid.

use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::Error;
use crate::{WordId, MAX_SLOT_LENGTH};

/// A word that can be chosen for a slot of matching length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub letters: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: String) -> Word {
        let letters = string.chars().collect();
        Word { string, letters }
    }

    /// Length in letters, which is what slot lengths are compared against.
    pub fn length(&self) -> usize {
        self.letters.len()
    }
}

/// A deduplicated, upper-cased list of words. A word's `WordId` is its position in the list, and
/// every domain keeps its words in list order, so the input order decides every tie-break the
/// solver makes.
pub struct WordList {
    words: Vec<Word>,
    ids_by_string: FxHashMap<String, WordId>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("words", &format!("({} entries)", self.words.len()))
            .finish()
    }
}

impl WordList {
    /// Build a word list from raw entries. Surrounding whitespace is trimmed, blank entries are
    /// skipped, and later duplicates of an earlier word are dropped.
    ///
    /// Upper-casing can change a word's length (`straße` becomes `STRASSE`), and the upper-cased
    /// length is the one matched against slot lengths.
    pub fn new<I, S>(entries: I) -> Result<WordList, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut word_list = WordList {
            words: vec![],
            ids_by_string: FxHashMap::default(),
        };

        for entry in entries {
            let string = entry.as_ref().trim().to_uppercase();
            if string.is_empty() || word_list.ids_by_string.contains_key(&string) {
                continue;
            }

            word_list.ids_by_string.insert(string.clone(), word_list.words.len());
            word_list.words.push(Word::new(string));
        }

        if word_list.words.is_empty() {
            return Err(Error::EmptyWordList);
        }

        Ok(word_list)
    }

    /// Parse a word list with one word per line.
    pub fn parse(contents: &str) -> Result<WordList, Error> {
        WordList::new(contents.lines())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<WordList, Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        WordList::parse(&contents)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Panics if `word_id` didn't come from this list.
    pub fn get(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// Look up a word by its text, ignoring case.
    pub fn id_of(&self, word: &str) -> Option<WordId> {
        self.ids_by_string.get(&word.trim().to_uppercase()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WordId, &Word)> {
        self.words.iter().enumerate()
    }
}
