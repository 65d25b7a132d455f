use crate::corpus::CaptionCorpus;
use crate::error::{Error, Result};
use crate::version::VOCABULARY_FORMAT_VERSION;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Index reserved for padding. No token ever maps to it.
pub const PAD_INDEX: u32 = 0;
pub const OOV_INDEX: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    // tokens[i] has index i + 1; tokens[0] is the OOV token.
    tokens: Vec<String>,
    word_index: HashMap<String, u32>,
}

#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    version: String,
    oov_token: String,
    tokens: Vec<String>,
}

impl Vocabulary {
    pub const DEFAULT_OOV_TOKEN: &'static str = "<unk>";

    fn from_ranked(oov_token: String, ranked: Vec<String>) -> Self {
        let mut tokens = Vec::with_capacity(ranked.len() + 1);
        tokens.push(oov_token);
        tokens.extend(ranked);

        let word_index = tokens
            .iter()
            .enumerate()
            .map(|(position, token)| (token.clone(), position as u32 + OOV_INDEX))
            .collect();

        Vocabulary { tokens, word_index }
    }

    /// Number of indices in use, padding included.
    pub fn size(&self) -> usize {
        self.tokens.len() + 1
    }

    pub fn oov_token(&self) -> &str {
        &self.tokens[0]
    }

    pub fn index_of(&self, token: &str) -> Option<u32> {
        self.word_index.get(token).copied()
    }

    pub fn token(&self, index: u32) -> Option<&str> {
        let position = index.checked_sub(OOV_INDEX)?;
        self.tokens.get(position as usize).map(String::as_str)
    }

    pub fn encode_token(&self, token: &str) -> u32 {
        self.index_of(token).unwrap_or(OOV_INDEX)
    }

    pub fn word_index(&self) -> &HashMap<String, u32> {
        &self.word_index
    }

    pub fn index_word(&self) -> impl Iterator<Item = (u32, &str)> {
        self.tokens
            .iter()
            .enumerate()
            .map(|(position, token)| (position as u32 + OOV_INDEX, token.as_str()))
    }

    /// Maps ids back to space separated tokens. Padding is dropped and ids
    /// outside the vocabulary decode as the OOV token.
    pub fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .filter(|&&id| id != PAD_INDEX)
            .map(|&id| self.token(id).unwrap_or(self.oov_token()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;

        let contents = VocabularyFile {
            version: VOCABULARY_FORMAT_VERSION.to_string(),
            oov_token: self.oov_token().to_string(),
            tokens: self.tokens[1..].to_vec(),
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &contents)?;
        writer.flush().map_err(|e| Error::io(path, e))?;

        log::debug!("Saved {} tokens to {}", self.tokens.len(), path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let contents: VocabularyFile = serde_json::from_reader(BufReader::new(file))?;

        let supported = Version::parse(VOCABULARY_FORMAT_VERSION)
            .map_err(|e| Error::InvalidVocabulary(e.to_string()))?;
        let found = Version::parse(&contents.version).map_err(|_| Error::VocabularyVersion {
            found: contents.version.clone(),
            supported: supported.to_string(),
        })?;

        if found.major != supported.major {
            return Err(Error::VocabularyVersion {
                found: found.to_string(),
                supported: supported.to_string(),
            });
        }
        if found != supported {
            log::warn!(
                "Vocabulary version mismatch: expected {}, got {}",
                supported,
                found
            );
        }

        let mut seen = HashSet::with_capacity(contents.tokens.len() + 1);
        seen.insert(contents.oov_token.as_str());
        if let Some(duplicate) = contents.tokens.iter().find(|t| !seen.insert(t.as_str())) {
            return Err(Error::InvalidVocabulary(format!(
                "token {duplicate:?} appears more than once"
            )));
        }

        Ok(Self::from_ranked(contents.oov_token, contents.tokens))
    }
}

/// Builds a [`Vocabulary`] ranked by descending token frequency, ties broken
/// by first appearance.
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    oov_token: String,
}

impl Default for VocabularyBuilder {
    fn default() -> Self {
        Self {
            oov_token: Vocabulary::DEFAULT_OOV_TOKEN.to_string(),
        }
    }
}

impl VocabularyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_oov_token(mut self, oov_token: impl Into<String>) -> Self {
        self.oov_token = oov_token.into();
        self
    }

    pub fn build(&self, corpus: &CaptionCorpus) -> Vocabulary {
        self.build_from_texts(corpus.captions())
    }

    pub fn build_from_texts<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Vocabulary {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut first_seen: Vec<&str> = Vec::new();

        for token in texts.into_iter().flat_map(str::split_whitespace) {
            if token == self.oov_token {
                continue;
            }
            let count = counts.entry(token).or_insert_with(|| {
                first_seen.push(token);
                0
            });
            *count += 1;
        }

        // Stable sort keeps first-seen order among equal counts.
        first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));

        let ranked = first_seen.into_iter().map(str::to_string).collect();
        let vocabulary = Vocabulary::from_ranked(self.oov_token.clone(), ranked);

        log::info!("Built vocabulary of size {}", vocabulary.size());
        vocabulary
    }
}
