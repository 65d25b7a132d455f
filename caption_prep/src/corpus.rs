use crate::error::{Error, Result};
use crate::normalize::clean;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const START_TOKEN: &str = "<startseq>";
pub const END_TOKEN: &str = "<endseq>";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlankLinePolicy {
    #[default]
    Reject,
    Skip,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusOptions {
    pub blank_lines: BlankLinePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionRecord {
    pub image_id: String,
    pub text: String,
}

impl CaptionRecord {
    fn parse(line: &str) -> Option<Self> {
        let (image_id, text) = line.split_once(',')?;

        Some(CaptionRecord {
            image_id: image_id.to_string(),
            text: text.to_string(),
        })
    }

    pub fn normalize(&self) -> String {
        format!("{START_TOKEN} {} {END_TOKEN}", clean(&self.text))
    }
}

/// Normalized captions grouped by image id.
///
/// Image ids iterate in order of first appearance in the source; captions
/// keep their source order within an image. Every image has at least one
/// caption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionCorpus {
    entries: Vec<(String, Vec<String>)>,
    positions: HashMap<String, usize>,
}

impl CaptionCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, CorpusOptions::default())
    }

    pub fn load_with<P: AsRef<Path>>(path: P, options: CorpusOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;

        let corpus = Self::parse(BufReader::new(file), options).map_err(|e| match e {
            Error::Io { source, .. } => Error::io(path, source),
            other => other,
        })?;

        log::info!(
            "Loaded {} captions for {} images from {}",
            corpus.caption_count(),
            corpus.image_count(),
            path.display()
        );

        Ok(corpus)
    }

    /// Parses caption lines from any reader. The first line is a header and is
    /// discarded unconditionally.
    pub fn parse<R: BufRead>(reader: R, options: CorpusOptions) -> Result<Self> {
        let mut corpus = CaptionCorpus::new();
        let mut lines = reader.lines();

        if let Some(header) = lines.next() {
            header.map_err(|e| Error::io("<reader>", e))?;
        }

        for (index, line) in lines.enumerate() {
            let line = line.map_err(|e| Error::io("<reader>", e))?;
            let line = line.trim().to_lowercase();

            if line.is_empty() && options.blank_lines == BlankLinePolicy::Skip {
                continue;
            }

            let record = CaptionRecord::parse(&line).ok_or_else(|| Error::Format {
                line: index + 2,
                content: line.clone(),
            })?;

            corpus.push(&record.image_id, record.normalize());
        }

        log::debug!("Parsed {} caption lines", corpus.caption_count());

        Ok(corpus)
    }

    pub fn push(&mut self, image_id: &str, caption: String) {
        match self.positions.get(image_id) {
            Some(&position) => self.entries[position].1.push(caption),
            None => {
                self.positions
                    .insert(image_id.to_string(), self.entries.len());
                self.entries.push((image_id.to_string(), vec![caption]));
            }
        }
    }

    pub fn get(&self, image_id: &str) -> Option<&[String]> {
        self.positions
            .get(image_id)
            .map(|&position| self.entries[position].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(image_id, captions)| (image_id.as_str(), captions.as_slice()))
    }

    pub fn image_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(image_id, _)| image_id.as_str())
    }

    pub fn captions(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|(_, captions)| captions.iter().map(String::as_str))
    }

    pub fn image_count(&self) -> usize {
        self.entries.len()
    }

    pub fn caption_count(&self) -> usize {
        self.entries.iter().map(|(_, captions)| captions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
