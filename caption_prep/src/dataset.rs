use crate::corpus::CaptionCorpus;
use crate::encoder::encode;
use crate::error::{Error, Result};
use crate::features::FeatureMap;
use crate::padding::pad;
use crate::vocabulary::Vocabulary;
use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Aligned training pairs: row `i` of `sequences` is a caption of the image
/// whose features are `features[i]`. Captions of one image share the same
/// feature allocation.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Vec<Arc<[f32]>>,
    sequences: Array2<u32>,
}

#[derive(Serialize)]
struct DatasetFile<'a> {
    features: Vec<&'a [f32]>,
    sequences: Vec<Vec<u32>>,
}

/// Joins every caption whose image has features with that image's vector.
///
/// Images are visited in corpus order and images without features are
/// skipped. All retained sequences are padded as a single batch.
pub fn align(corpus: &CaptionCorpus, vocab: &Vocabulary, features: &FeatureMap) -> Dataset {
    let mut rows = Vec::new();
    let mut sequences = Vec::new();
    let mut excluded = 0;

    for (image_id, captions) in corpus.iter() {
        let Some(feature) = features.get(image_id) else {
            excluded += 1;
            continue;
        };

        for caption in captions {
            rows.push(Arc::clone(feature));
            sequences.push(encode(caption, vocab));
        }
    }

    log::debug!(
        "Aligned {} captions, excluded {} images without features",
        rows.len(),
        excluded
    );

    Dataset {
        features: rows,
        sequences: pad(&sequences),
    }
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Arc<[f32]>] {
        &self.features
    }

    pub fn sequences(&self) -> &Array2<u32> {
        &self.sequences
    }

    pub fn max_len(&self) -> usize {
        self.sequences.ncols()
    }

    pub fn feature_array(&self) -> Array2<f32> {
        let dimension = self.features.first().map_or(0, |row| row.len());

        Array2::from_shape_fn((self.features.len(), dimension), |(row, column)| {
            self.features[row][column]
        })
    }

    /// Shuffles rows with a seeded RNG and moves `validation_ratio` of them
    /// into a second dataset. Returns `(train, validation)`.
    pub fn split(&self, validation_ratio: f32, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(0.0..=1.0).contains(&validation_ratio) {
            return Err(Error::InvalidSplit(validation_ratio));
        }

        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));

        let validation_len = (self.len() as f32 * validation_ratio).round() as usize;
        let (validation, train) = indices.split_at(validation_len);

        log::debug!(
            "Split {} rows into {} train and {} validation",
            self.len(),
            train.len(),
            validation.len()
        );

        Ok((self.select(train), self.select(validation)))
    }

    fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices
                .iter()
                .map(|&i| Arc::clone(&self.features[i]))
                .collect(),
            sequences: self.sequences.select(Axis(0), indices),
        }
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;

        let contents = DatasetFile {
            features: self.features.iter().map(|row| &row[..]).collect(),
            sequences: self.sequences.outer_iter().map(|row| row.to_vec()).collect(),
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &contents)?;
        writer.flush().map_err(|e| Error::io(path, e))?;

        log::info!("Saved {} rows to {}", self.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{PAD_INDEX, VocabularyBuilder};
    use ndarray::array;

    fn corpus(entries: &[(&str, &str)]) -> CaptionCorpus {
        let mut corpus = CaptionCorpus::new();
        for (image_id, caption) in entries {
            corpus.push(image_id, caption.to_string());
        }
        corpus
    }

    fn features(entries: &[(&str, Vec<f32>)]) -> FeatureMap {
        FeatureMap::new(
            entries
                .iter()
                .map(|(image_id, vector)| (image_id.to_string(), vector.clone())),
        )
        .unwrap()
    }

    #[test]
    fn test_excludes_images_without_features() {
        let corpus = corpus(&[
            ("img1", "<startseq> a cat <endseq>"),
            ("img2", "<startseq> a dog <endseq>"),
        ]);
        let vocab = VocabularyBuilder::new().build(&corpus);
        let dataset = align(&corpus, &vocab, &features(&[("img1", vec![0.1, 0.2])]));

        assert_eq!(dataset.len(), 1);
        assert_eq!(
            vocab.decode(dataset.sequences().row(0).as_slice().unwrap()),
            "<startseq> a cat <endseq>"
        );
        assert_eq!(dataset.feature_array(), array![[0.1f32, 0.2]]);
    }

    #[test]
    fn test_captions_share_feature_allocation() {
        let corpus = corpus(&[("img1", "a"), ("img1", "b"), ("img1", "c")]);
        let vocab = VocabularyBuilder::new().build(&corpus);
        let features = features(&[("img1", vec![1.0, 2.0, 3.0])]);
        let dataset = align(&corpus, &vocab, &features);

        assert_eq!(dataset.len(), 3);
        for row in dataset.features() {
            assert!(Arc::ptr_eq(row, features.get("img1").unwrap()));
        }
    }

    #[test]
    fn test_pads_across_all_images() {
        let corpus = corpus(&[
            ("img1", "a b"),
            ("img2", "a b c d e"),
            ("img3", "a b c"),
        ]);
        let vocab = VocabularyBuilder::new().build(&corpus);
        let dataset = align(
            &corpus,
            &vocab,
            &features(&[("img1", vec![0.0]), ("img3", vec![1.0])]),
        );

        // img2 is excluded, so the longest retained caption has 3 tokens.
        assert_eq!(dataset.sequences().dim(), (2, 3));
        assert_eq!(dataset.sequences()[[0, 2]], PAD_INDEX);
        assert_eq!(dataset.feature_array(), array![[0.0f32], [1.0]]);
    }

    #[test]
    fn test_rows_follow_corpus_order() {
        let corpus = corpus(&[("b", "second"), ("a", "first"), ("b", "third")]);
        let vocab = VocabularyBuilder::new().build(&corpus);
        let dataset = align(&corpus, &vocab, &features(&[("a", vec![1.0]), ("b", vec![2.0])]));

        let decoded: Vec<String> = dataset
            .sequences()
            .outer_iter()
            .map(|row| vocab.decode(row.as_slice().unwrap()))
            .collect();
        assert_eq!(decoded, ["second", "third", "first"]);
        assert_eq!(dataset.feature_array(), array![[2.0f32], [2.0], [1.0]]);
    }

    #[test]
    fn test_nothing_retained() {
        let corpus = corpus(&[("img1", "a cat")]);
        let vocab = VocabularyBuilder::new().build(&corpus);
        let dataset = align(&corpus, &vocab, &FeatureMap::default());

        assert!(dataset.is_empty());
        assert_eq!(dataset.sequences().dim(), (0, 0));
        assert_eq!(dataset.feature_array().dim(), (0, 0));
    }

    #[test]
    fn test_split_is_reproducible() {
        let entries: Vec<(String, String)> = (0..10)
            .map(|i| (format!("img{i}"), format!("caption {i}")))
            .collect();
        let mut corpus = CaptionCorpus::new();
        let mut vectors = Vec::new();
        for (i, (image_id, caption)) in entries.iter().enumerate() {
            corpus.push(image_id, caption.clone());
            vectors.push((image_id.clone(), vec![i as f32]));
        }
        let vocab = VocabularyBuilder::new().build(&corpus);
        let dataset = align(&corpus, &vocab, &FeatureMap::new(vectors).unwrap());

        let (train, validation) = dataset.split(0.2, 7).unwrap();
        let (train_again, validation_again) = dataset.split(0.2, 7).unwrap();

        assert_eq!(train.len(), 8);
        assert_eq!(validation.len(), 2);
        assert_eq!(train.max_len(), dataset.max_len());
        assert_eq!(train.feature_array(), train_again.feature_array());
        assert_eq!(validation.sequences(), validation_again.sequences());

        let mut seen: Vec<f32> = train
            .feature_array()
            .iter()
            .chain(validation.feature_array().iter())
            .copied()
            .collect();
        seen.sort_by(f32::total_cmp);
        assert_eq!(seen, (0..10).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_rejects_bad_ratio() {
        let corpus = CaptionCorpus::new();
        let vocab = VocabularyBuilder::new().build(&corpus);
        let dataset = align(&corpus, &vocab, &FeatureMap::default());

        assert!(matches!(dataset.split(1.5, 0), Err(Error::InvalidSplit(_))));
        assert!(matches!(dataset.split(f32::NAN, 0), Err(Error::InvalidSplit(_))));
    }

    #[test]
    fn test_save_json() {
        let corpus = corpus(&[("img1", "a b"), ("img1", "a")]);
        let vocab = VocabularyBuilder::new().build(&corpus);
        let dataset = align(&corpus, &vocab, &features(&[("img1", vec![0.5])]));
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        dataset.save_json(temp_file.path()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_reader(File::open(temp_file.path()).unwrap()).unwrap();
        assert_eq!(
            saved,
            serde_json::json!({
                "features": [[0.5], [0.5]],
                "sequences": [[2, 3], [2, 0]],
            })
        );
    }
}
