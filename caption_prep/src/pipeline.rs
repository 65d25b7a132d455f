use crate::corpus::{CaptionCorpus, CorpusOptions};
use crate::dataset::{Dataset, align};
use crate::error::Result;
use crate::features::FeatureSource;
use crate::vocabulary::{Vocabulary, VocabularyBuilder};
use ndarray::Array2;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub dataset: Dataset,
    pub vocabulary: Vocabulary,
}

impl PreparedDataset {
    /// Dense `(features, padded_sequences, vocabulary)`; row `i` of the
    /// feature matrix belongs to sequence `i`.
    pub fn into_arrays(self) -> (Array2<f32>, Array2<u32>, Vocabulary) {
        let features = self.dataset.feature_array();
        (features, self.dataset.sequences().clone(), self.vocabulary)
    }
}

pub fn prepare_dataset<F, P>(feature_source: &F, caption_source: P) -> Result<PreparedDataset>
where
    F: FeatureSource + ?Sized,
    P: AsRef<Path>,
{
    prepare_dataset_with(feature_source, caption_source, CorpusOptions::default())
}

pub fn prepare_dataset_with<F, P>(
    feature_source: &F,
    caption_source: P,
    options: CorpusOptions,
) -> Result<PreparedDataset>
where
    F: FeatureSource + ?Sized,
    P: AsRef<Path>,
{
    let features = feature_source.load_features()?;
    let corpus = CaptionCorpus::load_with(caption_source, options)?;
    let vocabulary = VocabularyBuilder::new().build(&corpus);
    let dataset = align(&corpus, &vocabulary, &features);

    log::info!(
        "Prepared {} training pairs padded to length {}",
        dataset.len(),
        dataset.max_len()
    );

    Ok(PreparedDataset {
        dataset,
        vocabulary,
    })
}
