pub mod corpus;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod features;
pub mod normalize;
pub mod padding;
pub mod pipeline;
pub mod version;
pub mod vocabulary;

pub use corpus::{BlankLinePolicy, CaptionCorpus, CorpusOptions};
pub use dataset::{Dataset, align};
pub use encoder::{EncodedSequence, encode};
pub use error::{Error, Result};
pub use features::{FeatureMap, FeatureSource, JsonFeatureFile};
pub use normalize::clean;
pub use padding::pad;
pub use pipeline::{PreparedDataset, prepare_dataset, prepare_dataset_with};
pub use vocabulary::{OOV_INDEX, PAD_INDEX, Vocabulary, VocabularyBuilder};
