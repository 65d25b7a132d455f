use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

// Every vector has the same dimension and is stored once.
#[derive(Debug, Clone, Default)]
pub struct FeatureMap {
    vectors: HashMap<String, Arc<[f32]>>,
    dimension: Option<usize>,
}

impl FeatureMap {
    pub fn new<I>(vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let mut map = FeatureMap::default();

        for (image_id, vector) in vectors {
            let expected = *map.dimension.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(Error::FeatureDimension {
                    image_id,
                    expected,
                    found: vector.len(),
                });
            }
            map.vectors.insert(image_id, vector.into());
        }

        Ok(map)
    }

    pub fn get(&self, image_id: &str) -> Option<&Arc<[f32]>> {
        self.vectors.get(image_id)
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

pub trait FeatureSource {
    fn load_features(&self) -> Result<FeatureMap>;
}

impl FeatureSource for FeatureMap {
    fn load_features(&self) -> Result<FeatureMap> {
        Ok(self.clone())
    }
}

/// JSON object of the form `{"<image_id>": [f32, ...], ...}`.
#[derive(Debug, Clone)]
pub struct JsonFeatureFile {
    path: PathBuf,
}

impl JsonFeatureFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeatureSource for JsonFeatureFile {
    fn load_features(&self) -> Result<FeatureMap> {
        let file = File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let vectors: BTreeMap<String, Vec<f32>> = serde_json::from_reader(BufReader::new(file))?;

        let features = FeatureMap::new(vectors)?;
        log::info!(
            "Loaded {} feature vectors of dimension {} from {}",
            features.len(),
            features.dimension().unwrap_or(0),
            self.path.display()
        );

        Ok(features)
    }
}
