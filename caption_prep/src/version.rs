pub const VOCABULARY_FORMAT_VERSION: &str = "1.0.0";
