use crate::vocabulary::Vocabulary;

pub type EncodedSequence = Vec<u32>;

pub fn encode(text: &str, vocab: &Vocabulary) -> EncodedSequence {
    text.split_whitespace()
        .map(|token| vocab.encode_token(token))
        .collect()
}
