pub mod sequence;
pub mod tokenizer;
pub mod vectorizer;
pub mod vocab;

pub use sequence::{pad_sequence, Padding};
pub use tokenizer::TextTokenizer;
pub use vectorizer::{EncodedDocument, Vectorizer, VectorizerState};
pub use vocab::{Vocabulary, OOV_ID, PAD_ID};
