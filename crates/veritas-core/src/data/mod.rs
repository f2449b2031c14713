pub mod loader;
pub mod record;
pub mod split;

pub use loader::{load_corpus, merge_text, DatasetFormat, REQUIRED_COLUMNS};
pub use record::{Corpus, Document, Label, LabelDistribution};
pub use split::{random_split, stratified_split, Partition};
