//! Experiment notes
//!
//! An experiment note is a flowchart of category-tagged nodes and typed edges,
//! filed under a project and a folder path. This module validates notes,
//! writes them transactionally into the graph, reads them back and answers
//! listing and search queries.

pub mod category;
pub mod error;
pub mod manager;
pub mod models;
pub mod path;
pub mod reader;
pub mod search;
pub mod writer;

pub use category::*;
pub use error::*;
pub use manager::NoteManager;
pub use models::*;
pub use path::{folder_segments, normalize_folder_path, AnchorChain, PathResolver};
pub use reader::ExperimentReader;
pub use search::SearchIndexQueries;
pub use writer::ExperimentWriter;
