//! Modelos neutrales (Artifact, Table, Note, PlotSpec, identificadores).

pub mod artifact;
pub mod ids;
pub mod names;
pub mod note;
pub mod plot;
pub mod table;

pub use artifact::{Artifact, ArtifactError, ArtifactKind, ArtifactMap};
pub use ids::{ChainId, ExtractorId, ToolId};
pub use names::validate_name;
pub use note::Note;
pub use plot::{PlotSeries, PlotSpec};
pub use table::{Table, TableError};
