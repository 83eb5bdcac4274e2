mod helplines;
mod protocols;

pub use helplines::{HelplineDirectory, DEFAULT_COUNTRY};
pub use protocols::{CatalogStats, ProtocolCatalog};
