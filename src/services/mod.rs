pub mod editor_registry;
pub mod reference_data;
pub mod request_context;

pub use editor_registry::EditorRegistry;
pub use reference_data::ReferenceData;
pub use request_context::{Credential, RequestContext};
