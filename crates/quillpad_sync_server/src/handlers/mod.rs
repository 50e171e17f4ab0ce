pub mod documents;
pub mod ws;

pub use documents::{delete_document, get_document, put_document};
pub use ws::ws_handler;
