pub mod list;
pub mod ping;
pub mod update_json;
pub mod update_path;
pub mod value_json;
pub mod value_path;

pub use list::list;
pub use ping::ping;
pub use update_json::{update_json, updates_json};
pub use update_path::update_path;
pub use value_json::value_json;
pub use value_path::value_path;
