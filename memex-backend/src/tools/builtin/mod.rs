mod agent;
mod query;
mod upload;

pub use agent::{KbAddTool, KbStatusTool};
pub use query::{render_entry, KbListTool, KbReadTool, KbSearchTool};
pub use upload::{read_source, source_filename, KbUploadTool};
