pub mod engine;
pub mod input;
pub mod manager;
pub mod selection;
pub mod session;

pub use engine::ConnectorEditor;
pub use input::{InputEvent, Modifiers};
pub use manager::NodeManager;
pub use selection::{Selection, SelectionEvent, SelectionItem, SelectionMode};
pub use session::{DragTarget, InteractionSession, Phase};
