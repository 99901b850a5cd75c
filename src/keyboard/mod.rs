//! Key identity, combination resolution and state tracking

pub mod combo;
mod event;
pub mod keycode;
pub mod layout;
mod position;
pub mod reporter;
mod state;
pub mod swap;

pub use combo::ComboResolver;
pub use event::{CycleTransitions, KeyEvent, KeyEventType};
pub use keycode::HidKeycode;
pub use layout::{KeyMode, Layout, LogicalKeyName, ModeTable};
pub use position::{down_set, DownSet, MatrixPosition};
pub use reporter::{ChangeReporter, Description, ModifierReportState};
pub use state::{MatrixState, PositionStats};
pub use swap::ModifierSwapPolicy;
