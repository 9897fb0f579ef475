pub mod alert;
pub mod button;
pub mod input;
pub mod label;
pub mod select;
pub mod spinner;
pub mod switch;

// Re-export component symbols so callers can `use crate::components::ui::Button` etc.
pub use alert::*;
pub use button::*;
pub use input::*;
pub use label::*;
pub use select::*;
pub use spinner::*;
pub use switch::*;
