pub mod action_menu;
pub mod cells;
pub mod dialogs;
pub mod footer;
pub mod table;
pub mod toast_stack;
