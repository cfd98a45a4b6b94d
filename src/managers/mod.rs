// Course tabs state managers
// Managers own the editable tab list and the optimistic mutation state.

pub mod reorder_controller;
pub mod tab_collection;
