/// egui rendering: sidebar widgets, chart drawing and the main page.
pub mod panels;
pub mod plot;
pub mod table;
