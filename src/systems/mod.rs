pub mod export;
pub mod hydro;
pub mod ui;
