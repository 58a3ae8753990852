pub mod cli;
pub mod progreso;
