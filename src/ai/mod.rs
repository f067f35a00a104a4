pub mod action;
pub mod directive;
pub mod processor;
pub mod visual;
