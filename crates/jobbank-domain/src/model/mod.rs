//! Domain Models - The vocabulary of the job bank
//!
//! These types represent the "Ubiquitous Language" of the reference data
//! screens. Every name here should match how we talk about the system.

pub mod entity;
pub mod retraining_program;
pub mod role;
pub mod skill;
