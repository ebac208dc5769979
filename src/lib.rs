//! Floor-gymnastics grading for middle-school classes.
//!
//! Routines are scored on a 0-20 rubric ([`scoring`]), untrusted records are
//! normalized before they are stored ([`validation`]), and each teacher's
//! classes, students and evaluations live in a [`store::RecordStore`].

pub mod config;
pub mod export;
pub mod identity;
pub mod import;
pub mod output;
pub mod rubric;
pub mod scoring;
pub mod store;
pub mod validation;
