//! SAM/BAM record utilities.
//!
//! This module provides the record-level helpers the scanner and walker are
//! built on:
//!
//! - [`record_utils`] - clipped-inclusive coordinate math and CIGAR span
//!   calculations
//! - [`builder`] - test utilities for constructing records and reference
//!   fixtures

pub mod builder;
pub mod record_utils;

pub use builder::{RecordBuilder, create_test_fasta, parse_cigar};
pub use record_utils::{
    alignment_end, clipped_end, clipped_span, clipped_start, leading_soft_clip, reference_length,
    trailing_soft_clip,
};
